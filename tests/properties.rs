//! Property-based tests for normalization, segmentation, and ranking.
//!
//! Properties verified:
//! - Normalization is idempotent and leaves no `\r`, double spaces or triple newlines
//! - Article extents tile the text from the first marker to the end
//! - Every indexed unit vector finds itself with score ~1.0
//! - Retrieval scores never increase and length is `min(k, corpus_size)`

use lexrag::embedder::l2_normalize;
use lexrag::{
    normalize, Chunk, ChunkType, CorpusStore, Embedder, EmbeddingMatrix, FlatIndex, HashEmbedder,
    Retriever, Segmenter, Strategy as Segmentation,
};
use proptest::prelude::*;

/// Text built from the characters normalization cares about.
fn messy_text() -> impl Strategy<Value = String> {
    let alphabet = vec![
        'a', 'z', 'é', 'ñ', '.', '1', ' ', ' ', '\t', '\r', '\n', '\n', '\u{a0}', '\u{2003}',
        '\u{c}',
    ];
    prop::collection::vec(prop::sample::select(alphabet), 0..80)
        .prop_map(|chars| chars.into_iter().collect())
}

/// Marker-free prose: no digits, so it can never open an article.
fn prose(max: usize) -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("[a-záéóñ ,]{{0,{max}}}"))
        .unwrap_or_else(|err| panic!("prose pattern: {err}"))
}

fn article() -> impl Strategy<Value = (String, u32, String, String)> {
    (
        prop::sample::select(vec!["ARTÍCULO", "ARTICULO", "Artículo", "artículo"]),
        1u32..2000,
        prose(20),
        prose(60),
    )
        .prop_map(|(keyword, number, title, body)| (keyword.to_string(), number, title, body))
}

fn unit_rows(dims: usize, count: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-1.0f32..1.0, dims), count)
}

proptest! {
    #[test]
    fn prop_normalize_is_idempotent(raw in messy_text()) {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once.clone());
        prop_assert!(!once.contains('\r'));
        prop_assert!(!once.contains("  "));
        prop_assert!(!once.contains("\n\n\n"));
    }

    #[test]
    fn prop_normalize_is_idempotent_on_any_string(raw in any::<String>()) {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn prop_article_extents_tile_text_from_first_marker(
        preamble in prose(40),
        articles in prop::collection::vec(article(), 0..8),
    ) {
        let mut text = format!("{preamble}\n");
        let first_marker = text.len();
        for (keyword, number, title, body) in &articles {
            text.push_str(&format!("{keyword} {number}. {title}\n{body}\n"));
        }

        let segmenter = Segmenter::new();
        let extents = segmenter.extents(&Segmentation::Article, &text);
        prop_assert_eq!(extents.len(), articles.len());
        let rebuilt: String = extents.iter().map(|e| &text[e.range.clone()]).collect();
        let expected = if articles.is_empty() { "" } else { &text[first_marker..] };
        prop_assert_eq!(rebuilt.as_str(), expected);

        let chunks = segmenter.segment(&Segmentation::Article, &text, "ley.pdf");
        let expected: Vec<Option<u32>> = articles
            .iter()
            .filter(|(_, _, _, body)| !body.trim().is_empty())
            .map(|(_, number, _, _)| Some(*number))
            .collect();
        let ids: Vec<Option<u32>> = chunks.iter().map(|c| c.sequence_id()).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn prop_indexed_vector_finds_itself(
        (dims, rows) in (2usize..24, 1usize..16)
            .prop_flat_map(|(dims, count)| (Just(dims), unit_rows(dims, count))),
    ) {
        let norms_ok = rows
            .iter()
            .all(|row| row.iter().map(|x| x * x).sum::<f32>().sqrt() > 1e-3);
        prop_assume!(norms_ok);
        let rows: Vec<Vec<f32>> = rows
            .into_iter()
            .map(|mut row| {
                l2_normalize(&mut row);
                row
            })
            .collect();
        let matrix = EmbeddingMatrix::from_rows(dims, rows.clone())
            .unwrap_or_else(|err| panic!("matrix: {err}"));
        let index = FlatIndex::build(matrix);

        for (position, row) in rows.iter().enumerate() {
            let hits = index
                .search(row, rows.len())
                .unwrap_or_else(|err| panic!("search: {err}"));
            let own = hits
                .iter()
                .find(|hit| hit.position == position)
                .map(|hit| hit.score)
                .unwrap_or(f32::NAN);
            prop_assert!((own - 1.0).abs() < 1e-4, "self score {}", own);
            // a near-parallel neighbour may only outrank by rounding noise
            prop_assert!(hits[0].position == position || hits[0].score - own < 1e-5);
        }
    }

    #[test]
    fn prop_retrieval_is_ranked_and_bounded(
        bodies in prop::collection::vec("[a-z]{1,8}( [a-z]{1,8}){0,6}", 0..12),
        query in "[a-z]{1,8}( [a-z]{1,8}){0,3}",
        k in 1usize..16,
    ) {
        let embedder = HashEmbedder::new(32);
        let chunks: Vec<Chunk> = bodies
            .iter()
            .map(|body| {
                Chunk::new("ley.pdf", None, "", body.as_str(), ChunkType::Window)
                    .unwrap_or_else(|err| panic!("chunk: {err}"))
            })
            .collect();
        let texts: Vec<&str> = bodies.iter().map(String::as_str).collect();
        let vectors = embedder
            .embed(&texts)
            .unwrap_or_else(|err| panic!("embed: {err}"));
        let index = FlatIndex::build(
            EmbeddingMatrix::from_rows(32, vectors).unwrap_or_else(|err| panic!("matrix: {err}")),
        );
        let retriever = Retriever::new(CorpusStore::from_chunks(chunks), index, Box::new(embedder))
            .unwrap_or_else(|err| panic!("retriever: {err}"));

        let results = retriever
            .retrieve(&query, k)
            .unwrap_or_else(|err| panic!("retrieve: {err}"));
        prop_assert_eq!(results.len(), k.min(bodies.len()));
        prop_assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }
}
