use anyhow::Result;
use clap::Parser;
use lexrag::compose::{compose_context, AnswerComposer, GenerationSettings};
use lexrag::config::{ArtifactArgs, EmbedderArgs, LlmArgs};
use lexrag::retriever::{Retrieved, Retriever};
use lexrag::telemetry::init_tracing;

#[derive(Parser, Debug)]
#[command(
    name = "lexrag-ask",
    about = "Answer a traffic-law question from the indexed corpus"
)]
struct AskCli {
    /// Question to answer
    #[arg(long)]
    query: String,

    /// Number of chunks placed in the context
    #[arg(long, env = "LEXRAG_TOP_K", default_value_t = 3)]
    top_k: usize,

    /// Only print the rendered context (skip the LLM call)
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    #[command(flatten)]
    artifacts: ArtifactArgs,

    #[command(flatten)]
    embedder: EmbedderArgs,

    #[command(flatten)]
    llm: LlmArgs,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = AskCli::parse();

    // credentials are checked before any artifact is loaded
    let provider = if cli.dry_run {
        None
    } else {
        Some(cli.llm.build(cli.embedder.openai_api_key.as_deref())?)
    };

    let retriever = Retriever::open(&cli.artifacts.paths(), cli.embedder.build()?)?;
    let results = retriever.retrieve(&cli.query, cli.top_k)?;

    let Some(provider) = provider else {
        println!("--- Contexto recuperado ---\n{}\n", compose_context(&results));
        print_sources(&results);
        println!("dry-run enabled; skipping LLM call.");
        return Ok(());
    };

    let composer = AnswerComposer::new(
        provider.as_ref(),
        GenerationSettings {
            temperature: cli.llm.temperature,
            max_tokens: cli.llm.max_completion_tokens,
        },
    );
    let answer = composer.answer(&cli.query, &results)?;
    println!("--- Respuesta ---\n{}\n", answer.text);
    print_sources(&results);
    Ok(())
}

fn print_sources(results: &[Retrieved<'_>]) {
    println!("--- Artículos usados ---");
    for result in results {
        let chunk = result.chunk;
        let id = chunk
            .sequence_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {:<40}  {:.4}  {}",
            id,
            chunk.title(),
            result.score,
            chunk.source_id()
        );
    }
}
