use anyhow::Result;
use clap::Parser;
use lexrag::config::{ArtifactArgs, EmbedderArgs};
use lexrag::pipeline::build_index;
use lexrag::telemetry::init_tracing;

#[derive(Parser, Debug)]
#[command(
    name = "lexrag-index",
    about = "Embed the corpus store and build the vector index"
)]
struct IndexCli {
    #[command(flatten)]
    artifacts: ArtifactArgs,

    #[command(flatten)]
    embedder: EmbedderArgs,

    /// Rows embedded per call to the embedder
    #[arg(long, env = "LEXRAG_INDEX_BATCH", default_value_t = 64)]
    batch_size: usize,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = IndexCli::parse();
    let paths = cli.artifacts.paths();
    let embedder = cli.embedder.build()?;
    let manifest = build_index(&paths, embedder.as_ref(), cli.batch_size)?;

    for source in &manifest.sources {
        println!("{:<48} {:>6} vectors", source.source, source.chunks);
    }
    println!(
        "indexed {} rows ({} dims, {}) into {}",
        manifest.rows,
        manifest.dimensions,
        manifest.embedder,
        paths.index.display()
    );
    Ok(())
}
