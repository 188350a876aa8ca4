use anyhow::Result;
use clap::Parser;
use lexrag::config::{ArtifactArgs, SegmentArgs};
use lexrag::pipeline::preprocess;
use lexrag::telemetry::init_tracing;

#[derive(Parser, Debug)]
#[command(
    name = "lexrag-preprocess",
    about = "Extract and segment source documents into the corpus store"
)]
struct PreprocessCli {
    #[command(flatten)]
    artifacts: ArtifactArgs,

    #[command(flatten)]
    segment: SegmentArgs,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = PreprocessCli::parse();
    let paths = cli.artifacts.paths();
    let mode = cli.segment.mode()?;
    let build = preprocess(&paths, &mode)?;

    for doc in &build.documents {
        println!(
            "{:<48} {:>6} chunks  ({:?})",
            doc.source_id, doc.chunks, doc.strategy
        );
    }
    println!(
        "wrote {} chunks from {} documents to {}",
        build.store.len(),
        build.documents.len(),
        paths.corpus.display()
    );
    Ok(())
}
