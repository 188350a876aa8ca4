use std::path::Path;
use std::process::{Command, Output};

fn run(bin: &str, args: &[&str]) -> Output {
    let mut command = Command::new(bin);
    command.args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("LEXRAG_") || key == "OPENAI_API_KEY" || key == "GROQ_API_KEY" {
            command.env_remove(key);
        }
    }
    command.output().expect("run CLI")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "cli exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn artifact_args(root: &Path) -> Vec<String> {
    let models = root.join("processed/models");
    vec![
        "--raw-dir".into(),
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/raw")
            .display()
            .to_string(),
        "--corpus".into(),
        root.join("processed/articulos_total.csv").display().to_string(),
        "--embeddings".into(),
        models.join("embeddings_total.bin").display().to_string(),
        "--index".into(),
        models.join("index_total.bin").display().to_string(),
        "--manifest".into(),
        models.join("index_manifest.json").display().to_string(),
    ]
}

#[test]
fn preprocess_index_and_dry_run_ask() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = artifact_args(dir.path());
    let paths: Vec<&str> = paths.iter().map(String::as_str).collect();

    let output = run(env!("CARGO_BIN_EXE_lexrag-preprocess"), &paths);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wrote 7 chunks from 2 documents"), "{stdout}");

    let output = run(env!("CARGO_BIN_EXE_lexrag-index"), &paths);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("indexed 7 rows (384 dims, hash-v1/384)"));

    let mut ask_args = vec![
        "--query",
        "¿Cuál es el límite de velocidad en zonas urbanas?",
        "--top-k",
        "2",
        "--dry-run",
    ];
    ask_args.extend(&paths);
    let output = run(env!("CARGO_BIN_EXE_lexrag-ask"), &ask_args);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--- Contexto recuperado ---"), "{stdout}");
    assert!(stdout.contains("[1] "), "{stdout}");
    assert!(stdout.contains("[2] "), "{stdout}");
    assert!(!stdout.contains("[3] "), "{stdout}");
    assert!(stdout.contains("dry-run enabled; skipping LLM call."));
}

#[test]
fn ask_without_credentials_fails_before_retrieval() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = artifact_args(dir.path());
    let mut args: Vec<&str> = vec!["--query", "¿multas?", "--llm", "openai"];
    args.extend(paths.iter().map(String::as_str));

    // artifacts were never built, so a retrieval attempt would report a missing file instead
    let output = run(env!("CARGO_BIN_EXE_lexrag-ask"), &args);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing credential"), "{stderr}");
}

#[test]
fn invalid_window_flags_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = artifact_args(dir.path());
    let mut args: Vec<&str> = vec!["--window", "--overlap", "1.0"];
    args.extend(paths.iter().map(String::as_str));

    let output = run(env!("CARGO_BIN_EXE_lexrag-preprocess"), &args);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid window configuration"));
    assert!(!dir.path().join("processed/articulos_total.csv").exists());
}
