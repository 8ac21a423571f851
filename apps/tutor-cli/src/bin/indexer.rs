use std::{env, fs, path::PathBuf};
use tracing::info;

use tutor_core::config::{resolve_with_base, Config};
use tutor_core::data_processor::{assign_ids, DataProcessor};
use tutor_embed::load_embedder;
use tutor_vector::ArtifactWriter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tutor_cli::init_tracing();
    let settings = Config::load()?.settings()?;
    let base_dir = env::current_dir()?;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut force = false;
    let mut data_dir = None;
    let mut limit = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--force" | "-f" => force = true,
            "--limit" => {
                limit = Some(args.get(i + 1).and_then(|n| n.parse::<usize>().ok()).ok_or_else(|| {
                    anyhow::anyhow!("--limit requires a number")
                })?);
                i += 1;
            }
            arg if !arg.starts_with('-') => data_dir = Some(PathBuf::from(arg)),
            other => anyhow::bail!("unknown flag {other}"),
        }
        i += 1;
    }
    let data_dir = data_dir.unwrap_or_else(|| resolve_with_base(&base_dir, &settings.data.raw_txt_dir));
    let artifacts_dir = resolve_with_base(&base_dir, &settings.data.artifacts_dir);

    println!("Course corpus indexer\n=====================");
    println!("Data directory: {}", data_dir.display());
    println!("Artifacts: {} (table {})", artifacts_dir.display(), settings.data.table_name);

    let chunks = assign_ids(DataProcessor::new().process_directory(&data_dir, limit)?);
    info!(chunks = chunks.len(), "corpus chunked");

    if force && artifacts_dir.exists() {
        info!(dir = %artifacts_dir.display(), "removing previous artifacts");
        fs::remove_dir_all(&artifacts_dir)?;
    }
    fs::create_dir_all(&artifacts_dir)?;

    let embedder = load_embedder(&settings.embedding)?;
    let writer = ArtifactWriter::new(&artifacts_dir.to_string_lossy(), &settings.data.table_name).await?;
    let written = writer.write(&chunks, embedder.as_ref()).await?;

    println!("\nIndexed {written} chunks with {}", embedder.embedder_id());
    println!("Try it with: cargo run --bin tutor -- ask '<question>'");
    Ok(())
}
