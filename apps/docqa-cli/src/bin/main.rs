use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use docqa_core::chunker::Chunker;
use docqa_core::config::Config;
use docqa_core::traits::{CompletionClient, EmbeddingClient, IndexStore};
use docqa_core::types::Message;
use docqa_openai::OpenAiClient;
use docqa_pipeline::Pipeline;
use docqa_qdrant::{validate_settings, QdrantStore, UpsertPoint};

const UPSERT_BATCH: usize = 64;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ask|ingest> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ask" => {
            let question = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: docqa ask \"<question>\"");
                std::process::exit(1)
            });
            validate_settings(&config.qdrant())?;
            let openai = Arc::new(OpenAiClient::new(config.openai()));
            let llm: Arc<dyn CompletionClient> = openai.clone();
            let embedder: Arc<dyn EmbeddingClient> = openai;
            let store: Arc<dyn IndexStore> = Arc::new(QdrantStore::new(config.qdrant()));
            let settings = config.pipeline();
            let timeout = Duration::from_secs(settings.timeout_secs);

            let pipeline = Pipeline::new(llm, embedder, store, settings);
            let outcome = pipeline
                .run_with_timeout(vec![Message::user(question)], timeout)
                .await?;
            println!("{}", outcome.answer);
        }
        "ingest" => {
            let data_path = args.first().map(PathBuf::from).unwrap_or_else(|| {
                let dir: String = config
                    .get("data.txt_dir")
                    .unwrap_or_else(|_| "./data/txt".to_string());
                PathBuf::from(dir)
            });
            println!("Ingesting from {}", data_path.display());

            let chunker = Chunker::new();
            let chunks = if data_path.is_dir() {
                chunker.process_directory(&data_path)?
            } else {
                chunker.process_file(&data_path)?
            };
            if chunks.is_empty() {
                println!("Nothing to ingest under {}", data_path.display());
                return Ok(());
            }

            validate_settings(&config.qdrant())?;
            let openai = OpenAiClient::new(config.openai());
            let store = QdrantStore::new(config.qdrant());
            store.recreate_collection().await?;

            let mut batch: Vec<UpsertPoint> = Vec::with_capacity(UPSERT_BATCH);
            for (point_id, chunk) in chunks.iter().enumerate() {
                let vector = openai.embed(&chunk.payload.text).await?;
                batch.push(UpsertPoint { id: point_id as u64, vector, payload: chunk.payload.clone() });
                if batch.len() >= UPSERT_BATCH {
                    store.upsert(&batch).await?;
                    batch.clear();
                    println!("  ... {} chunks uploaded", point_id + 1);
                }
            }
            if !batch.is_empty() {
                store.upsert(&batch).await?;
            }
            println!("✅ Ingest complete ({} chunks)", chunks.len());
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}
