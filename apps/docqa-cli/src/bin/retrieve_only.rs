use std::env;
use std::sync::Arc;

use docqa_core::config::Config;
use docqa_core::traits::{EmbeddingClient, IndexStore};
use docqa_openai::OpenAiClient;
use docqa_pipeline::keywords;
use docqa_qdrant::{validate_settings, QdrantStore};
use docqa_retrieval::HybridRetriever;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [limit]", args[0]);
        eprintln!("Example: {} 'statute of limitations' 5", args[0]);
        std::process::exit(1);
    }
    let query_text = &args[1];
    let limit: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);

    let config = Config::load()?;
    validate_settings(&config.qdrant())?;
    let settings = config.pipeline();

    let openai = Arc::new(OpenAiClient::new(config.openai()));
    let embedder: Arc<dyn EmbeddingClient> = openai;
    let store: Arc<dyn IndexStore> = Arc::new(QdrantStore::new(config.qdrant()));
    let retriever = HybridRetriever::new(embedder, store);

    let kws = keywords::extract(query_text);
    println!("🔍 docqa-retrieve\n==================");
    println!("Query: {}", query_text);
    println!("Keywords: {}", if kws.is_empty() { "(none)".to_string() } else { kws.join(", ") });

    let results = retriever
        .hybrid_retrieve(query_text, &kws, limit, settings.vector_weight)
        .await?;
    println!("\n🔍 Found {} results for: \"{}\"", results.len(), query_text);
    for (i, c) in results.iter().enumerate() {
        let snippet: String = c.payload.text.chars().take(80).collect();
        println!(
            "\n  {}. fused={:.4}  vector={}  keyword={}  id={}  source={}",
            i + 1,
            c.fused_score,
            c.vector_score.map(|s| format!("{:.4}", s)).unwrap_or_else(|| "-".to_string()),
            if c.keyword_matched { "yes" } else { "no" },
            c.id,
            c.payload.source_label()
        );
        println!("     📝 {}", snippet);
    }
    Ok(())
}
