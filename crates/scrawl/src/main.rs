use std::sync::Arc;

use scrawl::ServerBuilder;
use scrawl_words::WordList;
use tracing_subscriber::EnvFilter;

/// Starter pool so a fresh server is playable out of the box.
const SEED_WORDS: &[&str] = &[
    "apple", "bicycle", "castle", "dragon", "elephant", "guitar",
    "island", "lighthouse", "mountain", "pirate", "robot", "snowman",
    "telescope", "umbrella", "volcano",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("SCRAWL_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = ServerBuilder::new()
        .bind(&addr)
        .words(Arc::new(WordList::seeded(SEED_WORDS.iter().copied())))
        .build()
        .await?;

    tracing::info!(%addr, "scrawl listening");
    server.run().await?;
    Ok(())
}
