use std::sync::Arc;
use tracing::info;
use transaction_insight_agent::{
    agent::InsightAgent,
    api::start_server,
    bunq::BunqClient,
    gemini::GeminiClient,
    memory::InMemorySessionStore,
    service::QueryService,
    tools::create_default_registry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let gemini_api_key = std::env::var("GEMINI_API_KEY").unwrap_or_else(|_| {
        eprintln!("GEMINI_API_KEY not set in .env");
        String::new()
    });

    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("Transaction Insight Agent - API Server");
    info!("Port: {}", port);

    // Create components
    let source = BunqClient::from_env()
        .ok_or("BUNQ_SESSION_TOKEN (or BUNQ_API_KEY) not configured")?;
    let completion = Arc::new(GeminiClient::new(gemini_api_key));
    let registry = create_default_registry(Arc::new(source));
    let memory = Arc::new(InMemorySessionStore::new());

    let agent = Arc::new(InsightAgent::new(completion, registry, memory));
    let service = Arc::new(QueryService::new(agent));

    info!("Pipeline initialized");
    info!("Starting API server...");

    start_server(service, port).await?;

    Ok(())
}
