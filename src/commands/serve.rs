use crate::config::{AppConfig, CorsOrigins};
use crate::error::Result;
use crate::server;

pub async fn run(config: AppConfig) -> Result<()> {
    println!("🚀 Starting stockinsight server on port {}", config.port);
    println!("📁 Database: {}", config.database_path.display());
    println!("🌐 Market data: {}", config.yahoo_base_url);
    println!(
        "⏱️  Fetch timeout: {}s, rate limit: {}/min",
        config.fetch_timeout.as_secs(),
        config.rate_limit_per_minute
    );
    match &config.cors_origins {
        CorsOrigins::Any => println!("🔓 CORS: any origin"),
        CorsOrigins::List(origins) => println!("🔒 CORS: {}", origins.join(", ")),
    }

    server::serve(config).await
}
