use stockinsight::{cli, utils};

#[tokio::main]
async fn main() {
    utils::init_tracing();

    if let Err(e) = cli::run().await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}
