use crate::config::AppConfig;
use crate::error::Result;
use crate::services::SqliteStore;

pub async fn run(config: AppConfig) -> Result<()> {
    println!("📊 Price Store Status\n");

    if !config.database_path.exists() {
        println!("⚠️  No database at {}. Run 'serve' or 'analyze' first.", config.database_path.display());
        return Ok(());
    }

    let store = SqliteStore::new(config.database_path.clone()).await?;
    let result = show_status(&store).await;
    store.close().await;
    result
}

async fn show_status(store: &SqliteStore) -> Result<()> {
    let stats = store.stats().await?;

    println!("📁 Database:   {}", store.database_path().display());
    println!("📈 Rows:       {}", format_number(stats.total_records as usize));
    println!("🔹 Symbols:    {}", format_number(stats.unique_symbols as usize));
    println!("⭐ Wishlisted: {}", format_number(stats.wishlist_entries as usize));
    match &stats.date_range {
        Some((first, last)) => println!("📅 Dates:      {} → {}", first, last),
        None => {
            println!("\n⚠️  No price data stored yet.");
            return Ok(());
        }
    }

    println!("\n═══════════════════════════════════════════════════════════\n");
    for summary in store.symbol_summaries().await? {
        println!(
            "🔹 {:<8} {:>8} rows  ({} → {})",
            summary.symbol,
            format_number(summary.row_count as usize),
            summary.first_date,
            summary.last_date
        );
    }

    Ok(())
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}
