// System status display — DB stats and which sources are usable.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;

/// Display system status to the terminal.
pub async fn show(config: &Config, db: Option<&Arc<dyn Store>>) -> Result<()> {
    println!("{}", "Sources".bold());

    if config.reddit_credentials().is_some() {
        println!("  Reddit:  {} (user agent: {})", "configured".green(), config.reddit_user_agent);
    } else {
        println!("  Reddit:  {}", "disabled".yellow());
        println!("    Set REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET to enable it");
    }

    match &config.chrome_path {
        Some(path) if path.exists() => {
            println!("  Twitter: {} ({})", "browser found".green(), path.display())
        }
        Some(path) => println!(
            "  Twitter: {} (CHROME_PATH {} does not exist)",
            "disabled".red(),
            path.display()
        ),
        None => println!(
            "  Twitter: {} (CHROME_PATH unset, browser located at launch)",
            "auto-detect".normal()
        ),
    }

    println!("\n{}", "Database".bold());
    let Some(db) = db else {
        println!("  not initialized");
        println!("  Run `rumour init` to set up the database.");
        return Ok(());
    };

    let file_size = std::fs::metadata(Path::new(&config.db_path))
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("  {} ({})", config.db_path, file_size);
    println!("  Cases submitted: {}", db.case_count().await?);
    println!("  Posts archived:  {}", db.post_count().await?);

    if let Some(latest) = db.recent_posts(1).await?.first() {
        println!(
            "  Newest archived post: {} by {}",
            latest.timestamp.format("%Y-%m-%d %H:%M"),
            latest.username
        );
    }

    Ok(())
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
