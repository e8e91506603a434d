//! CLI command implementations.

use anyhow::{Context, Result};
use campus_config::{SiteConfig, parse_site_config};
use campus_crawler::{Crawler, IndexOutcome, rebuild_index};
use campus_db::{PgSearchRepo, create_pool, run_migrations};
use tracing::info;

pub fn validate(path: &str) -> Result<()> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let config = match parse_site_config(&content).and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    println!("Configuration is valid");
    println!("  site:     {} ({})", config.name, config.public_url);
    println!("  listen:   {}", config.server.listen);
    println!(
        "  storage:  {} bucket {} served from {}",
        config.storage.backend, config.storage.bucket, config.storage.cdn_url
    );
    println!(
        "  crawler:  {} (max {} pages, {:?} per page, {:?} total)",
        config.crawler.start_url,
        config.crawler.max_pages,
        config.crawler.page_timeout,
        config.crawler.total_budget
    );
    println!(
        "  secrets:  admin token {}, cron secret {}",
        if config.admin_token.is_some() { "set" } else { "unset" },
        if config.cron_secret.is_some() { "set" } else { "unset" },
    );
    Ok(())
}

fn load(path: &str) -> Result<SiteConfig> {
    SiteConfig::load_or_default(path).with_context(|| format!("loading {}", path))
}

pub async fn migrate(config_path: &str) -> Result<()> {
    let config = load(config_path)?;
    let pool = create_pool(&config.database.url, 1).await?;
    let total = run_migrations(&pool).await?;
    println!("schema at {} migration(s)", total);
    Ok(())
}

pub async fn crawl(config_path: &str, dry_run: bool) -> Result<()> {
    let config = load(config_path)?;
    let crawler = Crawler::new(config.crawler.clone())?;
    info!(start = %crawler.start_url(), dry_run, "Crawling site");
    let report = crawler.crawl().await;

    if dry_run {
        for doc in &report.documents {
            println!("{}\t{}", doc.url, doc.title);
        }
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
        return Ok(());
    }

    let pool = create_pool(&config.database.url, config.database.max_connections).await?;
    let repo = PgSearchRepo::new(pool);
    match rebuild_index(&repo, &report).await? {
        IndexOutcome::Replaced(count) => println!("Indexed {} pages", count),
        IndexOutcome::Skipped => println!("No pages found, search index left unchanged"),
    }
    println!("{}", serde_json::to_string_pretty(&report.summary())?);
    Ok(())
}
