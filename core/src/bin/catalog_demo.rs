//! Walks through a typical catalog session against a running server:
//! login, browse, add a book, toggle it, read statistics, logout.

use std::time::Duration;

use anyhow::Result;
use catalog_core::{BookFilter, CatalogClient, ClientConfig, NewBook};
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the catalog API, including the `/api` prefix
    #[arg(long, env = "CATALOG_API_URL", default_value = catalog_core::config::DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(short, long, default_value = "admin")]
    username: String,

    #[arg(short, long, default_value = "admin")]
    password: String,

    /// Per-request timeout in seconds; unset means wait indefinitely
    #[arg(long, env = "CATALOG_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level: tracing::Level = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);
    tracing_subscriber::registry().with(stderr_layer).init();

    let mut config = ClientConfig::new(&args.base_url)?;
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let client = CatalogClient::new(&config)?;

    let outcome = client.login(&args.username, &args.password).await?;
    tracing::info!(message = %outcome.message, admin = outcome.session.is_admin(), "logged in");

    let books = client.list_books(&BookFilter::default()).await?;
    tracing::info!(count = books.len(), "all books");

    let unread = client.list_books(&BookFilter::read(false)).await?;
    tracing::info!(count = unread.len(), "unread books");

    let found = client.list_books(&BookFilter::search("fantasy")).await?;
    tracing::info!(count = found.len(), "search results for \"fantasy\"");

    let published_date = NaiveDate::from_ymd_opt(1954, 7, 29)
        .ok_or_else(|| anyhow::anyhow!("invalid publication date"))?;
    let book = client
        .create_book(&NewBook {
            title: "The Lord of the Rings".to_string(),
            author: "J.R.R. Tolkien".to_string(),
            description: "An epic fantasy novel about the quest to destroy a powerful ring."
                .to_string(),
            published_date,
            isbn: Some("9780547928210".to_string()),
            is_read: false,
        })
        .await?;
    tracing::info!(id = book.id, title = %book.title, "created book");

    let toggled = client.toggle_book_read(book.id).await?;
    tracing::info!(id = toggled.id, is_read = toggled.is_read, "toggled read status");

    let stats = client.book_statistics().await?;
    tracing::info!(
        total = stats.total_books,
        read = stats.read_books,
        read_percentage = stats.read_percentage,
        "book statistics"
    );

    let notifications = client.list_notifications().await?;
    tracing::info!(count = notifications.len(), "notifications");

    if outcome.session.is_admin() {
        let system = client.system_statistics().await?;
        tracing::info!(
            books = system.book_stats.total_books,
            users = system.user_stats.total_users,
            notifications = system.total_notifications,
            "system statistics"
        );
    }

    let outcome = client.logout().await?;
    tracing::info!(message = %outcome.message, "logged out");

    Ok(())
}
