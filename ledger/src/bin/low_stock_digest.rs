//! Low-stock digest runner
//!
//! Renders the daily low-stock summary from unresolved, not-yet-emailed
//! alerts and marks them as notified. Mail transport is the operator's
//! concern: this binary writes the digest body to stdout for the
//! surrounding cron/mailer wrapper, and leaves the alerts pending if it
//! fails before finishing.

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockflow_ledger::services::alerts::{digest_text, AlertService};
use stockflow_ledger::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockflow_ledger=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    let alerts = AlertService::new(pool);
    let pending = alerts.pending_notification().await?;

    if pending.is_empty() {
        tracing::info!("no new low stock alerts to email");
        return Ok(());
    }

    println!("[Stockflow] Daily Low Stock Summary");
    println!();
    println!("{}", digest_text(&pending));

    let ids: Vec<_> = pending.iter().map(|alert| alert.id).collect();
    let marked = alerts.mark_notified(&ids).await?;
    tracing::info!(alerts = marked, "low stock digest emitted");

    Ok(())
}
