use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tournaments::{
    config::ConfigLoader,
    db,
    reconcile::{ReconcileMode, reconcile_owner_indexes},
    store::SeaOrmStore,
    telemetry,
};

/// Find tournaments missing from their owner's index and optionally repair them.
#[derive(Debug, Parser)]
#[command(name = "reconcile_tournament_index")]
struct Args {
    /// Rewrite affected indexes instead of only reporting them
    #[arg(long)]
    apply: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loader = ConfigLoader::new();
    let config = loader.load().context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing telemetry")?;
    tracing::info!(profile = %config.profile, apply = args.apply, "Reconciling tournament indexes");

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    let store = SeaOrmStore::new(Arc::new(db));

    let mode = if args.apply {
        ReconcileMode::Apply
    } else {
        ReconcileMode::DryRun
    };

    let report = reconcile_owner_indexes(&store, mode)
        .await
        .context("reconciling tournament indexes")?;

    for orphan in &report.orphans {
        println!(
            "orphan: tournament {} owned by {}",
            orphan.tournament_id, orphan.user_id
        );
    }
    println!(
        "Scanned {} user(s), found {} orphaned tournament(s), repaired {} index(es){}.",
        report.users_scanned,
        report.orphans.len(),
        report.users_repaired,
        if args.apply { "" } else { " (dry run)" }
    );

    Ok(())
}
