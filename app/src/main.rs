//! Tile grid binary
//!
//! Draws the grid after every change and adds a tile for each add command
//! read from stdin. The count is restored on the next start.

use anyhow::Context;
use std::sync::Arc;
use tilegrid::grid;
use tilegrid::input::{Input, parse_input};
use tilegrid::{AppConfig, CounterEnvironment, CounterStore, FileSavedState, TextRenderer};
use tilegrid_runtime::metrics::describe_metrics;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tilegrid=info,tilegrid_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    describe_metrics();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(
        state_path = %config.state_path.display(),
        columns = config.grid.columns,
        "Starting tile grid"
    );

    let saved_state = Arc::new(FileSavedState::open(&config.state_path));
    let store = CounterStore::with_config(
        CounterEnvironment::new(saved_state),
        config.store_config(),
    );

    let renderer = TextRenderer::new(config.color);
    let grid_config = config.grid.clone();
    let _subscription = store
        .subscribe(move |count| {
            print!("{}", renderer.render(&grid::layout(count, &grid_config)));
            println!("[enter/a/+] add tile   [q] quit");
        })
        .await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match parse_input(&line) {
            Some(Input::Add) => store.add_item().await,
            Some(Input::Quit) => break,
            None => println!("Unknown command {:?}", line.trim()),
        }
    }

    let health = store.health();
    if health.status.is_healthy() {
        tracing::info!(count = store.current_value(), "Exiting");
    } else {
        tracing::warn!(
            count = store.current_value(),
            status = %health.status,
            detail = health.message.as_deref().unwrap_or_default(),
            "Exiting with unsaved changes"
        );
    }

    Ok(())
}
