// QuickNote - headless host for the note store
// Opens the store, reports the library, and flushes pending edits on Ctrl-C

use quicknote::app::AppState;
use quicknote::services::{FilterCounts, NoteFilter};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quicknote=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting QuickNote");

    let data_dir = match std::env::var_os("QUICKNOTE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => AppState::default_data_dir()?,
    };

    let state = AppState::initialize(&data_dir).await?;

    let counts = FilterCounts::tally(&state.store.fetch_all());
    for filter in NoteFilter::ALL {
        tracing::info!("{}: {}", filter.label(), counts.get(filter));
    }

    let mut events = state.store.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => tracing::debug!("Store event: {:?}", event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} store events", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    state.shutdown().await?;

    Ok(())
}
