use super::dashboard::render_market;
use super::ui;
use crate::core::market::MarketFeed;
use anyhow::Result;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Prints the current top coins. With `watch` the table is redrawn on every
/// refresh until Ctrl-C.
pub async fn run(feed: &MarketFeed, watch: bool, refresh_secs: u64) -> Result<()> {
    if !watch {
        let pb = ui::new_spinner("Fetching market data...");
        let _ = feed.refresh().await;
        pb.finish_and_clear();
        println!("{}", render_market(feed.snapshot().await.as_ref()));
        return Ok(());
    }

    let mut handle = feed.spawn(Duration::from_secs(refresh_secs.max(1)));
    let mut updates = handle.subscribe();
    let term = console::Term::stdout();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, leaving market watch");
                break;
            }
            update = updates.recv() => match update {
                Ok(_) => {
                    let _ = term.clear_screen();
                    println!("{}", render_market(feed.snapshot().await.as_ref()));
                    println!(
                        "{}",
                        ui::style_text(
                            &format!("Refreshing every {refresh_secs}s. Press Ctrl-C to exit."),
                            ui::StyleType::Subtle
                        )
                    );
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Market updates lagged"),
                Err(RecvError::Closed) => {
                    warn!("Market refresh ended unexpectedly");
                    break;
                }
            }
        }
    }

    handle.stop();
    Ok(())
}
