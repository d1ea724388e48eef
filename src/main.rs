//! Watches a video of a blackjack table, keeps count of every card that has
//! shown up, and reports next-draw odds as the hand develops.
//! Usage: deckwatch <video> [data_dir] [frame_interval_ms]

mod pipeline;
mod session;

use anyhow::{Context, Result};
use bj_vision::{SheetMatcher, VisionConfig};
use session::CountingSession;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deckwatch=info,bj_capture=info,bj_vision=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <video> [data_dir] [frame_interval_ms]", args[0]);
        std::process::exit(1);
    }

    let video_path = PathBuf::from(&args[1]);
    let data_dir = if args.len() >= 3 {
        PathBuf::from(&args[2])
    } else {
        PathBuf::from("./data")
    };
    let frame_interval_ms: u64 = if args.len() >= 4 {
        args[3]
            .parse()
            .context("frame_interval_ms must be an integer")?
    } else {
        100
    };

    let config = load_config(&data_dir)?;
    let matcher = SheetMatcher::load(&data_dir)?;
    let session = CountingSession::new(matcher, config);

    info!(
        "starting session: {} (templates from {})",
        video_path.display(),
        data_dir.display()
    );

    pipeline::run_video(
        &video_path,
        Duration::from_millis(frame_interval_ms),
        session,
    )
    .await
}

/// Detection config: data_dir/config.json if present, defaults otherwise.
fn load_config(data_dir: &std::path::Path) -> Result<VisionConfig> {
    let path = data_dir.join("config.json");
    if path.exists() {
        let content =
            std::fs::read_to_string(&path).context("Failed to read config.json")?;
        let config = serde_json::from_str(&content).context("Failed to parse config.json")?;
        info!("loaded detection config from {}", path.display());
        Ok(config)
    } else {
        Ok(VisionConfig::default())
    }
}
