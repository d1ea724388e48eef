use anyhow::Result;
use bj_capture::FeedStatus;
use image::RgbaImage;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::session::{CountingSession, FrameReport};

/// Run one counting session over a video file: decode frames in the
/// background and feed them to the session strictly one at a time. The deck
/// tracker is only ever touched from this loop. Returns when the video runs
/// out, which is normal termination.
pub async fn run_video(
    path: &Path,
    frame_interval: Duration,
    mut session: CountingSession,
) -> Result<()> {
    let (frame_tx, mut frame_rx) = watch::channel::<Option<Arc<RgbaImage>>>(None);
    let (status_tx, status_rx) = watch::channel(FeedStatus::default());
    let stop = Arc::new(AtomicBool::new(false));

    let decode_path = path.to_path_buf();
    let stop_decode = stop.clone();
    let decode = tokio::spawn(async move {
        if let Err(e) = bj_capture::video::video_loop(
            &decode_path,
            frame_tx,
            status_tx,
            frame_interval,
            stop_decode,
        )
        .await
        {
            warn!("video loop error: {:#}", e);
        }
    });

    while frame_rx.changed().await.is_ok() {
        let frame = frame_rx.borrow_and_update().clone();
        if let Some(frame) = frame {
            let report = session.process_frame(&frame);
            let status = status_rx.borrow().clone();
            log_report(&report, &status);
        }
    }

    decode.await?;
    info!(
        "video finished, {} frame(s) processed",
        session.frames_processed()
    );
    Ok(())
}

/// The rendering stand-in: one log line per frame with everything a status
/// board would show.
fn log_report(report: &FrameReport, status: &FeedStatus) {
    let cards: Vec<String> = report
        .cards
        .iter()
        .map(|c| format!("{} of {} ({:.3})", c.rank, c.suit_name, c.score))
        .collect();
    let removed = report
        .deck
        .iter()
        .filter(|&&s| s != bj_state::CardStatus::InDeck)
        .count();

    info!(
        "frame {} ({:.1} fps): cards [{}], score {}, residual {}, seen {}/52 | win {:.3}, under {:.3}, lose {:.3}",
        report.frame,
        status.fps,
        cards.join(", "),
        report.score,
        report.residual,
        removed,
        report.odds.win,
        report.odds.stay_under,
        report.odds.lose,
    );
}
