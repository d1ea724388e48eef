use crate::FeedStatus;
use image::RgbaImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};

/// Decode a video file and send RGBA frames through the watch channel at the
/// requested pace. The receiver sees only the latest frame; a slow consumer
/// drops intermediate frames rather than lagging behind the table.
///
/// Returns normally when the file runs out of frames.
pub async fn video_loop(
    path: &Path,
    frame_tx: watch::Sender<Option<Arc<RgbaImage>>>,
    status_tx: watch::Sender<FeedStatus>,
    frame_interval: Duration,
    stop: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let source = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    info!("video loop starting: {}", path.display());

    let path_owned = path.to_path_buf();
    let (decode_tx, mut decode_rx) = tokio::sync::mpsc::channel::<RgbaImage>(2);

    // Decode on a blocking thread; ffmpeg is synchronous.
    let stop_decode = stop.clone();
    let decode_handle =
        tokio::task::spawn_blocking(move || decode_video(&path_owned, decode_tx, stop_decode));

    let mut frames_seen = 0u64;
    let mut window_frames = 0u64;
    let mut fps_timer = Instant::now();

    loop {
        if stop.load(Ordering::Relaxed) {
            info!("video loop stopping (stop signal)");
            break;
        }

        let tick_start = Instant::now();

        match decode_rx.recv().await {
            Some(frame) => {
                let resolution = (frame.width(), frame.height());
                frames_seen += 1;
                window_frames += 1;

                let elapsed = fps_timer.elapsed().as_secs_f64();
                let fps = if elapsed > 0.0 {
                    window_frames as f64 / elapsed
                } else {
                    0.0
                };
                if elapsed > 5.0 {
                    window_frames = 0;
                    fps_timer = Instant::now();
                }

                let _ = status_tx.send(FeedStatus {
                    is_playing: true,
                    source: Some(source.clone()),
                    fps,
                    frames_seen,
                    resolution: Some(resolution),
                });
                let _ = frame_tx.send(Some(Arc::new(frame)));

                // Pace to the requested frame interval.
                let spent = tick_start.elapsed();
                if spent < frame_interval {
                    tokio::time::sleep(frame_interval - spent).await;
                }
            }
            None => {
                info!("video decode complete");
                break;
            }
        }
    }

    match decode_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("video decode error: {}", e),
        Err(e) => warn!("video decode thread panicked: {}", e),
    }

    let _ = status_tx.send(FeedStatus {
        frames_seen,
        ..FeedStatus::default()
    });
    info!("video loop stopped after {} frame(s)", frames_seen);
    Ok(())
}

/// Blocking decode using ffmpeg-next. Sends RGBA frames through the mpsc
/// channel until the file or the receiver is done.
fn decode_video(
    path: &Path,
    tx: tokio::sync::mpsc::Sender<RgbaImage>,
    stop: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    ffmpeg_next::init()?;

    let mut ictx = ffmpeg_next::format::input(path)?;

    let video_stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| anyhow::anyhow!("No video stream found"))?;

    let stream_index = video_stream.index();
    let decoder_ctx =
        ffmpeg_next::codec::context::Context::from_parameters(video_stream.parameters())?;
    let mut decoder = decoder_ctx.decoder().video()?;

    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg_next::format::Pixel::RGBA,
        decoder.width(),
        decoder.height(),
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )?;

    info!(
        "video opened: {}x{}, format {:?}",
        decoder.width(),
        decoder.height(),
        decoder.format()
    );

    let width = decoder.width();
    let height = decoder.height();

    for (stream, packet) in ictx.packets() {
        if stop.load(Ordering::Relaxed) {
            return Ok(());
        }
        if stream.index() != stream_index {
            continue;
        }

        decoder.send_packet(&packet)?;
        if !drain_decoder(&mut decoder, &mut scaler, width, height, &tx, &stop)? {
            return Ok(());
        }
    }

    // Flush whatever the decoder is still holding.
    decoder.send_eof()?;
    drain_decoder(&mut decoder, &mut scaler, width, height, &tx, &stop)?;

    Ok(())
}

/// Pull every pending frame out of the decoder, convert to RGBA and forward
/// it. Returns false once the receiver is gone or a stop was requested.
fn drain_decoder(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    tx: &tokio::sync::mpsc::Sender<RgbaImage>,
    stop: &Arc<AtomicBool>,
) -> anyhow::Result<bool> {
    let mut decoded_frame = ffmpeg_next::frame::Video::empty();
    while decoder.receive_frame(&mut decoded_frame).is_ok() {
        if stop.load(Ordering::Relaxed) {
            return Ok(false);
        }

        let mut rgba_frame = ffmpeg_next::frame::Video::empty();
        scaler.run(&decoded_frame, &mut rgba_frame)?;

        let data = rgba_frame.data(0);
        let stride = rgba_frame.stride(0);

        // Copy row-by-row in case stride != width * 4.
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height as usize {
            let row_start = y * stride;
            let row_end = row_start + (width as usize * 4);
            pixels.extend_from_slice(&data[row_start..row_end]);
        }

        if let Some(img) = RgbaImage::from_raw(width, height, pixels) {
            if tx.blocking_send(img).is_err() {
                return Ok(false);
            }
        }
    }
    Ok(true)
}
