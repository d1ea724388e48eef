use serde::{Deserialize, Serialize};

#[cfg(feature = "video")]
pub mod video;

/// Status of the frame feed, updated alongside every delivered frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedStatus {
    pub is_playing: bool,
    pub source: Option<String>,
    pub fps: f64,
    pub frames_seen: u64,
    pub resolution: Option<(u32, u32)>,
}

impl Default for FeedStatus {
    fn default() -> Self {
        Self {
            is_playing: false,
            source: None,
            fps: 0.0,
            frames_seen: 0,
            resolution: None,
        }
    }
}
