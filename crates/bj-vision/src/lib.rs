mod color;
mod corners;
mod detect;
mod matcher;
mod rectify;

pub use bj_data::CardColor;
pub use color::classify_color;
pub use corners::canonical_corners;
pub use detect::{find_card_candidates, CandidateQuad, Point};
pub use matcher::{
    Identification, SheetMatcher, CARD_HEIGHT, CARD_WIDTH, SHEET_COLUMNS, SHEET_ROWS,
};
pub use rectify::rectify_card;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tagged geometry failure for one candidate quad. The frame pipeline skips
/// the candidate and moves on; nothing downstream sees a malformed quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// The corner set does not split into two top and two bottom points
    /// around its centroid.
    #[error("corner partition is not two-top/two-bottom")]
    CornerPartition,
    /// The corners are collinear or repeated; no projective transform maps
    /// them onto a rectangle.
    #[error("corners admit no projective transform")]
    DegenerateQuad,
}

/// Tunable detection constants. All trade scan cost against detection
/// robustness; none change the shape of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Binarization cutoff applied before contour tracing.
    pub binary_threshold: u8,
    /// Contours at or below this many points are skipped outright.
    pub min_contour_points: usize,
    /// Polygon approximation tolerance, as a fraction of contour perimeter.
    pub poly_tolerance: f64,
    /// Accepted bounding-box area band, exclusive on both ends.
    pub min_area: u32,
    pub max_area: u32,
    /// Identifications scoring below this are discarded rather than counted.
    pub min_match_score: f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            binary_threshold: 128,
            min_contour_points: 400,
            poly_tolerance: 0.01,
            min_area: 20_000,
            max_area: 100_000,
            min_match_score: 0.5,
        }
    }
}

/// One card identified in a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedCard {
    pub rank: u8,
    pub suit: u8,
    pub suit_name: String,
    pub color: CardColor,
    pub score: f64,
    /// Canonicalized source quad, frame coordinates.
    pub corners: [Point; 4],
}

/// Everything the vision pipeline extracted from one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameDetections {
    /// Quad candidates that passed the shape filters.
    pub candidates: usize,
    pub cards: Vec<DetectedCard>,
}

/// Run the full per-frame pipeline: quad detection, corner
/// canonicalization, rectification, color classification, sheet matching.
///
/// Candidates that fail a geometric stage are skipped with a debug note;
/// identifications under the score floor are discarded.
pub fn process_frame(
    frame: &RgbaImage,
    matcher: &SheetMatcher,
    config: &VisionConfig,
) -> FrameDetections {
    let candidates = find_card_candidates(frame, config);
    let mut cards = Vec::new();

    for quad in &candidates {
        let corners = match canonical_corners(&quad.corners) {
            Ok(c) => c,
            Err(e) => {
                debug!("candidate skipped: {}", e);
                continue;
            }
        };
        let card_img =
            match rectify_card(frame, &corners, matcher.card_width(), matcher.card_height()) {
                Ok(img) => img,
                Err(e) => {
                    debug!("candidate skipped: {}", e);
                    continue;
                }
            };
        let color = classify_color(&card_img);
        let Some(id) = matcher.identify(&card_img, color) else {
            warn!("card buffer does not fit the template sheet, skipped");
            continue;
        };
        if id.score < config.min_match_score {
            debug!(
                "weak match discarded: rank {} {} score {:.3}",
                id.rank, id.suit_name, id.score
            );
            continue;
        }
        cards.push(DetectedCard {
            rank: id.rank,
            suit: id.suit,
            suit_name: id.suit_name,
            color,
            score: id.score,
            corners,
        });
    }

    FrameDetections {
        candidates: candidates.len(),
        cards,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba};

    const CW: u32 = 16;
    const CH: u32 = 22;

    fn cell_pattern(col: u32, row: u32, x: u32, y: u32) -> u8 {
        let k = x * 31 + y * 17 + (x / 3) * (y / 5) + col * 97 + row * 131;
        if k % 7 < 3 {
            150
        } else {
            255
        }
    }

    fn test_matcher() -> SheetMatcher {
        let sheet = |seed: u32| {
            GrayImage::from_fn(CW * SHEET_COLUMNS, CH * SHEET_ROWS, |x, y| {
                Luma([cell_pattern(x / CW + seed, y / CH + seed, x % CW, y % CH)])
            })
        };
        let names = vec![
            "spades".to_string(),
            "clubs".to_string(),
            "diamond".to_string(),
            "hearts".to_string(),
        ];
        SheetMatcher::new(sheet(0), sheet(5), names).unwrap()
    }

    /// 400x400 dark felt with one upright card: a 6x blowup of the black
    /// sheet's (col, row) cell at (150, 100).
    fn frame_with_card(col: u32, row: u32) -> RgbaImage {
        let scale = 6;
        let (w, h) = (CW * scale, CH * scale);
        RgbaImage::from_fn(400, 400, |x, y| {
            if x >= 150 && x < 150 + w && y >= 100 && y < 100 + h {
                let v = cell_pattern(col, row, (x - 150) / scale, (y - 100) / scale);
                Rgba([v, v, v, 255])
            } else {
                Rgba([30, 30, 30, 255])
            }
        })
    }

    fn test_config() -> VisionConfig {
        // The synthetic card is smaller than a full-resolution one.
        VisionConfig {
            min_area: 5_000,
            ..VisionConfig::default()
        }
    }

    #[test]
    fn frame_pipeline_identifies_the_card() {
        let matcher = test_matcher();
        let frame = frame_with_card(1, 6);
        let result = process_frame(&frame, &matcher, &test_config());

        assert_eq!(result.candidates, 1);
        assert_eq!(result.cards.len(), 1);
        let card = &result.cards[0];
        assert_eq!(card.rank, 7);
        assert_eq!(card.suit, 1);
        assert_eq!(card.suit_name, "clubs");
        assert_eq!(card.color, CardColor::Black);
        assert!(card.score > 0.9, "score {}", card.score);
    }

    #[test]
    fn suit_is_consistent_with_color_tag() {
        let matcher = test_matcher();
        let frame = frame_with_card(0, 3);
        let result = process_frame(&frame, &matcher, &test_config());

        assert_eq!(result.cards.len(), 1);
        let card = &result.cards[0];
        // Grayscale ink reads black, and black cards may only land on the
        // black suit columns.
        assert_eq!(card.color, CardColor::Black);
        assert!(card.suit <= 1);
    }

    #[test]
    fn score_floor_discards_weak_matches() {
        let matcher = test_matcher();
        let frame = frame_with_card(1, 6);
        let config = VisionConfig {
            min_match_score: 1.1,
            ..test_config()
        };
        let result = process_frame(&frame, &matcher, &config);

        assert_eq!(result.candidates, 1);
        assert!(result.cards.is_empty());
    }

    #[test]
    fn empty_frame_produces_empty_detections() {
        let matcher = test_matcher();
        let frame = RgbaImage::from_pixel(400, 400, Rgba([30, 30, 30, 255]));
        let result = process_frame(&frame, &matcher, &test_config());
        assert_eq!(result.candidates, 0);
        assert!(result.cards.is_empty());
    }
}
