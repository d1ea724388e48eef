use image::RgbaImage;
use imageproc::contours::find_contours_with_threshold;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::VisionConfig;

/// 2D pixel coordinate in frame space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl From<imageproc::point::Point<i32>> for Point {
    fn from(p: imageproc::point::Point<i32>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// A contour that passed the card-shape filters: exactly four polygon
/// vertices and a plausibly card-sized bounding box. Corner order is
/// whatever the polygon approximation produced.
#[derive(Debug, Clone)]
pub struct CandidateQuad {
    pub corners: [Point; 4],
    /// The originating contour, untouched.
    pub contour: Vec<Point>,
}

/// Find card-shaped quads in a frame.
///
/// The frame is binarized and traced for contours. Contours with enough
/// points are approximated to polygons at a tolerance of
/// `poly_tolerance` x perimeter; only four-vertex polygons whose
/// axis-aligned bounding box falls strictly inside the configured area band
/// survive.
pub fn find_card_candidates(frame: &RgbaImage, config: &VisionConfig) -> Vec<CandidateQuad> {
    let gray = image::imageops::grayscale(frame);
    let contours = find_contours_with_threshold::<i32>(&gray, config.binary_threshold);
    let total = contours.len();

    let mut quads = Vec::new();
    for contour in contours {
        if contour.points.len() <= config.min_contour_points {
            continue;
        }

        let perimeter = arc_length(&contour.points, true);
        let poly =
            approximate_polygon_dp(&contour.points, config.poly_tolerance * perimeter, true);
        if poly.len() != 4 {
            continue;
        }

        let area = bounding_box_area(&poly);
        if area <= config.min_area as i64 || area >= config.max_area as i64 {
            continue;
        }

        quads.push(CandidateQuad {
            corners: [
                poly[0].into(),
                poly[1].into(),
                poly[2].into(),
                poly[3].into(),
            ],
            contour: contour.points.into_iter().map(Point::from).collect(),
        });
    }

    debug!("{} candidate quad(s) out of {} contour(s)", quads.len(), total);
    quads
}

fn bounding_box_area(poly: &[imageproc::point::Point<i32>]) -> i64 {
    let min_x = poly.iter().map(|p| p.x).min().unwrap_or(0);
    let max_x = poly.iter().map(|p| p.x).max().unwrap_or(0);
    let min_y = poly.iter().map(|p| p.y).min().unwrap_or(0);
    let max_y = poly.iter().map(|p| p.y).max().unwrap_or(0);
    (max_x - min_x + 1) as i64 * (max_y - min_y + 1) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Frame with a single bright filled rectangle on dark felt.
    fn frame_with_rect(x0: u32, y0: u32, w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(640, 480, |x, y| {
            if x >= x0 && x < x0 + w && y >= y0 && y < y0 + h {
                Rgba([240, 240, 240, 255])
            } else {
                Rgba([25, 40, 25, 255])
            }
        })
    }

    #[test]
    fn card_sized_rect_accepted() {
        let frame = frame_with_rect(80, 60, 250, 150);
        let quads = find_card_candidates(&frame, &VisionConfig::default());
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].corners.len(), 4);
        assert!(quads[0].contour.len() > 400);

        // Corners sit on the rectangle's outline.
        for corner in &quads[0].corners {
            assert!(corner.x >= 80 && corner.x <= 329);
            assert!(corner.y >= 60 && corner.y <= 209);
        }
    }

    #[test]
    fn undersized_rect_rejected() {
        let frame = frame_with_rect(80, 60, 120, 110);
        let quads = find_card_candidates(&frame, &VisionConfig::default());
        assert!(quads.is_empty());
    }

    #[test]
    fn oversized_rect_rejected() {
        let frame = frame_with_rect(10, 10, 400, 300);
        let quads = find_card_candidates(&frame, &VisionConfig::default());
        assert!(quads.is_empty());
    }

    #[test]
    fn round_blob_rejected() {
        // A disc survives the length and area cuts but never approximates
        // to four vertices.
        let frame = RgbaImage::from_fn(640, 480, |x, y| {
            let dx = x as i64 - 320;
            let dy = y as i64 - 240;
            if dx * dx + dy * dy <= 100 * 100 {
                Rgba([240, 240, 240, 255])
            } else {
                Rgba([25, 40, 25, 255])
            }
        });
        let quads = find_card_candidates(&frame, &VisionConfig::default());
        assert!(quads.is_empty());
    }

    #[test]
    fn empty_frame_yields_nothing() {
        let frame = RgbaImage::from_pixel(640, 480, Rgba([25, 40, 25, 255]));
        assert!(find_card_candidates(&frame, &VisionConfig::default()).is_empty());
    }
}
