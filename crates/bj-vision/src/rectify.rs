use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

use crate::detect::Point;
use crate::GeometryError;

/// Rectify a card quad into a frontal `width` x `height` buffer.
///
/// `corners` must already be in canonical order; the destination rectangle
/// uses the same winding, so the estimated projective transform maps the
/// card's visual top-left onto the buffer origin. Corner sets that admit no
/// projective transform (collinear or repeated points) are rejected instead
/// of producing a garbage warp.
pub fn rectify_card(
    frame: &RgbaImage,
    corners: &[Point; 4],
    width: u32,
    height: u32,
) -> Result<RgbaImage, GeometryError> {
    let src = [
        (corners[0].x as f32, corners[0].y as f32),
        (corners[1].x as f32, corners[1].y as f32),
        (corners[2].x as f32, corners[2].y as f32),
        (corners[3].x as f32, corners[3].y as f32),
    ];
    let dst = [
        (0.0, 0.0),
        (width as f32, 0.0),
        (width as f32, height as f32),
        (0.0, height as f32),
    ];

    let projection =
        Projection::from_control_points(src, dst).ok_or(GeometryError::DegenerateQuad)?;

    let mut card = RgbaImage::new(width, height);
    warp_into(
        frame,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 255]),
        &mut card,
    );
    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Point {
        Point { x, y }
    }

    #[test]
    fn output_has_requested_size() {
        let frame = RgbaImage::from_pixel(400, 400, Rgba([200, 200, 200, 255]));
        let corners = [p(50, 50), p(250, 50), p(250, 330), p(50, 330)];
        let card = rectify_card(&frame, &corners, 73, 103).unwrap();
        assert_eq!(card.dimensions(), (73, 103));
    }

    #[test]
    fn axis_aligned_region_maps_onto_buffer() {
        // Frame is dark except for a bright region exactly under the quad.
        let frame = RgbaImage::from_fn(400, 400, |x, y| {
            if (50..250).contains(&x) && (50..330).contains(&y) {
                Rgba([220, 220, 220, 255])
            } else {
                Rgba([10, 10, 10, 255])
            }
        });
        let corners = [p(50, 50), p(249, 50), p(249, 329), p(50, 329)];
        let card = rectify_card(&frame, &corners, 73, 103).unwrap();

        // The middle of the card must come from the bright region.
        assert!(card.get_pixel(36, 51)[0] > 200);
        assert!(card.get_pixel(5, 5)[0] > 200);
    }

    #[test]
    fn collinear_corners_rejected() {
        let frame = RgbaImage::from_pixel(400, 400, Rgba([200, 200, 200, 255]));
        let corners = [p(10, 10), p(110, 110), p(210, 210), p(310, 310)];
        assert!(matches!(
            rectify_card(&frame, &corners, 73, 103),
            Err(GeometryError::DegenerateQuad)
        ));
    }

    #[test]
    fn repeated_corner_rejected() {
        let frame = RgbaImage::from_pixel(400, 400, Rgba([200, 200, 200, 255]));
        let corners = [p(10, 10), p(10, 10), p(200, 200), p(10, 200)];
        assert!(matches!(
            rectify_card(&frame, &corners, 73, 103),
            Err(GeometryError::DegenerateQuad)
        ));
    }
}
