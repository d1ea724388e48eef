use bj_data::CardColor;
use image::{imageops, RgbaImage};

/// Red-hue band, OpenCV HSV ranges (H in [0, 180), S and V in [0, 255]).
const RED_HUE_MAX: u8 = 10;
const RED_SAT_MIN: u8 = 70;
const RED_VAL_MIN: u8 = 50;

/// Label a rectified card as red or black.
///
/// Only the top-left corner of the card is inspected, where the pip sits on
/// an upright face. A single pixel inside the red band settles it; black
/// pips never produce one. Splitting by color halves the sheet the matcher
/// has to search.
pub fn classify_color(card: &RgbaImage) -> CardColor {
    let scaled = imageops::resize(card, 100, 100, imageops::FilterType::Triangle);
    let pip = imageops::crop_imm(&scaled, 5, 5, 20, 10).to_image();
    let pip = imageops::resize(&pip, 50, 70, imageops::FilterType::Triangle);

    for px in pip.pixels() {
        let (h, s, v) = rgb_to_hsv(px[0], px[1], px[2]);
        if h <= RED_HUE_MAX && s >= RED_SAT_MIN && v >= RED_VAL_MIN {
            return CardColor::Red;
        }
    }
    CardColor::Black
}

/// RGB to HSV with OpenCV scaling: hue halved into [0, 180), saturation and
/// value in [0, 255].
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let hue = if hue < 0.0 { hue + 360.0 } else { hue };

    let sat = if max == 0.0 { 0.0 } else { delta / max };

    (
        (hue / 2.0).round() as u8,
        (sat * 255.0).round() as u8,
        (max * 255.0).round() as u8,
    )
}
