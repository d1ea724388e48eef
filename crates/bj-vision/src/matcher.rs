use anyhow::{bail, Context, Result};
use bj_data::CardColor;
use image::{imageops, GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Sheet geometry: suit columns across, rank rows down, ranks ascending.
pub const SHEET_COLUMNS: u32 = 2;
pub const SHEET_ROWS: u32 = 13;

/// Cell size of the reference template sheets shipped with the app. Bigger
/// cells cost correlation time and buy identification robustness; the
/// proportions match a physical card.
pub const CARD_WIDTH: u32 = 73;
pub const CARD_HEIGHT: u32 = 103;

/// Rank and suit read off a template sheet, with the winning correlation
/// score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identification {
    pub rank: u8,
    pub suit: u8,
    pub suit_name: String,
    pub score: f64,
}

/// One preloaded sheet, with a summed-area table of squared intensities for
/// the correlation denominators.
struct TemplateSheet {
    gray: GrayImage,
    sq_integral: Vec<u64>,
}

impl TemplateSheet {
    fn new(gray: GrayImage) -> Result<Self> {
        let (w, h) = gray.dimensions();
        if w == 0 || h == 0 || w % SHEET_COLUMNS != 0 || h % SHEET_ROWS != 0 {
            bail!(
                "template sheet must divide into a {}x{} cell grid, got {}x{}",
                SHEET_COLUMNS,
                SHEET_ROWS,
                w,
                h
            );
        }
        let sq_integral = squared_integral(&gray);
        Ok(Self { gray, sq_integral })
    }

    /// Sum of squared intensities over the `cw` x `ch` patch at (x, y).
    fn patch_sq_sum(&self, x: u32, y: u32, cw: u32, ch: u32) -> u64 {
        let stride = self.gray.width() as usize + 1;
        let (x, y, cw, ch) = (x as usize, y as usize, cw as usize, ch as usize);
        let a = self.sq_integral[y * stride + x];
        let b = self.sq_integral[y * stride + x + cw];
        let c = self.sq_integral[(y + ch) * stride + x];
        let d = self.sq_integral[(y + ch) * stride + x + cw];
        d + a - b - c
    }
}

/// Identifies rank and suit by sliding a rectified card over the reference
/// sheet for its color and taking the strongest normalized correlation,
/// trying both the upright card and its 180-degree rotation.
pub struct SheetMatcher {
    black: TemplateSheet,
    red: TemplateSheet,
    suit_names: Vec<String>,
    cell_width: u32,
    cell_height: u32,
}

impl SheetMatcher {
    /// Load both sheets from the data directory. A missing or malformed
    /// sheet is fatal; nothing can be identified without them.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let data = bj_data::TableData::load(data_dir)?;
        let black = image::open(&data.black_sheet)
            .with_context(|| format!("Failed to open {}", data.black_sheet.display()))?
            .to_luma8();
        let red = image::open(&data.red_sheet)
            .with_context(|| format!("Failed to open {}", data.red_sheet.display()))?
            .to_luma8();
        Self::new(black, red, data.suit_names())
    }

    pub fn new(black: GrayImage, red: GrayImage, suit_names: Vec<String>) -> Result<Self> {
        if black.dimensions() != red.dimensions() {
            bail!(
                "template sheets disagree on size: black {:?}, red {:?}",
                black.dimensions(),
                red.dimensions()
            );
        }
        let (w, h) = black.dimensions();
        let black = TemplateSheet::new(black)?;
        let red = TemplateSheet::new(red)?;
        let cell_width = w / SHEET_COLUMNS;
        let cell_height = h / SHEET_ROWS;
        if (cell_width, cell_height) != (CARD_WIDTH, CARD_HEIGHT) {
            debug!(
                "non-standard cell size {}x{} (reference sheets use {}x{})",
                cell_width, cell_height, CARD_WIDTH, CARD_HEIGHT
            );
        }
        info!(
            "sheet matcher ready: {} cells of {}x{}",
            SHEET_COLUMNS * SHEET_ROWS * 2,
            cell_width,
            cell_height
        );
        Ok(Self {
            black,
            red,
            suit_names,
            cell_width,
            cell_height,
        })
    }

    /// Rectification target size: one sheet cell.
    pub fn card_width(&self) -> u32 {
        self.cell_width
    }

    pub fn card_height(&self) -> u32 {
        self.cell_height
    }

    /// Identify a rectified card against the sheet for its color tag.
    ///
    /// The winning maximum's grid cell gives rank (row) and suit (column
    /// plus the color's offset), so red cards always land on suits 2-3 and
    /// black cards on 0-1. Weak matches are still returned; score-based
    /// rejection is the caller's policy. `None` only when the buffer cannot
    /// be slid over the sheet at all.
    pub fn identify(&self, card: &RgbaImage, color: CardColor) -> Option<Identification> {
        let sheet = match color {
            CardColor::Black => &self.black,
            CardColor::Red => &self.red,
        };
        let gray = imageops::grayscale(card);

        let upright = best_correlation(sheet, &gray)?;
        let flipped = best_correlation(sheet, &imageops::rotate180(&gray))?;
        // An in-plane rotated card can match its cell far better upside
        // down; keep whichever orientation peaks higher.
        let (score, x, y) = if upright.0 >= flipped.0 { upright } else { flipped };

        let rank = (y / self.cell_height) as u8 + 1;
        let suit = (x / self.cell_width) as u8 + color.suit_offset();
        let suit_name = self
            .suit_names
            .get(suit as usize)
            .cloned()
            .unwrap_or_default();
        debug!(
            "matched rank {} {} at ({}, {}), score {:.3}",
            rank, suit_name, x, y, score
        );

        Some(Identification {
            rank,
            suit,
            suit_name,
            score,
        })
    }
}

/// Best normalized cross-correlation of `card` over every placement inside
/// `sheet`: dot(I, T) / sqrt(sum(I^2) * sum(T^2)), no mean subtraction.
/// Returns (score, x, y) of the global maximum.
fn best_correlation(sheet: &TemplateSheet, card: &GrayImage) -> Option<(f64, u32, u32)> {
    let (sw, sh) = sheet.gray.dimensions();
    let (cw, ch) = card.dimensions();
    if cw == 0 || ch == 0 || cw > sw || ch > sh {
        return None;
    }

    let sheet_px = sheet.gray.as_raw();
    let card_px = card.as_raw();
    let card_sq_sum: u64 = card_px.iter().map(|&v| (v as u64) * (v as u64)).sum();
    let card_norm = (card_sq_sum as f64).sqrt();

    let mut best = (f64::NEG_INFINITY, 0u32, 0u32);
    for y in 0..=(sh - ch) {
        for x in 0..=(sw - cw) {
            let mut dot = 0u64;
            for row in 0..ch {
                let s0 = ((y + row) * sw + x) as usize;
                let c0 = (row * cw) as usize;
                let srow = &sheet_px[s0..s0 + cw as usize];
                let crow = &card_px[c0..c0 + cw as usize];
                dot += srow
                    .iter()
                    .zip(crow)
                    .map(|(&s, &c)| s as u64 * c as u64)
                    .sum::<u64>();
            }
            let denom = card_norm * (sheet.patch_sq_sum(x, y, cw, ch) as f64).sqrt();
            let score = if denom > 0.0 { dot as f64 / denom } else { 0.0 };
            if score > best.0 {
                best = (score, x, y);
            }
        }
    }
    Some(best)
}

/// Summed-area table of squared intensities, (w + 1) x (h + 1).
fn squared_integral(img: &GrayImage) -> Vec<u64> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let stride = w + 1;
    let mut table = vec![0u64; stride * (h + 1)];
    let px = img.as_raw();
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            let v = px[y * w + x] as u64;
            row_sum += v * v;
            table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
        }
    }
    table
}
