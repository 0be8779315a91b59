//! Opacity masks rendered from block text or procedural cloud blobs.

use nimbus_core::Viewport;
use nimbus_fonts::{FILL, GLYPH_HEIGHT, build_banner};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::Result;
use crate::particle::ParamRange;

/// Intensity a pixel must exceed for a particle over it to count as inside.
pub const MEMBERSHIP_THRESHOLD: u8 = 128;

/// Intensity written for covered pixels.
const INK: u8 = 255;

/// Vertical squash applied to every cloud disc.
pub const CLOUD_FLATTEN: f32 = 0.7;

/// Anything that can answer "is this pixel inside the mask".
pub trait Coverage {
    /// Out-of-bounds coordinates are always outside.
    fn is_inside(&self, x: i64, y: i64) -> bool;
}

/// Raster intensity buffer, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    viewport: Viewport,
    pixels: Vec<u8>,
}

impl Mask {
    /// A fully transparent mask covering `viewport`.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            pixels: vec![0; viewport.area()],
        }
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        self.viewport
            .contains(x, y)
            .then(|| y as usize * self.viewport.width as usize + x as usize)
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Intensity at a pixel, 0 when out of bounds.
    pub fn sample(&self, x: i64, y: i64) -> u8 {
        self.index(x, y).map_or(0, |i| self.pixels[i])
    }

    pub fn set(&mut self, x: i64, y: i64, value: u8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = value;
        }
    }

    /// Fraction of pixels above the membership threshold.
    pub fn coverage(&self) -> f32 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let lit = self
            .pixels
            .iter()
            .filter(|&&v| v > MEMBERSHIP_THRESHOLD)
            .count();
        lit as f32 / self.pixels.len() as f32
    }

    /// Fill the half-open pixel rectangle `[x0, x1) x [y0, y1)`, clipped.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, value: u8) {
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.viewport.width as i64);
        let y1 = y1.min(self.viewport.height as i64);
        for y in y0..y1 {
            let row = y as usize * self.viewport.width as usize;
            for x in x0..x1 {
                self.pixels[row + x as usize] = value;
            }
        }
    }

    /// Fill an axis-aligned ellipse, clipped. Pixels are tested at their centres.
    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, value: u8) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let x0 = ((cx - rx).floor() as i64).max(0);
        let x1 = ((cx + rx).ceil() as i64).min(self.viewport.width as i64);
        let y0 = ((cy - ry).floor() as i64).max(0);
        let y1 = ((cy + ry).ceil() as i64).min(self.viewport.height as i64);
        for y in y0..y1 {
            let dy = (y as f32 + 0.5 - cy) / ry;
            let row = y as usize * self.viewport.width as usize;
            for x in x0..x1 {
                let dx = (x as f32 + 0.5 - cx) / rx;
                if dx * dx + dy * dy <= 1.0 {
                    self.pixels[row + x as usize] = value;
                }
            }
        }
    }
}

impl Coverage for Mask {
    fn is_inside(&self, x: i64, y: i64) -> bool {
        self.sample(x, y) > MEMBERSHIP_THRESHOLD
    }
}

// ========== TEXT ==========

/// Size and spacing of rendered text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Glyph height in pixels.
    pub font_size: f32,
    /// Extra space between glyphs, as a fraction of the font size.
    pub letter_spacing: f32,
    /// Distance between line centres in pixels.
    pub line_spacing: f32,
}

impl TextStyle {
    /// Height of one glyph cell in pixels.
    fn cell_height(&self) -> f32 {
        self.font_size / GLYPH_HEIGHT as f32
    }

    /// Width of one block character; two of them make a square cell.
    fn cell_width(&self) -> f32 {
        self.cell_height() / 2.0
    }

    /// Letter spacing expressed in whole block characters.
    fn gap_chars(&self) -> usize {
        (self.letter_spacing * GLYPH_HEIGHT as f32 * 2.0).round().max(0.0) as usize
    }
}

/// Lines of text resolved against the block font.
///
/// Building a banner is where a missing glyph is detected, so a scene with
/// undrawable text fails before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBanner {
    lines: Vec<Vec<String>>,
    style: TextStyle,
}

impl TextBanner {
    pub fn new(lines: &[String], style: TextStyle) -> Result<Self> {
        let gap = style.gap_chars();
        let lines = lines
            .iter()
            .map(|line| build_banner(line, gap))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { lines, style })
    }

    /// Width of the widest line in pixels.
    pub fn width_px(&self) -> f32 {
        let chars = self
            .lines
            .iter()
            .filter_map(|rows| rows.first())
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(0);
        chars as f32 * self.style.cell_width()
    }
}

/// Render `banner` into `mask`, each line centred on `anchor` and the
/// following lines pushed down by the line spacing.
///
/// The mask is cleared first; pixels outside the glyphs stay at zero.
pub fn render_text_mask(mask: &mut Mask, banner: &TextBanner, anchor: (f32, f32)) {
    mask.clear();
    let style = &banner.style;
    let cw = style.cell_width();
    let ch = style.cell_height();

    for (i, rows) in banner.lines.iter().enumerate() {
        let width = rows.first().map_or(0, |r| r.chars().count()) as f32 * cw;
        let left = anchor.0 - width / 2.0;
        let top = anchor.1 + i as f32 * style.line_spacing - style.font_size / 2.0;

        for (row, text) in rows.iter().enumerate() {
            let y0 = (top + row as f32 * ch).round() as i64;
            let y1 = (top + (row + 1) as f32 * ch).round() as i64;
            for (col, c) in text.chars().enumerate() {
                if c != FILL {
                    continue;
                }
                let x0 = (left + col as f32 * cw).round() as i64;
                let x1 = (left + (col + 1) as f32 * cw).round() as i64;
                mask.fill_rect(x0, y0, x1, y1, INK);
            }
        }
    }
}

// ========== CLOUD ==========

/// One disc of a cloud, relative to the blob centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disc {
    pub dx: f32,
    pub dy: f32,
    /// Horizontal radius; the vertical one is flattened.
    pub radius: f32,
}

/// Ordered disc layout of a cloud blob.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloudShape {
    pub discs: Vec<Disc>,
}

/// Random source for cloud layouts of a fixed blob size.
#[derive(Debug, Clone)]
pub struct CloudSampler {
    jitter_x: Normal<f32>,
    jitter_y: Normal<f32>,
    radius: ParamRange,
    count: usize,
}

impl CloudSampler {
    /// Disc centres are Gaussian around the blob centre with a standard
    /// deviation of 0.2 of the blob size; radii span 0.2 to 0.5 of its width.
    pub fn new(width: f32, height: f32, count: usize) -> Result<Self> {
        let radius = ParamRange::new(width * 0.2, width * 0.5);
        radius.validate("cloud radius")?;
        Ok(Self {
            jitter_x: Normal::new(0.0, width * 0.2)?,
            jitter_y: Normal::new(0.0, height * 0.2)?,
            radius,
            count,
        })
    }

    pub fn shape<R: Rng>(&self, rng: &mut R) -> CloudShape {
        let discs = (0..self.count)
            .map(|_| Disc {
                dx: self.jitter_x.sample(rng),
                dy: self.jitter_y.sample(rng),
                radius: self.radius.sample(rng),
            })
            .collect();
        CloudShape { discs }
    }
}

/// Horizontal and vertical sway of a cloud at `frame`.
pub fn sway_offset(frame: u64, phase: f32, amplitude: f32) -> (f32, f32) {
    let t = frame as f32 * 0.01 + phase;
    (t.sin() * amplitude, (t * 0.7).cos() * amplitude * 0.5)
}

/// Render `shape` centred on `anchor` and shifted by `sway`.
pub fn render_cloud_mask(mask: &mut Mask, shape: &CloudShape, anchor: (f32, f32), sway: (f32, f32)) {
    mask.clear();
    let cx = anchor.0 + sway.0;
    let cy = anchor.1 + sway.1;
    for disc in &shape.discs {
        mask.fill_ellipse(
            cx + disc.dx,
            cy + disc.dy,
            disc.radius,
            disc.radius * CLOUD_FLATTEN,
            INK,
        );
    }
}
