//! Pixel surface drawn to the terminal with half-block characters.
//!
//! Each terminal cell shows two vertically stacked pixels: the upper one as
//! the foreground of `▀` and the lower one as its background.

use nimbus_core::{Rgb, Viewport};
use nimbus_engine::{ALPHA_MAX, DrawCommand};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

/// Character whose foreground covers the upper half of a cell.
const UPPER_HALF: char = '▀';

/// RGB frame buffer the scene's draw commands are blended into.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    /// Pixel dimensions; twice as tall as the terminal area in cells.
    viewport: Viewport,
    /// Row-major pixels.
    pixels: Vec<Rgb>,
    /// Colour the canvas is cleared to every frame.
    sky: Rgb,
}

impl PixelCanvas {
    pub fn new(viewport: Viewport, sky: Rgb) -> Self {
        Self {
            viewport,
            pixels: vec![sky; viewport.area()],
            sky,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Colour at a pixel, `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.viewport.width || y >= self.viewport.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.viewport.width as usize + x as usize)
            .copied()
    }

    /// Clear to the sky colour and blend `commands` in order.
    pub fn paint(&mut self, commands: &[DrawCommand]) {
        self.pixels.fill(self.sky);
        for cmd in commands {
            self.blend_disc(cmd);
        }
    }

    /// Blend one soft disc. Edge pixels get partial coverage so that small
    /// particles still show up at terminal resolution.
    fn blend_disc(&mut self, cmd: &DrawCommand) {
        let opacity = (cmd.alpha / ALPHA_MAX).clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        let w = self.viewport.width as i64;
        let h = self.viewport.height as i64;
        let reach = cmd.radius + 0.5;
        let x0 = ((cmd.x - reach).floor() as i64).max(0);
        let x1 = ((cmd.x + reach).ceil() as i64).min(w);
        let y0 = ((cmd.y - reach).floor() as i64).max(0);
        let y1 = ((cmd.y + reach).ceil() as i64).min(h);

        for y in y0..y1 {
            let dy = y as f32 + 0.5 - cmd.y;
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cmd.x;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (reach - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let idx = (y * w + x) as usize;
                    self.pixels[idx] = cmd.color.over(self.pixels[idx], opacity * coverage);
                }
            }
        }
    }
}

impl Widget for &PixelCanvas {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = (self.viewport.height / 2).min(area.height as u32) as u16;
        let cols = self.viewport.width.min(area.width as u32) as u16;
        for row in 0..rows {
            for col in 0..cols {
                let top = self.pixel(col as u32, row as u32 * 2).unwrap_or(self.sky);
                let bottom = self.pixel(col as u32, row as u32 * 2 + 1).unwrap_or(self.sky);
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_char(UPPER_HALF).set_fg(top.into()).set_bg(bottom.into());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn command(x: f32, y: f32, radius: f32, alpha: f32) -> DrawCommand {
        DrawCommand {
            x,
            y,
            radius,
            color: Rgb::WHITE,
            alpha,
        }
    }

    #[test]
    fn test_paint_clears_to_sky() {
        let mut canvas = PixelCanvas::new(Viewport::new(4, 4), Rgb::SKY);
        canvas.paint(&[command(2.0, 2.0, 1.0, 255.0)]);
        assert_ne!(canvas.pixel(2, 2), Some(Rgb::SKY));
        canvas.paint(&[]);
        assert!((0..4).all(|y| (0..4).all(|x| canvas.pixel(x, y) == Some(Rgb::SKY))));
    }

    #[test]
    fn test_opaque_disc_centre_is_solid() {
        let mut canvas = PixelCanvas::new(Viewport::new(10, 10), Rgb(0, 0, 0));
        canvas.paint(&[command(5.0, 5.0, 3.0, 255.0)]);
        assert_eq!(canvas.pixel(5, 5), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(0, 0), Some(Rgb(0, 0, 0)));
    }

    #[test]
    fn test_alpha_scales_blend() {
        let mut canvas = PixelCanvas::new(Viewport::new(10, 10), Rgb(0, 0, 0));
        canvas.paint(&[command(5.0, 5.0, 3.0, 127.5)]);
        assert_eq!(canvas.pixel(5, 5), Some(Rgb(128, 128, 128)));
    }

    #[test]
    fn test_off_canvas_disc_is_clipped() {
        let mut canvas = PixelCanvas::new(Viewport::new(4, 4), Rgb::SKY);
        canvas.paint(&[command(-20.0, 50.0, 2.0, 255.0)]);
        assert_eq!(canvas.pixel(0, 3), Some(Rgb::SKY));
        assert_eq!(canvas.pixel(4, 0), None);
    }

    #[test]
    fn test_widget_stacks_two_pixels_per_cell() {
        let mut canvas = PixelCanvas::new(Viewport::new(2, 4), Rgb(0, 0, 0));
        canvas.pixels[0] = Rgb(255, 0, 0);
        canvas.pixels[2] = Rgb(0, 255, 0);
        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        (&canvas).render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 255, 0));
        assert_eq!(buf[(1, 1)].bg, Color::Rgb(0, 0, 0));
    }
}
