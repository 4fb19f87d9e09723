use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::DisplayMode;

const ASCII_RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

/// Resize `image` to cover `area` for the given mode.
/// Half-blocks pack two pixel rows per cell; ASCII uses one.
pub fn fit_thumbnail(image: &DynamicImage, area: Rect, mode: DisplayMode) -> DynamicImage {
  let w = u32::from(area.width).max(1);
  let h = match mode {
    DisplayMode::Direct => u32::from(area.height) * 2,
    DisplayMode::Ascii => u32::from(area.height),
  };
  image.resize_to_fill(w, h.max(1), FilterType::Triangle)
}

/// Draws an already-fitted thumbnail, centred in its area.
pub struct ThumbnailWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

impl Widget for ThumbnailWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_half_blocks(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
    }
  }
}

/// Top-left cell that centres a `w`×`h` cell block inside `area`.
fn origin(area: Rect, w: u32, h: u32) -> (u16, u16) {
  let dx = u32::from(area.width).saturating_sub(w) / 2;
  let dy = u32::from(area.height).saturating_sub(h) / 2;
  (area.x.saturating_add(dx as u16), area.y.saturating_add(dy as u16))
}

fn render_half_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let img_w = rgb.width().min(u32::from(area.width));
  let img_h = rgb.height();
  let rows = img_h.div_ceil(2).min(u32::from(area.height));
  let (x0, y0) = origin(area, img_w, rows);

  for y in 0..rows {
    for x in 0..img_w {
      let upper = rgb.get_pixel(x, y * 2);
      let fg = Color::Rgb(upper[0], upper[1], upper[2]);
      let bg = if y * 2 + 1 < img_h {
        let lower = rgb.get_pixel(x, y * 2 + 1);
        Color::Rgb(lower[0], lower[1], lower[2])
      } else {
        Color::Reset
      };
      buf.set_string(x0 + x as u16, y0 + y as u16, "▀", Style::default().fg(fg).bg(bg));
    }
  }
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let img_w = luma.width().min(u32::from(area.width));
  let img_h = luma.height().min(u32::from(area.height));
  let (x0, y0) = origin(area, img_w, img_h);

  for y in 0..img_h {
    for x in 0..img_w {
      buf.set_string(x0 + x as u16, y0 + y as u16, ascii_for(luma.get_pixel(x, y)[0]), Style::default());
    }
  }
}

fn ascii_for(luma: u8) -> &'static str {
  let idx = (f32::from(luma) / 255.0 * (ASCII_RAMP.len() - 1) as f32).round() as usize;
  ASCII_RAMP[idx.min(ASCII_RAMP.len() - 1)]
}
