use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub warning: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "crimson",
    bg: Color::Rgb(24, 22, 26),
    fg: Color::Rgb(226, 222, 230),
    accent: Color::Rgb(235, 72, 72),
    muted: Color::Rgb(130, 124, 138),
    border: Color::Rgb(70, 64, 76),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(110, 36, 40),
    stripe_bg: Color::Rgb(32, 29, 34),
    status: Color::Rgb(120, 190, 240),
    warning: Color::Rgb(240, 190, 90),
    error: Color::Rgb(250, 100, 100),
    key_fg: Color::Rgb(24, 22, 26),
    key_bg: Color::Rgb(190, 184, 196),
  },
  Theme {
    name: "paper",
    bg: Color::Rgb(246, 242, 232),
    fg: Color::Rgb(46, 42, 38),
    accent: Color::Rgb(176, 60, 40),
    muted: Color::Rgb(138, 128, 114),
    border: Color::Rgb(196, 186, 170),
    highlight_fg: Color::Rgb(246, 242, 232),
    highlight_bg: Color::Rgb(176, 60, 40),
    stripe_bg: Color::Rgb(238, 232, 220),
    status: Color::Rgb(40, 100, 160),
    warning: Color::Rgb(170, 110, 10),
    error: Color::Rgb(190, 40, 40),
    key_fg: Color::Rgb(246, 242, 232),
    key_bg: Color::Rgb(90, 82, 74),
  },
  Theme {
    name: "mono",
    bg: Color::Reset,
    fg: Color::White,
    accent: Color::LightRed,
    muted: Color::DarkGray,
    border: Color::Gray,
    highlight_fg: Color::Black,
    highlight_bg: Color::White,
    stripe_bg: Color::Reset,
    status: Color::Cyan,
    warning: Color::Yellow,
    error: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

/// Index of the theme named `name`, or 0.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name == n)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn theme_index_by_name() {
    assert_eq!(theme_index(Some("paper")), 1);
    assert_eq!(theme_index(Some("nope")), 0);
    assert_eq!(theme_index(None), 0);
  }
}
