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
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
  pub chip_on: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "carta",
    bg: Color::Rgb(250, 246, 238),
    fg: Color::Rgb(50, 44, 38),
    accent: Color::Rgb(176, 58, 46),
    muted: Color::Rgb(140, 128, 116),
    border: Color::Rgb(206, 196, 182),
    highlight_fg: Color::Rgb(250, 246, 238),
    highlight_bg: Color::Rgb(176, 58, 46),
    stripe_bg: Color::Rgb(243, 237, 226),
    status: Color::Rgb(40, 110, 140),
    error: Color::Rgb(190, 30, 30),
    key_fg: Color::Rgb(250, 246, 238),
    key_bg: Color::Rgb(100, 90, 80),
    chip_on: Color::Rgb(40, 110, 140),
  },
  Theme {
    name: "notte",
    bg: Color::Rgb(24, 26, 32),
    fg: Color::Rgb(220, 222, 228),
    accent: Color::Rgb(240, 170, 90),
    muted: Color::Rgb(120, 126, 140),
    border: Color::Rgb(60, 64, 76),
    highlight_fg: Color::Rgb(24, 26, 32),
    highlight_bg: Color::Rgb(240, 170, 90),
    stripe_bg: Color::Rgb(30, 32, 40),
    status: Color::Rgb(120, 200, 220),
    error: Color::Rgb(240, 90, 90),
    key_fg: Color::Rgb(24, 26, 32),
    key_bg: Color::Rgb(150, 156, 170),
    chip_on: Color::Rgb(120, 200, 220),
  },
  Theme {
    name: "terminale",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Yellow,
    muted: Color::DarkGray,
    border: Color::DarkGray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Yellow,
    stripe_bg: Color::Reset,
    status: Color::Cyan,
    error: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Gray,
    chip_on: Color::Cyan,
  },
];

/// Index of the theme called `name`, or the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name == n)).unwrap_or(0)
}
