use std::fs;
use std::path::Path;

use ratatui::style::Color;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Theme {
    pub screen_bg: Color,
    pub input_bg: Color,
    pub display_bg: Color,
    pub stripe_bg: Color,
    pub mode_line_bg: Color,
    pub selection_bg: Color,
    pub header_fg: Color,
    pub line_number_fg: Color,
    pub text_fg: Color,
    pub muted_fg: Color,
    pub active_fg: Color,
    pub error_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            screen_bg: Color::Rgb(36, 36, 36),
            input_bg: Color::Rgb(62, 62, 62),
            display_bg: Color::Rgb(48, 48, 48),
            stripe_bg: Color::Rgb(56, 56, 56),
            mode_line_bg: Color::Rgb(90, 145, 200),
            selection_bg: Color::Rgb(70, 100, 140),
            header_fg: Color::Rgb(230, 190, 120),
            line_number_fg: Color::Rgb(140, 140, 140),
            text_fg: Color::Rgb(225, 225, 225),
            muted_fg: Color::Rgb(185, 185, 185),
            active_fg: Color::Rgb(255, 255, 255),
            error_fg: Color::Rgb(255, 165, 0),
        }
    }
}

impl Theme {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path_ref = path.as_ref();
        match fs::read_to_string(path_ref) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(theme) => theme,
                Err(err) => {
                    tracing::warn!(
                        "Failed to parse theme file '{}': {err}. Using defaults.",
                        path_ref.display()
                    );
                    Self::default()
                }
            },
            Err(err) => {
                tracing::debug!(
                    "Failed to read theme file '{}': {err}. Using defaults.",
                    path_ref.display()
                );
                Self::default()
            }
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let cfg: ThemeToml = toml::from_str(s)?;
        let base = Self::default();
        let c = cfg.colors;
        Ok(Self {
            screen_bg: c.screen_bg.map_or(base.screen_bg, RgbToml::to_color),
            input_bg: c.input_bg.map_or(base.input_bg, RgbToml::to_color),
            display_bg: c.display_bg.map_or(base.display_bg, RgbToml::to_color),
            stripe_bg: c.stripe_bg.map_or(base.stripe_bg, RgbToml::to_color),
            mode_line_bg: c.mode_line_bg.map_or(base.mode_line_bg, RgbToml::to_color),
            selection_bg: c.selection_bg.map_or(base.selection_bg, RgbToml::to_color),
            header_fg: c.header_fg.map_or(base.header_fg, RgbToml::to_color),
            line_number_fg: c
                .line_number_fg
                .map_or(base.line_number_fg, RgbToml::to_color),
            text_fg: c.text_fg.map_or(base.text_fg, RgbToml::to_color),
            muted_fg: c.muted_fg.map_or(base.muted_fg, RgbToml::to_color),
            active_fg: c.active_fg.map_or(base.active_fg, RgbToml::to_color),
            error_fg: c.error_fg.map_or(base.error_fg, RgbToml::to_color),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ThemeToml {
    colors: ThemeColorsToml,
}

#[derive(Debug, Deserialize)]
struct ThemeColorsToml {
    screen_bg: Option<RgbToml>,
    input_bg: Option<RgbToml>,
    display_bg: Option<RgbToml>,
    stripe_bg: Option<RgbToml>,
    mode_line_bg: Option<RgbToml>,
    selection_bg: Option<RgbToml>,
    header_fg: Option<RgbToml>,
    line_number_fg: Option<RgbToml>,
    text_fg: Option<RgbToml>,
    muted_fg: Option<RgbToml>,
    active_fg: Option<RgbToml>,
    error_fg: Option<RgbToml>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RgbToml {
    r: u8,
    g: u8,
    b: u8,
}

impl RgbToml {
    fn to_color(self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}
