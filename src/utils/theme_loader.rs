use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeFile {
    pub name: String,
    pub themes: Vec<ThemeVariant>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeVariant {
    pub name: String,
    pub mode: String, // "light" or "dark"
    pub colors: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuiTheme {
    pub background: Color,
    pub foreground: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub border: Color,
    pub source_tag: Color,
    pub timestamp: Color,
    pub filter_active_bg: Color,
    pub filter_active_fg: Color,
}

impl TuiTheme {
    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(0x10, 0x0f, 0x0f),
            foreground: Color::Rgb(0xce, 0xcd, 0xc3),
            selection_bg: Color::Rgb(0x28, 0x27, 0x26),
            selection_fg: Color::Rgb(0xff, 0xfc, 0xf0),
            border: Color::Rgb(0x40, 0x3e, 0x3c),
            source_tag: Color::Rgb(0x43, 0x85, 0xbe),
            timestamp: Color::Rgb(0x87, 0x85, 0x80),
            filter_active_bg: Color::Rgb(0x43, 0x85, 0xbe),
            filter_active_fg: Color::Rgb(0x10, 0x0f, 0x0f),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::Rgb(0xff, 0xfc, 0xf0),
            foreground: Color::Rgb(0x10, 0x0f, 0x0f),
            selection_bg: Color::Rgb(0xe6, 0xe4, 0xd9),
            selection_fg: Color::Rgb(0x10, 0x0f, 0x0f),
            border: Color::Rgb(0xce, 0xcd, 0xc3),
            source_tag: Color::Rgb(0x20, 0x5e, 0xa6),
            timestamp: Color::Rgb(0x6f, 0x6e, 0x69),
            filter_active_bg: Color::Rgb(0x20, 0x5e, 0xa6),
            filter_active_fg: Color::Rgb(0xff, 0xfc, 0xf0),
        }
    }

    pub fn for_mode(dark: bool) -> Self {
        match dark {
            true => Self::dark(),
            false => Self::light(),
        }
    }
}

/// Built-in or file-provided palettes for both modes.
#[derive(Debug, Clone)]
pub struct ThemePair {
    pub dark: TuiTheme,
    pub light: TuiTheme,
}

impl Default for ThemePair {
    fn default() -> Self {
        Self {
            dark: TuiTheme::dark(),
            light: TuiTheme::light(),
        }
    }
}

impl ThemePair {
    /// Load both variants from `path` when configured, keeping the built-in
    /// palette for any variant that fails to load.
    pub fn load(path: Option<&str>, enable_performance_metrics: bool) -> Self {
        let Some(path) = path.filter(|p| !p.trim().is_empty()) else {
            return Self::default();
        };

        let load_variant = |mode: &str, fallback: TuiTheme| {
            match load_theme(Path::new(path), mode, enable_performance_metrics) {
                Ok(theme) => theme,
                Err(e) => {
                    tracing::error!("Failed to load {} theme from '{}': {:#}", mode, path, e);
                    fallback
                }
            }
        };

        Self {
            dark: load_variant("dark", TuiTheme::dark()),
            light: load_variant("light", TuiTheme::light()),
        }
    }

    pub fn get(&self, dark: bool) -> &TuiTheme {
        match dark {
            true => &self.dark,
            false => &self.light,
        }
    }
}

#[tracing::instrument(skip(path, mode), fields(path = ?path, mode = %mode))]
pub fn load_theme(path: &Path, mode: &str, enable_performance_metrics: bool) -> Result<TuiTheme> {
    let start = std::time::Instant::now();
    let content = fs::read_to_string(path).context("Failed to read theme file")?;
    let theme_file: ThemeFile =
        serde_json::from_str(&content).context("Failed to parse theme JSON")?;

    let variant = theme_file
        .themes
        .iter()
        .find(|t| t.mode == mode)
        .context("No matching theme variant found")?;

    let base = TuiTheme::for_mode(mode == "dark");
    let color = |keys: &[&str], fallback: Color| {
        keys.iter()
            .find_map(|k| variant.colors.get(*k))
            .map(|hex| parse_color(hex))
            .unwrap_or(fallback)
    };

    let theme = TuiTheme {
        background: color(&["background"], base.background),
        foreground: color(&["foreground"], base.foreground),
        selection_bg: color(
            &["selection.background", "list.active.background"],
            base.selection_bg,
        ),
        selection_fg: color(&["accent.foreground", "foreground"], base.selection_fg),
        border: color(&["border"], base.border),
        source_tag: color(&["base.blue"], base.source_tag),
        timestamp: color(&["muted.foreground"], base.timestamp),
        filter_active_bg: color(&["primary.background", "base.blue"], base.filter_active_bg),
        filter_active_fg: color(&["primary.foreground", "background"], base.filter_active_fg),
    };

    if enable_performance_metrics {
        tracing::debug!(elapsed = ?start.elapsed(), theme = %theme_file.name, variant = %variant.name, "Loaded theme");
    }

    Ok(theme)
}

fn parse_color(hex: &str) -> Color {
    if let Ok(c) = hex.parse::<Color>() {
        return c;
    }

    let hex = hex.trim_start_matches('#');
    match hex.len() {
        6 | 8 => {
            // For 8-char hex (with alpha), ignore the alpha and use the RGB components.
            let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
            let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
            let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
            Color::Rgb(r, g, b)
        }
        _ => Color::Reset,
    }
}
