//! Syntax highlighting for the editor pane.
//!
//! Uses syntect with its bundled Sublime Text syntax definitions.

use std::sync::{Mutex, OnceLock};

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

/// A 24-bit foreground color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A run of text that shares one foreground color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub text: String,
    pub fg: Option<Rgb>,
}

/// Highlight `code` line by line.
///
/// `language` is looked up by file extension token first, then by syntax
/// name. Unknown languages come back as uncolored spans. The result always
/// has one entry per line of `code`.
pub fn highlight_lines(language: &str, code: &str) -> Vec<Vec<HighlightSpan>> {
    let syntax_set = syntax_set();
    let Some(syntax) = find_syntax(syntax_set, language) else {
        return code
            .lines()
            .map(|line| {
                vec![HighlightSpan {
                    text: line.to_string(),
                    fg: None,
                }]
            })
            .collect();
    };

    let mode = background_mode();
    let mut highlighter = HighlightLines::new(syntax, theme());
    code.lines()
        .map(|line| {
            // The newline-aware syntaxes keep state across the line break.
            let with_newline = format!("{line}\n");
            let ranges = highlighter
                .highlight_line(&with_newline, syntax_set)
                .unwrap_or_default();
            ranges
                .into_iter()
                .filter_map(|(style, text)| {
                    let text = text.trim_end_matches('\n');
                    (!text.is_empty()).then(|| HighlightSpan {
                        text: text.to_string(),
                        fg: Some(adjust_fg_for_background(
                            Rgb {
                                r: style.foreground.r,
                                g: style.foreground.g,
                                b: style.foreground.b,
                            },
                            mode,
                        )),
                    })
                })
                .collect()
        })
        .collect()
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, language: &str) -> Option<&'a SyntaxReference> {
    syntax_set
        .find_syntax_by_token(language)
        .or_else(|| syntax_set.find_syntax_by_name(language))
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let theme_set = ThemeSet::load_defaults();
        let preferred = match background_mode() {
            BackgroundMode::Dark => ["base16-ocean.dark", "base16-eighties.dark", "Solarized (dark)"],
            BackgroundMode::Light => ["InspiredGitHub", "Solarized (light)", "base16-ocean.light"],
        };

        preferred
            .iter()
            .find_map(|name| theme_set.themes.get(*name).cloned())
            .or_else(|| theme_set.themes.values().next().cloned())
            .unwrap_or_default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundMode {
    Dark,
    Light,
}

/// Terminal background, as detected or configured by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightBackground {
    Light,
    Dark,
}

static BACKGROUND_OVERRIDE: OnceLock<Mutex<Option<HighlightBackground>>> = OnceLock::new();

/// Pin the background instead of reading `COLORFGBG`. Must be called before
/// the first highlight to affect theme choice.
pub fn set_background_mode(mode: Option<HighlightBackground>) {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    match lock.lock() {
        Ok(mut guard) => *guard = mode,
        Err(poisoned) => *poisoned.into_inner() = mode,
    }
}

pub fn is_light_background() -> bool {
    background_mode() == BackgroundMode::Light
}

fn background_mode() -> BackgroundMode {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    if let Ok(guard) = lock.lock()
        && let Some(mode) = *guard
    {
        return match mode {
            HighlightBackground::Light => BackgroundMode::Light,
            HighlightBackground::Dark => BackgroundMode::Dark,
        };
    }
    background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let Some(value) = colorfgbg else {
        return BackgroundMode::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    match bg_str.parse::<u8>() {
        Ok(bg) if bg >= 7 => BackgroundMode::Light,
        _ => BackgroundMode::Dark,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn adjust_fg_for_background(color: Rgb, mode: BackgroundMode) -> Rgb {
    if mode == BackgroundMode::Dark {
        return color;
    }
    let luma = 0.0722f32.mul_add(
        f32::from(color.b),
        0.2126f32.mul_add(f32::from(color.r), 0.7152 * f32::from(color.g)),
    );
    if luma < 155.0 {
        return color;
    }
    let darken = |c: u8| (f32::from(c) * 0.42).round() as u8;
    Rgb {
        r: darken(color.r),
        g: darken(color.g),
        b: darken(color.b),
    }
}
