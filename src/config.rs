use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::formatter::FormatOptions;
use crate::playground::PlaygroundSettings;

const APP_DIR: &str = "htmlpen";
const LOCAL_RC: &str = ".htmlpenrc";

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

/// Flags that can come from the command line or an rc file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub indent: Option<usize>,
    pub width: Option<usize>,
    pub no_auto_format: bool,
    pub format_timeout_ms: Option<u64>,
    pub store: Option<PathBuf>,
    pub no_persist: bool,
    pub key: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub theme: Option<ThemeMode>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge two flag sets; switches are or-ed, values from `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            indent: other.indent.or(self.indent),
            width: other.width.or(self.width),
            no_auto_format: self.no_auto_format || other.no_auto_format,
            format_timeout_ms: other.format_timeout_ms.or(self.format_timeout_ms),
            store: other.store.clone().or_else(|| self.store.clone()),
            no_persist: self.no_persist || other.no_persist,
            key: other.key.clone().or_else(|| self.key.clone()),
            export_dir: other.export_dir.clone().or_else(|| self.export_dir.clone()),
            theme: other.theme.or(self.theme),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }

    pub fn format_options(&self) -> FormatOptions {
        let defaults = FormatOptions::default();
        FormatOptions {
            indent_width: self.indent.unwrap_or(defaults.indent_width),
            max_line_width: self.width.unwrap_or(defaults.max_line_width),
        }
    }

    pub fn playground_settings(&self) -> PlaygroundSettings {
        let defaults = PlaygroundSettings::default();
        PlaygroundSettings {
            storage_key: self.key.clone().unwrap_or(defaults.storage_key),
            options: self.format_options(),
            auto_format: !self.no_auto_format,
            format_timeout: self
                .format_timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            ..defaults
        }
    }
}

pub fn global_config_path() -> PathBuf {
    dirs::config_dir().map_or_else(
        || PathBuf::from(LOCAL_RC),
        |dir| dir.join(APP_DIR).join("config"),
    )
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_RC)
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# htmlpen defaults (saved with --save)".to_string());
    if let Some(indent) = flags.indent {
        lines.push(format!("--indent {indent}"));
    }
    if let Some(width) = flags.width {
        lines.push(format!("--width {width}"));
    }
    if flags.no_auto_format {
        lines.push("--no-auto-format".to_string());
    }
    if let Some(ms) = flags.format_timeout_ms {
        lines.push(format!("--format-timeout-ms {ms}"));
    }
    if let Some(store) = &flags.store {
        lines.push(format!("--store {}", store.display()));
    }
    if flags.no_persist {
        lines.push("--no-persist".to_string());
    }
    if let Some(key) = &flags.key {
        lines.push(format!("--key {key}"));
    }
    if let Some(dir) = &flags.export_dir {
        lines.push(format!("--export-dir {}", dir.display()));
    }
    if let Some(theme) = flags.theme {
        let theme_str = match theme {
            ThemeMode::Auto => "auto",
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        };
        lines.push(format!("--theme {theme_str}"));
    }
    if let Some(path) = &flags.log_file {
        lines.push(format!("--log-file {}", path.display()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pull the flags we know about out of an argument list, ignoring the rest.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let takes_value = matches!(
            name,
            "--indent"
                | "--width"
                | "--format-timeout-ms"
                | "--store"
                | "--key"
                | "--export-dir"
                | "--theme"
                | "--log-file"
        );
        let value = if takes_value {
            inline_value.or_else(|| {
                let next = tokens.get(i + 1).map(String::as_str);
                if next.is_some() {
                    i += 1;
                }
                next
            })
        } else {
            None
        };

        match (name, value) {
            ("--no-auto-format", _) => flags.no_auto_format = true,
            ("--no-persist", _) => flags.no_persist = true,
            ("--indent", Some(v)) => flags.indent = v.parse().ok(),
            ("--width", Some(v)) => flags.width = v.parse().ok(),
            ("--format-timeout-ms", Some(v)) => flags.format_timeout_ms = v.parse().ok(),
            ("--store", Some(v)) => flags.store = Some(PathBuf::from(v)),
            ("--key", Some(v)) => flags.key = Some(v.to_string()),
            ("--export-dir", Some(v)) => flags.export_dir = Some(PathBuf::from(v)),
            ("--theme", Some(v)) => flags.theme = parse_theme(v),
            ("--log-file", Some(v)) => flags.log_file = Some(PathBuf::from(v)),
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_theme(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = vec![
            "htmlpen".to_string(),
            "--indent".to_string(),
            "4".to_string(),
            "--width=100".to_string(),
            "--no-auto-format".to_string(),
            "--theme".to_string(),
            "dark".to_string(),
            "--store=/tmp/s.json".to_string(),
            "--unknown".to_string(),
        ];
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.indent, Some(4));
        assert_eq!(flags.width, Some(100));
        assert!(flags.no_auto_format);
        assert_eq!(flags.theme, Some(ThemeMode::Dark));
        assert_eq!(flags.store, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn test_bad_numbers_are_ignored() {
        let args = vec!["--indent".to_string(), "wide".to_string()];
        assert_eq!(parse_flag_tokens(&args).indent, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            no_persist: true,
            width: Some(60),
            theme: Some(ThemeMode::Light),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            no_auto_format: true,
            theme: Some(ThemeMode::Dark),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.no_persist);
        assert!(merged.no_auto_format);
        assert_eq!(merged.width, Some(60));
        assert_eq!(merged.theme, Some(ThemeMode::Dark));
    }

    #[test]
    fn test_playground_settings_from_flags() {
        let flags = ConfigFlags {
            indent: Some(4),
            key: Some("scratch".to_string()),
            no_auto_format: true,
            format_timeout_ms: Some(250),
            ..ConfigFlags::default()
        };
        let settings = flags.playground_settings();
        assert_eq!(settings.options.indent_width, 4);
        assert_eq!(settings.options.max_line_width, 80);
        assert_eq!(settings.storage_key, "scratch");
        assert!(!settings.auto_format);
        assert_eq!(settings.format_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let flags = ConfigFlags {
            format_timeout_ms: Some(0),
            ..ConfigFlags::default()
        };
        assert_eq!(flags.playground_settings().format_timeout, None);
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".htmlpenrc");
        let flags = ConfigFlags {
            indent: Some(3),
            width: Some(72),
            no_auto_format: true,
            format_timeout_ms: Some(500),
            store: Some(PathBuf::from("store.json")),
            no_persist: true,
            key: Some("k".to_string()),
            export_dir: Some(PathBuf::from("out")),
            theme: Some(ThemeMode::Dark),
            log_file: Some(PathBuf::from("htmlpen.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }
}
