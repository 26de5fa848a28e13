//! htmlpen - an HTML playground for the terminal.
//!
//! # Usage
//!
//! ```bash
//! htmlpen
//! htmlpen --indent 4 --width 100
//! htmlpen --no-persist --export-dir ~/Downloads
//! htmlpen --format page.html > page.pretty.html
//! ```

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use htmlpen::app::{App, SessionPlayground};
use htmlpen::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use htmlpen::formatter::{FormatBackend, FormatWorker, Formatter, HtmlFormatter, InlineBackend};
use htmlpen::highlight::{HighlightBackground, set_background_mode};
use htmlpen::playground::Playground;
use htmlpen::store::{FileStore, KeyValueStore, MemoryStore};

/// An HTML playground for the terminal
#[derive(Parser, Debug)]
#[command(name = "htmlpen", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Spaces per indentation level when formatting
    #[arg(long, value_name = "N")]
    indent: Option<usize>,

    /// Preferred maximum line width when formatting
    #[arg(long, value_name = "COLS")]
    width: Option<usize>,

    /// Show the stored document as-is instead of formatting it at startup
    #[arg(long)]
    no_auto_format: bool,

    /// Give up on a format request after this many milliseconds
    #[arg(long, value_name = "MS")]
    format_timeout_ms: Option<u64>,

    /// Store file for the document (default: <data dir>/htmlpen/store.json)
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Keep the document in memory only
    #[arg(long)]
    no_persist: bool,

    /// Storage key the document is kept under
    #[arg(long, value_name = "KEY")]
    key: Option<String>,

    /// Directory exports are written to (default: current directory)
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Force syntax highlight theme background (light or dark)
    #[arg(long, value_enum, default_value = "auto")]
    theme: ThemeMode,

    /// Write log output to a file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,

    /// Print the formatted stored document and exit
    #[arg(long, conflicts_with = "format")]
    dump: bool,

    /// Format a file to stdout and exit
    #[arg(long, value_name = "FILE")]
    format: Option<PathBuf>,
}

impl Cli {
    /// Runs without taking over the terminal.
    const fn is_batch(&self) -> bool {
        self.dump || self.format.is_some()
    }
}

// Query the terminal background using OSC 11.
// We talk to /dev/tty so the terminal responds even when stdout is piped.
// On non-Unix platforms we skip the query entirely because the fallback
// (stdin/stdout) leaves an orphaned reader thread that blocks the console
// input buffer, preventing crossterm from receiving any keyboard events.
#[cfg(not(unix))]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    Ok(None)
}

#[cfg(unix)]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    use std::io::Read;
    use std::sync::mpsc;

    let (tx, rx) = mpsc::channel();

    let mut io = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")?;
    let reader = io.try_clone()?;

    // OSC 11 query: ESC ] 11 ; ? BEL
    io.write_all(b"\x1b]11;?\x07")?;
    io.flush()?;

    std::thread::spawn(move || {
        let mut reader = reader;
        let mut buf = [0u8; 256];
        let mut collected: Vec<u8> = Vec::new();
        loop {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    collected.extend_from_slice(&buf[..n]);
                    if collected.contains(&b'\x07') || collected.windows(2).any(|w| w == b"\x1b\\")
                    {
                        let _ = tx.send(collected);
                        break;
                    }
                }
            }
        }
    });

    let reply = rx
        .recv_timeout(Duration::from_millis(75))
        .unwrap_or_default();
    let text = String::from_utf8_lossy(&reply);
    Ok(parse_osc11_reply(&text))
}

fn theme_from_rgb(r: u8, g: u8, b: u8) -> HighlightBackground {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    if luma >= 140.0 {
        HighlightBackground::Light
    } else {
        HighlightBackground::Dark
    }
}

fn detect_theme() -> Option<HighlightBackground> {
    let _raw = enable_raw_mode();
    let result = query_terminal_background();
    let _ = disable_raw_mode();
    result.ok().flatten().map(|(r, g, b)| theme_from_rgb(r, g, b))
}

fn parse_osc11_reply(reply: &str) -> Option<(u8, u8, u8)> {
    // Expect: ESC ] 11 ; rgb:RRRR/GGGG/BBBB BEL or ST
    let start = reply.find("rgb:")?;
    let data = &reply[start + 4..];
    let mut parts = data.split(['/', '\x07', '\x1b']);
    let r = parts.next()?;
    let g = parts.next()?;
    let b = parts.next()?;
    Some((
        parse_osc_component(r)?,
        parse_osc_component(g)?,
        parse_osc_component(b)?,
    ))
}

fn parse_osc_component(s: &str) -> Option<u8> {
    let hex = s.trim();
    if hex.len() >= 4 {
        let v = u16::from_str_radix(&hex[..4], 16).ok()?;
        u8::try_from(v >> 8).ok()
    } else if hex.len() == 2 {
        u8::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}

/// Logs go to `--log-file` when given. Without one, the terminal UI
/// discards them while batch modes print to stderr.
fn init_logging(log_file: Option<&Path>, batch: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if batch => builder.with_writer(std::io::stderr).init(),
        None => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

fn open_store(flags: &ConfigFlags) -> Box<dyn KeyValueStore> {
    if flags.no_persist {
        return Box::new(MemoryStore::new());
    }
    match flags.store.clone().or_else(FileStore::default_path) {
        Some(path) => Box::new(FileStore::new(path)),
        None => {
            warn!("no data directory available, keeping the document in memory");
            Box::new(MemoryStore::new())
        }
    }
}

fn start_formatter() -> Box<dyn FormatBackend> {
    match FormatWorker::spawn(HtmlFormatter) {
        Ok(worker) => Box::new(worker),
        Err(err) => {
            warn!(%err, "could not start format worker, formatting inline");
            Box::new(InlineBackend::new(HtmlFormatter))
        }
    }
}

fn format_file(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let output = HtmlFormatter
        .format(&input, &flags.format_options())
        .with_context(|| format!("Failed to format {}", path.display()))?;
    std::io::stdout()
        .write_all(output.as_bytes())
        .context("Failed to write output")
}

fn dump_document(flags: &ConfigFlags) -> Result<()> {
    let settings = ConfigFlags {
        no_auto_format: false,
        ..flags.clone()
    }
    .playground_settings();
    let playground = Playground::initialize(
        open_store(flags),
        InlineBackend::new(HtmlFormatter),
        settings,
    );
    std::io::stdout()
        .write_all(playground.rendered_text().as_bytes())
        .context("Failed to write output")
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.log_file.as_deref(), cli.is_batch())?;

    if let Some(path) = &cli.format {
        return format_file(path, &effective);
    }
    if cli.dump {
        return dump_document(&effective);
    }

    match effective.theme.unwrap_or(ThemeMode::Auto) {
        ThemeMode::Auto => set_background_mode(detect_theme()),
        ThemeMode::Light => set_background_mode(Some(HighlightBackground::Light)),
        ThemeMode::Dark => set_background_mode(Some(HighlightBackground::Dark)),
    }

    let playground: SessionPlayground = Playground::initialize(
        open_store(&effective),
        start_formatter(),
        effective.playground_settings(),
    );
    info!(
        store = %playground.store().describe(),
        persistent = playground.is_persistent(),
        "playground ready"
    );

    let mut app = App::new(playground)
        .with_export_dir(
            effective
                .export_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
        )
        .with_config_paths(
            Some(global_path),
            local_path.exists().then_some(local_path),
        );

    app.run().context("Application error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_osc11_reply() {
        let reply = "\x1b]11;rgb:ffff/ffff/ffff\x07";
        assert_eq!(parse_osc11_reply(reply), Some((255, 255, 255)));
        assert_eq!(parse_osc11_reply("\x1b]11;rgb:1e/1e/1e\x1b\\"), Some((30, 30, 30)));
        assert_eq!(parse_osc11_reply("garbage"), None);
    }

    #[test]
    fn test_theme_from_rgb() {
        assert_eq!(theme_from_rgb(255, 255, 255), HighlightBackground::Light);
        assert_eq!(theme_from_rgb(0, 0, 0), HighlightBackground::Dark);
    }

    #[test]
    fn test_batch_modes() {
        let cli = Cli::parse_from(["htmlpen", "--format", "a.html"]);
        assert!(cli.is_batch());
        let cli = Cli::parse_from(["htmlpen"]);
        assert!(!cli.is_batch());
    }
}
