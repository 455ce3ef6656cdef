use anyhow::Result;
use console::style;
use tracing_subscriber::EnvFilter;

pub fn ensure_ffmpeg_installed() -> Result<()> {
    if !audiosplit_core::ffmpeg_available() {
        eprintln!("Error: FFmpeg is not installed or not in PATH.");
        eprintln!("\naudiosplit requires FFmpeg to encode m4a chunks.");
        eprintln!("Please install FFmpeg:");
        eprintln!("  - Ubuntu/Debian: sudo apt install ffmpeg");
        eprintln!("  - macOS: brew install ffmpeg");
        eprintln!("  - Windows: choco install ffmpeg or download from ffmpeg.org");
        eprintln!("  - Or visit: https://ffmpeg.org/download.html\n");
        std::process::exit(1);
    }
    Ok(())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set. Otherwise only warnings are logged, since chunk
/// progress is printed directly; `--verbose` turns on the core's
/// per-window trace at debug level.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Directives for this binary's own events and the core library's.
fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    let cli_target = module_path!().split("::").next().unwrap_or("audiosplit");
    format!("{cli_target}={level},audiosplit_core={level}")
}

/// Print a styled header
pub fn header(text: &str) {
    println!("{}", style(text).bold().cyan());
}

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", style("✓").green().bold(), text);
}

/// Print a warning message
pub fn warn(text: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), text);
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", style("✗").red().bold(), text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_cli_events() {
        let filter = default_filter(true);
        assert!(filter.starts_with("audiosplit=debug,"));
        assert!(filter.ends_with("audiosplit_core=debug"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn test_default_filter_quiet_is_warn() {
        assert_eq!(default_filter(false), "audiosplit=warn,audiosplit_core=warn");
    }
}
