use std::fs::OpenOptions;
use std::path::Path;

use goup_platform::GoupPaths;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

/// The log file is cut back to its newer half once it grows past this.
pub const MAX_LOG_SIZE: u64 = 1024 * 1024;

const LOG_TARGET: &str = "goup";

fn trim_log_file_if_oversized(log_path: &Path, max_log_size: u64) {
    if let Ok(metadata) = std::fs::metadata(log_path)
        && metadata.len() > max_log_size
        && let Ok(contents) = std::fs::read(log_path)
    {
        let half = contents.len() / 2;
        let keep_from = contents[half..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(half, |pos| half + pos + 1);
        let _ = std::fs::write(log_path, &contents[keep_from..]);
    }
}

fn terminal_config() -> Config {
    ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off)
        .add_filter_allow_str(LOG_TARGET)
        .build()
}

fn file_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str(LOG_TARGET)
        .build()
}

fn terminal_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Log to stderr, and at debug level to `<root>/goup.log` when the root is
/// writable.
pub fn init_logging(paths: &GoupPaths, verbose: bool) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        terminal_level(verbose),
        terminal_config(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let log_path = paths.log_file();
    if paths.ensure_root().is_ok() {
        trim_log_file_if_oversized(&log_path, MAX_LOG_SIZE);
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            loggers.push(WriteLogger::new(LevelFilter::Debug, file_config(), file));
        }
    }

    let _ = CombinedLogger::init(loggers);
    log::debug!("Logging initialized, log file: {}", log_path.display());
}

#[cfg(test)]
mod tests {
    use simplelog::LevelFilter;

    use super::{terminal_level, trim_log_file_if_oversized};

    #[test]
    fn trim_log_file_keeps_recent_half() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("goup.log");
        let original = "line-1\nline-2\nline-3\nline-4\nline-5\n";
        std::fs::write(&log_path, original).expect("test log file should be written");

        trim_log_file_if_oversized(&log_path, 10);

        let trimmed =
            std::fs::read_to_string(&log_path).expect("trimmed log file should be readable");
        assert!(trimmed.starts_with("line-4\n") || trimmed.starts_with("line-3\n"));
        assert!(!trimmed.contains("line-1"));
    }

    #[test]
    fn small_log_file_is_left_alone() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("goup.log");
        std::fs::write(&log_path, "short\n").expect("test log file should be written");

        trim_log_file_if_oversized(&log_path, 1024);

        assert_eq!(
            std::fs::read_to_string(&log_path).expect("log readable"),
            "short\n"
        );
    }

    #[test]
    fn verbose_lowers_terminal_level() {
        assert_eq!(terminal_level(false), LevelFilter::Info);
        assert_eq!(terminal_level(true), LevelFilter::Debug);
    }
}
