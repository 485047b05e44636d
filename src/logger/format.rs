//! Colorized console formatting for log lines
//!
//! Output format: `HH:MM:SS [TAG     ] [LEVEL  ] message`

use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stdout, ErrorKind, Write};

/// Column widths for alignment
const TAG_WIDTH: usize = 7;
const LEVEL_WIDTH: usize = 7;

pub fn format_and_log(tag: LogTag, level: LogLevel, message: &str) {
    let time = Local::now().format("%H:%M:%S").to_string();

    let line = format!(
        "{} [{}] [{}] {}",
        time.dimmed(),
        format_tag(&tag),
        format_level(level),
        message
    );

    print_stdout_safe(&line);
}

fn format_tag(tag: &LogTag) -> ColoredString {
    let padded = format!("{:<width$}", tag.as_str(), width = TAG_WIDTH);

    match tag {
        LogTag::System => padded.bright_yellow().bold(),
        LogTag::Pool => padded.bright_blue().bold(),
        LogTag::Cache => padded.bright_cyan().bold(),
        LogTag::Chart => padded.bright_green().bold(),
        LogTag::Price => padded.bright_magenta().bold(),
    }
}

fn format_level(level: LogLevel) -> ColoredString {
    let padded = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);

    match level {
        LogLevel::Error => padded.bright_red().bold(),
        LogLevel::Warning => padded.yellow(),
        LogLevel::Info => padded.normal(),
        LogLevel::Debug => padded.dimmed(),
        LogLevel::Verbose => padded.dimmed(),
    }
}

/// Print to stdout without panicking on a broken pipe
fn print_stdout_safe(line: &str) {
    let mut out = stdout();
    if let Err(e) = writeln!(out, "{}", line) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
}
