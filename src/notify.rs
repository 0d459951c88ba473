//! Notification level and progress-line formatting.
//!
//! All progress and warning output goes to stderr so that `-f -` (archive on
//! stdout) leaves stdout clean. Mirrors the atomic-global notification-level
//! pattern: one process-wide level, checked at every call site, rather than a
//! logging-framework dependency.

use std::sync::atomic::{AtomicI32, Ordering};

/// 0 = silent, 1 = errors only, 2 = results + warnings, 3 = progress, 4+ = verbose.
pub static DISPLAY_LEVEL: AtomicI32 = AtomicI32::new(2);

pub fn set_notification_level(level: i32) -> i32 {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
    level
}

pub fn notification_level() -> i32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

/// Writes `msg` to stderr if the current level is >= `level`.
pub fn display_level(level: i32, msg: &str) {
    if DISPLAY_LEVEL.load(Ordering::Relaxed) >= level {
        eprint!("{msg}");
    }
}

/// Emits a warning line (level 2) prefixed with "warning: ".
pub fn warn(msg: &str) {
    display_level(2, &format!("warning: {msg}\n"));
}

/// Formats a progress line as `[  current/  total]`, width derived from the
/// decimal digit count of `total`, and writes it to stderr at level 3.
///
/// Progress lines overwrite the previous one via a carriage return, matching
/// the terse single-line progress convention used by CLI archivers.
pub fn report_progress(current: u64, total: u64) {
    let width = digit_count(total);
    let msg = format!("\r[{current:>width$}/{total:>width$}]", width = width);
    display_level(3, &msg);
}

/// Emits the final newline after the last progress update.
pub fn finish_progress() {
    display_level(3, "\n");
}

fn digit_count(n: u64) -> usize {
    if n == 0 {
        1
    } else {
        (n as f64).log10().floor() as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_count_matches_decimal_width() {
        assert_eq!(digit_count(0), 1);
        assert_eq!(digit_count(9), 1);
        assert_eq!(digit_count(10), 2);
        assert_eq!(digit_count(999), 3);
        assert_eq!(digit_count(1000), 4);
    }

    #[test]
    fn set_and_read_notification_level() {
        let prior = notification_level();
        set_notification_level(4);
        assert_eq!(notification_level(), 4);
        set_notification_level(prior);
    }
}
