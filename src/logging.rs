//! Line-oriented logging for the simulated backend.
//!
//! Every line carries a wall-clock stamp and the call site:
//!
//! ```text
//! 20261016T09:14:03.512 - src/simulation/client.rs:211 - send: +14402231 echoed m-5123456
//! ```
//!
//! On a terminal the stamp and call site are dimmed and contact handles are
//! tinted with a colour derived from their text, so one conversation can be
//! followed through interleaved output. Output goes to stderr unless
//! [`set_writer`] installs another sink.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

static COLOUR: AtomicBool = AtomicBool::new(false);

static SINK: LazyLock<Mutex<Box<dyn Write + Send>>> =
    LazyLock::new(|| Mutex::new(Box::new(io::stderr())));

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const MSG_ID_COLOUR: &str = "\x1b[96m";

const HANDLE_COLOURS: &[&str] = &[
    "\x1b[91m", "\x1b[92m", "\x1b[93m", "\x1b[94m", "\x1b[95m", "\x1b[31m", "\x1b[32m",
    "\x1b[33m", "\x1b[34m", "\x1b[35m",
];

/// Enable colour output when stderr is a terminal. Call once at startup.
pub fn init() {
    COLOUR.store(io::stderr().is_terminal(), Ordering::Relaxed);
}

/// Send all further log lines to `writer`. Colour is switched off.
pub fn set_writer(writer: Box<dyn Write + Send>) {
    COLOUR.store(false, Ordering::Relaxed);
    if let Ok(mut sink) = SINK.lock() {
        *sink = writer;
    }
}

pub fn colour_enabled() -> bool {
    COLOUR.load(Ordering::Relaxed)
}

fn tint_for(text: &str) -> &'static str {
    let hash = text
        .bytes()
        .fold(5381u32, |acc, byte| acc.wrapping_mul(33) ^ u32::from(byte));
    HANDLE_COLOURS[hash as usize % HANDLE_COLOURS.len()]
}

/// Render a contact handle, tinted on colour terminals.
pub fn handle(handle: &str) -> String {
    if colour_enabled() {
        format!("{}{handle}{RESET}", tint_for(handle))
    } else {
        handle.to_string()
    }
}

/// Render a message id as `m-<last 7 digits>`.
pub fn msg_id(id: i64) -> String {
    let digits = id.to_string();
    let short = &digits[digits.len().saturating_sub(7)..];
    if colour_enabled() {
        format!("{MSG_ID_COLOUR}m-{short}{RESET}")
    } else {
        format!("m-{short}")
    }
}

// Proleptic Gregorian date for a day count relative to 1970-01-01.
fn civil_date(days_since_epoch: i64) -> (i64, u32, u32) {
    let shifted = days_since_epoch + 719_468;
    let era = shifted.div_euclid(146_097);
    let day_of_era = shifted.rem_euclid(146_097);
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let month_index = (5 * day_of_year + 2) / 153;
    let day = (day_of_year - (153 * month_index + 2) / 5 + 1) as u32;
    let month = (if month_index < 10 {
        month_index + 3
    } else {
        month_index - 9
    }) as u32;
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Format a Unix millisecond instant as `YYYYMMDDTHH:MM:SS.mmm` (UTC).
pub fn format_millis(unix_millis: i64) -> String {
    let secs = unix_millis.div_euclid(1000);
    let millis = unix_millis.rem_euclid(1000);
    let (year, month, day) = civil_date(secs.div_euclid(86_400));
    let of_day = secs.rem_euclid(86_400);
    format!(
        "{year:04}{month:02}{day:02}T{:02}:{:02}:{:02}.{millis:03}",
        of_day / 3600,
        (of_day % 3600) / 60,
        of_day % 60
    )
}

/// Current wall-clock time formatted by [`format_millis`].
pub fn format_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64;
    format_millis(now)
}

/// Write one line. Used by [`tlog!`].
pub fn emit(file: &str, line: u32, msg: &str) {
    let stamp = format_timestamp();
    let rendered = if colour_enabled() {
        format!("{DIM}{stamp} {file}:{line}{RESET} {msg}")
    } else {
        format!("{stamp} - {file}:{line} - {msg}")
    };
    if let Ok(mut sink) = SINK.lock() {
        let _ = writeln!(sink, "{rendered}");
    }
}

/// Log a formatted line with timestamp and call site.
///
/// ```ignore
/// tlog!("tick: new message from {}", logging::handle(&recipient.primary_handle()));
/// ```
#[macro_export]
macro_rules! tlog {
    ($($arg:tt)*) => {{
        $crate::logging::emit(file!(), line!(), &format!($($arg)*));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_millis_epoch() {
        assert_eq!(format_millis(0), "19700101T00:00:00.000");
    }

    #[test]
    fn test_format_millis_leap_day() {
        // 2024-02-29T12:34:56.789Z
        assert_eq!(format_millis(1_709_210_096_789), "20240229T12:34:56.789");
    }

    #[test]
    fn test_format_millis_before_epoch() {
        assert_eq!(format_millis(-1), "19691231T23:59:59.999");
    }

    #[test]
    fn test_msg_id_keeps_trailing_digits() {
        if !colour_enabled() {
            assert_eq!(msg_id(1_760_605_123_456), "m-5123456");
            assert_ne!(msg_id(1_760_605_123_456), msg_id(1_760_605_123_457));
            assert_eq!(msg_id(42), "m-42");
        }
    }

    #[test]
    fn test_tint_is_stable() {
        assert_eq!(tint_for("+12345678"), tint_for("+12345678"));
    }
}
