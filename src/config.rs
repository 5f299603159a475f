use std::{path::PathBuf, time::Duration};

use time::{macros::format_description, Date, OffsetDateTime, PrimitiveDateTime};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.trongrid.io";
pub const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";
/// TronGrid caps `limit` at 200 per page.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Which transfer history to pull. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Native TRX transfers
    Trx,
    /// TRC-20 token transfers
    Trc20,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Trx => "TRX",
            Mode::Trc20 => "TRC20",
        }
    }

    /// Path below the base URL for one address.
    pub fn endpoint(&self, address: &str) -> String {
        match self {
            Mode::Trx => format!("/v1/accounts/{address}/transactions"),
            Mode::Trc20 => format!("/v1/accounts/{address}/transactions/trc20"),
        }
    }
}

/// Inclusive `[start, end]` bounds in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub min_timestamp: i64,
    pub max_timestamp: i64,
}

impl TimeWindow {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvertedWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            min_timestamp: epoch_millis(start),
            max_timestamp: epoch_millis(end),
        })
    }

    /// Parses both bounds as UTC wall-clock times.
    pub fn parse(start: &str, end: &str) -> Result<Self, ConfigError> {
        Self::new(parse_utc(start)?, parse_utc(end)?)
    }
}

fn epoch_millis(t: OffsetDateTime) -> i64 {
    (t.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`.
pub fn parse_utc(s: &str) -> Result<OffsetDateTime, ConfigError> {
    let s = s.trim();
    let with_secs = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let with_mins = format_description!("[year]-[month]-[day] [hour]:[minute]");
    let date_only = format_description!("[year]-[month]-[day]");

    if let Ok(dt) = PrimitiveDateTime::parse(s, with_secs) {
        return Ok(dt.assume_utc());
    }
    if let Ok(dt) = PrimitiveDateTime::parse(s, with_mins) {
        return Ok(dt.assume_utc());
    }
    if let Ok(d) = Date::parse(s, date_only) {
        return Ok(d.midnight().assume_utc());
    }
    Err(ConfigError::InvalidTime(s.to_string()))
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub api_key: String,
    pub base_url: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub window: TimeWindow,
    pub page_size: u32,
    pub mode: Mode,
    pub page_delay: Duration,
    pub request_timeout: Duration,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::PageSize {
                got: self.page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config(page_size: u32) -> RunConfig {
        RunConfig {
            api_key: "key".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            input: PathBuf::from("in.csv"),
            output: PathBuf::from("out.csv"),
            window: TimeWindow::parse("2025-08-09", "2025-08-12").unwrap(),
            page_size,
            mode: Mode::Trc20,
            page_delay: Duration::ZERO,
            request_timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_window_parsing() {
        let w = TimeWindow::parse("2025-08-09 00:00", "2025-08-12 00:00:00").unwrap();
        assert_eq!(w.min_timestamp, 1_754_697_600_000);
        assert_eq!(w.max_timestamp, 1_754_956_800_000);

        let d = TimeWindow::parse("2023-08-09", "2023-08-09 08:00:00").unwrap();
        assert_eq!(d.max_timestamp, 1_691_568_000_000);
    }

    #[test]
    fn test_window_rejects_bad_input() {
        assert!(matches!(
            TimeWindow::parse("2025-08-12", "2025-08-09"),
            Err(ConfigError::InvertedWindow { .. })
        ));
        assert!(matches!(
            TimeWindow::parse("yesterday", "2025-08-09"),
            Err(ConfigError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_page_size_validation() {
        assert!(sample_config(200).validate().is_ok());
        assert!(sample_config(1).validate().is_ok());
        assert!(sample_config(0).validate().is_err());
        assert!(sample_config(201).validate().is_err());
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(Mode::Trx.endpoint("TAbc"), "/v1/accounts/TAbc/transactions");
        assert_eq!(
            Mode::Trc20.endpoint("TAbc"),
            "/v1/accounts/TAbc/transactions/trc20"
        );
    }
}
