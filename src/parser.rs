use serde_json::Value;
use time::{macros::format_description, OffsetDateTime};

use crate::config::Mode;
use crate::error::ParseError;
use crate::models::NormalizedRecord;

/// TRX is denominated in sun, 10^6 per TRX.
pub const TRX_DECIMALS: u32 = 6;
pub const TRX_SYMBOL: &str = "TRX";
pub const DEFAULT_TOKEN_DECIMALS: u32 = 6;
pub const DEFAULT_TOKEN_SYMBOL: &str = "UNKNOWN";

impl Mode {
    /// Normalizes one raw record from this mode's endpoint.
    pub fn parse_record(&self, raw: &Value) -> Result<NormalizedRecord, ParseError> {
        match self {
            Mode::Trx => parse_trx(raw),
            Mode::Trc20 => parse_trc20(raw),
        }
    }

    /// Transaction id used in diagnostics, `?` when the record has none.
    pub fn record_id<'a>(&self, raw: &'a Value) -> &'a str {
        let key = match self {
            Mode::Trx => "txID",
            Mode::Trc20 => "transaction_id",
        };
        raw.get(key).and_then(Value::as_str).unwrap_or("?")
    }
}

fn parse_trx(raw: &Value) -> Result<NormalizedRecord, ParseError> {
    let value = raw
        .get("raw_data")
        .and_then(|r| r.get("contract"))
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("parameter"))
        .and_then(|p| p.get("value"))
        .ok_or(ParseError::MissingField("raw_data.contract[0].parameter.value"))?;
    if !value.is_object() {
        return Err(ParseError::UnexpectedType("raw_data.contract[0].parameter.value"));
    }

    let amount_sun = optional_integer(value, "amount")?.unwrap_or(0);
    let ts = required_integer(raw, "block_timestamp")?;

    Ok(NormalizedRecord {
        from: optional_string(value, "owner_address"),
        to: optional_string(value, "to_address"),
        amount: scale(amount_sun, TRX_DECIMALS),
        timestamp: format_timestamp_ms(ts)?,
        token_symbol: TRX_SYMBOL.to_string(),
        tx_id: optional_string(raw, "txID").unwrap_or_default(),
    })
}

fn parse_trc20(raw: &Value) -> Result<NormalizedRecord, ParseError> {
    let value = optional_integer(raw, "value")?.unwrap_or(0);
    let ts = required_integer(raw, "block_timestamp")?;

    let (decimals, symbol) = match raw.get("token_info") {
        None | Some(Value::Null) => (DEFAULT_TOKEN_DECIMALS, DEFAULT_TOKEN_SYMBOL.to_string()),
        Some(info) if info.is_object() => {
            let decimals = match optional_integer(info, "decimals")? {
                Some(d) if d > u8::MAX as u128 => return Err(ParseError::DecimalsOutOfRange(d)),
                Some(d) => d as u32,
                None => DEFAULT_TOKEN_DECIMALS,
            };
            let symbol = optional_string(info, "symbol")
                .unwrap_or_else(|| DEFAULT_TOKEN_SYMBOL.to_string());
            (decimals, symbol)
        }
        Some(_) => return Err(ParseError::UnexpectedType("token_info")),
    };

    Ok(NormalizedRecord {
        from: optional_string(raw, "from"),
        to: optional_string(raw, "to"),
        amount: scale(value, decimals),
        timestamp: format_timestamp_ms(ts)?,
        token_symbol: symbol,
        tx_id: optional_string(raw, "transaction_id").unwrap_or_default(),
    })
}

/// Smallest-unit integer to human-readable units.
pub fn scale(raw: u128, decimals: u32) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

/// Epoch milliseconds to `YYYY-MM-DD HH:MM:SS`, always in UTC.
pub fn format_timestamp_ms(ms: u128) -> Result<String, ParseError> {
    if ms > i64::MAX as u128 {
        return Err(ParseError::TimestampOutOfRange(ms));
    }
    let dt = OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
        .map_err(|_| ParseError::TimestampOutOfRange(ms))?;
    dt.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .map_err(|_| ParseError::TimestampOutOfRange(ms))
}

fn required_integer(obj: &Value, field: &'static str) -> Result<u128, ParseError> {
    optional_integer(obj, field)?.ok_or(ParseError::MissingField(field))
}

/// JSON numbers and decimal strings are both accepted; TronGrid sends
/// TRC-20 values as strings.
fn optional_integer(obj: &Value, field: &'static str) -> Result<Option<u128>, ParseError> {
    let not_int = |v: &Value| ParseError::NotAnInteger {
        field,
        value: v.to_string(),
    };
    let Some(v) = obj.get(field) else {
        return Ok(None);
    };
    match v {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Ok(Some(u as u128));
            }
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f < u128::MAX as f64 => {
                    Ok(Some(f as u128))
                }
                _ => Err(not_int(v)),
            }
        }
        Value::String(s) => s.trim().parse::<u128>().map(Some).map_err(|_| not_int(v)),
        _ => Err(ParseError::UnexpectedType(field)),
    }
}

fn optional_string(obj: &Value, field: &str) -> Option<String> {
    match obj.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
