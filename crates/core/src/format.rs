//! Date and number patterns used by formatted field rules.
//!
//! Date patterns use chrono's strftime syntax (`%d.%m.%Y`). Number patterns
//! follow the DecimalFormat shape: a literal prefix, a body built from `#`,
//! `0`, `,` and `.`, and a literal suffix (`$###,###,###`, `#,##0.00 EUR`).

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

use crate::errors::MappingError;

/// Render a value the way it appears in error messages: strings unquoted.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// A validated strftime pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    pattern: String,
}

impl DatePattern {
    pub fn compile(pattern: &str) -> Result<Self, String> {
        if pattern.is_empty() {
            return Err("date pattern must not be empty".into());
        }
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(format!("'{pattern}' is not a valid strftime pattern"));
        }
        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Render a serialised date (ISO date, ISO date-time or RFC 3339).
    pub fn format(&self, field: &str, value: &Value) -> Result<Value, MappingError> {
        let expected = || "an ISO-8601 date or date-time";
        let raw = value
            .as_str()
            .ok_or_else(|| MappingError::format(field, display_value(value), expected()))?;

        let mut out = String::new();
        let written = if let Ok(date) = raw.parse::<NaiveDate>() {
            write!(out, "{}", date.format(&self.pattern))
        } else if let Ok(datetime) = raw.parse::<NaiveDateTime>() {
            write!(out, "{}", datetime.format(&self.pattern))
        } else if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
            write!(out, "{}", datetime.format(&self.pattern))
        } else {
            return Err(MappingError::format(field, raw, expected()));
        };

        // chrono reports fields the value cannot supply (a time on a date) as fmt::Error.
        written.map_err(|_| {
            MappingError::format(field, raw, format!("a value renderable as '{}'", self.pattern))
        })?;
        Ok(Value::String(out))
    }

    /// Parse a rendered date back into its serialised form. The most
    /// specific type the pattern supports wins: offset date-time, then
    /// local date-time, then date.
    pub fn parse(&self, field: &str, raw: &str) -> Result<Value, MappingError> {
        let parsed = if let Ok(datetime) = DateTime::parse_from_str(raw, &self.pattern) {
            serde_json::to_value(datetime)
        } else if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, &self.pattern) {
            serde_json::to_value(datetime)
        } else if let Ok(date) = NaiveDate::parse_from_str(raw, &self.pattern) {
            serde_json::to_value(date)
        } else {
            return Err(MappingError::format(
                field,
                raw,
                format!("a date matching '{}'", self.pattern),
            ));
        };
        parsed.map_err(|e| MappingError::serialization(format!("date field '{field}'"), e))
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// A compiled DecimalFormat-style number pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberPattern {
    pattern: String,
    prefix: String,
    suffix: String,
    /// Digits per group, if the integer part carries a `,`.
    grouping: Option<usize>,
    min_int: usize,
    min_frac: usize,
    max_frac: usize,
}

fn is_body_char(c: char) -> bool {
    matches!(c, '#' | '0' | ',' | '.')
}

impl NumberPattern {
    pub fn compile(pattern: &str) -> Result<Self, String> {
        let start = pattern
            .find(is_body_char)
            .ok_or_else(|| format!("'{pattern}' has no digit placeholders"))?;
        let end = pattern.rfind(is_body_char).map_or(start, |i| i + 1);

        let prefix = &pattern[..start];
        let body = &pattern[start..end];
        let suffix = &pattern[end..];

        if body.chars().any(|c| !is_body_char(c)) {
            return Err(format!("'{pattern}' has literal text inside the number body"));
        }

        let (int_part, frac_part) = match body.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (body, ""),
        };
        if frac_part.contains(['.', ',']) {
            return Err(format!("'{pattern}' has separators in the fraction part"));
        }
        if !int_part.contains(['#', '0']) {
            return Err(format!("'{pattern}' has no integer digit placeholders"));
        }

        let grouping = match int_part.rfind(',') {
            Some(idx) => {
                let size = int_part.len() - idx - 1;
                if size == 0 {
                    return Err(format!("'{pattern}' ends its integer part with ','"));
                }
                Some(size)
            }
            None => None,
        };

        Ok(Self {
            pattern: pattern.to_string(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            grouping,
            min_int: int_part.matches('0').count(),
            min_frac: frac_part.matches('0').count(),
            max_frac: frac_part.len(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Render a serialised number.
    pub fn format(&self, field: &str, value: &Value) -> Result<Value, MappingError> {
        let rendered = if let Some(n) = value.as_i64() {
            self.render(n < 0, &n.unsigned_abs().to_string(), "")
        } else if let Some(n) = value.as_u64() {
            self.render(false, &n.to_string(), "")
        } else if let Some(n) = value.as_f64() {
            let fixed = format!("{:.*}", self.max_frac, n.abs());
            let (int_digits, frac_digits) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
            let mut frac_digits = frac_digits.trim_end_matches('0');
            if frac_digits.len() < self.min_frac {
                frac_digits = &fixed[fixed.len() - self.max_frac..][..self.min_frac];
            }
            let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
            self.render(n < 0.0 && !is_zero, int_digits, frac_digits)
        } else {
            return Err(MappingError::format(field, display_value(value), "a number"));
        };
        Ok(Value::String(rendered))
    }

    fn render(&self, negative: bool, int_digits: &str, frac_digits: &str) -> String {
        let trimmed = int_digits.trim_start_matches('0');
        let width = self.min_int.max(1);
        let digits = format!("{trimmed:0>width$}");

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&self.prefix);
        match self.grouping {
            Some(size) => {
                for (i, c) in digits.chars().enumerate() {
                    if i > 0 && (digits.len() - i) % size == 0 {
                        out.push(',');
                    }
                    out.push(c);
                }
            }
            None => out.push_str(&digits),
        }

        let mut frac = frac_digits.to_string();
        while frac.len() < self.min_frac {
            frac.push('0');
        }
        if !frac.is_empty() {
            out.push('.');
            out.push_str(&frac);
        }
        out.push_str(&self.suffix);
        out
    }

    /// Parse a rendered number. Yields an integer when there is no non-zero
    /// fraction, otherwise a float.
    pub fn parse(&self, field: &str, raw: &str) -> Result<Value, MappingError> {
        let err =
            || MappingError::format(field, raw, format!("a number matching '{}'", self.pattern));

        let text = raw.trim();
        let (negative, text) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let text = text
            .strip_prefix(self.prefix.as_str())
            .and_then(|t| t.strip_suffix(self.suffix.as_str()))
            .ok_or_else(err)?;

        let (int_part, frac_part) = match text.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (text, None),
        };

        let int_digits: String = match self.grouping {
            Some(_) => int_part.chars().filter(|c| *c != ',').collect(),
            None => int_part.to_string(),
        };
        if int_digits.is_empty() || !int_digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }

        let frac_digits = match frac_part {
            Some(f) if f.is_empty() || f.len() > self.max_frac => return Err(err()),
            Some(f) if !f.chars().all(|c| c.is_ascii_digit()) => return Err(err()),
            Some(f) => f,
            None => "",
        };

        if frac_digits.chars().all(|c| c == '0') {
            let magnitude: u64 = int_digits.parse().map_err(|_| err())?;
            if negative {
                let signed = i64::try_from(magnitude).map_err(|_| err())?;
                return Ok(Value::from(-signed));
            }
            return Ok(Value::from(magnitude));
        }

        let sign = if negative { "-" } else { "" };
        let number: f64 = format!("{sign}{int_digits}.{frac_digits}")
            .parse()
            .map_err(|_| err())?;
        Number::from_f64(number).map(Value::Number).ok_or_else(err)
    }
}
