//! Extended scalar types.
//!
//! Schemas may declare any of the scalars below; the executable schema
//! builder registers them with an input validator. Temporal scalars are
//! validated against configurable `time` format descriptions, the numeric
//! ones accept either a JSON number or its string form (for values that do
//! not fit a double).

use std::sync::{Arc, LazyLock};

use async_graphql::Value;
use async_graphql::dynamic::Scalar;
use time::format_description::{self, OwnedFormatItem};
use time::parsing::Parsed;
use time::macros::date;
use time::{Date, OffsetDateTime, Time, UtcOffset};

use crate::config::ScalarConfig;

/// Scalars every GraphQL schema has; never re-registered.
pub const BUILT_IN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

pub const LOCAL_DATE: &str = "LocalDate";
pub const OFFSET_DATE_TIME: &str = "OffsetDateTime";
pub const OFFSET_TIME: &str = "OffsetTime";
pub const DATE: &str = "Date";
pub const LONG: &str = "Long";
pub const BIG_DECIMAL: &str = "BigDecimal";
pub const BIG_INTEGER: &str = "BigInteger";
pub const BYTE: &str = "Byte";
pub const CHAR: &str = "Char";

/// Every scalar with a validator.
pub const EXTENDED_SCALARS: &[&str] = &[
    LOCAL_DATE,
    OFFSET_DATE_TIME,
    OFFSET_TIME,
    DATE,
    LONG,
    BIG_DECIMAL,
    BIG_INTEGER,
    BYTE,
    CHAR,
];

static INTEGER_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[+-]?[0-9]+$").expect("Invalid integer regex"));

static DECIMAL_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?$")
        .expect("Invalid decimal regex")
});

/// A format description in the configuration could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid {setting} pattern '{pattern}': {source}")]
pub struct ScalarFormatError {
    pub setting: &'static str,
    pub pattern: String,
    #[source]
    pub source: time::error::InvalidFormatDescription,
}

/// Failure to read an `OffsetTime` value.
#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error(transparent)]
    Parse(#[from] time::error::Parse),

    #[error("unexpected trailing input: {0:?}")]
    TrailingInput(String),
}

/// A time of day with a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetTime {
    pub time: Time,
    pub offset: UtcOffset,
}

/// Compiled temporal patterns shared by validators and resolvers.
#[derive(Debug, Clone)]
pub struct TemporalFormats {
    date: OwnedFormatItem,
    date_time: OwnedFormatItem,
    time: OwnedFormatItem,
}

impl TemporalFormats {
    /// Compiles the patterns of `config`.
    ///
    /// # Errors
    ///
    /// Returns the first pattern that is not a valid format description.
    pub fn from_config(config: &ScalarConfig) -> Result<Self, ScalarFormatError> {
        Ok(Self {
            date: compile("date_format", &config.date_format)?,
            date_time: compile("date_time_format", &config.date_time_format)?,
            time: compile("time_format", &config.time_format)?,
        })
    }

    pub fn parse_date(&self, input: &str) -> Result<Date, time::error::Parse> {
        Date::parse(input, &self.date)
    }

    pub fn format_date(&self, date: Date) -> Result<String, time::error::Format> {
        date.format(&self.date)
    }

    pub fn parse_date_time(&self, input: &str) -> Result<OffsetDateTime, time::error::Parse> {
        OffsetDateTime::parse(input, &self.date_time)
    }

    pub fn format_date_time(&self, value: OffsetDateTime) -> Result<String, time::error::Format> {
        value.format(&self.date_time)
    }

    /// Formats an instant (the `Date` scalar) in UTC.
    pub fn format_instant(&self, value: OffsetDateTime) -> Result<String, time::error::Format> {
        value.to_offset(UtcOffset::UTC).format(&self.date_time)
    }

    pub fn parse_time(&self, input: &str) -> Result<OffsetTime, TimeParseError> {
        let mut parsed = Parsed::new();
        let rest = parsed
            .parse_item(input.as_bytes(), &self.time)
            .map_err(time::error::Parse::from)?;
        if !rest.is_empty() {
            return Err(TimeParseError::TrailingInput(
                String::from_utf8_lossy(rest).into_owned(),
            ));
        }

        Ok(OffsetTime {
            time: Time::try_from(parsed).map_err(time::error::Parse::from)?,
            offset: UtcOffset::try_from(parsed).map_err(time::error::Parse::from)?,
        })
    }

    pub fn format_time(&self, value: OffsetTime) -> Result<String, time::error::Format> {
        // Only the time and offset components of the pattern are rendered.
        date!(1970 - 01 - 01)
            .with_time(value.time)
            .assume_offset(value.offset)
            .format(&self.time)
    }
}

fn compile(setting: &'static str, pattern: &str) -> Result<OwnedFormatItem, ScalarFormatError> {
    format_description::parse_owned::<2>(pattern).map_err(|source| ScalarFormatError {
        setting,
        pattern: pattern.to_string(),
        source,
    })
}

/// Returns `true` for scalars GraphQL defines itself.
#[must_use]
pub fn is_built_in(name: &str) -> bool {
    BUILT_IN_SCALARS.contains(&name)
}

/// Builds the dynamic scalar for `name` if it is one of the extended scalars.
pub fn extended_scalar(name: &str, formats: &Arc<TemporalFormats>) -> Option<Scalar> {
    let scalar = Scalar::new(name);

    let scalar = match name {
        LOCAL_DATE => {
            let formats = Arc::clone(formats);
            scalar
                .description("A calendar date without a time zone")
                .validator(move |value| as_str(value).is_some_and(|s| formats.parse_date(s).is_ok()))
        }
        OFFSET_DATE_TIME | DATE => {
            let formats = Arc::clone(formats);
            let description = if name == DATE {
                "An instant, rendered in UTC"
            } else {
                "A date-time with an offset from UTC"
            };
            scalar.description(description).validator(move |value| {
                as_str(value).is_some_and(|s| formats.parse_date_time(s).is_ok())
            })
        }
        OFFSET_TIME => {
            let formats = Arc::clone(formats);
            scalar
                .description("A time of day with an offset from UTC")
                .validator(move |value| as_str(value).is_some_and(|s| formats.parse_time(s).is_ok()))
        }
        LONG => scalar
            .description("A signed 64-bit integer")
            .validator(is_long),
        BIG_INTEGER => scalar
            .description("An arbitrary precision integer")
            .validator(is_big_integer),
        BIG_DECIMAL => scalar
            .description("An arbitrary precision decimal")
            .validator(is_big_decimal),
        BYTE => scalar
            .description("A signed 8-bit integer")
            .validator(is_byte),
        CHAR => scalar
            .description("A single character")
            .validator(is_char),
        _ => return None,
    };

    Some(scalar)
}

fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn is_long(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_i64().is_some(),
        Value::String(s) => s.parse::<i64>().is_ok(),
        _ => false,
    }
}

fn is_big_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => INTEGER_REGEX.is_match(s),
        _ => false,
    }
}

fn is_big_decimal(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => DECIMAL_REGEX.is_match(s),
        _ => false,
    }
}

fn is_byte(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_i64().is_some_and(|v| i8::try_from(v).is_ok()),
        _ => false,
    }
}

fn is_char(value: &Value) -> bool {
    as_str(value).is_some_and(|s| s.chars().count() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset, time};

    fn formats() -> TemporalFormats {
        TemporalFormats::from_config(&ScalarConfig::default()).unwrap()
    }

    #[test]
    fn test_default_date_round_trip() {
        let formats = formats();
        assert_eq!(formats.parse_date("2024-01-15").unwrap(), date!(2024 - 01 - 15));
        assert_eq!(formats.format_date(date!(2024 - 01 - 15)).unwrap(), "2024-01-15");
        assert!(formats.parse_date("15/01/2024").is_err());
    }

    #[test]
    fn test_default_date_time_pattern() {
        let formats = formats();
        let value = formats.parse_date_time("2024-01-15T10:30:00.250+0100").unwrap();
        assert_eq!(value, datetime!(2024-01-15 10:30:00.250 +01:00));
        assert_eq!(
            formats.format_instant(value).unwrap(),
            "2024-01-15T09:30:00.250+0000"
        );
    }

    #[test]
    fn test_offset_time() {
        let formats = formats();
        let value = formats.parse_time("10:30:00.000-0500").unwrap();
        assert_eq!(value.time, time!(10:30));
        assert_eq!(value.offset, offset!(-5));
        assert_eq!(formats.format_time(value).unwrap(), "10:30:00.000-0500");
        assert!(matches!(
            formats.parse_time("10:30:00.000-0500 trailing"),
            Err(TimeParseError::TrailingInput(rest)) if rest == " trailing"
        ));
        assert!(matches!(
            formats.parse_time("25:30:00.000-0500"),
            Err(TimeParseError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let config = ScalarConfig {
            date_format: "[year]-[bogus]".into(),
            ..ScalarConfig::default()
        };
        let err = TemporalFormats::from_config(&config).unwrap_err();
        assert_eq!(err.setting, "date_format");
    }

    #[test]
    fn test_numeric_validators() {
        assert!(is_long(&Value::String("9223372036854775807".into())));
        assert!(!is_long(&Value::String("9223372036854775808".into())));
        assert!(is_big_integer(&Value::String("-123456789012345678901234567890".into())));
        assert!(!is_big_integer(&Value::String("1.5".into())));
        assert!(is_big_decimal(&Value::String("1.5e10".into())));
        assert!(!is_big_decimal(&Value::String("abc".into())));
        assert!(is_byte(&Value::Number(127.into())));
        assert!(!is_byte(&Value::Number(128.into())));
        assert!(is_char(&Value::String("x".into())));
        assert!(!is_char(&Value::String("xy".into())));
    }

    #[test]
    fn test_extended_scalar_lookup() {
        let formats = Arc::new(formats());
        for name in EXTENDED_SCALARS {
            assert!(extended_scalar(name, &formats).is_some(), "{name}");
        }
        assert!(extended_scalar("Json", &formats).is_none());
        assert!(is_built_in("ID"));
        assert!(!is_built_in(LONG));
    }
}
