//! Extended scalar types.
//!
//! - Temporal: `LocalDate`, `OffsetDateTime`, `OffsetTime`, `Date`
//! - Numeric: `Long`, `BigInteger`, `BigDecimal`, `Byte`
//! - Other: `Char`
//!
//! Temporal patterns come from `[graphql.scalars]`; resolvers format and
//! parse values through the shared [`TemporalFormats`].

mod scalars;

pub use scalars::{
    BIG_DECIMAL, BIG_INTEGER, BUILT_IN_SCALARS, BYTE, CHAR, DATE, EXTENDED_SCALARS, LOCAL_DATE,
    LONG, OFFSET_DATE_TIME, OFFSET_TIME, OffsetTime, ScalarFormatError, TemporalFormats,
    TimeParseError, extended_scalar, is_built_in,
};
