//! Relay connections over in-memory lists.
//!
//! Backs the `@connection` types: a resolver fetches the full list, hands it
//! to [`ListConnection`] and returns the connection value. The synthesized
//! `Connection`, `Edge` and `PageInfo` fields are then served by the
//! property resolver.

use async_graphql::dynamic::ResolverContext;
use async_graphql::{Name, Value};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::trace;

use super::json_to_graphql_value;

/// Default prefix mixed into every cursor.
pub const DEFAULT_CURSOR_PREFIX: &str = "simple-cursor";

/// Pagination failures, reported to clients as field errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("invalid cursor '{0}'")]
    InvalidCursor(String),

    #[error("'{argument}' must not be negative, got {value}")]
    NegativePageSize { argument: &'static str, value: i64 },
}

/// The `first/after/last/before` arguments of a connection field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageArguments {
    pub first: Option<i64>,
    pub after: Option<String>,
    pub last: Option<i64>,
    pub before: Option<String>,
}

impl PageArguments {
    /// Reads the pagination arguments of the field being resolved.
    ///
    /// Absent and `null` arguments are treated alike.
    pub fn from_context(ctx: &ResolverContext<'_>) -> Result<Self, async_graphql::Error> {
        let int = |name: &str| -> Result<Option<i64>, async_graphql::Error> {
            match ctx.args.get(name) {
                Some(value) if !value.is_null() => Ok(Some(value.i64()?)),
                _ => Ok(None),
            }
        };
        let string = |name: &str| -> Result<Option<String>, async_graphql::Error> {
            match ctx.args.get(name) {
                Some(value) if !value.is_null() => Ok(Some(value.string()?.to_string())),
                _ => Ok(None),
            }
        };

        Ok(Self {
            first: int("first")?,
            after: string("after")?,
            last: int("last")?,
            before: string("before")?,
        })
    }
}

/// A relay connection over a fully materialized list.
///
/// Cursors are the base64 form of `prefix:index`, so they stay valid as long
/// as the underlying list keeps its order.
#[derive(Debug, Clone)]
pub struct ListConnection {
    items: Vec<Value>,
    prefix: String,
}

impl ListConnection {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            prefix: DEFAULT_CURSOR_PREFIX.to_string(),
        }
    }

    /// Builds a connection over JSON items.
    pub fn from_json(items: Vec<serde_json::Value>) -> Self {
        Self::new(items.into_iter().map(json_to_graphql_value).collect())
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Encodes the cursor of the item at `index`.
    #[must_use]
    pub fn cursor_for(&self, index: usize) -> String {
        STANDARD.encode(format!("{}:{index}", self.prefix))
    }

    /// Decodes a cursor produced by [`cursor_for`](Self::cursor_for).
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidCursor`] for anything that is not
    /// base64 of `prefix:index`.
    pub fn offset_of(&self, cursor: &str) -> Result<usize, ConnectionError> {
        let invalid = || ConnectionError::InvalidCursor(cursor.to_string());

        let bytes = STANDARD.decode(cursor).map_err(|_| invalid())?;
        let text = String::from_utf8(bytes).map_err(|_| invalid())?;
        text.strip_prefix(&self.prefix)
            .and_then(|rest| rest.strip_prefix(':'))
            .and_then(|index| index.parse().ok())
            .ok_or_else(invalid)
    }

    /// Reads the page arguments from `ctx` and builds the connection value.
    pub fn resolve(&self, ctx: &ResolverContext<'_>) -> Result<Value, async_graphql::Error> {
        let args = PageArguments::from_context(ctx)?;
        Ok(self.page(&args)?)
    }

    /// Builds the connection value for one page.
    ///
    /// `after`/`before` narrow the list to a window first, then `first` keeps
    /// the head of that window and `last` its tail. `hasPreviousPage` and
    /// `hasNextPage` report whether the page stops short of the window edges.
    ///
    /// # Errors
    ///
    /// Fails on an undecodable cursor or a negative page size.
    pub fn page(&self, args: &PageArguments) -> Result<Value, ConnectionError> {
        let total = self.items.len();
        let first = args.first.map(|value| page_size("first", value)).transpose()?;
        let last = args.last.map(|value| page_size("last", value)).transpose()?;

        let begin = match &args.after {
            Some(cursor) => self.offset_of(cursor)?.saturating_add(1),
            None => 0,
        };
        let end = match &args.before {
            Some(cursor) => self.offset_of(cursor)?.min(total),
            None => total,
        };
        let begin = begin.min(end);

        if begin == end {
            return Ok(empty_connection());
        }

        let (window_first, window_last) = (begin, end - 1);
        let (mut start, mut stop) = (begin, end);

        if let Some(first) = first {
            stop = start + first.min(stop - start);
        }
        if let Some(last) = last {
            start = stop - last.min(stop - start);
        }

        if start == stop {
            return Ok(empty_connection());
        }

        trace!(start, stop, total, "Slicing list connection");

        let edges: Vec<Value> = (start..stop)
            .map(|index| {
                object([
                    ("cursor", Value::String(self.cursor_for(index))),
                    ("node", self.items[index].clone()),
                ])
            })
            .collect();

        let page_info = object([
            ("hasPreviousPage", Value::Boolean(start != window_first)),
            ("hasNextPage", Value::Boolean(stop - 1 != window_last)),
            ("startCursor", Value::String(self.cursor_for(start))),
            ("endCursor", Value::String(self.cursor_for(stop - 1))),
        ]);

        Ok(object([("edges", Value::List(edges)), ("pageInfo", page_info)]))
    }
}

fn page_size(argument: &'static str, value: i64) -> Result<usize, ConnectionError> {
    usize::try_from(value).map_err(|_| ConnectionError::NegativePageSize { argument, value })
}

fn empty_connection() -> Value {
    let page_info = object([
        ("hasPreviousPage", Value::Boolean(false)),
        ("hasNextPage", Value::Boolean(false)),
        ("startCursor", Value::String(String::new())),
        ("endCursor", Value::String(String::new())),
    ]);
    object([("edges", Value::List(Vec::new())), ("pageInfo", page_info)])
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(key, value)| (Name::new(key), value))
            .collect(),
    )
}
