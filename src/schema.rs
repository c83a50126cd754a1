//! Shape predicates and normalizers over raw JSON fragments.
//!
//! Builders validate every fragment through these helpers before
//! constructing anything, so a malformed document always fails with a
//! path-cited schema error instead of a half-built scenario.

use serde_json::{Map, Value as Json};

use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rules::ParseContext;

/// A short description of a JSON value's type, for error messages.
#[must_use]
pub(crate) fn describe(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

fn shape(cx: &ParseContext<'_>, expected: &'static str, v: &Json) -> ParseError {
    cx.error(ParseErrorKind::Shape {
        expected,
        found: describe(v).to_owned(),
    })
}

/// The fragment as an object.
pub(crate) fn object<'j>(cx: &ParseContext<'_>, v: &'j Json) -> ParseResult<&'j Map<String, Json>> {
    v.as_object().ok_or_else(|| shape(cx, "an object", v))
}

/// The fragment as an array.
pub(crate) fn array<'j>(cx: &ParseContext<'_>, v: &'j Json) -> ParseResult<&'j [Json]> {
    v.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| shape(cx, "an array", v))
}

/// The fragment as a string.
pub(crate) fn string<'j>(cx: &ParseContext<'_>, v: &'j Json) -> ParseResult<&'j str> {
    v.as_str().ok_or_else(|| shape(cx, "a string", v))
}

/// The fragment as a number.
pub(crate) fn number(cx: &ParseContext<'_>, v: &Json) -> ParseResult<f64> {
    v.as_f64().ok_or_else(|| shape(cx, "a number", v))
}

/// The fragment as a boolean.
pub(crate) fn boolean(cx: &ParseContext<'_>, v: &Json) -> ParseResult<bool> {
    v.as_bool().ok_or_else(|| shape(cx, "a boolean", v))
}

/// The fragment as a signed integer.
pub(crate) fn integer(cx: &ParseContext<'_>, v: &Json) -> ParseResult<i64> {
    v.as_i64().ok_or_else(|| shape(cx, "an integer", v))
}

/// The fragment as a non-negative integer index.
pub(crate) fn index(cx: &ParseContext<'_>, v: &Json) -> ParseResult<usize> {
    v.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| shape(cx, "a non-negative integer", v))
}

/// The fragment as a board dimension (1 to 65535).
pub(crate) fn dimension(cx: &ParseContext<'_>, v: &Json) -> ParseResult<u16> {
    let n = v
        .as_u64()
        .ok_or_else(|| shape(cx, "a positive integer", v))?;
    u16::try_from(n)
        .ok()
        .filter(|d| *d >= 1)
        .ok_or_else(|| cx.invalid("board dimensions must be between 1 and 65535"))
}

/// A required field of an object; errors at the field's path when absent.
pub(crate) fn required<'j>(
    cx: &ParseContext<'_>,
    obj: &'j Map<String, Json>,
    field: &'static str,
) -> ParseResult<&'j Json> {
    obj.get(field)
        .ok_or_else(|| cx.error(ParseErrorKind::MissingField { field }))
}

/// Reject any field outside the allowed set, to catch author typos early.
pub(crate) fn forbid_unknown(
    cx: &ParseContext<'_>,
    obj: &Map<String, Json>,
    allowed: &[&str],
) -> ParseResult<()> {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(cx.error(ParseErrorKind::UnknownField { field: key.clone() }));
        }
    }
    Ok(())
}
