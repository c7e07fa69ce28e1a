//! Scalar values, plain-scalar resolution and scalar rendering.
//!
//! Plain scalars resolve with the YAML 1.2 core schema. The renderer quotes
//! any string that would resolve to something else, and additionally quotes
//! YAML 1.1 boolean words in value position because CI runners still parse
//! them as booleans.

use serde_json::{Number, Value};

/// A leaf value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// `null` or an empty value.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// An integer that fits in `i64`.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// Any text.
    String(String),
}

impl Scalar {
    /// Borrow the text of a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// Convert into a JSON value. Non-finite floats become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Int(number) => Value::Number((*number).into()),
            Self::Float(number) => Number::from_f64(*number).map_or(Value::Null, Value::Number),
            Self::String(text) => Value::String(text.clone()),
        }
    }

    /// Render in value position.
    pub(crate) fn render(&self) -> Rendered {
        match self {
            Self::Null => Rendered::Inline("null".to_owned()),
            Self::Bool(flag) => Rendered::Inline(flag.to_string()),
            Self::Int(number) => Rendered::Inline(number.to_string()),
            Self::Float(number) => Rendered::Inline(render_float(*number)),
            Self::String(text) => render_string(text),
        }
    }
}

impl From<&str> for Scalar {
    fn from(text: &str) -> Self {
        Self::String(text.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl From<bool> for Scalar {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<i64> for Scalar {
    fn from(number: i64) -> Self {
        Self::Int(number)
    }
}

impl From<f64> for Scalar {
    fn from(number: f64) -> Self {
        Self::Float(number)
    }
}

/// Rendered form of a scalar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Rendered {
    /// Fits on the line that introduces it.
    Inline(String),
    /// Block literal: `indicator` (`|` or `|-`) then one line per entry.
    Literal {
        indicator: &'static str,
        lines: Vec<String>,
    },
}

/// Resolve a plain (unquoted) scalar.
pub(crate) fn resolve_plain(text: &str) -> Scalar {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return Scalar::Null,
        "true" | "True" | "TRUE" => return Scalar::Bool(true),
        "false" | "False" | "FALSE" => return Scalar::Bool(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return Scalar::Float(f64::INFINITY);
        }
        "-.inf" | "-.Inf" | "-.INF" => return Scalar::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Scalar::Float(f64::NAN),
        _ => {}
    }
    if let Some(number) = parse_int(text) {
        return Scalar::Int(number);
    }
    if is_float_syntax(text) {
        if let Ok(number) = text.parse::<f64>() {
            return Scalar::Float(number);
        }
    }
    Scalar::String(text.to_owned())
}

fn parse_int(text: &str) -> Option<i64> {
    if let Some(octal) = text.strip_prefix("0o") {
        return digits_only(octal, 8).then(|| i64::from_str_radix(octal, 8).ok())?;
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return digits_only(hex, 16).then(|| i64::from_str_radix(hex, 16).ok())?;
    }
    let unsigned = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    if digits_only(unsigned, 10) {
        text.parse().ok()
    } else {
        None
    }
}

fn digits_only(text: &str, radix: u32) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_digit(radix))
}

/// `[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?`
fn is_float_syntax(text: &str) -> bool {
    let body = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (body.get(..at).unwrap_or(""), body.get(at + 1..)),
        None => (body, None),
    };
    let mantissa_ok = match mantissa.split_once('.') {
        Some((whole, fraction)) => {
            (whole.is_empty() && digits_only(fraction, 10))
                || (digits_only(whole, 10) && (fraction.is_empty() || digits_only(fraction, 10)))
        }
        None => digits_only(mantissa, 10),
    };
    let exponent_ok = exponent.is_none_or(|exp| {
        let digits = exp
            .strip_prefix('-')
            .or_else(|| exp.strip_prefix('+'))
            .unwrap_or(exp);
        digits_only(digits, 10)
    });
    mantissa_ok && exponent_ok
}

fn render_float(number: f64) -> String {
    if number.is_nan() {
        ".nan".to_owned()
    } else if number.is_infinite() {
        if number.is_sign_negative() {
            "-.inf".to_owned()
        } else {
            ".inf".to_owned()
        }
    } else {
        format!("{number:?}")
    }
}

const YAML11_BOOLEANS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "n", "N", "no", "No", "NO", "on", "On", "ON", "off", "Off",
    "OFF",
];

fn render_string(text: &str) -> Rendered {
    if text.contains('\n') {
        if let Some(literal) = literal_block(text) {
            return literal;
        }
        return Rendered::Inline(double_quoted(text));
    }
    if is_plain_safe(text) && !YAML11_BOOLEANS.contains(&text) {
        Rendered::Inline(text.to_owned())
    } else {
        Rendered::Inline(double_quoted(text))
    }
}

/// Render a mapping key. Keys never use block literals.
pub(crate) fn render_key(key: &str) -> String {
    if is_plain_safe(key) {
        key.to_owned()
    } else {
        double_quoted(key)
    }
}

fn double_quoted(text: &str) -> String {
    Value::String(text.to_owned()).to_string()
}

fn literal_block(text: &str) -> Option<Rendered> {
    let (content, indicator) = match text.strip_suffix('\n') {
        Some(rest) if rest.ends_with('\n') => return None,
        Some(rest) => (rest, "|"),
        None => (text, "|-"),
    };
    let first_content_line = content.lines().find(|line| !line.trim().is_empty())?;
    if first_content_line.starts_with([' ', '\t']) {
        return None;
    }
    if content
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\t')
    {
        return None;
    }
    Some(Rendered::Literal {
        indicator,
        lines: content.split('\n').map(str::to_owned).collect(),
    })
}

fn is_plain_safe(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };
    if text.starts_with([' ', '\t']) || text.ends_with([' ', '\t', ':']) {
        return false;
    }
    if text.starts_with("---") || text.starts_with("...") {
        return false;
    }
    if text.chars().any(char::is_control) {
        return false;
    }
    let indicator_start = match first {
        '-' => text.chars().nth(1).is_none_or(|second| second == ' '),
        '?' | ':' | ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\''
        | '"' | '%' | '@' | '`' => true,
        _ => false,
    };
    if indicator_start || text.contains(": ") || text.contains(" #") {
        return false;
    }
    matches!(resolve_plain(text), Scalar::String(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", Scalar::Null)]
    #[case("~", Scalar::Null)]
    #[case("True", Scalar::Bool(true))]
    #[case("42", Scalar::Int(42))]
    #[case("-7", Scalar::Int(-7))]
    #[case("0x1F", Scalar::Int(31))]
    #[case("0o17", Scalar::Int(15))]
    #[case("1.5", Scalar::Float(1.5))]
    #[case("1e3", Scalar::Float(1000.0))]
    #[case("on", Scalar::String("on".to_owned()))]
    #[case("1.2.3", Scalar::String("1.2.3".to_owned()))]
    #[case("ubuntu-latest", Scalar::String("ubuntu-latest".to_owned()))]
    fn resolves_plain_scalars(#[case] text: &str, #[case] expected: Scalar) {
        assert_eq!(resolve_plain(text), expected);
    }

    #[rstest]
    #[case("ubuntu-latest", "ubuntu-latest")]
    #[case("--verbose", "--verbose")]
    #[case("true", "\"true\"")]
    #[case("yes", "\"yes\"")]
    #[case("y", "\"y\"")]
    #[case("N", "\"N\"")]
    #[case("off", "\"off\"")]
    #[case("x", "x")]
    #[case("1.10", "\"1.10\"")]
    #[case("", "\"\"")]
    #[case("a: b", "\"a: b\"")]
    #[case("*.rs", "\"*.rs\"")]
    #[case("echo # hi", "\"echo # hi\"")]
    #[case("- item", "\"- item\"")]
    #[case("${{ matrix.os }}", "${{ matrix.os }}")]
    fn renders_inline_strings(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(
            Scalar::from(text).render(),
            Rendered::Inline(expected.to_owned())
        );
    }

    #[test]
    fn keys_keep_yaml11_words_plain() {
        assert_eq!(render_key("on"), "on");
        assert_eq!(render_key("true"), "\"true\"");
    }

    #[rstest]
    #[case("make\nmake test\n", "|", vec!["make", "make test"])]
    #[case("make\nmake test", "|-", vec!["make", "make test"])]
    fn renders_multiline_strings_as_literals(
        #[case] text: &str,
        #[case] indicator: &'static str,
        #[case] lines: Vec<&str>,
    ) {
        assert_eq!(
            Scalar::from(text).render(),
            Rendered::Literal {
                indicator,
                lines: lines.into_iter().map(str::to_owned).collect(),
            }
        );
    }

    #[test]
    fn indented_first_line_falls_back_to_quotes() {
        assert_eq!(
            Scalar::from("  indented\nnext").render(),
            Rendered::Inline("\"  indented\\nnext\"".to_owned())
        );
    }

    #[test]
    fn floats_keep_a_fraction() {
        assert_eq!(
            Scalar::Float(1.0).render(),
            Rendered::Inline("1.0".to_owned())
        );
        assert_eq!(resolve_plain("1.0"), Scalar::Float(1.0));
    }
}
