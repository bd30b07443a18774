#![forbid(unsafe_code)]

//! Standard and custom numeric format strings, and their inverse.
//!
//! Standard strings are one letter with an optional precision of up to two
//! digits (`"N2"`, `"p"`, `"X8"`). Anything else is a custom pattern built
//! from `0`, `#`, `.`, `,`, `%`, quoted or escaped literals, and up to three
//! `;`-separated sections (positive, negative, zero).

use crate::error::BindingError;
use crate::value::{Value, ValueKind, float_to_int, parse_bool};

use super::culture::FormatInfo;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(Self::Int(*i)),
            Value::Float(f) => Some(Self::Float(*f)),
            _ => None,
        }
    }

    fn is_negative(self) -> bool {
        match self {
            Self::Int(i) => i < 0,
            Self::Float(f) => f.is_sign_negative() && f != 0.0,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Self::Int(i) => i == 0,
            Self::Float(f) => f == 0.0,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn abs(self) -> Self {
        match self {
            Self::Int(i) => i.checked_abs().map_or(Self::Float(self.as_f64().abs()), Self::Int),
            Self::Float(f) => Self::Float(f.abs()),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn scale(self, factor: i64) -> Self {
        match self {
            Self::Int(i) => i
                .checked_mul(factor)
                .map_or(Self::Float(i as f64 * factor as f64), Self::Int),
            Self::Float(f) => Self::Float(f * factor as f64),
        }
    }
}

/// `"N2"` splits into `('N', Some(2))`; custom patterns yield `None`.
fn parse_standard(format: &str) -> Option<(char, Option<usize>)> {
    let mut chars = format.chars();
    let specifier = chars.next().filter(char::is_ascii_alphabetic)?;
    let rest = chars.as_str();
    if rest.is_empty() {
        return Some((specifier, None));
    }
    if rest.len() > 2 || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok().map(|precision| (specifier, Some(precision)))
}

/// Format `number` with a standard or custom format string.
pub(crate) fn format_number(
    number: Number,
    format: &str,
    info: &FormatInfo,
) -> Result<String, BindingError> {
    if let Number::Float(f) = number
        && !f.is_finite()
    {
        return Ok(if f.is_nan() {
            "NaN".to_string()
        } else if f > 0.0 {
            "Infinity".to_string()
        } else {
            format!("{}Infinity", info.negative_sign)
        });
    }
    let format = if format.is_empty() { "G" } else { format };
    match parse_standard(format) {
        Some((specifier, precision)) => standard(number, specifier, precision, info).ok_or_else(|| {
            BindingError::Format {
                value: match number {
                    Number::Int(i) => i.to_string(),
                    Number::Float(f) => f.to_string(),
                },
                format: format.to_string(),
            }
        }),
        None => Ok(custom(number, format, info)),
    }
}

fn standard(
    number: Number,
    specifier: char,
    precision: Option<usize>,
    info: &FormatInfo,
) -> Option<String> {
    let upper = specifier.is_ascii_uppercase();
    let formatted = match specifier.to_ascii_uppercase() {
        'C' => {
            let (int, frac) = fixed_digits(number.abs(), precision.unwrap_or(info.currency_decimal_digits));
            let negative = number.is_negative() && has_nonzero(&int, &frac);
            let body = compose(&group(&int, info), &frac, info);
            if negative {
                render_pattern(
                    CURRENCY_NEGATIVE[usize::from(info.currency_negative_pattern) % CURRENCY_NEGATIVE.len()],
                    &body,
                    &info.currency_symbol,
                    &info.negative_sign,
                )
            } else {
                render_pattern(
                    CURRENCY_POSITIVE[usize::from(info.currency_positive_pattern) % CURRENCY_POSITIVE.len()],
                    &body,
                    &info.currency_symbol,
                    &info.negative_sign,
                )
            }
        }
        'D' => {
            let Number::Int(i) = number else {
                return None;
            };
            let digits = format!("{:0>width$}", i.unsigned_abs(), width = precision.unwrap_or(0));
            signed(i < 0, digits, info)
        }
        'E' => exponential(number, precision.unwrap_or(6), upper, 3, info),
        'F' => {
            let (int, frac) = fixed_digits(number.abs(), precision.unwrap_or(info.number_decimal_digits));
            signed(
                number.is_negative() && has_nonzero(&int, &frac),
                compose(&int, &frac, info),
                info,
            )
        }
        'G' => general(number, precision.filter(|p| *p > 0), upper, info),
        'R' => general(number, None, upper, info),
        'N' => {
            let (int, frac) = fixed_digits(number.abs(), precision.unwrap_or(info.number_decimal_digits));
            signed(
                number.is_negative() && has_nonzero(&int, &frac),
                compose(&group(&int, info), &frac, info),
                info,
            )
        }
        'P' => {
            let scaled = number.scale(100);
            let (int, frac) = fixed_digits(scaled.abs(), precision.unwrap_or(info.percent_decimal_digits));
            let negative = scaled.is_negative() && has_nonzero(&int, &frac);
            let body = compose(&group(&int, info), &frac, info);
            if negative {
                render_pattern(
                    PERCENT_NEGATIVE[usize::from(info.percent_negative_pattern) % PERCENT_NEGATIVE.len()],
                    &body,
                    &info.percent_symbol,
                    &info.negative_sign,
                )
            } else {
                render_pattern(
                    PERCENT_POSITIVE[usize::from(info.percent_positive_pattern) % PERCENT_POSITIVE.len()],
                    &body,
                    &info.percent_symbol,
                    &info.negative_sign,
                )
            }
        }
        'X' => {
            let Number::Int(i) = number else {
                return None;
            };
            let width = precision.unwrap_or(0);
            if upper {
                format!("{i:0>width$X}")
            } else {
                format!("{i:0>width$x}")
            }
        }
        _ => return None,
    };
    Some(formatted)
}

// In these templates `$` stands for the symbol, `n` for the number and `-`
// for the negative sign.
const CURRENCY_POSITIVE: [&str; 4] = ["$n", "n$", "$ n", "n $"];
const CURRENCY_NEGATIVE: [&str; 17] = [
    "($n)", "-$n", "$-n", "$n-", "(n$)", "-n$", "n-$", "n$-", "-n $", "-$ n", "n $-", "$ n-",
    "$ -n", "n- $", "($ n)", "(n $)", "$- n",
];
const PERCENT_POSITIVE: [&str; 4] = ["n $", "n$", "$n", "$ n"];
const PERCENT_NEGATIVE: [&str; 12] = [
    "-n $", "-n$", "-$n", "$-n", "$n-", "n-$", "n$-", "-$ n", "n $-", "$ n-", "$ -n", "n- $",
];

fn render_pattern(template: &str, body: &str, symbol: &str, negative_sign: &str) -> String {
    let mut out = String::with_capacity(template.len() + body.len() + symbol.len());
    for c in template.chars() {
        match c {
            'n' => out.push_str(body),
            '$' => out.push_str(symbol),
            '-' => out.push_str(negative_sign),
            other => out.push(other),
        }
    }
    out
}

fn signed(negative: bool, body: String, info: &FormatInfo) -> String {
    if negative {
        format!("{}{body}", info.negative_sign)
    } else {
        body
    }
}

fn has_nonzero(int: &str, frac: &str) -> bool {
    int.bytes().chain(frac.bytes()).any(|b| matches!(b, b'1'..=b'9'))
}

/// Integer and fraction digits of a non-negative number rounded to
/// `precision` fraction digits.
fn fixed_digits(number: Number, precision: usize) -> (String, String) {
    match number {
        Number::Int(i) => (i.unsigned_abs().to_string(), "0".repeat(precision)),
        Number::Float(f) => {
            let text = format!("{:.*}", precision, f.abs());
            match text.split_once('.') {
                Some((int, frac)) => (int.to_string(), frac.to_string()),
                None => (text, String::new()),
            }
        }
    }
}

fn compose(int: &str, frac: &str, info: &FormatInfo) -> String {
    if frac.is_empty() {
        int.to_string()
    } else {
        format!("{int}{}{frac}", info.decimal_separator)
    }
}

fn group(int: &str, info: &FormatInfo) -> String {
    let size = info.group_size;
    if size == 0 || int.len() <= size {
        return int.to_string();
    }
    let mut out = String::with_capacity(int.len() + int.len() / size * info.group_separator.len());
    let lead = int.len() % size;
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (i + size - lead) % size == 0 {
            out.push_str(&info.group_separator);
        }
        out.push(c);
    }
    out
}

/// Mantissa digits (without the point) and decimal exponent of `f` with
/// `digits` significant digits.
fn scientific_parts(f: f64, digits: Option<usize>) -> (String, i32) {
    let text = match digits {
        Some(d) => format!("{:.*e}", d.saturating_sub(1), f.abs()),
        None => format!("{:e}", f.abs()),
    };
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    (mantissa.replace('.', ""), exponent.parse().unwrap_or(0))
}

fn exponent_suffix(exponent: i32, upper: bool, min_digits: usize) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{e}{sign}{:0>min_digits$}", exponent.unsigned_abs())
}

fn exponential(number: Number, precision: usize, upper: bool, min_exp: usize, info: &FormatInfo) -> String {
    let f = number.as_f64();
    let (digits, exponent) = scientific_parts(f, Some(precision + 1));
    let (lead, rest) = digits.split_at(1.min(digits.len()));
    let exponent = if f == 0.0 { 0 } else { exponent };
    let body = format!(
        "{}{}",
        compose(lead, rest, info),
        exponent_suffix(exponent, upper, min_exp)
    );
    signed(number.is_negative() && has_nonzero(lead, rest), body, info)
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

fn general(number: Number, precision: Option<usize>, upper: bool, info: &FormatInfo) -> String {
    if let Number::Int(i) = number
        && precision.is_none_or(|p| i.unsigned_abs().to_string().len() <= p)
    {
        return signed(i < 0, i.unsigned_abs().to_string(), info);
    }
    let f = number.as_f64();
    if f == 0.0 {
        return "0".to_string();
    }
    let (digits, exponent) = scientific_parts(f, precision);
    let limit = precision.map_or(15, |p| i32::try_from(p).unwrap_or(i32::MAX));
    let body = if (-5..limit).contains(&exponent) {
        let fixed = match precision {
            Some(p) => {
                let decimals = usize::try_from(i32::try_from(p).unwrap_or(i32::MAX) - 1 - exponent)
                    .unwrap_or(0);
                format!("{:.*}", decimals, f.abs())
            }
            None => format!("{}", f.abs()),
        };
        trim_fraction(&fixed).replace('.', &info.decimal_separator)
    } else {
        let (lead, rest) = digits.split_at(1.min(digits.len()));
        let rest = rest.trim_end_matches('0');
        format!(
            "{}{}",
            compose(lead, rest, info),
            exponent_suffix(exponent, upper, 2)
        )
    };
    signed(number.is_negative(), body, info)
}

// ---------------------------------------------------------------------------
// Custom patterns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    /// `0` (true) or `#` (false).
    Digit(bool),
    Point,
    Group,
    Percent,
}

/// Split on `;` outside quotes and escapes.
fn split_sections(format: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in format.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, ';') => {
                sections.push(&format[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    sections.push(&format[start..]);
    sections
}

fn tokenize(section: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = section.chars();
    let mut seen_point = false;
    while let Some(c) = chars.next() {
        let token = match c {
            '0' => Token::Digit(true),
            '#' => Token::Digit(false),
            '.' if !seen_point => {
                seen_point = true;
                Token::Point
            }
            '.' => continue,
            ',' => Token::Group,
            '%' => Token::Percent,
            '\\' => Token::Literal(chars.next().map(String::from).unwrap_or_default()),
            '\'' | '"' => {
                let literal: String = chars.by_ref().take_while(|&q| q != c).collect();
                Token::Literal(literal)
            }
            other => Token::Literal(other.to_string()),
        };
        tokens.push(token);
    }
    tokens
}

struct CustomLayout {
    tokens: Vec<Token>,
    min_int: usize,
    min_frac: usize,
    max_frac: usize,
    grouping: bool,
    /// Powers of 1000 to divide by, from commas right before the point.
    scaling: u32,
    percents: u32,
}

impl CustomLayout {
    fn new(section: &str) -> Self {
        let tokens = tokenize(section);
        let point = tokens.iter().position(|t| *t == Token::Point).unwrap_or(tokens.len());
        let (int_part, frac_part) = tokens.split_at(point);

        let int_digits: Vec<bool> = int_part
            .iter()
            .filter_map(|t| match t {
                Token::Digit(zero) => Some(*zero),
                _ => None,
            })
            .collect();
        let min_int = int_digits
            .iter()
            .position(|zero| *zero)
            .map_or(0, |first| int_digits.len() - first);

        let frac_digits: Vec<bool> = frac_part
            .iter()
            .filter_map(|t| match t {
                Token::Digit(zero) => Some(*zero),
                _ => None,
            })
            .collect();
        let max_frac = frac_digits.len();
        let min_frac = frac_digits.iter().rposition(|zero| *zero).map_or(0, |last| last + 1);

        let last_int_digit = int_part.iter().rposition(|t| matches!(t, Token::Digit(_)));
        let first_int_digit = int_part.iter().position(|t| matches!(t, Token::Digit(_)));
        let (grouping, scaling) = match (first_int_digit, last_int_digit) {
            (Some(first), Some(last)) => {
                let grouping = int_part[first..last].iter().any(|t| *t == Token::Group);
                let trailing = int_part[last + 1..]
                    .iter()
                    .take_while(|t| **t == Token::Group)
                    .count();
                (grouping, u32::try_from(trailing).unwrap_or(u32::MAX))
            }
            _ => (false, 0),
        };
        let percents = u32::try_from(tokens.iter().filter(|t| **t == Token::Percent).count())
            .unwrap_or(u32::MAX);

        Self {
            tokens,
            min_int,
            min_frac,
            max_frac,
            grouping,
            scaling,
            percents,
        }
    }

    fn has_digits(&self) -> bool {
        self.tokens.iter().any(|t| matches!(t, Token::Digit(_)))
    }

    fn render(&self, number: Number, with_sign: bool, info: &FormatInfo) -> String {
        let mut value = number;
        for _ in 0..self.percents {
            value = value.scale(100);
        }
        if self.scaling > 0 {
            value = Number::Float(value.as_f64() / 1000f64.powi(i32::try_from(self.scaling).unwrap_or(i32::MAX)));
        }

        let (mut int, mut frac) = fixed_digits(value.abs(), self.max_frac);
        while frac.len() > self.min_frac && frac.ends_with('0') {
            frac.pop();
        }
        let negative = value.is_negative() && has_nonzero(&int, &frac);
        if int == "0" {
            int.clear();
        }
        if int.len() < self.min_int {
            int = format!("{int:0>width$}", width = self.min_int);
        }
        if self.grouping {
            int = group(&int, info);
        }

        let mut out = String::new();
        if negative && with_sign && self.has_digits() {
            out.push_str(&info.negative_sign);
        }
        let mut int_done = false;
        let mut frac_chars = frac.chars();
        let mut after_point = false;
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Percent => out.push_str(&info.percent_symbol),
                Token::Group => {}
                Token::Digit(_) if !after_point => {
                    if !int_done {
                        out.push_str(&int);
                        int_done = true;
                    }
                }
                Token::Digit(_) => {
                    if let Some(d) = frac_chars.next() {
                        out.push(d);
                    }
                }
                Token::Point => {
                    if !int_done {
                        out.push_str(&int);
                        int_done = true;
                    }
                    after_point = true;
                    if !frac.is_empty() {
                        out.push_str(&info.decimal_separator);
                    }
                }
            }
        }
        out
    }
}

fn custom(number: Number, format: &str, info: &FormatInfo) -> String {
    let sections = split_sections(format);
    let pick = |i: usize| sections.get(i).copied().filter(|s| !s.is_empty());
    if number.is_zero()
        && let Some(zero) = pick(2)
    {
        return CustomLayout::new(zero).render(number, false, info);
    }
    if number.is_negative()
        && let Some(negative) = pick(1)
    {
        return CustomLayout::new(negative).render(number.abs(), false, info);
    }
    CustomLayout::new(sections[0]).render(number, true, info)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse display text back into a value of `kind`, reversing grouping,
/// currency and percent decoration.
pub(crate) fn parse_number(
    text: &str,
    kind: ValueKind,
    format: &str,
    info: &FormatInfo,
) -> Result<Value, BindingError> {
    let fail = || BindingError::Parse {
        text: text.to_string(),
        target: kind,
    };
    match kind {
        ValueKind::Text => return Ok(Value::Text(text.to_string())),
        ValueKind::Bool => return parse_bool(text).map(Value::Bool).ok_or_else(fail),
        ValueKind::Object | ValueKind::List => return Err(fail()),
        ValueKind::Any | ValueKind::Int | ValueKind::Float => {}
    }

    if let Some(('x' | 'X', _)) = parse_standard(format) {
        let hex = u64::from_str_radix(text.trim(), 16).map_err(|_| fail())?;
        return Ok(Value::Int(i64::from_ne_bytes(hex.to_ne_bytes())));
    }

    let mut body = text.trim().to_string();
    let mut negative = false;
    if body.starts_with('(') && body.ends_with(')') && body.len() >= 2 {
        negative = true;
        body = body[1..body.len() - 1].to_string();
    }
    let percent = body.contains(info.percent_symbol.as_str());
    for symbol in [info.currency_symbol.as_str(), info.percent_symbol.as_str()] {
        if !symbol.is_empty() {
            body = body.replace(symbol, "");
        }
    }
    if !info.group_separator.is_empty() && info.group_separator != info.decimal_separator {
        body = body.replace(info.group_separator.as_str(), "");
    }
    body.retain(|c| !c.is_whitespace());
    let sign = info.negative_sign.as_str();
    if let Some(rest) = body.strip_prefix(sign) {
        negative = !negative;
        body = rest.to_string();
    } else if let Some(rest) = body.strip_suffix(sign) {
        negative = !negative;
        body = rest.to_string();
    }
    if info.decimal_separator != "." {
        body = body.replace(info.decimal_separator.as_str(), ".");
    }
    if body.is_empty() || body.starts_with(['+', '-']) && negative {
        return Err(fail());
    }

    let as_int = if percent {
        None
    } else {
        body.parse::<i64>().ok()
    };
    let number = match as_int {
        Some(i) => Number::Int(if negative { i.checked_neg().ok_or_else(fail)? } else { i }),
        None => {
            let mut f: f64 = body.parse().map_err(|_| fail())?;
            if percent {
                f /= 100.0;
            }
            Number::Float(if negative { -f } else { f })
        }
    };

    match (kind, number) {
        (ValueKind::Float, n) => Ok(Value::Float(n.as_f64())),
        (_, Number::Int(i)) => Ok(Value::Int(i)),
        (ValueKind::Int, Number::Float(f)) => float_to_int(f).map(Value::Int).ok_or_else(fail),
        (_, Number::Float(f)) => Ok(Value::Float(f)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fmt(value: impl Into<Value>, format: &str, info: &FormatInfo) -> String {
        let number = Number::from_value(&value.into()).unwrap();
        format_number(number, format, info).unwrap()
    }

    #[test]
    fn percent_patterns_follow_culture() {
        let inv = FormatInfo::invariant();
        assert_eq!(fmt(666, "p", &inv), "66,600.00 %");
        assert_eq!(fmt(666, "P0", &inv), "66,600 %");
        assert_eq!(fmt(0.125, "p1", &FormatInfo::for_culture("en-US")), "12.5%");
        assert_eq!(fmt(-0.5, "P", &FormatInfo::for_culture("en-US")), "-50.00%");
        assert_eq!(fmt(0.5, "P0", &FormatInfo::for_culture("de-DE")), "50 %");
    }

    #[test]
    fn currency_patterns_follow_culture() {
        assert_eq!(fmt(1234.5, "C", &FormatInfo::for_culture("en-US")), "$1,234.50");
        assert_eq!(fmt(-1234.5, "C", &FormatInfo::for_culture("en-US")), "-$1,234.50");
        assert_eq!(fmt(1234.5, "C", &FormatInfo::for_culture("de-DE")), "1.234,50 €");
        assert_eq!(fmt(-3, "C", &FormatInfo::invariant()), "(¤3.00)");
        assert_eq!(fmt(1234, "C", &FormatInfo::for_culture("ja-JP")), "￥1,234");
    }

    #[test]
    fn number_fixed_and_decimal() {
        let inv = FormatInfo::invariant();
        assert_eq!(fmt(1_234_567, "N0", &inv), "1,234,567");
        assert_eq!(fmt(-1234.567, "N1", &inv), "-1,234.6");
        assert_eq!(fmt(3.14159, "F3", &inv), "3.142");
        assert_eq!(fmt(42, "D5", &inv), "00042");
        assert_eq!(fmt(-42, "d", &inv), "-42");
        assert_eq!(fmt(-0.001, "F2", &inv), "0.00");
    }

    #[test]
    fn general_and_exponential() {
        let inv = FormatInfo::invariant();
        assert_eq!(fmt(666, "G", &inv), "666");
        assert_eq!(fmt(0.5, "", &inv), "0.5");
        assert_eq!(fmt(1e20, "G", &inv), "1E+20");
        assert_eq!(fmt(123.456, "G4", &inv), "123.5");
        assert_eq!(fmt(1234.5678, "e2", &inv), "1.23e+003");
        assert_eq!(fmt(-1234.5678, "E", &inv), "-1.234568E+003");
        assert_eq!(fmt(2.5, "G", &FormatInfo::for_culture("fr-FR")), "2,5");
    }

    #[test]
    fn hex_requires_integers() {
        let inv = FormatInfo::invariant();
        assert_eq!(fmt(255, "X4", &inv), "00FF");
        assert_eq!(fmt(255, "x", &inv), "ff");
        assert!(format_number(Number::Float(1.5), "X", &inv).is_err());
        assert!(format_number(Number::Float(1.5), "D", &inv).is_err());
        assert!(matches!(
            format_number(Number::Int(1), "Q", &inv),
            Err(BindingError::Format { .. })
        ));
    }

    #[test]
    fn custom_patterns() {
        let inv = FormatInfo::invariant();
        assert_eq!(fmt(1234.5, "#,##0.00", &inv), "1,234.50");
        assert_eq!(fmt(0.5, "#.##", &inv), ".5");
        assert_eq!(fmt(7, "000", &inv), "007");
        assert_eq!(fmt(0.256, "0.0%", &inv), "25.6%");
        assert_eq!(fmt(12, "'Total: '0", &inv), "Total: 12");
        assert_eq!(fmt(-5, "0;(0)", &inv), "(5)");
        assert_eq!(fmt(0, "0;(0);zero", &inv), "zero");
        assert_eq!(fmt(-5, "0", &inv), "-5");
        assert_eq!(fmt(1_500_000, "0,,", &inv), "2");
    }

    #[test]
    fn parse_reverses_decoration() {
        let inv = FormatInfo::invariant();
        let us = FormatInfo::for_culture("en-US");
        let de = FormatInfo::for_culture("de-DE");
        assert_eq!(parse_number("66,600.00 %", ValueKind::Float, "p", &inv), Ok(Value::Float(666.0)));
        assert_eq!(parse_number("$1,234.50", ValueKind::Float, "C", &us), Ok(Value::Float(1234.5)));
        assert_eq!(parse_number("(¤3.00)", ValueKind::Int, "C", &inv), Ok(Value::Int(-3)));
        assert_eq!(parse_number("1.234,5", ValueKind::Float, "", &de), Ok(Value::Float(1234.5)));
        assert_eq!(parse_number(" 42 ", ValueKind::Int, "", &inv), Ok(Value::Int(42)));
        assert_eq!(parse_number("12.00", ValueKind::Int, "F2", &inv), Ok(Value::Int(12)));
        assert_eq!(parse_number("ff", ValueKind::Int, "X", &inv), Ok(Value::Int(255)));
        assert!(parse_number("12.5", ValueKind::Int, "", &inv).is_err());
        assert!(parse_number("abc", ValueKind::Float, "", &inv).is_err());
        assert!(parse_number("", ValueKind::Int, "", &inv).is_err());
    }

    proptest! {
        #[test]
        fn grouped_integers_parse_back(n in -1_000_000_000i64..1_000_000_000) {
            let inv = FormatInfo::invariant();
            let text = fmt(n, "N0", &inv);
            prop_assert_eq!(parse_number(&text, ValueKind::Int, "N0", &inv), Ok(Value::Int(n)));
        }

        #[test]
        fn arbitrary_formats_never_panic(format in ".{0,12}", n in any::<i64>()) {
            let _ = format_number(Number::Int(n), &format, &FormatInfo::invariant());
        }
    }
}
