// Number coercion engine: float <-> integer conversion, string parsing
// and canonical number formatting.
//
// Every conversion is total and reports failure through `Option`;
// callers turn a `None` into the appropriate type error.

use super::{LuaString, LuaValue};

/// Rounding used when a float has to become an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum F2IMode {
    /// Only integral values convert
    Exact,
    Floor,
    Ceil,
}

// 2^63 as a float; every float in [-2^63, 2^63) with no fraction fits an i64
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Float to integer, accepting only floats with an exact integer value in range
#[inline]
pub fn float_to_integer(f: f64) -> Option<i64> {
    float_to_integer_mode(f, F2IMode::Exact)
}

pub fn float_to_integer_mode(f: f64, mode: F2IMode) -> Option<i64> {
    let f = match mode {
        F2IMode::Exact if f.fract() != 0.0 => return None,
        F2IMode::Exact => f,
        F2IMode::Floor => f.floor(),
        F2IMode::Ceil => f.ceil(),
    };
    // NaN and infinities fail both comparisons
    if (-TWO_POW_63..TWO_POW_63).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

#[inline]
fn is_lua_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

fn trim(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&c| !is_lua_space(c)).unwrap_or(s.len());
    let end = s.iter().rposition(|&c| !is_lua_space(c)).map_or(start, |p| p + 1);
    &s[start..end]
}

fn split_sign(s: &[u8]) -> (bool, &[u8]) {
    match s.first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    }
}

fn strip_hex_prefix(s: &[u8]) -> Option<&[u8]> {
    match s {
        [b'0', b'x' | b'X', rest @ ..] => Some(rest),
        _ => None,
    }
}

/// Parse an integer numeral: decimal, or hexadecimal with wraparound.
/// A decimal numeral that does not fit returns `None` so the caller can
/// fall back to a float.
pub fn parse_integer(s: &[u8]) -> Option<i64> {
    let (neg, body) = split_sign(trim(s));
    let mut acc: u64 = 0;
    if let Some(hex) = strip_hex_prefix(body) {
        if hex.is_empty() {
            return None;
        }
        for &c in hex {
            let d = (c as char).to_digit(16)?;
            acc = acc.wrapping_mul(16).wrapping_add(d as u64);
        }
    } else {
        if body.is_empty() {
            return None;
        }
        let limit = i64::MAX as u64 + neg as u64;
        for &c in body {
            if !c.is_ascii_digit() {
                return None;
            }
            acc = acc.checked_mul(10)?.checked_add((c - b'0') as u64)?;
            if acc > limit {
                return None;
            }
        }
    }
    let value = acc as i64;
    Some(if neg { value.wrapping_neg() } else { value })
}

/// Parse a float numeral: decimal with optional exponent, or hexadecimal
/// with optional binary exponent. `inf`/`nan` spellings are rejected.
pub fn parse_float(s: &[u8]) -> Option<f64> {
    let (neg, body) = split_sign(trim(s));
    let value = match strip_hex_prefix(body) {
        Some(hex) => parse_hex_float(hex)?,
        None => parse_decimal_float(body)?,
    };
    Some(if neg { -value } else { value })
}

fn parse_decimal_float(s: &[u8]) -> Option<f64> {
    let mut i = 0;
    let mut digits = 0;
    while i < s.len() && s[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < s.len() && s[i] == b'.' {
        i += 1;
        while i < s.len() && s[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    if i < s.len() && (s[i] == b'e' || s[i] == b'E') {
        i += 1;
        if i < s.len() && (s[i] == b'+' || s[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < s.len() && s[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return None;
        }
    }
    if i != s.len() {
        return None;
    }
    std::str::from_utf8(s).ok()?.parse::<f64>().ok()
}

fn parse_hex_float(s: &[u8]) -> Option<f64> {
    let mut mantissa = 0.0f64;
    let mut exponent: i64 = 0;
    let mut digits = 0;
    let mut seen_dot = false;
    let mut i = 0;
    while i < s.len() {
        let c = s[i];
        if c == b'.' && !seen_dot {
            seen_dot = true;
        } else if let Some(d) = (c as char).to_digit(16) {
            mantissa = mantissa * 16.0 + d as f64;
            if seen_dot {
                exponent -= 4;
            }
            digits += 1;
        } else {
            break;
        }
        i += 1;
    }
    if digits == 0 {
        return None;
    }
    if i < s.len() && (s[i] == b'p' || s[i] == b'P') {
        let (neg, rest) = split_sign(&s[i + 1..]);
        if rest.is_empty() || !rest.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let e = rest
            .iter()
            .fold(0i64, |acc, &c| acc.saturating_mul(10).saturating_add((c - b'0') as i64));
        exponent = exponent.saturating_add(if neg { -e } else { e });
    } else if i != s.len() {
        return None;
    }
    let exponent = exponent.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    Some(mantissa * 2f64.powi(exponent))
}

/// Convert a numeral to a number value, preferring an integer
pub fn str_to_number(s: &[u8]) -> Option<LuaValue> {
    if let Some(i) = parse_integer(s) {
        return Some(LuaValue::Integer(i));
    }
    parse_float(s).map(LuaValue::Float)
}

pub fn format_integer(i: i64) -> String {
    let mut buffer = itoa::Buffer::new();
    buffer.format(i).to_owned()
}

/// Format a float the way `%.14g` does, then append `.0` when the
/// result would read back as an integer
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return if f.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let mut s = format_g(f, 14);
    if s.bytes().all(|c| c == b'-' || c.is_ascii_digit()) {
        s.push_str(".0");
    }
    s
}

fn trim_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn format_g(f: f64, precision: i32) -> String {
    if f == 0.0 {
        return if f.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let sci = format!("{:.*e}", (precision - 1) as usize, f);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= precision {
        format!(
            "{}e{}{:02}",
            trim_fraction_zeros(mantissa),
            if exp < 0 { '-' } else { '+' },
            exp.abs()
        )
    } else {
        let decimals = (precision - 1 - exp) as usize;
        trim_fraction_zeros(&format!("{:.*}", decimals, f)).to_string()
    }
}

impl LuaValue {
    /// Numeric value as a float; strings are parsed
    pub fn to_float(&self) -> Option<f64> {
        match self {
            LuaValue::Float(f) => Some(*f),
            LuaValue::Integer(i) => Some(*i as f64),
            LuaValue::String(s) => match str_to_number(s.as_bytes())? {
                LuaValue::Integer(i) => Some(i as f64),
                LuaValue::Float(f) => Some(f),
                _ => None,
            },
            _ => None,
        }
    }

    /// Numeric value as an integer; floats must be integral, strings are parsed
    pub fn to_integer(&self) -> Option<i64> {
        self.to_integer_mode(F2IMode::Exact)
    }

    pub fn to_integer_mode(&self, mode: F2IMode) -> Option<i64> {
        match self {
            LuaValue::Integer(i) => Some(*i),
            LuaValue::Float(f) => float_to_integer_mode(*f, mode),
            LuaValue::String(s) => match str_to_number(s.as_bytes())? {
                LuaValue::Integer(i) => Some(i),
                LuaValue::Float(f) => float_to_integer_mode(f, mode),
                _ => None,
            },
            _ => None,
        }
    }

    /// Integer or float value, parsing strings
    pub fn to_number(&self) -> Option<LuaValue> {
        match self {
            LuaValue::Integer(_) | LuaValue::Float(_) => Some(self.clone()),
            LuaValue::String(s) => str_to_number(s.as_bytes()),
            _ => None,
        }
    }

    /// String form of strings and numbers, used by concatenation
    pub fn to_lua_string(&self) -> Option<LuaString> {
        match self {
            LuaValue::String(s) => Some(s.clone()),
            LuaValue::Integer(i) => Some(LuaString::from(format_integer(*i))),
            LuaValue::Float(f) => Some(LuaString::from(format_float(*f))),
            _ => None,
        }
    }
}
