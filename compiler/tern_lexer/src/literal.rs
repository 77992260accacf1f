//! Literal decoding: numeric literals and string escapes.
//!
//! The scanner only finds token boundaries; turning the raw text into a
//! value happens here so the rules can be tested in isolation.

/// A decoded numeric literal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Number {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

/// Decode a numeric literal.
///
/// Grammar (after an optional leading `-`):
/// - trailing `L` makes a long, trailing `D` a double;
/// - an integer may end in a base suffix: `h`/`x` hex, `b` binary,
///   `o` octal, `d` decimal (`0ffh`, `101b`, `17o`, `99d`);
/// - a `.` or decimal exponent makes a float (`1.5`, `2e10`, `1.5D`).
///
/// Decimal integers that do not fit in 32 bits become longs. Hex, binary
/// and octal integers up to 32 bits wide are reinterpreted as signed, so
/// `0ffffffffh` is `-1`.
///
/// Returns `None` for anything malformed.
pub fn parse_number(text: &str) -> Option<Number> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (body, long) = match body.strip_suffix('L') {
        Some(rest) => (rest, true),
        None => (body, false),
    };
    let (body, double) = match body.strip_suffix('D') {
        Some(rest) if !long => (rest, true),
        _ => (body, false),
    };
    if body.is_empty() || !body.as_bytes()[0].is_ascii_digit() {
        return None;
    }

    if let Some(magnitude) = parse_integer(body) {
        let value = if negative {
            magnitude.checked_neg()?
        } else {
            magnitude
        };
        #[allow(
            clippy::cast_precision_loss,
            reason = "integer literal with a D suffix is a request for a double"
        )]
        let as_double = value as f64;
        return Some(if double {
            Number::Double(as_double)
        } else if long {
            Number::Long(value)
        } else {
            int_or_long(value, body)
        });
    }

    if long || !is_float_text(body) {
        return None;
    }
    let value: f64 = body.parse().ok()?;
    let value = if negative { -value } else { value };
    #[allow(
        clippy::cast_possible_truncation,
        reason = "single-precision literal by definition"
    )]
    let single = value as f32;
    Some(if double {
        Number::Double(value)
    } else {
        Number::Float(single)
    })
}

/// Narrow to `Int` where possible.
fn int_or_long(value: i64, body: &str) -> Number {
    if let Ok(v) = i32::try_from(value) {
        return Number::Int(v);
    }
    let based = matches!(body.as_bytes().last(), Some(b'h' | b'x' | b'b' | b'o'));
    if based {
        if let Ok(bits) = u32::try_from(value) {
            #[allow(
                clippy::cast_possible_wrap,
                reason = "based literals name a bit pattern"
            )]
            let signed = bits as i32;
            return Number::Int(signed);
        }
    }
    Number::Long(value)
}

/// Parse an unsigned integer with an optional base suffix.
fn parse_integer(body: &str) -> Option<i64> {
    if body.bytes().all(|b| b.is_ascii_digit()) {
        return body.parse().ok();
    }
    let (digits, suffix) = body.split_at(body.len() - 1);
    let radix = match suffix {
        "h" | "x" => 16,
        "b" => 2,
        "o" => 8,
        "d" => 10,
        _ => return None,
    };
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, radix)
        .ok()
        .and_then(|v| i64::try_from(v).ok())
}

fn is_float_text(body: &str) -> bool {
    let has_marker = body.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'));
    has_marker
        && body
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
}

/// Decode the escape sequence following a backslash.
///
/// `rest` starts just after the `\`. Returns the decoded character and the
/// number of bytes of `rest` it consumed, or `None` if the escape is
/// malformed. Supported: `\n \t \r \\ \' \"` and three-digit octal `\ddd`.
pub fn decode_escape(rest: &[u8]) -> Option<(char, usize)> {
    let first = *rest.first()?;
    let simple = match first {
        b'n' => Some('\n'),
        b't' => Some('\t'),
        b'r' => Some('\r'),
        b'\\' => Some('\\'),
        b'\'' => Some('\''),
        b'"' => Some('"'),
        _ => None,
    };
    if let Some(ch) = simple {
        return Some((ch, 1));
    }
    let octal = rest.get(..3)?;
    if !octal.iter().all(|b| (b'0'..=b'7').contains(b)) {
        return None;
    }
    let value = octal
        .iter()
        .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
    let byte = u8::try_from(value).ok()?;
    Some((char::from(byte), 3))
}

#[cfg(test)]
mod tests;
