//! Literal readers.
//!
//! Every reader takes the whole input and a byte position and returns the
//! position just past what it consumed together with the value. Readers
//! never touch shared state; a failed read leaves the caller free to try a
//! different reader at the same position.
//!
//! Reading past the end of the buffer sees a NUL byte, which no literal
//! accepts.

use half::f16;

use crate::data::{DataType, StructureRef, Value};
use crate::error::{DataError, DataResult};
use crate::pow10::{MAX_EXPONENT, MINUS_POWER_10, PLUS_POWER_10};

/// Largest exponent magnitude accumulated before table lookup.
const EXPONENT_CLAMP: u32 = 65535;

/// Identifier byte classes: 0 ends an identifier, 1 continues it,
/// 2 is never legal inside one.
const IDENTIFIER_CLASS: [u8; 256] = build_identifier_class();

const fn build_identifier_class() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let c = i as u8;
        table[i] = if c.is_ascii_alphanumeric() || c == b'_' {
            1
        } else if c >= 0x80 {
            2
        } else {
            0
        };
        i += 1;
    }
    table
}

#[inline]
fn at(text: &[u8], pos: usize) -> u8 {
    text.get(pos).copied().unwrap_or(0)
}

#[inline]
fn is_identifier_char(c: u8) -> bool {
    IDENTIFIER_CLASS[c as usize] == 1
}

fn hex_digit(c: u8) -> Option<u32> {
    (c as char).to_digit(16)
}

/// Skip whitespace, `//` line comments and `/* */` block comments.
///
/// An unterminated block comment runs to the end of the buffer.
pub fn skip_whitespace(text: &[u8], mut pos: usize) -> usize {
    loop {
        let c = at(text, pos);
        if c == 0 {
            return pos;
        }

        if c <= 32 {
            pos += 1;
            continue;
        }

        if c == b'/' {
            match at(text, pos + 1) {
                b'/' => {
                    pos += 2;
                    while pos < text.len() && text[pos] != b'\n' {
                        pos += 1;
                    }
                    continue;
                }
                b'*' => {
                    pos += 2;
                    loop {
                        if pos >= text.len() {
                            return pos;
                        }
                        if text[pos] == b'*' && at(text, pos + 1) == b'/' {
                            pos += 2;
                            break;
                        }
                        pos += 1;
                    }
                    continue;
                }
                _ => {}
            }
        }

        return pos;
    }
}

/// Read an identifier. The first byte may not be a digit.
pub fn read_identifier(text: &[u8], pos: usize) -> DataResult<(usize, &str)> {
    let first = at(text, pos);
    match IDENTIFIER_CLASS[first as usize] {
        0 => return Err(DataError::IdentifierEmpty),
        2 => return Err(DataError::IdentifierIllegalChar),
        _ if first.is_ascii_digit() => return Err(DataError::IdentifierIllegalChar),
        _ => {}
    }

    let mut end = pos + 1;
    loop {
        match IDENTIFIER_CLASS[at(text, end) as usize] {
            1 => end += 1,
            2 => return Err(DataError::IdentifierIllegalChar),
            _ => break,
        }
    }

    let identifier =
        std::str::from_utf8(&text[pos..end]).map_err(|_| DataError::IdentifierIllegalChar)?;
    Ok((end, identifier))
}

/// Read a primitive type name.
pub fn read_data_type(text: &[u8], pos: usize) -> DataResult<(usize, DataType)> {
    let (end, identifier) = read_identifier(text, pos).map_err(|_| DataError::TypeInvalid)?;
    let ty = DataType::from_identifier(identifier).ok_or(DataError::TypeInvalid)?;
    Ok((end, ty))
}

/// Read `true`, `false`, `1` or `0`.
pub fn read_bool(text: &[u8], pos: usize) -> DataResult<(usize, bool)> {
    let rest = text.get(pos..).unwrap_or(&[]);
    let (len, value) = if rest.starts_with(b"true") {
        (4, true)
    } else if rest.starts_with(b"false") {
        (5, false)
    } else if rest.starts_with(b"1") {
        (1, true)
    } else if rest.starts_with(b"0") {
        (1, false)
    } else {
        return Err(DataError::BoolInvalid);
    };

    if is_identifier_char(at(text, pos + len)) {
        return Err(DataError::BoolInvalid);
    }
    Ok((pos + len, value))
}

fn read_decimal_digits(text: &[u8], pos: usize) -> DataResult<(usize, u64)> {
    let mut value: u64 = 0;
    let mut end = pos;
    let mut after_digit = false;

    loop {
        let c = at(text, end);
        if c.is_ascii_digit() {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add((c - b'0') as u64))
                .ok_or(DataError::IntegerOverflow)?;
            after_digit = true;
        } else if c == b'_' {
            if !after_digit {
                return Err(DataError::SyntaxError);
            }
            after_digit = false;
        } else {
            break;
        }
        end += 1;
    }

    if end == pos || !after_digit {
        return Err(DataError::SyntaxError);
    }
    Ok((end, value))
}

fn read_hex_digits(text: &[u8], pos: usize) -> DataResult<(usize, u64)> {
    let mut value: u64 = 0;
    let mut end = pos;
    let mut after_digit = false;

    loop {
        let c = at(text, end);
        if let Some(digit) = hex_digit(c) {
            if value >> 60 != 0 {
                return Err(DataError::IntegerOverflow);
            }
            value = (value << 4) | digit as u64;
            after_digit = true;
        } else if c == b'_' {
            if !after_digit {
                return Err(DataError::SyntaxError);
            }
            after_digit = false;
        } else {
            break;
        }
        end += 1;
    }

    if end == pos || !after_digit {
        return Err(DataError::SyntaxError);
    }
    Ok((end, value))
}

fn simple_escape(c: u8) -> Option<u8> {
    let byte = match c {
        b'"' => b'"',
        b'\'' => b'\'',
        b'?' => b'?',
        b'\\' => b'\\',
        b'a' => 0x07,
        b'b' => 0x08,
        b'f' => 0x0C,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'v' => 0x0B,
        _ => return None,
    };
    Some(byte)
}

fn read_char_literal(text: &[u8], pos: usize) -> DataResult<(usize, u64)> {
    let mut value: u64 = 0;
    let mut count = 0;
    let mut end = pos + 1;

    loop {
        if end >= text.len() {
            return Err(DataError::CharEndOfFile);
        }

        let c = text[end];
        let byte = match c {
            b'\'' => break,
            b'\\' => {
                let escaped = at(text, end + 1);
                if escaped == b'x' {
                    let hi = hex_digit(at(text, end + 2)).ok_or(DataError::CharIllegalEscape)?;
                    let lo = hex_digit(at(text, end + 3)).ok_or(DataError::CharIllegalEscape)?;
                    end += 4;
                    ((hi << 4) | lo) as u8
                } else {
                    let byte = simple_escape(escaped).ok_or(DataError::CharIllegalEscape)?;
                    end += 2;
                    byte
                }
            }
            0x20..=0x7E => {
                end += 1;
                c
            }
            _ => return Err(DataError::CharIllegalChar),
        };

        count += 1;
        if count > 8 {
            return Err(DataError::IntegerOverflow);
        }
        value = (value << 8) | byte as u64;
    }

    Ok((end + 1, value))
}

/// Read an unsigned integer magnitude: decimal, `0x` hex, or a character
/// literal. Octal and binary prefixes are rejected as unsupported.
pub fn read_unsigned_literal(text: &[u8], pos: usize) -> DataResult<(usize, u64)> {
    let c = at(text, pos);
    if c == b'\'' {
        return read_char_literal(text, pos);
    }

    if c == b'0' {
        match at(text, pos + 1) {
            b'x' | b'X' => return read_hex_digits(text, pos + 2),
            b'o' | b'O' | b'b' | b'B' => return Err(DataError::LiteralUnsupported),
            _ => {}
        }
    }

    if !c.is_ascii_digit() {
        return Err(DataError::SyntaxError);
    }
    read_decimal_digits(text, pos)
}

/// Consume an optional sign and the whitespace after it.
fn read_sign(text: &[u8], pos: usize) -> (usize, bool) {
    match at(text, pos) {
        b'-' => (skip_whitespace(text, pos + 1), true),
        b'+' => (skip_whitespace(text, pos + 1), false),
        _ => (pos, false),
    }
}

fn signed_value(magnitude: u64, negative: bool, bits: u32) -> DataResult<i64> {
    let limit = 1u64 << (bits - 1);
    if negative {
        if magnitude > limit {
            return Err(DataError::IntegerOverflow);
        }
        Ok((magnitude as i64).wrapping_neg())
    } else {
        if magnitude >= limit {
            return Err(DataError::IntegerOverflow);
        }
        Ok(magnitude as i64)
    }
}

fn unsigned_value(magnitude: u64, negative: bool, bits: u32) -> DataResult<u64> {
    let max = u64::MAX >> (64 - bits);
    if magnitude > max {
        return Err(DataError::IntegerOverflow);
    }
    if negative {
        Ok(magnitude.wrapping_neg() & max)
    } else {
        Ok(magnitude)
    }
}

/// Read a signed or unsigned integer of the given type.
pub fn read_integer(text: &[u8], pos: usize, ty: DataType) -> DataResult<(usize, Value)> {
    let (start, negative) = read_sign(text, pos);
    let (end, magnitude) = read_unsigned_literal(text, start)?;

    let value = match ty {
        DataType::Int8 => Value::Int8(signed_value(magnitude, negative, 8)? as i8),
        DataType::Int16 => Value::Int16(signed_value(magnitude, negative, 16)? as i16),
        DataType::Int32 => Value::Int32(signed_value(magnitude, negative, 32)? as i32),
        DataType::Int64 => Value::Int64(signed_value(magnitude, negative, 64)?),
        DataType::UInt8 => Value::UInt8(unsigned_value(magnitude, negative, 8)? as u8),
        DataType::UInt16 => Value::UInt16(unsigned_value(magnitude, negative, 16)? as u16),
        DataType::UInt32 => Value::UInt32(unsigned_value(magnitude, negative, 32)? as u32),
        DataType::UInt64 => Value::UInt64(unsigned_value(magnitude, negative, 64)?),
        _ => return Err(DataError::PropertyInvalidType),
    };
    Ok((end, value))
}

/// Read an unsigned decimal float: digits with `_` separators, an optional
/// fraction and an optional exponent.
pub fn read_decimal_float(text: &[u8], pos: usize) -> DataResult<(usize, f64)> {
    let mut value = 0.0f64;
    let mut end = pos;
    let mut digits = false;
    let mut after_digit = false;

    loop {
        let c = at(text, end);
        if c.is_ascii_digit() {
            value = value * 10.0 + (c - b'0') as f64;
            digits = true;
            after_digit = true;
        } else if c == b'_' {
            if !after_digit {
                return Err(DataError::FloatInvalid);
            }
            after_digit = false;
        } else {
            break;
        }
        end += 1;
    }
    if digits && !after_digit {
        return Err(DataError::FloatInvalid);
    }

    if at(text, end) == b'.' {
        end += 1;
        let mut decimal = 10.0f64;
        after_digit = false;
        let mut fraction_separator = false;

        loop {
            let c = at(text, end);
            if c.is_ascii_digit() {
                value += (c - b'0') as f64 / decimal;
                decimal *= 10.0;
                digits = true;
                after_digit = true;
            } else if c == b'_' {
                if !after_digit {
                    return Err(DataError::FloatInvalid);
                }
                after_digit = false;
                fraction_separator = true;
            } else {
                break;
            }
            end += 1;
        }
        if fraction_separator && !after_digit {
            return Err(DataError::FloatInvalid);
        }
    }

    if !digits {
        return Err(DataError::FloatInvalid);
    }

    if matches!(at(text, end), b'e' | b'E') {
        end += 1;
        let negative = match at(text, end) {
            b'-' => {
                end += 1;
                true
            }
            b'+' => {
                end += 1;
                false
            }
            _ => false,
        };

        let mut exponent: u32 = 0;
        let mut exponent_digits = false;
        after_digit = false;
        loop {
            let c = at(text, end);
            if c.is_ascii_digit() {
                exponent = (exponent * 10 + (c - b'0') as u32).min(EXPONENT_CLAMP);
                exponent_digits = true;
                after_digit = true;
            } else if c == b'_' {
                if !after_digit {
                    return Err(DataError::FloatInvalid);
                }
                after_digit = false;
            } else {
                break;
            }
            end += 1;
        }
        if !exponent_digits || !after_digit {
            return Err(DataError::FloatInvalid);
        }

        let exponent = (exponent as usize).min(MAX_EXPONENT);
        if negative {
            value *= MINUS_POWER_10[MAX_EXPONENT - exponent];
        } else {
            value *= PLUS_POWER_10[exponent];
        }
    }

    Ok((end, value))
}

/// Read a half, float or double. A `0x` literal is taken as the raw bit
/// pattern of the target width.
pub fn read_float(text: &[u8], pos: usize, ty: DataType) -> DataResult<(usize, Value)> {
    let (start, negative) = read_sign(text, pos);

    if at(text, start) == b'0' {
        match at(text, start + 1) {
            b'x' | b'X' => {
                let (end, bits) = read_hex_digits(text, start + 2).map_err(|e| match e {
                    DataError::IntegerOverflow => DataError::FloatOverflow,
                    _ => DataError::FloatInvalid,
                })?;
                let value = match ty {
                    DataType::Half => {
                        let bits = u16::try_from(bits).map_err(|_| DataError::FloatOverflow)?;
                        let h = f16::from_bits(bits);
                        Value::Half(if negative { -h } else { h })
                    }
                    DataType::Float => {
                        let bits = u32::try_from(bits).map_err(|_| DataError::FloatOverflow)?;
                        let f = f32::from_bits(bits);
                        Value::Float(if negative { -f } else { f })
                    }
                    DataType::Double => {
                        let d = f64::from_bits(bits);
                        Value::Double(if negative { -d } else { d })
                    }
                    _ => return Err(DataError::PropertyInvalidType),
                };
                return Ok((end, value));
            }
            b'o' | b'O' | b'b' | b'B' => return Err(DataError::LiteralUnsupported),
            _ => {}
        }
    }

    let (end, magnitude) = read_decimal_float(text, start)?;
    let v = if negative { -magnitude } else { magnitude };
    let value = match ty {
        DataType::Half => Value::Half(f16::from_f64(v)),
        DataType::Float => Value::Float(v as f32),
        DataType::Double => Value::Double(v),
        _ => return Err(DataError::PropertyInvalidType),
    };
    Ok((end, value))
}

fn read_hex_code(text: &[u8], pos: usize, count: usize) -> Option<u32> {
    let mut code = 0u32;
    for i in 0..count {
        code = (code << 4) | hex_digit(at(text, pos + i))?;
    }
    Some(code)
}

fn push_char(bytes: &mut Vec<u8>, c: char) {
    let mut buffer = [0u8; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buffer).as_bytes());
}

/// Length of a valid UTF-8 sequence starting at `pos`, or the error for
/// a malformed one.
fn utf8_sequence_len(text: &[u8], pos: usize) -> DataResult<usize> {
    let lead = text[pos];
    let (len, min, max) = match lead {
        0xC2..=0xDF => (2, 0x80, 0x7FF),
        0xE0..=0xEF => (3, 0x800, 0xFFFF),
        0xF0..=0xF4 => (4, 0x10000, 0x10FFFF),
        _ => return Err(DataError::StringIllegalChar),
    };

    let mut code = (lead as u32) & (0x7F >> len);
    for i in 1..len {
        if pos + i >= text.len() {
            return Err(DataError::StringEndOfFile);
        }
        let c = text[pos + i];
        if c & 0xC0 != 0x80 {
            return Err(DataError::StringIllegalChar);
        }
        code = (code << 6) | (c & 0x3F) as u32;
    }

    if code < min || code > max || (0xD800..=0xDFFF).contains(&code) {
        return Err(DataError::StringIllegalChar);
    }
    Ok(len)
}

fn read_string_literal(text: &[u8], pos: usize, bytes: &mut Vec<u8>) -> DataResult<usize> {
    if at(text, pos) != b'"' {
        return Err(DataError::StringInvalid);
    }

    let mut end = pos + 1;
    loop {
        if end >= text.len() {
            return Err(DataError::StringEndOfFile);
        }

        let c = text[end];
        match c {
            b'"' => return Ok(end + 1),
            b'\\' => {
                if end + 1 >= text.len() {
                    return Err(DataError::StringEndOfFile);
                }
                let escaped = text[end + 1];
                match escaped {
                    b'x' => {
                        let code =
                            read_hex_code(text, end + 2, 2).ok_or(DataError::StringIllegalEscape)?;
                        let ch = char::from_u32(code).ok_or(DataError::StringIllegalEscape)?;
                        push_char(bytes, ch);
                        end += 4;
                    }
                    b'u' | b'U' => {
                        let count = if escaped == b'u' { 4 } else { 6 };
                        let code = read_hex_code(text, end + 2, count)
                            .ok_or(DataError::StringIllegalEscape)?;
                        if code == 0 {
                            return Err(DataError::StringIllegalEscape);
                        }
                        let ch = char::from_u32(code).ok_or(DataError::StringIllegalEscape)?;
                        push_char(bytes, ch);
                        end += 2 + count;
                    }
                    _ => {
                        let byte = simple_escape(escaped).ok_or(DataError::StringIllegalEscape)?;
                        bytes.push(byte);
                        end += 2;
                    }
                }
            }
            0x00..=0x1F | 0x7F => return Err(DataError::StringIllegalChar),
            0x20..=0x7E => {
                bytes.push(c);
                end += 1;
            }
            _ => {
                let len = utf8_sequence_len(text, end)?;
                bytes.extend_from_slice(&text[end..end + len]);
                end += len;
            }
        }
    }
}

/// Read a string. Adjacent literals separated only by whitespace are
/// joined into one value.
pub fn read_string(text: &[u8], pos: usize) -> DataResult<(usize, String)> {
    let mut bytes = Vec::new();
    let mut end = read_string_literal(text, pos, &mut bytes)?;

    loop {
        let next = skip_whitespace(text, end);
        if at(text, next) != b'"' {
            break;
        }
        end = read_string_literal(text, next, &mut bytes)?;
    }

    let s = String::from_utf8(bytes).map_err(|_| DataError::StringInvalid)?;
    Ok((end, s))
}

/// Read `null`, or `$name` / `%name` followed by `%name` links.
pub fn read_reference(text: &[u8], pos: usize) -> DataResult<(usize, StructureRef)> {
    let c = at(text, pos);
    if c != b'$' && c != b'%' {
        let (end, identifier) =
            read_identifier(text, pos).map_err(|_| DataError::ReferenceInvalid)?;
        if identifier == "null" {
            return Ok((end, StructureRef::null()));
        }
        return Err(DataError::ReferenceInvalid);
    }

    let mut reference = StructureRef {
        names: Vec::new(),
        global: c == b'$',
    };
    let (mut end, first) =
        read_identifier(text, pos + 1).map_err(|_| DataError::ReferenceInvalid)?;
    reference.names.push(first.to_string());

    loop {
        let next = skip_whitespace(text, end);
        if at(text, next) != b'%' {
            break;
        }
        let start = skip_whitespace(text, next + 1);
        let (after, name) =
            read_identifier(text, start).map_err(|_| DataError::ReferenceInvalid)?;
        reference.names.push(name.to_string());
        end = after;
    }

    Ok((end, reference))
}

/// Value of a base64 character: 0..=63, -2 for skippable whitespace,
/// -1 for anything that ends the data.
fn base64_value(c: u8) -> i8 {
    match c {
        b'A'..=b'Z' => (c - b'A') as i8,
        b'a'..=b'z' => (c - b'a') as i8 + 26,
        b'0'..=b'9' => (c - b'0') as i8 + 52,
        b'+' => 62,
        b'/' => 63,
        1..=32 => -2,
        _ => -1,
    }
}

/// Read base64 data, validating `=` padding against the group remainder.
pub fn read_base64(text: &[u8], pos: usize) -> DataResult<(usize, Vec<u8>)> {
    let mut codes = Vec::new();
    let mut end = pos;

    loop {
        let v = base64_value(at(text, end));
        if v >= 0 {
            codes.push(v as u32);
        } else if v == -1 {
            break;
        }
        end += 1;
    }

    let remainder = codes.len() & 3;
    if remainder == 1 {
        return Err(DataError::Base64Invalid);
    }

    if at(text, end) == b'=' {
        if remainder == 0 {
            return Err(DataError::Base64Invalid);
        }
        end += 1;
        if at(text, end) == b'=' {
            if remainder == 3 {
                return Err(DataError::Base64Invalid);
            }
            end += 1;
        } else if remainder == 2 {
            return Err(DataError::Base64Invalid);
        }
    }

    let mut bytes = Vec::with_capacity(codes.len() / 4 * 3 + 2);
    let mut groups = codes.chunks_exact(4);
    for group in &mut groups {
        let bits = (group[0] << 18) | (group[1] << 12) | (group[2] << 6) | group[3];
        bytes.extend_from_slice(&[(bits >> 16) as u8, (bits >> 8) as u8, bits as u8]);
    }

    match *groups.remainder() {
        [a, b, c] => {
            let bits = (a << 12) | (b << 6) | c;
            bytes.extend_from_slice(&[(bits >> 10) as u8, (bits >> 2) as u8]);
        }
        [a, b] => {
            let bits = (a << 6) | b;
            bytes.push((bits >> 4) as u8);
        }
        _ => {}
    }

    Ok((end, bytes))
}

/// Read one literal of the given type.
pub fn read_value(text: &[u8], pos: usize, ty: DataType) -> DataResult<(usize, Value)> {
    match ty {
        DataType::Bool => read_bool(text, pos).map(|(end, v)| (end, Value::Bool(v))),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => read_integer(text, pos, ty),
        DataType::Half | DataType::Float | DataType::Double => read_float(text, pos, ty),
        DataType::String => read_string(text, pos).map(|(end, v)| (end, Value::String(v))),
        DataType::Ref => read_reference(text, pos).map(|(end, v)| (end, Value::Ref(v))),
        DataType::Type => read_data_type(text, pos).map(|(end, v)| (end, Value::Type(v))),
        DataType::Base64 => read_base64(text, pos).map(|(end, v)| (end, Value::Base64(v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(text: &str, ty: DataType) -> DataResult<Value> {
        read_integer(text.as_bytes(), 0, ty).map(|(_, v)| v)
    }

    fn float(text: &str) -> DataResult<f32> {
        match read_float(text.as_bytes(), 0, DataType::Float)? {
            (_, Value::Float(f)) => Ok(f),
            _ => unreachable!(),
        }
    }

    fn base64(text: &str) -> DataResult<Vec<u8>> {
        read_base64(text.as_bytes(), 0).map(|(_, v)| v)
    }

    fn string(text: &str) -> DataResult<String> {
        read_string(text.as_bytes(), 0).map(|(_, v)| v)
    }

    #[test]
    fn test_skip_comments() {
        let text = b"  // line\n /* block */ x";
        assert_eq!(skip_whitespace(text, 0), text.len() - 1);
    }

    #[test]
    fn test_skip_unterminated_block_comment() {
        let text = b"/* never closed";
        assert_eq!(skip_whitespace(text, 0), text.len());
    }

    #[test]
    fn test_identifier() {
        let (end, id) = read_identifier(b"Metric (key", 0).unwrap();
        assert_eq!(id, "Metric");
        assert_eq!(end, 6);

        assert_eq!(read_identifier(b"_a1", 0).unwrap().1, "_a1");
        assert_eq!(read_identifier(b"", 0), Err(DataError::IdentifierEmpty));
        assert_eq!(read_identifier(b"{", 0), Err(DataError::IdentifierEmpty));
        assert_eq!(read_identifier(b"9abc", 0), Err(DataError::IdentifierIllegalChar));
        assert_eq!(
            read_identifier("ab\u{e9}".as_bytes(), 0),
            Err(DataError::IdentifierIllegalChar)
        );
    }

    #[test]
    fn test_data_type() {
        assert_eq!(read_data_type(b"float[3]", 0).unwrap(), (5, DataType::Float));
        assert_eq!(read_data_type(b"floaty", 0), Err(DataError::TypeInvalid));
    }

    #[test]
    fn test_bool() {
        assert_eq!(read_bool(b"true)", 0).unwrap(), (4, true));
        assert_eq!(read_bool(b"false", 0).unwrap(), (5, false));
        assert_eq!(read_bool(b"1,", 0).unwrap(), (1, true));
        assert_eq!(read_bool(b"trueish", 0), Err(DataError::BoolInvalid));
        assert_eq!(read_bool(b"10", 0), Err(DataError::BoolInvalid));
    }

    #[test]
    fn test_signed_boundaries() {
        assert_eq!(int("127", DataType::Int8), Ok(Value::Int8(127)));
        assert_eq!(int("128", DataType::Int8), Err(DataError::IntegerOverflow));
        assert_eq!(int("-128", DataType::Int8), Ok(Value::Int8(-128)));
        assert_eq!(int("-129", DataType::Int8), Err(DataError::IntegerOverflow));

        assert_eq!(int("32767", DataType::Int16), Ok(Value::Int16(32767)));
        assert_eq!(int("32768", DataType::Int16), Err(DataError::IntegerOverflow));
        assert_eq!(int("-2147483648", DataType::Int32), Ok(Value::Int32(i32::MIN)));
        assert_eq!(int("2147483648", DataType::Int32), Err(DataError::IntegerOverflow));
        assert_eq!(
            int("-9223372036854775808", DataType::Int64),
            Ok(Value::Int64(i64::MIN))
        );
        assert_eq!(
            int("9223372036854775808", DataType::Int64),
            Err(DataError::IntegerOverflow)
        );
    }

    #[test]
    fn test_unsigned_boundaries() {
        assert_eq!(int("255", DataType::UInt8), Ok(Value::UInt8(255)));
        assert_eq!(int("256", DataType::UInt8), Err(DataError::IntegerOverflow));
        assert_eq!(int("65535", DataType::UInt16), Ok(Value::UInt16(65535)));
        assert_eq!(int("4294967296", DataType::UInt32), Err(DataError::IntegerOverflow));
        assert_eq!(
            int("18446744073709551615", DataType::UInt64),
            Ok(Value::UInt64(u64::MAX))
        );
        assert_eq!(
            int("18446744073709551616", DataType::UInt64),
            Err(DataError::IntegerOverflow)
        );
    }

    #[test]
    fn test_negative_unsigned_wraps() {
        assert_eq!(int("-1", DataType::UInt8), Ok(Value::UInt8(255)));
        assert_eq!(int("- 2", DataType::UInt16), Ok(Value::UInt16(65534)));
    }

    #[test]
    fn test_digit_separators() {
        assert_eq!(int("1_000_000", DataType::Int32), Ok(Value::Int32(1_000_000)));
        assert_eq!(int("1__0", DataType::Int32), Err(DataError::SyntaxError));
        assert_eq!(int("10_", DataType::Int32), Err(DataError::SyntaxError));
    }

    #[test]
    fn test_hex_literals() {
        assert_eq!(int("0xFF", DataType::UInt8), Ok(Value::UInt8(255)));
        assert_eq!(int("0x1_00", DataType::UInt16), Ok(Value::UInt16(256)));
        assert_eq!(
            int("0xFFFFFFFFFFFFFFFF", DataType::UInt64),
            Ok(Value::UInt64(u64::MAX))
        );
        assert_eq!(
            int("0x10000000000000000", DataType::UInt64),
            Err(DataError::IntegerOverflow)
        );
        assert_eq!(int("0x", DataType::UInt8), Err(DataError::SyntaxError));
    }

    #[test]
    fn test_octal_and_binary_unsupported() {
        assert_eq!(int("0o17", DataType::UInt8), Err(DataError::LiteralUnsupported));
        assert_eq!(int("0b101", DataType::UInt8), Err(DataError::LiteralUnsupported));
        assert_eq!(
            read_float(b"0b1", 0, DataType::Float),
            Err(DataError::LiteralUnsupported)
        );
    }

    #[test]
    fn test_char_literals() {
        assert_eq!(int("'A'", DataType::UInt8), Ok(Value::UInt8(0x41)));
        assert_eq!(int("'AB'", DataType::UInt16), Ok(Value::UInt16(0x4142)));
        assert_eq!(int("'\\n'", DataType::UInt8), Ok(Value::UInt8(10)));
        assert_eq!(int("'\\x7f'", DataType::UInt8), Ok(Value::UInt8(0x7F)));
        assert_eq!(int("'\\q'", DataType::UInt8), Err(DataError::CharIllegalEscape));
        assert_eq!(int("'abc", DataType::UInt32), Err(DataError::CharEndOfFile));
        assert_eq!(int("'123456789'", DataType::UInt64), Err(DataError::IntegerOverflow));
    }

    #[test]
    fn test_floats() {
        assert_eq!(float("0.01"), Ok(0.01));
        assert_eq!(float("-2.5"), Ok(-2.5));
        assert_eq!(float("1e3"), Ok(1000.0));
        assert_eq!(float("25E-2"), Ok(0.25));
        assert_eq!(float(".5"), Ok(0.5));
        assert_eq!(float("3."), Ok(3.0));
        assert_eq!(float("1_000.5"), Ok(1000.5));
        assert_eq!(float("."), Err(DataError::FloatInvalid));
        assert_eq!(float("e5"), Err(DataError::FloatInvalid));
        assert_eq!(float("1e"), Err(DataError::FloatInvalid));
    }

    #[test]
    fn test_float_exponent_clamps() {
        let (_, v) = read_decimal_float(b"1e99999", 0).unwrap();
        assert_eq!(v, f64::MAX);

        let (_, v) = read_decimal_float(b"1e-99999", 0).unwrap();
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_hex_float_bits() {
        assert_eq!(float("0x3F800000"), Ok(1.0));
        assert_eq!(float("0x100000000"), Err(DataError::FloatOverflow));

        let (_, v) = read_float(b"0x3C00", 0, DataType::Half).unwrap();
        assert_eq!(v, Value::Half(f16::ONE));
        assert_eq!(
            read_float(b"0x10000", 0, DataType::Half),
            Err(DataError::FloatOverflow)
        );

        let (_, v) = read_float(b"0x3FF0000000000000", 0, DataType::Double).unwrap();
        assert_eq!(v, Value::Double(1.0));
    }

    #[test]
    fn test_strings() {
        assert_eq!(string(r#""hello""#), Ok("hello".to_string()));
        assert_eq!(string(r#""a\tb\"c""#), Ok("a\tb\"c".to_string()));
        assert_eq!(string(r#""é""#), Ok("\u{e9}".to_string()));
        assert_eq!(string(r#""\U01F600""#), Ok("\u{1F600}".to_string()));
        assert_eq!(string("\"caf\u{e9}\""), Ok("caf\u{e9}".to_string()));
    }

    #[test]
    fn test_string_concatenation() {
        let (end, s) = read_string(b"\"ab\" /* c */ \"cd\" , x", 0).unwrap();
        assert_eq!(s, "abcd");
        assert_eq!(end, 17);
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(string("\"abc"), Err(DataError::StringEndOfFile));
        assert_eq!(string("\"a\nb\""), Err(DataError::StringIllegalChar));
        assert_eq!(string("\"a\x7fb\""), Err(DataError::StringIllegalChar));
        assert_eq!(string(r#""\q""#), Err(DataError::StringIllegalEscape));
        assert_eq!(string(r#""\u0000""#), Err(DataError::StringIllegalEscape));
        assert_eq!(string(r#""\U110000""#), Err(DataError::StringIllegalEscape));
        assert_eq!(string("abc"), Err(DataError::StringInvalid));
    }

    #[test]
    fn test_string_rejects_bad_utf8() {
        // Overlong encoding of '/'.
        assert_eq!(
            read_string(b"\"\xC0\xAF\"", 0),
            Err(DataError::StringIllegalChar)
        );
        // Surrogate half.
        assert_eq!(
            read_string(b"\"\xED\xA0\x80\"", 0),
            Err(DataError::StringIllegalChar)
        );
        // Missing continuation byte.
        assert_eq!(read_string(b"\"\xE2\x82\"", 0), Err(DataError::StringIllegalChar));
    }

    #[test]
    fn test_references() {
        let (_, r) = read_reference(b"$geometry1", 0).unwrap();
        assert_eq!(r, StructureRef::global(["geometry1"]));

        let (_, r) = read_reference(b"%a%b", 0).unwrap();
        assert_eq!(r, StructureRef::local(["a", "b"]));

        let (_, r) = read_reference(b"$node % child}", 0).unwrap();
        assert_eq!(r, StructureRef::global(["node", "child"]));

        let (_, r) = read_reference(b"null", 0).unwrap();
        assert!(r.is_null());

        assert_eq!(read_reference(b"nothing", 0), Err(DataError::ReferenceInvalid));
        assert_eq!(read_reference(b"$", 0), Err(DataError::ReferenceInvalid));
        assert_eq!(read_reference(b"$a%", 0), Err(DataError::ReferenceInvalid));
    }

    #[test]
    fn test_base64_padding() {
        assert_eq!(base64("QQ=="), Ok(vec![0x41]));
        assert_eq!(base64("QQ="), Err(DataError::Base64Invalid));
        assert_eq!(base64("Q"), Err(DataError::Base64Invalid));
        assert_eq!(base64("QUI="), Ok(vec![0x41, 0x42]));
        assert_eq!(base64("QUI=="), Err(DataError::Base64Invalid));
        assert_eq!(base64("QUJD="), Err(DataError::Base64Invalid));
    }

    #[test]
    fn test_base64_groups() {
        assert_eq!(base64("SGVsbG8h"), Ok(b"Hello!".to_vec()));
        assert_eq!(base64("SGVs\n bG8h}"), Ok(b"Hello!".to_vec()));
        assert_eq!(base64("QUI"), Ok(vec![0x41, 0x42]));
    }

    #[test]
    fn test_read_value_dispatch() {
        let (_, v) = read_value(b"uint16", 0, DataType::Type).unwrap();
        assert_eq!(v, Value::Type(DataType::UInt16));

        let (_, v) = read_value(b"-7", 0, DataType::Int32).unwrap();
        assert_eq!(v, Value::Int32(-7));
    }
}
