#![allow(clippy::unwrap_used, reason = "tests unwrap known-good values")]

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn decimal_integers() {
    assert_eq!(parse_number("0"), Some(Number::Int(0)));
    assert_eq!(parse_number("42"), Some(Number::Int(42)));
    assert_eq!(parse_number("-7"), Some(Number::Int(-7)));
    assert_eq!(parse_number("99d"), Some(Number::Int(99)));
}

#[test]
fn based_integers() {
    assert_eq!(parse_number("0ffh"), Some(Number::Int(255)));
    assert_eq!(parse_number("10x"), Some(Number::Int(16)));
    assert_eq!(parse_number("101b"), Some(Number::Int(5)));
    assert_eq!(parse_number("17o"), Some(Number::Int(15)));
    assert_eq!(parse_number("0ffffffffh"), Some(Number::Int(-1)));
}

#[test]
fn longs_and_promotion() {
    assert_eq!(parse_number("5L"), Some(Number::Long(5)));
    assert_eq!(parse_number("0ffhL"), Some(Number::Long(255)));
    assert_eq!(
        parse_number("3000000000"),
        Some(Number::Long(3_000_000_000))
    );
    assert_eq!(parse_number("-3000000000"), Some(Number::Long(-3_000_000_000)));
}

#[test]
fn floats_and_doubles() {
    assert_eq!(parse_number("1.5"), Some(Number::Float(1.5)));
    assert_eq!(parse_number("-0.25"), Some(Number::Float(-0.25)));
    assert_eq!(parse_number("2e3"), Some(Number::Float(2000.0)));
    assert_eq!(parse_number("1e-2D"), Some(Number::Double(0.01)));
    assert_eq!(parse_number("1.5D"), Some(Number::Double(1.5)));
    assert_eq!(parse_number("3D"), Some(Number::Double(3.0)));
}

#[test]
fn malformed_numbers() {
    assert_eq!(parse_number(""), None);
    assert_eq!(parse_number("-"), None);
    assert_eq!(parse_number("12q"), None);
    assert_eq!(parse_number("12b"), None);
    assert_eq!(parse_number("1.5L"), None);
    assert_eq!(parse_number("1..2"), None);
    assert_eq!(parse_number("h"), None);
}

#[test]
fn simple_escapes() {
    assert_eq!(decode_escape(b"n"), Some(('\n', 1)));
    assert_eq!(decode_escape(b"t..."), Some(('\t', 1)));
    assert_eq!(decode_escape(b"r"), Some(('\r', 1)));
    assert_eq!(decode_escape(b"\\"), Some(('\\', 1)));
    assert_eq!(decode_escape(b"'"), Some(('\'', 1)));
    assert_eq!(decode_escape(b"\""), Some(('"', 1)));
}

#[test]
fn octal_escapes() {
    assert_eq!(decode_escape(b"101"), Some(('A', 3)));
    assert_eq!(decode_escape(b"0123"), Some(('\n', 3)));
    assert_eq!(decode_escape(b"12"), None);
    assert_eq!(decode_escape(b"189"), None);
    assert_eq!(decode_escape(b"777"), None);
}

#[test]
fn unknown_escape() {
    assert_eq!(decode_escape(b"q"), None);
    assert_eq!(decode_escape(b""), None);
}

mod proptest_numbers {
    use super::super::{parse_number, Number};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn decimal_int_roundtrip(n in any::<i32>()) {
            prop_assert_eq!(parse_number(&n.to_string()), Some(Number::Int(n)));
        }

        #[test]
        fn hex_suffix_matches_radix(n in 0u32..0x7fff_ffff) {
            let text = format!("0{n:x}h");
            prop_assert_eq!(parse_number(&text), Some(Number::Int(i32::try_from(n).unwrap())));
        }

        #[test]
        fn long_suffix_roundtrip(n in any::<i64>()) {
            prop_assume!(n != i64::MIN);
            prop_assert_eq!(parse_number(&format!("{n}L")), Some(Number::Long(n)));
        }
    }
}
