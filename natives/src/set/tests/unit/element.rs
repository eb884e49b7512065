use crate::error::ConversionError;
use crate::set::element::{Bincoded, Element};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct Point {
    x: i32,
    y: i32,
    label: String,
}

fn roundtrip<T: Element>(value: T) {
    let raw = value.prepare().expect("prepare");
    assert_eq!(T::convert(&raw).expect("convert"), value);
}

#[test]
fn test_scalar_roundtrip() {
    roundtrip(String::from("héllo wörld"));
    roundtrip(String::new());
    roundtrip(vec![0u8, 255, 10]);
    roundtrip(true);
    roundtrip(false);
    roundtrip('λ');
    roundtrip(i64::MIN);
    roundtrip(u64::MAX);
    roundtrip(-1i8);
    roundtrip(u128::MAX);
    roundtrip(0usize);
}

#[test]
fn test_integers_use_decimal_text() {
    assert_eq!(42i32.prepare().expect("prepare"), b"42".to_vec());
    assert_eq!(i32::convert(b"-17").expect("convert"), -17);
}

#[test]
fn test_bool_accepts_words() {
    assert!(bool::convert(b"true").expect("convert"));
    assert!(!bool::convert(b"0").expect("convert"));
}

#[test]
fn test_decode_failure_names_target() {
    let err = i32::convert(b"abc").unwrap_err();
    assert_eq!(
        err,
        ConversionError::Decode {
            target: "i32",
            raw: "abc".into()
        }
    );
    assert!(u8::convert(b"256").is_err());
    assert!(char::convert(b"ab").is_err());
    assert!(String::convert(&[0xff, 0xfe]).is_err());
}

#[test]
fn test_bincoded_roundtrip() {
    roundtrip(Bincoded(Point { x: -3, y: 7, label: "origin".into() }));
    roundtrip(Bincoded((1u32, String::from("pair"))));
}

#[test]
fn test_bincoded_rejects_trailing_bytes() {
    let mut raw = Bincoded(5u32).prepare().expect("prepare");
    raw.push(0);
    assert!(Bincoded::<u32>::convert(&raw).is_err());
}
