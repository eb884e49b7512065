//! Conversion of domain values to the store's byte-string form and back.

use crate::error::ConversionError;
use bincode::config::standard;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::hash::Hash;

/// A value that can live in a remote set.
///
/// `convert(&x.prepare()?)` must give back `x`. Equal values must prepare to
/// equal bytes, since the store compares members byte-wise.
pub trait Element: Sized + Eq + Hash + Clone + Send + Sync + Debug + 'static {
    fn prepare(&self) -> Result<Vec<u8>, ConversionError>;

    fn convert(raw: &[u8]) -> Result<Self, ConversionError>;
}

impl Element for String {
    fn prepare(&self) -> Result<Vec<u8>, ConversionError> {
        Ok(self.as_bytes().to_vec())
    }

    fn convert(raw: &[u8]) -> Result<Self, ConversionError> {
        String::from_utf8(raw.to_vec()).map_err(|_| ConversionError::decode("String", raw))
    }
}

impl Element for Vec<u8> {
    fn prepare(&self) -> Result<Vec<u8>, ConversionError> {
        Ok(self.clone())
    }

    fn convert(raw: &[u8]) -> Result<Self, ConversionError> {
        Ok(raw.to_vec())
    }
}

impl Element for bool {
    fn prepare(&self) -> Result<Vec<u8>, ConversionError> {
        Ok(if *self { b"1".to_vec() } else { b"0".to_vec() })
    }

    fn convert(raw: &[u8]) -> Result<Self, ConversionError> {
        match raw {
            b"1" | b"true" => Ok(true),
            b"0" | b"false" => Ok(false),
            _ => Err(ConversionError::decode("bool", raw)),
        }
    }
}

impl Element for char {
    fn prepare(&self) -> Result<Vec<u8>, ConversionError> {
        Ok(self.to_string().into_bytes())
    }

    fn convert(raw: &[u8]) -> Result<Self, ConversionError> {
        let text = std::str::from_utf8(raw).map_err(|_| ConversionError::decode("char", raw))?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConversionError::decode("char", raw)),
        }
    }
}

// Integers travel as decimal text, the store's own numeric form.
macro_rules! decimal_element {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                fn prepare(&self) -> Result<Vec<u8>, ConversionError> {
                    Ok(self.to_string().into_bytes())
                }

                fn convert(raw: &[u8]) -> Result<Self, ConversionError> {
                    std::str::from_utf8(raw)
                        .ok()
                        .and_then(|s| s.parse::<$t>().ok())
                        .ok_or_else(|| ConversionError::decode(stringify!($t), raw))
                }
            }
        )*
    };
}

decimal_element!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Any serde type, stored as its bincode encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bincoded<T>(pub T);

impl<T> Element for Bincoded<T>
where
    T: Serialize + DeserializeOwned + Eq + Hash + Clone + Send + Sync + Debug + 'static,
{
    fn prepare(&self) -> Result<Vec<u8>, ConversionError> {
        bincode::serde::encode_to_vec(&self.0, standard()).map_err(|e| ConversionError::Encode(e.to_string()))
    }

    fn convert(raw: &[u8]) -> Result<Self, ConversionError> {
        let (value, used) = bincode::serde::decode_from_slice::<T, _>(raw, standard())
            .map_err(|_| ConversionError::decode(std::any::type_name::<T>(), raw))?;
        if used != raw.len() {
            return Err(ConversionError::decode(std::any::type_name::<T>(), raw));
        }
        Ok(Bincoded(value))
    }
}

pub(crate) fn prepare_all<'a, T, I>(values: I) -> Result<Vec<Vec<u8>>, ConversionError>
where
    T: Element + 'a,
    I: IntoIterator<Item = &'a T>,
{
    values.into_iter().map(Element::prepare).collect()
}

pub(crate) fn convert_all<T, C>(raw: Vec<Vec<u8>>) -> Result<C, ConversionError>
where
    T: Element,
    C: FromIterator<T>,
{
    raw.iter().map(|r| T::convert(r)).collect()
}
