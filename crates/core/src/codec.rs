//! Document value codec
//!
//! Documents are stored as MessagePack with named fields, so an encoded
//! document stays self-describing and a field path can be read back out of
//! the raw bytes without knowing the caller's type.
//!
//! Index buckets are keyed by the canonical byte form of an extracted value
//! (see [`index_key`]). The form is injective across JSON value kinds and
//! orders by raw byte comparison within a kind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Number, Value as JsonValue};

use crate::error::{Error, Result};
use crate::path::FieldPath;

const TAG_NULL: u8 = 0x00;
const TAG_BOOL: u8 = 0x01;
const TAG_INT: u8 = 0x02;
const TAG_UINT: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_STRING: u8 = 0x05;
const TAG_ARRAY: u8 = 0x06;
const TAG_OBJECT: u8 = 0x07;

const SIGN_BIT: u64 = 1 << 63;
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Encode a value as MessagePack with named fields
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decode MessagePack bytes into `T`
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Decode bytes into a dynamic tree
///
/// Returns `None` for empty input and for payloads that have no JSON
/// representation (raw binary, non-string map keys).
pub fn decode_dynamic(bytes: &[u8]) -> Option<JsonValue> {
    if bytes.is_empty() {
        return None;
    }
    rmp_serde::from_slice(bytes).ok()
}

/// Values reachable at `path` inside encoded document bytes
///
/// Tolerant: empty input, undecodable input, and absent paths all yield an
/// empty sequence.
pub fn extract_field_path(bytes: &[u8], path: &FieldPath) -> Vec<JsonValue> {
    match decode_dynamic(bytes) {
        Some(doc) => path.extract(&doc),
        None => Vec::new(),
    }
}

/// Canonical index key of a caller-supplied value
pub fn index_key_for<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let tree = serde_json::to_value(value).map_err(|e| Error::Encode(e.to_string()))?;
    Ok(index_key(&tree))
}

/// Canonical byte form of an extracted value
///
/// A one-byte kind tag followed by the payload:
/// - integral numbers (integral floats included) share one form, so `1`
///   and `1.0` land in the same bucket, as do `10^19` and `1e19`
/// - signed integers are big-endian with the sign bit flipped
/// - non-integral floats use order-preserving IEEE bits
/// - strings are raw UTF-8
/// - arrays and objects are compact JSON with sorted object keys
pub fn index_key(value: &JsonValue) -> Vec<u8> {
    match value {
        JsonValue::Null => vec![TAG_NULL],
        JsonValue::Bool(b) => vec![TAG_BOOL, u8::from(*b)],
        JsonValue::Number(n) => number_key(n),
        JsonValue::String(s) => {
            let mut out = Vec::with_capacity(s.len() + 1);
            out.push(TAG_STRING);
            out.extend_from_slice(s.as_bytes());
            out
        }
        JsonValue::Array(_) => tagged_json(TAG_ARRAY, value),
        JsonValue::Object(_) => tagged_json(TAG_OBJECT, value),
    }
}

fn number_key(n: &Number) -> Vec<u8> {
    if let Some(i) = n.as_i64() {
        return int_key(i);
    }
    if let Some(u) = n.as_u64() {
        return uint_key(u);
    }

    let f = n.as_f64().unwrap_or(0.0);
    // 2^63 and 2^64 are exactly representable as f64
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < TWO_POW_63 {
        return int_key(f as i64);
    }
    if f.fract() == 0.0 && (TWO_POW_63..TWO_POW_64).contains(&f) {
        return uint_key(f as u64);
    }

    let bits = f.to_bits();
    let ordered = if bits & SIGN_BIT != 0 {
        !bits
    } else {
        bits ^ SIGN_BIT
    };
    let mut out = vec![TAG_FLOAT];
    out.extend_from_slice(&ordered.to_be_bytes());
    out
}

fn int_key(i: i64) -> Vec<u8> {
    let mut out = vec![TAG_INT];
    out.extend_from_slice(&((i as u64) ^ SIGN_BIT).to_be_bytes());
    out
}

fn uint_key(u: u64) -> Vec<u8> {
    let mut out = vec![TAG_UINT];
    out.extend_from_slice(&u.to_be_bytes());
    out
}

fn tagged_json(tag: u8, value: &JsonValue) -> Vec<u8> {
    let text = value.to_string();
    let mut out = Vec::with_capacity(text.len() + 1);
    out.push(tag);
    out.extend_from_slice(text.as_bytes());
    out
}
