//! Metadata tree comparison.
//!
//! The decoder's `meta.json` is checked against the test descriptor. The walk
//! follows the reference tree and is deliberately shallow: at every mapping
//! only the first non-reserved key is descended into, and at every sequence
//! only the first element pair. Whatever that one path yields is the verdict.
//! Extra keys on the decoded side are ignored.

use crate::failure;
use conform_core::Verdict;
use serde_json::{Number, Value};

/// Descriptor keys consumed by the orchestrator rather than compared.
pub const RESERVED_KEYS: [&str; 4] = ["reconstructed_jpeg", "original_icc", "rms_error", "peak_error"];

/// Largest accepted absolute difference between two float values.
pub const FLOAT_TOLERANCE: f64 = 1e-4;

const MALFORMED: &str = "Malformed metadata file";

/// Compares a decoded metadata tree against the reference tree.
pub fn compare_metadata(decoded: &Value, reference: &Value) -> Verdict {
    match reference {
        Value::Object(reference_map) => {
            let Value::Object(decoded_map) = decoded else {
                return failure(MALFORMED);
            };
            let first = reference_map
                .iter()
                .find(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()));
            match first {
                None => Verdict::pass(),
                Some((key, reference_value)) => match decoded_map.get(key) {
                    Some(decoded_value) => compare_metadata(decoded_value, reference_value),
                    None => failure(format!("{MALFORMED}: key {key} not found")),
                },
            }
        }
        Value::Array(reference_items) => {
            let Value::Array(decoded_items) = decoded else {
                return failure(MALFORMED);
            };
            if decoded_items.len() != reference_items.len() {
                return failure(MALFORMED);
            }
            match reference_items.iter().zip(decoded_items).next() {
                None => Verdict::pass(),
                Some((reference_item, decoded_item)) => compare_metadata(decoded_item, reference_item),
            }
        }
        Value::Number(reference_number) if reference_number.is_f64() => {
            let Value::Number(decoded_number) = decoded else {
                return failure(MALFORMED);
            };
            let (Some(expected), Some(found), true) = (
                reference_number.as_f64(),
                decoded_number.as_f64(),
                decoded_number.is_f64(),
            ) else {
                return failure(MALFORMED);
            };
            if (found - expected).abs() > FLOAT_TOLERANCE {
                return failure(format!("Metadata: Expected {expected}, found {found}"));
            }
            Verdict::pass()
        }
        _ => {
            if !scalars_equal(decoded, reference) {
                return failure(format!("Metadata: Expected {reference}, found {decoded}"));
            }
            Verdict::pass()
        }
    }
}

/// Exact equality, except that an integer equals a float of the same value.
fn scalars_equal(decoded: &Value, reference: &Value) -> bool {
    match (decoded, reference) {
        (Value::Number(d), Value::Number(r)) => numbers_equal(d, r),
        _ => decoded == reference,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if a.is_f64() || b.is_f64() {
        a.as_f64() == b.as_f64()
    } else {
        a == b
    }
}
