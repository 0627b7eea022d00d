//! Serde helpers for controller payloads.
//!
//! The controller sends `null` for empty lists and unset strings as often as it
//! omits the key. `#[serde(default)]` only covers the missing key, so fields
//! that are not `Option` pair it with [`null_as_default`].

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as `T::default()`.
///
/// # Errors
///
/// Returns the deserializer's error when the value is neither `null` nor a `T`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let option = Option::<T>::deserialize(deserializer)?;
    Ok(option.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "null_as_default")]
        items: Vec<u32>,
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
    }

    #[test]
    fn null_and_missing_become_default() {
        let sample: Sample = serde_json::from_str(r#"{"items": null, "name": null}"#).unwrap();
        assert!(sample.items.is_empty());
        assert!(sample.name.is_empty());

        let sample: Sample = serde_json::from_str("{}").unwrap();
        assert!(sample.items.is_empty());
    }

    #[test]
    fn present_values_are_kept() {
        let sample: Sample = serde_json::from_str(r#"{"items": [1, 2], "name": "a"}"#).unwrap();
        assert_eq!(sample.items, vec![1, 2]);
        assert_eq!(sample.name, "a");
    }

    #[test]
    fn wrong_type_is_still_an_error() {
        assert!(serde_json::from_str::<Sample>(r#"{"items": "x"}"#).is_err());
    }
}
