//! JSON codec for persisted models
//!
//! Expression trees nest as deep as the source they came from, so decoding
//! runs without serde_json's recursion limit on a dedicated stack.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const JSON_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Decode `text`, accepting any nesting depth
pub fn from_str<T: DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    stacker::grow(JSON_STACK_SIZE, || -> serde_json::Result<T> {
        let mut de = serde_json::Deserializer::from_str(text);
        de.disable_recursion_limit();
        let value = Deserialize::deserialize(&mut de)?;
        de.end()?;
        Ok(value)
    })
}

pub fn to_string<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    stacker::grow(JSON_STACK_SIZE, || serde_json::to_string(value))
}

pub fn to_string_pretty<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    stacker::grow(JSON_STACK_SIZE, || serde_json::to_string_pretty(value))
}
