use std::str::FromStr;

use alloy::primitives::{FixedBytes, B256, U256};
use eyre::Result;
use serde::Deserialize;

use crate::errors::InvalidLengthError;

pub fn hex_str_to_bytes(s: &str) -> Result<Vec<u8>> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    Ok(hex::decode(stripped)?)
}

/// Converts a byte slice into a fixed-size vector, rejecting any other length.
pub fn bytes_to_fixed<const N: usize>(bytes: &[u8]) -> Result<FixedBytes<N>, InvalidLengthError> {
    if bytes.len() != N {
        return Err(InvalidLengthError::new(N, bytes.len()));
    }

    Ok(FixedBytes::from_slice(bytes))
}

pub fn bytes_to_b256(bytes: &[u8]) -> Result<B256, InvalidLengthError> {
    bytes_to_fixed::<32>(bytes)
}

pub fn bytes_serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let bytes_string = format!("0x{}", hex::encode(bytes));
    serializer.serialize_str(&bytes_string)
}

pub fn bytes_deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let bytes: String = Deserialize::deserialize(deserializer)?;
    hex_str_to_bytes(&bytes).map_err(serde::de::Error::custom)
}

pub fn bytes_opt_serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match bytes {
        Some(bytes) => bytes_serialize(bytes, serializer),
        None => serializer.serialize_none(),
    }
}

pub fn bytes_opt_deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let bytes_opt: Option<String> = Deserialize::deserialize(deserializer)?;
    bytes_opt
        .map(|bytes| hex_str_to_bytes(&bytes).map_err(serde::de::Error::custom))
        .transpose()
}

/// Writes a `U256` as a plain JSON number when it fits in a `u64`, and as a
/// decimal string otherwise.
pub fn u256_number_serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match u64::try_from(*value) {
        Ok(value) => serializer.serialize_u64(value),
        Err(_) => serializer.serialize_str(&value.to_string()),
    }
}

/// Accepts a JSON number, or a decimal or `0x` hex string.
pub fn u256_number_deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u64),
        Str(String),
    }

    match Number::deserialize(deserializer)? {
        Number::Int(value) => Ok(U256::from(value)),
        Number::Str(value) => U256::from_str(&value).map_err(serde::de::Error::custom),
    }
}
