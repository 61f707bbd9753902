//! EIP-712 typed-data handling.
//!
//! The API returns a `{domain, types, value}` triple decorated with
//! `__typename` bookkeeping tags. The signature must be computed over exactly
//! the semantic triple, so the tags are stripped from all three parts before
//! the payload is assembled for signing.

use alloy::dyn_abi::TypedData;
use alloy_primitives::{Address, Bytes, Signature, B256, U256};
use serde::Deserialize;
use serde_json::Value;

use crate::error::LensKitError;

/// An EIP-712 structured-signing payload as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct TypedDataRequest {
    /// Domain separator fields.
    pub domain: Value,
    /// Struct type definitions, keyed by the primary type name.
    pub types: Value,
    /// The message to sign.
    pub value: Value,
}

impl TypedDataRequest {
    /// Strips bookkeeping tags and assembles the signable EIP-712 payload.
    /// The primary type is the single struct named in `types`.
    ///
    /// # Errors
    /// Returns an error if `types` names no struct or the triple does not
    /// form a valid EIP-712 payload.
    pub fn to_signable(&self) -> Result<TypedData, LensKitError> {
        let types = strip_typename(&self.types);
        let primary_type = types
            .as_object()
            .and_then(|map| map.keys().next().cloned())
            .ok_or_else(|| LensKitError::InvalidInput {
                attribute: "types".to_string(),
                reason: "typed data names no primary type".to_string(),
            })?;

        let payload = serde_json::json!({
            "domain": strip_typename(&self.domain),
            "types": types,
            "primaryType": primary_type,
            "message": strip_typename(&self.value),
        });
        serde_json::from_value(payload).map_err(|err| {
            LensKitError::Serialization(format!("invalid typed data payload: {err}"))
        })
    }
}

/// Recursively removes `__typename` tags from objects. Idempotent.
#[must_use]
pub fn strip_typename(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != "__typename")
                .map(|(key, entry)| (key.clone(), strip_typename(entry)))
                .collect(),
        ),
        Value::Array(entries) => Value::Array(entries.iter().map(strip_typename).collect()),
        other => other.clone(),
    }
}

/// Formats a signature as the 0x-prefixed 65-byte hex string the API expects.
#[must_use]
pub fn signature_hex(signature: &Signature) -> String {
    format!("0x{}", hex::encode(signature.as_bytes()))
}

/// The `(v, r, s)` decomposition of a 65-byte signature, as consumed by
/// `withSig` contract entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureComponents {
    /// First 32 bytes.
    pub r: B256,
    /// Next 32 bytes.
    pub s: B256,
    /// Recovery byte, normalized to 27 or 28.
    pub v: u8,
}

impl SignatureComponents {
    /// Splits a signature into its components.
    ///
    /// # Errors
    /// Returns an error if the recovery byte cannot be normalized to 27/28.
    pub fn from_signature(signature: &Signature) -> Result<Self, LensKitError> {
        Self::from_raw(&signature.as_bytes())
    }

    /// Splits a raw 65-byte signature: r is the first 32 bytes, s the next
    /// 32, and the final recovery byte is normalized to {27, 28}.
    ///
    /// # Errors
    /// Returns an error if the input is not 65 bytes or carries an invalid
    /// recovery byte.
    pub fn from_raw(bytes: &[u8]) -> Result<Self, LensKitError> {
        if bytes.len() != 65 {
            return Err(LensKitError::InvalidInput {
                attribute: "signature".to_string(),
                reason: format!("expected 65 bytes, got {}", bytes.len()),
            });
        }
        let mut v = bytes[64];
        if v < 27 {
            v += 27;
        }
        if v != 27 && v != 28 {
            return Err(LensKitError::InvalidInput {
                attribute: "signature".to_string(),
                reason: format!("invalid recovery byte {}", bytes[64]),
            });
        }
        Ok(Self {
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..64]),
            v,
        })
    }

    /// Re-joins the components into the 65-byte `r || s || v` form.
    #[must_use]
    pub fn join(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(self.r.as_slice());
        bytes[32..64].copy_from_slice(self.s.as_slice());
        bytes[64] = self.v;
        bytes
    }
}

fn field<'a>(value: &'a Value, name: &str) -> Result<&'a Value, LensKitError> {
    value.get(name).ok_or_else(|| LensKitError::InvalidInput {
        attribute: name.to_string(),
        reason: "missing typed data value field".to_string(),
    })
}

/// Reads a uint field that may arrive as a JSON number, a decimal string, or
/// 0x-prefixed hex.
pub(crate) fn value_u256(value: &Value, name: &str) -> Result<U256, LensKitError> {
    let entry = field(value, name)?;
    if let Some(number) = entry.as_u64() {
        return Ok(U256::from(number));
    }
    entry
        .as_str()
        .ok_or(())
        .and_then(|text| text.parse::<U256>().map_err(|_| ()))
        .map_err(|()| LensKitError::InvalidInput {
            attribute: name.to_string(),
            reason: format!("not a uint: {entry}"),
        })
}

pub(crate) fn value_address(value: &Value, name: &str) -> Result<Address, LensKitError> {
    let entry = field(value, name)?;
    entry
        .as_str()
        .ok_or(())
        .and_then(|text| text.parse::<Address>().map_err(|_| ()))
        .map_err(|()| LensKitError::InvalidInput {
            attribute: name.to_string(),
            reason: format!("not an address: {entry}"),
        })
}

pub(crate) fn value_bytes(value: &Value, name: &str) -> Result<Bytes, LensKitError> {
    let entry = field(value, name)?;
    entry
        .as_str()
        .ok_or(())
        .and_then(|text| text.parse::<Bytes>().map_err(|_| ()))
        .map_err(|()| LensKitError::InvalidInput {
            attribute: name.to_string(),
            reason: format!("not hex bytes: {entry}"),
        })
}

pub(crate) fn value_string(value: &Value, name: &str) -> Result<String, LensKitError> {
    let entry = field(value, name)?;
    entry
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| LensKitError::InvalidInput {
            attribute: name.to_string(),
            reason: format!("not a string: {entry}"),
        })
}
