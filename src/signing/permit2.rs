//! Permit2 signatures over quote-supplied EIP-712 typed data
//!
//! The typed data is hashed exactly as the quote service declared it: field
//! order and names come from `types`, so the payload is validated against its
//! own declarations but never reordered or rebuilt.

use std::fmt;

use alloy::{
    hex,
    primitives::B256,
    signers::{SignerSync, local::PrivateKeySigner},
};
use alloy_dyn_abi::TypedData;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::SwapError;

/// The domain type every typed data payload must declare
const DOMAIN_TYPE: &str = "EIP712Domain";
/// The token permissions struct nested in a permit
const TOKEN_PERMISSIONS_TYPE: &str = "TokenPermissions";
/// The single-token permit struct
const PERMIT_TRANSFER_FROM_TYPE: &str = "PermitTransferFrom";
/// Message paths that must be present on a permit
const REQUIRED_MESSAGE_PATHS: [&str; 5] =
    ["/permitted/token", "/permitted/amount", "/spender", "/nonce", "/deadline"];

/// Offset added to a 0/1 recovery id to obtain the legacy 27/28 encoding
const LEGACY_V_OFFSET: u8 = 27;
/// Length of a packed `r || s || v` signature
pub const SIGNATURE_LEN: usize = 65;

/// A packed `r || s || v` signature with `v` in {27, 28}
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Permit2Signature([u8; SIGNATURE_LEN]);

impl Permit2Signature {
    /// Pack raw signature bytes, normalizing a 0/1 recovery id to 27/28
    pub fn from_raw(mut raw: [u8; SIGNATURE_LEN]) -> Self {
        raw[64] = normalize_v(raw[64]);
        Self(raw)
    }

    /// The `r` component
    pub fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    /// The `s` component
    pub fn s(&self) -> &[u8] {
        &self.0[32..64]
    }

    /// The recovery byte, always 27 or 28
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// The packed signature bytes
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }
}

impl fmt::Display for Permit2Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_prefixed(self.0))
    }
}

impl fmt::Debug for Permit2Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permit2Signature({self})")
    }
}

/// Map a raw recovery id onto the 27/28 encoding the permit contract expects
pub fn normalize_v(v: u8) -> u8 {
    if v < LEGACY_V_OFFSET { v + LEGACY_V_OFFSET } else { v }
}

/// Sign the quote's permit2 typed data with the session wallet
#[instrument(skip_all)]
pub fn sign_permit2(
    typed_data: &Value,
    signer: &PrivateKeySigner,
) -> Result<Permit2Signature, SwapError> {
    let hash = permit2_signing_hash(typed_data)?;
    debug!("permit2 eip-712 hash: {hash:#x}");

    let signature = signer.sign_hash_sync(&hash).map_err(SwapError::signing)?;

    let mut raw = [0u8; SIGNATURE_LEN];
    raw[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
    raw[32..64].copy_from_slice(&signature.s().to_be_bytes::<32>());
    raw[64] = u8::from(signature.v());

    Ok(Permit2Signature::from_raw(raw))
}

/// Validate the typed data and compute its EIP-712 signing hash
pub fn permit2_signing_hash(typed_data: &Value) -> Result<B256, SwapError> {
    validate_permit2_data(typed_data)?;

    let typed: TypedData =
        serde_json::from_value(typed_data.clone()).map_err(SwapError::malformed_permit)?;
    typed.eip712_signing_hash().map_err(SwapError::malformed_permit)
}

/// Check that the payload is a complete permit and matches its own
/// declarations
pub fn validate_permit2_data(typed_data: &Value) -> Result<(), SwapError> {
    let types = typed_data
        .get("types")
        .and_then(Value::as_object)
        .ok_or_else(|| SwapError::malformed_permit("missing types"))?;
    for required in [DOMAIN_TYPE, TOKEN_PERMISSIONS_TYPE, PERMIT_TRANSFER_FROM_TYPE] {
        if !types.contains_key(required) {
            return Err(SwapError::malformed_permit(format!("missing types.{required}")));
        }
    }

    let domain = typed_data
        .get("domain")
        .filter(|d| d.is_object())
        .ok_or_else(|| SwapError::malformed_permit("missing domain"))?;
    let message = typed_data
        .get("message")
        .filter(|m| m.is_object())
        .ok_or_else(|| SwapError::malformed_permit("missing message"))?;
    for path in REQUIRED_MESSAGE_PATHS {
        if message.pointer(path).is_none_or(Value::is_null) {
            let field = path.replace('/', ".");
            return Err(SwapError::malformed_permit(format!("missing message{field}")));
        }
    }

    let primary_type = typed_data
        .get("primaryType")
        .and_then(Value::as_str)
        .ok_or_else(|| SwapError::malformed_permit("missing primaryType"))?;

    check_struct(types, DOMAIN_TYPE, domain, "domain")?;
    check_struct(types, primary_type, message, "message")
}

/// Check that `value` carries exactly the fields `types[type_name]` declares,
/// recursing into nested struct types
fn check_struct(
    types: &Map<String, Value>,
    type_name: &str,
    value: &Value,
    path: &str,
) -> Result<(), SwapError> {
    let fields = types
        .get(type_name)
        .and_then(Value::as_array)
        .ok_or_else(|| SwapError::malformed_permit(format!("undeclared type {type_name}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| SwapError::malformed_permit(format!("{path} is not a {type_name} struct")))?;

    let mut declared = Vec::with_capacity(fields.len());
    for field in fields {
        let name = field.get("name").and_then(Value::as_str);
        let ty = field.get("type").and_then(Value::as_str);
        let (Some(name), Some(ty)) = (name, ty) else {
            let e = format!("bad field declaration in {type_name}");
            return Err(SwapError::malformed_permit(e));
        };
        declared.push(name);

        let field_path = format!("{path}.{name}");
        let field_value = object
            .get(name)
            .ok_or_else(|| SwapError::malformed_permit(format!("missing {field_path}")))?;

        let base = ty.split('[').next().unwrap_or(ty);
        if types.contains_key(base) {
            if base.len() == ty.len() {
                check_struct(types, base, field_value, &field_path)?;
            } else {
                let items = field_value.as_array().ok_or_else(|| {
                    SwapError::malformed_permit(format!("{field_path} is not an array"))
                })?;
                for (i, item) in items.iter().enumerate() {
                    check_struct(types, base, item, &format!("{field_path}[{i}]"))?;
                }
            }
        } else if !is_elementary(base) {
            return Err(SwapError::malformed_permit(format!("undeclared type {base}")));
        }
    }

    if let Some(extra) = object.keys().find(|key| !declared.contains(&key.as_str())) {
        return Err(SwapError::malformed_permit(format!(
            "{path}.{extra} is not declared in {type_name}"
        )));
    }

    Ok(())
}

/// Whether `ty` names a solidity elementary type
fn is_elementary(ty: &str) -> bool {
    let sized = |prefix: &str, max: u32, step: u32| {
        ty.strip_prefix(prefix).is_some_and(|bits| {
            bits.is_empty() || bits.parse::<u32>().is_ok_and(|n| n > 0 && n <= max && n % step == 0)
        })
    };
    matches!(ty, "address" | "bool" | "string" | "bytes")
        || sized("uint", 256, 8)
        || sized("int", 256, 8)
        || ty
            .strip_prefix("bytes")
            .and_then(|n| n.parse::<u32>().ok())
            .is_some_and(|n| (1..=32).contains(&n))
}
