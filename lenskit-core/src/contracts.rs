//! Calldata encoding for the on-chain entry points the client submits to.
//!
//! Only encoding lives here; submission goes through the [`crate::wallet::Wallet`]
//! seam.

use alloy::sol;
use alloy::sol_types::SolCall;
use alloy_primitives::{Address, Bytes, U256};
use serde_json::Value;

use crate::error::LensKitError;
use crate::typed_data::{
    value_address, value_bytes, value_string, value_u256, SignatureComponents,
};

sol! {
    /// Signature bundle consumed by `withSig` entry points.
    struct Eip712Signature {
        uint8 v;
        bytes32 r;
        bytes32 s;
        uint256 deadline;
    }

    /// Parameters of `LensHub.postWithSig`.
    struct PostWithSigData {
        uint256 profileId;
        string contentURI;
        address collectModule;
        bytes collectModuleInitData;
        address referenceModule;
        bytes referenceModuleInitData;
        Eip712Signature sig;
    }

    function postWithSig(PostWithSigData vars);

    function approve(address spender, uint256 amount) returns (bool);
}

/// Encodes a `postWithSig` call from the typed-data value returned by the
/// API and a split signature. The deadline is read from the same value the
/// signature was computed over.
///
/// # Errors
/// Returns an error if a required value field is missing or malformed.
pub fn post_with_sig_calldata(
    value: &Value,
    signature: &SignatureComponents,
) -> Result<Bytes, LensKitError> {
    let vars = PostWithSigData {
        profileId: value_u256(value, "profileId")?,
        contentURI: value_string(value, "contentURI")?,
        collectModule: value_address(value, "collectModule")?,
        collectModuleInitData: value_bytes(value, "collectModuleInitData")?,
        referenceModule: value_address(value, "referenceModule")?,
        referenceModuleInitData: value_bytes(value, "referenceModuleInitData")?,
        sig: Eip712Signature {
            v: signature.v,
            r: signature.r,
            s: signature.s,
            deadline: value_u256(value, "deadline")?,
        },
    };
    Ok(postWithSigCall { vars }.abi_encode().into())
}

/// Encodes an ERC-20 `approve(spender, amount)` call.
#[must_use]
pub fn approve_calldata(spender: Address, amount: U256) -> Bytes {
    approveCall { spender, amount }.abi_encode().into()
}
