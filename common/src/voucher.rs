//! The `NFTVoucher` value object redeemed by [`crate::redeemer::LazyMint`].

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    domain::Eip712Domain,
    encoder::TypedDataEncoder,
    error::Result,
    schema::{Field, TypeSchema},
    signing::DigestSigner,
    typed_data::{SignedTypedData, TypedDataRequest},
    value::StructValue,
};

/// Struct name of a voucher.
pub const VOUCHER_TYPE: &str = "NFTVoucher";

/// An off-chain signed authorization to mint `token_id` with metadata `uri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    /// Id of the token to mint. The voucher has no other identity.
    pub token_id: U256,
    /// Metadata URI bound to the token once minted.
    pub uri: String,
}

impl Voucher {
    /// Creates a voucher.
    pub fn new(token_id: impl Into<U256>, uri: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            uri: uri.into(),
        }
    }

    /// `NFTVoucher(uint256 tokenId,string uri)`
    pub fn schema() -> Result<TypeSchema> {
        Ok(TypeSchema::single(
            VOUCHER_TYPE,
            [Field::new("tokenId", "uint256"), Field::new("uri", "string")],
        )?)
    }

    /// The voucher as a generic struct value.
    pub fn to_struct_value(&self) -> StructValue {
        StructValue::new()
            .with("tokenId", self.token_id)
            .with("uri", self.uri.as_str())
    }

    /// Struct hash of the voucher.
    pub fn struct_hash(&self) -> Result<B256> {
        let schema = Self::schema()?;
        Ok(TypedDataEncoder::new(&schema).struct_hash(VOUCHER_TYPE, &self.to_struct_value())?)
    }

    /// Signing request for this voucher under `domain`.
    pub fn typed_data(&self, domain: Eip712Domain) -> Result<TypedDataRequest> {
        TypedDataRequest::new(domain, Self::schema()?, VOUCHER_TYPE, self.to_struct_value())
    }

    /// Signs the voucher for `domain`.
    pub fn sign(&self, domain: Eip712Domain, signer: &impl DigestSigner) -> Result<SignedTypedData> {
        self.typed_data(domain)?.sign(signer)
    }
}
