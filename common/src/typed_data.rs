use std::collections::BTreeMap;

use alloy_primitives::{Address, Signature, B256};
use serde::Deserialize;
use tracing::debug;

use crate::{
    domain::{describe_domain_type, is_supported_domain_type, DomainSeparator, Eip712Domain},
    encoder::TypedDataEncoder,
    error::{Result, SchemaError},
    schema::{Field, TypeSchema, DOMAIN_TYPE_NAME},
    signing::DigestSigner,
    value::StructValue,
};

/// A signing request in the shape accepted by `eth_signTypedData_v4`:
/// `{domain, types, primaryType, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTypedData")]
pub struct TypedDataRequest {
    /// Signing domain.
    pub domain: Eip712Domain,
    /// Message types, without the domain type.
    pub types: TypeSchema,
    /// Struct type of `message`.
    pub primary_type: String,
    /// Message to sign.
    pub message: StructValue,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTypedData {
    domain: Eip712Domain,
    types: BTreeMap<String, Vec<Field>>,
    #[serde(default)]
    primary_type: Option<String>,
    message: serde_json::Value,
}

impl TryFrom<RawTypedData> for TypedDataRequest {
    type Error = SchemaError;

    fn try_from(raw: RawTypedData) -> Result<Self, Self::Error> {
        let mut types = raw.types;
        if let Some(domain_fields) = types.remove(DOMAIN_TYPE_NAME) {
            if !is_supported_domain_type(&domain_fields) {
                return Err(SchemaError::DomainType(describe_domain_type(&domain_fields)));
            }
        }
        let types = TypeSchema::new(types)?;
        let primary_type = match raw.primary_type {
            Some(primary_type) => primary_type,
            None => types.primary_type()?.to_owned(),
        };
        let message = StructValue::from_json(&primary_type, &types, &raw.message)?;
        Ok(Self {
            domain: raw.domain,
            types,
            primary_type,
            message,
        })
    }
}

impl TypedDataRequest {
    /// Builds a request, checking that `primary_type` is declared.
    pub fn new(
        domain: Eip712Domain,
        types: TypeSchema,
        primary_type: impl Into<String>,
        message: StructValue,
    ) -> Result<Self> {
        let primary_type = primary_type.into();
        if !types.contains(&primary_type) {
            return Err(SchemaError::UnknownType(primary_type).into());
        }
        Ok(Self {
            domain,
            types,
            primary_type,
            message,
        })
    }

    /// Parses a typed-data JSON document.
    pub fn from_json(typed_data_json: &str) -> Result<Self> {
        Ok(serde_json::from_str(typed_data_json)?)
    }

    /// Struct hash of the message.
    pub fn struct_hash(&self) -> Result<B256> {
        Ok(TypedDataEncoder::new(&self.types).struct_hash(&self.primary_type, &self.message)?)
    }

    /// Separator of the request's domain.
    pub fn domain_separator(&self) -> B256 {
        self.domain.separator()
    }

    /// The digest to sign: `keccak256("\x19\x01" ‖ domainSeparator ‖ hashStruct(message))`.
    pub fn signing_hash(&self) -> Result<B256> {
        let struct_hash = self.struct_hash()?;
        let digest = DomainSeparator::new(self.domain.clone()).hash_typed_data(&struct_hash);
        debug!(primary_type = %self.primary_type, %struct_hash, %digest, "computed typed data digest");
        Ok(digest)
    }

    /// Signs the request's digest.
    pub fn sign(&self, signer: &impl DigestSigner) -> Result<SignedTypedData> {
        let digest = self.signing_hash()?;
        let signature = signer.sign_digest(&digest)?;
        Ok(SignedTypedData {
            digest,
            signature,
            signer: signer.address(),
        })
    }
}

/// Outcome of signing a [`TypedDataRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedTypedData {
    /// Digest that was signed.
    pub digest: B256,
    /// Low-s signature over `digest`.
    pub signature: Signature,
    /// Address of the key that signed.
    pub signer: Address,
}

impl SignedTypedData {
    /// 65-byte `r ‖ s ‖ v` encoding with `v` in {27, 28}.
    pub fn signature_bytes(&self) -> [u8; 65] {
        self.signature.as_bytes()
    }
}
