//! EIP-712 domain and its separator.
//!
//! The separator binds every signature to one application name, version,
//! chain and verifying contract. It is derived from the exact domain tuple
//! and cached alongside it, so a changed chain id or redeployed contract
//! always yields a new separator.

use alloy_primitives::{b256, keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    hash::hash_str,
    schema::{Field, DOMAIN_TYPE_NAME},
    signing::typed_data_hash,
    value::StructValue,
};

/// Canonical type string of the domain struct.
pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// keccak256("EIP712Domain(string name,string version,uint256 chainId,address
/// verifyingContract)")
pub const TYPE_HASH: B256 =
    b256!("8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f");

/// Signing domain of one contract instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    /// User readable name of the signing domain, e.g. the DApp name.
    pub name: String,
    /// Current major version of the signing domain.
    pub version: String,
    /// EIP-155 chain id. Accepts a JSON number, a decimal string or a `0x`
    /// string.
    pub chain_id: U256,
    /// Address of the contract that verifies signatures.
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// Creates a domain.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: impl Into<U256>,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id: chain_id.into(),
            verifying_contract,
        }
    }

    /// Computes the domain separator. See [`compute_domain_separator`].
    pub fn separator(&self) -> B256 {
        compute_domain_separator(self)
    }

    /// Field declarations of the domain struct, in encoding order.
    pub fn fields() -> [Field; 4] {
        [
            Field::new("name", "string"),
            Field::new("version", "string"),
            Field::new("chainId", "uint256"),
            Field::new("verifyingContract", "address"),
        ]
    }

    /// The domain as a generic struct value of type `EIP712Domain`.
    pub fn to_struct_value(&self) -> StructValue {
        StructValue::new()
            .with("name", self.name.as_str())
            .with("version", self.version.as_str())
            .with("chainId", self.chain_id)
            .with("verifyingContract", self.verifying_contract)
    }
}

/// Struct hash of `domain` under [`DOMAIN_TYPE`].
pub fn compute_domain_separator(domain: &Eip712Domain) -> B256 {
    let encoded = (
        TYPE_HASH,
        hash_str(&domain.name),
        hash_str(&domain.version),
        domain.chain_id,
        domain.verifying_contract,
    )
        .abi_encode();
    keccak256(encoded)
}

/// A domain together with its separator, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSeparator {
    domain: Eip712Domain,
    separator: B256,
}

impl DomainSeparator {
    /// Fixes `domain` and derives its separator.
    pub fn new(domain: Eip712Domain) -> Self {
        let separator = compute_domain_separator(&domain);
        debug!(
            name = %domain.name,
            version = %domain.version,
            chain_id = %domain.chain_id,
            verifying_contract = %domain.verifying_contract,
            %separator,
            "computed domain separator"
        );
        Self { domain, separator }
    }

    /// The domain this separator was derived from.
    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    /// The cached separator.
    pub fn separator(&self) -> B256 {
        self.separator
    }

    /// Given an already hashed struct, returns the digest to sign for this
    /// domain.
    pub fn hash_typed_data(&self, struct_hash: &B256) -> B256 {
        typed_data_hash(&self.separator, struct_hash)
    }
}

impl From<Eip712Domain> for DomainSeparator {
    fn from(domain: Eip712Domain) -> Self {
        Self::new(domain)
    }
}

/// Whether `fields` declare exactly the supported domain struct.
pub(crate) fn is_supported_domain_type(fields: &[Field]) -> bool {
    fields == Eip712Domain::fields().as_slice()
}

/// Formats `fields` as a type string clause for error reports.
pub(crate) fn describe_domain_type(fields: &[Field]) -> String {
    let members: Vec<String> = fields.iter().map(|f| format!("{} {}", f.ty, f.name)).collect();
    format!("{DOMAIN_TYPE_NAME}({})", members.join(","))
}
