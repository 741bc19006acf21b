//! Fixed-schema verification of signed `Ticket` messages.

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;

use crate::{
    domain::{DomainSeparator, Eip712Domain},
    error::Result,
    hash::hash_str,
    schema::{Field, TypeSchema},
    signing::recover,
    value::StructValue,
};

/// Struct name of a ticket.
pub const TICKET_TYPE: &str = "Ticket";

/// An admission ticket for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub event_name: String,
    pub price: U256,
}

impl Ticket {
    pub fn new(event_name: impl Into<String>, price: U256) -> Self {
        Self {
            event_name: event_name.into(),
            price,
        }
    }

    /// `Ticket(string eventName,uint256 price)`
    pub fn schema() -> Result<TypeSchema> {
        Ok(TypeSchema::single(
            TICKET_TYPE,
            [Field::new("eventName", "string"), Field::new("price", "uint256")],
        )?)
    }

    pub fn to_struct_value(&self) -> StructValue {
        StructValue::new()
            .with("eventName", self.event_name.as_str())
            .with("price", self.price)
    }
}

/// Recovers ticket signers for one deployed domain.
///
/// The verifier never sees a schema at call time: the type hash is fixed at
/// construction and the struct is encoded field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketVerifier {
    domain: DomainSeparator,
    type_hash: B256,
}

impl TicketVerifier {
    /// Creates a verifier bound to `type_hash`, as computed by the signing side.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
        type_hash: B256,
    ) -> Self {
        Self {
            domain: Eip712Domain::new(name, version, U256::from(chain_id), verifying_contract).into(),
            type_hash,
        }
    }

    /// Creates a verifier whose type hash is derived from [`Ticket::schema`].
    pub fn from_schema(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Result<Self> {
        let type_hash = Ticket::schema()?.type_hash(TICKET_TYPE)?;
        Ok(Self::new(name, version, chain_id, verifying_contract, type_hash))
    }

    pub fn type_hash(&self) -> B256 {
        self.type_hash
    }

    pub fn domain(&self) -> &DomainSeparator {
        &self.domain
    }

    /// `keccak256(abi.encode(typeHash, keccak256(eventName), price))`
    pub fn struct_hash(&self, event_name: &str, price: U256) -> B256 {
        keccak256((self.type_hash, hash_str(event_name), price).abi_encode())
    }

    /// Recovers the address that signed the ticket `(event_name, price)`.
    pub fn get_signer(&self, event_name: &str, price: U256, signature: &[u8]) -> Result<Address> {
        let digest = self
            .domain
            .hash_typed_data(&self.struct_hash(event_name, price));
        recover(&digest, signature)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::uint;

    use super::*;
    use crate::{
        encoder::TypedDataEncoder,
        error::{Error, SignatureError},
        test_utils::{other_account, owner, CHAIN_ID, CONTRACT_ADDRESS},
        typed_data::TypedDataRequest,
    };

    const PRICE: U256 = uint!(1_000_000_000_000_000_000_U256);

    fn verifier() -> TicketVerifier {
        TicketVerifier::from_schema("TicketGenerator", "1", CHAIN_ID, CONTRACT_ADDRESS).unwrap()
    }

    fn request(ticket: &Ticket) -> TypedDataRequest {
        TypedDataRequest::new(
            verifier().domain().domain().clone(),
            Ticket::schema().unwrap(),
            TICKET_TYPE,
            ticket.to_struct_value(),
        )
        .unwrap()
    }

    #[test]
    fn type_hash_is_fixed() {
        assert_eq!(
            verifier().type_hash(),
            hash_str("Ticket(string eventName,uint256 price)")
        );
        let fixed = TicketVerifier::new(
            "TicketGenerator",
            "1",
            CHAIN_ID,
            CONTRACT_ADDRESS,
            hash_str("Ticket(string eventName,uint256 price)"),
        );
        assert_eq!(fixed, verifier());
    }

    #[test]
    fn fixed_encoding_matches_generic_encoder() {
        let ticket = Ticket::new("EthDenver", PRICE);
        let schema = Ticket::schema().unwrap();
        let generic = TypedDataEncoder::new(&schema)
            .struct_hash(TICKET_TYPE, &ticket.to_struct_value())
            .unwrap();
        assert_eq!(verifier().struct_hash("EthDenver", PRICE), generic);
    }

    #[test]
    fn recovers_owner() {
        let ticket = Ticket::new("EthDenver", PRICE);
        let signed = request(&ticket).sign(&owner()).unwrap();

        let signer = verifier()
            .get_signer("EthDenver", PRICE, &signed.signature_bytes())
            .unwrap();
        assert_eq!(signer, owner().address());
    }

    #[test]
    fn altered_fields_recover_another_address() {
        let ticket = Ticket::new("EthDenver", PRICE);
        let signature = request(&ticket).sign(&other_account()).unwrap().signature_bytes();

        let signer = verifier().get_signer("EthDenver", PRICE + U256::from(1), &signature);
        assert_ne!(signer.ok(), Some(other_account().address()));
        let signer = verifier().get_signer("ETHDenver", PRICE, &signature);
        assert_ne!(signer.ok(), Some(other_account().address()));
    }

    #[test]
    fn rejects_truncated_signature() {
        let err = verifier().get_signer("EthDenver", PRICE, &[0u8; 64]).unwrap_err();
        assert_eq!(err, Error::InvalidSignature(SignatureError::InvalidLength(64)));
    }
}
