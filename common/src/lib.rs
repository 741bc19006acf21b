//! EIP-712 typed structured data hashing and signing, with two verifying
//! applications built on it: a fixed-schema ticket verifier and a lazy-mint
//! voucher redeemer.
//!
//! A message is described by a [`TypeSchema`] and a [`StructValue`], hashed
//! by a [`TypedDataEncoder`], bound to one deployment by a
//! [`DomainSeparator`] and signed or recovered through [`signing`].

pub mod domain;
pub mod encoder;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod redeemer;
pub mod schema;
pub mod signing;
pub mod ticket;
pub mod typed_data;
pub mod value;
pub mod voucher;

#[cfg(test)]
mod test_utils;

pub use domain::{DomainSeparator, Eip712Domain};
pub use encoder::TypedDataEncoder;
pub use error::{Error, Result, Revert, SchemaError, SignatureError};
pub use ledger::{InMemoryLedger, TokenLedger};
pub use redeemer::LazyMint;
pub use schema::{Field, TypeSchema};
pub use signing::{recover, verify_signer, DigestSigner};
pub use ticket::{Ticket, TicketVerifier};
pub use typed_data::{SignedTypedData, TypedDataRequest};
pub use value::{StructValue, Value};
pub use voucher::Voucher;
