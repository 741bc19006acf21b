use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Shorthand for a `Result` where the error type defaults to [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure surfaced by this crate.
///
/// All errors abort the current operation wholesale. None of them are
/// retried internally and retrying with the same input fails identically.
///
/// Errors from foreign crates are kept as their rendered message so the enum
/// stays `Clone + Eq` and can be compared in revert checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A value or type description does not match its declared schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaError),
    /// The signature bytes are malformed or recovery is impossible.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),
    /// The signature is well formed but was produced by the wrong key.
    #[error("InvalidSigner: recovered {signer}, expected {expected}")]
    InvalidSigner {
        /// Address recovered from the signature.
        signer: Address,
        /// Address holding the authority.
        expected: Address,
    },
    /// The token id has already been consumed.
    #[error("ERC721: token already minted")]
    AlreadyMinted(U256),
    /// Tokens cannot be credited to the zero address.
    #[error("ERC721: invalid receiver {0}")]
    InvalidReceiver(Address),
    /// The digest signer failed to produce a signature. Holds the signer
    /// error's message.
    #[error("signing failed: {0}")]
    Signing(String),
    /// The typed-data JSON could not be decoded. Holds the `serde_json`
    /// message, including line and column.
    #[error("invalid typed data JSON: {0}")]
    Json(String),
}

/// Revert reason reported when a token id is minted twice.
pub const ALREADY_MINTED_REASON: &str = "ERC721: token already minted";

/// How a failure is reported across the contract boundary.
///
/// A custom error is matched by name, a string revert by its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revert {
    /// Solidity-style custom error, e.g. `InvalidSigner()`.
    Custom(&'static str),
    /// `require`-style revert carrying a human readable reason.
    Reason(String),
}

impl Error {
    /// Maps the error onto the revert observed by callers of a contract.
    pub fn revert(&self) -> Revert {
        match self {
            Self::SchemaMismatch(_) => Revert::Custom("SchemaMismatch"),
            Self::InvalidSignature(SignatureError::HighS(_)) => {
                Revert::Custom("ECDSAInvalidSignatureS")
            }
            Self::InvalidSignature(SignatureError::InvalidLength(_)) => {
                Revert::Custom("ECDSAInvalidSignatureLength")
            }
            Self::InvalidSignature(_) => Revert::Custom("ECDSAInvalidSignature"),
            Self::InvalidSigner { .. } => Revert::Custom("InvalidSigner"),
            Self::AlreadyMinted(_) => Revert::Reason(ALREADY_MINTED_REASON.to_owned()),
            Self::InvalidReceiver(_) => Revert::Custom("ERC721InvalidReceiver"),
            Self::Signing(msg) | Self::Json(msg) => Revert::Reason(msg.clone()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Type description or value does not fit the registered schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field type is neither atomic nor a declared struct.
    #[error("unknown type `{0}`")]
    UnknownType(String),
    /// A struct name is not a valid identifier or shadows an atomic type.
    #[error("invalid type name `{0}`")]
    InvalidTypeName(String),
    /// The same field name is declared twice in one struct.
    #[error("duplicate field `{field}` in `{ty}`")]
    DuplicateField {
        /// Struct declaring the field.
        ty: String,
        /// Repeated field name.
        field: String,
    },
    /// A struct references itself, directly or through other structs.
    #[error("cyclic reference through `{0}`")]
    CyclicType(String),
    /// A value lacks a field its struct type declares.
    #[error("missing field `{0}`")]
    MissingField(String),
    /// A value carries a field its struct type does not declare.
    #[error("unexpected field `{0}`")]
    UnexpectedField(String),
    /// A value has the wrong kind for its declared type.
    #[error("`{path}` is not a valid `{expected}`")]
    TypeMismatch {
        /// Dotted path of the offending value.
        path: String,
        /// Declared type.
        expected: String,
    },
    /// A fixed-length array has the wrong number of elements.
    #[error("`{path}` has {found} elements, expected {expected}")]
    ArrayLength {
        /// Dotted path of the offending value.
        path: String,
        /// Declared length.
        expected: usize,
        /// Actual length.
        found: usize,
    },
    /// The `EIP712Domain` type in a request differs from the supported one.
    #[error("unsupported domain type `{0}`")]
    DomainType(String),
    /// The primary type cannot be inferred from the schema.
    #[error("cannot infer primary type, candidates: {0:?}")]
    AmbiguousPrimaryType(Vec<String>),
}

/// Reasons a signature is rejected before or during recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Signatures are exactly 65 bytes long.
    #[error("expected 65 bytes, got {0}")]
    InvalidLength(usize),
    /// `v` must be 0, 1, 27 or 28.
    #[error("invalid recovery id {0}")]
    InvalidV(u8),
    /// `s` lies in the upper half of the curve order.
    #[error("s value {0:#x} is in the upper half order")]
    HighS(U256),
    /// The curve point could not be recovered.
    #[error("recovery failed: {0}")]
    Recovery(String),
    /// Recovery produced the zero address.
    #[error("recovered the zero address")]
    ZeroAddress,
}
