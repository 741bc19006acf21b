//! Statically validated EIP-712 type schemas.
//!
//! A [`TypeSchema`] is checked once, when it is registered: every field type
//! must be atomic or name a declared struct, struct names must be valid
//! identifiers, and the struct reference graph must be acyclic. Encoding
//! against a registered schema therefore never meets an unknown type.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::{error::SchemaError, hash::hash_str};

/// Name reserved for the domain struct.
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// A field declaration as it appears in `eth_signTypedData` JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Declared type, e.g. `uint256`, `Person` or `Person[]`.
    #[serde(rename = "type")]
    pub ty: String,
}

impl Field {
    /// Creates a field declaration.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Types with a fixed EIP-712 encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicType {
    /// `bool`
    Bool,
    /// `address`
    Address,
    /// `string`, hashed before packing.
    String,
    /// `bytes`, hashed before packing.
    Bytes,
    /// `bytes1` to `bytes32`, right padded.
    FixedBytes(usize),
    /// `uint8` to `uint256`, width in bits.
    Uint(usize),
    /// `int8` to `int256`, width in bits.
    Int(usize),
}

impl AtomicType {
    /// Parses a canonical atomic type name. Aliases such as `uint` are not
    /// accepted since they would change the type hash.
    pub fn parse(ty: &str) -> Option<Self> {
        match ty {
            "bool" => return Some(Self::Bool),
            "address" => return Some(Self::Address),
            "string" => return Some(Self::String),
            "bytes" => return Some(Self::Bytes),
            _ => {}
        }
        if let Some(bits) = ty.strip_prefix("uint") {
            return parse_size(bits, 8, 256).map(Self::Uint);
        }
        if let Some(bits) = ty.strip_prefix("int") {
            return parse_size(bits, 8, 256).map(Self::Int);
        }
        if let Some(len) = ty.strip_prefix("bytes") {
            return parse_size(len, 1, 32).map(Self::FixedBytes);
        }
        None
    }
}

/// Parses a decimal size that is a positive multiple of `step`, at most
/// `max`. Leading zeros are rejected.
fn parse_size(digits: &str, step: usize, max: usize) -> Option<usize> {
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let n: usize = digits.parse().ok()?;
    (n <= max && n % step == 0).then_some(n)
}

/// A resolved field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Atomic type.
    Atomic(AtomicType),
    /// Reference to a struct declared in the same schema.
    Struct(String),
    /// `T[]` when the length is `None`, `T[n]` otherwise.
    Array(Box<FieldType>, Option<usize>),
}

impl FieldType {
    fn parse<F>(ty: &str, is_struct: &F) -> Result<Self, SchemaError>
    where
        F: Fn(&str) -> bool,
    {
        if let Some(inner) = ty.strip_suffix(']') {
            let open = inner
                .rfind('[')
                .ok_or_else(|| SchemaError::UnknownType(ty.to_owned()))?;
            let len = match &inner[open + 1..] {
                "" => None,
                digits => Some(
                    parse_size(digits, 1, usize::MAX)
                        .ok_or_else(|| SchemaError::UnknownType(ty.to_owned()))?,
                ),
            };
            let element = Self::parse(&inner[..open], is_struct)?;
            return Ok(Self::Array(Box::new(element), len));
        }
        if let Some(atomic) = AtomicType::parse(ty) {
            return Ok(Self::Atomic(atomic));
        }
        if is_struct(ty) {
            return Ok(Self::Struct(ty.to_owned()));
        }
        Err(SchemaError::UnknownType(ty.to_owned()))
    }

    /// The struct this type refers to, looking through arrays.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Self::Struct(name) => Some(name),
            Self::Array(element, _) => element.struct_name(),
            Self::Atomic(_) => None,
        }
    }
}

/// A field together with its resolved type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// The declaration, kept verbatim for the type string.
    pub field: Field,
    /// Resolved type of the declaration.
    pub kind: FieldType,
}

/// Mapping from struct name to its ordered field declarations.
///
/// Field order is significant and is never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSchema {
    types: BTreeMap<String, Vec<ResolvedField>>,
}

impl TypeSchema {
    /// Validates and registers a set of struct declarations.
    pub fn new(types: BTreeMap<String, Vec<Field>>) -> Result<Self, SchemaError> {
        let mut resolved = BTreeMap::new();
        for (name, fields) in &types {
            validate_type_name(name)?;
            let mut seen = BTreeSet::new();
            let mut members = Vec::with_capacity(fields.len());
            for field in fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        ty: name.clone(),
                        field: field.name.clone(),
                    });
                }
                let kind = FieldType::parse(&field.ty, &|ty: &str| types.contains_key(ty))?;
                members.push(ResolvedField {
                    field: field.clone(),
                    kind,
                });
            }
            resolved.insert(name.clone(), members);
        }

        let schema = Self { types: resolved };
        schema.check_acyclic()?;
        Ok(schema)
    }

    /// Registers a single struct type.
    pub fn single(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Result<Self, SchemaError> {
        Self::new(BTreeMap::from([(name.into(), fields.into_iter().collect())]))
    }

    /// Whether `name` is a declared struct.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Declared struct names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Fields of `name` in declaration order.
    pub fn fields(&self, name: &str) -> Result<&[ResolvedField], SchemaError> {
        self.types
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SchemaError::UnknownType(name.to_owned()))
    }

    /// Resolves a type string against this schema.
    pub fn resolve(&self, ty: &str) -> Result<FieldType, SchemaError> {
        FieldType::parse(ty, &|name: &str| self.contains(name))
    }

    /// The unique struct not referenced by any other struct.
    pub fn primary_type(&self) -> Result<&str, SchemaError> {
        let referenced: BTreeSet<&str> = self
            .types
            .values()
            .flatten()
            .filter_map(|member| member.kind.struct_name())
            .collect();
        let roots: Vec<&str> = self
            .type_names()
            .filter(|name| !referenced.contains(name))
            .collect();
        if let [root] = roots[..] {
            return Ok(root);
        }
        Err(SchemaError::AmbiguousPrimaryType(
            roots.into_iter().map(str::to_owned).collect(),
        ))
    }

    /// Canonical type string: the clause of `name` followed by the clauses of
    /// every struct it references, sorted by name.
    ///
    /// `Mail(Person from,Person to,string contents)Person(string name,address wallet)`
    pub fn encode_type(&self, name: &str) -> Result<String, SchemaError> {
        let mut dependencies = BTreeSet::new();
        self.collect_dependencies(name, &mut dependencies)?;
        dependencies.remove(name);

        let mut encoded = self.encode_clause(name)?;
        for dependency in dependencies {
            encoded.push_str(&self.encode_clause(dependency)?);
        }
        Ok(encoded)
    }

    /// `keccak256(encode_type(name))`
    pub fn type_hash(&self, name: &str) -> Result<B256, SchemaError> {
        self.encode_type(name).map(|encoded| hash_str(&encoded))
    }

    fn encode_clause(&self, name: &str) -> Result<String, SchemaError> {
        let members = self
            .fields(name)?
            .iter()
            .map(|member| format!("{} {}", member.field.ty, member.field.name))
            .collect::<Vec<_>>();
        Ok(format!("{name}({})", members.join(",")))
    }

    fn collect_dependencies<'a>(
        &'a self,
        name: &'a str,
        found: &mut BTreeSet<&'a str>,
    ) -> Result<(), SchemaError> {
        if !found.insert(name) {
            return Ok(());
        }
        for member in self.fields(name)? {
            if let Some(child) = member.kind.struct_name() {
                self.collect_dependencies(child, found)?;
            }
        }
        Ok(())
    }

    fn check_acyclic(&self) -> Result<(), SchemaError> {
        let mut done = BTreeSet::new();
        for name in self.type_names() {
            self.visit(name, &mut Vec::new(), &mut done)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        path: &mut Vec<&'a str>,
        done: &mut BTreeSet<&'a str>,
    ) -> Result<(), SchemaError> {
        if done.contains(name) {
            return Ok(());
        }
        if path.contains(&name) {
            return Err(SchemaError::CyclicType(name.to_owned()));
        }
        path.push(name);
        for member in self.fields(name)? {
            if let Some(child) = member.kind.struct_name() {
                self.visit(child, path, done)?;
            }
        }
        path.pop();
        done.insert(name);
        Ok(())
    }
}

/// Struct names are Solidity identifiers that do not shadow atomic types.
fn validate_type_name(name: &str) -> Result<(), SchemaError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if !valid_start || !valid_rest || AtomicType::parse(name).is_some() {
        return Err(SchemaError::InvalidTypeName(name.to_owned()));
    }
    Ok(())
}
