//! Values encoded against a [`TypeSchema`].

use std::{collections::BTreeMap, str::FromStr};

use alloy_primitives::{hex, Address, Bytes, B256, I256, U256};

use crate::{
    encoder::{check_array_len, fits_fixed_bytes, fits_int, fits_uint},
    error::SchemaError,
    schema::{AtomicType, FieldType, TypeSchema},
};

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `bool`
    Bool(bool),
    /// `uintN`
    Uint(U256),
    /// `intN`
    Int(I256),
    /// `address`
    Address(Address),
    /// `bytesN`, must be exactly N bytes long.
    FixedBytes(Bytes),
    /// `bytes`
    Bytes(Bytes),
    /// `string`
    String(String),
    /// `T[]` or `T[n]`
    Array(Vec<Value>),
    /// Nested struct.
    Struct(StructValue),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<U256> for Value {
    fn from(value: U256) -> Self {
        Self::Uint(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }
}

impl From<I256> for Value {
    fn from(value: I256) -> Self {
        Self::Int(value)
    }
}

impl From<Address> for Value {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<B256> for Value {
    fn from(value: B256) -> Self {
        Self::FixedBytes(Bytes::copy_from_slice(value.as_slice()))
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<StructValue> for Value {
    fn from(value: StructValue) -> Self {
        Self::Struct(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

/// Field values of one struct, keyed by field name.
///
/// Insertion order is irrelevant: encoding always follows the order declared
/// in the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructValue {
    fields: BTreeMap<String, Value>,
}

impl StructValue {
    /// Creates an empty value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`StructValue::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Looks up a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Names of the fields present in this value.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Converts a JSON object into a value of struct `type_name`, guided by
    /// the schema.
    ///
    /// Unsigned and signed integers accept JSON numbers or decimal/`0x`
    /// strings; addresses and bytes accept hex strings.
    pub fn from_json(
        type_name: &str,
        schema: &TypeSchema,
        json: &serde_json::Value,
    ) -> Result<Self, SchemaError> {
        struct_from_json(type_name, schema, json, type_name)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for StructValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

fn struct_from_json(
    type_name: &str,
    schema: &TypeSchema,
    json: &serde_json::Value,
    path: &str,
) -> Result<StructValue, SchemaError> {
    let object = json.as_object().ok_or_else(|| SchemaError::TypeMismatch {
        path: path.to_owned(),
        expected: type_name.to_owned(),
    })?;
    let members = schema.fields(type_name)?;

    if let Some(extra) = object
        .keys()
        .find(|key| !members.iter().any(|member| &member.field.name == *key))
    {
        return Err(SchemaError::UnexpectedField(format!("{path}.{extra}")));
    }

    let mut value = StructValue::new();
    for member in members {
        let name = &member.field.name;
        let field_path = format!("{path}.{name}");
        let field_json = object
            .get(name)
            .ok_or_else(|| SchemaError::MissingField(field_path.clone()))?;
        value.insert(
            name.clone(),
            value_from_json(&member.kind, schema, field_json, &field_path)?,
        );
    }
    Ok(value)
}

fn value_from_json(
    kind: &FieldType,
    schema: &TypeSchema,
    json: &serde_json::Value,
    path: &str,
) -> Result<Value, SchemaError> {
    let mismatch = |expected: &str| SchemaError::TypeMismatch {
        path: path.to_owned(),
        expected: expected.to_owned(),
    };

    match kind {
        FieldType::Struct(name) => {
            struct_from_json(name, schema, json, path).map(Value::Struct)
        }
        FieldType::Array(element, len) => {
            let items = json.as_array().ok_or_else(|| mismatch("array"))?;
            check_array_len(*len, items.len(), path)?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| value_from_json(element, schema, item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        FieldType::Atomic(AtomicType::Bool) => {
            json.as_bool().map(Value::Bool).ok_or_else(|| mismatch("bool"))
        }
        FieldType::Atomic(AtomicType::String) => json
            .as_str()
            .map(|s| Value::String(s.to_owned()))
            .ok_or_else(|| mismatch("string")),
        FieldType::Atomic(AtomicType::Address) => json
            .as_str()
            .and_then(|s| Address::from_str(s).ok())
            .map(Value::Address)
            .ok_or_else(|| mismatch("address")),
        FieldType::Atomic(AtomicType::Bytes) => json
            .as_str()
            .and_then(|s| hex::decode(s).ok())
            .map(|bytes| Value::Bytes(bytes.into()))
            .ok_or_else(|| mismatch("bytes")),
        FieldType::Atomic(AtomicType::FixedBytes(len)) => json
            .as_str()
            .and_then(|s| hex::decode(s).ok())
            .filter(|bytes| fits_fixed_bytes(bytes, *len))
            .map(|bytes| Value::FixedBytes(bytes.into()))
            .ok_or_else(|| mismatch(&format!("bytes{len}"))),
        FieldType::Atomic(AtomicType::Uint(bits)) => {
            let parsed = match json {
                serde_json::Value::Number(n) => n.as_u64().map(U256::from),
                serde_json::Value::String(s) => U256::from_str(s).ok(),
                _ => None,
            };
            parsed
                .filter(|n| fits_uint(n, *bits))
                .map(Value::Uint)
                .ok_or_else(|| mismatch(&format!("uint{bits}")))
        }
        FieldType::Atomic(AtomicType::Int(bits)) => {
            let parsed = match json {
                serde_json::Value::Number(n) => {
                    n.as_i64().and_then(|n| I256::try_from(n).ok())
                }
                serde_json::Value::String(s) => parse_int(s),
                _ => None,
            };
            parsed
                .filter(|n| fits_int(*n, *bits))
                .map(Value::Int)
                .ok_or_else(|| mismatch(&format!("int{bits}")))
        }
    }
}

fn parse_int(s: &str) -> Option<I256> {
    let magnitude = s.strip_prefix('-').unwrap_or(s);
    if magnitude.starts_with("0x") {
        I256::from_hex_str(s).ok()
    } else {
        I256::from_dec_str(s).ok()
    }
}
