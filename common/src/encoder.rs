//! Canonical EIP-712 struct hashing.
//!
//! [`TypedDataEncoder::struct_hash`] computes
//! `keccak256(typeHash ‖ encodeValue(field1) ‖ … ‖ encodeValue(fieldN))`
//! with fields taken in the order declared by the schema.

use alloy_primitives::{keccak256, B256, I256, U256};

use crate::{
    error::SchemaError,
    hash::hash_words,
    schema::{AtomicType, FieldType, TypeSchema},
    value::{StructValue, Value},
};

/// Encodes values against a registered [`TypeSchema`].
#[derive(Debug, Clone, Copy)]
pub struct TypedDataEncoder<'a> {
    schema: &'a TypeSchema,
}

impl<'a> TypedDataEncoder<'a> {
    /// Creates an encoder over `schema`.
    pub fn new(schema: &'a TypeSchema) -> Self {
        Self { schema }
    }

    /// Canonical type signature of `type_name`.
    pub fn type_string(&self, type_name: &str) -> Result<String, SchemaError> {
        self.schema.encode_type(type_name)
    }

    /// `keccak256(type_string(type_name))`
    pub fn type_hash(&self, type_name: &str) -> Result<B256, SchemaError> {
        self.schema.type_hash(type_name)
    }

    /// Encodes one value of type `field_type` into a 32-byte word.
    pub fn encode_value(&self, field_type: &str, value: &Value) -> Result<B256, SchemaError> {
        let kind = self.schema.resolve(field_type)?;
        self.encode_kind(&kind, value, field_type)
    }

    /// Hash of `value` interpreted as struct `type_name`.
    pub fn struct_hash(&self, type_name: &str, value: &StructValue) -> Result<B256, SchemaError> {
        self.hash_struct(type_name, value, type_name)
    }

    fn hash_struct(
        &self,
        type_name: &str,
        value: &StructValue,
        path: &str,
    ) -> Result<B256, SchemaError> {
        let members = self.schema.fields(type_name)?;
        if let Some(extra) = value
            .names()
            .find(|name| !members.iter().any(|member| member.field.name == *name))
        {
            return Err(SchemaError::UnexpectedField(format!("{path}.{extra}")));
        }

        let mut words = Vec::with_capacity(members.len() + 1);
        words.push(self.type_hash(type_name)?);
        for member in members {
            let name = &member.field.name;
            let field_path = format!("{path}.{name}");
            let field = value
                .get(name)
                .ok_or_else(|| SchemaError::MissingField(field_path.clone()))?;
            words.push(self.encode_kind(&member.kind, field, &field_path)?);
        }
        Ok(hash_words(&words))
    }

    fn encode_kind(&self, kind: &FieldType, value: &Value, path: &str) -> Result<B256, SchemaError> {
        let mismatch = |expected: String| SchemaError::TypeMismatch {
            path: path.to_owned(),
            expected,
        };

        match (kind, value) {
            (FieldType::Struct(name), Value::Struct(inner)) => self.hash_struct(name, inner, path),
            (FieldType::Array(element, len), Value::Array(items)) => {
                check_array_len(*len, items.len(), path)?;
                let words = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.encode_kind(element, item, &format!("{path}[{i}]")))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(hash_words(&words))
            }
            (FieldType::Atomic(atomic), value) => {
                encode_atomic(*atomic, value).ok_or_else(|| mismatch(atomic_name(*atomic)))
            }
            (FieldType::Struct(name), _) => Err(mismatch(name.clone())),
            (FieldType::Array(..), _) => Err(mismatch("array".to_owned())),
        }
    }
}

/// Packs an atomic value into one word, or `None` if it does not fit the
/// declared type.
fn encode_atomic(atomic: AtomicType, value: &Value) -> Option<B256> {
    match (atomic, value) {
        (AtomicType::Bool, Value::Bool(b)) => Some(B256::with_last_byte(u8::from(*b))),
        (AtomicType::Address, Value::Address(address)) => Some(address.into_word()),
        (AtomicType::String, Value::String(s)) => Some(keccak256(s.as_bytes())),
        (AtomicType::Bytes, Value::Bytes(bytes)) => Some(keccak256(bytes)),
        (AtomicType::FixedBytes(len), Value::FixedBytes(bytes)) => {
            fits_fixed_bytes(bytes, len).then(|| B256::right_padding_from(bytes))
        }
        (AtomicType::Uint(bits), Value::Uint(n)) => {
            fits_uint(n, bits).then(|| B256::from(n.to_be_bytes::<32>()))
        }
        (AtomicType::Int(bits), Value::Int(n)) => {
            fits_int(*n, bits).then(|| B256::from(n.into_raw().to_be_bytes::<32>()))
        }
        _ => None,
    }
}

/// Fails unless a fixed-length array (`Some(expected)`) has exactly
/// `expected` elements.
pub(crate) fn check_array_len(
    expected: Option<usize>,
    found: usize,
    path: &str,
) -> Result<(), SchemaError> {
    match expected {
        Some(expected) if expected != found => Err(SchemaError::ArrayLength {
            path: path.to_owned(),
            expected,
            found,
        }),
        _ => Ok(()),
    }
}

/// Whether `bytes` is a valid `bytes{len}` value.
pub(crate) fn fits_fixed_bytes(bytes: &[u8], len: usize) -> bool {
    bytes.len() == len
}

/// Whether `n` is representable as a `uint{bits}`.
pub(crate) fn fits_uint(n: &U256, bits: usize) -> bool {
    n.bit_len() <= bits
}

/// Whether `n` is representable as a two's complement integer of `bits`.
pub(crate) fn fits_int(n: I256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    let shift = 256 - bits;
    let raw: U256 = n.into_raw() << shift;
    I256::from_raw(raw).asr(shift) == n
}

fn atomic_name(atomic: AtomicType) -> String {
    match atomic {
        AtomicType::Bool => "bool".to_owned(),
        AtomicType::Address => "address".to_owned(),
        AtomicType::String => "string".to_owned(),
        AtomicType::Bytes => "bytes".to_owned(),
        AtomicType::FixedBytes(len) => format!("bytes{len}"),
        AtomicType::Uint(bits) => format!("uint{bits}"),
        AtomicType::Int(bits) => format!("int{bits}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use alloy_primitives::{address, b256, uint, Address, Bytes};

    use super::*;
    use crate::schema::Field;

    fn mail_schema() -> TypeSchema {
        TypeSchema::new(BTreeMap::from([
            (
                "Person".to_owned(),
                vec![Field::new("name", "string"), Field::new("wallet", "address")],
            ),
            (
                "Mail".to_owned(),
                vec![
                    Field::new("from", "Person"),
                    Field::new("to", "Person"),
                    Field::new("contents", "string"),
                ],
            ),
        ]))
        .unwrap()
    }

    fn mail() -> StructValue {
        StructValue::new()
            .with(
                "from",
                StructValue::new()
                    .with("name", "Cow")
                    .with("wallet", address!("CD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826")),
            )
            .with(
                "to",
                StructValue::new()
                    .with("name", "Bob")
                    .with("wallet", address!("bBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB")),
            )
            .with("contents", "Hello, Bob!")
    }

    #[test]
    fn mail_struct_hash() {
        let schema = mail_schema();
        let encoder = TypedDataEncoder::new(&schema);

        assert_eq!(
            encoder.struct_hash("Mail", &mail()).unwrap(),
            b256!("c52c0ee5d84264471806290a3f2c4cecfc5490626bf912d01f240d7a274b371e")
        );
    }

    #[test]
    fn struct_hash_is_deterministic() {
        let schema = mail_schema();
        let encoder = TypedDataEncoder::new(&schema);
        let first = encoder.struct_hash("Mail", &mail()).unwrap();
        let second = encoder.struct_hash("Mail", &mail()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn schema_order_drives_encoding() {
        let forward = TypeSchema::single(
            "Ticket",
            [Field::new("eventName", "string"), Field::new("price", "uint256")],
        )
        .unwrap();
        let reversed = TypeSchema::single(
            "Ticket",
            [Field::new("price", "uint256"), Field::new("eventName", "string")],
        )
        .unwrap();
        let a = StructValue::new().with("eventName", "EthDenver").with("price", 1u64);
        let b = StructValue::new().with("price", 1u64).with("eventName", "EthDenver");

        let forward_hash = TypedDataEncoder::new(&forward).struct_hash("Ticket", &a).unwrap();
        assert_eq!(
            forward_hash,
            TypedDataEncoder::new(&forward).struct_hash("Ticket", &b).unwrap()
        );
        assert_ne!(
            forward_hash,
            TypedDataEncoder::new(&reversed).struct_hash("Ticket", &a).unwrap()
        );
    }

    #[test]
    fn encodes_atomic_words() {
        let schema = mail_schema();
        let encoder = TypedDataEncoder::new(&schema);

        assert_eq!(
            encoder.encode_value("uint8", &Value::Uint(uint!(255_U256))).unwrap(),
            B256::with_last_byte(0xff)
        );
        assert_eq!(
            encoder.encode_value("int8", &Value::Int(I256::MINUS_ONE)).unwrap(),
            B256::repeat_byte(0xff)
        );
        assert_eq!(
            encoder.encode_value("bool", &Value::Bool(true)).unwrap(),
            B256::with_last_byte(1)
        );
        assert_eq!(
            encoder.encode_value("address", &Value::Address(Address::repeat_byte(0x11))).unwrap(),
            b256!("0000000000000000000000001111111111111111111111111111111111111111")
        );
        assert_eq!(
            encoder
                .encode_value("bytes2", &Value::FixedBytes(Bytes::from(vec![0xab, 0xcd])))
                .unwrap(),
            b256!("abcd000000000000000000000000000000000000000000000000000000000000")
        );
        assert_eq!(
            encoder.encode_value("bytes", &Value::Bytes(Bytes::new())).unwrap(),
            keccak256(b"")
        );
        assert_eq!(
            encoder.encode_value("string", &Value::from("Hello, Bob!")).unwrap(),
            keccak256("Hello, Bob!")
        );
    }

    #[test]
    fn arrays_hash_concatenated_elements() {
        let schema = mail_schema();
        let encoder = TypedDataEncoder::new(&schema);
        let values = Value::from(vec![1u64, 2u64]);

        let expected = hash_words(&[B256::with_last_byte(1), B256::with_last_byte(2)]);
        assert_eq!(encoder.encode_value("uint256[]", &values).unwrap(), expected);
        assert_eq!(encoder.encode_value("uint256[2]", &values).unwrap(), expected);

        let err = encoder.encode_value("uint256[3]", &values).unwrap_err();
        assert!(matches!(err, SchemaError::ArrayLength { expected: 3, found: 2, .. }));
    }

    #[test]
    fn nested_struct_is_replaced_by_its_hash() {
        let schema = mail_schema();
        let encoder = TypedDataEncoder::new(&schema);
        let person = StructValue::new().with("name", "Cow").with("wallet", Address::ZERO);

        assert_eq!(
            encoder.encode_value("Person", &Value::Struct(person.clone())).unwrap(),
            encoder.struct_hash("Person", &person).unwrap()
        );
    }

    #[test]
    fn rejects_values_outside_declared_types() {
        let schema = mail_schema();
        let encoder = TypedDataEncoder::new(&schema);

        let err = encoder.encode_value("uint8", &Value::Uint(uint!(256_U256))).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { expected, .. } if expected == "uint8"));

        let too_small = I256::try_from(-129i64).unwrap();
        assert!(encoder.encode_value("int8", &Value::Int(too_small)).is_err());
        let min = I256::try_from(-128i64).unwrap();
        assert!(encoder.encode_value("int8", &Value::Int(min)).is_ok());

        let err = encoder
            .encode_value("bytes2", &Value::FixedBytes(Bytes::from(vec![1])))
            .unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));

        let err = encoder.encode_value("string", &Value::Uint(U256::ZERO)).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));

        let err = encoder.encode_value("uint256", &Value::Int(I256::ZERO)).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));
    }

    #[test]
    fn rejects_missing_and_undeclared_fields() {
        let schema = mail_schema();
        let encoder = TypedDataEncoder::new(&schema);

        let full = mail();
        let incomplete: StructValue = full
            .names()
            .filter(|name| *name != "contents")
            .map(|name| (name, full.get(name).cloned().unwrap()))
            .collect();
        let err = encoder.struct_hash("Mail", &incomplete).unwrap_err();
        assert_eq!(err, SchemaError::MissingField("Mail.contents".to_owned()));

        let extended = mail().with("cc", "Alice");
        let err = encoder.struct_hash("Mail", &extended).unwrap_err();
        assert_eq!(err, SchemaError::UnexpectedField("Mail.cc".to_owned()));

        let bad_person = mail().with("to", StructValue::new().with("name", "Bob"));
        let err = encoder.struct_hash("Mail", &bad_person).unwrap_err();
        assert_eq!(err, SchemaError::MissingField("Mail.to.wallet".to_owned()));
    }
}
