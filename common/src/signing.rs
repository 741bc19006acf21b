use alloy_primitives::{keccak256, uint, Address, Signature, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::error::{Error, Result, SignatureError};

/// Prefix for ERC-191 version `0x01`, emitted before every typed-data digest.
pub const TYPED_DATA_PREFIX: [u8; 2] = [0x19, 0x01];

/// Length of an `r ‖ s ‖ v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Upper bound for the `s` value of a canonical signature (secp256k1n / 2).
pub const SIGNATURE_S_UPPER_BOUND: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// Order of the secp256k1 group.
const SECP256K1_N: U256 =
    uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

/// A key holder able to sign an arbitrary 32-byte digest.
///
/// The digest is signed as is, never hashed again.
pub trait DigestSigner {
    /// Address derived from the signing key.
    fn address(&self) -> Address;

    /// Signs `digest`, returning a low-s signature.
    fn sign_digest(&self, digest: &B256) -> Result<Signature>;
}

impl DigestSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }

    fn sign_digest(&self, digest: &B256) -> Result<Signature> {
        let signature = self
            .sign_hash_sync(digest)
            .map_err(|e| Error::Signing(e.to_string()))?;
        Ok(normalize_s(signature))
    }
}

/// Returns `keccak256(0x1901 ‖ domain_separator ‖ struct_hash)`, the digest
/// signed for EIP-712 typed data.
pub fn typed_data_hash(domain_separator: &B256, struct_hash: &B256) -> B256 {
    let mut preimage = [0u8; 66];
    preimage[..2].copy_from_slice(&TYPED_DATA_PREFIX);
    preimage[2..34].copy_from_slice(domain_separator.as_slice());
    preimage[34..].copy_from_slice(struct_hash.as_slice());
    keccak256(preimage)
}

/// Signs `digest` with `signer`.
pub fn sign(digest: &B256, signer: &impl DigestSigner) -> Result<Signature> {
    signer.sign_digest(digest)
}

/// Maps a signature with `s` in the upper half order onto its canonical
/// low-s twin, flipping the parity.
pub fn normalize_s(signature: Signature) -> Signature {
    if signature.s() > SIGNATURE_S_UPPER_BOUND {
        Signature::new(signature.r(), SECP256K1_N - signature.s(), !signature.v())
    } else {
        signature
    }
}

/// Parses a 65-byte `r ‖ s ‖ v` signature. `v` may be 0/1 or 27/28.
///
/// Signatures with `s` in the upper half order are rejected so that each
/// signature has a single valid encoding.
pub fn parse_signature(bytes: &[u8]) -> Result<Signature> {
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidLength(bytes.len()).into());
    }
    let y_parity = match bytes[64] {
        0 | 27 => false,
        1 | 28 => true,
        v => return Err(SignatureError::InvalidV(v).into()),
    };
    let r = U256::from_be_slice(&bytes[..32]);
    let s = U256::from_be_slice(&bytes[32..64]);
    if s > SIGNATURE_S_UPPER_BOUND {
        return Err(SignatureError::HighS(s).into());
    }
    Ok(Signature::new(r, s, y_parity))
}

/// Recovers the address that signed `digest`.
///
/// The result is an unauthenticated claim: compare it with the expected
/// authority, or use [`verify_signer`].
pub fn recover(digest: &B256, signature: &[u8]) -> Result<Address> {
    let signature = parse_signature(signature)?;
    let recovered = signature
        .recover_address_from_prehash(digest)
        .map_err(|e| SignatureError::Recovery(e.to_string()))?;
    if recovered.is_zero() {
        return Err(SignatureError::ZeroAddress.into());
    }
    Ok(recovered)
}

/// Recovers the signer of `digest` and checks it against `expected`.
pub fn verify_signer(digest: &B256, signature: &[u8], expected: Address) -> Result<()> {
    let signer = recover(digest, signature)?;
    if signer != expected {
        return Err(Error::InvalidSigner { signer, expected });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256};

    use super::*;
    use crate::test_utils::{other_account, owner};

    const MAIL_DIGEST: B256 =
        b256!("be609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2");

    fn mail_signature() -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SIGNATURE_LENGTH);
        bytes.extend_from_slice(
            b256!("4355c47d63924e8a72e509b65029052eb6c299d53a04e167c5775fd466751c9d").as_slice(),
        );
        bytes.extend_from_slice(
            b256!("07299936d304c153f6443dfa05f40ff007d72911b6f72307f996231605b91562").as_slice(),
        );
        bytes.push(28);
        bytes
    }

    #[test]
    fn typed_data_prefix_and_layout() {
        // TYPE_HASH as domain separator, bytes32("stylus") as struct hash.
        let domain_separator =
            b256!("8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f");
        let struct_hash =
            b256!("7379746c75730000000000000000000000000000000000000000000000000000");
        let expected =
            b256!("cefc47137f8165d8270433dd62e395f5672966b83a113a7bb7b2805730a2197e");

        assert_eq!(typed_data_hash(&domain_separator, &struct_hash), expected);
    }

    #[test]
    fn recovers_mail_signer() {
        let signer = recover(&MAIL_DIGEST, &mail_signature()).unwrap();
        assert_eq!(signer, address!("CD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"));
    }

    #[test]
    fn accepts_zero_based_v() {
        let mut signature = mail_signature();
        signature[64] = 1;
        assert_eq!(
            recover(&MAIL_DIGEST, &signature).unwrap(),
            address!("CD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826")
        );
    }

    #[test]
    fn sign_then_recover() {
        for signer in [owner(), other_account()] {
            for digest in [B256::ZERO, B256::repeat_byte(0x42), MAIL_DIGEST] {
                let signature = sign(&digest, &signer).unwrap();
                assert!(signature.s() <= SIGNATURE_S_UPPER_BOUND);
                assert_eq!(
                    recover(&digest, &signature.as_bytes()).unwrap(),
                    DigestSigner::address(&signer)
                );
            }
        }
    }

    #[test]
    fn rejects_malformed_signatures() {
        let signature = mail_signature();

        let err = recover(&MAIL_DIGEST, &signature[..64]).unwrap_err();
        assert_eq!(err, Error::InvalidSignature(SignatureError::InvalidLength(64)));

        let mut longer = signature.clone();
        longer.push(0);
        let err = recover(&MAIL_DIGEST, &longer).unwrap_err();
        assert_eq!(err, Error::InvalidSignature(SignatureError::InvalidLength(66)));

        let mut bad_v = signature.clone();
        bad_v[64] = 29;
        let err = recover(&MAIL_DIGEST, &bad_v).unwrap_err();
        assert_eq!(err, Error::InvalidSignature(SignatureError::InvalidV(29)));

        let mut zero_r = signature;
        zero_r[..32].fill(0);
        let err = recover(&MAIL_DIGEST, &zero_r).unwrap_err();
        assert!(matches!(err, Error::InvalidSignature(SignatureError::Recovery(_))));
    }

    #[test]
    fn rejects_high_s_and_normalizes_it() {
        let canonical = parse_signature(&mail_signature()).unwrap();
        let high_s = Signature::new(canonical.r(), SECP256K1_N - canonical.s(), !canonical.v());

        let err = recover(&MAIL_DIGEST, &high_s.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSignature(SignatureError::HighS(SECP256K1_N - canonical.s()))
        );
        assert_eq!(normalize_s(high_s), canonical);
    }

    #[test]
    fn verify_signer_rejects_other_keys() {
        let signature = sign(&MAIL_DIGEST, &other_account()).unwrap();
        let err = verify_signer(&MAIL_DIGEST, &signature.as_bytes(), owner().address())
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSigner {
                signer: other_account().address(),
                expected: owner().address(),
            }
        );

        let signature = sign(&MAIL_DIGEST, &owner()).unwrap();
        verify_signer(&MAIL_DIGEST, &signature.as_bytes(), owner().address()).unwrap();
    }
}
