//! Thin wrappers around the consumed cryptographic primitives (§1: keccak and
//! curve operations are "consumed as a library", not re-implemented here).

use ethereum_types::{Address, H256, U256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

/// `keccak256` over an arbitrary byte slice.
pub fn keccak256(data: &[u8]) -> H256 {
    H256::from_slice(&Keccak256::digest(data))
}

/// Derive the 20-byte Ethereum address from an uncompressed secp256k1
/// public key: the low 20 bytes of `keccak256(pubkey_x || pubkey_y)`.
pub fn public_key_to_address(pubkey: &VerifyingKey) -> Address {
    let encoded = pubkey.to_encoded_point(false);
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Recover the signer address of `msg_hash` given an ECDSA signature in
/// (r, s, recovery-id) form. Used by precompile 0x01 (`ecrecover`) and by
/// the conformance harness's fixture loader to turn a secret key into a
/// sender address.
pub fn recover_address(msg_hash: H256, r: U256, s: U256, recovery_id: u8) -> Option<Address> {
    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&r.to_big_endian());
    sig_bytes[32..].copy_from_slice(&s.to_big_endian());
    let signature = Signature::try_from(&sig_bytes[..]).ok()?;
    let recovery_id = RecoveryId::try_from(recovery_id).ok()?;
    let recovered = VerifyingKey::recover_from_prehash(msg_hash.as_bytes(), &signature, recovery_id).ok()?;
    Some(public_key_to_address(&recovered))
}

/// Sign a pre-hashed message, used only by the conformance harness to turn
/// a test fixture's secret key into a signed transaction sender.
pub fn sign_prehash(msg_hash: H256, signing_key: &SigningKey) -> (H256, H256, u8) {
    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash_recoverable(msg_hash.as_bytes())
        .expect("signing a 32-byte prehash cannot fail");
    let bytes = signature.to_bytes();
    (
        H256::from_slice(&bytes[..32]),
        H256::from_slice(&bytes[32..]),
        recovery_id.to_byte(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use k256::SecretKey;

    #[test]
    fn recovers_address_signed_with_matching_key() {
        let secret_key_bytes =
            hex!("94b3cfc00cc864b9551741db8389388aa51ba3110b47f502553d07a8d3da0e6");
        let secret_key = SecretKey::from_bytes((&secret_key_bytes).into()).unwrap();
        let signing_key = SigningKey::from(secret_key);
        let expected_address = public_key_to_address(signing_key.verifying_key());

        let msg_hash = keccak256(b"example message");
        let (r, s, v) = sign_prehash(msg_hash, &signing_key);

        let recovered = recover_address(
            msg_hash,
            U256::from_big_endian(r.as_bytes()),
            U256::from_big_endian(s.as_bytes()),
            v,
        )
        .expect("recovery should succeed");

        assert_eq!(recovered, expected_address);
    }
}
