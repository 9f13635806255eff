//! The fixed-cost and per-word-cost precompiles: `ecrecover`, `sha256`,
//! `ripemd160`, `identity`, `blake2f`, and Cancun's point-evaluation
//! (§4.8). Hashing is consumed from `sha2`/`ripemd`, matching the
//! teacher's use of `sha3` for the same kind of "consumed as a library"
//! primitive (§1).

use ethereum_types::{H256, U256};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

fn word_count(len: usize) -> u64 {
    ((len + 31) / 32) as u64
}

pub const ECRECOVER_GAS: u64 = 3000;

pub fn sha256_gas(len: usize) -> u64 {
    60 + 12 * word_count(len)
}

pub fn ripemd160_gas(len: usize) -> u64 {
    600 + 120 * word_count(len)
}

pub fn identity_gas(len: usize) -> u64 {
    15 + 3 * word_count(len)
}

/// Precompile 0x01. Input: `hash(32) || v(32) || r(32) || s(32)`. Output:
/// the recovered address, left-padded to 32 bytes, or empty on failure
/// (malformed `v`, invalid signature) — a failed recovery is *not* the
/// same as a failed precompile call; it returns an empty success output.
pub fn ecrecover(input: &[u8]) -> Result<Vec<u8>, ()> {
    let mut buf = [0u8; 128];
    let n = input.len().min(128);
    buf[..n].copy_from_slice(&input[..n]);

    let hash = H256::from_slice(&buf[0..32]);
    let v = U256::from_big_endian(&buf[32..64]);
    let r = U256::from_big_endian(&buf[64..96]);
    let s = U256::from_big_endian(&buf[96..128]);

    if v != U256::from(27) && v != U256::from(28) {
        return Ok(Vec::new());
    }
    let recovery_id = (v.as_u32() - 27) as u8;

    match crate::common::crypto::recover_address(hash, r, s, recovery_id) {
        Some(address) => {
            let mut out = vec![0u8; 32];
            out[12..].copy_from_slice(address.as_bytes());
            Ok(out)
        }
        None => Ok(Vec::new()),
    }
}

pub fn sha256(input: &[u8]) -> Result<Vec<u8>, ()> {
    Ok(Sha256::digest(input).to_vec())
}

pub fn ripemd160(input: &[u8]) -> Result<Vec<u8>, ()> {
    let digest = Ripemd160::digest(input);
    let mut out = vec![0u8; 32];
    out[12..].copy_from_slice(&digest);
    Ok(out)
}

pub fn identity(input: &[u8]) -> Result<Vec<u8>, ()> {
    Ok(input.to_vec())
}

/// Precompile 0x09 (EIP-152): `rounds(4) || h(64) || m(128) || t(16) ||
/// f(1)`. `required_gas` is the round count itself; `f` must be `0` or
/// `1`.
pub fn blake2f_gas(input: &[u8]) -> u64 {
    if input.len() != 213 {
        return u64::MAX;
    }
    u32::from_be_bytes([input[0], input[1], input[2], input[3]]) as u64
}

pub fn blake2f(input: &[u8]) -> Result<Vec<u8>, ()> {
    if input.len() != 213 {
        return Err(());
    }
    let rounds = u32::from_be_bytes([input[0], input[1], input[2], input[3]]);
    let mut h = [0u64; 8];
    for (i, chunk) in input[4..68].chunks_exact(8).enumerate() {
        h[i] = u64::from_le_bytes(chunk.try_into().unwrap());
    }
    let mut m = [0u64; 16];
    for (i, chunk) in input[68..196].chunks_exact(8).enumerate() {
        m[i] = u64::from_le_bytes(chunk.try_into().unwrap());
    }
    let t = [
        u64::from_le_bytes(input[196..204].try_into().unwrap()),
        u64::from_le_bytes(input[204..212].try_into().unwrap()),
    ];
    let final_block = match input[212] {
        0 => false,
        1 => true,
        _ => return Err(()),
    };

    blake2b_f(rounds, &mut h, &m, t, final_block);

    let mut out = Vec::with_capacity(64);
    for word in h {
        out.extend_from_slice(&word.to_le_bytes());
    }
    Ok(out)
}

const IV: [u64; 8] = [
    0x6a09e667f3bcc908,
    0xbb67ae8584caa73b,
    0x3c6ef372fe94f82b,
    0xa54ff53a5f1d36f1,
    0x510e527fade682d1,
    0x9b05688c2b3e6c1f,
    0x1f83d9abfb41bd6b,
    0x5be0cd19137e2179,
];

const SIGMA: [[usize; 16]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
];

/// The raw BLAKE2b compression function `F`, hand-written per EIP-152:
/// the `blake2` crate exposes only the full hash, not this primitive, so
/// there is no off-the-shelf crate to delegate to here (unlike
/// `sha2`/`ripemd` above).
fn blake2b_f(rounds: u32, h: &mut [u64; 8], m: &[u64; 16], t: [u64; 2], final_block: bool) {
    let mut v = [0u64; 16];
    v[..8].copy_from_slice(h);
    v[8..].copy_from_slice(&IV);
    v[12] ^= t[0];
    v[13] ^= t[1];
    if final_block {
        v[14] = !v[14];
    }

    fn g(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize, x: u64, y: u64) {
        v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
        v[d] = (v[d] ^ v[a]).rotate_right(32);
        v[c] = v[c].wrapping_add(v[d]);
        v[b] = (v[b] ^ v[c]).rotate_right(24);
        v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
        v[d] = (v[d] ^ v[a]).rotate_right(16);
        v[c] = v[c].wrapping_add(v[d]);
        v[b] = (v[b] ^ v[c]).rotate_right(63);
    }

    for round in 0..rounds as usize {
        let s = &SIGMA[round % 10];
        g(&mut v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
        g(&mut v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
        g(&mut v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
        g(&mut v, 3, 7, 11, 15, m[s[6]], m[s[7]]);
        g(&mut v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
        g(&mut v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
        g(&mut v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
        g(&mut v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
    }

    for i in 0..8 {
        h[i] ^= v[i] ^ v[i + 8];
    }
}

/// Precompile 0x0a (EIP-4844): `versioned_hash(32) || z(32) || y(32) ||
/// commitment(48) || proof(48)`. Verifies the KZG opening and returns the
/// fixed `FIELD_ELEMENTS_PER_BLOB || BLS_MODULUS` pair on success.
pub fn point_evaluation(input: &[u8]) -> Result<Vec<u8>, ()> {
    if input.len() != 192 {
        return Err(());
    }
    let versioned_hash = &input[0..32];
    let z = &input[32..64];
    let y = &input[64..96];
    let commitment = &input[96..144];
    let proof = &input[144..192];

    kzg_rs::verify_kzg_proof(commitment, z, y, proof, versioned_hash).map_err(|_| ())?;

    const FIELD_ELEMENTS_PER_BLOB: u64 = 4096;
    const BLS_MODULUS: [u8; 32] = hex_literal::hex!(
        "73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001"
    );
    let mut out = vec![0u8; 64];
    out[24..32].copy_from_slice(&FIELD_ELEMENTS_PER_BLOB.to_be_bytes());
    out[32..].copy_from_slice(&BLS_MODULUS);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2f_zero_rounds_is_identity_on_state() {
        let mut input = [0u8; 213];
        // h = IV so the compression of zero rounds, non-final, just XORs
        // h with itself ^ IV halves per the spec structure; here we only
        // assert it runs without panicking and returns 64 bytes.
        input[212] = 0;
        let out = blake2f(&input).unwrap();
        assert_eq!(out.len(), 64);
    }

    #[test]
    fn blake2f_rejects_bad_final_flag() {
        let mut input = [0u8; 213];
        input[212] = 2;
        assert!(blake2f(&input).is_err());
    }

    #[test]
    fn sha256_gas_rounds_up_to_whole_words() {
        assert_eq!(sha256_gas(1), 60 + 12);
        assert_eq!(sha256_gas(32), 60 + 12);
        assert_eq!(sha256_gas(33), 60 + 24);
    }
}
