//! Precompiles 0x06-0x08: alt_bn128 curve operations (EIP-196/197/1108).
//! Curve arithmetic is consumed from `substrate-bn` rather than
//! re-implemented, per §1's "cryptographic primitives ... consumed as a
//! library" policy.

use bn::{AffineG1, AffineG2, Fq, Fq2, Group, G1, G2};

pub const ECADD_GAS: u64 = 150;
pub const ECMUL_GAS: u64 = 6000;

const PAIRING_BASE_GAS: u64 = 45000;
const PAIRING_PER_POINT_GAS: u64 = 34000;

pub fn ecpairing_gas(input_len: usize) -> u64 {
    let points = (input_len / 192) as u64;
    PAIRING_BASE_GAS + PAIRING_PER_POINT_GAS * points
}

fn padded(input: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    if offset >= input.len() {
        return out;
    }
    let available = (input.len() - offset).min(len);
    out[..available].copy_from_slice(&input[offset..offset + available]);
    out
}

fn read_g1(input: &[u8], offset: usize) -> Result<G1, ()> {
    let x_bytes = padded(input, offset, 32);
    let y_bytes = padded(input, offset + 32, 32);
    let x = Fq::from_slice(&x_bytes).map_err(|_| ())?;
    let y = Fq::from_slice(&y_bytes).map_err(|_| ())?;
    if x.is_zero() && y.is_zero() {
        Ok(G1::zero())
    } else {
        Ok(AffineG1::new(x, y).map_err(|_| ())?.into())
    }
}

fn read_g2(input: &[u8], offset: usize) -> Result<G2, ()> {
    let x1 = Fq::from_slice(&padded(input, offset, 32)).map_err(|_| ())?;
    let x0 = Fq::from_slice(&padded(input, offset + 32, 32)).map_err(|_| ())?;
    let y1 = Fq::from_slice(&padded(input, offset + 64, 32)).map_err(|_| ())?;
    let y0 = Fq::from_slice(&padded(input, offset + 96, 32)).map_err(|_| ())?;
    let x = Fq2::new(x0, x1);
    let y = Fq2::new(y0, y1);
    if x.is_zero() && y.is_zero() {
        Ok(G2::zero())
    } else {
        Ok(AffineG2::new(x, y).map_err(|_| ())?.into())
    }
}

fn write_g1(point: G1) -> Vec<u8> {
    let mut out = vec![0u8; 64];
    if let Some(affine) = AffineG1::from_jacobian(point) {
        affine.x().to_big_endian(&mut out[0..32]).ok();
        affine.y().to_big_endian(&mut out[32..64]).ok();
    }
    out
}

pub fn ec_add(input: &[u8]) -> Result<Vec<u8>, ()> {
    let a = read_g1(input, 0)?;
    let b = read_g1(input, 64)?;
    Ok(write_g1(a + b))
}

pub fn ec_mul(input: &[u8]) -> Result<Vec<u8>, ()> {
    let point = read_g1(input, 0)?;
    let scalar_bytes = padded(input, 64, 32);
    let scalar = bn::Fr::from_slice(&scalar_bytes).map_err(|_| ())?;
    Ok(write_g1(point * scalar))
}

pub fn ec_pairing(input: &[u8]) -> Result<Vec<u8>, ()> {
    if input.len() % 192 != 0 {
        return Err(());
    }
    let pairs = input.len() / 192;
    let mut elements = Vec::with_capacity(pairs);
    for i in 0..pairs {
        let offset = i * 192;
        let g1 = read_g1(input, offset)?;
        let g2 = read_g2(input, offset + 64)?;
        elements.push((g1, g2));
    }

    let result = bn::pairing_batch(&elements);
    let success = result == bn::Gt::one();

    let mut out = vec![0u8; 32];
    if success {
        out[31] = 1;
    }
    Ok(out)
}
