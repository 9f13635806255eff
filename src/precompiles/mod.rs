//! Precompile registry (§2.9, §4.8): fixed low addresses `0x01..0x0a`,
//! each a gas-priced `input -> output` function implemented by the host
//! rather than bytecode. Revision gates the highest available address
//! (`Revision::max_precompile_address`, §6); membership below that bound
//! is the same across Istanbul..Cancun.

mod bn128;
mod modexp;
mod standard;

use bytes::Bytes;
use ethereum_types::Address;

/// Outcome of running a precompile (§4.8: "failure yields `success=false`
/// but consumes no gas beyond `required_gas`; insufficient supplied gas
/// yields `success=false` with zero gas left").
pub struct PrecompileOutcome {
    pub success: bool,
    pub output: Bytes,
    pub gas_left: u64,
}

fn fail(gas_left: u64) -> PrecompileOutcome {
    PrecompileOutcome {
        success: false,
        output: Bytes::new(),
        gas_left,
    }
}

fn ok(output: Vec<u8>, gas_left: u64) -> PrecompileOutcome {
    PrecompileOutcome {
        success: true,
        output: Bytes::from(output),
        gas_left,
    }
}

/// Gas required to run the precompile at `address` against `input`,
/// independent of whether the run itself would succeed.
fn required_gas(address: u8, input: &[u8]) -> u64 {
    match address {
        0x01 => standard::ECRECOVER_GAS,
        0x02 => standard::sha256_gas(input.len()),
        0x03 => standard::ripemd160_gas(input.len()),
        0x04 => standard::identity_gas(input.len()),
        0x05 => modexp::required_gas(input),
        0x06 => bn128::ECADD_GAS,
        0x07 => bn128::ECMUL_GAS,
        0x08 => bn128::ecpairing_gas(input.len()),
        0x09 => standard::blake2f_gas(input),
        0x0a => crate::common::constants::POINT_EVALUATION_GAS,
        _ => u64::MAX,
    }
}

fn execute(address: u8, input: &[u8]) -> Result<Vec<u8>, ()> {
    match address {
        0x01 => standard::ecrecover(input),
        0x02 => standard::sha256(input),
        0x03 => standard::ripemd160(input),
        0x04 => standard::identity(input),
        0x05 => modexp::modexp(input),
        0x06 => bn128::ec_add(input),
        0x07 => bn128::ec_mul(input),
        0x08 => bn128::ec_pairing(input),
        0x09 => standard::blake2f(input),
        0x0a => standard::point_evaluation(input),
        _ => Err(()),
    }
}

/// Runs the precompile at `address` with `gas_limit` available, per
/// §4.8's gas protocol.
pub fn run(address: &Address, input: &[u8], gas_limit: u64) -> PrecompileOutcome {
    let low = address.0[19];
    let needed = required_gas(low, input);
    if needed > gas_limit {
        return fail(0);
    }
    let remaining = gas_limit - needed;
    match execute(low, input) {
        Ok(output) => ok(output, remaining),
        Err(()) => fail(remaining),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_echoes_input_and_charges_linear_gas() {
        let addr = Address::from_low_u64_be(4);
        let input = vec![1u8, 2, 3, 4, 5];
        let outcome = run(&addr, &input, 100);
        assert!(outcome.success);
        assert_eq!(outcome.output.as_ref(), input.as_slice());
    }

    #[test]
    fn insufficient_gas_fails_with_nothing_left() {
        let addr = Address::from_low_u64_be(4);
        let outcome = run(&addr, &[0u8; 64], 1);
        assert!(!outcome.success);
        assert_eq!(outcome.gas_left, 0);
    }
}
