//! Chain-specific state-writer precompile (§4.9): a fixed-address
//! contract, callable only by a single authorized driver, that mutates
//! balance/code/storage/nonce directly via an ABI-selector dispatch.
//! There's no teacher or pack precedent for this one — it's chain-
//! specific by definition — so the dispatch shape is grounded on the
//! ordinary precompile registry in `precompiles/mod.rs` instead: gas is
//! computed up front, insufficient gas or a rejected caller both fail
//! with zero gas left, and a match drives the actual mutation.

use crate::common::constants::{
    CALL_VALUE_TRANSFER_GAS, CREATE_DATA_GAS, CREATE_GAS, MEMORY_GAS, SSTORE_SET_GAS,
};
use crate::context::TransactionContext;
use crate::world_state::WorldState;
use ethereum_types::{Address, U256};

// Selectors are the first four bytes of `Keccak256(signature)`, computed
// once offline and frozen here as literal constants (§4.9).
const SELECTOR_SET_BALANCE: [u8; 4] = hex_literal::hex!("e30443bc"); // setBalance(address,uint256)
const SELECTOR_COPY_CODE: [u8; 4] = hex_literal::hex!("d6a0c7af"); // copyCode(address,address)
const SELECTOR_SWAP_CODE: [u8; 4] = hex_literal::hex!("07690b2a"); // swapCode(address,address)
const SELECTOR_SET_STORAGE: [u8; 4] = hex_literal::hex!("8686997a"); // setStorage(address,uint256,uint256)
const SELECTOR_INC_NONCE: [u8; 4] = hex_literal::hex!("79bead38"); // incNonce(address,uint256)

pub struct StateWriterOutcome {
    pub success: bool,
    pub gas_left: u64,
}

fn fail(gas_left: u64) -> StateWriterOutcome {
    StateWriterOutcome {
        success: false,
        gas_left,
    }
}

fn ok(gas_left: u64) -> StateWriterOutcome {
    StateWriterOutcome {
        success: true,
        gas_left,
    }
}

/// Reads the `index`-th 32-byte ABI word, zero-padded past the end of
/// `input` (§4.9 "positional with left-zero-padding").
fn word(input: &[u8], index: usize) -> [u8; 32] {
    let mut buf = [0u8; 32];
    let start = index * 32;
    if start >= input.len() {
        return buf;
    }
    let available = (input.len() - start).min(32);
    buf[..available].copy_from_slice(&input[start..start + available]);
    buf
}

fn address_word(input: &[u8], index: usize) -> Address {
    Address::from_slice(&word(input, index)[12..])
}

fn u256_word(input: &[u8], index: usize) -> U256 {
    U256::from_big_endian(&word(input, index))
}

/// Dispatches a call to the state-writer. `input` is the full call data:
/// a 4-byte selector followed by its ABI-encoded arguments. Rejects
/// every caller but `authorized_driver` (§4.9, §8 "State-writer reject").
pub fn dispatch<W: WorldState>(
    ctx: &mut TransactionContext<W>,
    caller: Address,
    authorized_driver: Address,
    input: &[u8],
    gas: u64,
) -> StateWriterOutcome {
    if caller != authorized_driver {
        return fail(0);
    }
    if input.len() < 4 {
        return fail(0);
    }
    let selector: [u8; 4] = input[0..4].try_into().expect("checked len above");
    let args = &input[4..];

    match selector {
        SELECTOR_SET_BALANCE => set_balance(ctx, caller, args, gas),
        SELECTOR_COPY_CODE => copy_code(ctx, args, gas),
        SELECTOR_SWAP_CODE => swap_code(ctx, args, gas),
        SELECTOR_SET_STORAGE => set_storage(ctx, args, gas),
        SELECTOR_INC_NONCE => inc_nonce(ctx, caller, args, gas),
        _ => fail(0),
    }
}

fn set_balance<W: WorldState>(
    ctx: &mut TransactionContext<W>,
    caller: Address,
    args: &[u8],
    gas: u64,
) -> StateWriterOutcome {
    let target = address_word(args, 0);
    if target == caller {
        return fail(0);
    }
    if CALL_VALUE_TRANSFER_GAS > gas {
        return fail(0);
    }
    let value = u256_word(args, 1);
    ctx.set_balance(&target, value);
    ok(gas - CALL_VALUE_TRANSFER_GAS)
}

fn copy_code<W: WorldState>(
    ctx: &mut TransactionContext<W>,
    args: &[u8],
    gas: u64,
) -> StateWriterOutcome {
    let to = address_word(args, 0);
    let from = address_word(args, 1);
    let code = ctx.get_code(&from);
    let cost = CREATE_GAS + code.len() as u64 * (CREATE_DATA_GAS + MEMORY_GAS);
    if cost > gas {
        return fail(0);
    }
    ctx.set_code(&to, code);
    ok(gas - cost)
}

fn swap_code<W: WorldState>(
    ctx: &mut TransactionContext<W>,
    args: &[u8],
    gas: u64,
) -> StateWriterOutcome {
    let a = address_word(args, 0);
    let b = address_word(args, 1);
    let code_a = ctx.get_code(&a);
    let code_b = ctx.get_code(&b);
    let per_byte = CREATE_DATA_GAS + MEMORY_GAS;
    let cost = 2 * CREATE_GAS + (code_a.len() + code_b.len()) as u64 * per_byte / 2;
    if cost > gas {
        return fail(0);
    }
    ctx.set_code(&a, code_b);
    ctx.set_code(&b, code_a);
    ok(gas - cost)
}

fn set_storage<W: WorldState>(
    ctx: &mut TransactionContext<W>,
    args: &[u8],
    gas: u64,
) -> StateWriterOutcome {
    if SSTORE_SET_GAS > gas {
        return fail(0);
    }
    let target = address_word(args, 0);
    let key = u256_word(args, 1);
    let value = u256_word(args, 2);
    ctx.set_storage(target, key, value);
    ok(gas - SSTORE_SET_GAS)
}

/// `value` must land in `(0, 256)`: large enough to mean something,
/// small enough that nonce exhaustion isn't a single call away (§4.9).
fn inc_nonce<W: WorldState>(
    ctx: &mut TransactionContext<W>,
    caller: Address,
    args: &[u8],
    gas: u64,
) -> StateWriterOutcome {
    let target = address_word(args, 0);
    if target == caller {
        return fail(0);
    }
    let delta = u256_word(args, 1);
    if delta.is_zero() || delta >= U256::from(256) {
        return fail(0);
    }
    if CALL_VALUE_TRANSFER_GAS > gas {
        return fail(0);
    }
    let current = ctx.get_nonce(&target);
    ctx.set_nonce(&target, current + delta);
    ok(gas - CALL_VALUE_TRANSFER_GAS)
}
