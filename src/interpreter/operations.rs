//! Per-opcode dispatch (§4.5): `step` advances the interpreter by exactly
//! one instruction — charge gas, touch stack/memory, optionally call out
//! through [`Host`] — and leaves `pc` pointing at the next instruction
//! (or leaves `status` no longer `Running`).

use crate::call::{CallKind, CallParams};
use crate::common::constants::*;
use crate::common::crypto::keccak256;
use crate::common::errors::EvmError;
use crate::interpreter::gas_table::sstore_cost_and_refund;
use crate::interpreter::host::{ExecutionEnv, Host};
use crate::interpreter::opcodes;
use crate::interpreter::{Interpreter, Status};
use crate::primitives;
use bytes::Bytes;
use ethereum_types::{Address, U256};

type StepResult = Result<(), EvmError>;

/// Runs exactly one instruction. Gas is always charged before state is
/// touched, so a failing charge never leaves a partial mutation behind.
pub fn step(interp: &mut Interpreter, env: &ExecutionEnv, host: &mut dyn Host) -> StepResult {
    let op = env.code.opcode_at(interp.pc);
    let mut jump_to: Option<usize> = None;

    match op {
        opcodes::STOP => {
            interp.status = Status::Stopped;
        }

        // --- Arithmetic (§4.1, §4.5) ---------------------------------
        opcodes::ADD => binop(interp, GAS_VERY_LOW, |a, b| a.overflowing_add(b).0)?,
        opcodes::MUL => binop(interp, GAS_LOW, |a, b| a.overflowing_mul(b).0)?,
        opcodes::SUB => binop(interp, GAS_VERY_LOW, |a, b| a.overflowing_sub(b).0)?,
        opcodes::DIV => binop(interp, GAS_LOW, |a, b| {
            if b.is_zero() {
                U256::zero()
            } else {
                a / b
            }
        })?,
        opcodes::SDIV => binop(interp, GAS_LOW, primitives::sdiv)?,
        opcodes::MOD => binop(interp, GAS_LOW, |a, b| {
            if b.is_zero() {
                U256::zero()
            } else {
                a % b
            }
        })?,
        opcodes::SMOD => binop(interp, GAS_LOW, primitives::smod)?,
        opcodes::ADDMOD => triop(interp, GAS_MID, |a, b, m| {
            if m.is_zero() {
                U256::zero()
            } else {
                add_mod(a, b, m)
            }
        })?,
        opcodes::MULMOD => triop(interp, GAS_MID, |a, b, m| {
            if m.is_zero() {
                U256::zero()
            } else {
                mul_mod(a, b, m)
            }
        })?,
        opcodes::EXP => {
            let exponent = interp.stack.peek(1)?;
            interp
                .gas
                .charge(GAS_EXP + EXP_BYTE_GAS * primitives::byte_len(exponent))?;
            let exponent = interp.stack.pop()?;
            let base = interp.stack.pop()?;
            interp.stack.push(primitives::exp(base, exponent))?;
        }
        opcodes::SIGNEXTEND => binop(interp, GAS_LOW, primitives::signextend)?,

        // --- Comparison / bitwise -------------------------------------
        opcodes::LT => binop(interp, GAS_VERY_LOW, |a, b| bool_u256(a < b))?,
        opcodes::GT => binop(interp, GAS_VERY_LOW, |a, b| bool_u256(a > b))?,
        opcodes::SLT => binop(interp, GAS_VERY_LOW, |a, b| bool_u256(primitives::slt(a, b)))?,
        opcodes::SGT => binop(interp, GAS_VERY_LOW, |a, b| bool_u256(primitives::sgt(a, b)))?,
        opcodes::EQ => binop(interp, GAS_VERY_LOW, |a, b| bool_u256(a == b))?,
        opcodes::ISZERO => unop(interp, GAS_VERY_LOW, |a| bool_u256(a.is_zero()))?,
        opcodes::AND => binop(interp, GAS_VERY_LOW, |a, b| a & b)?,
        opcodes::OR => binop(interp, GAS_VERY_LOW, |a, b| a | b)?,
        opcodes::XOR => binop(interp, GAS_VERY_LOW, |a, b| a ^ b)?,
        opcodes::NOT => unop(interp, GAS_VERY_LOW, |a| !a)?,
        opcodes::BYTE => binop(interp, GAS_VERY_LOW, |i, v| primitives::byte(i, v))?,
        opcodes::SHL => binop(interp, GAS_VERY_LOW, primitives::shl)?,
        opcodes::SHR => binop(interp, GAS_VERY_LOW, primitives::shr)?,
        opcodes::SAR => binop(interp, GAS_VERY_LOW, primitives::sar)?,

        opcodes::KECCAK256 => {
            let offset = pop_usize(interp)?;
            let len = pop_usize(interp)?;
            charge_memory(interp, offset, len)?;
            interp
                .gas
                .charge(KECCAK256_BASE_GAS + KECCAK256_WORD_GAS * words(len))?;
            let data = interp.memory.read(offset, len);
            let hash = keccak256(&data);
            interp.stack.push(U256::from_big_endian(hash.as_bytes()))?;
        }

        // --- Environment (§4.5, §6) -----------------------------------
        opcodes::ADDRESS => push_const(interp, GAS_BASE, address_to_u256(env.address))?,
        opcodes::BALANCE => {
            let address = pop_address(interp)?;
            charge_account_access(interp, env, host, address)?;
            interp.stack.push(host.get_balance(&address))?;
        }
        opcodes::ORIGIN => push_const(interp, GAS_BASE, address_to_u256(env.origin))?,
        opcodes::CALLER => push_const(interp, GAS_BASE, address_to_u256(env.caller))?,
        opcodes::CALLVALUE => push_const(interp, GAS_BASE, env.value)?,
        opcodes::CALLDATALOAD => {
            interp.gas.charge(GAS_VERY_LOW)?;
            let offset = pop_usize(interp)?;
            interp
                .stack
                .push(U256::from_big_endian(&read_padded(&env.calldata, offset, 32)))?;
        }
        opcodes::CALLDATASIZE => push_const(interp, GAS_BASE, U256::from(env.calldata.len()))?,
        opcodes::CALLDATACOPY => copy_to_memory(interp, &env.calldata)?,
        opcodes::CODESIZE => push_const(interp, GAS_BASE, U256::from(env.code.len()))?,
        opcodes::CODECOPY => copy_to_memory(interp, env.code.as_slice())?,
        opcodes::GASPRICE => push_const(interp, GAS_BASE, env.gas_price)?,
        opcodes::EXTCODESIZE => {
            let address = pop_address(interp)?;
            charge_account_access(interp, env, host, address)?;
            interp.stack.push(U256::from(host.get_code_size(&address)))?;
        }
        opcodes::EXTCODECOPY => {
            let address = pop_address(interp)?;
            charge_account_access(interp, env, host, address)?;
            let code = host.get_code(&address);
            copy_to_memory(interp, &code)?;
        }
        opcodes::RETURNDATASIZE => push_const(interp, GAS_BASE, U256::from(interp.return_data.len()))?,
        opcodes::RETURNDATACOPY => {
            interp.gas.charge(GAS_VERY_LOW)?;
            let dest_offset = pop_usize(interp)?;
            let offset = pop_usize(interp)?;
            let len = pop_usize(interp)?;
            let end = offset.checked_add(len).ok_or(EvmError::ReturnDataOutOfBounds)?;
            if end > interp.return_data.len() {
                return Err(EvmError::ReturnDataOutOfBounds);
            }
            interp.gas.charge(COPY_WORD_GAS * words(len))?;
            charge_memory(interp, dest_offset, len)?;
            let data = interp.return_data[offset..end].to_vec();
            interp.memory.write(dest_offset, &data);
        }
        opcodes::EXTCODEHASH => {
            let address = pop_address(interp)?;
            charge_account_access(interp, env, host, address)?;
            let value = if host.account_exists(&address) {
                U256::from_big_endian(host.get_code_hash(&address).as_bytes())
            } else {
                U256::zero()
            };
            interp.stack.push(value)?;
        }

        opcodes::BLOCKHASH => {
            interp.gas.charge(BLOCKHASH_GAS)?;
            let number = interp.stack.pop()?;
            let hash = host.block_hash(number);
            interp.stack.push(U256::from_big_endian(hash.as_bytes()))?;
        }
        opcodes::COINBASE => push_const(interp, GAS_BASE, address_to_u256(env.block.coinbase))?,
        opcodes::TIMESTAMP => push_const(interp, GAS_BASE, env.block.timestamp)?,
        opcodes::NUMBER => push_const(interp, GAS_BASE, env.block.number)?,
        opcodes::PREVRANDAO => {
            push_const(interp, GAS_BASE, U256::from_big_endian(env.block.prev_randao.as_bytes()))?
        }
        opcodes::GASLIMIT => push_const(interp, GAS_BASE, env.block.gas_limit)?,
        opcodes::CHAINID => push_const(interp, GAS_BASE, env.block.chain_id)?,
        opcodes::SELFBALANCE => {
            interp.gas.charge(GAS_SELFBALANCE)?;
            interp.stack.push(host.get_balance(&env.address))?;
        }
        opcodes::BASEFEE => {
            if !env.revision.has_basefee() {
                return Err(EvmError::InvalidOpcode);
            }
            push_const(interp, GAS_BASE, env.block.base_fee)?
        }
        opcodes::BLOBHASH => {
            if !env.revision.has_cancun_opcodes() {
                return Err(EvmError::InvalidOpcode);
            }
            interp.gas.charge(GAS_VERY_LOW)?;
            let index = interp.stack.pop()?;
            let hashes = &env.block.blob_hashes;
            let value = if index < U256::from(hashes.len()) {
                U256::from_big_endian(hashes[index.as_u64() as usize].as_bytes())
            } else {
                U256::zero()
            };
            interp.stack.push(value)?;
        }
        opcodes::BLOBBASEFEE => {
            if !env.revision.has_cancun_opcodes() {
                return Err(EvmError::InvalidOpcode);
            }
            push_const(interp, GAS_BASE, env.block.blob_base_fee)?
        }

        // --- Stack / memory / storage -----------------------------------
        opcodes::POP => {
            interp.gas.charge(GAS_BASE)?;
            interp.stack.pop()?;
        }
        opcodes::MLOAD => {
            interp.gas.charge(GAS_VERY_LOW)?;
            let offset = pop_usize(interp)?;
            charge_memory(interp, offset, 32)?;
            interp.stack.push(interp.memory.read_word(offset))?;
        }
        opcodes::MSTORE => {
            interp.gas.charge(GAS_VERY_LOW)?;
            let offset = pop_usize(interp)?;
            let value = interp.stack.pop()?;
            charge_memory(interp, offset, 32)?;
            let mut buf = [0u8; 32];
            value.to_big_endian(&mut buf);
            interp.memory.write(offset, &buf);
        }
        opcodes::MSTORE8 => {
            interp.gas.charge(GAS_VERY_LOW)?;
            let offset = pop_usize(interp)?;
            let value = interp.stack.pop()?;
            charge_memory(interp, offset, 1)?;
            interp.memory.write(offset, &[value.low_u32() as u8]);
        }
        opcodes::SLOAD => {
            let key = interp.stack.peek(0)?;
            let cold = host.touch_storage_key(env.address, key);
            let cost = if env.revision.has_access_lists() {
                if cold {
                    COLD_SLOAD_GAS
                } else {
                    WARM_STORAGE_READ_GAS
                }
            } else {
                SLOAD_GAS_ISTANBUL
            };
            interp.gas.charge(cost)?;
            let key = interp.stack.pop()?;
            interp.stack.push(host.get_storage(&env.address, key))?;
        }
        opcodes::SSTORE => {
            if env.is_static {
                return Err(EvmError::WriteProtection);
            }
            if interp.gas.remaining() <= SSTORE_SENTRY_GAS {
                return Err(EvmError::OutOfGas);
            }
            let key = interp.stack.pop()?;
            let new_value = interp.stack.pop()?;
            let cold = host.touch_storage_key(env.address, key);
            let cold_surcharge = if env.revision.has_access_lists() && cold {
                COLD_SLOAD_GAS
            } else {
                0
            };
            let write = host.set_storage(env.address, key, new_value);
            let (_, base_gas, refund) =
                sstore_cost_and_refund(write.original, write.current, write.new, env.revision);
            interp.gas.charge(base_gas + cold_surcharge)?;
            interp.gas.add_refund(refund);
        }
        opcodes::JUMP => {
            interp.gas.charge(GAS_MID)?;
            let dest = pop_usize_checked(interp, EvmError::InvalidJump)?;
            if !env.code.is_valid_jump_target(dest) {
                return Err(EvmError::InvalidJump);
            }
            jump_to = Some(dest);
        }
        opcodes::JUMPI => {
            interp.gas.charge(GAS_HIGH)?;
            let dest = pop_usize_checked(interp, EvmError::InvalidJump)?;
            let cond = interp.stack.pop()?;
            if !cond.is_zero() {
                if !env.code.is_valid_jump_target(dest) {
                    return Err(EvmError::InvalidJump);
                }
                jump_to = Some(dest);
            }
        }
        opcodes::PC => push_const(interp, GAS_BASE, U256::from(interp.pc))?,
        opcodes::MSIZE => push_const(interp, GAS_BASE, U256::from(interp.memory.len()))?,
        opcodes::GAS => {
            interp.gas.charge(GAS_BASE)?;
            interp.stack.push(U256::from(interp.gas.remaining()))?;
        }
        opcodes::JUMPDEST => interp.gas.charge(GAS_JUMPDEST)?,
        opcodes::TLOAD => {
            if !env.revision.has_cancun_opcodes() {
                return Err(EvmError::InvalidOpcode);
            }
            interp.gas.charge(WARM_STORAGE_READ_GAS)?;
            let key = interp.stack.pop()?;
            interp.stack.push(host.get_transient_storage(&env.address, key))?;
        }
        opcodes::TSTORE => {
            if !env.revision.has_cancun_opcodes() {
                return Err(EvmError::InvalidOpcode);
            }
            if env.is_static {
                return Err(EvmError::WriteProtection);
            }
            interp.gas.charge(WARM_STORAGE_READ_GAS)?;
            let key = interp.stack.pop()?;
            let value = interp.stack.pop()?;
            host.set_transient_storage(env.address, key, value);
        }
        opcodes::MCOPY => {
            if !env.revision.has_cancun_opcodes() {
                return Err(EvmError::InvalidOpcode);
            }
            interp.gas.charge(GAS_VERY_LOW)?;
            let dest_offset = pop_usize(interp)?;
            let offset = pop_usize(interp)?;
            let len = pop_usize(interp)?;
            interp.gas.charge(COPY_WORD_GAS * words(len))?;
            let max_end = dest_offset.max(offset).checked_add(len).ok_or(EvmError::OutOfGas)?;
            charge_memory(interp, 0, max_end)?;
            let data = interp.memory.read(offset, len);
            interp.memory.write(dest_offset, &data);
        }
        opcodes::PUSH0 => {
            if !env.revision.has_push0() {
                return Err(EvmError::InvalidOpcode);
            }
            push_const(interp, GAS_BASE, U256::zero())?;
        }

        _ if opcodes::is_push(op) => {
            interp.gas.charge(GAS_VERY_LOW)?;
            let len = opcodes::push_len(op);
            let bytes = read_padded(env.code.as_slice(), interp.pc + 1, len);
            interp.stack.push(U256::from_big_endian(&bytes))?;
            jump_to = Some(interp.pc + 1 + len);
        }
        _ if (opcodes::DUP1..=opcodes::DUP16).contains(&op) => {
            interp.gas.charge(GAS_VERY_LOW)?;
            interp.stack.dup(opcodes::dup_n(op))?;
        }
        _ if (opcodes::SWAP1..=opcodes::SWAP16).contains(&op) => {
            interp.gas.charge(GAS_VERY_LOW)?;
            interp.stack.swap(opcodes::swap_n(op))?;
        }

        _ if (opcodes::LOG0..=opcodes::LOG4).contains(&op) => {
            if env.is_static {
                return Err(EvmError::WriteProtection);
            }
            let n = opcodes::log_n(op);
            let offset = pop_usize(interp)?;
            let len = pop_usize(interp)?;
            let mut topics = Vec::with_capacity(n);
            for _ in 0..n {
                let topic = interp.stack.pop()?;
                let mut buf = [0u8; 32];
                topic.to_big_endian(&mut buf);
                topics.push(ethereum_types::H256(buf));
            }
            charge_memory(interp, offset, len)?;
            interp.gas.charge(
                LOG_GAS + LOG_TOPIC_GAS * n as u64 + LOG_DATA_GAS * len as u64,
            )?;
            let data = interp.memory.read(offset, len);
            host.push_log(env.address, topics, data);
        }

        opcodes::CREATE => create_op(interp, env, host, false)?,
        opcodes::CREATE2 => create_op(interp, env, host, true)?,
        opcodes::CALL => call_op(interp, env, host, CallKind::Call)?,
        opcodes::CALLCODE => call_op(interp, env, host, CallKind::CallCode)?,
        opcodes::DELEGATECALL => call_op(interp, env, host, CallKind::DelegateCall)?,
        opcodes::STATICCALL => call_op(interp, env, host, CallKind::StaticCall)?,

        opcodes::RETURN => {
            let offset = pop_usize(interp)?;
            let len = pop_usize(interp)?;
            charge_memory(interp, offset, len)?;
            interp.return_data = Bytes::from(interp.memory.read(offset, len));
            interp.status = Status::Stopped;
        }
        opcodes::REVERT => {
            let offset = pop_usize(interp)?;
            let len = pop_usize(interp)?;
            charge_memory(interp, offset, len)?;
            interp.return_data = Bytes::from(interp.memory.read(offset, len));
            interp.status = Status::Reverted;
        }
        opcodes::INVALID => return Err(EvmError::InvalidOpcode),
        opcodes::SELFDESTRUCT => {
            if env.is_static {
                return Err(EvmError::WriteProtection);
            }
            let beneficiary = pop_address(interp)?;
            let cold = host.touch_address(beneficiary);
            let cold_surcharge = if env.revision.has_access_lists() && cold {
                COLD_ACCOUNT_ACCESS_GAS
            } else {
                0
            };
            let has_balance = !host.get_balance(&env.address).is_zero();
            let new_account_surcharge =
                if has_balance && !host.account_exists(&beneficiary) {
                    SELFDESTRUCT_NEW_ACCOUNT_GAS
                } else {
                    0
                };
            interp
                .gas
                .charge(SELFDESTRUCT_GAS + cold_surcharge + new_account_surcharge)?;
            host.push_self_destruct(env.address, beneficiary);
            interp.status = Status::Stopped;
        }

        _ => return Err(EvmError::InvalidOpcode),
    }

    if interp.status == Status::Running {
        interp.pc = jump_to.unwrap_or(interp.pc + 1);
    }
    Ok(())
}

// --- Shared arithmetic/stack helpers --------------------------------

fn binop(interp: &mut Interpreter, gas: u64, f: impl Fn(U256, U256) -> U256) -> StepResult {
    interp.gas.charge(gas)?;
    let b = interp.stack.pop()?;
    let a = interp.stack.pop()?;
    interp.stack.push(f(a, b))
}

fn triop(interp: &mut Interpreter, gas: u64, f: impl Fn(U256, U256, U256) -> U256) -> StepResult {
    interp.gas.charge(gas)?;
    let a = interp.stack.pop()?;
    let b = interp.stack.pop()?;
    let m = interp.stack.pop()?;
    interp.stack.push(f(a, b, m))
}

fn unop(interp: &mut Interpreter, gas: u64, f: impl Fn(U256) -> U256) -> StepResult {
    interp.gas.charge(gas)?;
    let a = interp.stack.pop()?;
    interp.stack.push(f(a))
}

fn push_const(interp: &mut Interpreter, gas: u64, value: U256) -> StepResult {
    interp.gas.charge(gas)?;
    interp.stack.push(value)
}

fn bool_u256(v: bool) -> U256 {
    if v {
        U256::one()
    } else {
        U256::zero()
    }
}

/// `(x + y) mod m` for `x, y` already reduced (`< m`). Avoids needing a
/// wider-than-256-bit integer type: on overflow, the true sum is
/// `wrapped + 2^256`, and subtracting `m` once (via `2^256 - m`, the
/// two's-complement of `m`) always lands back under `2^256` and under
/// `m`, since `x + y < 2m`.
fn add_mod_raw(x: U256, y: U256, m: U256) -> U256 {
    match x.overflowing_add(y) {
        (sum, false) => {
            if sum >= m {
                sum - m
            } else {
                sum
            }
        }
        (sum, true) => {
            let two_pow_256_minus_m = (!m).overflowing_add(U256::one()).0;
            sum.overflowing_add(two_pow_256_minus_m).0
        }
    }
}

/// `(a + b) mod m`.
fn add_mod(a: U256, b: U256, m: U256) -> U256 {
    add_mod_raw(a % m, b % m, m)
}

/// `(a * b) mod m` via double-and-add, the same by-squaring shape
/// `primitives::exp` uses, substituting `add_mod_raw` for the final
/// reduction step.
fn mul_mod(a: U256, b: U256, m: U256) -> U256 {
    let mut base = a % m;
    let mut exponent = b;
    let mut result = U256::zero();
    while !exponent.is_zero() {
        if exponent.bit(0) {
            result = add_mod_raw(result, base, m);
        }
        base = add_mod_raw(base, base, m);
        exponent >>= 1;
    }
    result
}

fn address_to_u256(address: Address) -> U256 {
    U256::from_big_endian(address.as_bytes())
}

fn u256_to_address(value: U256) -> Address {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    Address::from_slice(&buf[12..])
}

fn pop_address(interp: &mut Interpreter) -> Result<Address, EvmError> {
    Ok(u256_to_address(interp.stack.pop()?))
}

/// Values bigger than this could never plausibly be an in-bounds memory
/// offset/length — any gas limit runs out long before reaching it — so
/// clamping to `OutOfGas` instead of converting is safe and avoids an
/// unrepresentable `usize` cast.
fn pop_usize(interp: &mut Interpreter) -> Result<usize, EvmError> {
    pop_usize_checked(interp, EvmError::OutOfGas)
}

fn pop_usize_checked(interp: &mut Interpreter, on_overflow: EvmError) -> Result<usize, EvmError> {
    let value = interp.stack.pop()?;
    if value > U256::from(u32::MAX) {
        return Err(on_overflow);
    }
    Ok(value.as_u32() as usize)
}

fn words(len: usize) -> u64 {
    ((len + 31) / 32) as u64
}

/// Zero-padded read past the end of `source`, used for calldata/code
/// reads where running off the end yields zero bytes rather than an
/// error (§4.5, §8).
fn read_padded(source: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    if offset >= source.len() {
        return out;
    }
    let available = (source.len() - offset).min(len);
    out[..available].copy_from_slice(&source[offset..offset + available]);
    out
}

fn charge_memory(interp: &mut Interpreter, offset: usize, len: usize) -> StepResult {
    let cost = interp
        .memory
        .expansion_cost(offset, len)
        .ok_or(EvmError::OutOfGas)?;
    interp.gas.charge(cost)?;
    interp.memory.resize(offset, len);
    Ok(())
}

/// `CODECOPY`/`CALLDATACOPY`/`EXTCODECOPY` share pop order and cost shape:
/// `destOffset, offset, len`, a flat verylow plus per-word copy cost on
/// top of memory expansion.
fn copy_to_memory(interp: &mut Interpreter, source: &[u8]) -> StepResult {
    interp.gas.charge(GAS_VERY_LOW)?;
    let dest_offset = pop_usize(interp)?;
    let offset = pop_usize(interp)?;
    let len = pop_usize(interp)?;
    interp.gas.charge(COPY_WORD_GAS * words(len))?;
    charge_memory(interp, dest_offset, len)?;
    let data = read_padded(source, offset, len);
    interp.memory.write(dest_offset, &data);
    Ok(())
}

/// EIP-2929 account-access surcharge shared by `BALANCE`/`EXTCODESIZE`/
/// `EXTCODECOPY`/`EXTCODEHASH`: flat pre-Berlin, warm/cold split after.
fn charge_account_access(
    interp: &mut Interpreter,
    env: &ExecutionEnv,
    host: &mut dyn Host,
    address: Address,
) -> StepResult {
    let cold = host.touch_address(address);
    let cost = if env.revision.has_access_lists() {
        if cold {
            COLD_ACCOUNT_ACCESS_GAS
        } else {
            WARM_STORAGE_READ_GAS
        }
    } else {
        ACCOUNT_ACCESS_GAS_ISTANBUL
    };
    interp.gas.charge(cost)
}

fn clamp_u64(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_u64()
    }
}

/// The 63/64 rule (EIP-150): a call may forward at most `gas - gas/64` of
/// whatever's left in the parent after its own surcharges are paid.
fn forwardable_gas(remaining: u64, requested: U256) -> u64 {
    let max_forward = remaining - remaining / 64;
    clamp_u64(requested).min(max_forward)
}

// --- CREATE / CREATE2 -----------------------------------------------

fn create_op(
    interp: &mut Interpreter,
    env: &ExecutionEnv,
    host: &mut dyn Host,
    is_create2: bool,
) -> StepResult {
    if env.is_static {
        return Err(EvmError::WriteProtection);
    }
    interp.gas.charge(CREATE_GAS)?;
    let value = interp.stack.pop()?;
    let offset = pop_usize(interp)?;
    let len = pop_usize(interp)?;
    let salt = if is_create2 {
        Some(interp.stack.pop()?)
    } else {
        None
    };

    if env.revision.has_initcode_size_limit() && len > MAX_INITCODE_SIZE {
        return Err(EvmError::MaxCodeSizeExceeded);
    }
    charge_memory(interp, offset, len)?;
    if is_create2 {
        interp.gas.charge(CREATE2_WORD_GAS * words(len))?;
    }

    let init_code = interp.memory.read(offset, len);
    // CREATE/CREATE2 take no gas operand: the 63/64 rule forwards
    // everything left after the charges above.
    let remaining = interp.gas.remaining();
    let forwarded = remaining - remaining / 64;
    interp.gas.charge(forwarded)?;

    let params = CallParams {
        sender: env.address,
        recipient: None,
        value,
        input: Bytes::from(init_code),
        gas: forwarded,
        salt,
        code_address: None,
    };
    let kind = if is_create2 {
        CallKind::Create2
    } else {
        CallKind::Create
    };
    let result = host.call(kind, params);

    interp.gas.refund_unspent(result.gas_left);
    interp.gas.add_refund(result.gas_refund);
    interp.return_data = result.output;
    let pushed = match result.created_address {
        Some(address) if result.success => address_to_u256(address),
        _ => U256::zero(),
    };
    interp.stack.push(pushed)
}

// --- CALL / CALLCODE / DELEGATECALL / STATICCALL ---------------------

fn call_op(
    interp: &mut Interpreter,
    env: &ExecutionEnv,
    host: &mut dyn Host,
    kind: CallKind,
) -> StepResult {
    let takes_value = matches!(kind, CallKind::Call | CallKind::CallCode);

    let gas_requested = interp.stack.pop()?;
    let target = pop_address(interp)?;
    let value = if takes_value {
        interp.stack.pop()?
    } else {
        U256::zero()
    };
    let args_offset = pop_usize(interp)?;
    let args_len = pop_usize(interp)?;
    let ret_offset = pop_usize(interp)?;
    let ret_len = pop_usize(interp)?;

    if env.is_static && takes_value && !value.is_zero() {
        return Err(EvmError::WriteProtection);
    }

    let cold = host.touch_address(target);
    let access_gas = if env.revision.has_access_lists() {
        if cold {
            COLD_ACCOUNT_ACCESS_GAS
        } else {
            WARM_STORAGE_READ_GAS
        }
    } else {
        ACCOUNT_ACCESS_GAS_ISTANBUL
    };
    let value_gas = if !value.is_zero() { CALL_VALUE_TRANSFER_GAS } else { 0 };
    let new_account_gas = if kind == CallKind::Call && !value.is_zero() && !host.account_exists(&target)
    {
        NEW_ACCOUNT_GAS
    } else {
        0
    };
    interp.gas.charge(access_gas + value_gas + new_account_gas)?;

    // Charged as two independent expansions rather than one combined
    // extent; whichever range is smaller simply costs nothing extra once
    // the first expansion already covers it.
    charge_memory(interp, args_offset, args_len)?;
    charge_memory(interp, ret_offset, ret_len)?;

    let stipend = if value_gas > 0 { CALL_STIPEND } else { 0 };
    let forwarded = forwardable_gas(interp.gas.remaining(), gas_requested);
    interp.gas.charge(forwarded)?;

    let input = interp.memory.read(args_offset, args_len);
    let (sender, recipient, code_address) = match kind {
        CallKind::Call => (env.address, Some(target), None),
        CallKind::CallCode => (env.address, Some(env.address), Some(target)),
        CallKind::DelegateCall => (env.caller, Some(env.address), Some(target)),
        CallKind::StaticCall => (env.address, Some(target), None),
        CallKind::Create | CallKind::Create2 => unreachable!("call_op only handles the four call kinds"),
    };
    let call_value = match kind {
        CallKind::DelegateCall => env.value,
        _ => value,
    };

    let params = CallParams {
        sender,
        recipient,
        value: call_value,
        input: Bytes::from(input),
        gas: forwarded + stipend,
        salt: None,
        code_address,
    };
    let result = host.call(kind, params);

    interp.gas.refund_unspent(result.gas_left);
    interp.gas.add_refund(result.gas_refund);
    interp.return_data = result.output.clone();
    let copy_len = ret_len.min(result.output.len());
    if copy_len > 0 {
        interp.memory.write(ret_offset, &result.output[..copy_len]);
    }
    interp.stack.push(bool_u256(result.success))
}
