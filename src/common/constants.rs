//! Gas and size constants reproduced verbatim from the Yellow Paper + EIPs.

use ethereum_types::{Address, H256};
use hex_literal::hex;

/// Hashes of canonical empty values, used to distinguish "no code"/"no data"
/// accounts from genuinely-stored empty values.
pub mod hashes {
    use super::*;

    /// `keccak256("")` — the code hash of an account with no code.
    pub const EMPTY_CODE_HASH: H256 =
        H256(hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"));

    /// `keccak256(rlp([]))`.
    pub const EMPTY_LIST_HASH: H256 =
        H256(hex!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347"));
}

/// The chain-specific state-writer precompile's fixed address:
/// `0x00000000000000000000000000000000000000aa`.
pub const STATE_WRITER_ADDRESS: Address = Address(hex!("00000000000000000000000000000000000000aa"));

/// Maximum stack depth (§4.2).
pub const STACK_LIMIT: usize = 1024;

/// Maximum recursive call/create depth (§4.7, §6).
pub const MAX_CALL_DEPTH: u64 = 1024;

/// Maximum size of deployed runtime code (EIP-170).
pub const MAX_CODE_SIZE: usize = 24576;

/// Maximum size of initcode passed to CREATE/CREATE2 (EIP-3860).
pub const MAX_INITCODE_SIZE: usize = MAX_CODE_SIZE * 2;

/// Per-byte deploy gas charged against the init-code return (§6).
pub const CREATE_DATA_GAS: u64 = 200;

/// Base gas of the CREATE/CREATE2 opcodes and the state-writer's
/// code-copying selectors (§4.5, §4.9).
pub const CREATE_GAS: u64 = 32000;

/// Intrinsic gas for a plain call transaction (§6).
pub const TX_GAS: u64 = 21000;

/// Intrinsic gas for a contract-creation transaction (§6).
pub const TX_CREATE_GAS: u64 = 53000;

/// Per zero-byte of transaction input data (§6).
pub const TX_DATA_ZERO_GAS: u64 = 4;

/// Per non-zero byte of transaction input data (§6).
pub const TX_DATA_NON_ZERO_GAS: u64 = 16;

/// EIP-2930 access-list address entry cost.
pub const ACCESS_LIST_ADDRESS_GAS: u64 = 2400;

/// EIP-2930 access-list storage key entry cost.
pub const ACCESS_LIST_STORAGE_KEY_GAS: u64 = 1900;

/// Gas stipend granted to a callee when a CALL carries non-zero value.
pub const CALL_STIPEND: u64 = 2300;

/// Extra gas charged on CALL when value is transferred.
pub const CALL_VALUE_TRANSFER_GAS: u64 = 9000;

/// Extra gas charged on CALL when the target account does not yet exist.
pub const NEW_ACCOUNT_GAS: u64 = 25000;

/// EIP-2929 cold account-access surcharge.
pub const COLD_ACCOUNT_ACCESS_GAS: u64 = 2600;

/// EIP-2929 cold storage-slot-access surcharge.
pub const COLD_SLOAD_GAS: u64 = 2100;

/// EIP-2929 warm access cost (also the post-Berlin SLOAD cost for a warm slot).
pub const WARM_STORAGE_READ_GAS: u64 = 100;

/// Pre-Berlin flat SLOAD cost.
pub const SLOAD_GAS_ISTANBUL: u64 = 800;

/// SSTORE gas for setting a zero slot to a non-zero value (Berlin, EIP-2929).
pub const SSTORE_SET_GAS: u64 = 20000;

/// SSTORE gas for clearing or modifying an already-dirtied slot (Berlin+,
/// where the EIP-2929 cold surcharge is billed separately).
pub const SSTORE_RESET_GAS: u64 = 2900;

/// SSTORE gas for clearing or modifying a fresh slot, pre-Berlin (no
/// separate cold surcharge existed yet).
pub const SSTORE_RESET_GAS_ISTANBUL: u64 = 5000;

/// Refund for clearing a storage slot to zero, pre EIP-3529 (Istanbul).
pub const SSTORE_CLEARS_REFUND_ISTANBUL: i64 = 15000;

/// Refund for clearing a storage slot to zero, post EIP-3529 (Berlin+).
pub const SSTORE_CLEARS_REFUND_BERLIN: i64 = 4800;

/// Memory expansion cost, gas per word (§4.3).
pub const MEMORY_GAS: u64 = 3;

/// Gas cost of the KECCAK256 opcode per word of input.
pub const KECCAK256_WORD_GAS: u64 = 6;

/// Base gas cost of any LOG instruction.
pub const LOG_GAS: u64 = 375;

/// Gas cost of a single LOG topic.
pub const LOG_TOPIC_GAS: u64 = 375;

/// Gas cost per byte of LOG data.
pub const LOG_DATA_GAS: u64 = 8;

/// Flat SELFDESTRUCT gas (Tangerine Whistle+).
pub const SELFDESTRUCT_GAS: u64 = 5000;

/// SELFDESTRUCT gas charged when the beneficiary account does not yet exist
/// and the transfer is non-zero.
pub const SELFDESTRUCT_NEW_ACCOUNT_GAS: u64 = 25000;

/// CREATE2 hashing surcharge, per 32-byte word of init code.
pub const CREATE2_WORD_GAS: u64 = 6;

/// Refund cap denominator pre-London (gas_used / 2).
pub const REFUND_DENOMINATOR_ISTANBUL: u64 = 2;

/// Refund cap denominator London+ (gas_used / 5, EIP-3529).
pub const REFUND_DENOMINATOR_LONDON: u64 = 5;

/// Fraction of leftover gas burned for an external transaction (§4.10 step 5).
pub const EXTERNAL_TX_BURN_DENOMINATOR: u64 = 10;

/// EIP-4844 target blob gas per block.
pub const TARGET_BLOB_GAS_PER_BLOCK: u64 = 393216;

/// EIP-4844 max blob gas per block.
pub const MAX_BLOB_GAS_PER_BLOCK: u64 = 786432;

/// EIP-4844 blob-gas-price update fraction.
pub const BLOB_BASE_FEE_UPDATE_FRACTION: u64 = 3338477;

/// EIP-4844 minimum base fee per blob gas.
pub const MIN_BASE_FEE_PER_BLOB_GAS: u64 = 1;

/// Gas charged for the Cancun point-evaluation precompile (EIP-4844).
pub const POINT_EVALUATION_GAS: u64 = 50000;

/// EIP-4844 gas consumed per blob.
pub const GAS_PER_BLOB: u64 = 131072;

// --- Fixed per-opcode gas groups (Yellow Paper §4.5) ------------------

/// `STOP`/`RETURN`/`REVERT`.
pub const GAS_ZERO: u64 = 0;
/// Environment reads with no side effects: `ADDRESS`, `ORIGIN`, `POP`, ...
pub const GAS_BASE: u64 = 2;
/// Arithmetic/bitwise/stack ops: `ADD`, `PUSH`, `DUP`, `MLOAD`, ...
pub const GAS_VERY_LOW: u64 = 3;
/// `MUL`, `DIV`, `SDIV`, `MOD`, `SMOD`, `SIGNEXTEND`.
pub const GAS_LOW: u64 = 5;
/// `ADDMOD`, `MULMOD`, `JUMP`.
pub const GAS_MID: u64 = 8;
/// `JUMPI`.
pub const GAS_HIGH: u64 = 10;
/// `JUMPDEST`.
pub const GAS_JUMPDEST: u64 = 1;
/// `SELFBALANCE` (EIP-1884): a dedicated opcode rather than a warm/cold
/// account access.
pub const GAS_SELFBALANCE: u64 = 5;
/// `EXP`'s fixed component; the dynamic component is `EXP_BYTE_GAS` per
/// byte of the exponent.
pub const GAS_EXP: u64 = 10;
pub const EXP_BYTE_GAS: u64 = 50;

/// Flat pre-Berlin cost of `BALANCE`/`EXTCODESIZE`/`EXTCODEHASH`/
/// `EXTCODECOPY`/`CALL`/`CALLCODE`/`DELEGATECALL`/`STATICCALL` (EIP-1884),
/// superseded by the warm/cold split from Berlin onward.
pub const ACCOUNT_ACCESS_GAS_ISTANBUL: u64 = 700;

/// `KECCAK256`'s fixed component; `KECCAK256_WORD_GAS` is the per-word
/// dynamic component.
pub const KECCAK256_BASE_GAS: u64 = 30;

/// Per-word cost of `CODECOPY`/`CALLDATACOPY`/`EXTCODECOPY`/
/// `RETURNDATACOPY`/`MCOPY`, on top of memory expansion.
pub const COPY_WORD_GAS: u64 = 3;

/// Flat `BLOCKHASH` cost; not part of any of the named fixed groups above.
pub const BLOCKHASH_GAS: u64 = 20;

/// `SSTORE`'s EIP-2200 sentry: a call with 2300 gas or less left may not
/// `SSTORE` at all, the same headroom a value-transfer stipend guarantees
/// a callee, so a callee can always emit a log on failure without being
/// able to re-enter storage.
pub const SSTORE_SENTRY_GAS: u64 = 2300;
