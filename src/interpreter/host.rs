//! The "operations abstraction" the interpreter calls out through (§9):
//! storage, transient storage, access sets, logs, self-destruct, and
//! nested calls. The call orchestrator (`crate::call::CallOrchestrator`)
//! is the concrete implementation — this trait exists purely to break the
//! interpreter ↔ orchestrator circular dependency described in §9.

use crate::call::{CallKind, CallParams, CallResult};
use crate::code::Code;
use crate::revision::Revision;
use crate::world_state::StorageWrite;
use ethereum_types::{Address, H256, U256};

/// Environment a single call frame executes against, read-only from the
/// interpreter's point of view (§4.5, §6, teacher's `vm::Context`).
#[derive(Debug, Clone)]
pub struct ExecutionEnv {
    pub address: Address,
    pub caller: Address,
    pub origin: Address,
    pub value: U256,
    pub calldata: bytes::Bytes,
    pub gas_price: U256,
    pub code: Code,
    pub is_static: bool,
    pub depth: u64,
    pub revision: Revision,
    pub block: BlockInfo,
}

/// Block-level parameters an opcode (`COINBASE`, `TIMESTAMP`, ...) may
/// read (§6 "Processor inputs", block parameters).
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub chain_id: U256,
    pub number: U256,
    pub timestamp: U256,
    pub coinbase: Address,
    pub gas_limit: U256,
    pub prev_randao: H256,
    pub base_fee: U256,
    pub blob_base_fee: U256,
    pub blob_hashes: Vec<H256>,
}

/// Host services the interpreter calls into while executing one frame.
pub trait Host {
    fn get_balance(&self, address: &Address) -> U256;
    fn account_exists(&self, address: &Address) -> bool;

    fn get_code(&self, address: &Address) -> Vec<u8>;
    fn get_code_hash(&self, address: &Address) -> H256;
    fn get_code_size(&self, address: &Address) -> usize;

    fn get_storage(&self, address: &Address, key: U256) -> U256;
    fn set_storage(&mut self, address: Address, key: U256, value: U256) -> StorageWrite;

    fn get_transient_storage(&self, address: &Address, key: U256) -> U256;
    fn set_transient_storage(&mut self, address: Address, key: U256, value: U256);

    /// Returns `true` if `address` was cold before this call (and is now
    /// warmed) — the caller charges the EIP-2929 surcharge accordingly.
    fn touch_address(&mut self, address: Address) -> bool;
    fn touch_storage_key(&mut self, address: Address, key: U256) -> bool;

    fn push_log(&mut self, address: Address, topics: Vec<H256>, data: Vec<u8>);

    fn push_self_destruct(&mut self, address: Address, beneficiary: Address);
    fn was_created_this_tx(&self, address: &Address) -> bool;

    fn block_hash(&self, number: U256) -> H256;

    /// Recursively invoke another call frame (`CALL`/`CALLCODE`/
    /// `DELEGATECALL`/`STATICCALL`/`CREATE`/`CREATE2`), §4.7.
    fn call(&mut self, kind: CallKind, params: CallParams) -> CallResult;
}
