//! Recursive call orchestrator (§2.8, §4.7): value transfer, code lookup,
//! precompile/state-writer dispatch, depth cap, snapshot/restore, and
//! contract-creation semantics, layered on top of the interpreter.
//!
//! Implements [`Host`] for the interpreter, closing the circular
//! dependency described in §9: the interpreter calls out through `Host`,
//! and `Host::call` on this type recurses back into the interpreter for
//! the next frame. Concrete types are wired here, at construction (§9).

use crate::code::Code;
use crate::common::constants::{
    MAX_CALL_DEPTH, MAX_CODE_SIZE, MAX_INITCODE_SIZE, STATE_WRITER_ADDRESS,
};
use crate::common::crypto::keccak256;
use crate::common::errors::EvmError;
use crate::context::TransactionContext;
use crate::gas::Gas;
use crate::interpreter::{BlockInfo, ExecutionEnv, FrameOutcome, Host, Interpreter, Status};
use crate::revision::Revision;
use crate::state_writer;
use crate::world_state::{StorageWrite, WorldState};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

/// Which of the six recursive entry points a call frame is (§3 "Call
/// frame parameters").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
    Create,
    Create2,
}

impl CallKind {
    fn is_create(self) -> bool {
        matches!(self, CallKind::Create | CallKind::Create2)
    }
}

/// Inputs to one call frame (§3).
#[derive(Debug, Clone)]
pub struct CallParams {
    pub sender: Address,
    /// Absent for `Create`/`Create2`; the new address is derived.
    pub recipient: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub gas: u64,
    /// `Create2` only.
    pub salt: Option<U256>,
    /// `DelegateCall`/`CallCode` only: the account whose code executes,
    /// distinct from `recipient` (whose storage/balance context is used).
    pub code_address: Option<Address>,
}

/// Outcome of a call frame (§3 "Call frame result").
#[derive(Debug, Clone)]
pub struct CallResult {
    pub success: bool,
    pub output: Bytes,
    pub gas_left: u64,
    pub gas_refund: i64,
    pub created_address: Option<Address>,
}

impl CallResult {
    fn failed(gas_left: u64) -> Self {
        Self {
            success: false,
            output: Bytes::new(),
            gas_left,
            gas_refund: 0,
            created_address: None,
        }
    }
}

/// Drives one transaction's worth of recursive calls over a
/// `TransactionContext`.
pub struct CallOrchestrator<'w, W: WorldState> {
    ctx: TransactionContext<'w, W>,
    depth: u64,
    force_static: bool,
    origin: Address,
    gas_price: U256,
    revision: Revision,
    block: BlockInfo,
    /// The single authorized caller of the chain-specific state-writer
    /// precompile (§4.9).
    state_writer_driver: Address,
}

impl<'w, W: WorldState> CallOrchestrator<'w, W> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ctx: TransactionContext<'w, W>,
        origin: Address,
        gas_price: U256,
        revision: Revision,
        block: BlockInfo,
        state_writer_driver: Address,
    ) -> Self {
        Self {
            ctx,
            depth: 0,
            force_static: false,
            origin,
            gas_price,
            revision,
            block,
            state_writer_driver,
        }
    }

    pub fn context(&self) -> &TransactionContext<'w, W> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut TransactionContext<'w, W> {
        &mut self.ctx
    }

    /// Unwraps the orchestrator back into its `TransactionContext`, for the
    /// processor to finish up with once the top-level call has returned
    /// (§4.10 steps 5-7).
    pub fn into_context(self) -> TransactionContext<'w, W> {
        self.ctx
    }

    /// The processor's single entry point (§4.7 "Entry point `call(kind,
    /// params)`"): invokes the top-level transaction call or create.
    pub fn run(&mut self, kind: CallKind, params: CallParams) -> CallResult {
        self.dispatch(kind, params)
    }

    fn can_transfer(&self, sender: &Address, value: U256) -> bool {
        self.ctx.get_balance(sender) >= value
    }

    fn transfer(&mut self, sender: &Address, recipient: &Address, value: U256) {
        if value.is_zero() || sender == recipient {
            return;
        }
        let sender_balance = self.ctx.get_balance(sender) - value;
        let recipient_balance = self.ctx.get_balance(recipient) + value;
        self.ctx.set_balance(sender, sender_balance);
        self.ctx.set_balance(recipient, recipient_balance);
    }

    fn has_collision(&self, address: &Address) -> bool {
        self.ctx.get_nonce(address) != U256::zero() || !self.ctx.get_code(address).is_empty()
    }

    /// CREATE address: rightmost 20 bytes of `Keccak(rlp(sender, nonce))`
    /// (§4.5, §6).
    fn create_address(&self, sender: &Address, nonce: U256) -> Address {
        let mut stream = rlp::RlpStream::new_list(2);
        stream.append(sender);
        stream.append(&nonce);
        let hash = keccak256(&stream.out());
        Address::from_slice(&hash.as_bytes()[12..])
    }

    /// CREATE2 address: rightmost 20 bytes of
    /// `Keccak(0xFF || sender || salt || Keccak(initcode))` (§4.5, §6).
    fn create2_address(&self, sender: &Address, salt: U256, init_code: &[u8]) -> Address {
        let init_code_hash = keccak256(init_code);
        let mut buf = Vec::with_capacity(1 + 20 + 32 + 32);
        buf.push(0xff);
        buf.extend_from_slice(sender.as_bytes());
        let mut salt_bytes = [0u8; 32];
        salt.to_big_endian(&mut salt_bytes);
        buf.extend_from_slice(&salt_bytes);
        buf.extend_from_slice(init_code_hash.as_bytes());
        let hash = keccak256(&buf);
        Address::from_slice(&hash.as_bytes()[12..])
    }

    fn dispatch(&mut self, kind: CallKind, params: CallParams) -> CallResult {
        if self.depth > MAX_CALL_DEPTH {
            return CallResult::failed(params.gas);
        }
        self.depth += 1;
        let was_static = self.force_static;
        self.force_static = was_static || kind == CallKind::StaticCall;

        let result = self.dispatch_inner(kind, params);

        self.force_static = was_static;
        self.depth -= 1;
        result
    }

    fn dispatch_inner(&mut self, kind: CallKind, params: CallParams) -> CallResult {
        let mut created_address = None;

        if kind.is_create() {
            let sender_nonce = self.ctx.get_nonce(&params.sender);
            let new_address = match kind {
                CallKind::Create => self.create_address(&params.sender, sender_nonce),
                CallKind::Create2 => self.create2_address(
                    &params.sender,
                    params.salt.unwrap_or_default(),
                    &params.input,
                ),
                _ => unreachable!(),
            };
            if self.has_collision(&new_address) {
                return CallResult::failed(params.gas);
            }
            if params.input.len() > MAX_INITCODE_SIZE {
                return CallResult::failed(params.gas);
            }
            self.ctx.set_nonce(&params.sender, sender_nonce + U256::one());
            self.ctx.set_nonce(&new_address, U256::one());
            self.ctx.mark_created_this_tx(new_address);
            created_address = Some(new_address);
        }

        let recipient = match kind {
            CallKind::Create | CallKind::Create2 => created_address.expect("set above"),
            _ => params.recipient.expect("non-create calls carry a recipient"),
        };

        let code_source = match kind {
            CallKind::DelegateCall | CallKind::CallCode => {
                params.code_address.unwrap_or(recipient)
            }
            _ => recipient,
        };

        let snapshot = self.ctx.snapshot();

        let value_transferring = matches!(
            kind,
            CallKind::Call | CallKind::CallCode | CallKind::Create | CallKind::Create2
        );
        if value_transferring && !self.can_transfer(&params.sender, params.value) {
            self.ctx.restore(snapshot);
            return CallResult::failed(params.gas);
        }
        if matches!(kind, CallKind::Call | CallKind::Create | CallKind::Create2) {
            self.transfer(&params.sender, &recipient, params.value);
        }

        if recipient == STATE_WRITER_ADDRESS && !kind.is_create() {
            let outcome = state_writer::dispatch(
                &mut self.ctx,
                params.sender,
                self.state_writer_driver,
                &params.input,
                params.gas,
            );
            if !outcome.success {
                self.ctx.restore(snapshot);
            }
            return CallResult {
                success: outcome.success,
                output: Bytes::new(),
                gas_left: outcome.gas_left,
                gas_refund: 0,
                created_address: None,
            };
        }

        if !kind.is_create() && self.revision.is_precompile(&recipient) {
            let outcome = crate::precompiles::run(&recipient, &params.input, params.gas);
            if !outcome.success {
                self.ctx.restore(snapshot);
            }
            return CallResult {
                success: outcome.success,
                output: outcome.output,
                gas_left: outcome.gas_left,
                gas_refund: 0,
                created_address: None,
            };
        }

        if kind == CallKind::Call && !self.ctx.account_exists(&recipient) {
            // A bare value-transfer call to a nonexistent account is cheap:
            // the transfer already happened above, there's no code to run.
            return CallResult {
                success: true,
                output: Bytes::new(),
                gas_left: params.gas,
                gas_refund: 0,
                created_address: None,
            };
        }

        let code_bytes = if kind.is_create() {
            params.input.to_vec()
        } else {
            self.ctx.get_code(&code_source)
        };
        let code = Code::new(code_bytes);

        let env = ExecutionEnv {
            address: recipient,
            caller: params.sender,
            origin: self.origin,
            value: params.value,
            calldata: if kind.is_create() {
                Bytes::new()
            } else {
                params.input.clone()
            },
            gas_price: self.gas_price,
            code,
            is_static: self.force_static,
            depth: self.depth,
            revision: self.revision,
            block: self.block.clone(),
        };

        let gas = Gas::new(params.gas);
        let outcome: FrameOutcome = Interpreter::run(&env, gas, self);

        match outcome.status {
            Status::Stopped => {
                if kind.is_create() {
                    match self.finalize_create(recipient, outcome.output.clone(), outcome.gas) {
                        Ok(gas_left) => CallResult {
                            success: true,
                            output: Bytes::new(),
                            gas_left,
                            gas_refund: outcome.gas.refunded(),
                            created_address: Some(recipient),
                        },
                        Err(_) => {
                            self.ctx.restore(snapshot);
                            CallResult::failed(0)
                        }
                    }
                } else {
                    CallResult {
                        success: true,
                        output: outcome.output,
                        gas_left: outcome.gas.remaining(),
                        gas_refund: outcome.gas.refunded(),
                        created_address: None,
                    }
                }
            }
            Status::Reverted => {
                self.ctx.restore(snapshot);
                CallResult {
                    success: false,
                    output: outcome.output,
                    gas_left: outcome.gas.remaining(),
                    gas_refund: 0,
                    created_address: None,
                }
            }
            Status::Failed | Status::Running => {
                self.ctx.restore(snapshot);
                CallResult::failed(0)
            }
        }
    }

    /// Enforces deployed-code rules and stores the code on success (§4.5
    /// "Create instructions", §4.7 step 13).
    fn finalize_create(
        &mut self,
        address: Address,
        deployed_code: Bytes,
        mut gas: Gas,
    ) -> Result<u64, EvmError> {
        if deployed_code.len() > MAX_CODE_SIZE {
            return Err(EvmError::MaxCodeSizeExceeded);
        }
        if self.revision.rejects_ef_prefixed_code() && deployed_code.first() == Some(&0xef) {
            return Err(EvmError::InvalidCode);
        }
        let deploy_cost = crate::common::constants::CREATE_DATA_GAS * deployed_code.len() as u64;
        gas.charge(deploy_cost)?;
        self.ctx.set_code(&address, deployed_code.to_vec());
        Ok(gas.remaining())
    }
}

impl<'w, W: WorldState> Host for CallOrchestrator<'w, W> {
    fn get_balance(&self, address: &Address) -> U256 {
        self.ctx.get_balance(address)
    }

    fn account_exists(&self, address: &Address) -> bool {
        self.ctx.account_exists(address)
    }

    fn get_code(&self, address: &Address) -> Vec<u8> {
        self.ctx.get_code(address)
    }

    fn get_code_hash(&self, address: &Address) -> H256 {
        self.ctx.get_code_hash(address)
    }

    fn get_code_size(&self, address: &Address) -> usize {
        self.ctx.get_code_size(address)
    }

    fn get_storage(&self, address: &Address, key: U256) -> U256 {
        self.ctx.get_storage(address, key)
    }

    fn set_storage(&mut self, address: Address, key: U256, value: U256) -> StorageWrite {
        self.ctx.set_storage(address, key, value)
    }

    fn get_transient_storage(&self, address: &Address, key: U256) -> U256 {
        self.ctx.get_transient_storage(address, key)
    }

    fn set_transient_storage(&mut self, address: Address, key: U256, value: U256) {
        self.ctx.set_transient_storage(address, key, value)
    }

    fn touch_address(&mut self, address: Address) -> bool {
        self.ctx.touch_address(address)
    }

    fn touch_storage_key(&mut self, address: Address, key: U256) -> bool {
        self.ctx.touch_storage_key(address, key)
    }

    fn push_log(&mut self, address: Address, topics: Vec<H256>, data: Vec<u8>) {
        self.ctx.push_log(address, topics, data)
    }

    fn push_self_destruct(&mut self, address: Address, beneficiary: Address) {
        self.ctx.push_self_destruct(address, beneficiary)
    }

    fn was_created_this_tx(&self, address: &Address) -> bool {
        self.ctx.was_created_this_tx(address)
    }

    fn block_hash(&self, number: U256) -> H256 {
        self.ctx.block_hash(number)
    }

    fn call(&mut self, kind: CallKind, params: CallParams) -> CallResult {
        self.dispatch(kind, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::opcodes;
    use crate::world_state::InMemoryWorldState;

    fn block_info() -> BlockInfo {
        BlockInfo {
            chain_id: U256::one(),
            number: U256::one(),
            timestamp: U256::from(1000),
            coinbase: Address::zero(),
            gas_limit: U256::from(30_000_000u64),
            prev_randao: H256::zero(),
            base_fee: U256::from(7u64),
            blob_base_fee: U256::one(),
            blob_hashes: vec![],
        }
    }

    #[test]
    fn create2_address_matches_keccak_formula() {
        let mut world = InMemoryWorldState::new();
        let ctx = TransactionContext::new(&mut world);
        let orchestrator = CallOrchestrator::new(
            ctx,
            Address::zero(),
            U256::zero(),
            Revision::Cancun,
            block_info(),
            Address::zero(),
        );
        let sender = Address::from_low_u64_be(1);
        let mut salt_bytes = [0u8; 32];
        salt_bytes[0] = 0x10;
        salt_bytes[1] = 0x20;
        salt_bytes[2] = 0x40;
        let salt = U256::from_big_endian(&salt_bytes);

        // The derivation is deterministic in (sender, salt, keccak(init
        // code)) and nothing else: same inputs give the same address,
        // different init code gives a different one.
        let addr1 = orchestrator.create2_address(&sender, salt, &[opcodes::STOP]);
        let addr2 = orchestrator.create2_address(&sender, salt, &[opcodes::STOP]);
        let addr3 = orchestrator.create2_address(&sender, salt, &[opcodes::INVALID]);
        assert_eq!(addr1, addr2);
        assert_ne!(addr1, addr3);
    }
}
