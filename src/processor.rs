//! Top-level transaction processor (§2.11, §4.10): the seven-step
//! buy-gas/intrinsic-gas/nonce/call/refund/repay/receipt pipeline that
//! drives one `CallOrchestrator` invocation per transaction.

use crate::call::{CallKind, CallOrchestrator, CallParams};
use crate::common::constants::{EXTERNAL_TX_BURN_DENOMINATOR, GAS_PER_BLOB};
use crate::common::errors::EngineError;
use crate::context::TransactionContext;
use crate::interpreter::BlockInfo;
use crate::receipt::Receipt;
use crate::transaction::{BlockParams, Transaction};
use crate::world_state::WorldState;
use ethereum_types::{Address, U256};
use tracing::{debug, instrument};

pub struct Processor;

impl Processor {
    /// Runs one transaction to completion against `world`, per §4.10's
    /// seven steps. Returns `Err` only for the processor-level rejections
    /// §7 calls out (nonce mismatch, insufficient gas funds, unsupported
    /// revision) — every EVM-level failure still produces an `Ok` receipt
    /// with `success = false`.
    #[instrument(skip(world, transaction), fields(sender = ?transaction.sender, nonce = %transaction.nonce))]
    pub fn run<W: WorldState>(
        block: &BlockParams,
        transaction: &Transaction,
        world: &mut W,
    ) -> Result<Receipt, EngineError> {
        let tx = transaction;
        let mut ctx = TransactionContext::new(world);

        // Step 3 (nonce check moved ahead of the gas purchase so a bad
        // nonce never touches the sender's balance).
        let account_nonce = ctx.get_nonce(&tx.sender);
        if account_nonce != tx.nonce {
            return Err(EngineError::NonceMismatch {
                expected: tx.nonce.low_u64(),
                actual: account_nonce.low_u64(),
            });
        }

        // Step 1: buy gas.
        let gas_cost = U256::from(tx.gas_limit) * tx.gas_price;
        let sender_balance = ctx.get_balance(&tx.sender);
        if sender_balance < gas_cost {
            return Err(EngineError::InsufficientGasFunds {
                needed: gas_cost,
                available: sender_balance,
            });
        }
        ctx.set_balance(&tx.sender, sender_balance - gas_cost);

        // Step 2: intrinsic gas.
        let intrinsic = tx.intrinsic_gas();
        if tx.gas_limit < intrinsic {
            debug!(intrinsic, limit = tx.gas_limit, "intrinsic gas exceeds limit");
            return Ok(Receipt::new(false, bytes::Bytes::new(), None, tx.gas_limit, 0, vec![]));
        }

        // Step 3 (continued): non-create calls bump the sender's nonce
        // here; creates bump it inside the orchestrator (§4.7 step 4).
        if !tx.is_create() {
            ctx.set_nonce(&tx.sender, account_nonce + U256::one());
        }

        if block.revision.has_access_lists() {
            ctx.touch_address(tx.sender);
            if let Some(recipient) = tx.recipient {
                ctx.touch_address(recipient);
            }
        }
        for item in &tx.access_list {
            ctx.preload_access_list(item.address, &item.storage_keys);
        }

        // Step 4: call.
        let block_info = BlockInfo {
            chain_id: block.chain_id,
            number: block.block_number,
            timestamp: block.timestamp,
            coinbase: block.coinbase,
            gas_limit: block.gas_limit,
            prev_randao: block.prev_randao,
            base_fee: block.base_fee,
            blob_base_fee: block.blob_base_fee,
            blob_hashes: block.blob_hashes.clone(),
        };
        let mut orchestrator = CallOrchestrator::new(
            ctx,
            tx.sender,
            tx.gas_price,
            block.revision,
            block_info,
            block.state_writer_driver,
        );
        let kind = if tx.is_create() { CallKind::Create } else { CallKind::Call };
        let params = CallParams {
            sender: tx.sender,
            recipient: tx.recipient,
            value: tx.value,
            input: tx.input.clone(),
            gas: tx.gas_limit - intrinsic,
            salt: None,
            code_address: None,
        };
        let result = orchestrator.run(kind, params);

        let mut ctx = orchestrator.into_context();

        // Finalize self-destructs (§4.5 "Self-destruct", EIP-6780): from
        // Cancun on, only an account created earlier in this very
        // transaction is fully wiped; otherwise just its balance moves.
        let self_destructs = ctx.self_destructs().to_vec();
        for entry in &self_destructs {
            let full_destroy = if block.revision.has_selfdestruct_same_tx_only() {
                ctx.was_created_this_tx(&entry.address)
            } else {
                true
            };
            ctx.finalize_self_destruct(entry, full_destroy);
        }

        // Step 5: refund.
        let mut remaining = result.gas_left;
        if tx.sender != Address::zero() {
            remaining -= remaining / EXTERNAL_TX_BURN_DENOMINATOR;
        }
        if result.success {
            let gas_used_so_far = tx.gas_limit - result.gas_left;
            let cap = gas_used_so_far / block.revision.refund_denominator();
            let refund = (result.gas_refund.max(0) as u64).min(cap);
            remaining += refund;
        }

        // Step 6: gas repay.
        let sender_balance = ctx.get_balance(&tx.sender);
        ctx.set_balance(&tx.sender, sender_balance + U256::from(remaining) * tx.gas_price);

        // Step 7: assemble receipt.
        let gas_used = tx.gas_limit - remaining;
        let blob_gas_used = block.blob_hashes.len() as u64 * GAS_PER_BLOB;
        Ok(Receipt::new(
            result.success,
            result.output,
            result.created_address,
            gas_used,
            blob_gas_used,
            ctx.logs(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::opcodes;
    use crate::revision::Revision;
    use crate::world_state::InMemoryWorldState;
    use bytes::Bytes;
    use ethereum_types::H256;

    fn block_params() -> BlockParams {
        BlockParams {
            chain_id: U256::one(),
            block_number: U256::one(),
            timestamp: U256::from(1000),
            coinbase: Address::zero(),
            gas_limit: U256::from(30_000_000u64),
            prev_randao: H256::zero(),
            base_fee: U256::from(1),
            blob_base_fee: U256::one(),
            revision: Revision::Cancun,
            blob_hashes: vec![],
            state_writer_driver: Address::repeat_byte(0xee),
        }
    }

    #[test]
    fn nonce_mismatch_is_a_processor_error() {
        let mut world = InMemoryWorldState::new();
        let sender = Address::repeat_byte(0x01);
        world.set_balance(&sender, U256::from(10_000_000u64));
        let tx = Transaction {
            sender,
            recipient: Some(Address::repeat_byte(0x02)),
            nonce: U256::from(5),
            input: Bytes::new(),
            value: U256::zero(),
            gas_limit: 100_000,
            gas_price: U256::from(1),
            access_list: vec![],
        };
        let result = Processor::run(&block_params(), &tx, &mut world);
        assert!(matches!(result, Err(EngineError::NonceMismatch { .. })));
    }

    #[test]
    fn insufficient_balance_for_gas_purchase_is_a_processor_error() {
        let mut world = InMemoryWorldState::new();
        let sender = Address::repeat_byte(0x01);
        let tx = Transaction {
            sender,
            recipient: Some(Address::repeat_byte(0x02)),
            nonce: U256::zero(),
            input: Bytes::new(),
            value: U256::zero(),
            gas_limit: 100_000,
            gas_price: U256::from(1),
            access_list: vec![],
        };
        let result = Processor::run(&block_params(), &tx, &mut world);
        assert!(matches!(result, Err(EngineError::InsufficientGasFunds { .. })));
    }

    #[test]
    fn gas_limit_below_intrinsic_yields_a_failed_receipt_consuming_everything() {
        let mut world = InMemoryWorldState::new();
        let sender = Address::repeat_byte(0x01);
        world.set_balance(&sender, U256::from(10_000_000u64));
        let tx = Transaction {
            sender,
            recipient: Some(Address::repeat_byte(0x02)),
            nonce: U256::zero(),
            input: Bytes::new(),
            value: U256::zero(),
            gas_limit: 100,
            gas_price: U256::from(1),
            access_list: vec![],
        };
        let receipt = Processor::run(&block_params(), &tx, &mut world).unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.gas_used, 100);
    }

    #[test]
    fn a_bare_value_transfer_call_succeeds_and_repays_leftover_gas() {
        let mut world = InMemoryWorldState::new();
        let sender = Address::repeat_byte(0x01);
        let recipient = Address::repeat_byte(0x02);
        world.set_balance(&sender, U256::from(10_000_000u64));
        let tx = Transaction {
            sender,
            recipient: Some(recipient),
            nonce: U256::zero(),
            input: Bytes::new(),
            value: U256::from(1000),
            gas_limit: 21_000,
            gas_price: U256::from(1),
            access_list: vec![],
        };
        let receipt = Processor::run(&block_params(), &tx, &mut world).unwrap();
        assert!(receipt.success);
        assert_eq!(world.get_balance(&recipient), U256::from(1000));
        assert_eq!(world.get_nonce(&sender), U256::one());
    }

    #[test]
    fn contract_creation_deploys_code_and_returns_its_address() {
        let mut world = InMemoryWorldState::new();
        let sender = Address::repeat_byte(0x01);
        world.set_balance(&sender, U256::from(10_000_000u64));

        // PUSH1 0 PUSH1 0 RETURN: deploys zero-length code.
        let init_code = vec![
            opcodes::PUSH1, 0x00,
            opcodes::PUSH1, 0x00,
            opcodes::RETURN,
        ];
        let tx = Transaction {
            sender,
            recipient: None,
            nonce: U256::zero(),
            input: Bytes::from(init_code),
            value: U256::zero(),
            gas_limit: 200_000,
            gas_price: U256::from(1),
            access_list: vec![],
        };
        let receipt = Processor::run(&block_params(), &tx, &mut world).unwrap();
        assert!(receipt.success);
        assert!(receipt.created_address.is_some());
    }
}
