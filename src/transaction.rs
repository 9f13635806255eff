//! Processor inputs (§6): the transaction and block-parameter shapes the
//! orchestrator is invoked with. No wire-level RLP transaction envelope is
//! decoded here (§1 non-goal) — fields arrive already parsed, the way the
//! conformance harness's fixture loader and an embedding binary would
//! supply them.

use crate::common::crypto::{recover_address, sign_prehash};
use crate::revision::Revision;
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use k256::ecdsa::SigningKey;

/// One EIP-2930 access-list entry (§4.10 step 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<U256>,
}

/// A transaction ready for `Processor::run` (§6 "Processor inputs").
#[derive(Debug, Clone)]
pub struct Transaction {
    pub sender: Address,
    /// Absent for a contract-creation transaction.
    pub recipient: Option<Address>,
    pub nonce: U256,
    pub input: Bytes,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub access_list: Vec<AccessListItem>,
}

impl Transaction {
    pub fn is_create(&self) -> bool {
        self.recipient.is_none()
    }

    /// §4.10 step 2: `21000`/`53000` base, `+16`/`+4` per non-zero/zero
    /// input byte, `+2400`/`+1900` per access-list address/storage key.
    pub fn intrinsic_gas(&self) -> u64 {
        use crate::common::constants::{
            ACCESS_LIST_ADDRESS_GAS, ACCESS_LIST_STORAGE_KEY_GAS, TX_CREATE_GAS, TX_DATA_NON_ZERO_GAS,
            TX_DATA_ZERO_GAS, TX_GAS,
        };

        let base = if self.is_create() { TX_CREATE_GAS } else { TX_GAS };
        let (zero_bytes, non_zero_bytes) = self
            .input
            .iter()
            .fold((0u64, 0u64), |(z, n), b| if *b == 0 { (z + 1, n) } else { (z, n + 1) });
        let data_gas = zero_bytes * TX_DATA_ZERO_GAS + non_zero_bytes * TX_DATA_NON_ZERO_GAS;
        let access_list_gas = self
            .access_list
            .iter()
            .fold(0u64, |acc, item| {
                acc + ACCESS_LIST_ADDRESS_GAS + item.storage_keys.len() as u64 * ACCESS_LIST_STORAGE_KEY_GAS
            });

        base + data_gas + access_list_gas
    }
}

/// Per-block configuration the processor and every call frame it spawns
/// read from (§6 "Processor inputs", block parameters; §10.3).
#[derive(Debug, Clone)]
pub struct BlockParams {
    pub chain_id: U256,
    pub block_number: U256,
    pub timestamp: U256,
    pub coinbase: Address,
    pub gas_limit: U256,
    pub prev_randao: H256,
    pub base_fee: U256,
    pub blob_base_fee: U256,
    pub revision: Revision,
    /// Cancun `BLOBHASH` operand source (§4.5 "Blob-related opcodes").
    pub blob_hashes: Vec<H256>,
    /// The single caller authorized to invoke the state-writer precompile
    /// (§4.9). Chain-specific configuration, carried alongside the rest of
    /// the block parameters rather than hardcoded.
    pub state_writer_driver: Address,
}

/// Recovers the sender address a conformance fixture's secret key would
/// sign with, for test states that supply a key rather than an address
/// (§11 "Transaction sender recovery"). Not used by `Processor::run`
/// itself, which takes `sender` directly per §6.
pub fn sender_from_secret_key(secret_key_bytes: &[u8; 32], message_hash: H256) -> Option<Address> {
    let secret_key = k256::SecretKey::from_bytes(secret_key_bytes.into()).ok()?;
    let signing_key = SigningKey::from(secret_key);
    let (r, s, recovery_id) = sign_prehash(message_hash, &signing_key);
    recover_address(
        message_hash,
        U256::from_big_endian(r.as_bytes()),
        U256::from_big_endian(s.as_bytes()),
        recovery_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_tx() -> Transaction {
        Transaction {
            sender: Address::repeat_byte(0x01),
            recipient: Some(Address::repeat_byte(0x02)),
            nonce: U256::zero(),
            input: Bytes::new(),
            value: U256::zero(),
            gas_limit: 100_000,
            gas_price: U256::from(1),
            access_list: vec![],
        }
    }

    #[test]
    fn plain_call_with_no_data_costs_the_flat_intrinsic_gas() {
        assert_eq!(base_tx().intrinsic_gas(), 21000);
    }

    #[test]
    fn create_transaction_uses_the_higher_base_and_counts_input_bytes() {
        let mut tx = base_tx();
        tx.recipient = None;
        tx.input = Bytes::from(vec![0x00, 0x01, 0x02]);
        assert_eq!(tx.intrinsic_gas(), 53000 + 4 + 16 + 16);
    }

    #[test]
    fn access_list_entries_add_their_own_cost() {
        let mut tx = base_tx();
        tx.access_list.push(AccessListItem {
            address: Address::repeat_byte(0x03),
            storage_keys: vec![U256::from(1), U256::from(2)],
        });
        assert_eq!(tx.intrinsic_gas(), 21000 + 2400 + 2 * 1900);
    }

    #[test]
    fn sender_recovery_round_trips_through_a_signature() {
        let secret_key_bytes = [0x11u8; 32];
        let message_hash = crate::common::crypto::keccak256(b"a transaction body");
        let recovered = sender_from_secret_key(&secret_key_bytes, message_hash);
        assert!(recovered.is_some());
    }
}
