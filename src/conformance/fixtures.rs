//! JSON state-test fixture loader (§2.12, §10.4), in the shape of the
//! general state tests: a `pre` state keyed by address, an `env` block
//! header, and a `transaction` with per-index data/gasLimit/value arrays.
//! Grounded on the teacher's `tests/common/parsers.rs`, trimmed to the
//! fields this engine's `Processor` actually consumes.

use crate::revision::Revision;
use crate::transaction::{AccessListItem, BlockParams, Transaction};
use crate::world_state::{InMemoryWorldState, WorldState};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use hex::FromHex;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct RawAccount {
    pub nonce: String,
    pub balance: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub storage: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct RawEnv {
    #[serde(rename = "currentCoinbase")]
    pub coinbase: String,
    #[serde(rename = "currentGasLimit")]
    pub gas_limit: String,
    #[serde(rename = "currentNumber")]
    pub number: String,
    #[serde(rename = "currentTimestamp")]
    pub timestamp: String,
    #[serde(rename = "currentBaseFee", default)]
    pub base_fee: Option<String>,
    #[serde(rename = "currentRandom", default)]
    pub random: Option<String>,
    #[serde(rename = "currentBlobBaseFee", default)]
    pub blob_base_fee: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawAccessListItem {
    pub address: String,
    #[serde(rename = "storageKeys", default)]
    pub storage_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub to: String,
    pub nonce: String,
    #[serde(rename = "gasPrice", default)]
    pub gas_price: Option<String>,
    pub data: Vec<String>,
    #[serde(rename = "gasLimit")]
    pub gas_limit: Vec<String>,
    pub value: Vec<String>,
    #[serde(rename = "accessLists", default)]
    pub access_lists: Vec<Vec<RawAccessListItem>>,
}

#[derive(Debug, Deserialize)]
pub struct RawFixture {
    pub pre: HashMap<String, RawAccount>,
    pub env: RawEnv,
    pub transaction: RawTransaction,
    /// Fork name selecting the active indices into the `data`/`gasLimit`/
    /// `value` arrays and the protocol revision, e.g. `"Cancun"`.
    #[serde(default)]
    pub network: String,
}

fn parse_u256(s: &str) -> U256 {
    match s.strip_prefix("0x") {
        Some(stripped) if !stripped.is_empty() => U256::from_str_radix(stripped, 16).unwrap_or_default(),
        Some(_) => U256::zero(),
        None => U256::from_dec_str(s).unwrap_or_default(),
    }
}

fn parse_u64(s: &str) -> u64 {
    parse_u256(s).low_u64()
}

fn parse_bytes(s: &str) -> Vec<u8> {
    match s.strip_prefix("0x") {
        Some(stripped) => Vec::from_hex(stripped).unwrap_or_default(),
        None => Vec::new(),
    }
}

fn parse_address(s: &str) -> Address {
    let bytes = parse_bytes(s);
    let mut buf = [0u8; 20];
    let n = bytes.len().min(20);
    buf[..n].copy_from_slice(&bytes[..n]);
    Address::from(buf)
}

fn parse_h256(s: &str) -> H256 {
    let bytes = parse_bytes(s);
    let mut buf = [0u8; 32];
    let n = bytes.len().min(32);
    buf[..n].copy_from_slice(&bytes[..n]);
    H256::from(buf)
}

fn revision_from_network(name: &str) -> Revision {
    match name {
        "Istanbul" => Revision::Istanbul,
        "Berlin" => Revision::Berlin,
        "London" => Revision::London,
        "Paris" | "Merge" => Revision::Paris,
        "Shanghai" => Revision::Shanghai,
        _ => Revision::Cancun,
    }
}

/// A loaded fixture: the pre-state world, the single transaction to run
/// (selecting index `indices` into the parallel `data`/`gasLimit`/`value`
/// arrays, per the general-state-test convention), and the block
/// parameters it runs against.
pub struct LoadedFixture {
    pub world: InMemoryWorldState,
    pub transaction: Transaction,
    pub block: BlockParams,
}

/// Parses one general-state-test-shaped fixture and selects the
/// `(data_index, gas_index, value_index)` transaction variant (state
/// tests fan one "transaction" entry out across several such indices).
pub fn load_fixture(
    json: &str,
    indices: (usize, usize, usize),
    state_writer_driver: Address,
) -> Result<LoadedFixture, serde_json::Error> {
    let raw: RawFixture = serde_json::from_str(json)?;
    let mut world = InMemoryWorldState::new();

    for (addr_str, account) in &raw.pre {
        let address = parse_address(addr_str);
        world.set_balance(&address, parse_u256(&account.balance));
        world.set_nonce(&address, parse_u256(&account.nonce));
        if !account.code.is_empty() {
            world.set_code(&address, parse_bytes(&account.code));
        }
        for (k, v) in &account.storage {
            world.set_storage(&address, parse_u256(k), parse_u256(v));
        }
    }

    let (data_idx, gas_idx, value_idx) = indices;
    let sender = raw
        .transaction
        .sender
        .as_deref()
        .map(parse_address)
        .unwrap_or_default();
    let recipient = if raw.transaction.to.trim().is_empty() {
        None
    } else {
        Some(parse_address(&raw.transaction.to))
    };
    let access_list = raw
        .transaction
        .access_lists
        .get(data_idx)
        .map(|items| {
            items
                .iter()
                .map(|item| AccessListItem {
                    address: parse_address(&item.address),
                    storage_keys: item.storage_keys.iter().map(|k| parse_u256(k)).collect(),
                })
                .collect()
        })
        .unwrap_or_default();

    let transaction = Transaction {
        sender,
        recipient,
        nonce: parse_u256(&raw.transaction.nonce),
        input: Bytes::from(parse_bytes(&raw.transaction.data[data_idx])),
        value: parse_u256(&raw.transaction.value[value_idx]),
        gas_limit: parse_u64(&raw.transaction.gas_limit[gas_idx]),
        gas_price: raw
            .transaction
            .gas_price
            .as_deref()
            .map(parse_u256)
            .unwrap_or_default(),
        access_list,
    };

    let block = BlockParams {
        chain_id: U256::one(),
        block_number: parse_u256(&raw.env.number),
        timestamp: parse_u256(&raw.env.timestamp),
        coinbase: parse_address(&raw.env.coinbase),
        gas_limit: parse_u256(&raw.env.gas_limit),
        prev_randao: raw.env.random.as_deref().map(parse_h256).unwrap_or_default(),
        base_fee: raw.env.base_fee.as_deref().map(parse_u256).unwrap_or_default(),
        blob_base_fee: raw
            .env
            .blob_base_fee
            .as_deref()
            .map(parse_u256)
            .unwrap_or_else(U256::one),
        revision: revision_from_network(&raw.network),
        blob_hashes: vec![],
        state_writer_driver,
    };

    Ok(LoadedFixture { world, transaction, block })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "pre": {
            "0x1000000000000000000000000000000000000001": {
                "nonce": "0x0",
                "balance": "0x56bc75e2d63100000",
                "code": "0x",
                "storage": {}
            }
        },
        "env": {
            "currentCoinbase": "0x2adc25665018aa1fe0e6bc666dac8fc2697ff9ba",
            "currentGasLimit": "0x1c9c380",
            "currentNumber": "0x1",
            "currentTimestamp": "0x3e8",
            "currentBaseFee": "0x7"
        },
        "transaction": {
            "sender": "0x1000000000000000000000000000000000000001",
            "to": "0x2000000000000000000000000000000000000002",
            "nonce": "0x0",
            "gasPrice": "0xa",
            "data": ["0x"],
            "gasLimit": ["0x5208"],
            "value": ["0x1"]
        },
        "network": "Cancun"
    }"#;

    #[test]
    fn loads_a_minimal_value_transfer_fixture() {
        let loaded = load_fixture(FIXTURE, (0, 0, 0), Address::zero()).unwrap();
        assert_eq!(loaded.transaction.gas_limit, 0x5208);
        assert_eq!(loaded.transaction.value, U256::one());
        assert_eq!(loaded.block.revision, Revision::Cancun);
        assert_eq!(
            loaded.world.get_balance(&parse_address(
                "0x1000000000000000000000000000000000000001"
            )),
            parse_u256("0x56bc75e2d63100000")
        );
    }
}
