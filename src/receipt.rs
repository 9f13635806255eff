//! Processor output (§6 "Processor outputs") plus the logs bloom filter
//! supplement (§11): grounded on the teacher's `receipts.rs`, trimmed of
//! RLP encoding and the receipt trie (§1 non-goal: no persistent tries).

use crate::context::Log;
use bytes::Bytes;
use ethereum_types::Address;
use sha3::{Digest, Keccak256};

/// The result of one transaction (§6 "Processor outputs").
#[derive(Debug, Clone)]
pub struct Receipt {
    pub success: bool,
    pub output: Bytes,
    pub created_address: Option<Address>,
    pub gas_used: u64,
    pub blob_gas_used: u64,
    pub logs: Vec<Log>,
    pub logs_bloom: [u8; 256],
}

impl Receipt {
    pub fn new(
        success: bool,
        output: Bytes,
        created_address: Option<Address>,
        gas_used: u64,
        blob_gas_used: u64,
        logs: Vec<Log>,
    ) -> Self {
        let logs_bloom = bloom_filter(&logs);
        Self {
            success,
            output,
            created_address,
            gas_used,
            blob_gas_used,
            logs,
            logs_bloom,
        }
    }
}

/// A 2048-bit logs bloom: three hash-derived bit positions per address and
/// per topic, folded across every log (§11 "Bloom filter on receipts"),
/// identical in shape to the teacher's `receipts::bloom_filter`.
pub fn bloom_filter(logs: &[Log]) -> [u8; 256] {
    let mut bloom = [0u8; 256];

    for log in logs {
        let address_bytes = log.address.as_bytes();
        let iter = std::iter::once(address_bytes).chain(log.topics.iter().map(|t| t.as_bytes()));

        for bytes in iter {
            let hash = Keccak256::digest(bytes);
            for i in [0, 2, 4] {
                let bit_index = ((hash[i] as usize) << 8 | (hash[i + 1] as usize)) % 2048;
                let byte_index = 255 - (bit_index / 8);
                let bit_in_byte = bit_index % 8;
                bloom[byte_index] |= 1 << bit_in_byte;
            }
        }
    }

    bloom
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::H256;

    #[test]
    fn bloom_of_no_logs_is_all_zero() {
        assert_eq!(bloom_filter(&[]), [0u8; 256]);
    }

    #[test]
    fn bloom_sets_bits_for_address_and_topics() {
        let log = Log {
            address: Address::repeat_byte(0x2d),
            topics: vec![H256::from_low_u64_be(3), H256::from_low_u64_be(4)],
            data: vec![0x99, 0x99],
        };
        let bloom = bloom_filter(&[log]);
        assert_ne!(bloom, [0u8; 256]);
    }

    #[test]
    fn receipt_new_computes_its_own_bloom() {
        let log = Log {
            address: Address::repeat_byte(0x01),
            topics: vec![],
            data: vec![],
        };
        let receipt = Receipt::new(true, Bytes::new(), None, 21000, 0, vec![log.clone()]);
        assert_eq!(receipt.logs_bloom, bloom_filter(&[log]));
    }
}
