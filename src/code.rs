//! Immutable contract code: raw bytes, derived code hash, and a
//! precomputed valid-jumpdest set (§3, §4.5).

use crate::common::constants::hashes;
use crate::common::crypto::keccak256;
use crate::interpreter::opcodes;
use ethereum_types::H256;
use std::collections::HashSet;
use std::sync::Arc;

/// Contract bytecode plus everything derived from it once: its hash and
/// the set of byte offsets where a `JUMP`/`JUMPI` may land.
#[derive(Debug, Clone)]
pub struct Code {
    bytes: Arc<[u8]>,
    hash: H256,
    jumpdests: Arc<HashSet<usize>>,
}

impl Code {
    pub fn new(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        let hash = keccak256(&bytes);
        let jumpdests = Arc::new(analyze_jumpdests(&bytes));
        Self {
            bytes: Arc::from(bytes),
            hash,
            jumpdests,
        }
    }

    pub fn empty() -> Self {
        Self {
            bytes: Arc::from(Vec::new().into_boxed_slice()),
            hash: hashes::EMPTY_CODE_HASH,
            jumpdests: Arc::new(HashSet::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn hash(&self) -> H256 {
        self.hash
    }

    /// Opcode byte at `pc`, or `STOP` (§4.5: "if PC >= code length, behave
    /// as if opcode were STOP") if `pc` runs off the end.
    pub fn opcode_at(&self, pc: usize) -> u8 {
        self.bytes.get(pc).copied().unwrap_or(opcodes::STOP)
    }

    /// A `JUMP`/`JUMPI` to `pc` is valid iff `pc` is inside the code and
    /// lands on a `JUMPDEST` byte that isn't inside a PUSH immediate
    /// (§4.5, §8).
    pub fn is_valid_jump_target(&self, pc: usize) -> bool {
        self.jumpdests.contains(&pc)
    }
}

/// Single pass over the code computing the set of `JUMPDEST` positions
/// that are not inside a preceding `PUSH1`..`PUSH32`'s immediate data.
fn analyze_jumpdests(bytes: &[u8]) -> HashSet<usize> {
    let mut dests = HashSet::new();
    let mut pc = 0usize;
    while pc < bytes.len() {
        let op = bytes[pc];
        if op == opcodes::JUMPDEST {
            dests.insert(pc);
            pc += 1;
        } else if (opcodes::PUSH1..=opcodes::PUSH32).contains(&op) {
            let push_len = (op - opcodes::PUSH1 + 1) as usize;
            pc += 1 + push_len;
        } else {
            pc += 1;
        }
    }
    dests
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jumpdest_inside_push_data_is_invalid() {
        // PUSH1 0x03, JUMP, JUMPDEST — the JUMPDEST at offset 3 is real,
        // but the 0x03 immediate byte at offset 1 looks like JUMPDEST's
        // opcode and must not be treated as a valid target.
        let code = Code::new(vec![
            opcodes::PUSH1,
            opcodes::JUMPDEST,
            opcodes::JUMP,
            opcodes::JUMPDEST,
        ]);
        assert!(!code.is_valid_jump_target(1));
        assert!(code.is_valid_jump_target(3));
    }

    #[test]
    fn empty_code_has_the_canonical_empty_hash() {
        assert_eq!(Code::empty().hash(), hashes::EMPTY_CODE_HASH);
        assert_eq!(Code::new(Vec::new()).hash(), hashes::EMPTY_CODE_HASH);
    }

    #[test]
    fn pc_past_end_reads_as_stop() {
        let code = Code::new(vec![opcodes::PUSH1, 0x01]);
        assert_eq!(code.opcode_at(10), opcodes::STOP);
    }
}
