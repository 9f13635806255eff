//! The `WorldState` collaborator (§6): the abstract, externally-owned chain
//! state the interpreter and processor read and write through. Concrete
//! persistent storage is out of scope (§1) — this module defines only the
//! trait and a simple in-memory implementation used by the conformance
//! harness and unit tests.

use ethereum_types::{Address, H256, U256};
use std::collections::HashMap;

/// Outcome of a storage write, used by `SSTORE` to pick a gas/refund
/// bracket (§3, §4.5). This is the backend's report of `(original,
/// current, new)`; the actual classification into one of the nine named
/// statuses happens in `interpreter::gas_table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageWrite {
    pub original: U256,
    pub current: U256,
    pub new: U256,
}

/// Abstract persistent chain state (§6). Implementors need not be
/// transactional — `TransactionContext` layers snapshot/rollback on top.
pub trait WorldState {
    fn account_exists(&self, address: &Address) -> bool;

    fn get_balance(&self, address: &Address) -> U256;
    fn set_balance(&mut self, address: &Address, balance: U256);

    fn get_nonce(&self, address: &Address) -> U256;
    fn set_nonce(&mut self, address: &Address, nonce: U256);

    fn get_code(&self, address: &Address) -> Vec<u8>;
    fn set_code(&mut self, address: &Address, code: Vec<u8>);
    fn get_code_hash(&self, address: &Address) -> H256;
    fn get_code_size(&self, address: &Address) -> usize;

    fn get_storage(&self, address: &Address, key: U256) -> U256;

    /// Writes `value` to `(address, key)` and reports the write's
    /// `(original, current, new)` triple for `SSTORE` gas/refund pricing.
    /// `original` is the value at the start of the *transaction*, which
    /// the caller (the transaction context) is responsible for tracking —
    /// a bare `WorldState` only knows the value before this particular
    /// write, so implementations return `current` as `original` and let
    /// the transaction context correct it from its own per-slot cache.
    fn set_storage(&mut self, address: &Address, key: U256, value: U256) -> StorageWrite;

    /// Marks `address` self-destructed with proceeds going to
    /// `beneficiary`. Returns `true` if this is the first time this
    /// address has been marked in the lifetime of this world state (used
    /// by implementations that fold `SELFDESTRUCT` bookkeeping into the
    /// backend rather than the transaction context).
    fn self_destruct(&mut self, address: &Address, beneficiary: &Address) -> bool;

    fn block_hash(&self, number: U256) -> H256;
}

#[derive(Debug, Clone, Default)]
struct Account {
    nonce: U256,
    balance: U256,
    code: Vec<u8>,
    code_hash: H256,
    storage: HashMap<U256, U256>,
}

/// A plain in-memory `WorldState`, used by the conformance harness (§2.12)
/// to project test-fixture pre-state and by unit tests. Not a trie — no
/// root hash is computed, matching the Non-goal "no state-trie
/// implementation" (§1).
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorldState {
    accounts: HashMap<Address, Account>,
    block_hashes: HashMap<U256, H256>,
}

impl InMemoryWorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block_hash(&mut self, number: U256, hash: H256) {
        self.block_hashes.insert(number, hash);
    }

    fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    fn account_mut(&mut self, address: &Address) -> &mut Account {
        self.accounts.entry(*address).or_default()
    }
}

impl WorldState for InMemoryWorldState {
    fn account_exists(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    fn get_balance(&self, address: &Address) -> U256 {
        self.account(address).map(|a| a.balance).unwrap_or_default()
    }

    fn set_balance(&mut self, address: &Address, balance: U256) {
        self.account_mut(address).balance = balance;
    }

    fn get_nonce(&self, address: &Address) -> U256 {
        self.account(address).map(|a| a.nonce).unwrap_or_default()
    }

    fn set_nonce(&mut self, address: &Address, nonce: U256) {
        self.account_mut(address).nonce = nonce;
    }

    fn get_code(&self, address: &Address) -> Vec<u8> {
        self.account(address).map(|a| a.code.clone()).unwrap_or_default()
    }

    fn set_code(&mut self, address: &Address, code: Vec<u8>) {
        let hash = crate::common::crypto::keccak256(&code);
        let account = self.account_mut(address);
        account.code = code;
        account.code_hash = hash;
    }

    fn get_code_hash(&self, address: &Address) -> H256 {
        self.account(address)
            .map(|a| a.code_hash)
            .unwrap_or(crate::common::constants::hashes::EMPTY_CODE_HASH)
    }

    fn get_code_size(&self, address: &Address) -> usize {
        self.account(address).map(|a| a.code.len()).unwrap_or(0)
    }

    fn get_storage(&self, address: &Address, key: U256) -> U256 {
        self.account(address)
            .and_then(|a| a.storage.get(&key).copied())
            .unwrap_or_default()
    }

    fn set_storage(&mut self, address: &Address, key: U256, value: U256) -> StorageWrite {
        let account = self.account_mut(address);
        let current = account.storage.get(&key).copied().unwrap_or_default();
        account.storage.insert(key, value);
        StorageWrite {
            original: current,
            current,
            new: value,
        }
    }

    fn self_destruct(&mut self, address: &Address, beneficiary: &Address) -> bool {
        if let Some(account) = self.accounts.remove(address) {
            if address != beneficiary {
                let target = self.account_mut(beneficiary);
                target.balance += account.balance;
            }
            true
        } else {
            false
        }
    }

    fn block_hash(&self, number: U256) -> H256 {
        self.block_hashes.get(&number).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_account_reads_as_empty() {
        let state = InMemoryWorldState::new();
        let addr = Address::repeat_byte(0x11);
        assert!(!state.account_exists(&addr));
        assert_eq!(state.get_balance(&addr), U256::zero());
        assert_eq!(state.get_code_hash(&addr), crate::common::constants::hashes::EMPTY_CODE_HASH);
    }

    #[test]
    fn self_destruct_sweeps_balance_to_beneficiary() {
        let mut state = InMemoryWorldState::new();
        let victim = Address::repeat_byte(0x01);
        let beneficiary = Address::repeat_byte(0x02);
        state.set_balance(&victim, U256::from(100));
        assert!(state.self_destruct(&victim, &beneficiary));
        assert!(!state.account_exists(&victim));
        assert_eq!(state.get_balance(&beneficiary), U256::from(100));
    }
}
