//! EIP-2929 warm/cold access accounting (§3, §4.5). Per-transaction sets of
//! touched addresses and `(address, key)` storage pairs; first touch is
//! cold, every later touch in the same transaction is warm.

use ethereum_types::{Address, U256};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct AccessList {
    addresses: HashSet<Address>,
    storage_keys: HashSet<(Address, U256)>,
}

impl AccessList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `address` warm, returning whether this was the first touch
    /// (i.e. it was previously cold).
    pub fn touch_address(&mut self, address: Address) -> bool {
        self.addresses.insert(address)
    }

    pub fn is_warm_address(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// Marks `(address, key)` warm, returning whether this was the first
    /// touch. Also marks `address` warm — accessing a slot implies
    /// touching its account.
    pub fn touch_storage_key(&mut self, address: Address, key: U256) -> bool {
        self.addresses.insert(address);
        self.storage_keys.insert((address, key))
    }

    pub fn is_warm_storage_key(&self, address: &Address, key: &U256) -> bool {
        self.storage_keys.contains(&(*address, *key))
    }

    /// Seeds the pre-declared access list from an EIP-2930 transaction
    /// (§4.10 step 2). These entries are warm from the start and
    /// contribute to intrinsic gas regardless of whether they're ever
    /// read.
    pub fn preload(&mut self, address: Address, keys: &[U256]) {
        self.addresses.insert(address);
        for key in keys {
            self.storage_keys.insert((address, *key));
        }
    }

    pub fn address_count(&self) -> usize {
        self.addresses.len()
    }

    pub fn storage_key_count(&self) -> usize {
        self.storage_keys.len()
    }

    /// Undoes a single `touch_address` first-touch, for journal replay.
    pub(crate) fn remove_address(&mut self, address: &Address) {
        self.addresses.remove(address);
    }

    /// Undoes a single `touch_storage_key` first-touch, for journal replay.
    pub(crate) fn remove_storage_key(&mut self, address: &Address, key: &U256) {
        self.storage_keys.remove(&(*address, *key));
    }
}
