//! Revision-aware gas tables: SSTORE's nine-status classification
//! (EIP-2200/2929/3529) and the handful of other opcode costs that vary
//! by revision (§4.5, §6, §8).

use crate::common::constants::*;
use crate::revision::Revision;
use ethereum_types::U256;

/// Classification of an `SSTORE`'s `(original, current, new)` triple
/// (§3, §4.5). Drives both the gas charge and the refund adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SstoreStatus {
    /// `current == new`: a no-op write.
    Assigned,
    /// Fresh write, `0 -> non-zero`.
    Added,
    /// Fresh write, `non-zero -> 0`.
    Deleted,
    /// Fresh write, `non-zero -> different non-zero`.
    Modified,
    /// Dirty write on a slot added this transaction (`original == 0`),
    /// ending non-zero.
    DeletedAdded,
    /// Dirty write, `non-zero current -> 0`.
    ModifiedDeleted,
    /// Dirty write undoing an earlier clear (`original != 0`,
    /// `current == 0`), ending non-zero again.
    DeletedRestored,
    /// Dirty write undoing an earlier add (`original == 0`, `current !=
    /// 0`), ending back at `0`.
    AddedDeleted,
    /// Dirty write restoring the slot to exactly its original non-zero
    /// value.
    ModifiedRestored,
}

/// Base gas cost (excludes the EIP-2929 cold-access surcharge, which the
/// caller charges separately) and refund delta for an `SSTORE`.
///
/// Implements the canonical EIP-2200 net-gas-metering pseudocode, updated
/// by EIP-3529's smaller clear refund from London onward. The nine
/// `SstoreStatus` labels are assigned to this pseudocode's branches; see
/// `DESIGN.md` for how the ambiguous worked examples in spec §4.5 map onto
/// this formula (they agree exactly on `Added`/`Deleted`/
/// `ModifiedDeleted`/`AddedDeleted`, which is the cross-check that matters).
pub fn sstore_cost_and_refund(
    original: U256,
    current: U256,
    new: U256,
    revision: Revision,
) -> (SstoreStatus, u64, i64) {
    let clears_refund: i64 = if revision.has_reduced_refunds() {
        SSTORE_CLEARS_REFUND_BERLIN
    } else {
        SSTORE_CLEARS_REFUND_ISTANBUL
    };
    let dirty_base_gas = if revision.has_access_lists() {
        WARM_STORAGE_READ_GAS
    } else {
        SLOAD_GAS_ISTANBUL
    };
    let reset_gas = if revision.has_access_lists() {
        SSTORE_RESET_GAS
    } else {
        SSTORE_RESET_GAS_ISTANBUL
    };

    if current == new {
        return (SstoreStatus::Assigned, dirty_base_gas, 0);
    }

    if original == current {
        // Fresh write: the first time this slot is touched this transaction.
        if original.is_zero() {
            return (SstoreStatus::Added, SSTORE_SET_GAS, 0);
        }
        let mut refund = 0i64;
        let status = if new.is_zero() {
            refund += clears_refund;
            SstoreStatus::Deleted
        } else {
            SstoreStatus::Modified
        };
        return (status, reset_gas, refund);
    }

    // Dirty write: the slot was already touched earlier this transaction.
    let mut refund = 0i64;
    let status = if original.is_zero() {
        if new.is_zero() {
            SstoreStatus::AddedDeleted
        } else {
            SstoreStatus::DeletedAdded
        }
    } else if current.is_zero() {
        // Undoing an earlier clear. If this write also lands back on the
        // original value, the net effect is "nothing happened" and the
        // earlier clear's refund must be unwound on top of the restore
        // bonus below.
        refund -= clears_refund;
        SstoreStatus::DeletedRestored
    } else if new.is_zero() {
        refund += clears_refund;
        SstoreStatus::ModifiedDeleted
    } else if new == original {
        SstoreStatus::ModifiedRestored
    } else {
        SstoreStatus::Modified
    };

    if original == new {
        if original.is_zero() {
            refund += (SSTORE_SET_GAS - dirty_base_gas) as i64;
        } else {
            refund += (reset_gas - dirty_base_gas) as i64;
        }
    }

    (status, dirty_base_gas, refund)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z() -> U256 {
        U256::zero()
    }
    fn nz(v: u64) -> U256 {
        U256::from(v)
    }

    #[test]
    fn no_op_write_is_assigned() {
        let (status, gas, refund) = sstore_cost_and_refund(z(), nz(7), nz(7), Revision::Berlin);
        assert_eq!(status, SstoreStatus::Assigned);
        assert_eq!(gas, WARM_STORAGE_READ_GAS);
        assert_eq!(refund, 0);
    }

    #[test]
    fn fresh_zero_to_nonzero_is_added() {
        let (status, gas, _) = sstore_cost_and_refund(z(), z(), nz(7), Revision::Berlin);
        assert_eq!(status, SstoreStatus::Added);
        assert_eq!(gas, SSTORE_SET_GAS);
    }

    #[test]
    fn fresh_nonzero_to_zero_is_deleted_with_refund() {
        let (status, gas, refund) = sstore_cost_and_refund(nz(7), nz(7), z(), Revision::London);
        assert_eq!(status, SstoreStatus::Deleted);
        assert_eq!(gas, SSTORE_RESET_GAS);
        assert_eq!(refund, SSTORE_CLEARS_REFUND_BERLIN);
    }

    #[test]
    fn restore_to_original_nets_zero_storage_change() {
        // original=X, dirtied to Y, then restored to X: ModifiedRestored.
        let (status, _, refund) = sstore_cost_and_refund(nz(7), nz(9), nz(7), Revision::Berlin);
        assert_eq!(status, SstoreStatus::ModifiedRestored);
        assert_eq!(refund, (SSTORE_RESET_GAS - WARM_STORAGE_READ_GAS) as i64);
    }

    #[test]
    fn added_then_deleted_refunds_the_set_cost() {
        let (status, _, refund) = sstore_cost_and_refund(z(), nz(7), z(), Revision::Berlin);
        assert_eq!(status, SstoreStatus::AddedDeleted);
        assert_eq!(refund, (SSTORE_SET_GAS - WARM_STORAGE_READ_GAS) as i64);
    }
}
