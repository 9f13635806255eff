//! Signed 64-bit gas counter with deduct-or-fail semantics and a bounded
//! refund accumulator (§3, §4.4).

use crate::common::errors::EvmError;
use crate::revision::Revision;

/// Per-frame gas accounting. `remaining` never goes negative in the
/// observable state: [`Gas::charge`] reports `OutOfGas` instead of letting
/// it go negative, matching §4.4 ("does not roll back the debit — the
/// caller frame is terminated"): the charge that would have gone negative
/// is simply rejected and the frame fails, rather than the meter itself
/// holding a negative value.
#[derive(Debug, Clone, Copy)]
pub struct Gas {
    limit: u64,
    remaining: u64,
    refunded: i64,
}

impl Gas {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            remaining: limit,
            refunded: 0,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn refunded(&self) -> i64 {
        self.refunded
    }

    pub fn used(&self) -> u64 {
        self.limit - self.remaining
    }

    /// Deduct `amount` from the remaining gas. Fails without mutating
    /// state if that would make gas negative.
    pub fn charge(&mut self, amount: u64) -> Result<(), EvmError> {
        match self.remaining.checked_sub(amount) {
            Some(left) => {
                self.remaining = left;
                Ok(())
            }
            None => Err(EvmError::OutOfGas),
        }
    }

    /// Deplete all remaining gas, used when a frame fails with anything
    /// other than `REVERT` (§7: "all gas supplied to the frame is
    /// consumed").
    pub fn consume_all(&mut self) {
        self.remaining = 0;
    }

    /// Credits back gas a call instruction forwarded to a child frame but
    /// the child didn't spend (§4.5 "Call instructions"). The child frame
    /// itself is tracked by the orchestrator, not a `Gas` this frame owns,
    /// so there's no `Gas` to `absorb_child` from — just its leftover.
    pub fn refund_unspent(&mut self, amount: u64) {
        self.remaining += amount;
    }

    pub fn add_refund(&mut self, amount: i64) {
        self.refunded += amount;
    }

    pub fn sub_refund(&mut self, amount: i64) {
        self.refunded -= amount;
    }

    /// Merge a completed child frame's gas-left and refund back into this
    /// (parent) meter. Only called on success; on failure the snapshot
    /// restore handles discarding the child's refund (§4.4).
    pub fn absorb_child(&mut self, child: &Gas) {
        self.remaining += child.remaining;
        self.refunded += child.refunded;
    }

    /// Final refund applied at the end of a transaction, capped per §4.10
    /// step 5 / §8: `gas_used / 2` pre-London, `gas_used / 5` London+.
    pub fn capped_refund(&self, revision: Revision) -> u64 {
        let cap = self.used() / revision.refund_denominator();
        (self.refunded.max(0) as u64).min(cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_past_remaining_is_out_of_gas() {
        let mut gas = Gas::new(100);
        assert_eq!(gas.charge(101), Err(EvmError::OutOfGas));
        assert_eq!(gas.remaining(), 100);
    }

    #[test]
    fn refund_is_capped_at_used_over_denominator() {
        let mut gas = Gas::new(1000);
        gas.charge(400).unwrap();
        gas.add_refund(1000);
        assert_eq!(gas.capped_refund(Revision::Istanbul), 200);
        assert_eq!(gas.capped_refund(Revision::London), 80);
    }
}
