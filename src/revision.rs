//! Protocol revisions (§3, §6): the single configuration axis that gates
//! opcode availability, gas tables, refund caps, and precompile sets.

use crate::common::constants::{REFUND_DENOMINATOR_ISTANBUL, REFUND_DENOMINATOR_LONDON};
use ethereum_types::Address;

/// A named protocol version. Variants are ordered chronologically so
/// `>=` comparisons ("from Shanghai onward") read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Revision {
    Istanbul,
    Berlin,
    London,
    Paris,
    Shanghai,
    Cancun,
}

impl Revision {
    /// EIP-2929 warm/cold access accounting starts at Berlin.
    pub fn has_access_lists(self) -> bool {
        self >= Revision::Berlin
    }

    /// EIP-3529 reduced refunds and the `SELFDESTRUCT` refund removal
    /// start at London.
    pub fn has_reduced_refunds(self) -> bool {
        self >= Revision::London
    }

    /// `BASEFEE` (EIP-3198) from London onward.
    pub fn has_basefee(self) -> bool {
        self >= Revision::London
    }

    /// `PUSH0` (EIP-3855) from Shanghai onward.
    pub fn has_push0(self) -> bool {
        self >= Revision::Shanghai
    }

    /// Initcode size cap (EIP-3860) from Shanghai onward.
    pub fn has_initcode_size_limit(self) -> bool {
        self >= Revision::Shanghai
    }

    /// Transient storage (`TLOAD`/`TSTORE`, EIP-1153), `MCOPY` (EIP-5656),
    /// `BLOBHASH`/`BLOBBASEFEE` (EIP-4844), and EIP-6780's narrowed
    /// `SELFDESTRUCT` all land in Cancun.
    pub fn has_cancun_opcodes(self) -> bool {
        self >= Revision::Cancun
    }

    /// `SELFDESTRUCT` only fully destroys an account (vs. transferring
    /// balance while keeping code) when it was created earlier in the very
    /// same transaction (EIP-6780, Cancun+).
    pub fn has_selfdestruct_same_tx_only(self) -> bool {
        self >= Revision::Cancun
    }

    /// Deployed code starting with the `0xEF` byte is rejected from London
    /// onward (EIP-3541, reserved for the EOF format).
    pub fn rejects_ef_prefixed_code(self) -> bool {
        self >= Revision::London
    }

    /// Final-refund cap denominator (§4.10 step 5, §8).
    pub fn refund_denominator(self) -> u64 {
        if self.has_reduced_refunds() {
            REFUND_DENOMINATOR_LONDON
        } else {
            REFUND_DENOMINATOR_ISTANBUL
        }
    }

    /// Highest precompile address active at this revision (§4.8, §6).
    pub fn max_precompile_address(self) -> u8 {
        if self.has_cancun_opcodes() {
            0x0a
        } else {
            0x09
        }
    }

    /// Whether `address` names one of the standard precompiles at this
    /// revision. The chain-specific state-writer (§4.9) is handled
    /// separately by the call orchestrator and is revision-independent
    /// (§9 open question: "kept here as revision-independent").
    pub fn is_precompile(self, address: &Address) -> bool {
        let low = address.0;
        low[..19] == [0u8; 19] && low[19] >= 1 && low[19] <= self.max_precompile_address()
    }
}
