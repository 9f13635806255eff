//! Failure kinds. `EvmError` is the set of EVM-level failures a call frame
//! can end in (§7); they are labels, not exceptions — a frame that fails
//! with one of these simply reports `success = false`. `EngineError` is for
//! invariant violations and processor-level rejections that abort before a
//! receipt can be produced.

use thiserror::Error;

/// EVM-level failure kinds (§7). All of these cause a call frame to end
/// with `success = false`; none of them propagate past the call
/// orchestrator as a Rust `Err` at the processor boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvmError {
    OutOfGas,
    StackOverflow,
    StackUnderflow,
    InvalidJump,
    InvalidOpcode,
    WriteProtection,
    ReturnDataOutOfBounds,
    MaxCodeSizeExceeded,
    InvalidCode,
    ContractAddressCollision,
    InsufficientBalance,
    Depth,
    ExecutionReverted,
}

impl EvmError {
    /// `REVERT` is the only failure kind that preserves output and
    /// remaining gas; every other kind consumes all gas supplied to the
    /// frame (§7).
    pub fn is_revert(self) -> bool {
        matches!(self, EvmError::ExecutionReverted)
    }
}

impl std::fmt::Display for EvmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for EvmError {}

/// Processor/engine-level errors: these abort before a receipt is built.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("nonce mismatch: account has {actual}, transaction supplies {expected}")]
    NonceMismatch { expected: u64, actual: u64 },

    #[error("sender balance insufficient to buy gas: need {needed}, have {available}")]
    InsufficientGasFunds {
        needed: ethereum_types::U256,
        available: ethereum_types::U256,
    },

    #[error("gas limit {limit} is below intrinsic gas {intrinsic}")]
    IntrinsicGasExceedsLimit { limit: u64, intrinsic: u64 },

    #[error("unsupported revision for this operation")]
    UnsupportedRevision,

    #[error("sender {0:?} is not an externally-owned account")]
    SenderNotEoa(ethereum_types::Address),

    #[error("internal engine invariant violated: {0}")]
    Invariant(&'static str),
}
