//! Single-contract bytecode executor (§2.6, §4.5): program counter, stack,
//! memory, gas, and the EVM-accurate status machine. Consumes a [`Host`]
//! for everything outside one frame's own registers — storage, logs,
//! nested calls.

pub mod gas_table;
pub mod host;
pub mod operations;
pub mod opcodes;

pub use host::{BlockInfo, ExecutionEnv, Host};

use crate::common::errors::EvmError;
use crate::gas::Gas;
use crate::memory::Memory;
use crate::stack::Stack;
use bytes::Bytes;

/// The interpreter's run state (§3, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Stopped,
    Reverted,
    Failed,
}

/// The result of running one call frame to completion.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub status: Status,
    pub output: Bytes,
    pub gas: Gas,
    pub error: Option<EvmError>,
}

/// One activation of the interpreter (§2.6 glossary "Frame"). Holds
/// everything private to this frame; everything shared with the rest of
/// the transaction goes through [`Host`].
pub struct Interpreter {
    pub pc: usize,
    pub stack: Stack,
    pub memory: Memory,
    pub gas: Gas,
    pub return_data: Bytes,
    pub status: Status,
}

impl Interpreter {
    pub fn new(gas: Gas) -> Self {
        Self {
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            gas,
            return_data: Bytes::new(),
            status: Status::Running,
        }
    }

    /// Runs `env.code` to completion against `host`, single-stepping
    /// `operations::step` until the status leaves `Running` (§4.5 "Step
    /// semantics"). `code` is passed separately from `env` so the
    /// conformance harness's single-step driver (§2.12) can step one
    /// opcode at a time using the same entry point.
    pub fn run(env: &ExecutionEnv, gas: Gas, host: &mut dyn Host) -> FrameOutcome {
        let mut interp = Interpreter::new(gas);
        loop {
            match operations::step(&mut interp, env, host) {
                Ok(()) => {
                    if interp.status != Status::Running {
                        break;
                    }
                }
                Err(err) => {
                    interp.status = Status::Failed;
                    return finish(interp, Some(err));
                }
            }
        }
        finish(interp, None)
    }
}

fn finish(mut interp: Interpreter, error: Option<EvmError>) -> FrameOutcome {
    match interp.status {
        Status::Reverted => {}
        Status::Failed => interp.gas.consume_all(),
        Status::Stopped | Status::Running => {}
    }
    FrameOutcome {
        status: interp.status,
        output: interp.return_data.clone(),
        gas: interp.gas,
        error,
    }
}
