//! Gas-metered EVM interpreter and transaction processor (§1, §2):
//! a 256-bit stack machine over byte-addressable memory, a recursive call
//! orchestrator implementing CALL/CREATE and their variants, the standard
//! precompile set plus a chain-specific state-writer, and a transaction
//! processor tying intrinsic gas, nonce checks, and refunds together.

pub mod access_list;
pub mod call;
pub mod code;
pub mod common;
pub mod conformance;
pub mod context;
pub mod gas;
pub mod interpreter;
pub mod memory;
pub mod precompiles;
pub mod primitives;
pub mod processor;
pub mod receipt;
pub mod registry;
pub mod revision;
pub mod stack;
pub mod state_writer;
pub mod transaction;
pub mod world_state;

pub use call::{CallKind, CallOrchestrator, CallParams, CallResult};
pub use context::TransactionContext;
pub use gas::Gas;
pub use processor::Processor;
pub use receipt::Receipt;
pub use revision::Revision;
pub use transaction::{BlockParams, Transaction};
pub use world_state::WorldState;
