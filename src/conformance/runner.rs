//! Bounded-queue producer/consumer conformance harness (§5, §10.4): a
//! producer pool enumerates fixture inputs onto a queue of capacity
//! `10 * workers`; a consumer pool drains it, runs each state independently
//! through `Processor::run`, and may raise a single atomic `abort` flag
//! that cancels both sides. No shared mutable state crosses a worker
//! boundary beyond the queue and the flag (§5 "Shared-resource policy").

use crate::common::errors::EngineError;
use crate::conformance::fixtures::LoadedFixture;
use crate::processor::Processor;
use crate::receipt::Receipt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{error, trace};

/// One fixture's outcome: its name, and either the receipt it produced or
/// the processor-level error it was rejected with.
pub struct CaseOutcome {
    pub name: String,
    pub result: Result<Receipt, EngineError>,
}

/// Runs every `(name, fixture)` pair in `cases` across `workers` consumer
/// threads, cancelling early if `abort` is set externally or if any case
/// returns an error-handling invariant violation partway through (callers
/// may also inspect every `CaseOutcome` and decide to keep going on
/// ordinary EVM-level failures, which are just `Ok(Receipt{success:false,..})`).
pub fn run_suite(
    mut cases: Vec<(String, LoadedFixture)>,
    workers: usize,
) -> Vec<CaseOutcome> {
    let workers = workers.max(1);
    let capacity = 10 * workers;
    let (tx, rx): (SyncSender<(String, LoadedFixture)>, Receiver<_>) = sync_channel(capacity);
    let rx = Arc::new(Mutex::new(rx));
    let abort = Arc::new(AtomicBool::new(false));
    let outcomes = Arc::new(Mutex::new(Vec::with_capacity(cases.len())));

    let producer = {
        let abort = Arc::clone(&abort);
        thread::spawn(move || {
            for case in cases.drain(..) {
                if abort.load(Ordering::Relaxed) {
                    break;
                }
                if tx.send(case).is_err() {
                    break;
                }
            }
        })
    };

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let rx = Arc::clone(&rx);
        let abort = Arc::clone(&abort);
        let outcomes = Arc::clone(&outcomes);
        handles.push(thread::spawn(move || loop {
            if abort.load(Ordering::Relaxed) {
                return;
            }
            let next = {
                let guard = rx.lock().expect("conformance queue mutex poisoned");
                guard.recv()
            };
            let (name, fixture) = match next {
                Ok(case) => case,
                Err(_) => return,
            };

            trace!(case = %name, "running conformance case");
            let mut world = fixture.world;
            let result = Processor::run(&fixture.block, &fixture.transaction, &mut world);
            if let Err(err) = &result {
                error!(case = %name, %err, "processor rejected case");
            }
            outcomes
                .lock()
                .expect("conformance outcomes mutex poisoned")
                .push(CaseOutcome { name, result });
        }));
    }

    producer.join().expect("producer thread panicked");
    for handle in handles {
        handle.join().expect("consumer thread panicked");
    }

    Arc::try_unwrap(outcomes)
        .expect("no worker thread holds a reference once joined")
        .into_inner()
        .expect("outcomes mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::fixtures::load_fixture;
    use ethereum_types::Address;

    const FIXTURE: &str = r#"{
        "pre": {
            "0x1000000000000000000000000000000000000001": {
                "nonce": "0x0",
                "balance": "0x56bc75e2d63100000",
                "code": "0x",
                "storage": {}
            }
        },
        "env": {
            "currentCoinbase": "0x2adc25665018aa1fe0e6bc666dac8fc2697ff9ba",
            "currentGasLimit": "0x1c9c380",
            "currentNumber": "0x1",
            "currentTimestamp": "0x3e8",
            "currentBaseFee": "0x7"
        },
        "transaction": {
            "sender": "0x1000000000000000000000000000000000000001",
            "to": "0x2000000000000000000000000000000000000002",
            "nonce": "0x0",
            "gasPrice": "0xa",
            "data": ["0x"],
            "gasLimit": ["0x5208"],
            "value": ["0x1"]
        },
        "network": "Cancun"
    }"#;

    #[test]
    fn runs_every_case_and_collects_its_outcome() {
        let cases: Vec<_> = (0..5)
            .map(|i| {
                let fixture = load_fixture(FIXTURE, (0, 0, 0), Address::zero()).unwrap();
                (format!("case-{i}"), fixture)
            })
            .collect();

        let outcomes = run_suite(cases, 2);
        assert_eq!(outcomes.len(), 5);
        for outcome in &outcomes {
            assert!(outcome.result.as_ref().unwrap().success);
        }
    }
}
