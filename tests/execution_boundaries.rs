//! End-to-end boundary scenarios, driving `Processor::run` against an
//! `InMemoryWorldState` the way the conformance harness does, reproducing
//! the literal cases spec §8 calls out as testable properties.

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

use evm_core::common::constants::STATE_WRITER_ADDRESS;
use evm_core::common::crypto::keccak256;
use evm_core::interpreter::gas_table::{sstore_cost_and_refund, SstoreStatus};
use evm_core::interpreter::opcodes;
use evm_core::revision::Revision;
use evm_core::transaction::{BlockParams, Transaction};
use evm_core::world_state::{InMemoryWorldState, WorldState};
use evm_core::Processor;

fn block_params(revision: Revision) -> BlockParams {
    BlockParams {
        chain_id: U256::one(),
        block_number: U256::one(),
        timestamp: U256::from(1_000u64),
        coinbase: Address::zero(),
        gas_limit: U256::from(30_000_000u64),
        prev_randao: H256::zero(),
        base_fee: U256::from(1),
        blob_base_fee: U256::one(),
        revision,
        blob_hashes: vec![],
        state_writer_driver: Address::repeat_byte(0xee),
    }
}

fn call_tx(sender: Address, recipient: Address, gas_limit: u64) -> Transaction {
    Transaction {
        sender,
        recipient: Some(recipient),
        nonce: U256::zero(),
        input: Bytes::new(),
        value: U256::zero(),
        gas_limit,
        gas_price: U256::from(1),
        access_list: vec![],
    }
}

fn push1(value: u8) -> [u8; 2] {
    [opcodes::PUSH1, value]
}

/// Left-pads `data` into a 32-byte word and returns a `PUSH32` of it.
fn push32_word(data: &[u8]) -> Vec<u8> {
    let mut word = [0u8; 32];
    let n = data.len().min(32);
    word[32 - n..].copy_from_slice(&data[data.len() - n..]);
    let mut out = vec![opcodes::PUSH32];
    out.extend_from_slice(&word);
    out
}

fn funded_world(accounts: &[Address]) -> InMemoryWorldState {
    let mut world = InMemoryWorldState::new();
    for addr in accounts {
        world.set_balance(addr, U256::from(10_000_000_000u64));
    }
    world
}

/// §8 case 1: ADD round-trips through memory and `RETURN`.
#[test]
fn add_result_round_trips_through_memory_and_return() {
    let sender = Address::repeat_byte(0x01);
    let contract = Address::repeat_byte(0x02);
    let mut world = funded_world(&[sender]);

    let mut code = vec![];
    code.extend_from_slice(&push1(2));
    code.extend_from_slice(&push1(3));
    code.push(opcodes::ADD);
    code.extend_from_slice(&push1(0)); // offset
    code.push(opcodes::MSTORE);
    code.extend_from_slice(&push1(32)); // len
    code.extend_from_slice(&push1(0)); // offset
    code.push(opcodes::RETURN);
    world.set_code(&contract, code);

    let tx = call_tx(sender, contract, 100_000);
    let receipt = Processor::run(&block_params(Revision::Cancun), &tx, &mut world).unwrap();

    assert!(receipt.success);
    let mut expected = [0u8; 32];
    expected[31] = 5;
    assert_eq!(&receipt.output[..], &expected[..]);
}

/// §8 case 2: popping an empty stack fails the call, not the process.
#[test]
fn stack_underflow_fails_the_call_cleanly() {
    let sender = Address::repeat_byte(0x01);
    let contract = Address::repeat_byte(0x02);
    let mut world = funded_world(&[sender]);
    world.set_code(&contract, vec![opcodes::ADD]);

    let tx = call_tx(sender, contract, 100_000);
    let receipt = Processor::run(&block_params(Revision::Cancun), &tx, &mut world).unwrap();

    assert!(!receipt.success);
}

/// §8 case 3: `JUMP` to a byte that isn't a `JUMPDEST` fails the call.
#[test]
fn jump_to_non_jumpdest_fails_the_call() {
    let sender = Address::repeat_byte(0x01);
    let contract = Address::repeat_byte(0x02);
    let mut world = funded_world(&[sender]);

    // PUSH1 5; JUMP; STOP; STOP; STOP; STOP  <- byte 5 is STOP, not JUMPDEST.
    let code = vec![
        opcodes::PUSH1,
        0x05,
        opcodes::JUMP,
        opcodes::STOP,
        opcodes::STOP,
        opcodes::STOP,
        opcodes::STOP,
    ];
    world.set_code(&contract, code);

    let tx = call_tx(sender, contract, 100_000);
    let receipt = Processor::run(&block_params(Revision::Cancun), &tx, &mut world).unwrap();

    assert!(!receipt.success);
}

/// §8 case 4: a memory expansion far larger than the gas on hand runs out
/// of gas rather than allocating unbounded memory.
#[test]
fn oog_on_memory_expansion_fails_without_allocating() {
    let sender = Address::repeat_byte(0x01);
    let contract = Address::repeat_byte(0x02);
    let mut world = funded_world(&[sender]);

    // PUSH1 0 (value); PUSH4 0x7fffffff (offset); MSTORE.
    const PUSH4: u8 = opcodes::PUSH1 + 3;
    let mut code = vec![opcodes::PUSH1, 0x00, PUSH4];
    code.extend_from_slice(&0x7fff_ffffu32.to_be_bytes());
    code.push(opcodes::MSTORE);
    world.set_code(&contract, code);

    // Just over the 21000 intrinsic floor: nowhere near enough for a
    // multi-gigabyte memory expansion.
    let tx = call_tx(sender, contract, 30_000);
    let receipt = Processor::run(&block_params(Revision::Cancun), &tx, &mut world).unwrap();

    assert!(!receipt.success);
}

/// §8 case 5: inside a `STATICCALL` frame, `SSTORE` fails the inner call
/// without touching storage, and the outer call observes the failure.
#[test]
fn staticcall_write_protection_blocks_inner_sstore() {
    let sender = Address::repeat_byte(0x01);
    let outer = Address::repeat_byte(0x02);
    let inner = Address::repeat_byte(0x03);
    let mut world = funded_world(&[sender]);

    // PUSH1 1 (value); PUSH1 0 (key); SSTORE; STOP.
    world.set_code(
        &inner,
        vec![
            opcodes::PUSH1,
            0x01,
            opcodes::PUSH1,
            0x00,
            opcodes::SSTORE,
            opcodes::STOP,
        ],
    );

    let mut outer_code = vec![];
    outer_code.extend_from_slice(&push1(0)); // retLen
    outer_code.extend_from_slice(&push1(0)); // retOffset
    outer_code.extend_from_slice(&push1(0)); // argsLen
    outer_code.extend_from_slice(&push1(0)); // argsOffset
    const PUSH2: u8 = opcodes::PUSH1 + 1;
    const PUSH20: u8 = opcodes::PUSH1 + 19;
    outer_code.push(PUSH20);
    outer_code.extend_from_slice(inner.as_bytes()); // target
    outer_code.extend_from_slice(&[PUSH2, 0x27, 0x10]); // gas = 10000
    outer_code.push(opcodes::STATICCALL);
    outer_code.extend_from_slice(&push1(0)); // offset for MSTORE of the result
    outer_code.push(opcodes::MSTORE);
    outer_code.extend_from_slice(&push1(32)); // len
    outer_code.extend_from_slice(&push1(0)); // offset
    outer_code.push(opcodes::RETURN);
    world.set_code(&outer, outer_code);

    let tx = call_tx(sender, outer, 200_000);
    let receipt = Processor::run(&block_params(Revision::Cancun), &tx, &mut world).unwrap();

    assert!(receipt.success, "the outer call itself does not revert");
    let mut expected_false = [0u8; 32];
    expected_false[31] = 0;
    assert_eq!(
        &receipt.output[..],
        &expected_false[..],
        "STATICCALL must report the inner write attempt as failed"
    );
    assert_eq!(world.get_storage(&inner, U256::zero()), U256::zero());
}

/// §8 case 6: `REVERT` rolls back state but still carries output data.
#[test]
fn revert_carries_output_data() {
    let sender = Address::repeat_byte(0x01);
    let contract = Address::repeat_byte(0x02);
    let mut world = funded_world(&[sender]);

    let payload = [0xde, 0xad, 0xbe, 0xef];
    let mut code = push32_word(&payload);
    code.extend_from_slice(&push1(0)); // offset
    code.push(opcodes::MSTORE);
    code.extend_from_slice(&push1(32)); // len
    code.extend_from_slice(&push1(0)); // offset
    code.push(opcodes::REVERT);
    world.set_code(&contract, code);

    let tx = call_tx(sender, contract, 100_000);
    let receipt = Processor::run(&block_params(Revision::Cancun), &tx, &mut world).unwrap();

    assert!(!receipt.success);
    let mut expected = [0u8; 32];
    expected[28..].copy_from_slice(&payload);
    assert_eq!(&receipt.output[..], &expected[..]);
}

/// §8 case 7: `CREATE2`'s resulting address matches the independent
/// `keccak256(0xff || sender || salt || keccak256(init_code))[12..]` formula.
#[test]
fn create2_address_matches_the_keccak_formula() {
    let sender = Address::repeat_byte(0x01);
    let contract = Address::repeat_byte(0x02);
    let mut world = funded_world(&[sender]);

    // Deployed init code: PUSH1 0; PUSH1 0; RETURN (deploys empty code).
    let init_code = [opcodes::PUSH1, 0x00, opcodes::PUSH1, 0x00, opcodes::RETURN];
    let salt = 0x2au8;

    let mut code = push32_word(&init_code);
    code.extend_from_slice(&push1(0)); // memory offset to write init code to
    code.push(opcodes::MSTORE);
    code.extend_from_slice(&push1(salt)); // salt
    code.extend_from_slice(&push1(init_code.len() as u8)); // len
    code.extend_from_slice(&push1(32 - init_code.len() as u8)); // offset (right-aligned in the word)
    code.extend_from_slice(&push1(0)); // value
    code.push(opcodes::CREATE2);
    code.extend_from_slice(&push1(0)); // offset to write the result address to
    code.push(opcodes::MSTORE);
    code.extend_from_slice(&push1(32)); // len
    code.extend_from_slice(&push1(0)); // offset
    code.push(opcodes::RETURN);
    world.set_code(&contract, code);

    let tx = call_tx(sender, contract, 500_000);
    let receipt = Processor::run(&block_params(Revision::Cancun), &tx, &mut world).unwrap();
    assert!(receipt.success);

    let mut preimage = vec![0xffu8];
    preimage.extend_from_slice(contract.as_bytes());
    let mut salt_word = [0u8; 32];
    salt_word[31] = salt;
    preimage.extend_from_slice(&salt_word);
    preimage.extend_from_slice(keccak256(&init_code).as_bytes());
    let expected_address = Address::from_slice(&keccak256(&preimage).as_bytes()[12..]);

    assert_eq!(&receipt.output[12..], expected_address.as_bytes());
}

/// §8 case 8: the SSTORE status table — one row per named status,
/// cross-checked against the gas/refund classification directly.
#[test]
fn sstore_status_table_covers_every_named_status() {
    let revision = Revision::Cancun;
    let zero = U256::zero();
    let seven = U256::from(7);
    let other = U256::from(9);

    let (status, _, _) = sstore_cost_and_refund(zero, zero, seven, revision);
    assert_eq!(status, SstoreStatus::Added);

    let (status, _, refund) = sstore_cost_and_refund(seven, seven, zero, revision);
    assert_eq!(status, SstoreStatus::Deleted);
    assert!(refund > 0);

    let (status, _, _) = sstore_cost_and_refund(seven, seven, other, revision);
    assert_eq!(status, SstoreStatus::Modified);

    let (status, _, _) = sstore_cost_and_refund(seven, seven, seven, revision);
    assert_eq!(status, SstoreStatus::Assigned);

    let (status, _, _) = sstore_cost_and_refund(zero, seven, other, revision);
    assert_eq!(status, SstoreStatus::DeletedAdded);

    let (status, _, refund) = sstore_cost_and_refund(seven, other, zero, revision);
    assert_eq!(status, SstoreStatus::ModifiedDeleted);
    assert!(refund > 0);

    let (status, _, refund) = sstore_cost_and_refund(seven, zero, seven, revision);
    assert_eq!(status, SstoreStatus::DeletedRestored);
    assert!(refund < 0);

    let (status, _, refund) = sstore_cost_and_refund(zero, seven, zero, revision);
    assert_eq!(status, SstoreStatus::AddedDeleted);
    assert!(refund > 0);

    let (status, _, _) = sstore_cost_and_refund(seven, other, seven, revision);
    assert_eq!(status, SstoreStatus::ModifiedRestored);
}

/// §8 case 9: intrinsic gas is the hard floor a transaction must clear.
#[test]
fn intrinsic_gas_is_the_hard_floor() {
    let sender = Address::repeat_byte(0x01);
    let recipient = Address::repeat_byte(0x02);
    let mut world = funded_world(&[sender]);
    let intrinsic = Transaction {
        sender,
        recipient: Some(recipient),
        nonce: U256::zero(),
        input: Bytes::new(),
        value: U256::zero(),
        gas_limit: 21_000,
        gas_price: U256::from(1),
        access_list: vec![],
    }
    .intrinsic_gas();

    let tx_at_floor = call_tx(sender, recipient, intrinsic);
    let receipt = Processor::run(&block_params(Revision::Cancun), &tx_at_floor, &mut world).unwrap();
    assert!(receipt.success);

    let mut world = funded_world(&[sender]);
    let tx_below_floor = call_tx(sender, recipient, intrinsic - 1);
    let receipt = Processor::run(&block_params(Revision::Cancun), &tx_below_floor, &mut world).unwrap();
    assert!(!receipt.success);
    assert_eq!(receipt.gas_used, intrinsic - 1);
}

/// §8 case 10: the state-writer precompile rejects every caller but the
/// one configured driver address.
#[test]
fn state_writer_rejects_a_non_driver_caller() {
    let sender = Address::repeat_byte(0x01);
    let mut world = funded_world(&[sender]);
    let mut block = block_params(Revision::Cancun);
    block.state_writer_driver = Address::repeat_byte(0xaa);

    let tx = call_tx(sender, STATE_WRITER_ADDRESS, 100_000);

    let receipt = Processor::run(&block, &tx, &mut world).unwrap();
    assert!(!receipt.success);
}
