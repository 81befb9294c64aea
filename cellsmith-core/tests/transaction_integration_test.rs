//! Integration tests for the build flow
//!
//! Covers selection, change policy, Type-Id and script grouping end to end

use cellsmith_core::testing::{
    output_capacity, test_candidate, test_lock, test_typed_candidate, witness_len, CountingSource,
};
use cellsmith_core::type_id::{calculate_type_id, type_id_request, ZERO_ARGS};
use cellsmith_core::{
    CandidateInput, Error, FallibleInputs, FeeCalculator, OutputRequest, Result, ScriptGroup,
    ScriptGroupSigner, ScriptGroupType, TransactionBuilderConfiguration, TransactionRequest,
};
use cellsmith_params::{NetworkType, SHANNONS_PER_CKB};
use ckb_types::{
    bytes::Bytes,
    core::{ScriptHashType, TransactionView},
    packed::{Script, WitnessArgs},
    prelude::*,
    H256,
};

const CKB: u64 = SHANNONS_PER_CKB;

fn config() -> TransactionBuilderConfiguration {
    TransactionBuilderConfiguration::new(NetworkType::Testnet)
}

fn config_with_threshold(threshold: u64) -> TransactionBuilderConfiguration {
    TransactionBuilderConfiguration::builder(NetworkType::Testnet)
        .force_small_change_as_fee(threshold)
        .build()
        .unwrap()
}

fn payment(capacity: u64) -> TransactionRequest {
    let mut request = TransactionRequest::new();
    request
        .add_output(OutputRequest::new(test_lock(1), capacity))
        .unwrap()
        .set_change_output(test_lock(2));
    request
}

/// A data-hash type script unrelated to any handler
fn token_type() -> Script {
    Script::new_builder()
        .code_hash(H256([0x42; 32]).pack())
        .hash_type(ScriptHashType::Data1.into())
        .args(Bytes::from(vec![1u8; 32]).pack())
        .build()
}

fn assert_balanced(tx: &TransactionView, inputs_capacity: u64, fee: u64) {
    assert_eq!(tx.outputs_capacity().unwrap().as_u64() + fee, inputs_capacity);
    assert_eq!(tx.witnesses().len(), tx.inputs().len());
    assert_eq!(tx.outputs().len(), tx.outputs_data().len());
}

// ============================================================================
// Change handling
// ============================================================================

#[test]
fn test_single_input_with_change() {
    let request = payment(501 * CKB);
    let mut source = vec![test_candidate(1_000 * CKB, test_lock(2), 1, 0)].into_iter();

    let result = request.build(&config(), &mut source).unwrap();

    assert_eq!(result.fee, 464);
    assert_eq!(result.tx_view.inputs().len(), 1);
    assert_eq!(result.tx_view.outputs().len(), 2);
    assert_eq!(output_capacity(&result.tx_view, 1), 499 * CKB - 464);
    assert_eq!(result.tx_view.cell_deps().len(), 1);
    assert_eq!(witness_len(&result.tx_view, 0), 85);
    assert_balanced(&result.tx_view, 1_000 * CKB, result.fee);
}

#[test]
fn test_multiple_inputs_same_lock() {
    let request = payment(501 * CKB);
    let mut source = CountingSource::new(
        vec![
            test_candidate(300 * CKB, test_lock(2), 1, 0),
            test_candidate(300 * CKB, test_lock(2), 1, 1),
            test_candidate(300 * CKB, test_lock(2), 1, 2),
        ]
        .into_iter(),
    );

    let result = request.build(&config(), &mut source).unwrap();

    assert_eq!(source.pulled(), 2);
    assert_eq!(result.fee, 516);
    assert_eq!(result.tx_view.inputs().len(), 2);
    assert_eq!(output_capacity(&result.tx_view, 1), 99 * CKB - 516);
    // Only the first input of the group carries the placeholder
    assert_eq!(witness_len(&result.tx_view, 0), 85);
    assert_eq!(witness_len(&result.tx_view, 1), 0);

    let groups: Vec<_> = result.lock_groups().collect();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].input_indices, vec![0, 1]);
    assert_balanced(&result.tx_view, 600 * CKB, result.fee);
}

#[test]
fn test_stops_pulling_once_balanced() {
    let request = payment(501 * CKB);
    let mut source = CountingSource::new(
        (0..5).map(|i| test_candidate(1_000 * CKB, test_lock(2), 1, i)),
    );

    let result = request.build(&config(), &mut source).unwrap();

    assert_eq!(source.pulled(), 1);
    assert_eq!(result.tx_view.inputs().len(), 1);
}

#[test]
fn test_change_exactly_at_minimum() {
    let request = payment(1_000 * CKB - 61 * CKB - 464);
    let mut source = vec![test_candidate(1_000 * CKB, test_lock(2), 1, 0)].into_iter();

    let result = request.build(&config(), &mut source).unwrap();

    assert_eq!(result.change_output_index, Some(1));
    assert_eq!(output_capacity(&result.tx_view, 1), 61 * CKB);
    assert_eq!(result.fee, 464);
}

#[test]
fn test_change_one_below_minimum_is_unresolvable() {
    let request = payment(1_000 * CKB - 61 * CKB - 464 + 1);
    let mut source = vec![test_candidate(1_000 * CKB, test_lock(2), 1, 0)].into_iter();

    let err = request.build(&config(), &mut source).unwrap_err();
    assert!(matches!(err, Error::UnresolvableChange(_)), "{err}");
}

#[test]
fn test_change_one_below_minimum_folds_under_threshold() {
    let request = payment(1_000 * CKB - 61 * CKB - 464 + 1);
    let mut source = vec![test_candidate(1_000 * CKB, test_lock(2), 1, 0)].into_iter();

    let result = request
        .build(&config_with_threshold(62 * CKB), &mut source)
        .unwrap();

    assert_eq!(result.change_output_index, None);
    assert_eq!(result.tx_view.outputs().len(), 1);
    assert_eq!(result.fee, 61 * CKB - 1 + 464);
    assert_balanced(&result.tx_view, 1_000 * CKB, result.fee);
}

#[test]
fn test_dead_zone_resolved_by_next_input() {
    let request = payment(1_000 * CKB - 61 * CKB - 464 + 1);
    let mut source = vec![
        test_candidate(1_000 * CKB, test_lock(2), 1, 0),
        test_candidate(100 * CKB, test_lock(2), 1, 1),
    ]
    .into_iter();

    let result = request.build(&config(), &mut source).unwrap();

    assert_eq!(result.tx_view.inputs().len(), 2);
    assert_eq!(result.fee, 516);
    assert_eq!(output_capacity(&result.tx_view, 1), 161 * CKB + 463 - 516);
    assert_balanced(&result.tx_view, 1_100 * CKB, result.fee);
}

// ============================================================================
// Small change folded into fee
// ============================================================================

#[test]
fn test_small_change_folded_into_fee() {
    let request = payment(1_099 * CKB);
    let mut source = vec![test_candidate(1_100 * CKB, test_lock(2), 1, 0)].into_iter();

    let result = request
        .build(&config_with_threshold(CKB), &mut source)
        .unwrap();

    assert_eq!(result.tx_view.outputs().len(), 1);
    assert_eq!(result.change_output_index, None);
    assert_eq!(result.fee, CKB);
    assert_balanced(&result.tx_view, 1_100 * CKB, result.fee);
}

#[test]
fn test_threshold_does_not_suppress_real_change() {
    let request = payment(1_001 * CKB);
    let mut source = vec![test_candidate(1_100 * CKB, test_lock(2), 1, 0)].into_iter();

    let result = request
        .build(&config_with_threshold(CKB), &mut source)
        .unwrap();

    assert_eq!(result.tx_view.outputs().len(), 2);
    assert_eq!(output_capacity(&result.tx_view, 1), 9_899_999_536);
    assert_eq!(result.fee, 464);
}

#[test]
fn test_leftover_above_threshold_is_unresolvable() {
    let request = payment(1_099 * CKB);
    let mut source = vec![test_candidate(1_100 * CKB, test_lock(2), 1, 0)].into_iter();

    let err = request
        .build(&config_with_threshold(CKB / 2), &mut source)
        .unwrap_err();

    assert!(matches!(err, Error::UnresolvableChange(_)), "{err}");
    assert!(err.is_user_error());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_insufficient_capacity() {
    let request = payment(1_000 * CKB);
    let mut source = vec![
        test_candidate(300 * CKB, test_lock(2), 1, 0),
        test_candidate(200 * CKB, test_lock(2), 1, 1),
    ]
    .into_iter();

    let err = request.build(&config(), &mut source).unwrap_err();

    assert!(matches!(err, Error::InsufficientCapacity(_)));
    assert!(err.to_string().starts_with("No enough capacity"));
}

#[test]
fn test_source_error_aborts_build() {
    let request = payment(501 * CKB);
    let pages: Vec<std::result::Result<CandidateInput, String>> =
        vec![Err("indexer unavailable".to_string())];
    let mut source = FallibleInputs(pages.into_iter());

    let err = request.build(&config(), &mut source).unwrap_err();
    assert!(matches!(err, Error::InputSource(ref msg) if msg.contains("indexer")));
}

// ============================================================================
// Script groups
// ============================================================================

#[test]
fn test_two_outputs_three_inputs_two_locks() {
    // Recipients share no authority with the spent cells
    let mut request = TransactionRequest::new();
    request
        .add_output(OutputRequest::new(test_lock(1), 120 * CKB))
        .unwrap()
        .add_output(OutputRequest::new(test_lock(4), 100 * CKB))
        .unwrap()
        .set_change_output(test_lock(2));
    let mut source = CountingSource::new(
        vec![
            test_candidate(100 * CKB, test_lock(2), 1, 0),
            test_candidate(100 * CKB, test_lock(3), 1, 1),
            test_candidate(100 * CKB, test_lock(2), 1, 2),
        ]
        .into_iter(),
    );

    let result = request.build(&config(), &mut source).unwrap();

    assert_eq!(source.pulled(), 3);
    assert_eq!(result.script_groups.len(), 2);
    let groups: Vec<_> = result.lock_groups().collect();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].script, test_lock(2));
    assert_eq!(groups[0].input_indices, vec![0, 2]);
    assert_eq!(groups[1].script, test_lock(3));
    assert_eq!(groups[1].input_indices, vec![1]);

    assert_eq!(witness_len(&result.tx_view, 0), 85);
    assert_eq!(witness_len(&result.tx_view, 1), 85);
    assert_eq!(witness_len(&result.tx_view, 2), 0);

    // Both locks share one dep group
    assert_eq!(result.tx_view.cell_deps().len(), 1);
    // 653 for one requested output, plus 109 for the second
    assert_eq!(result.fee, 762);
    assert_eq!(result.change_output_index, Some(2));
    assert_eq!(output_capacity(&result.tx_view, 2), 80 * CKB - 762);
    assert_balanced(&result.tx_view, 300 * CKB, result.fee);
}

#[test]
fn test_input_type_script_forms_one_group() {
    let request = payment(501 * CKB);
    let mut source =
        vec![test_typed_candidate(1_000 * CKB, test_lock(2), Some(token_type()), 1, 0)]
            .into_iter();

    let result = request.build(&config(), &mut source).unwrap();

    assert_eq!(result.script_groups.len(), 2);
    assert_eq!(result.lock_groups().count(), 1);
    let type_groups: Vec<_> = result
        .script_groups
        .iter()
        .filter(|g| g.group_type == ScriptGroupType::Type)
        .collect();
    assert_eq!(type_groups.len(), 1);
    assert_eq!(type_groups[0].script, token_type());
    assert_eq!(type_groups[0].input_indices, vec![0]);
    assert!(type_groups[0].output_indices.is_empty());
    // A type script on the spent cell does not change the input's size
    assert_eq!(result.fee, 464);
}

#[test]
fn test_type_script_on_input_and_output_merges() {
    let mut request = TransactionRequest::new();
    request
        .add_output(OutputRequest::new(test_lock(1), 200 * CKB).with_type(token_type()))
        .unwrap()
        .set_change_output(test_lock(2));
    let mut source =
        vec![test_typed_candidate(1_000 * CKB, test_lock(2), Some(token_type()), 1, 0)]
            .into_iter();

    let result = request.build(&config(), &mut source).unwrap();

    let type_groups: Vec<_> = result
        .script_groups
        .iter()
        .filter(|g| g.group_type == ScriptGroupType::Type)
        .collect();
    assert_eq!(type_groups.len(), 1);
    assert_eq!(type_groups[0].input_indices, vec![0]);
    assert_eq!(type_groups[0].output_indices, vec![0]);
    assert_eq!(result.script_groups[0].group_type, ScriptGroupType::Lock);
    // 464 plus the 85-byte type script on the output
    assert_eq!(result.fee, 549);
    assert_balanced(&result.tx_view, 1_000 * CKB, result.fee);
}

#[test]
fn test_pinned_inputs_come_first() {
    let mut request = payment(501 * CKB);
    let pinned = test_candidate(1_000 * CKB, test_lock(2), 9, 3);
    request.add_input(pinned.clone());
    let mut source = CountingSource::new(
        vec![test_candidate(1_000 * CKB, test_lock(2), 1, 0)].into_iter(),
    );

    let result = request.build(&config(), &mut source).unwrap();

    assert_eq!(source.pulled(), 0);
    let inputs = result.tx_view.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs.get(0).unwrap().as_slice(), pinned.input.as_slice());
}

// ============================================================================
// Type-Id
// ============================================================================

fn type_id_request_tx() -> TransactionRequest {
    let mut request = TransactionRequest::new();
    request
        .add_output(
            OutputRequest::minimum(test_lock(1))
                .with_type(type_id_request())
                .with_data(vec![7u8; 64]),
        )
        .unwrap()
        .set_change_output(test_lock(2));
    request
}

#[test]
fn test_type_id_assigned() {
    let request = type_id_request_tx();
    let mut source = vec![test_candidate(1_000 * CKB, test_lock(2), 1, 0)].into_iter();

    let result = request.build(&config(), &mut source).unwrap();

    let tx = &result.tx_view;
    assert_eq!(output_capacity(tx, 0), 190 * CKB);
    assert_eq!(result.fee, 613);

    let type_script = tx.output(0).unwrap().type_().to_opt().unwrap();
    let args = type_script.args().raw_data();
    assert_ne!(args[..], ZERO_ARGS[..]);
    let first_input = tx.inputs().get(0).unwrap();
    assert_eq!(args[..], calculate_type_id(&first_input, 0)[..]);

    assert_eq!(result.script_groups.len(), 2);
    let type_group = &result.script_groups[1];
    assert_eq!(type_group.group_type, ScriptGroupType::Type);
    assert_eq!(type_group.output_indices, vec![0]);
    assert!(type_group.input_indices.is_empty());
    assert_balanced(tx, 1_000 * CKB, result.fee);
}

#[test]
fn test_type_id_depends_only_on_first_input() {
    let first = test_candidate(150 * CKB, test_lock(2), 4, 0);

    let mut short = type_id_request_tx();
    short.add_input(first.clone());
    let mut source = vec![test_candidate(500 * CKB, test_lock(2), 5, 0)].into_iter();
    let a = short.build(&config(), &mut source).unwrap();

    let mut long = type_id_request_tx();
    long.add_input(first);
    let mut source = vec![test_candidate(900 * CKB, test_lock(3), 6, 1)].into_iter();
    let b = long.build(&config(), &mut source).unwrap();

    assert_eq!(a.tx_view.inputs().len(), 2);
    assert_ne!(
        a.tx_view.inputs().get(1).unwrap().as_slice(),
        b.tx_view.inputs().get(1).unwrap().as_slice()
    );
    assert_eq!(
        a.tx_view.output(0).unwrap().type_().as_slice(),
        b.tx_view.output(0).unwrap().type_().as_slice()
    );
}

// ============================================================================
// Signing
// ============================================================================

struct TagSigner(u8);

impl ScriptGroupSigner for TagSigner {
    fn matches(&self, group: &ScriptGroup) -> bool {
        group.script == test_lock(self.0)
    }

    fn sign(&self, _tx: &TransactionView, _group: &ScriptGroup) -> Result<Bytes> {
        Ok(Bytes::from(vec![self.0; 65]))
    }
}

#[test]
fn test_sign_built_transaction() {
    let request = payment(200 * CKB);
    let mut source = vec![
        test_candidate(100 * CKB, test_lock(2), 1, 0),
        test_candidate(100 * CKB, test_lock(3), 1, 1),
        test_candidate(100 * CKB, test_lock(2), 1, 2),
    ]
    .into_iter();
    let mut result = request.build(&config(), &mut source).unwrap();
    let size_before = FeeCalculator::transaction_size(&result.tx_view.data());
    let hash_before = result.tx_view.hash();

    let signed = result.sign_with(&TagSigner(3)).unwrap();

    assert_eq!(signed, vec![1]);
    let expected = WitnessArgs::new_builder()
        .lock(Some(Bytes::from(vec![3u8; 65])).pack())
        .build()
        .as_bytes();
    assert_eq!(result.tx_view.witnesses().get(1).unwrap().raw_data(), expected);
    // Signatures fill the placeholders; the fee stays valid
    assert_eq!(FeeCalculator::transaction_size(&result.tx_view.data()), size_before);
    // Witnesses are outside the tx hash
    assert_eq!(result.tx_view.hash(), hash_before);
}
