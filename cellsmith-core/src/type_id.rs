//! Type-Id: globally unique type script args
//!
//! An output requests a Type-Id by carrying the built-in Type-Id type
//! script with empty or all-zero args. Once inputs are final, the args are
//! set to `blake2b_256(first_input || output_index as u64 LE)`. No two
//! transactions can share a first input, so the id is unique on chain.

use cellsmith_params::TYPE_ID_CODE_HASH;
use ckb_types::{
    bytes::Bytes,
    core::ScriptHashType,
    packed::{self, CellInput, Script},
    prelude::*,
    H256,
};

use crate::hash::blake2b_256;
use crate::tx_data::TxData;
use crate::{Error, Result};

/// Length of Type-Id args
pub const TYPE_ID_ARGS_LEN: usize = 32;

/// Placeholder args carried until the id is computed
pub const ZERO_ARGS: [u8; TYPE_ID_ARGS_LEN] = [0u8; TYPE_ID_ARGS_LEN];

/// Whether `script` is the Type-Id type script (with any args)
pub fn is_type_id_script(script: &Script) -> bool {
    let hash_type: packed::Byte = ScriptHashType::Type.into();
    script.code_hash().as_slice() == &TYPE_ID_CODE_HASH[..] && script.hash_type() == hash_type
}

/// Whether `script` asks for a fresh Type-Id
pub fn is_type_id_request(script: &Script) -> bool {
    let args = script.args().raw_data();
    is_type_id_script(script) && (args.is_empty() || args[..] == ZERO_ARGS[..])
}

/// Type-Id script with placeholder args, for use as an output's type script
pub fn type_id_request() -> Script {
    Script::new_builder()
        .code_hash(H256(TYPE_ID_CODE_HASH).pack())
        .hash_type(ScriptHashType::Type.into())
        .args(Bytes::from(ZERO_ARGS.to_vec()).pack())
        .build()
}

/// Derive the id for the output at `output_index`
pub fn calculate_type_id(first_input: &CellInput, output_index: u64) -> [u8; 32] {
    blake2b_256(&[first_input.as_slice(), &output_index.to_le_bytes()])
}

/// Give placeholder args their full length so the size estimate is final
pub(crate) fn normalize_request(script: Script) -> Script {
    if is_type_id_request(&script) {
        script
            .as_builder()
            .args(Bytes::from(ZERO_ARGS.to_vec()).pack())
            .build()
    } else {
        script
    }
}

/// Rewrite every Type-Id request in `tx`, returning the rewritten output indices
pub(crate) fn assign_type_ids(tx: &mut TxData) -> Result<Vec<usize>> {
    let requested: Vec<usize> = tx
        .outputs
        .iter()
        .enumerate()
        .filter(|(_, o)| o.type_().to_opt().is_some_and(|s| is_type_id_request(&s)))
        .map(|(i, _)| i)
        .collect();

    if requested.is_empty() {
        return Ok(requested);
    }

    let first_input = tx.inputs.first().cloned().ok_or_else(|| {
        Error::ExtensionHandlerFailure(
            "Type-Id requires at least one input to be selected".to_string(),
        )
    })?;

    for &index in &requested {
        let id = calculate_type_id(&first_input, index as u64);
        let output = tx.outputs[index].clone();
        if let Some(script) = output.type_().to_opt() {
            let script = script
                .as_builder()
                .args(Bytes::from(id.to_vec()).pack())
                .build();
            tx.outputs[index] = output.as_builder().type_(Some(script).pack()).build();
        }
        tracing::debug!("Assigned Type-Id 0x{} to output {}", hex::encode(id), index);
    }

    Ok(requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_lock;
    use ckb_types::packed::{CellOutput, OutPoint};

    fn input(tag: u8, index: u32) -> CellInput {
        CellInput::new(OutPoint::new(H256([tag; 32]).pack(), index), 0)
    }

    fn with_args(script: Script, args: Vec<u8>) -> Script {
        script.as_builder().args(Bytes::from(args).pack()).build()
    }

    fn tx_with_request(inputs: Vec<CellInput>) -> TxData {
        let plain = CellOutput::new_builder().lock(test_lock(1)).build();
        let requesting = plain
            .clone()
            .as_builder()
            .type_(Some(type_id_request()).pack())
            .build();
        let mut tx = TxData::default();
        for input in inputs {
            tx.push_input(input);
        }
        tx.push_output(plain, &Bytes::new());
        tx.push_output(requesting, &Bytes::new());
        tx
    }

    fn type_args(tx: &TxData, index: usize) -> Bytes {
        tx.outputs[index].type_().to_opt().unwrap().args().raw_data()
    }

    #[test]
    fn test_request_detection() {
        let script = type_id_request();
        assert!(is_type_id_request(&script));

        assert!(is_type_id_request(&with_args(script.clone(), Vec::new())));

        let assigned = with_args(script.clone(), vec![1u8; 32]);
        assert!(!is_type_id_request(&assigned));
        assert!(is_type_id_script(&assigned));

        let data_hash = script
            .as_builder()
            .hash_type(ScriptHashType::Data.into())
            .build();
        assert!(!is_type_id_script(&data_hash));
    }

    #[test]
    fn test_normalize_pads_empty_args() {
        let script = normalize_request(with_args(type_id_request(), Vec::new()));
        assert_eq!(script.args().raw_data(), Bytes::from(ZERO_ARGS.to_vec()));

        let other = test_lock(1);
        assert_eq!(normalize_request(other.clone()), other);
    }

    #[test]
    fn test_id_depends_on_first_input_and_index() {
        let a = calculate_type_id(&input(1, 0), 0);
        assert_eq!(a, calculate_type_id(&input(1, 0), 0));
        assert_ne!(a, calculate_type_id(&input(1, 0), 1));
        assert_ne!(a, calculate_type_id(&input(1, 1), 0));
        assert_ne!(a, calculate_type_id(&input(2, 0), 0));
    }

    #[test]
    fn test_id_hashes_encoded_input() {
        // since (8 bytes) || tx_hash (32) || index (4)
        let first = input(1, 0);
        assert_eq!(first.as_slice().len(), 44);

        let mut preimage = first.as_slice().to_vec();
        preimage.extend_from_slice(&3u64.to_le_bytes());
        assert_eq!(calculate_type_id(&first, 3), blake2b_256(&[preimage.as_slice()]));
    }

    #[test]
    fn test_assign_ignores_later_inputs() {
        let mut one = tx_with_request(vec![input(1, 0)]);
        let mut two = tx_with_request(vec![input(1, 0), input(9, 4)]);

        assert_eq!(assign_type_ids(&mut one).unwrap(), vec![1]);
        assert_eq!(assign_type_ids(&mut two).unwrap(), vec![1]);

        let args = type_args(&one, 1);
        assert_eq!(args.len(), TYPE_ID_ARGS_LEN);
        assert_ne!(args[..], ZERO_ARGS[..]);
        assert_eq!(args, type_args(&two, 1));
        assert_eq!(args[..], calculate_type_id(&input(1, 0), 1)[..]);
    }

    #[test]
    fn test_assign_without_inputs_fails() {
        let mut tx = tx_with_request(Vec::new());
        let err = assign_type_ids(&mut tx).unwrap_err();
        assert!(matches!(err, Error::ExtensionHandlerFailure(_)));
    }

    #[test]
    fn test_assign_is_noop_without_requests() {
        let mut tx = tx_with_request(Vec::new());
        tx.pop_output();
        assert!(assign_type_ids(&mut tx).unwrap().is_empty());
    }
}
