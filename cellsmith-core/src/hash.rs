//! CKB default hash: Blake2b-256 personalized with `ckb-default-hash`

use blake2b_simd::Params;

const CKB_HASH_PERSONALIZATION: &[u8] = b"ckb-default-hash";

/// Hash the concatenation of `parts`
pub fn blake2b_256(parts: &[&[u8]]) -> [u8; 32] {
    let mut state = Params::new()
        .hash_length(32)
        .personal(CKB_HASH_PERSONALIZATION)
        .to_state();
    for part in parts {
        state.update(part);
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(state.finalize().as_bytes());
    out
}
