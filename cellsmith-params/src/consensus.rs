//! Consensus constants for CKB
//!
//! Values are taken from the genesis system scripts and the node's default
//! transaction pool policy.

/// Shannons per CKB
pub const SHANNONS_PER_CKB: u64 = 100_000_000;

/// Default fee rate (shannons per 1000 bytes)
pub const DEFAULT_FEE_RATE: u64 = 1_000;

/// Minimum fee rate accepted by the default node policy
pub const MIN_FEE_RATE: u64 = 1_000;

/// Maximum fee rate (safety limit)
pub const MAX_FEE_RATE: u64 = 1_000_000;

/// Recoverable secp256k1 signature length
pub const SECP256K1_SIGNATURE_SIZE: usize = 65;

/// Code hash of the secp256k1-blake160-sighash-all lock (hash type `type`)
pub const SECP256K1_BLAKE160_CODE_HASH: [u8; 32] =
    h256("9bd7e06f3ecf4be0f2fcd2188b23f1b9fcc88e5d4b65a8637b17723bbda3cce8");

/// Code hash of the built-in Type-Id script (hash type `type`), "TYPE_ID" in ASCII
pub const TYPE_ID_CODE_HASH: [u8; 32] =
    h256("00000000000000000000000000000000000000000000000000545950455f4944");

/// Decode a 64-character hex string into 32 bytes at compile time.
pub(crate) const fn h256(hex: &str) -> [u8; 32] {
    let bytes = hex.as_bytes();
    assert!(bytes.len() == 64, "expected 64 hex characters");
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < 32 {
        out[i] = (nibble(bytes[2 * i]) << 4) | nibble(bytes[2 * i + 1]);
        i += 1;
    }
    out
}

const fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex character"),
    }
}
