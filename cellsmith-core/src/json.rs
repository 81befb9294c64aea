//! JSON forms of ledger types
//!
//! Packed entities have no serde impls of their own. These `with` modules
//! go through the node's RPC types, so requests and results use the same
//! JSON as the node (hex quantities, `0x` byte strings).

use ckb_jsonrpc_types as rpc;
use ckb_types::{bytes::Bytes, core, packed};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! rpc_with {
    ($name:ident, $packed:ty, $rpc:ty) => {
        pub(crate) mod $name {
            use super::*;

            pub(crate) fn serialize<S: Serializer>(
                value: &$packed,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                <$rpc>::from(value.clone()).serialize(serializer)
            }

            pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
                deserializer: D,
            ) -> Result<$packed, D::Error> {
                <$rpc>::deserialize(deserializer).map(Into::into)
            }
        }
    };
}

rpc_with!(script, packed::Script, rpc::Script);
rpc_with!(cell_input, packed::CellInput, rpc::CellInput);
rpc_with!(cell_output, packed::CellOutput, rpc::CellOutput);

pub(crate) mod script_opt {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(
        value: &Option<packed::Script>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.clone().map(rpc::Script::from).serialize(serializer)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<packed::Script>, D::Error> {
        let script = Option::<rpc::Script>::deserialize(deserializer)?;
        Ok(script.map(Into::into))
    }
}

pub(crate) mod bytes {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        rpc::JsonBytes::from_bytes(value.clone()).serialize(serializer)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        rpc::JsonBytes::deserialize(deserializer).map(rpc::JsonBytes::into_bytes)
    }
}

/// Optional shannon amount as a hex quantity
pub(crate) mod capacity_opt {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(
        value: &Option<u64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(rpc::Uint64::from).serialize(serializer)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        let capacity = Option::<rpc::Uint64>::deserialize(deserializer)?;
        Ok(capacity.map(|c| c.value()))
    }
}

/// Serialize-only: a built transaction is never read back
pub(crate) mod tx_view {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(
        value: &core::TransactionView,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        rpc::TransactionView::from(value.clone()).serialize(serializer)
    }
}
