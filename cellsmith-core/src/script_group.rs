//! Script groups
//!
//! Inputs and outputs sharing one script are verified together, so a signer
//! produces one witness per group. The registry keeps groups in the order
//! their script was first seen; signers rely on that order.

use std::collections::HashMap;

use ckb_types::packed::Script;
use serde::{Deserialize, Serialize};

/// Which role the grouped script plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptGroupType {
    /// Unlocking script of consumed cells
    Lock,
    /// Type script of consumed or produced cells
    Type,
}

/// A script and the transaction indices it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptGroup {
    /// Shared script
    #[serde(with = "crate::json::script")]
    pub script: Script,
    /// Role of the script
    pub group_type: ScriptGroupType,
    /// Input indices, ascending
    pub input_indices: Vec<usize>,
    /// Output indices, ascending
    pub output_indices: Vec<usize>,
}

impl ScriptGroup {
    fn new(script: Script, group_type: ScriptGroupType) -> Self {
        Self {
            script,
            group_type,
            input_indices: Vec::new(),
            output_indices: Vec::new(),
        }
    }

    /// Index of the first input covered, which carries the group's witness
    pub fn first_input_index(&self) -> Option<usize> {
        self.input_indices.first().copied()
    }
}

/// Side of the transaction a member index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMember {
    /// Input index
    Input(usize),
    /// Output index
    Output(usize),
}

/// Outcome of registering a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Position of the group in discovery order
    pub group_index: usize,
    /// Whether this registration created the group
    pub created: bool,
}

/// Accumulates script groups in discovery order
#[derive(Debug, Default)]
pub struct ScriptGroupRegistry {
    groups: Vec<ScriptGroup>,
    index: HashMap<(ScriptGroupType, Script), usize>,
}

impl ScriptGroupRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `member` to the `(script, group_type)` group, creating it if unseen
    pub fn register(
        &mut self,
        script: &Script,
        group_type: ScriptGroupType,
        member: GroupMember,
    ) -> Registration {
        let key = (group_type, script.clone());
        let (group_index, created) = match self.index.get(&key) {
            Some(&existing) => (existing, false),
            None => {
                let group_index = self.groups.len();
                self.groups.push(ScriptGroup::new(script.clone(), group_type));
                self.index.insert(key, group_index);
                (group_index, true)
            }
        };

        let group = &mut self.groups[group_index];
        match member {
            GroupMember::Input(i) => group.input_indices.push(i),
            GroupMember::Output(i) => group.output_indices.push(i),
        }

        Registration {
            group_index,
            created,
        }
    }

    /// Group at `group_index`
    pub fn get(&self, group_index: usize) -> Option<&ScriptGroup> {
        self.groups.get(group_index)
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no group has been registered
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Consume the registry, yielding groups in discovery order
    pub fn finalize(self) -> Vec<ScriptGroup> {
        self.groups
    }
}
