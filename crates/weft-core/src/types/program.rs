//! The closed, linked graph of tools.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Tool;

/// Mapping from tool id to tool record.
pub type ToolSet = HashMap<String, Tool>;

/// A fully linked program: every id referenced by any member tool's
/// `tool_mapping` or `local_tools` is a key of `tool_set`, and
/// `entry_tool_id` names the tool execution starts at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Program {
    /// The reference the program was loaded from, for display.
    pub name: String,

    /// Id of the entry tool.
    pub entry_tool_id: String,

    /// All tools in the program, keyed by id.
    pub tool_set: ToolSet,
}

impl Program {
    /// The entry tool record.
    pub fn entry_tool(&self) -> Option<&Tool> {
        self.tool_set.get(&self.entry_tool_id)
    }
}
