//! The linked tool record and its provenance types.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A fully linked tool: the unit a program is composed of.
///
/// Tools are produced by the loader and owned by their [`Program`]. All
/// provenance is value-typed; a tool never holds open streams.
///
/// [`Program`]: crate::types::Program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tool {
    /// Stable identifier, unique within a program. `<location>:<line>` for
    /// parser-produced tools, `<location>/<filename>` for file-level tools,
    /// the bare name for built-ins.
    pub id: String,

    /// Declared parameters, including the five reference lists.
    pub parameters: Parameters,

    /// The natural-language body of the tool.
    pub instructions: String,

    /// For every raw reference string appearing in this tool, the id of the
    /// tool it resolved to.
    pub tool_mapping: HashMap<String, String>,

    /// For every lowercase tool name defined in the same source file, the id
    /// of that tool.
    pub local_tools: HashMap<String, String>,

    /// Directory relative references are resolved against at runtime.
    pub working_dir: String,

    /// Where this tool came from.
    pub source: ToolSource,
}

impl Tool {
    /// The five reference lists concatenated in resolution order.
    pub fn references(&self) -> impl Iterator<Item = &String> {
        let p = &self.parameters;
        p.tools
            .iter()
            .chain(p.export.iter())
            .chain(p.export_context.iter())
            .chain(p.context.iter())
            .chain(p.credentials.iter())
    }
}

/// Declared attributes of a tool, as written in its source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Tool name. Empty is legal only for the first tool in a file.
    pub name: String,

    /// Human description.
    pub description: String,

    /// Model this tool runs against. Empty until defaulted by the registry.
    pub model_name: String,

    /// Model declared file-wide by the first tool; distributed by the
    /// parser's assign-globals option.
    pub global_model_name: String,

    /// Whether the tool holds a multi-turn chat instead of one completion.
    pub chat: bool,

    /// Completion token cap, if declared.
    pub max_tokens: Option<u32>,

    /// Sampling temperature, if declared.
    pub temperature: Option<f32>,

    /// Whether the model must answer with JSON.
    pub json_response: bool,

    /// Schema of the arguments callers pass to this tool.
    pub arguments: Option<ArgumentSchema>,

    /// References callable by this tool.
    pub tools: Vec<String>,

    /// References resolved and injected before the instructions.
    pub context: Vec<String>,

    /// Context references shared with the referrer.
    pub export_context: Vec<String>,

    /// Tool references shared with the referrer.
    pub export: Vec<String>,

    /// Credential provider references.
    pub credentials: Vec<String>,
}

/// Typed argument schema attached to a tool.
///
/// Properties are kept ordered so that serialised programs are byte-stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentSchema {
    /// Always `"object"` for tool arguments.
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Argument name to property description.
    pub properties: BTreeMap<String, ArgumentProperty>,

    /// Names of required arguments, in declaration order.
    pub required: Vec<String>,
}

impl ArgumentSchema {
    /// An empty object schema.
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Add a named property, marking it required.
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        property_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            ArgumentProperty {
                property_type: property_type.into(),
                description: description.into(),
            },
        );
        self.required.push(name);
        self
    }
}

/// A single argument property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentProperty {
    /// JSON type of the property, usually `"string"`.
    #[serde(rename = "type")]
    pub property_type: String,

    /// Human description.
    pub description: String,
}

/// Provenance of a tool within its source artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSource {
    /// Display location of the artifact the tool was compiled from.
    pub location: String,

    /// 1-based line the tool starts at; 0 for file-level tools.
    pub line_no: usize,

    /// VCS repository the artifact was fetched from, when applicable.
    pub repo: Option<Repo>,
}

impl fmt::Display for ToolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.location, self.line_no)
    }
}

/// VCS coordinates of a fetched source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repo {
    /// Version control system, e.g. `"git"`.
    pub vcs: String,

    /// Clone URL of the repository.
    pub root: String,

    /// Directory inside the repository the source lives in.
    pub path: String,

    /// Filename inside `path`.
    pub name: String,

    /// Pinned revision the content was fetched at.
    pub revision: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_follow_resolution_order() {
        let tool = Tool {
            parameters: Parameters {
                tools: vec!["a".into()],
                export: vec!["b".into()],
                export_context: vec!["c".into()],
                context: vec!["d".into()],
                credentials: vec!["e".into()],
                ..Default::default()
            },
            ..Default::default()
        };

        let order: Vec<&str> = tool.references().map(String::as_str).collect();
        assert_eq!(order, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn source_displays_location_and_line() {
        let source = ToolSource {
            location: "testdata/test.wft".into(),
            line_no: 6,
            repo: None,
        };
        assert_eq!(source.to_string(), "testdata/test.wft:6");
    }

    #[test]
    fn argument_schema_keeps_declaration_order_for_required() {
        let schema = ArgumentSchema::object()
            .with_property("zeta", "string", "last declared")
            .with_property("alpha", "string", "first sorted");
        assert_eq!(schema.required, ["zeta", "alpha"]);
        assert!(schema.properties.contains_key("alpha"));
    }
}
