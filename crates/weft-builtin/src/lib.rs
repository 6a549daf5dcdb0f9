//! Built-in tool registry.
//!
//! Built-ins are host-provided tools resolved by bare name (`sys.echo`,
//! `sys.read`, ...). They are stored in a program under their own name as
//! id, and the registry is also the place default parameters (currently the
//! model) are propagated from.

use weft_core::system::DEFAULT_MODEL;
use weft_core::types::{ArgumentSchema, Tool};

/// The built-in registry.
///
/// Carries the default model handed to tools that declare none; everything
/// else about the catalogue is static.
#[derive(Debug, Clone)]
pub struct Registry {
    default_model: String,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl Registry {
    /// A registry defaulting to the given model.
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            default_model: default_model.into(),
        }
    }

    /// Look a built-in up by name (case-insensitive). The returned tool has
    /// its id set to the built-in's name and defaults already applied.
    pub fn lookup(&self, name: &str) -> Option<Tool> {
        let name = name.to_lowercase();
        let (description, arguments) = catalogue(&name)?;

        let mut tool = Tool::default();
        tool.id = name.clone();
        tool.parameters.name = name;
        tool.parameters.description = description.to_string();
        tool.parameters.arguments = arguments;
        Some(self.set_defaults(tool))
    }

    /// Fill defaulted parameters on a tool: a tool without a model runs on
    /// the registry default.
    pub fn set_defaults(&self, mut tool: Tool) -> Tool {
        if tool.parameters.model_name.is_empty() {
            tool.parameters.model_name = self.default_model.clone();
        }
        tool
    }

    /// Names of every registered built-in.
    pub fn names() -> &'static [&'static str] {
        &[
            "sys.abort",
            "sys.echo",
            "sys.http.get",
            "sys.http.post",
            "sys.ls",
            "sys.read",
            "sys.time.now",
            "sys.write",
        ]
    }
}

fn catalogue(name: &str) -> Option<(&'static str, Option<ArgumentSchema>)> {
    let entry = match name {
        "sys.echo" => (
            "Echoes the message back to the user",
            Some(ArgumentSchema::object().with_property(
                "message",
                "string",
                "the message to echo",
            )),
        ),
        "sys.abort" => (
            "Aborts execution with an error message",
            Some(ArgumentSchema::object().with_property(
                "message",
                "string",
                "the error to abort with",
            )),
        ),
        "sys.read" => (
            "Reads the contents of a file",
            Some(ArgumentSchema::object().with_property(
                "filename",
                "string",
                "the file to read",
            )),
        ),
        "sys.write" => (
            "Writes content to a file",
            Some(
                ArgumentSchema::object()
                    .with_property("filename", "string", "the file to write")
                    .with_property("content", "string", "the content to write"),
            ),
        ),
        "sys.ls" => (
            "Lists the contents of a directory",
            Some(ArgumentSchema::object().with_property(
                "dir",
                "string",
                "the directory to list",
            )),
        ),
        "sys.http.get" => (
            "Issues an HTTP GET request and returns the body",
            Some(ArgumentSchema::object().with_property(
                "url",
                "string",
                "the URL to fetch",
            )),
        ),
        "sys.http.post" => (
            "Issues an HTTP POST request and returns the response body",
            Some(
                ArgumentSchema::object()
                    .with_property("url", "string", "the URL to post to")
                    .with_property("body", "string", "the request body")
                    .with_property("contenttype", "string", "the request content type"),
            ),
        ),
        "sys.time.now" => ("Returns the current date and time", None),
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_sets_id() {
        let registry = Registry::default();
        let tool = registry.lookup("SYS.Echo").unwrap();
        assert_eq!(tool.id, "sys.echo");
        assert_eq!(tool.parameters.name, "sys.echo");
        assert_eq!(tool.parameters.model_name, DEFAULT_MODEL);
    }

    #[test]
    fn unknown_names_miss() {
        assert!(Registry::default().lookup("sys.unknown").is_none());
        assert!(Registry::default().lookup("echo").is_none());
    }

    #[test]
    fn defaults_leave_declared_models_alone() {
        let registry = Registry::new("local-model");
        let mut tool = Tool::default();
        tool.parameters.model_name = "declared".to_string();
        assert_eq!(
            registry.set_defaults(tool).parameters.model_name,
            "declared"
        );

        let defaulted = registry.set_defaults(Tool::default());
        assert_eq!(defaulted.parameters.model_name, "local-model");
    }

    #[test]
    fn every_listed_name_resolves() {
        let registry = Registry::default();
        for name in Registry::names() {
            assert!(registry.lookup(name).is_some(), "missing {name}");
        }
    }
}
