//! Tool-script grammar parser.
//!
//! A tool-script is a plain-text file holding one or more tools separated by
//! `---` lines. Each tool opens with a header of case-insensitive
//! `Key: value` lines (name, description, reference lists, model hints,
//! argument declarations); the first line that is neither a header, a
//! comment, nor blank starts the instruction body, which runs verbatim to
//! the next separator.
//!
//! The parser only builds the ordered tool sequence; naming rules
//! (uniqueness, unnamed non-first tools) are enforced by the loader.

use thiserror::Error;

use weft_core::types::{ArgumentProperty, ArgumentSchema, Tool};

/// Parser behaviour switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Distribute a `Global Model` declaration to every tool in the file
    /// that declares no model of its own.
    pub assign_globals: bool,
}

/// Errors produced while parsing a tool-script.
///
/// Line numbers are 1-based and refer to the input as given; the caller
/// annotates the source location.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: invalid boolean {value:?} for {key}")]
    InvalidBool {
        line: usize,
        key: String,
        value: String,
    },

    #[error("line {line}: invalid number {value:?} for {key}")]
    InvalidNumber {
        line: usize,
        key: String,
        value: String,
    },

    #[error("line {line}: invalid argument declaration {value:?}, expected \"name: description\"")]
    InvalidArgument { line: usize, value: String },

    #[error("tool-script is not valid UTF-8")]
    InvalidUtf8,
}

impl ParseError {
    /// The line the error occurred at, when the error is line-scoped.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::InvalidBool { line, .. }
            | ParseError::InvalidNumber { line, .. }
            | ParseError::InvalidArgument { line, .. } => Some(*line),
            ParseError::InvalidUtf8 => None,
        }
    }
}

/// Parse a tool-script into its ordered tool sequence.
///
/// Every returned tool has `parameters`, `instructions`, and
/// `source.line_no` populated; ids and the rest of the provenance are left
/// for the loader.
pub fn parse_tools(data: &[u8], options: Options) -> Result<Vec<Tool>, ParseError> {
    let content = std::str::from_utf8(data).map_err(|_| ParseError::InvalidUtf8)?;

    let mut tools = Vec::new();
    let mut current = PartialTool::default();

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end();

        if line.trim() == "---" {
            current.finish_into(&mut tools);
            current = PartialTool::default();
            continue;
        }

        if current.in_body {
            current.body.push(line.to_string());
            continue;
        }

        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        if let Some((key, value)) = header_line(line) {
            current.start(line_no);
            current.apply(line_no, &key, value)?;
            continue;
        }

        // First body line.
        current.start(line_no);
        current.in_body = true;
        current.body.push(line.to_string());
    }
    current.finish_into(&mut tools);

    if options.assign_globals {
        assign_globals(&mut tools);
    }

    Ok(tools)
}

/// A tool still being accumulated.
#[derive(Default)]
struct PartialTool {
    tool: Tool,
    body: Vec<String>,
    in_body: bool,
    started_at: Option<usize>,
}

impl PartialTool {
    fn start(&mut self, line_no: usize) {
        if self.started_at.is_none() {
            self.started_at = Some(line_no);
        }
    }

    fn finish_into(mut self, tools: &mut Vec<Tool>) {
        let Some(line_no) = self.started_at else {
            return;
        };
        self.tool.source.line_no = line_no;
        self.tool.instructions = self.body.join("\n").trim().to_string();
        tools.push(self.tool);
    }

    fn apply(&mut self, line_no: usize, key: &str, value: &str) -> Result<(), ParseError> {
        let p = &mut self.tool.parameters;
        match key {
            "name" => p.name = value.to_string(),
            "description" => p.description = value.to_string(),
            "model" | "modelname" => p.model_name = value.to_string(),
            "globalmodel" | "globalmodelname" => p.global_model_name = value.to_string(),
            "chat" => p.chat = parse_bool(line_no, key, value)?,
            "jsonresponse" | "jsonmode" | "json" => {
                p.json_response = parse_bool(line_no, key, value)?
            }
            "maxtokens" => {
                let parsed = value.parse().map_err(|_| ParseError::InvalidNumber {
                    line: line_no,
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
                p.max_tokens = Some(parsed);
            }
            "temperature" => {
                let parsed = value.parse().map_err(|_| ParseError::InvalidNumber {
                    line: line_no,
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
                p.temperature = Some(parsed);
            }
            "tools" | "tool" => p.tools.extend(csv(value)),
            "context" => p.context.extend(csv(value)),
            "exportcontext" | "sharecontext" => p.export_context.extend(csv(value)),
            "export" | "exporttool" | "exporttools" | "sharetools" => p.export.extend(csv(value)),
            "credentials" | "credential" | "creds" => p.credentials.extend(csv(value)),
            "args" | "arg" | "param" | "parameter" | "parameters" => {
                let (arg_name, description) =
                    value.split_once(':').ok_or_else(|| ParseError::InvalidArgument {
                        line: line_no,
                        value: value.to_string(),
                    })?;
                let schema = p.arguments.get_or_insert_with(ArgumentSchema::object);
                let arg_name = arg_name.trim().to_string();
                schema.properties.insert(
                    arg_name.clone(),
                    ArgumentProperty {
                        property_type: "string".to_string(),
                        description: description.trim().to_string(),
                    },
                );
                schema.required.push(arg_name);
            }
            _ => unreachable!("header_line only yields known keys"),
        }
        Ok(())
    }
}

/// Recognise `Key: value` where the key, lowercased and stripped of spaces,
/// is one the grammar knows. Anything else is a body line.
fn header_line(line: &str) -> Option<(String, &str)> {
    let (raw_key, value) = line.split_once(':')?;
    if !raw_key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '\t')
    {
        return None;
    }
    let key: String = raw_key
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if !KNOWN_KEYS.contains(&key.as_str()) {
        return None;
    }
    Some((key, value.trim()))
}

const KNOWN_KEYS: &[&str] = &[
    "name",
    "description",
    "model",
    "modelname",
    "globalmodel",
    "globalmodelname",
    "chat",
    "jsonresponse",
    "jsonmode",
    "json",
    "maxtokens",
    "temperature",
    "tools",
    "tool",
    "context",
    "exportcontext",
    "sharecontext",
    "export",
    "exporttool",
    "exporttools",
    "sharetools",
    "credentials",
    "credential",
    "creds",
    "args",
    "arg",
    "param",
    "parameter",
    "parameters",
];

fn parse_bool(line: usize, key: &str, value: &str) -> Result<bool, ParseError> {
    match value.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidBool {
            line,
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn csv(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
}

fn assign_globals(tools: &mut [Tool]) {
    let global_model = tools
        .iter()
        .find(|tool| !tool.parameters.global_model_name.is_empty())
        .map(|tool| tool.parameters.global_model_name.clone());

    if let Some(model) = global_model {
        for tool in tools.iter_mut() {
            if tool.parameters.model_name.is_empty() {
                tool.parameters.model_name = model.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_unnamed_tool() {
        let tools = parse_tools(b"This is a chatbot", Options::default()).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].parameters.name, "");
        assert_eq!(tools[0].instructions, "This is a chatbot");
        assert_eq!(tools[0].source.line_no, 1);
    }

    #[test]
    fn two_tools_with_separator_keep_line_numbers() {
        let content = "\
tools: helper

Call helper to do the work.

---
name: helper

I am the helper.
";
        let tools = parse_tools(content.as_bytes(), Options::default()).unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].source.line_no, 1);
        assert_eq!(tools[0].parameters.tools, ["helper"]);
        assert_eq!(tools[0].instructions, "Call helper to do the work.");
        assert_eq!(tools[1].parameters.name, "helper");
        assert_eq!(tools[1].source.line_no, 6);
        assert_eq!(tools[1].instructions, "I am the helper.");
    }

    #[test]
    fn header_keys_are_case_and_space_insensitive() {
        let content = "\
Name: worker
Export Context: shared
Max Tokens: 100

body
";
        let tools = parse_tools(content.as_bytes(), Options::default()).unwrap();
        assert_eq!(tools[0].parameters.name, "worker");
        assert_eq!(tools[0].parameters.export_context, ["shared"]);
        assert_eq!(tools[0].parameters.max_tokens, Some(100));
    }

    #[test]
    fn reference_lists_split_on_commas() {
        let content = "tools: a, b from ./lib.wft , c\n\nbody";
        let tools = parse_tools(content.as_bytes(), Options::default()).unwrap();
        assert_eq!(tools[0].parameters.tools, ["a", "b from ./lib.wft", "c"]);
    }

    #[test]
    fn args_accumulate_into_schema() {
        let content = "\
name: lookup
args: city: the city to look up
args: country: the country the city is in

Look it up.
";
        let tools = parse_tools(content.as_bytes(), Options::default()).unwrap();
        let schema = tools[0].parameters.arguments.as_ref().unwrap();
        assert_eq!(schema.schema_type, "object");
        assert_eq!(schema.required, ["city", "country"]);
        assert_eq!(
            schema.properties["city"].description,
            "the city to look up"
        );
    }

    #[test]
    fn unknown_key_starts_the_body() {
        let content = "name: x\nNote: this is body text\nmore body";
        let tools = parse_tools(content.as_bytes(), Options::default()).unwrap();
        assert_eq!(
            tools[0].instructions,
            "Note: this is body text\nmore body"
        );
    }

    #[test]
    fn header_comments_are_skipped_body_comments_kept() {
        let content = "# build metadata\nname: x\n\nbody\n# kept\n";
        let tools = parse_tools(content.as_bytes(), Options::default()).unwrap();
        assert_eq!(tools[0].parameters.name, "x");
        assert_eq!(tools[0].instructions, "body\n# kept");
    }

    #[test]
    fn globals_distribute_when_enabled() {
        let content = "\
global model: mistral-large
model: gpt-4o

first

---
name: second

second body
";
        let tools = parse_tools(
            content.as_bytes(),
            Options {
                assign_globals: true,
            },
        )
        .unwrap();
        assert_eq!(tools[0].parameters.model_name, "gpt-4o");
        assert_eq!(tools[1].parameters.model_name, "mistral-large");

        let tools = parse_tools(content.as_bytes(), Options::default()).unwrap();
        assert_eq!(tools[1].parameters.model_name, "");
    }

    #[test]
    fn invalid_bool_carries_line() {
        let err = parse_tools(b"chat: maybe\n\nbody", Options::default()).unwrap_err();
        assert_eq!(err.line(), Some(1));
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn invalid_number_carries_line() {
        let err = parse_tools(b"name: x\nmax tokens: lots\n\nbody", Options::default())
            .unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn trailing_separator_yields_no_empty_tool() {
        let tools = parse_tools(b"body\n---\n", Options::default()).unwrap();
        assert_eq!(tools.len(), 1);
    }

    #[test]
    fn empty_input_yields_no_tools() {
        let tools = parse_tools(b"", Options::default()).unwrap();
        assert!(tools.is_empty());
    }
}
