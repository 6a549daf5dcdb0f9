//! OpenAPI description to tool compiler.
//!
//! Turns an OpenAPI document (JSON or YAML) into one tool per operation.
//! Operations are emitted in deterministic order: paths sorted, methods in
//! canonical order within a path. The first emitted tool is the entry tool
//! of the document.
//!
//! Each tool's instructions carry the [`OPENAPI_PREFIX`] sentinel followed
//! by the JSON operation target the runner needs to issue the request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use weft_core::system::OPENAPI_PREFIX;
use weft_core::types::{ArgumentProperty, ArgumentSchema, Tool};

/// Errors produced while compiling an OpenAPI description.
#[derive(Debug, Error)]
pub enum OpenApiError {
    #[error("not an OpenAPI description: {0}")]
    NotOpenApi(String),

    #[error("failed to serialize operation target: {0}")]
    Target(#[from] serde_json::Error),
}

/// Cheap probe: does this byte stream parse (as JSON or YAML) into a
/// structure with a non-empty `paths` mapping?
pub fn is_openapi(data: &[u8]) -> bool {
    #[derive(Default, Deserialize)]
    #[serde(default)]
    struct Probe {
        paths: BTreeMap<String, serde::de::IgnoredAny>,
    }

    let probe = serde_json::from_slice::<Probe>(data)
        .or_else(|_| serde_yaml::from_slice::<Probe>(data));
    matches!(probe, Ok(probe) if !probe.paths.is_empty())
}

/// Parse a byte stream into an OpenAPI document, trying JSON first and
/// falling back to YAML.
pub fn parse(data: &[u8]) -> Result<Document, OpenApiError> {
    serde_json::from_slice::<Document>(data)
        .or_else(|_| serde_yaml::from_slice::<Document>(data))
        .map_err(|err| OpenApiError::NotOpenApi(err.to_string()))
}

/// Compile a parsed document into its tool sequence.
///
/// `default_server` is used when the document declares no server of its own;
/// callers pass the fetch location for remote documents and an empty string
/// for local ones.
pub fn compile(doc: &Document, default_server: &str) -> Result<Vec<Tool>, OpenApiError> {
    let server = doc
        .servers
        .first()
        .map(|server| server.url.as_str())
        .unwrap_or(default_server);

    let mut tools = Vec::new();
    for (path, item) in &doc.paths {
        for (method, operation) in item.operations() {
            let name = operation
                .operation_id
                .clone()
                .unwrap_or_else(|| synthesize_name(method, path));

            let description = operation
                .summary
                .clone()
                .or_else(|| operation.description.clone())
                .unwrap_or_else(|| format!("{} {}", method.to_uppercase(), path));

            let target = OperationTarget {
                method,
                path: path.as_str(),
                server,
            };

            let mut tool = Tool::default();
            tool.parameters.name = name;
            tool.parameters.description = description;
            tool.parameters.arguments = arguments(item, operation);
            tool.instructions =
                format!("{} '{}'", OPENAPI_PREFIX, serde_json::to_string(&target)?);
            tool.source.line_no = tools.len() + 1;
            tools.push(tool);
        }
    }

    Ok(tools)
}

/// The request target embedded in a synthesised tool's instructions.
#[derive(Debug, Serialize)]
struct OperationTarget<'a> {
    method: &'a str,
    path: &'a str,
    server: &'a str,
}

fn arguments(item: &PathItem, operation: &Operation) -> Option<ArgumentSchema> {
    let mut schema = ArgumentSchema::object();

    for parameter in item.parameters.iter().chain(operation.parameters.iter()) {
        let property_type = parameter
            .schema
            .as_ref()
            .map(|hint| hint.schema_type.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "string".to_string());
        schema.properties.insert(
            parameter.name.clone(),
            ArgumentProperty {
                property_type,
                description: parameter.description.clone().unwrap_or_default(),
            },
        );
        if parameter.required {
            schema.required.push(parameter.name.clone());
        }
    }

    if let Some(body) = &operation.request_body {
        schema.properties.insert(
            "body".to_string(),
            ArgumentProperty {
                property_type: "string".to_string(),
                description: body
                    .description
                    .clone()
                    .unwrap_or_else(|| "request body".to_string()),
            },
        );
        if body.required {
            schema.required.push("body".to_string());
        }
    }

    if schema.properties.is_empty() {
        None
    } else {
        Some(schema)
    }
}

fn synthesize_name(method: &str, path: &str) -> String {
    let mut name = method.to_string();
    for part in path.split(['/', '{', '}']).filter(|part| !part.is_empty()) {
        name.push('_');
        name.push_str(part);
    }
    name
}

/// The slice of an OpenAPI document the compiler consumes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Document {
    pub openapi: String,
    pub info: Info,
    pub servers: Vec<Server>,
    pub paths: BTreeMap<String, PathItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Server {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
    pub parameters: Vec<Parameter>,
}

impl PathItem {
    /// Declared operations in canonical method order.
    fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("get", &self.get),
            ("post", &self.post),
            ("put", &self.put),
            ("patch", &self.patch),
            ("delete", &self.delete),
            ("head", &self.head),
            ("options", &self.options),
            ("trace", &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Parameter {
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    #[serde(rename = "in")]
    pub location: String,
    pub schema: Option<SchemaHint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SchemaHint {
    #[serde(rename = "type")]
    pub schema_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RequestBody {
    pub description: Option<String>,
    pub required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PETSTORE: &str = r#"
openapi: 3.0.0
info:
  title: Petstore
servers:
  - url: https://pets.example.com/v1
paths:
  /pets:
    get:
      operationId: listPets
      summary: List all pets
      parameters:
        - name: limit
          in: query
          description: how many to return
          schema:
            type: integer
    post:
      operationId: createPet
      requestBody:
        description: the pet to create
        required: true
  /pets/{petId}:
    get:
      summary: Info for a pet
      parameters:
        - name: petId
          in: path
          required: true
"#;

    #[test]
    fn probe_accepts_documents_with_paths() {
        assert!(is_openapi(PETSTORE.as_bytes()));
        assert!(is_openapi(br#"{"paths":{"/x":{}}}"#));
    }

    #[test]
    fn probe_rejects_other_text() {
        assert!(!is_openapi(b"This is a chatbot"));
        assert!(!is_openapi(b"name: helper\n\nbody"));
        assert!(!is_openapi(br#"{"paths":{}}"#));
    }

    #[test]
    fn one_tool_per_operation_in_deterministic_order() {
        let doc = parse(PETSTORE.as_bytes()).unwrap();
        let tools = compile(&doc, "").unwrap();

        let names: Vec<&str> = tools
            .iter()
            .map(|tool| tool.parameters.name.as_str())
            .collect();
        assert_eq!(names, ["listPets", "createPet", "get_pets_petId"]);

        let lines: Vec<usize> = tools.iter().map(|tool| tool.source.line_no).collect();
        assert_eq!(lines, [1, 2, 3]);
    }

    #[test]
    fn instructions_carry_the_operation_target() {
        let doc = parse(PETSTORE.as_bytes()).unwrap();
        let tools = compile(&doc, "").unwrap();

        assert!(tools[0].instructions.starts_with(OPENAPI_PREFIX));
        assert!(tools[0].instructions.contains(r#""method":"get""#));
        assert!(tools[0]
            .instructions
            .contains(r#""server":"https://pets.example.com/v1""#));
    }

    #[test]
    fn parameters_become_argument_schema() {
        let doc = parse(PETSTORE.as_bytes()).unwrap();
        let tools = compile(&doc, "").unwrap();

        let list = tools[0].parameters.arguments.as_ref().unwrap();
        assert_eq!(list.properties["limit"].property_type, "integer");
        assert!(list.required.is_empty());

        let create = tools[1].parameters.arguments.as_ref().unwrap();
        assert_eq!(create.required, ["body"]);

        let info = tools[2].parameters.arguments.as_ref().unwrap();
        assert_eq!(info.required, ["petId"]);
    }

    #[test]
    fn caller_location_fills_missing_server() {
        let doc = parse(br#"{"paths":{"/x":{"get":{}}}}"#).unwrap();
        let tools = compile(&doc, "https://docs.example.com/api.json").unwrap();
        assert!(tools[0]
            .instructions
            .contains(r#""server":"https://docs.example.com/api.json""#));
        assert_eq!(tools[0].parameters.name, "get_x");
        assert_eq!(tools[0].parameters.description, "GET /x");
    }
}
