//! System-wide constants shared by the parser, loader, and runner.

/// File extension reserved for tool-script files.
pub const TOOL_SUFFIX: &str = ".wft";

/// Default filename looked up inside a repository reference that names no
/// file of its own.
pub const TOOL_FILE: &str = "tool.wft";

/// Sentinel placed at the start of an opaque-text tool's instructions. The
/// runner emits everything after it verbatim instead of calling a model.
pub const PRINT_PREFIX: &str = "#!sys.echo";

/// Sentinel placed at the start of an OpenAPI-synthesised tool's
/// instructions, followed by the JSON operation target.
pub const OPENAPI_PREFIX: &str = "#!sys.openapi";

/// Model assigned by the registry to tools that declare none.
pub const DEFAULT_MODEL: &str = "gpt-4o";
