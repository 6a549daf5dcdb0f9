//! Errors surfaced by the loader.

use thiserror::Error;

use weft_assemble::AssembleError;
use weft_parser::ParseError;

/// Everything that can go wrong while loading a program.
///
/// All failures surface to the entry-point caller; the partially filled
/// program accumulator is discarded with them.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The locator resolved neither locally nor remotely.
    #[error("can not load tools path={path} name={name}")]
    NotFound { path: String, name: String },

    /// A named sub-tool was requested but the source does not define it.
    #[error("tool not found: {name}")]
    ToolNotFound { name: String },

    /// The grammar parser rejected the source.
    #[error("{location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: ParseError,
    },

    /// A tool past the first has no name.
    #[error("{location}:{line}: only the first tool in a file can have no name")]
    UnnamedTool { location: String, line: usize },

    /// Two tools in one source share a lowercase name.
    #[error(
        "duplicate tool name [{name}] in {location} found at lines {line} and {previous_line}"
    )]
    DuplicateToolName {
        name: String,
        location: String,
        line: usize,
        previous_line: usize,
    },

    /// The sniffer matched no format that yields a tool.
    #[error("no tools found in {location}")]
    NoTools { location: String },

    /// A local reference failed to link.
    #[error("failed linking {reference} at {location}: {source}")]
    Link {
        reference: String,
        location: String,
        #[source]
        source: Box<LoadError>,
    },

    /// An external reference failed to resolve.
    #[error("failed resolving {reference} at {location}: {source}")]
    Resolve {
        reference: String,
        location: String,
        #[source]
        source: Box<LoadError>,
    },

    /// An assembled blob was recognised but did not decode.
    #[error(transparent)]
    Assemble(#[from] AssembleError),

    /// A network fetch failed.
    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A network fetch answered with an unexpected status.
    #[error("unexpected status {status} fetching {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Filesystem failure other than a missing file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller's cancellation token fired.
    #[error("load cancelled")]
    Cancelled,
}
