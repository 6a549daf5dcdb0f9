//! Program loading and linking for tool files.
//!
//! The loader takes a single entry reference, walks every transitive
//! reference, parses each source format, and emits a fully linked,
//! cycle-safe [`Program`]: a mapping from stable tool id to resolved
//! [`Tool`] plus the id of the entry tool.
//!
//! A reference may name a built-in, a local file, an `http(s)` URL, or a
//! `github.com/...` coordinate, and may select a sub-tool inside the
//! resolved source with the `"<sub> from <locator>"` syntax. Sources are
//! sniffed into one of four formats: an assembled program blob, an OpenAPI
//! description (one tool per operation), an opaque text file (wrapped as a
//! print-only tool), or a tool-script.
//!
//! ```no_run
//! # async fn run() -> Result<(), weft_loader::LoadError> {
//! let ctx = weft_loader::LoadContext::new();
//! let program = weft_loader::program(&ctx, "worker from ./lib.wft", "").await?;
//! assert!(program.tool_set.contains_key(&program.entry_tool_id));
//! # Ok(())
//! # }
//! ```

mod compile;
pub mod error;
mod link;
mod remote;
mod source;
mod split;

pub use error::LoadError;
pub use remote::FetchSettings;
pub use split::split_tool_ref;
pub use weft_core::types::{Program, Tool};

use tokio_util::sync::CancellationToken;

use weft_builtin::Registry;
use weft_config::WeftConfig;

use crate::source::Source;

/// Ambient state for one load: cancellation, fetch tunables, and the
/// built-in registry defaults are drawn from.
#[derive(Debug, Clone)]
pub struct LoadContext {
    /// Checked before every filesystem probe and raced against every
    /// network call.
    pub cancel: CancellationToken,
    pub(crate) fetch: FetchSettings,
    pub(crate) registry: Registry,
    pub(crate) client: reqwest::Client,
}

impl Default for LoadContext {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadContext {
    /// A context with default fetch settings and registry.
    pub fn new() -> Self {
        Self::with_settings(FetchSettings::default(), Registry::default())
    }

    /// A context built from parsed configuration.
    pub fn from_config(config: &WeftConfig) -> Self {
        let registry = match &config.model.default {
            Some(model) => Registry::new(model.clone()),
            None => Registry::default(),
        };
        Self::with_settings(FetchSettings::from_config(config), registry)
    }

    fn with_settings(fetch: FetchSettings, registry: Registry) -> Self {
        Self {
            cancel: CancellationToken::new(),
            fetch,
            registry,
            client: reqwest::Client::new(),
        }
    }

    /// Attach a caller-supplied cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), LoadError> {
        if self.cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        Ok(())
    }
}

/// Load and link the program a reference names.
///
/// When `sub_tool` is empty the reference itself may carry a
/// `"<sub> from <locator>"` selector.
pub async fn program(ctx: &LoadContext, name: &str, sub_tool: &str) -> Result<Program, LoadError> {
    let (name, sub_tool) = if sub_tool.is_empty() {
        split_tool_ref(name)
    } else {
        (name.to_string(), sub_tool.to_string())
    };

    let mut prg = Program {
        name: name.clone(),
        ..Default::default()
    };
    let mut base = Source::default();
    let entry = link::resolve(ctx, &mut prg, &mut base, name, sub_tool).await?;
    prg.entry_tool_id = entry.id;
    Ok(prg)
}

/// Load and link a program from inline content.
pub async fn program_from_source(
    ctx: &LoadContext,
    content: &str,
    sub_tool: &str,
) -> Result<Program, LoadError> {
    let mut prg = Program::default();
    let entry = compile::read_tool(ctx, &mut prg, Source::inline(content), sub_tool).await?;
    prg.entry_tool_id = entry.id;
    Ok(prg)
}
