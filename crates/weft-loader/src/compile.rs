//! Format sniffing and tool compilation.
//!
//! A drained source is identified in strict order: assembled blob, OpenAPI
//! description, opaque text, tool-script. The first format yielding at
//! least one tool wins; the compiled sequence is then stamped with
//! provenance and ids, indexed by lowercase local name, and handed to the
//! linker.

use std::collections::HashMap;
use std::path::Path;

use weft_core::log_debug;
use weft_core::system::{PRINT_PREFIX, TOOL_SUFFIX};
use weft_core::types::{Program, Tool};

use crate::LoadContext;
use crate::error::LoadError;
use crate::link;
use crate::source::Source;

/// Lowercase local name to (still unlinked) tool, for one source file.
pub(crate) type LocalTools = HashMap<String, Tool>;

pub(crate) async fn read_tool(
    ctx: &LoadContext,
    prg: &mut Program,
    mut base: Source,
    target_tool_name: &str,
) -> Result<Tool, LoadError> {
    let data = std::mem::take(&mut base.content);

    if weft_assemble::is_assembled(&data) {
        return load_assembled(ctx, prg, &data, target_tool_name);
    }

    let mut tools: Vec<Tool> = Vec::new();

    if weft_openapi::is_openapi(&data) {
        let default_server = if base.remote {
            base.location.as_str()
        } else {
            ""
        };
        match weft_openapi::parse(&data).and_then(|doc| weft_openapi::compile(&doc, default_server))
        {
            Ok(compiled) => tools = compiled,
            Err(err) => {
                log_debug!(
                    "loader",
                    "discarding OpenAPI sniff of {}: {err}",
                    base.location
                );
            }
        }
    }

    if tools.is_empty()
        && has_foreign_extension(&base.name)
        && let Ok(text) = std::str::from_utf8(&data)
    {
        let mut tool = Tool::default();
        tool.parameters.name = base.name.clone();
        tool.instructions = format!("{PRINT_PREFIX}\n{text}");
        tools.push(tool);
    }

    if tools.is_empty() {
        tools = weft_parser::parse_tools(
            &data,
            weft_parser::Options {
                assign_globals: true,
            },
        )
        .map_err(|source| LoadError::Parse {
            location: base.location.clone(),
            source,
        })?;
    }

    if tools.is_empty() {
        return Err(LoadError::NoTools {
            location: base.location.clone(),
        });
    }

    let mut local_tools = LocalTools::new();
    let mut main_tool = Tool::default();

    for (index, mut tool) in tools.into_iter().enumerate() {
        tool.working_dir = base.path.clone();
        tool.source.location = base.location.clone();
        tool.source.repo = base.repo.clone();
        tool.id = tool.source.to_string();

        if index == 0 {
            main_tool = tool.clone();
        }

        if index != 0 && tool.parameters.name.is_empty() {
            return Err(LoadError::UnnamedTool {
                location: tool.source.location,
                line: tool.source.line_no,
            });
        }

        if !target_tool_name.is_empty()
            && tool.parameters.name.eq_ignore_ascii_case(target_tool_name)
        {
            main_tool = tool.clone();
        }

        let key = tool.parameters.name.to_lowercase();
        if let Some(existing) = local_tools.get(&key) {
            return Err(LoadError::DuplicateToolName {
                name: tool.parameters.name.clone(),
                location: tool.source.location.clone(),
                line: tool.source.line_no,
                previous_line: existing.source.line_no,
            });
        }
        local_tools.insert(key, tool);
    }

    link::link(ctx, prg, &mut base, main_tool, &local_tools).await
}

/// Decode a pre-linked program blob straight into the accumulator,
/// substituting current built-in definitions for stale serialised ones.
fn load_assembled(
    ctx: &LoadContext,
    prg: &mut Program,
    data: &[u8],
    target_tool_name: &str,
) -> Result<Tool, LoadError> {
    let decoded = weft_assemble::load(data)?;
    log_debug!(
        "loader",
        "decoded assembled program with {} tools",
        decoded.tool_set.len()
    );

    prg.tool_set = HashMap::with_capacity(decoded.tool_set.len());
    for (id, tool) in decoded.tool_set {
        let tool = ctx.registry.lookup(&id).unwrap_or(tool);
        prg.tool_set.insert(id, tool);
    }

    let entry = prg
        .tool_set
        .get(&decoded.entry_tool_id)
        .cloned()
        .unwrap_or_default();
    if target_tool_name.is_empty() {
        return Ok(entry);
    }

    entry
        .local_tools
        .get(&target_tool_name.to_lowercase())
        .and_then(|id| prg.tool_set.get(id))
        .cloned()
        .ok_or_else(|| LoadError::ToolNotFound {
            name: target_tool_name.to_string(),
        })
}

fn has_foreign_extension(name: &str) -> bool {
    match Path::new(name).extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()) != TOOL_SUFFIX,
        None => false,
    }
}
