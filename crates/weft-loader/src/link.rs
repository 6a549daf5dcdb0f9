//! Cycle-safe linking.
//!
//! The linker walks every reference of a compiled tool depth-first,
//! resolving locally where the name is defined in the same source and
//! externally otherwise, and registers each resolved tool in the program
//! under its id. Inserting the still-unlinked tool before descending is
//! what makes cyclic references terminate: a recursive visit that
//! rediscovers the id returns the placeholder instead of descending again.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use weft_core::split_arg;
use weft_core::{log_debug, log_trace};
use weft_core::types::{Program, Tool};

use crate::LoadContext;
use crate::compile::{self, LocalTools};
use crate::error::LoadError;
use crate::source::{self, Source};
use crate::split::split_tool_ref;

type LoadFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LoadError>> + Send + 'a>>;

pub(crate) fn link<'a>(
    ctx: &'a LoadContext,
    prg: &'a mut Program,
    base: &'a mut Source,
    mut tool: Tool,
    local_tools: &'a LocalTools,
) -> LoadFuture<'a, Tool> {
    Box::pin(async move {
        if let Some(existing) = prg.tool_set.get(&tool.id) {
            return Ok(existing.clone());
        }

        let at = base.to_string();

        tool.tool_mapping = HashMap::new();
        tool.local_tools = HashMap::new();

        // Insert now to break circular references; the finished tool
        // replaces this placeholder before returning.
        prg.tool_set.insert(tool.id.clone(), tool.clone());

        // Two passes: resolve references first, index local names second,
        // so an external reference spelled like a local name cannot mangle
        // the local binding.
        let references: Vec<String> = tool.references().cloned().collect();
        for reference in references {
            let (no_args, _) = split_arg(&reference);
            if let Some(local) = local_tools.get(&no_args.to_lowercase()) {
                let linked = match prg.tool_set.get(&local.id) {
                    Some(existing) => existing.clone(),
                    None => link(ctx, &mut *prg, &mut *base, local.clone(), local_tools)
                        .await
                        .map_err(|err| LoadError::Link {
                            reference: reference.clone(),
                            location: at.clone(),
                            source: Box::new(err),
                        })?,
                };
                log_trace!("loader", "{reference} -> local {}", linked.id);
                tool.tool_mapping.insert(reference, linked.id);
            } else {
                let (locator, sub_tool) = split_tool_ref(&reference);
                let resolved = resolve(ctx, &mut *prg, &mut *base, locator, sub_tool)
                    .await
                    .map_err(|err| LoadError::Resolve {
                        reference: reference.clone(),
                        location: at.clone(),
                        source: Box::new(err),
                    })?;
                log_trace!("loader", "{reference} -> {}", resolved.id);
                tool.tool_mapping.insert(reference, resolved.id);
            }
        }

        for local in local_tools.values() {
            // A local that no reference pulled in still gets linked, so the
            // local index never points outside the program.
            if !prg.tool_set.contains_key(&local.id) {
                link(ctx, &mut *prg, &mut *base, local.clone(), local_tools)
                    .await
                    .map_err(|err| LoadError::Link {
                        reference: local.parameters.name.clone(),
                        location: at.clone(),
                        source: Box::new(err),
                    })?;
            }
            tool.local_tools
                .insert(local.parameters.name.to_lowercase(), local.id.clone());
        }

        let tool = ctx.registry.set_defaults(tool);
        log_debug!("loader", "registered {}", tool.id);
        prg.tool_set.insert(tool.id.clone(), tool.clone());

        Ok(tool)
    })
}

/// Resolve one external reference: built-in by bare name, otherwise fetch,
/// compile, and link the source the locator names.
pub(crate) fn resolve<'a>(
    ctx: &'a LoadContext,
    prg: &'a mut Program,
    base: &'a mut Source,
    name: String,
    sub_tool: String,
) -> LoadFuture<'a, Tool> {
    Box::pin(async move {
        if sub_tool.is_empty()
            && let Some(builtin) = ctx.registry.lookup(&name)
        {
            log_debug!("loader", "registered builtin {}", builtin.id);
            prg.tool_set.insert(builtin.id.clone(), builtin.clone());
            return Ok(builtin);
        }

        let source = source::input(ctx, base, &name).await?;
        compile::read_tool(ctx, prg, source, &sub_tool).await
    })
}
