//! Fetched source artifacts and local/remote resolution.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use weft_core::log_debug;
use weft_core::types::Repo;

use crate::LoadContext;
use crate::error::LoadError;
use crate::remote;

/// A fetched artifact: fully buffered content plus the coordinates needed
/// to resolve references relative to it.
///
/// Created by the resolver, drained once by the compiler, then discarded.
#[derive(Debug, Clone, Default)]
pub(crate) struct Source {
    /// The content of the source.
    pub content: Vec<u8>,
    /// Set when the source was loaded from a remote location. Sticky:
    /// sources derived from a remote source never probe the local
    /// filesystem.
    pub remote: bool,
    /// Base path (directory or URL prefix) relative references resolve
    /// against.
    pub path: String,
    /// Filename of the source, without the path.
    pub name: String,
    /// Display location; not assumed to be a valid URI.
    pub location: String,
    /// VCS repository the source was fetched from, when applicable.
    pub repo: Option<Repo>,
}

impl Source {
    /// A synthetic source for inline content.
    pub fn inline(content: &str) -> Self {
        Source {
            content: content.as_bytes().to_vec(),
            location: "inline".to_string(),
            ..Default::default()
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() && self.name.is_empty() {
            return Ok(());
        }
        write!(f, "{}/{}", self.path, self.name)
    }
}

/// Resolve `name` against `base` into an open source: local filesystem
/// first (unless the base is remote), remote fetch second.
pub(crate) async fn input(
    ctx: &LoadContext,
    base: &mut Source,
    name: &str,
) -> Result<Source, LoadError> {
    if name.starts_with("http://") || name.starts_with("https://") {
        base.remote = true;
    }

    if !base.remote {
        ctx.check_cancelled()?;
        if let Some(source) = load_local(base, name).await? {
            return Ok(source);
        }
    }

    if let Some(source) = remote::load_remote(ctx, base, name).await? {
        return Ok(source);
    }

    Err(LoadError::NotFound {
        path: base.path.clone(),
        name: name.to_string(),
    })
}

/// Try to open `name` relative to the base path. A missing file is a miss,
/// not an error; everything else fails the load.
async fn load_local(base: &Source, name: &str) -> Result<Option<Source>, LoadError> {
    let path = clean(&Path::new(&base.path).join(name));

    let content = match tokio::fs::read(&path).await {
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
        Ok(content) => content,
    };
    log_debug!("loader", "opened {}", path.display());

    Ok(Some(Source {
        content,
        remote: false,
        path: path
            .parent()
            .map(|parent| parent.to_string_lossy().into_owned())
            .unwrap_or_default(),
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        location: path.to_string_lossy().into_owned(),
        repo: None,
    }))
}

/// Lexically normalise a path, dropping `.` segments and folding `..` onto
/// the preceding segment. Cyclic references only converge when the same
/// file always produces the same location string.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_with_normal =
                    matches!(out.components().next_back(), Some(Component::Normal(_)));
                if ends_with_normal {
                    out.pop();
                } else if !matches!(out.components().next_back(), Some(Component::RootDir)) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_drops_current_dir_segments() {
        assert_eq!(clean(Path::new("a/./b/./c.wft")), PathBuf::from("a/b/c.wft"));
        assert_eq!(clean(Path::new("./a.wft")), PathBuf::from("a.wft"));
    }

    #[test]
    fn clean_folds_parent_segments() {
        assert_eq!(clean(Path::new("a/b/../c.wft")), PathBuf::from("a/c.wft"));
        assert_eq!(clean(Path::new("../x.wft")), PathBuf::from("../x.wft"));
    }

    #[tokio::test]
    async fn remote_bases_never_probe_the_local_filesystem() {
        let ctx = LoadContext::new();
        let mut base = Source {
            remote: true,
            path: "tests/testdata/two_tools".to_string(),
            ..Default::default()
        };

        // The file exists locally, but a remote base must not see it.
        let err = input(&ctx, &mut base, "test.wft").await.unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[tokio::test]
    async fn http_names_mark_the_base_remote() {
        let ctx = LoadContext::new();
        ctx.cancel.cancel();

        let mut base = Source::default();
        let err = input(&ctx, &mut base, "https://example.com/tool.wft")
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Cancelled));
        assert!(base.remote);
    }

    #[test]
    fn display_is_path_slash_name() {
        let source = Source {
            path: "testdata".to_string(),
            name: "test.wft".to_string(),
            ..Default::default()
        };
        assert_eq!(source.to_string(), "testdata/test.wft");
        assert_eq!(Source::default().to_string(), "");
    }
}
