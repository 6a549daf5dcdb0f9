//! Remote source fetching: HTTP(S) URLs and VCS coordinates.
//!
//! VCS coordinates of the form `github.com/<owner>/<repo>[/<path>][@<ref>]`
//! are resolved to pinned raw-content URLs instead of local clones; the
//! resulting source still carries full [`Repo`] provenance.

use std::env;
use std::path::Path;
use std::time::Duration;

use weft_config::WeftConfig;
use weft_core::log_debug;
use weft_core::system::TOOL_FILE;
use weft_core::types::Repo;

use crate::LoadContext;
use crate::error::LoadError;
use crate::source::Source;

/// Tunables for remote fetching, usually sourced from [`WeftConfig`].
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Environment variable the bearer token is read from.
    pub token_env: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from_config(&WeftConfig::default())
    }
}

impl FetchSettings {
    /// Settings from a parsed configuration.
    pub fn from_config(config: &WeftConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            token_env: config.fetch.token_env.clone(),
        }
    }
}

/// Attempt a remote load of `name` against `base`. Returns `Ok(None)` when
/// the name is not remote-shaped (or the server reports it missing), so the
/// resolver can fall through to its not-found error.
pub(crate) async fn load_remote(
    ctx: &LoadContext,
    base: &Source,
    name: &str,
) -> Result<Option<Source>, LoadError> {
    let mut repo = None;

    let url = if name.starts_with("http://") || name.starts_with("https://") {
        name.to_string()
    } else if base.remote && !base.path.is_empty() {
        repo = base.repo.as_ref().map(|repo| derive_repo(repo, name));
        join_url(&base.path, name)
    } else if let Some(coordinate) = GithubRef::parse(name) {
        let url = coordinate.raw_url();
        repo = Some(coordinate.repo());
        url
    } else {
        return Ok(None);
    };

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Ok(None);
    }

    ctx.check_cancelled()?;
    log_debug!("loader", "fetching {url}");

    let mut request = ctx.client.get(url.as_str()).timeout(ctx.fetch.timeout);
    if let Ok(token) = env::var(&ctx.fetch.token_env) {
        request = request.bearer_auth(token);
    }

    let response = tokio::select! {
        _ = ctx.cancel.cancelled() => return Err(LoadError::Cancelled),
        response = request.send() => response.map_err(|source| LoadError::Http {
            url: url.clone(),
            source,
        })?,
    };

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(LoadError::HttpStatus {
            url,
            status: response.status(),
        });
    }

    let content = tokio::select! {
        _ = ctx.cancel.cancelled() => return Err(LoadError::Cancelled),
        bytes = response.bytes() => bytes.map_err(|source| LoadError::Http {
            url: url.clone(),
            source,
        })?,
    };

    let (path, file_name) = match url.rsplit_once('/') {
        Some((path, file_name)) => (path.to_string(), file_name.to_string()),
        None => (url.clone(), String::new()),
    };

    Ok(Some(Source {
        content: content.to_vec(),
        remote: true,
        path,
        name: file_name,
        location: url,
        repo,
    }))
}

/// Join a relative reference onto a URL base, folding `./` and `../`
/// segments so that cyclically referenced locations stay identical.
fn join_url(base: &str, name: &str) -> String {
    let mut base = base.trim_end_matches('/').to_string();
    let mut name = name;
    loop {
        if let Some(rest) = name.strip_prefix("./") {
            name = rest;
        } else if let Some(rest) = name.strip_prefix("../") {
            if let Some(idx) = base.rfind('/') {
                base.truncate(idx);
            }
            name = rest;
        } else {
            break;
        }
    }
    format!("{base}/{name}")
}

/// Rebase repository coordinates onto a relative reference: the carried
/// `Repo` must describe the file being resolved, not the file it was
/// reached from.
fn derive_repo(base: &Repo, name: &str) -> Repo {
    let joined = if base.path.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base.path, name)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let (path, name) = match segments.split_last() {
        Some((name, path)) => (path.join("/"), (*name).to_string()),
        None => (String::new(), String::new()),
    };

    Repo {
        path,
        name,
        ..base.clone()
    }
}

/// A parsed `github.com/<owner>/<repo>[/<path>][@<ref>]` coordinate.
#[derive(Debug, PartialEq)]
struct GithubRef {
    owner: String,
    repo: String,
    path: String,
    revision: String,
}

impl GithubRef {
    fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix("github.com/")?;
        let (rest, revision) = match rest.split_once('@') {
            Some((rest, revision)) if !revision.is_empty() => (rest, revision),
            Some((rest, _)) => (rest, "HEAD"),
            None => (rest, "HEAD"),
        };

        let mut parts = rest.splitn(3, '/');
        let owner = parts.next().unwrap_or_default();
        let repo = parts.next().unwrap_or_default();
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        let path = parts.next().unwrap_or_default().trim_matches('/');

        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
            revision: revision.to_string(),
        })
    }

    /// Path of the file to fetch inside the repository; coordinates that
    /// name no file point at the repository's default tool file.
    fn file_path(&self) -> String {
        if self.path.is_empty() {
            TOOL_FILE.to_string()
        } else if Path::new(&self.path).extension().is_some() {
            self.path.clone()
        } else {
            format!("{}/{}", self.path, TOOL_FILE)
        }
    }

    fn raw_url(&self) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            self.owner,
            self.repo,
            self.revision,
            self.file_path()
        )
    }

    fn repo(&self) -> Repo {
        let file_path = self.file_path();
        let (path, name) = match file_path.rsplit_once('/') {
            Some((path, name)) => (path.to_string(), name.to_string()),
            None => (String::new(), file_path),
        };
        Repo {
            vcs: "git".to_string(),
            root: format!("https://github.com/{}/{}.git", self.owner, self.repo),
            path,
            name,
            revision: self.revision.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_repository_coordinates() {
        let parsed = GithubRef::parse("github.com/acme/tools").unwrap();
        assert_eq!(parsed.revision, "HEAD");
        assert_eq!(
            parsed.raw_url(),
            "https://raw.githubusercontent.com/acme/tools/HEAD/tool.wft"
        );
    }

    #[test]
    fn parses_paths_and_revisions() {
        let parsed = GithubRef::parse("github.com/acme/tools/agents/review.wft@v1.2").unwrap();
        assert_eq!(parsed.revision, "v1.2");
        assert_eq!(
            parsed.raw_url(),
            "https://raw.githubusercontent.com/acme/tools/v1.2/agents/review.wft"
        );

        let repo = parsed.repo();
        assert_eq!(repo.root, "https://github.com/acme/tools.git");
        assert_eq!(repo.path, "agents");
        assert_eq!(repo.name, "review.wft");
        assert_eq!(repo.revision, "v1.2");
    }

    #[test]
    fn directory_coordinates_get_the_default_tool_file() {
        let parsed = GithubRef::parse("github.com/acme/tools/agents").unwrap();
        assert_eq!(
            parsed.raw_url(),
            "https://raw.githubusercontent.com/acme/tools/HEAD/agents/tool.wft"
        );
    }

    #[test]
    fn rejects_non_github_names() {
        assert!(GithubRef::parse("./lib.wft").is_none());
        assert!(GithubRef::parse("gitlab.com/acme/tools").is_none());
        assert!(GithubRef::parse("github.com/only-owner").is_none());
    }

    #[test]
    fn relative_references_rebase_repo_coordinates() {
        let base = GithubRef::parse("github.com/acme/tools/agents/review.wft@v1.2")
            .unwrap()
            .repo();

        let derived = derive_repo(&base, "./helper.wft");
        assert_eq!(derived.path, "agents");
        assert_eq!(derived.name, "helper.wft");
        assert_eq!(derived.root, base.root);
        assert_eq!(derived.revision, "v1.2");

        let derived = derive_repo(&base, "../shared/common.wft");
        assert_eq!(derived.path, "shared");
        assert_eq!(derived.name, "common.wft");
    }

    #[test]
    fn join_url_folds_relative_segments() {
        assert_eq!(
            join_url("https://x.dev/a/b", "./c.wft"),
            "https://x.dev/a/b/c.wft"
        );
        assert_eq!(
            join_url("https://x.dev/a/b", "../c.wft"),
            "https://x.dev/a/c.wft"
        );
        assert_eq!(join_url("https://x.dev/a/", "c.wft"), "https://x.dev/a/c.wft");
    }
}
