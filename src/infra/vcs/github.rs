//! GitHub REST source for commits, pull requests and comparisons.

use crate::domain::{FileDetails, FileStatus, SourceError};
use crate::infra::diff::split::{binary_placeholder_patch, split_multi_file_patch};
use crate::infra::image::{BlobSource, Revision};
use crate::infra::vcs::traits::{DiffProvider, FetchedDiff};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::OnceCell;

const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("patchview/", env!("CARGO_PKG_VERSION"));

pub const FILES_PER_PAGE: usize = 100;
/// The files endpoint stops at 3000 entries.
const MAX_FILE_PAGES: u32 = 30;

lazy_static! {
    static ref GH_URL_RE: Regex =
        Regex::new(r"^https?://(?:www\.)?github\.com/([^/\s]+)/([^/\s]+)/(commit|pull|compare)/([^?#\s]+)")
            .expect("github url regex");
    static ref GH_HOST_RE: Regex =
        Regex::new(r"^https?://(?:www\.)?github\.com/").expect("github host regex");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubTarget {
    Commit {
        owner: String,
        repo: String,
        sha: String,
    },
    PullRequest {
        owner: String,
        repo: String,
        number: u64,
    },
    Compare {
        owner: String,
        repo: String,
        base: String,
        head: String,
    },
}

impl GitHubTarget {
    pub fn owner(&self) -> &str {
        match self {
            GitHubTarget::Commit { owner, .. }
            | GitHubTarget::PullRequest { owner, .. }
            | GitHubTarget::Compare { owner, .. } => owner,
        }
    }

    pub fn repo(&self) -> &str {
        match self {
            GitHubTarget::Commit { repo, .. }
            | GitHubTarget::PullRequest { repo, .. }
            | GitHubTarget::Compare { repo, .. } => repo,
        }
    }

    fn default_title(&self) -> String {
        let (owner, repo) = (self.owner(), self.repo());
        match self {
            GitHubTarget::Commit { sha, .. } => {
                let short: String = sha.chars().take(7).collect();
                format!("{owner}/{repo}@{short}")
            }
            GitHubTarget::PullRequest { number, .. } => format!("{owner}/{repo}#{number}"),
            GitHubTarget::Compare { base, head, .. } => format!("{owner}/{repo} {base}...{head}"),
        }
    }
}

pub fn is_github_url(input: &str) -> bool {
    GH_URL_RE.is_match(input.trim())
}

/// Any github.com URL, including forms [`parse_github_url`] rejects.
pub fn is_github_host(input: &str) -> bool {
    GH_HOST_RE.is_match(input.trim())
}

pub fn parse_github_url(input: &str) -> Result<GitHubTarget, SourceError> {
    let trimmed = input.trim();
    let invalid = || SourceError::InvalidUrl(trimmed.to_string());
    let caps = GH_URL_RE.captures(trimmed).ok_or_else(invalid)?;

    let owner = caps[1].to_string();
    let repo = caps[2].to_string();
    let rest = caps[4].trim_end_matches('/');
    let first_segment = rest.split('/').next().unwrap_or_default();

    match &caps[3] {
        "commit" => {
            if first_segment.is_empty() {
                return Err(invalid());
            }
            Ok(GitHubTarget::Commit {
                owner,
                repo,
                sha: first_segment.to_string(),
            })
        }
        "pull" => {
            let number = first_segment.parse::<u64>().map_err(|_| invalid())?;
            Ok(GitHubTarget::PullRequest {
                owner,
                repo,
                number,
            })
        }
        _ => {
            let (base, head) = parse_compare_range(rest)?;
            Ok(GitHubTarget::Compare {
                owner,
                repo,
                base,
                head,
            })
        }
    }
}

/// Splits `base...head` (or `base..head`) into its two refs.
pub fn parse_compare_range(range: &str) -> Result<(String, String), SourceError> {
    let invalid = || SourceError::InvalidCompareRange(range.to_string());
    let (base, head) = range
        .split_once("...")
        .or_else(|| range.split_once(".."))
        .ok_or_else(invalid)?;
    if base.is_empty() || head.is_empty() || head.starts_with('.') {
        return Err(invalid());
    }
    Ok((base.to_string(), head.to_string()))
}

/// Thin REST client. Every non-2xx response becomes [`SourceError::Http`].
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|err| {
                log::warn!("Falling back to default HTTP client: {err}");
                reqwest::Client::new()
            });
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        accept: &str,
    ) -> Result<reqwest::Response, SourceError> {
        let url = format!("{}{}", self.api_base, path);
        log::debug!("GET {url}");

        let mut request = self
            .http
            .get(&url)
            .query(query)
            .header(ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    pub async fn get_diff(&self, path: &str) -> Result<String, SourceError> {
        Ok(self.get(path, &[], DIFF_MEDIA_TYPE).await?.text().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let text = self.get(path, query, JSON_MEDIA_TYPE).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get_raw(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, SourceError> {
        Ok(self
            .get(path, query, RAW_MEDIA_TYPE)
            .await?
            .bytes()
            .await?
            .to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct ShaJson {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitJson {
    #[serde(default)]
    parents: Vec<ShaJson>,
}

#[derive(Debug, Deserialize)]
struct PullJson {
    title: Option<String>,
    base: ShaJson,
    head: ShaJson,
}

#[derive(Debug, Deserialize)]
struct PullFileJson {
    filename: String,
    previous_filename: Option<String>,
    status: String,
    #[serde(default)]
    changes: u64,
    patch: Option<String>,
}

/// Builds a per-file patch for a pull request file entry. The files
/// endpoint returns hunks only, so git headers are synthesized.
fn pull_file_details(file: PullFileJson) -> FileDetails {
    let to_file = file.filename;
    let from_file = file.previous_filename.unwrap_or_else(|| to_file.clone());
    let status = match file.status.as_str() {
        "added" => FileStatus::Added,
        "removed" => FileStatus::Removed,
        "renamed" if file.changes == 0 => FileStatus::Renamed,
        "renamed" => FileStatus::RenamedModified,
        _ => FileStatus::Modified,
    };

    let content = match file.patch {
        Some(patch) => {
            let old_header = if status == FileStatus::Added {
                "/dev/null".to_string()
            } else {
                format!("a/{from_file}")
            };
            let new_header = if status == FileStatus::Removed {
                "/dev/null".to_string()
            } else {
                format!("b/{to_file}")
            };
            let mut content = format!("diff --git a/{from_file} b/{to_file}\n--- {old_header}\n+++ {new_header}\n{patch}");
            if !content.ends_with('\n') {
                content.push('\n');
            }
            content
        }
        None => binary_placeholder_patch(&from_file, &to_file),
    };

    FileDetails {
        from_file,
        to_file,
        content,
        status,
    }
}

pub struct GitHubProvider {
    client: GitHubClient,
}

impl GitHubProvider {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    async fn fetch_pull_files(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<FileDetails>, SourceError> {
        let path = format!("/repos/{owner}/{repo}/pulls/{number}/files");
        let mut files = Vec::new();

        for page in 1..=MAX_FILE_PAGES {
            let entries: Vec<PullFileJson> = self
                .client
                .get_json(
                    &path,
                    &[("per_page", FILES_PER_PAGE.to_string()), ("page", page.to_string())],
                )
                .await?;
            let count = entries.len();
            files.extend(entries.into_iter().map(pull_file_details));
            if count < FILES_PER_PAGE {
                break;
            }
        }

        Ok(files)
    }
}

#[async_trait]
impl DiffProvider for GitHubProvider {
    fn id(&self) -> &str {
        "github"
    }

    fn name(&self) -> &str {
        "GitHub"
    }

    fn matches_ref(&self, reference: &str) -> bool {
        is_github_host(reference)
    }

    async fn fetch(&self, reference: &str) -> Result<FetchedDiff, SourceError> {
        let target = parse_github_url(reference)?;
        let owner = target.owner().to_string();
        let repo = target.repo().to_string();
        let mut title = target.default_title();

        let (files, refs) = match &target {
            GitHubTarget::Commit { sha, .. } => {
                let text = self
                    .client
                    .get_diff(&format!("/repos/{owner}/{repo}/commits/{sha}"))
                    .await?;
                (split_multi_file_patch(&text), RefResolver::CommitParent(sha.clone()))
            }
            GitHubTarget::Compare { base, head, .. } => {
                let text = self
                    .client
                    .get_diff(&format!("/repos/{owner}/{repo}/compare/{base}...{head}"))
                    .await?;
                let refs = RefResolver::Fixed(RevisionRefs {
                    base: Some(base.clone()),
                    head: head.clone(),
                });
                (split_multi_file_patch(&text), refs)
            }
            GitHubTarget::PullRequest { number, .. } => {
                let pull: PullJson = self
                    .client
                    .get_json(&format!("/repos/{owner}/{repo}/pulls/{number}"), &[])
                    .await?;
                if let Some(pull_title) = pull.title.filter(|t| !t.is_empty()) {
                    title = format!("{pull_title} ({title})");
                }
                let files = self.fetch_pull_files(&owner, &repo, *number).await?;
                let refs = RefResolver::Fixed(RevisionRefs {
                    base: Some(pull.base.sha),
                    head: pull.head.sha,
                });
                (files, refs)
            }
        };

        log::info!("Fetched {} files for {title}", files.len());
        let blobs = GitHubBlobSource::new(self.client.clone(), owner, repo, refs);
        Ok(FetchedDiff {
            title,
            files,
            blobs: Some(Arc::new(blobs)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RevisionRefs {
    base: Option<String>,
    head: String,
}

#[derive(Debug, Clone)]
enum RefResolver {
    Fixed(RevisionRefs),
    /// Base is the first parent of the commit, looked up on first use.
    CommitParent(String),
}

/// Fetches raw file contents through the contents endpoint.
pub struct GitHubBlobSource {
    client: GitHubClient,
    owner: String,
    repo: String,
    resolver: RefResolver,
    refs: OnceCell<RevisionRefs>,
}

impl GitHubBlobSource {
    fn new(client: GitHubClient, owner: String, repo: String, resolver: RefResolver) -> Self {
        Self {
            client,
            owner,
            repo,
            resolver,
            refs: OnceCell::new(),
        }
    }

    async fn resolve_refs(&self) -> Result<RevisionRefs, SourceError> {
        match &self.resolver {
            RefResolver::Fixed(refs) => Ok(refs.clone()),
            RefResolver::CommitParent(sha) => {
                let commit: CommitJson = self
                    .client
                    .get_json(&format!("/repos/{}/{}/commits/{sha}", self.owner, self.repo), &[])
                    .await?;
                Ok(RevisionRefs {
                    base: commit.parents.into_iter().next().map(|parent| parent.sha),
                    head: sha.clone(),
                })
            }
        }
    }
}

#[async_trait]
impl BlobSource for GitHubBlobSource {
    async fn fetch_blob(&self, path: &str, revision: Revision) -> Result<Vec<u8>, SourceError> {
        let refs = self.refs.get_or_try_init(|| self.resolve_refs()).await?;
        let git_ref = match revision {
            Revision::Head => refs.head.clone(),
            Revision::Base => refs
                .base
                .clone()
                .ok_or_else(|| SourceError::NoBaseRevision(path.to_string()))?,
        };

        self.client
            .get_raw(
                &format!("/repos/{}/{}/contents/{path}", self.owner, self.repo),
                &[("ref", git_ref)],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commit_url() {
        let target = parse_github_url("https://github.com/octo/hello/commit/abc1234def").unwrap();
        assert_eq!(
            target,
            GitHubTarget::Commit {
                owner: "octo".into(),
                repo: "hello".into(),
                sha: "abc1234def".into(),
            }
        );
        assert_eq!(target.default_title(), "octo/hello@abc1234");
    }

    #[test]
    fn test_parse_pull_url_with_trailing_path() {
        let target = parse_github_url("https://github.com/octo/hello/pull/42/files#diff-1").unwrap();
        assert_eq!(
            target,
            GitHubTarget::PullRequest {
                owner: "octo".into(),
                repo: "hello".into(),
                number: 42,
            }
        );
    }

    #[test]
    fn test_parse_compare_url_variants() {
        let three = parse_github_url("https://github.com/o/r/compare/main...feature/x").unwrap();
        assert_eq!(
            three,
            GitHubTarget::Compare {
                owner: "o".into(),
                repo: "r".into(),
                base: "main".into(),
                head: "feature/x".into(),
            }
        );
        let two = parse_github_url("https://github.com/o/r/compare/v1.0..v1.1").unwrap();
        assert!(matches!(two, GitHubTarget::Compare { ref base, ref head, .. } if base == "v1.0" && head == "v1.1"));
    }

    #[test]
    fn test_bad_compare_range_is_rejected() {
        let err = parse_github_url("https://github.com/o/r/compare/main").unwrap_err();
        assert!(matches!(err, SourceError::InvalidCompareRange(range) if range == "main"));
        assert!(parse_compare_range("...head").is_err());
        assert!(parse_compare_range("base...").is_err());
    }

    #[test]
    fn test_unsupported_github_pages_are_still_claimed() {
        let provider = GitHubProvider::new(GitHubClient::new("http://127.0.0.1:9", None));
        assert!(provider.matches_ref("https://github.com/o/r/tree/main"));
        assert!(!is_github_url("https://github.com/o/r/tree/main"));
        assert!(!provider.matches_ref("fix.patch"));
    }

    #[tokio::test]
    async fn test_root_commit_has_no_base_blob() {
        let source = GitHubBlobSource::new(
            GitHubClient::new("http://127.0.0.1:9", None),
            "o".into(),
            "r".into(),
            RefResolver::Fixed(RevisionRefs {
                base: None,
                head: "abc".into(),
            }),
        );
        let err = source.fetch_blob("logo.png", Revision::Base).await.unwrap_err();
        assert!(matches!(err, SourceError::NoBaseRevision(path) if path == "logo.png"));
    }

    #[test]
    fn test_non_github_urls_are_rejected() {
        assert!(!is_github_url("https://gitlab.com/o/r/commit/abc"));
        assert!(!is_github_url("changes.patch"));
        assert!(matches!(
            parse_github_url("https://github.com/o/r/pull/abc"),
            Err(SourceError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_pull_file_gets_synthetic_headers() {
        let details = pull_file_details(PullFileJson {
            filename: "src/new.rs".into(),
            previous_filename: None,
            status: "added".into(),
            changes: 1,
            patch: Some("@@ -0,0 +1 @@\n+fn x() {}".into()),
        });
        assert_eq!(details.status, FileStatus::Added);
        assert_eq!(
            details.content,
            "diff --git a/src/new.rs b/src/new.rs\n--- /dev/null\n+++ b/src/new.rs\n@@ -0,0 +1 @@\n+fn x() {}\n"
        );
    }

    #[test]
    fn test_pull_file_without_patch_is_binary() {
        let details = pull_file_details(PullFileJson {
            filename: "logo.png".into(),
            previous_filename: Some("old-logo.png".into()),
            status: "renamed".into(),
            changes: 0,
            patch: None,
        });
        assert_eq!(details.status, FileStatus::Renamed);
        assert_eq!(details.from_file, "old-logo.png");
        assert!(details.content.contains("Cannot show binary file"));
    }
}
