//! Document store backed by the GitHub repository contents API.
//!
//! Each document is a file on one branch. The blob SHA GitHub reports for a
//! file is used as its version token, and GitHub itself rejects a `PUT` whose
//! `sha` no longer matches the head of the branch.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{header, StatusCode, Url};
use serde::{Deserialize, Serialize};

use super::{DocumentStore, StoreError, StoredDocument, VersionToken};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("marquee/", env!("CARGO_PKG_VERSION"));

/// Where the documents live and how to authenticate.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API root, `https://api.github.com` unless talking to an Enterprise host.
    pub api_url: String,
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

#[derive(Debug, Clone)]
pub struct GitHubStore {
    client: reqwest::Client,
    contents_url: Url,
    token: String,
    branch: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

impl GitHubStore {
    pub fn new(config: GitHubConfig) -> Result<Self, StoreError> {
        let base = format!(
            "{}/repos/{}/{}/contents",
            config.api_url.trim_end_matches('/'),
            config.owner,
            config.repo
        );
        let contents_url =
            Url::parse(&base).map_err(|e| StoreError::Config(format!("invalid api url {base}: {e}")))?;
        if contents_url.cannot_be_a_base() {
            return Err(StoreError::Config(format!("api url {base} cannot hold a path")));
        }

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            contents_url,
            token: config.token,
            branch: config.branch,
        })
    }

    fn file_url(&self, path: &str) -> Result<Url, StoreError> {
        let mut url = self.contents_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Config("api url cannot hold a path".into()))?
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, GITHUB_ACCEPT)
    }
}

/// GitHub wraps base64 content at 60 columns.
fn decode_content(path: &str, encoded: &str) -> Result<Vec<u8>, StoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| StoreError::Malformed {
        path: path.to_string(),
        message: format!("invalid base64 content: {e}"),
    })
}

/// The contents API only inlines files up to 1 MB; larger ones come back
/// with `encoding: "none"` and empty content.
fn unsupported_encoding(encoding: Option<&str>) -> String {
    match encoding {
        Some("none") => "content not inlined (encoding \"none\"): the GitHub contents API \
                         only returns files up to 1 MB"
            .to_string(),
        Some(other) => format!("unsupported content encoding {other}"),
        None => "missing content".to_string(),
    }
}

#[async_trait]
impl DocumentStore for GitHubStore {
    async fn fetch(&self, path: &str) -> Result<Option<StoredDocument>, StoreError> {
        let url = self.file_url(path)?;
        let resp = self
            .request(reqwest::Method::GET, url)
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(path, "document not found on GitHub");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                operation: "GET",
                path: path.to_string(),
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let body: ContentsResponse = resp.json().await.map_err(|e| StoreError::Malformed {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        let content = match (body.encoding.as_deref(), body.content.as_deref()) {
            (Some("base64") | None, Some(encoded)) => decode_content(path, encoded)?,
            (encoding, _) => {
                return Err(StoreError::Malformed {
                    path: path.to_string(),
                    message: unsupported_encoding(encoding),
                })
            }
        };

        Ok(Some(StoredDocument {
            content,
            version: VersionToken::new(body.sha),
        }))
    }

    async fn store(
        &self,
        path: &str,
        content: Vec<u8>,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, StoreError> {
        let url = self.file_url(path)?;
        let body = PutRequest {
            message: format!("Update {path} via marquee"),
            content: STANDARD.encode(content),
            branch: &self.branch,
            sha: expected.map(VersionToken::as_str),
        };

        let resp = self
            .request(reqwest::Method::PUT, url)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::CONFLICT {
            return Err(StoreError::Conflict {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            // A create without `sha` over an existing file is rejected as 422.
            if status == StatusCode::UNPROCESSABLE_ENTITY
                && expected.is_none()
                && message.contains("sha")
            {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                });
            }
            return Err(StoreError::Status {
                operation: "PUT",
                path: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let body: PutResponse = resp.json().await.map_err(|e| StoreError::Malformed {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(VersionToken::new(body.content.sha))
    }

    fn name(&self) -> &'static str {
        "github"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(api_url: &str) -> GitHubStore {
        GitHubStore::new(GitHubConfig {
            api_url: api_url.to_string(),
            token: "t".into(),
            owner: "jkwe".into(),
            repo: "site".into(),
            branch: "main".into(),
        })
        .unwrap()
    }

    #[test]
    fn file_url_keeps_directories() {
        let url = store("https://api.github.com/").file_url("data/movies.json").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/jkwe/site/contents/data/movies.json"
        );
    }

    #[test]
    fn file_url_escapes_segments() {
        let url = store("https://api.github.com").file_url("data/my movies.json").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/jkwe/site/contents/data/my%20movies.json"
        );
    }

    #[test]
    fn rejects_unusable_api_url() {
        let err = GitHubStore::new(GitHubConfig {
            api_url: "not a url".into(),
            token: "t".into(),
            owner: "o".into(),
            repo: "r".into(),
            branch: "main".into(),
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn decodes_wrapped_base64() {
        let decoded = decode_content("x", "WyJh\nIiwg\nImIiXQ==\n").unwrap();
        assert_eq!(decoded, br#"["a", "b"]"#);
    }

    #[test]
    fn oversized_file_message_names_the_limit() {
        let message = unsupported_encoding(Some("none"));
        assert!(message.contains("1 MB"), "{message}");
        assert_eq!(unsupported_encoding(Some("utf-16")), "unsupported content encoding utf-16");
    }
}
