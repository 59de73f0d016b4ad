//! reqwest-backed GitHub REST client.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use super::{GithubError, RepoFetcher, RepoTree};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// GitHub REST client. An optional token raises the rate limit.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    #[serde(default)]
    encoding: String,
}

impl GithubClient {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self::with_base(DEFAULT_API_BASE, token)
    }

    /// Point the client at another API root (GitHub Enterprise, test server).
    #[must_use]
    pub fn with_base(api_base: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GithubError> {
        trace!(url, "GitHub GET");
        let mut request = self
            .client
            .get(url)
            .header(USER_AGENT, concat!("hub-cli/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["message"].as_str().map(ToString::to_string))
                .unwrap_or(body);
            return Err(GithubError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GithubError::Decode(format!("{url}: {e}")))
    }
}

/// Decode a blob payload. GitHub wraps base64 content at 60 columns.
fn decode_blob(content: &str, encoding: &str) -> Result<String, GithubError> {
    match encoding {
        "base64" => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD
                .decode(compact)
                .map_err(|e| GithubError::Decode(format!("invalid base64: {e}")))?;
            String::from_utf8(bytes)
                .map_err(|_| GithubError::Decode("blob is not valid UTF-8".to_string()))
        }
        "utf-8" | "" => Ok(content.to_string()),
        other => Err(GithubError::Decode(format!("unsupported blob encoding: {other}"))),
    }
}

impl RepoFetcher for GithubClient {
    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String, GithubError> {
        let url = format!("{}/repos/{owner}/{repo}", self.api_base);
        let repo: RepoResponse = self.get_json(&url).await?;
        Ok(repo.default_branch)
    }

    async fn tree(&self, owner: &str, repo: &str, branch: &str) -> Result<RepoTree, GithubError> {
        let url = format!(
            "{}/repos/{owner}/{repo}/git/trees/{branch}?recursive=1",
            self.api_base
        );
        self.get_json(&url).await
    }

    async fn blob(&self, url: &str) -> Result<String, GithubError> {
        let blob: BlobResponse = self.get_json(url).await?;
        decode_blob(&blob.content, &blob.encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};

    #[test]
    fn test_decode_blob_tolerates_line_breaks() {
        let encoded = STANDARD.encode("hello, hub\n");
        let (head, tail) = encoded.split_at(6);
        let wrapped = format!("{head}\n{tail}\n");
        assert_eq!(decode_blob(&wrapped, "base64").unwrap(), "hello, hub\n");
    }

    #[test]
    fn test_decode_blob_rejects_binary() {
        let encoded = STANDARD.encode([0xff_u8, 0xfe, 0x00]);
        assert!(matches!(
            decode_blob(&encoded, "base64"),
            Err(GithubError::Decode(_))
        ));
        assert_eq!(decode_blob("plain", "utf-8").unwrap(), "plain");
    }

    async fn serve_fake_github() -> String {
        let app = Router::new()
            .route(
                "/repos/{owner}/{repo}",
                get(|Path((owner, _repo)): Path<(String, String)>| async move {
                    if owner == "missing" {
                        return Err((
                            StatusCode::NOT_FOUND,
                            Json(serde_json::json!({"message": "Not Found"})),
                        ));
                    }
                    Ok(Json(serde_json::json!({"default_branch": "trunk"})))
                }),
            )
            .route(
                "/repos/{owner}/{repo}/git/trees/{branch}",
                get(|| async {
                    Json(serde_json::json!({
                        "tree": [{"path": "a.md", "type": "blob", "sha": "1", "size": 5, "url": "unused"}],
                        "truncated": true
                    }))
                }),
            )
            .route(
                "/blobs/{sha}",
                get(|| async {
                    Json(serde_json::json!({
                        "content": STANDARD.encode("# hi\n"),
                        "encoding": "base64"
                    }))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_client_against_fake_api() {
        let base = serve_fake_github().await;
        let client = GithubClient::with_base(&base, Some("token".into()));

        assert_eq!(client.default_branch("o", "r").await.unwrap(), "trunk");

        let tree = client.tree("o", "r", "trunk").await.unwrap();
        assert!(tree.truncated);
        assert_eq!(tree.entries[0].path, "a.md");

        let text = client.blob(&format!("{base}/blobs/1")).await.unwrap();
        assert_eq!(text, "# hi\n");

        let err = client.default_branch("missing", "r").await.unwrap_err();
        match err {
            GithubError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
