use super::RepositoryHost;
use crate::error::FetchError;
use crate::model::{RepoRef, RepositoryMetadata};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::LINK;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Upper bound on pages fetched for one paginated listing.
const MAX_PAGES: usize = 50;

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Deserialize)]
struct RepoResponse {
    name: String,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    html_url: Option<String>,
}

/// GitHub REST API client.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self, FetchError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("depscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Http {
                url: api_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    fn repo_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}", self.api_url, repo.owner, repo.name)
    }

    /// Sends a GET to `url`. A 404 is `Ok(None)`; other failures are errors.
    async fn get(&self, url: &str) -> Result<Option<Response>, FetchError> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if !status.is_success() => Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }),
            _ => Ok(Some(response)),
        }
    }

    async fn decode_json<T: DeserializeOwned>(
        url: &str,
        response: Response,
    ) -> Result<T, FetchError> {
        let body = response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            details: e.to_string(),
        })
    }

    /// GETs `url` as JSON. A 404 is `Ok(None)`; other failures are errors.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, FetchError> {
        match self.get(url).await? {
            Some(response) => Self::decode_json(url, response).await.map(Some),
            None => Ok(None),
        }
    }

    /// Counts the entries of a paginated listing, following `Link: rel="next"`
    /// for at most [`MAX_PAGES`] pages.
    async fn count_listing(&self, url: &str) -> Result<Option<u64>, FetchError> {
        let mut count = 0u64;
        let mut next = Some(url.to_string());

        for _ in 0..MAX_PAGES {
            let Some(page_url) = next.take() else {
                return Ok(Some(count));
            };
            let Some(response) = self.get(&page_url).await? else {
                return Ok(None);
            };
            next = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(next_link);
            let page: Vec<serde_json::Value> = Self::decode_json(&page_url, response).await?;
            count += page.len() as u64;
        }

        if next.is_some() {
            tracing::warn!("{} has more than {} pages, count truncated", url, MAX_PAGES);
        }
        Ok(Some(count))
    }

    /// A contents-API URL that answers with a directory listing, or with a
    /// file too large to inline, has no usable content.
    async fn get_file(&self, url: &str) -> Result<Option<String>, FetchError> {
        let Some(value) = self.get_json::<serde_json::Value>(url).await? else {
            return Ok(None);
        };
        if !value.is_object() {
            return Ok(None);
        }
        let file: ContentResponse =
            serde_json::from_value(value).map_err(|e| FetchError::Decode {
                url: url.to_string(),
                details: e.to_string(),
            })?;
        if file.encoding != "base64" {
            tracing::debug!("{} has encoding {:?}, skipping", url, file.encoding);
            return Ok(None);
        }
        decode_content(url, &file.content).map(Some)
    }
}

/// The `rel="next"` target of a `Link` header, if any.
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == r#"rel="next""#)
            .then(|| target.trim().trim_start_matches('<').trim_end_matches('>').to_string())
    })
}

/// The contents API wraps base64 at 60 columns.
fn decode_content(url: &str, content: &str) -> Result<String, FetchError> {
    let packed: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(packed).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        details: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        details: e.to_string(),
    })
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn fetch_readme(&self, repo: &RepoRef) -> Result<String, FetchError> {
        let url = format!("{}/readme", self.repo_url(repo));
        self.get_file(&url).await?.ok_or(FetchError::Status { url, status: 404 })
    }

    /// Collaborators are counted across every page of the listing.
    async fn fetch_repo_metadata(&self, repo: &RepoRef) -> Result<RepositoryMetadata, FetchError> {
        let url = self.repo_url(repo);
        let info: RepoResponse = self
            .get_json(&url)
            .await?
            .ok_or_else(|| FetchError::Status {
                url: url.clone(),
                status: 404,
            })?;

        let collaborators_url = format!("{}/collaborators?per_page=100", url);
        let collaborator_count = match self.count_listing(&collaborators_url).await {
            Ok(count) => count,
            Err(e) => {
                tracing::debug!("collaborators unavailable for {}: {}", repo, e);
                None
            }
        };

        Ok(RepositoryMetadata {
            owner: repo.owner.clone(),
            name: info.name,
            description: info.description.unwrap_or_default(),
            stars: info.stargazers_count,
            forks: info.forks_count,
            collaborator_count,
            url: info.html_url.unwrap_or_else(|| repo.html_url()),
        })
    }

    async fn fetch_file_content(
        &self,
        repo: &RepoRef,
        manifest_id: &str,
    ) -> Result<Option<String>, FetchError> {
        let url = format!("{}/contents/{}", self.repo_url(repo), manifest_id);
        self.get_file(&url).await
    }
}
