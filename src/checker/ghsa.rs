use super::AdvisorySource;
use crate::error::FetchError;
use crate::model::{Ecosystem, VulnerabilityMatch};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const QUERY: &str = r#"
query ($package: String!, $ecosystem: SecurityAdvisoryEcosystem!, $first: Int!) {
  securityVulnerabilities(first: $first, ecosystem: $ecosystem, package: $package) {
    nodes {
      severity
      vulnerableVersionRange
      advisory {
        permalink
        description
      }
    }
  }
}
"#;

#[derive(Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecurityVulnerabilitiesData {
    security_vulnerabilities: Connection,
}

#[derive(Deserialize)]
struct Connection {
    nodes: Vec<SecurityVulnerability>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecurityVulnerability {
    severity: String,
    vulnerable_version_range: String,
    advisory: Advisory,
}

#[derive(Deserialize)]
struct Advisory {
    permalink: String,
    #[serde(default)]
    description: String,
}

/// Client for GitHub's `securityVulnerabilities` GraphQL query.
pub struct GhsaClient {
    client: Client,
    token: Option<String>,
    graphql_url: String,
    first: u32,
}

impl GhsaClient {
    pub fn new(
        token: Option<String>,
        graphql_url: impl Into<String>,
        first: u32,
    ) -> Result<Self, FetchError> {
        let graphql_url = graphql_url.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("depscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Http {
                url: graphql_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            token,
            graphql_url,
            first: first.max(1),
        })
    }
}

/// Turns a GraphQL response body into advisory matches. GraphQL reports
/// failures in `errors` with a 200 status, so those are checked first.
fn decode_response(
    package: &str,
    url: &str,
    body: &str,
) -> Result<Vec<VulnerabilityMatch>, FetchError> {
    let response: GraphQLResponse<SecurityVulnerabilitiesData> =
        serde_json::from_str(body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            details: e.to_string(),
        })?;

    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let message = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(FetchError::Advisory {
            package: package.to_string(),
            message,
        });
    }

    let Some(data) = response.data else {
        return Err(FetchError::Decode {
            url: url.to_string(),
            details: "response has neither data nor errors".to_string(),
        });
    };

    Ok(data
        .security_vulnerabilities
        .nodes
        .into_iter()
        .map(|node| {
            VulnerabilityMatch::new(
                node.vulnerable_version_range,
                node.severity,
                node.advisory.permalink,
                node.advisory.description,
            )
        })
        .collect())
}

#[async_trait]
impl AdvisorySource for GhsaClient {
    fn name(&self) -> &'static str {
        "GitHub Advisory Database"
    }

    async fn fetch_advisory_ranges(
        &self,
        ecosystem: Ecosystem,
        name: &str,
    ) -> Result<Vec<VulnerabilityMatch>, FetchError> {
        let Some(advisory_ecosystem) = ecosystem.advisory_ecosystem() else {
            return Ok(Vec::new());
        };

        let request = GraphQLRequest {
            query: QUERY,
            variables: serde_json::json!({
                "package": name,
                "ecosystem": advisory_ecosystem,
                "first": self.first,
            }),
        };

        let mut builder = self.client.post(&self.graphql_url).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|source| FetchError::Http {
            url: self.graphql_url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.graphql_url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Http {
            url: self.graphql_url.clone(),
            source,
        })?;

        let matches = decode_response(name, &self.graphql_url, &body)?;
        tracing::debug!(
            "{} advisories for {} {}",
            matches.len(),
            advisory_ecosystem,
            name
        );
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://api.github.com/graphql";

    #[test]
    fn test_decode_vulnerabilities() {
        let body = r#"{"data": {"securityVulnerabilities": {"nodes": [
            {
                "severity": "HIGH",
                "vulnerableVersionRange": "< 4.17.21",
                "advisory": {
                    "permalink": "https://github.com/advisories/GHSA-35jh-r3h4-6jhm",
                    "description": "Command injection in template"
                }
            },
            {
                "severity": "MODERATE",
                "vulnerableVersionRange": ">= 4.0.0, < 4.17.11",
                "advisory": {"permalink": "https://github.com/advisories/GHSA-x5rq-j2xg-h7qm"}
            }
        ]}}}"#;

        let matches = decode_response("lodash", URL, body).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].range, "< 4.17.21");
        assert_eq!(matches[0].severity, "HIGH");
        assert_eq!(
            matches[0].advisory_link,
            "https://github.com/advisories/GHSA-35jh-r3h4-6jhm"
        );
        assert_eq!(matches[1].description, "");
    }

    #[test]
    fn test_decode_graphql_errors() {
        let body = r#"{"data": null, "errors": [{"message": "Bad credentials"}]}"#;
        let err = decode_response("lodash", URL, body).unwrap_err();
        assert!(matches!(
            err,
            FetchError::Advisory { ref message, .. } if message == "Bad credentials"
        ));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_response("lodash", URL, "<html>"),
            Err(FetchError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_ecosystem_without_database_skips_request() {
        let client = GhsaClient::new(None, "http://127.0.0.1:9/unreachable", 5).unwrap();
        let matches = client
            .fetch_advisory_ranges(Ecosystem::Native, "zlib")
            .await
            .unwrap();
        assert!(matches.is_empty());
    }
}
