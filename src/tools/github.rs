//! GitHub repository search collaborator.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::{ToolKind, ToolResult};
use crate::tools::Tool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default = "default_sort")]
    sort: String,
    #[serde(default = "default_order")]
    order: String,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_sort() -> String {
    "stars".to_string()
}

fn default_order() -> String {
    "desc".to_string()
}

fn default_limit() -> u32 {
    5
}

pub struct GithubTool {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GithubTool {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.github_api_base.clone(),
            token: settings.github_token.clone(),
        })
    }

    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<reqwest::Response> {
        let mut request = self
            .http
            .get(format!("{}{endpoint}", self.base_url))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "opsagent")
            .query(params);

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {token}"));
        }

        Ok(request.send().await?)
    }

    fn map_repository(item: &Value) -> Repository {
        Repository {
            name: item["name"].as_str().unwrap_or_default().to_string(),
            full_name: item["full_name"].as_str().unwrap_or_default().to_string(),
            description: item["description"].as_str().map(str::to_owned),
            stars: item["stargazers_count"].as_u64().unwrap_or(0),
            forks: item["forks_count"].as_u64().unwrap_or(0),
            language: item["language"].as_str().map(str::to_owned),
            url: item["html_url"].as_str().unwrap_or_default().to_string(),
        }
    }

    fn status_error(status: reqwest::StatusCode) -> String {
        let mut message = format!("GitHub API error: {}", status.as_u16());
        match status.as_u16() {
            403 => message.push_str(" (Rate limit exceeded)"),
            422 => message.push_str(" (Invalid query)"),
            _ => {}
        }
        message
    }

    /// Fetches details for one repository.
    pub async fn get_repository(&self, owner: &str, repo: &str) -> ToolResult {
        let response = match self.get(&format!("/repos/{owner}/{repo}"), &[]).await {
            Ok(response) => response,
            Err(e) => return ToolResult::err(ToolKind::Github, e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            let message = Self::status_error(status);
            error!("{message}");
            return ToolResult::err(ToolKind::Github, message);
        }

        match response.json::<Value>().await {
            Ok(data) => {
                let repository = Self::map_repository(&data);
                match serde_json::to_value(&repository) {
                    Ok(value) => ToolResult::ok(ToolKind::Github, value),
                    Err(e) => ToolResult::err(ToolKind::Github, e.to_string()),
                }
            }
            Err(e) => ToolResult::err(ToolKind::Github, e.to_string()),
        }
    }
}

#[async_trait]
impl Tool for GithubTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Github
    }

    fn name(&self) -> &str {
        "GitHub"
    }

    fn description(&self) -> &str {
        "Search GitHub repositories and fetch repository information"
    }

    async fn execute(&self, params: &Value) -> Result<ToolResult> {
        let params: SearchParams = serde_json::from_value(params.clone())
            .map_err(|e| Error::Tool(format!("invalid github parameters: {e}")))?;
        let limit = params.limit.clamp(1, 10);

        info!("Searching GitHub for: {}", params.query);
        let response = self
            .get(
                "/search/repositories",
                &[
                    ("q", params.query),
                    ("sort", params.sort),
                    ("order", params.order),
                    ("per_page", limit.to_string()),
                ],
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::status_error(status);
            error!("{message}");
            return Ok(ToolResult::err(ToolKind::Github, message));
        }

        let data: Value = response.json().await?;
        let repositories: Vec<Repository> = data["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .take(limit as usize)
                    .map(Self::map_repository)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ToolResult::ok(
            ToolKind::Github,
            json!({
                "total_count": data["total_count"].as_u64().unwrap_or(0),
                "repositories": repositories,
            }),
        ))
    }
}
