use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::{
    error::tool_error::ToolError,
    tools::{
        ToolOutput,
        model::{ParamSpec, ToolSpec, field, required_str, str_param, u64_param},
        transport::{HttpRequest, HttpTransport},
    },
};

pub const NAME: &str = "github";
const BASE_URL: &str = "https://api.github.com";
const MAX_PER_PAGE: u64 = 100;

static SPEC: Lazy<ToolSpec> = Lazy::new(|| {
    ToolSpec::new(
        NAME,
        "Search GitHub repositories, get repository details including stars, forks, and descriptions",
    )
    .param(
        "action",
        ParamSpec::string("Action to perform: 'search' or 'get_repo'")
            .one_of(&["search", "get_repo"])
            .with_default(json!("search")),
    )
    .param("query", ParamSpec::string("Search query (for search action)"))
    .param(
        "repo",
        ParamSpec::string("Repository name in format 'owner/repo' (for get_repo action)"),
    )
    .param(
        "limit",
        ParamSpec::integer("Maximum number of results to return (default: 5)")
            .with_default(json!(5)),
    )
    .param(
        "sort",
        ParamSpec::string("Sort results by: stars, forks, updated (default: stars)")
            .one_of(&["stars", "forks", "updated"])
            .with_default(json!("stars")),
    )
});

pub struct GitHubTool {
    transport: Arc<dyn HttpTransport>,
    token: Option<String>,
}

impl GitHubTool {
    pub fn new(transport: Arc<dyn HttpTransport>, token: Option<String>) -> Self {
        Self { transport, token }
    }

    pub fn spec(&self) -> &ToolSpec {
        &SPEC
    }

    pub async fn execute(&self, params: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let params = SPEC.validate(params)?;
        match str_param(&params, "action").unwrap_or("search") {
            "get_repo" => {
                let repo = required_str(&params, "repo", "get_repo")?;
                if repo.split('/').filter(|p| !p.is_empty()).count() != 2 {
                    return Err(ToolError::Validation(format!(
                        "repo must look like 'owner/name', got '{}'",
                        repo
                    )));
                }
                let request = self.request(format!("{}/repos/{}", BASE_URL, repo));
                self.fetch(request, map_repository, || json!({ "repository": Value::Null }))
                    .await
            }
            _ => {
                let query = required_str(&params, "query", "search")?;
                let limit = u64_param(&params, "limit").unwrap_or(5).clamp(1, MAX_PER_PAGE);
                let sort = str_param(&params, "sort").unwrap_or("stars");
                let request = self
                    .request(format!("{}/search/repositories", BASE_URL))
                    .query("q", query)
                    .query("sort", sort)
                    .query("order", "desc")
                    .query("per_page", limit);
                self.fetch(
                    request,
                    |payload| map_search_response(query, limit as usize, payload),
                    || json!({ "query": query, "total_count": 0, "repositories": [] }),
                )
                .await
            }
        }
    }

    fn request(&self, url: String) -> HttpRequest {
        let request = HttpRequest::get(url).header("Accept", "application/vnd.github.v3+json");
        match &self.token {
            Some(token) => request.header("Authorization", format!("token {}", token)),
            None => request,
        }
    }

    /// Anonymous callers get a placeholder instead of a failure when GitHub is
    /// unreachable or rate-limits them.
    async fn fetch(
        &self,
        request: HttpRequest,
        map: impl FnOnce(&Value) -> Result<Value, ToolError>,
        placeholder: impl FnOnce() -> Value,
    ) -> Result<ToolOutput, ToolError> {
        match self.transport.get_json(request).await {
            Ok(payload) => Ok(ToolOutput::fresh(map(&payload)?)),
            Err(err) if self.token.is_none() && err.warrants_fallback() => {
                warn!(tool = NAME, error = %err, "no GITHUB_TOKEN configured, returning placeholder");
                let mut data = placeholder();
                if let Some(obj) = data.as_object_mut() {
                    obj.insert(
                        "message".into(),
                        json!(format!(
                            "GitHub is unavailable without a token ({}). Set GITHUB_TOKEN for live results.",
                            err
                        )),
                    );
                }
                Ok(ToolOutput::degraded(data))
            }
            Err(err) => Err(err),
        }
    }
}

fn summarize_repo(repo: &Value) -> Result<Value, ToolError> {
    Ok(json!({
        "name": field(repo, "/name")?,
        "full_name": field(repo, "/full_name")?,
        "description": repo.get("description").cloned().unwrap_or(Value::Null),
        "stars": field(repo, "/stargazers_count")?,
        "forks": field(repo, "/forks_count")?,
        "language": repo.get("language").cloned().unwrap_or(Value::Null),
        "url": field(repo, "/html_url")?,
        "updated_at": repo.get("updated_at").cloned().unwrap_or(Value::Null),
    }))
}

pub fn map_search_response(query: &str, limit: usize, payload: &Value) -> Result<Value, ToolError> {
    let items = field(payload, "/items")?
        .as_array()
        .ok_or_else(|| ToolError::upstream(None, "'items' is not a list"))?;
    let repositories = items
        .iter()
        .take(limit)
        .map(summarize_repo)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(json!({
        "query": query,
        "total_count": payload.get("total_count").and_then(Value::as_u64).unwrap_or(0),
        "repositories": repositories,
    }))
}

pub fn map_repository(payload: &Value) -> Result<Value, ToolError> {
    let mut repository = summarize_repo(payload)?;
    if let Some(obj) = repository.as_object_mut() {
        obj.insert(
            "watchers".into(),
            payload.get("watchers_count").cloned().unwrap_or(Value::Null),
        );
        obj.insert(
            "created_at".into(),
            payload.get("created_at").cloned().unwrap_or(Value::Null),
        );
        obj.insert(
            "topics".into(),
            payload.get("topics").cloned().unwrap_or_else(|| json!([])),
        );
        obj.insert(
            "license".into(),
            payload
                .pointer("/license/name")
                .cloned()
                .unwrap_or(Value::Null),
        );
    }
    Ok(json!({ "repository": repository }))
}
