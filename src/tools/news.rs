use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::{
    error::tool_error::ToolError,
    tools::{
        ToolOutput,
        model::{ParamSpec, ToolSpec, field, str_param, u64_param},
        transport::{HttpRequest, HttpTransport},
    },
};

pub const NAME: &str = "news";
const BASE_URL: &str = "https://newsapi.org/v2";

static SPEC: Lazy<ToolSpec> = Lazy::new(|| {
    ToolSpec::new(NAME, "Get latest news headlines from various sources and categories")
        .param(
            "category",
            ParamSpec::string(
                "News category: general, business, technology, science, health, sports, entertainment",
            )
            .one_of(&[
                "general",
                "business",
                "technology",
                "science",
                "health",
                "sports",
                "entertainment",
            ])
            .with_default(json!("general")),
        )
        .param(
            "country",
            ParamSpec::string("Country code (e.g., 'us', 'gb', 'ca')").with_default(json!("us")),
        )
        .param(
            "query",
            ParamSpec::string("Search query for specific news topics (optional)"),
        )
        .param(
            "limit",
            ParamSpec::integer("Maximum number of articles to return (default: 5)")
                .with_default(json!(5)),
        )
});

pub struct NewsTool {
    transport: Arc<dyn HttpTransport>,
    api_key: Option<String>,
}

impl NewsTool {
    pub fn new(transport: Arc<dyn HttpTransport>, api_key: Option<String>) -> Self {
        Self { transport, api_key }
    }

    pub fn spec(&self) -> &ToolSpec {
        &SPEC
    }

    pub async fn execute(&self, params: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let params = SPEC.validate(params)?;
        let category = str_param(&params, "category").unwrap_or("general");
        let limit = u64_param(&params, "limit").unwrap_or(5).clamp(1, 100);

        let Some(key) = &self.api_key else {
            info!(tool = NAME, category, "no NEWS_API_KEY configured, using placeholder headlines");
            return Ok(ToolOutput::degraded(placeholder_headlines(category)));
        };

        // A free-text query needs /everything; top-headlines only filters.
        let request = match str_param(&params, "query") {
            Some(query) => HttpRequest::get(format!("{}/everything", BASE_URL))
                .query("q", query)
                .query("sortBy", "publishedAt")
                .query("language", "en"),
            None => HttpRequest::get(format!("{}/top-headlines", BASE_URL))
                .query("category", category)
                .query("country", str_param(&params, "country").unwrap_or("us")),
        }
        .query("pageSize", limit)
        .query("apiKey", key);

        let payload = self.transport.get_json(request).await?;
        Ok(ToolOutput::fresh(map_headlines(limit as usize, &payload)?))
    }
}

pub fn map_headlines(limit: usize, payload: &Value) -> Result<Value, ToolError> {
    let status = payload.get("status").and_then(Value::as_str).unwrap_or("");
    if status != "ok" {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("news upstream reported an error");
        return Err(ToolError::upstream(None, message));
    }

    let articles = field(payload, "/articles")?
        .as_array()
        .ok_or_else(|| ToolError::upstream(None, "'articles' is not a list"))?
        .iter()
        .take(limit)
        .map(|article| {
            json!({
                "title": article.get("title").cloned().unwrap_or(Value::Null),
                "description": article.get("description").cloned().unwrap_or(Value::Null),
                "source": article.pointer("/source/name").cloned().unwrap_or(Value::Null),
                "url": article.get("url").cloned().unwrap_or(Value::Null),
                "published_at": article.get("publishedAt").cloned().unwrap_or(Value::Null),
                "author": article.get("author").cloned().unwrap_or(Value::Null),
            })
        })
        .collect::<Vec<_>>();

    Ok(json!({
        "total_results": payload.get("totalResults").and_then(Value::as_u64).unwrap_or(0),
        "articles": articles,
    }))
}

fn placeholder_headlines(category: &str) -> Value {
    let mut title = category.to_string();
    if let Some(first) = title.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    json!({
        "total_results": 1,
        "articles": [{
            "title": format!("Latest {} News Update", title),
            "description": format!("Top story in {} category", category),
            "source": "News Source",
            "url": "https://example.com/news",
            "published_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "author": "News Team",
        }],
        "message": "Using fallback news source. Set NEWS_API_KEY for real-time news.",
        "source": "fallback",
    })
}
