use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::{
    error::tool_error::ToolError,
    tools::{
        ToolOutput,
        model::{ParamSpec, ToolSpec, f64_param, field, required_str},
        transport::{HttpRequest, HttpTransport},
    },
};

pub const NAME: &str = "exchange_rate";
const OPEN_URL: &str = "https://api.exchangerate-api.com/v4/latest";
const KEYED_URL: &str = "https://v6.exchangerate-api.com/v6";
const SECONDARY_URL: &str = "https://open.er-api.com/v6/latest";

static SPEC: Lazy<ToolSpec> = Lazy::new(|| {
    ToolSpec::new(
        NAME,
        "Get current exchange rates between currencies (e.g., USD to EUR, GBP to JPY)",
    )
    .param(
        "from",
        ParamSpec::string("Source currency code (e.g., 'USD', 'EUR', 'GBP')").required(),
    )
    .param(
        "to",
        ParamSpec::string("Target currency code (e.g., 'USD', 'EUR', 'GBP')").required(),
    )
    .param(
        "amount",
        ParamSpec::number("Amount to convert (default: 1)").with_default(json!(1)),
    )
});

pub struct ExchangeRateTool {
    transport: Arc<dyn HttpTransport>,
    api_key: Option<String>,
}

impl ExchangeRateTool {
    pub fn new(transport: Arc<dyn HttpTransport>, api_key: Option<String>) -> Self {
        Self { transport, api_key }
    }

    pub fn spec(&self) -> &ToolSpec {
        &SPEC
    }

    pub async fn execute(&self, params: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let params = SPEC.validate(params)?;
        let from = currency_code(required_str(&params, "from", NAME)?)?;
        let to = currency_code(required_str(&params, "to", NAME)?)?;
        let amount = f64_param(&params, "amount").unwrap_or(1.0);

        if let Some(key) = &self.api_key {
            let url = format!("{}/{}/latest/{}", KEYED_URL, key, from);
            let payload = self.transport.get_json(HttpRequest::get(url)).await?;
            let quote = map_rates(&from, &to, amount, "/conversion_rates", &payload)?;
            return Ok(ToolOutput::fresh(quote));
        }

        let primary = HttpRequest::get(format!("{}/{}", OPEN_URL, from));
        match self.transport.get_json(primary).await {
            Ok(payload) => Ok(ToolOutput::fresh(map_rates(&from, &to, amount, "/rates", &payload)?)),
            Err(err) if err.warrants_fallback() => {
                warn!(tool = NAME, error = %err, "primary rate endpoint unavailable, trying open.er-api.com");
                let secondary = HttpRequest::get(format!("{}/{}", SECONDARY_URL, from));
                let payload = self.transport.get_json(secondary).await?;
                Ok(ToolOutput::degraded(map_rates(&from, &to, amount, "/rates", &payload)?))
            }
            Err(err) => Err(err),
        }
    }
}

fn currency_code(raw: &str) -> Result<String, ToolError> {
    let code = raw.trim().to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(ToolError::Validation(format!(
            "'{}' is not a three-letter currency code",
            raw
        )))
    }
}

/// Builds the quote from a rate table found at `rates_pointer`.
pub fn map_rates(
    from: &str,
    to: &str,
    amount: f64,
    rates_pointer: &str,
    payload: &Value,
) -> Result<Value, ToolError> {
    let rates = field(payload, rates_pointer)?;
    let Some(rate) = rates.get(to) else {
        return Err(ToolError::Validation(format!("Currency code '{}' not found", to)));
    };
    let rate = rate
        .as_f64()
        .ok_or_else(|| ToolError::upstream(None, format!("rate for {} is not numeric", to)))?;
    let converted = (amount * rate * 100.0).round() / 100.0;
    let last_updated = payload
        .get("date")
        .or_else(|| payload.get("time_last_update_utc"))
        .cloned()
        .unwrap_or(Value::Null);

    Ok(json!({
        "from": from,
        "to": to,
        "rate": rate,
        "amount": amount,
        "converted_amount": converted,
        "conversion": format!("{} {} = {:.2} {}", amount, from, amount * rate, to),
        "last_updated": last_updated,
    }))
}
