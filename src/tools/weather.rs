use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::{
    error::tool_error::ToolError,
    tools::{
        ToolOutput,
        model::{ParamSpec, ToolSpec, field, number_field, required_str, str_param},
        transport::{HttpRequest, HttpTransport},
    },
};

pub const NAME: &str = "weather";
const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const WTTR_URL: &str = "https://wttr.in";

static SPEC: Lazy<ToolSpec> = Lazy::new(|| {
    ToolSpec::new(
        NAME,
        "Get current weather information for any city including temperature, conditions, humidity, and wind speed",
    )
    .param(
        "city",
        ParamSpec::string("City name (e.g., 'London', 'New York', 'Tokyo')").required(),
    )
    .param(
        "units",
        ParamSpec::string("Temperature units: 'metric' (Celsius) or 'imperial' (Fahrenheit)")
            .one_of(&["metric", "imperial"])
            .with_default(json!("metric")),
    )
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("imperial") => Units::Imperial,
            _ => Units::Metric,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    fn temperature_label(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }
}

pub struct WeatherTool {
    transport: Arc<dyn HttpTransport>,
    api_key: Option<String>,
}

impl WeatherTool {
    pub fn new(transport: Arc<dyn HttpTransport>, api_key: Option<String>) -> Self {
        Self { transport, api_key }
    }

    pub fn spec(&self) -> &ToolSpec {
        &SPEC
    }

    /// OpenWeatherMap needs a key; without one the public wttr.in endpoint is
    /// used and the result is marked degraded.
    pub async fn execute(&self, params: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let params = SPEC.validate(params)?;
        let city = required_str(&params, "city", "weather")?;
        let units = Units::parse(str_param(&params, "units"));

        match &self.api_key {
            Some(key) => {
                let request = HttpRequest::get(OPENWEATHER_URL)
                    .query("q", city)
                    .query("appid", key)
                    .query("units", units.as_str());
                let payload = self.transport.get_json(request).await?;
                Ok(ToolOutput::fresh(map_openweather(units, &payload)?))
            }
            None => {
                info!(tool = NAME, city, "no OPENWEATHER_API_KEY configured, using wttr.in");
                let url = format!("{}/{}", WTTR_URL, urlencoding::encode(city));
                let request = HttpRequest::get(url).query("format", "j1");
                let payload = self.transport.get_json(request).await?;
                Ok(ToolOutput::degraded(map_wttr(city, units, &payload)?))
            }
        }
    }
}

pub fn map_openweather(units: Units, payload: &Value) -> Result<Value, ToolError> {
    let speed_unit = match units {
        Units::Metric => "m/s",
        Units::Imperial => "mph",
    };
    Ok(json!({
        "city": field(payload, "/name")?,
        "country": payload.pointer("/sys/country").cloned().unwrap_or(Value::Null),
        "source": "openweathermap",
        "weather": {
            "condition": field(payload, "/weather/0/main")?,
            "description": field(payload, "/weather/0/description")?,
            "temperature": number_field(payload, "/main/temp")?,
            "feels_like": number_field(payload, "/main/feels_like")?,
            "temp_min": payload.pointer("/main/temp_min").cloned().unwrap_or(Value::Null),
            "temp_max": payload.pointer("/main/temp_max").cloned().unwrap_or(Value::Null),
            "humidity_percent": number_field(payload, "/main/humidity")?,
            "pressure_hpa": payload.pointer("/main/pressure").cloned().unwrap_or(Value::Null),
            "wind_speed": payload.pointer("/wind/speed").cloned().unwrap_or(Value::Null),
            "clouds_percent": payload.pointer("/clouds/all").cloned().unwrap_or(Value::Null),
        },
        "units": {
            "temperature": units.temperature_label(),
            "wind_speed": speed_unit,
        },
    }))
}

/// wttr.in reports Celsius and both wind units as strings.
pub fn map_wttr(city: &str, units: Units, payload: &Value) -> Result<Value, ToolError> {
    let current = field(payload, "/current_condition/0")?;
    let temp_c = number_field(current, "/temp_C")?;
    let feels_c = number_field(current, "/FeelsLikeC").unwrap_or(temp_c);
    let (temperature, feels_like, wind_speed, speed_unit) = match units {
        Units::Metric => (temp_c, feels_c, number_field(current, "/windspeedKmph")?, "km/h"),
        Units::Imperial => (
            celsius_to_fahrenheit(temp_c),
            celsius_to_fahrenheit(feels_c),
            number_field(current, "/windspeedMiles")?,
            "mph",
        ),
    };
    let description = current
        .pointer("/weatherDesc/0/value")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .trim();

    Ok(json!({
        "city": city,
        "country": payload
            .pointer("/nearest_area/0/country/0/value")
            .cloned()
            .unwrap_or(Value::Null),
        "source": "wttr.in (fallback)",
        "weather": {
            "condition": description,
            "description": description,
            "temperature": round1(temperature),
            "feels_like": round1(feels_like),
            "humidity_percent": number_field(current, "/humidity").ok(),
            "pressure_hpa": number_field(current, "/pressure").ok(),
            "wind_speed": wind_speed,
            "clouds_percent": number_field(current, "/cloudcover").ok(),
            "visibility_km": number_field(current, "/visibility").ok(),
        },
        "units": {
            "temperature": units.temperature_label(),
            "wind_speed": speed_unit,
        },
    }))
}

fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wttr_payload() -> Value {
        json!({
            "current_condition": [{
                "temp_C": "20",
                "FeelsLikeC": "19",
                "humidity": "60",
                "pressure": "1012",
                "windspeedKmph": "11",
                "windspeedMiles": "7",
                "cloudcover": "25",
                "visibility": "10",
                "weatherDesc": [{"value": "Partly cloudy "}]
            }],
            "nearest_area": [{"country": [{"value": "Japan"}]}]
        })
    }

    #[test]
    fn wttr_metric_mapping() {
        let mapped = map_wttr("Tokyo", Units::Metric, &wttr_payload()).unwrap();
        assert_eq!(mapped["country"], json!("Japan"));
        assert_eq!(mapped["weather"]["temperature"], json!(20.0));
        assert_eq!(mapped["weather"]["condition"], json!("Partly cloudy"));
        assert_eq!(mapped["units"]["wind_speed"], json!("km/h"));
    }

    #[test]
    fn wttr_imperial_converts_temperature() {
        let mapped = map_wttr("Tokyo", Units::Imperial, &wttr_payload()).unwrap();
        assert_eq!(mapped["weather"]["temperature"], json!(68.0));
        assert_eq!(mapped["weather"]["wind_speed"], json!(7.0));
        assert_eq!(mapped["units"]["temperature"], json!("°F"));
    }

    #[test]
    fn openweather_mapping() {
        let payload = json!({
            "name": "London",
            "sys": {"country": "GB"},
            "weather": [{"main": "Rain", "description": "light rain"}],
            "main": {"temp": 11.5, "feels_like": 10.2, "temp_min": 10.0, "temp_max": 13.0, "humidity": 81, "pressure": 1008},
            "wind": {"speed": 4.1},
            "clouds": {"all": 90}
        });
        let mapped = map_openweather(Units::Metric, &payload).unwrap();
        assert_eq!(mapped["city"], json!("London"));
        assert_eq!(mapped["weather"]["condition"], json!("Rain"));
        assert_eq!(mapped["weather"]["temperature"], json!(11.5));
        assert_eq!(mapped["source"], json!("openweathermap"));
    }

    #[test]
    fn wttr_without_current_condition_is_upstream_error() {
        let err = map_wttr("Nowhere", Units::Metric, &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::Upstream { .. }));
    }
}
