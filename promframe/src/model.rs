//! Wire types for the Prometheus HTTP API response envelope.
//!
//! ```json
//! {
//!   "status": "success",
//!   "data": {
//!     "resultType": "vector",
//!     "result": [
//!       { "metric": { "__name__": "up", "job": "node" }, "value": [1609459200, "1"] }
//!     ]
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

/// Label name carrying the metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Label set in server order.
pub type Labels = IndexMap<String, String>;

/// Top-level response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    /// `"success"` or `"error"`.
    pub status: String,
    #[serde(default)]
    pub data: Option<ResultData>,
    #[serde(rename = "errorType", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// `data` object. `result` is kept raw until `result_type` is known.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultData {
    #[serde(rename = "resultType")]
    pub result_type: String,
    pub result: serde_json::Value,
}

/// `[timestamp, "value"]` pair.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SamplePair(pub f64, pub String);

/// One element of a `vector` result.
#[derive(Debug, Clone, Deserialize)]
pub struct InstantSeries {
    #[serde(default)]
    pub metric: Labels,
    pub value: SamplePair,
}

/// One element of a `matrix` result.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeSeries {
    #[serde(default)]
    pub metric: Labels,
    #[serde(default)]
    pub values: Vec<SamplePair>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_envelope() {
        let resp: ApiResponse = serde_json::from_value(serde_json::json!({
            "status": "error",
            "errorType": "bad_data",
            "error": "invalid query"
        }))
        .unwrap();
        assert!(!resp.is_success());
        assert!(resp.data.is_none());
        assert_eq!(resp.error_type.as_deref(), Some("bad_data"));
        assert_eq!(resp.error.as_deref(), Some("invalid query"));
    }

    #[test]
    fn labels_keep_server_order() {
        let series: InstantSeries = serde_json::from_str(
            r#"{"metric": {"zone": "b", "__name__": "up", "app": "a"}, "value": [1, "2"]}"#,
        )
        .unwrap();
        let keys: Vec<&str> = series.metric.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zone", "__name__", "app"]);
        assert_eq!(series.value, SamplePair(1.0, "2".into()));
    }

    #[test]
    fn warnings_are_optional() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{"status": "success", "data": {"resultType": "scalar", "result": [1, "1"]}, "warnings": ["partial"]}"#,
        )
        .unwrap();
        assert_eq!(resp.warnings, ["partial"]);
        assert_eq!(resp.data.unwrap().result_type, "scalar");
    }
}
