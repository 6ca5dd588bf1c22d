//! Query facade.
//!
//! Composes parameter normalization, the transport and result conversion
//! into the two API operations plus a "last N minutes" shortcut.
//!
//! Required arguments take `impl Into<..>`; optional ones take the input
//! type itself wrapped in `Option`, so a bare `None` needs no annotation.
//!
//! ```rust,ignore
//! use promframe::PrometheusClient;
//!
//! let client = PrometheusClient::new("http://localhost:9090/")?;
//! let up = client.query("up", None, None)?;
//! let cpu = client.query_range_now("rate(node_cpu_seconds_total[5m])", "1h", "1m", None)?;
//! ```

use chrono::Utc;
use tracing::warn;

use crate::config::ClientConfig;
use crate::convert::convert;
use crate::error::{Error, Result};
use crate::model::{ApiResponse, ResultData};
use crate::params::{instant_params, range_params, DurationInput, RequestParams, TimestampInput};
use crate::result::QueryResult;
use crate::transport::{HttpTransport, Transport};

pub const QUERY_PATH: &str = "api/v1/query";
pub const QUERY_RANGE_PATH: &str = "api/v1/query_range";

/// Prometheus query client.
///
/// Holds one reusable connection for its whole life. Calls are blocking and
/// sequential; use separate clients for parallel queries.
pub struct PrometheusClient<T: Transport = HttpTransport> {
    transport: T,
}

impl PrometheusClient<HttpTransport> {
    /// Client for the server at `api_url` with default settings.
    pub fn new(api_url: &str) -> Result<Self> {
        Self::with_config(&ClientConfig::new(api_url))
    }

    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }

    /// Client configured from `PROMETHEUS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::with_config(&ClientConfig::from_env()?)
    }
}

impl<T: Transport> PrometheusClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Evaluate an instant query at `time` (server "now" when `None`).
    pub fn query(
        &self,
        expr: &str,
        time: Option<TimestampInput>,
        timeout: Option<DurationInput>,
    ) -> Result<QueryResult> {
        let params = instant_params(expr, time.as_ref(), timeout.as_ref());
        convert(self.do_query(QUERY_PATH, &params)?)
    }

    /// Evaluate `expr` over `[start, end]` at `step` resolution.
    pub fn query_range(
        &self,
        expr: &str,
        start: impl Into<TimestampInput>,
        end: impl Into<TimestampInput>,
        step: impl Into<DurationInput>,
        timeout: Option<DurationInput>,
    ) -> Result<QueryResult> {
        let params = range_params(
            expr,
            &start.into(),
            &end.into(),
            &step.into(),
            timeout.as_ref(),
        );
        convert(self.do_query(QUERY_RANGE_PATH, &params)?)
    }

    /// Range query over the `window` ending at the current UTC time.
    ///
    /// Literal windows such as `"1h"` are resolved locally with
    /// [`parse_duration`](crate::duration::parse_duration).
    pub fn query_range_now(
        &self,
        expr: &str,
        window: impl Into<DurationInput>,
        step: impl Into<DurationInput>,
        timeout: Option<DurationInput>,
    ) -> Result<QueryResult> {
        let window = window.into();
        let delta = window.to_time_delta()?;

        let end = Utc::now();
        let start = end
            .checked_sub_signed(delta)
            .ok_or_else(|| Error::InvalidDuration(format!("{window:?}")))?;

        self.query_range(expr, start, end, step, timeout)
    }

    /// Release the connection. Safe to call more than once; dropping the
    /// client has the same effect.
    pub fn close(&mut self) {
        self.transport.close();
    }

    fn do_query(&self, path: &str, params: &RequestParams) -> Result<ResultData> {
        let body = self.transport.get(path, params)?;
        let response: ApiResponse = serde_json::from_str(&body)?;

        if !response.is_success() {
            return Err(Error::Application {
                error_type: response.error_type.unwrap_or_default(),
                message: response.error.unwrap_or_default(),
            });
        }
        for warning in &response.warnings {
            warn!(path, warning = %warning, "query returned a warning");
        }

        response.data.ok_or(Error::MissingData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;
    use crate::transport::FakeTransport;
    use chrono::{TimeDelta, TimeZone};
    use serde_json::json;

    fn client_with(
        status: u16,
        body: serde_json::Value,
    ) -> (PrometheusClient<FakeTransport>, FakeTransport) {
        let fake = FakeTransport::new();
        fake.respond(status, body.to_string());
        (PrometheusClient::with_transport(fake.clone()), fake)
    }

    fn scalar_body() -> serde_json::Value {
        json!({"status": "success", "data": {"resultType": "scalar", "result": [1609459200, "42.5"]}})
    }

    fn number(params: &RequestParams, name: &str) -> f64 {
        match params.get(name) {
            Some(ParamValue::Number(n)) => *n,
            other => panic!("{name} should be numeric, got {other:?}"),
        }
    }

    #[test]
    fn query_builds_instant_request() {
        let (client, fake) = client_with(200, scalar_body());
        let result = client
            .query("1 + 1", Some("2021-01-01T00:00:00Z".into()), Some("30s".into()))
            .unwrap();
        assert_eq!(result, QueryResult::Scalar(42.5));

        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, QUERY_PATH);
        assert_eq!(
            requests[0].params.to_query(),
            vec![
                ("query".to_string(), "1 + 1".to_string()),
                ("time".to_string(), "2021-01-01T00:00:00Z".to_string()),
                ("timeout".to_string(), "30s".to_string()),
            ]
        );
    }

    #[test]
    fn query_without_optional_params() {
        let (client, fake) = client_with(200, scalar_body());
        client.query("up", None, None).unwrap();
        assert_eq!(fake.requests()[0].params.len(), 1);
    }

    #[test]
    fn query_range_normalizes_structured_inputs() {
        let (client, fake) = client_with(
            200,
            json!({"status": "success", "data": {"resultType": "matrix", "result": []}}),
        );
        let start = Utc.timestamp_opt(1_609_459_200, 0).unwrap();
        let result = client
            .query_range(
                "up",
                start,
                1_609_462_800.0,
                TimeDelta::seconds(15),
                Some(TimeDelta::seconds(10).into()),
            )
            .unwrap();
        assert!(result.as_matrix().unwrap().is_empty());

        let requests = fake.requests();
        let request = &requests[0];
        assert_eq!(request.path, QUERY_RANGE_PATH);
        assert_eq!(number(&request.params, "start"), 1_609_459_200.0);
        assert_eq!(number(&request.params, "end"), 1_609_462_800.0);
        assert_eq!(number(&request.params, "step"), 15.0);
        assert_eq!(number(&request.params, "timeout"), 10.0);
    }

    #[test]
    fn query_range_now_subtracts_window() {
        let (client, fake) = client_with(
            200,
            json!({"status": "success", "data": {"resultType": "matrix", "result": []}}),
        );

        let before = Utc::now().timestamp() as f64;
        client.query_range_now("up", "1h", "1m", None).unwrap();
        let after = Utc::now().timestamp() as f64 + 1.0;

        let requests = fake.requests();
        let params = &requests[0].params;
        let start = number(params, "start");
        let end = number(params, "end");
        assert!(end >= before && end <= after, "end {end} not in [{before}, {after}]");
        assert!((end - start - 3_600.0).abs() < 1e-3);
        assert_eq!(params.get("step"), Some(&ParamValue::Text("1m".into())));
    }

    #[test]
    fn query_range_now_rejects_bad_window() {
        let (client, fake) = client_with(200, scalar_body());
        let err = client.query_range_now("up", "an hour", "1m", None).unwrap_err();
        assert!(matches!(err, Error::InvalidDuration(_)));
        assert!(fake.requests().is_empty());
    }

    #[test]
    fn error_envelope_becomes_application_error() {
        let body = json!({"status": "error", "errorType": "bad_data", "error": "invalid query"});
        for status in [200, 400, 422, 503] {
            let (client, _) = client_with(status, body.clone());
            let err = client.query("up{", None, None).unwrap_err();
            let msg = err.to_string();
            assert!(matches!(err, Error::Application { .. }), "status {status}");
            assert!(msg.contains("bad_data") && msg.contains("invalid query"));
        }
    }

    #[test]
    fn server_error_is_transport_error() {
        let fake = FakeTransport::new();
        fake.respond(500, "not json at all");
        let client = PrometheusClient::with_transport(fake);
        assert!(matches!(
            client.query("up", None, None),
            Err(Error::Transport { status: 500, .. })
        ));
    }

    #[test]
    fn non_json_body_is_decode_error() {
        let fake = FakeTransport::new();
        fake.respond(200, "<html>");
        let client = PrometheusClient::with_transport(fake);
        assert!(matches!(client.query("up", None, None), Err(Error::Decode(_))));
    }

    #[test]
    fn success_without_data() {
        let (client, _) = client_with(200, json!({"status": "success"}));
        assert!(matches!(client.query("up", None, None), Err(Error::MissingData)));
    }

    #[test]
    fn series_ids_keep_label_order_of_the_body() {
        let fake = FakeTransport::new();
        fake.respond(
            200,
            r#"{"status": "success", "data": {"resultType": "vector", "result": [
                {"metric": {"zone": "b", "__name__": "up", "app": "a"}, "value": [1, "1"]}
            ]}}"#,
        );
        let client = PrometheusClient::with_transport(fake);

        let result = client.query("up", None, None).unwrap();
        assert_eq!(result.as_vector().unwrap().get(r#"up{zone="b",app="a"}"#), Some(1.0));
    }

    #[test]
    fn warnings_do_not_fail_the_query() {
        let mut body = scalar_body();
        body["warnings"] = json!(["partial response"]);
        let (client, _) = client_with(200, body);
        assert_eq!(client.query("up", None, None).unwrap(), QueryResult::Scalar(42.5));
    }

    #[test]
    fn closed_client_refuses_queries() {
        let (mut client, fake) = client_with(200, scalar_body());
        client.close();
        client.close();
        assert!(fake.is_closed());
        assert!(matches!(client.query("up", None, None), Err(Error::ClientClosed)));
    }
}
