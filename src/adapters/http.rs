use crate::domain::model::{FetchOutcome, QueryWindow, RawItem};
use crate::domain::ports::BidSource;
use crate::utils::error::{DashboardError, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str =
    "https://apis.data.go.kr/1230000/ad/BidPublicInfoService/getBidPblancListInfoServc";

pub const SUCCESS_CODE: &str = "00";
pub const RESPONSE_TYPE: &str = "json";
pub const PAGE_SIZE: u32 = 50;
pub const PAGE_NO: u32 = 1;

pub const MISSING_CREDENTIAL_MESSAGE: &str = "API 키를 입력해주세요.";
pub const GENERIC_DOMAIN_ERROR_MESSAGE: &str = "API 오류가 발생했습니다.";

/// Client for the procurement bid-announcement endpoint.
///
/// Issues exactly one GET per `fetch`; no retries, no pagination, no timeout.
#[derive(Debug, Clone)]
pub struct BidApiClient {
    client: Client,
    endpoint: String,
}

impl BidApiClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, credential: &str, window: &QueryWindow) -> Result<(StatusCode, String)> {
        let page_size = PAGE_SIZE.to_string();
        let page_no = PAGE_NO.to_string();

        tracing::debug!(
            "Requesting bid announcements {} ~ {} from {}",
            window.begin_timestamp,
            window.end_timestamp,
            self.endpoint
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("ServiceKey", credential),
                ("type", RESPONSE_TYPE),
                ("bidNtceBgnDt", window.begin_timestamp.as_str()),
                ("bidNtceEndDt", window.end_timestamp.as_str()),
                ("numOfRows", page_size.as_str()),
                ("pageNo", page_no.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        let body = response.text().await?;
        Ok((status, body))
    }
}

impl Default for BidApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl BidSource for BidApiClient {
    async fn fetch(&self, credential: &str, window: &QueryWindow) -> FetchOutcome {
        if credential.is_empty() {
            tracing::warn!("{}; request not sent", DashboardError::MissingCredential);
            return FetchOutcome::DomainError(MISSING_CREDENTIAL_MESSAGE.to_string());
        }

        let outcome = match self.request(credential, window).await {
            Ok((status, body)) => classify_response(status, &body),
            Err(e) => {
                tracing::warn!("Bid API request failed: {}", e);
                FetchOutcome::TransportError
            }
        };

        if let FetchOutcome::DomainError(message) = &outcome {
            let err = DashboardError::DomainError {
                message: message.clone(),
            };
            tracing::warn!("{}", err);
        }
        outcome
    }
}

/// Classifies a raw HTTP response into a fetch outcome.
///
/// The JSON envelope wins over the HTTP status: a non-2xx response carrying a
/// readable envelope is classified by its result code.
pub fn classify_response(status: StatusCode, body: &str) -> FetchOutcome {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if json.get("response").is_some() {
            return classify_envelope(&json);
        }
    }

    if let Some(message) = gateway_fault_message(body) {
        return FetchOutcome::DomainError(message);
    }

    tracing::warn!(
        "Unrecognized bid API response (status {}, {} bytes)",
        status,
        body.len()
    );
    FetchOutcome::TransportError
}

fn classify_envelope(json: &Value) -> FetchOutcome {
    let header = &json["response"]["header"];
    let code = header.get("resultCode").and_then(code_text);

    if code.as_deref() != Some(SUCCESS_CODE) {
        let message = header
            .get("resultMsg")
            .and_then(Value::as_str)
            .filter(|msg| !msg.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| GENERIC_DOMAIN_ERROR_MESSAGE.to_string());
        return FetchOutcome::DomainError(message);
    }

    let items = extract_items(json["response"]["body"].get("items"));
    if items.is_empty() {
        FetchOutcome::EmptyResult
    } else {
        FetchOutcome::Success(items)
    }
}

fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts a list, an `{ "item": ... }` wrapper, or a single object.
fn extract_items(items: Option<&Value>) -> Vec<RawItem> {
    match items {
        None | Some(Value::Null) | Some(Value::String(_)) => Vec::new(),
        Some(Value::Array(list)) => collect_objects(list),
        Some(Value::Object(map)) => match map.get("item") {
            Some(Value::Array(list)) => collect_objects(list),
            Some(Value::Object(single)) => vec![single.clone()],
            Some(_) => Vec::new(),
            None if map.is_empty() => Vec::new(),
            None => vec![map.clone()],
        },
        Some(other) => {
            tracing::warn!("Ignoring unexpected items value: {}", other);
            Vec::new()
        }
    }
}

fn collect_objects(list: &[Value]) -> Vec<RawItem> {
    list.iter()
        .filter_map(|value| match value {
            Value::Object(map) => Some(map.clone()),
            other => {
                tracing::warn!("Dropping non-object bid item: {}", other);
                None
            }
        })
        .collect()
}

/// The gateway answers auth failures with an XML fault document even when
/// JSON was requested.
fn gateway_fault_message(body: &str) -> Option<String> {
    if !body.contains("OpenAPI_ServiceResponse") {
        return None;
    }

    for tag in ["returnAuthMsg", "errMsg"] {
        let re = Regex::new(&format!(r"<{tag}>\s*([^<]*?)\s*</{tag}>")).ok()?;
        if let Some(msg) = re.captures(body).and_then(|caps| caps.get(1)) {
            if !msg.as_str().is_empty() {
                return Some(msg.as_str().to_string());
            }
        }
    }
    Some(GENERIC_DOMAIN_ERROR_MESSAGE.to_string())
}

/// Applies a caller-chosen timeout around any bid source.
#[derive(Debug, Clone)]
pub struct WithTimeout<S> {
    inner: S,
    timeout: Duration,
}

impl<S: BidSource> WithTimeout<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<S: BidSource> BidSource for WithTimeout<S> {
    async fn fetch(&self, credential: &str, window: &QueryWindow) -> FetchOutcome {
        match tokio::time::timeout(self.timeout, self.inner.fetch(credential, window)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let err = DashboardError::TimeoutError {
                    timeout: self.timeout,
                };
                tracing::warn!("{}", err);
                FetchOutcome::TransportError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn window() -> QueryWindow {
        QueryWindow {
            begin_timestamp: "202405010000".to_string(),
            end_timestamp: "202405032359".to_string(),
        }
    }

    fn envelope(code: &str, msg: &str, items: Value) -> Value {
        json!({
            "response": {
                "header": {"resultCode": code, "resultMsg": msg},
                "body": {"items": items, "numOfRows": 50, "pageNo": 1, "totalCount": 0}
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_sends_expected_query() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/bids")
                .query_param("ServiceKey", "test-key")
                .query_param("type", "json")
                .query_param("bidNtceBgnDt", "202405010000")
                .query_param("bidNtceEndDt", "202405032359")
                .query_param("numOfRows", "50")
                .query_param("pageNo", "1");
            then.status(200).json_body(envelope(
                "00",
                "NORMAL SERVICE.",
                json!([{"bidNtceNo": "1", "bidNtceNm": "용역"}]),
            ));
        });

        let client = BidApiClient::new(server.url("/bids"));
        let outcome = client.fetch("test-key", &window()).await;

        api_mock.assert();
        match outcome {
            FetchOutcome::Success(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0]["bidNtceNm"], "용역");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_request() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/bids");
            then.status(200).json_body(envelope("00", "", json!([])));
        });

        let client = BidApiClient::new(server.url("/bids"));
        let outcome = client.fetch("", &window()).await;

        api_mock.assert_hits(0);
        assert_eq!(
            outcome,
            FetchOutcome::DomainError(MISSING_CREDENTIAL_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_domain_error_uses_result_message() {
        let body = envelope("99", "Invalid Key", json!([{"bidNtceNm": "ignored"}])).to_string();
        assert_eq!(
            classify_response(StatusCode::OK, &body),
            FetchOutcome::DomainError("Invalid Key".to_string())
        );
    }

    #[test]
    fn test_domain_error_falls_back_to_generic_message() {
        let body = json!({"response": {"header": {"resultCode": "03"}}}).to_string();
        assert_eq!(
            classify_response(StatusCode::OK, &body),
            FetchOutcome::DomainError(GENERIC_DOMAIN_ERROR_MESSAGE.to_string())
        );

        let blank = envelope("10", "  ", Value::Null).to_string();
        assert_eq!(
            classify_response(StatusCode::OK, &blank),
            FetchOutcome::DomainError(GENERIC_DOMAIN_ERROR_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_numeric_result_code_is_not_success() {
        let body = json!({"response": {"header": {"resultCode": 0, "resultMsg": "bad"}}}).to_string();
        assert_eq!(
            classify_response(StatusCode::OK, &body),
            FetchOutcome::DomainError("bad".to_string())
        );
    }

    #[test]
    fn test_empty_and_absent_items() {
        for items in [json!([]), Value::Null, json!(""), json!({"item": []}), json!({})] {
            let body = envelope("00", "NORMAL SERVICE.", items).to_string();
            assert_eq!(classify_response(StatusCode::OK, &body), FetchOutcome::EmptyResult);
        }

        let no_body = json!({"response": {"header": {"resultCode": "00"}}}).to_string();
        assert_eq!(classify_response(StatusCode::OK, &no_body), FetchOutcome::EmptyResult);
    }

    #[test]
    fn test_wrapped_and_single_item_shapes() {
        let wrapped = envelope("00", "", json!({"item": [{"bidNtceNm": "a"}, {"bidNtceNm": "b"}]}));
        match classify_response(StatusCode::OK, &wrapped.to_string()) {
            FetchOutcome::Success(items) => assert_eq!(items.len(), 2),
            other => panic!("expected success, got {:?}", other),
        }

        let single = envelope("00", "", json!({"item": {"bidNtceNm": "a"}}));
        match classify_response(StatusCode::OK, &single.to_string()) {
            FetchOutcome::Success(items) => assert_eq!(items[0]["bidNtceNm"], "a"),
            other => panic!("expected success, got {:?}", other),
        }

        let bare = envelope("00", "", json!({"bidNtceNm": "solo"}));
        match classify_response(StatusCode::OK, &bare.to_string()) {
            FetchOutcome::Success(items) => assert_eq!(items[0]["bidNtceNm"], "solo"),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_items_are_dropped() {
        let body = envelope("00", "", json!([1, "x", {"bidNtceNm": "ok"}])).to_string();
        match classify_response(StatusCode::OK, &body) {
            FetchOutcome::Success(items) => assert_eq!(items.len(), 1),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_classifies_non_2xx() {
        let body = envelope("30", "SERVICE KEY IS NOT REGISTERED ERROR.", Value::Null).to_string();
        assert_eq!(
            classify_response(StatusCode::INTERNAL_SERVER_ERROR, &body),
            FetchOutcome::DomainError("SERVICE KEY IS NOT REGISTERED ERROR.".to_string())
        );
    }

    #[test]
    fn test_unreadable_body_is_transport_error() {
        assert_eq!(
            classify_response(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>"),
            FetchOutcome::TransportError
        );
        assert_eq!(
            classify_response(StatusCode::OK, "{\"unexpected\": true}"),
            FetchOutcome::TransportError
        );
    }

    #[test]
    fn test_gateway_xml_fault() {
        let body = r#"<OpenAPI_ServiceResponse>
    <cmmMsgHeader>
        <errMsg>SERVICE ERROR</errMsg>
        <returnAuthMsg>SERVICE_KEY_IS_NOT_REGISTERED_ERROR</returnAuthMsg>
        <returnReasonCode>30</returnReasonCode>
    </cmmMsgHeader>
</OpenAPI_ServiceResponse>"#;

        assert_eq!(
            classify_response(StatusCode::OK, body),
            FetchOutcome::DomainError("SERVICE_KEY_IS_NOT_REGISTERED_ERROR".to_string())
        );
    }

    #[tokio::test]
    async fn test_server_error_without_envelope() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/bids");
            then.status(500).body("internal error");
        });

        let client = BidApiClient::new(server.url("/bids"));
        let outcome = client.fetch("test-key", &window()).await;

        api_mock.assert();
        assert_eq!(outcome, FetchOutcome::TransportError);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let client = BidApiClient::new("http://127.0.0.1:1/bids");
        assert_eq!(
            client.fetch("test-key", &window()).await,
            FetchOutcome::TransportError
        );
    }

    #[tokio::test]
    async fn test_timeout_wrapper() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(envelope("00", "", json!([{"bidNtceNm": "late"}])));
        });

        let client = WithTimeout::new(
            BidApiClient::new(server.url("/slow")),
            Duration::from_millis(50),
        );

        assert_eq!(
            client.fetch("test-key", &window()).await,
            FetchOutcome::TransportError
        );
    }
}
