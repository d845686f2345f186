//! Client for the 0x swap API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use super::{Quote, QuoteError, QuoteParams, QuoteProvider, api_types::ZeroExQuote};

/// The 0x api key header
const API_KEY_HEADER: &str = "0x-api-key";
/// The 0x api version header
const API_VERSION_HEADER: &str = "0x-version";
/// The permit2 quote endpoint
const PERMIT2_QUOTE_ENDPOINT: &str = "swap/permit2/quote";

/// A client for the 0x permit2 swap API
#[derive(Clone)]
pub struct ZeroExClient {
    /// The API base URL, without a trailing slash
    base_url: String,
    /// The API key, if configured
    api_key: Option<String>,
    /// The API version sent alongside the key
    api_version: String,
    /// The chain quotes are requested for
    chain_id: u64,
    /// The underlying HTTP client
    http_client: Client,
}

impl ZeroExClient {
    /// Create a new client
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        api_version: String,
        chain_id: u64,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_version,
            chain_id,
            http_client: Client::new(),
        }
    }

    /// Build the full quote URL for the given parameters
    pub fn quote_url(&self, params: &QuoteParams) -> Result<Url, QuoteError> {
        let chain_id = self.chain_id.to_string();
        let buy_token = params.buy_token.to_string();
        let sell_token = params.sell_token.to_string();
        let sell_amount = params.sell_amount.to_string();
        let taker = params.taker.to_string();

        let query = [
            ("chainId", chain_id.as_str()),
            ("buyToken", buy_token.as_str()),
            ("sellToken", sell_token.as_str()),
            ("sellAmount", sell_amount.as_str()),
            ("taker", taker.as_str()),
        ];

        let url = format!("{}/{PERMIT2_QUOTE_ENDPOINT}", self.base_url);
        Url::parse_with_params(&url, query).map_err(QuoteError::parse)
    }

    /// Build a get request, attaching the API headers when a key is configured
    fn build_request(&self, url: Url) -> RequestBuilder {
        let request = self.http_client.get(url);
        match &self.api_key {
            Some(api_key) => request
                .header(API_KEY_HEADER, api_key.as_str())
                .header(API_VERSION_HEADER, self.api_version.as_str()),
            None => request,
        }
    }

    /// Send a get request and deserialize the response
    async fn send_get_request<T: DeserializeOwned>(&self, url: Url) -> Result<T, QuoteError> {
        let response = self.build_request(url).send().await?;
        handle_http_response(response).await
    }
}

/// Check the status of a response and deserialize its body
async fn handle_http_response<T: DeserializeOwned>(response: Response) -> Result<T, QuoteError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(QuoteError::http(format!("status {status}: {body}")));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(QuoteError::parse)
}

#[async_trait]
impl QuoteProvider for ZeroExClient {
    #[instrument(skip_all, fields(sell_amount = %params.sell_amount))]
    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, QuoteError> {
        let url = self.quote_url(params)?;
        debug!("requesting quote from {url}");

        let raw: ZeroExQuote = match self.send_get_request(url).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("0x quote request failed: {e}");
                return Err(e);
            },
        };

        Quote::try_from(raw)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{U256, address};

    use super::*;

    fn params() -> QuoteParams {
        QuoteParams {
            sell_token: address!("0xe6a537a407488807f0bbeb0038b79004f19dddfb"),
            buy_token: address!("0x3c499c542cef5e3811e1192ce70d8cc03d5c3359"),
            sell_amount: U256::from(1_500_000_000_000_000_000u128),
            taker: address!("0x70997970c51812dc3a010c7d01b50e0d17dc79c8"),
        }
    }

    fn client(api_key: Option<&str>) -> ZeroExClient {
        ZeroExClient::new("https://api.0x.org", api_key.map(String::from), "v2".to_string(), 137)
    }

    fn response(status: u16, body: &'static str) -> Response {
        http::Response::builder().status(status).body(body).unwrap().into()
    }

    #[test]
    fn attaches_api_headers_with_a_key() {
        let client = client(Some("secret"));
        let url = client.quote_url(&params()).unwrap();
        let request = client.build_request(url).build().unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.headers()[API_KEY_HEADER], "secret");
        assert_eq!(request.headers()[API_VERSION_HEADER], "v2");
    }

    #[test]
    fn omits_api_headers_without_a_key() {
        let client = client(None);
        let url = client.quote_url(&params()).unwrap();
        let request = client.build_request(url).build().unwrap();

        assert!(request.headers().get(API_KEY_HEADER).is_none());
        assert!(request.headers().get(API_VERSION_HEADER).is_none());
    }

    #[tokio::test]
    async fn error_status_is_an_http_error() {
        let body = r#"{"name":"INPUT_INVALID","message":"Validation Failed"}"#;
        let result: Result<ZeroExQuote, _> = handle_http_response(response(400, body)).await;

        match result {
            Err(QuoteError::Http(msg)) => {
                assert!(msg.contains("400"), "{msg}");
                assert!(msg.contains("Validation Failed"), "{msg}");
            },
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_body_is_a_parse_error() {
        let result: Result<ZeroExQuote, _> = handle_http_response(response(200, "not json")).await;
        assert!(matches!(result, Err(QuoteError::Parse(_))));
    }

    #[tokio::test]
    async fn success_body_is_deserialized() {
        let body = r#"{
            "buyAmount": "10",
            "sellAmount": "20",
            "transaction": {
                "to": "0x0d0e364aa7852291883c162b22d6d81f6355428f",
                "data": "0x",
                "gas": "1",
                "gasPrice": "2"
            }
        }"#;
        let raw: ZeroExQuote = handle_http_response(response(200, body)).await.unwrap();
        let quote = Quote::try_from(raw).unwrap();
        assert_eq!(quote.buy_amount, U256::from(10u64));
    }

    #[test]
    fn builds_quote_url() {
        let client = ZeroExClient::new("https://api.0x.org/", None, "v2".to_string(), 137);
        let url = client.quote_url(&params()).unwrap();

        assert_eq!(url.path(), "/swap/permit2/quote");

        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| query.iter().find(|(key, _)| key == k).map(|(_, v)| v.clone());
        assert_eq!(get("chainId").as_deref(), Some("137"));
        assert_eq!(get("sellAmount").as_deref(), Some("1500000000000000000"));
        assert_eq!(
            get("sellToken").map(|s| s.to_lowercase()).as_deref(),
            Some("0xe6a537a407488807f0bbeb0038b79004f19dddfb")
        );
        assert_eq!(
            get("taker").map(|s| s.to_lowercase()).as_deref(),
            Some("0x70997970c51812dc3a010c7d01b50e0d17dc79c8")
        );
        assert!(get("buyToken").is_some());
    }
}
