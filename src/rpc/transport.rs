//! The wire underneath [`Client`](super::Client).
use crate::endpoints::{RPCError, RPCResult};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Something that can carry JSON-RPC calls to a Soroban RPC server.
///
/// [`HttpTransport`] is the implementation that talks to a real server. Other
/// implementations can be supplied to [`Client::from_transport`](super::Client::from_transport),
/// e.g., to run against an in-memory node in tests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Invoke `method` with the given parameters and return the `result`
    /// member of the response. `Value::Null` parameters are omitted from the
    /// request.
    async fn call(&self, method: &str, params: Value) -> RPCResult<Value>;

    /// Make a plain HTTP GET request, as needed for the friendbot faucet.
    async fn http_get(&self, url: &str) -> RPCResult<Value>;
}

#[derive(Debug)]
/// JSON-RPC 2.0 over HTTP POST.
pub struct HttpTransport {
    endpoint: reqwest::Url,
    http:     reqwest::Client,
    next_id:  AtomicU64,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code:    i64,
    message: String,
    #[serde(default)]
    data:    Option<Value>,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error:  Option<JsonRpcError>,
}

impl HttpTransport {
    /// Construct a transport for the given endpoint, e.g.,
    /// `https://soroban-testnet.stellar.org`.
    pub fn new(endpoint: &str) -> RPCResult<Self> {
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| RPCError::ParseError(e.into()))?;
        let http = reqwest::Client::builder()
            .timeout(crate::constants::DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url { &self.endpoint }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> RPCResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
        });
        if !params.is_null() {
            request["params"] = params;
        }
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body: JsonRpcResponse = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(RPCError::Rpc {
                    code:    status.as_u16().into(),
                    message: status.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(error) = body.error {
            let message = match error.data {
                Some(data) => format!("{} ({data})", error.message),
                None => error.message,
            };
            return Err(RPCError::Rpc {
                code: error.code,
                message,
            });
        }
        body.result
            .ok_or_else(|| RPCError::ParseError(anyhow::anyhow!("Response has no result.")))
    }

    async fn http_get(&self, url: &str) -> RPCResult<Value> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(RPCError::Rpc {
                code:    status.as_u16().into(),
                message: text,
            });
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
