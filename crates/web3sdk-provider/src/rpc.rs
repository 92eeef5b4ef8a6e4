//! HTTP JSON-RPC transport.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use web3sdk_error::ConnectError;

/// Transport-level errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RPC error response
    #[error("RPC error: code={code}, message={message}")]
    RpcError {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },
}

impl From<ProviderError> for ConnectError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidConfig(msg) => ConnectError::Config(msg),
            ProviderError::RpcError { code, message } => ConnectError::Rpc {
                method: String::new(),
                code,
                message,
            },
            ProviderError::Json(e) => ConnectError::Format(e.to_string()),
            other => ConnectError::Transport(other.to_string()),
        }
    }
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, ProviderError>;

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client-side request budget, shared by every provider built on one
/// [`RpcClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    /// Sustained requests per second
    pub per_second: NonZeroU32,
    /// Requests allowed back to back before the sustained rate applies
    pub burst: NonZeroU32,
}

impl Throttle {
    /// A throttle whose burst equals its rate.
    pub fn per_second(per_second: u32) -> Result<Self> {
        Self::with_burst(per_second, per_second)
    }

    /// Rejects zero for either value.
    pub fn with_burst(per_second: u32, burst: u32) -> Result<Self> {
        let per_second = NonZeroU32::new(per_second)
            .ok_or_else(|| ProviderError::InvalidConfig("rate limit must be > 0".into()))?;
        let burst = NonZeroU32::new(burst)
            .ok_or_else(|| ProviderError::InvalidConfig("burst must be > 0".into()))?;
        Ok(Self { per_second, burst })
    }

    fn limiter(&self) -> Limiter {
        RateLimiter::direct(Quota::per_second(self.per_second).allow_burst(self.burst))
    }
}

impl std::str::FromStr for Throttle {
    type Err = ProviderError;

    /// `"10"` or `"10/20"` (rate/burst).
    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|e| ProviderError::InvalidConfig(format!("rate limit {s:?}: {e}")))
        };
        match s.split_once('/') {
            Some((rate, burst)) => Self::with_burst(parse(rate)?, parse(burst)?),
            None => Self::per_second(parse(s)?),
        }
    }
}

/// How an [`RpcClient`] talks to endpoints. The default has no request
/// timeout and no throttle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportConfig {
    /// Per-request timeout; `None` lets a hanging endpoint suspend the caller
    pub request_timeout: Option<Duration>,
    /// Optional client-side rate limit
    pub throttle: Option<Throttle>,
}

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// RPC request payload
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<T: Serialize> {
    /// JSON-RPC version
    pub jsonrpc: &'static str,
    /// Method name
    pub method: String,
    /// Parameters
    pub params: T,
    /// Request ID
    pub id: u64,
}

impl<T: Serialize> JsonRpcRequest<T> {
    /// Creates a new JSON-RPC request
    pub fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// RPC response payload
#[derive(Debug, Clone, serde::Deserialize)]
pub struct JsonRpcResponse<T> {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// Response ID
    pub id: serde_json::Value,
    /// Result (if successful)
    pub result: Option<T>,
    /// Error (if failed)
    pub error: Option<JsonRpcError>,
}

/// RPC error
#[derive(Debug, Clone, serde::Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
    /// Additional data
    pub data: Option<serde_json::Value>,
}

/// Pooled HTTP JSON-RPC client. Cloning the `Arc` around it shares the pool
/// and the throttle across providers.
pub struct RpcClient {
    client: Client,
    throttle: Option<Limiter>,
    request_id: AtomicU64,
}

impl RpcClient {
    /// Client with [`TransportConfig::default`]
    pub fn new() -> Result<Self> {
        Self::with_config(TransportConfig::default())
    }

    /// Client with an explicit timeout and throttle
    pub fn with_config(config: TransportConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("web3sdk/", env!("CARGO_PKG_VERSION")))
            .gzip(true);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            throttle: config.throttle.as_ref().map(Throttle::limiter),
            request_id: AtomicU64::new(1),
        })
    }

    /// Whether calls wait on a rate limit
    pub fn is_throttled(&self) -> bool {
        self.throttle.is_some()
    }

    /// Makes a JSON-RPC request
    pub async fn rpc_call<P, R>(&self, url: &str, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        if let Some(throttle) = &self.throttle {
            throttle.until_ready().await;
        }

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(method, params, id);
        tracing::trace!(url, method, id, "json-rpc request");

        let response = self.client.post(url).json(&request).send().await?;
        let rpc_response: JsonRpcResponse<R> = response.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(ProviderError::RpcError {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or_else(|| ProviderError::RpcError {
            code: -1,
            message: "No result in response".to_string(),
        })
    }

    /// Returns the number of requests made
    pub fn request_count(&self) -> u64 {
        self.request_id.load(Ordering::SeqCst) - 1
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("request_count", &self.request_count())
            .field("throttled", &self.is_throttled())
            .finish()
    }
}
