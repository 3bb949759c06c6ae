//! Minimal Ethereum JSON-RPC client for read-only contract calls.
//!
//! Only `eth_call` and `eth_chainId` are spoken; everything else (sending,
//! log indexing, nonces) belongs to the node's collaborators.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{CallMsg, ChainReader};

/// HTTP request timeout for RPC calls.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct JsonRpcRequest<T: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: T,
}

#[derive(Deserialize, Debug)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize, Debug)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Serialize)]
struct CallParams<'a> {
    to: Address,
    data: &'a Bytes,
}

/// Hex block tag for `eth_call`, `latest` when unset.
fn block_tag(block: Option<u64>) -> String {
    match block {
        Some(n) => format!("{n:#x}"),
        None => "latest".to_string(),
    }
}

#[derive(Clone)]
pub struct RpcClient {
    rpc_url: String,
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            rpc_url: rpc_url.to_string(),
            http,
        })
    }

    async fn request<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<T> {
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let resp: JsonRpcResponse<T> = self
            .http
            .post(&self.rpc_url)
            .json(&req)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?
            .json()
            .await
            .with_context(|| format!("failed to parse {method} response"))?;

        if let Some(err) = resp.error {
            anyhow::bail!("{method} RPC error {}: {}", err.code, err.message);
        }

        resp.result
            .with_context(|| format!("{method} returned null result without error"))
    }

    pub async fn chain_id(&self) -> Result<U256> {
        self.request("eth_chainId", Vec::<()>::new()).await
    }
}

#[async_trait]
impl ChainReader for RpcClient {
    async fn call_contract(&self, call: CallMsg, block: Option<u64>) -> Result<Bytes> {
        debug!(to = %call.to, block = ?block, "eth_call");
        let params = CallParams {
            to: call.to,
            data: &call.data,
        };
        self.request("eth_call", (params, block_tag(block))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_tags() {
        assert_eq!(block_tag(None), "latest");
        assert_eq!(block_tag(Some(255)), "0xff");
    }

    #[test]
    fn call_request_shape() {
        let data = Bytes::from_static(&[0xde, 0xad]);
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: (
                CallParams {
                    to: Address::repeat_byte(0x11),
                    data: &data,
                },
                block_tag(None),
            ),
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["method"], "eth_call");
        assert_eq!(json["params"][0]["data"], "0xdead");
        assert_eq!(json["params"][1], "latest");
    }

    #[test]
    fn parses_error_envelope() {
        let resp: JsonRpcResponse<Bytes> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":3,"message":"execution reverted"}}"#,
        )
        .unwrap();
        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().message, "execution reverted");

        let resp: JsonRpcResponse<Bytes> =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":"0x0102"}"#).unwrap();
        assert_eq!(resp.result.unwrap(), Bytes::from_static(&[1, 2]));
    }
}
