//! Signed REST client for the exchange.

use crate::config::ExchangeConfig;
use crate::error::{RebalanceError, Result};
use crate::exchange::traits::{ExchangeGateway, GatewayCall};
use crate::exchange::types::*;
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, instrument};

/// Exchange REST client authenticating every request with an HMAC signature.
pub struct FtxClient {
    http: Client,
    base_url: String,
    subaccount: String,
    api_key: String,
    api_secret: String,
    user_agent: String,
}

impl FtxClient {
    /// Create a new client from configuration.
    pub fn new(config: &ExchangeConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            subaccount: config.subaccount.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Generate the hex HMAC-SHA256 signature of a request payload.
    fn sign(&self, payload: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Send a signed request and unwrap the response envelope.
    ///
    /// The signed payload is `timestamp + METHOD + path + body`, where `path`
    /// includes the query string exactly as sent.
    async fn send<T: DeserializeOwned>(
        &self,
        call: GatewayCall,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<T> {
        let timestamp = Utc::now().timestamp_millis().to_string();
        let mut payload = format!("{}{}{}", timestamp, method.as_str(), path);
        if let Some(body) = &body {
            payload.push_str(body);
        }
        let signature = self.sign(&payload);
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .http
            .request(method, &url)
            .header(USER_AGENT, &self.user_agent)
            .header("FTX-KEY", &self.api_key)
            .header("FTX-TS", &timestamp)
            .header("FTX-SIGN", signature)
            .header("FTX-SUBACCOUNT", urlencoding::encode(&self.subaccount).into_owned());

        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RebalanceError::gateway(call.name(), format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RebalanceError::gateway(
                call.name(),
                format!("HTTP {status}: {body}"),
            ));
        }

        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            RebalanceError::gateway(call.name(), format!("Failed to parse response: {e}"))
        })?;

        unwrap_envelope(call, envelope)
    }

    fn encode_body<B: serde::Serialize>(call: GatewayCall, body: &B) -> Result<String> {
        serde_json::to_string(body).map_err(|e| {
            RebalanceError::gateway(call.name(), format!("Failed to encode request: {e}"))
        })
    }
}

/// Turn a response envelope into its result, treating `success: false` as a failure.
fn unwrap_envelope<T>(call: GatewayCall, envelope: ApiResponse<T>) -> Result<T> {
    if !envelope.success {
        let reason = envelope
            .error
            .unwrap_or_else(|| "success flag was false".to_string());
        return Err(RebalanceError::gateway(call.name(), reason));
    }
    envelope
        .result
        .ok_or_else(|| RebalanceError::gateway(call.name(), "Response carried no result"))
}

#[async_trait]
impl ExchangeGateway for FtxClient {
    #[instrument(skip(self))]
    async fn cancel_all_orders(&self, market: &str) -> Result<String> {
        let call = GatewayCall::CancelAllOrders;
        let body = Self::encode_body(call, &CancelAllRequest { market })?;
        self.send(call, Method::DELETE, "/api/orders", Some(body))
            .await
    }

    #[instrument(skip(self))]
    async fn wallet_balances(&self) -> Result<Vec<BalanceEntry>> {
        let balances: Vec<BalanceEntry> = self
            .send(GatewayCall::WalletBalances, Method::GET, "/api/wallet/balances", None)
            .await?;
        debug!("Fetched {} wallet balances", balances.len());
        Ok(balances)
    }

    #[instrument(skip(self))]
    async fn order_history(&self, market: &str) -> Result<Vec<HistoryEntry>> {
        let path = format!("/api/orders/history?market={}", urlencoding::encode(market));
        let history: Vec<HistoryEntry> = self
            .send(GatewayCall::OrderHistory, Method::GET, &path, None)
            .await?;
        debug!("Fetched {} historical orders", history.len());
        Ok(history)
    }

    #[instrument(skip(self))]
    async fn market(&self, market: &str) -> Result<MarketInfo> {
        let path = format!("/api/markets/{}", market);
        self.send(GatewayCall::Market, Method::GET, &path, None)
            .await
    }

    #[instrument(skip(self))]
    async fn place_order(&self, intent: &OrderIntent) -> Result<PlacedOrder> {
        let call = GatewayCall::PlaceOrder;
        let body = Self::encode_body(call, intent)?;
        debug!("Placing order: {:?}", intent);
        self.send(call, Method::POST, "/api/orders", Some(body))
            .await
    }
}
