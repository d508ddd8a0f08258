//! HTTP transport for the organizer payments service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use shared::{
    domain::PaymentId,
    protocol::{decode_payments_envelope, DecodedPayments, RequestPaymentBody, PAYMENTS_ENDPOINT},
};
use tracing::debug;
use url::Url;

use crate::error::PaymentsApiError;

#[async_trait]
pub trait PaymentsApi: Send + Sync {
    /// Full collection for the current organizer.
    async fn fetch_payments(&self) -> Result<DecodedPayments, PaymentsApiError>;
    /// Asks the service to move an ongoing payment toward a requested state.
    async fn request_payment(&self, event_id: &PaymentId) -> Result<(), PaymentsApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpPaymentsApi {
    http: Client,
    endpoint: Url,
}

impl HttpPaymentsApi {
    pub fn new(server_url: &str) -> Result<Self, PaymentsApiError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self, PaymentsApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PaymentsApiError::Transport)?;
        Self::with_client(http, server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, PaymentsApiError> {
        let endpoint = Url::parse(server_url)?.join(PAYMENTS_ENDPOINT)?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn ensure_success(
    response: Response,
    operation: &'static str,
) -> Result<Response, PaymentsApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(PaymentsApiError::Status { operation, status })
    }
}

#[async_trait]
impl PaymentsApi for HttpPaymentsApi {
    async fn fetch_payments(&self) -> Result<DecodedPayments, PaymentsApiError> {
        let response = self.http.get(self.endpoint.clone()).send().await?;
        let body: Value = ensure_success(response, "list payments")?.json().await?;
        let decoded = decode_payments_envelope(body);
        debug!(
            records = decoded.records.len(),
            skipped = decoded.skipped,
            "decoded payments envelope"
        );
        Ok(decoded)
    }

    async fn request_payment(&self, event_id: &PaymentId) -> Result<(), PaymentsApiError> {
        let response = self
            .http
            .patch(self.endpoint.clone())
            .json(&RequestPaymentBody {
                event_id: event_id.clone(),
            })
            .send()
            .await?;
        ensure_success(response, "request payment")?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
