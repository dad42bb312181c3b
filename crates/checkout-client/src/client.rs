//! # Payments Client
//!
//! Thin client for the subscription backend. The hosting page uses it to
//! create a payment (which yields the widget's confirmation token) and to
//! confirm the outcome after the widget reports success.

use crate::config::ClientConfig;
use crate::types::{
    CreatePaymentRequest, ErrorBody, PaymentIntent, PaymentResponse, PaymentStatus, Subscription,
};
use checkout_core::{CheckoutError, CheckoutResult, ConfirmationToken};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Header carrying the idempotence key for payment creation
pub const IDEMPOTENCE_HEADER: &str = "Idempotence-Key";

/// Backend client
#[derive(Debug, Clone)]
pub struct PaymentsClient {
    config: ClientConfig,
    client: Client,
}

impl PaymentsClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckoutError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a payment and return its confirmation token.
    ///
    /// Each call sends a fresh idempotence key; retrying a failed call is a
    /// new payment as far as the backend is concerned.
    #[instrument(skip(self, request), fields(plan_id = %request.plan_id))]
    pub async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> CheckoutResult<PaymentIntent> {
        let idempotence_key = Uuid::new_v4().to_string();
        debug!(key = %idempotence_key, "Creating payment");

        let builder = self
            .client
            .post(self.config.url("payments"))
            .header(IDEMPOTENCE_HEADER, &idempotence_key)
            .json(request);

        let response = self.send(builder).await?;
        let payment: PaymentResponse = parse_json(response).await?;

        let token = payment
            .confirmation
            .and_then(|c| c.confirmation_token)
            .and_then(|t| ConfirmationToken::parse(Some(t.as_str())))
            .ok_or_else(|| CheckoutError::Api {
                status: 200,
                message: format!("payment {} has no confirmation token", payment.id),
            })?;

        info!(payment_id = %payment.id, status = payment.status.as_str(), "Payment created");

        Ok(PaymentIntent {
            id: payment.id,
            status: payment.status,
            confirmation_token: token,
            created_at: payment.created_at,
        })
    }

    /// Current status of a payment
    #[instrument(skip(self))]
    pub async fn payment_status(&self, payment_id: &str) -> CheckoutResult<PaymentStatus> {
        let builder = self
            .client
            .get(self.config.url(&format!("payments/{}", payment_id)));

        let response = self.send(builder).await?;
        let payment: PaymentResponse = parse_json(response).await?;
        Ok(payment.status)
    }

    /// The signed-in customer's subscription, `None` if they have none
    #[instrument(skip(self))]
    pub async fn current_subscription(&self) -> CheckoutResult<Option<Subscription>> {
        let builder = self.client.get(self.config.url("subscriptions/current"));

        match self.send(builder).await {
            Ok(response) => parse_json(response).await.map(Some),
            Err(CheckoutError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send(&self, builder: RequestBuilder) -> CheckoutResult<Response> {
        let builder = match self.config.auth_header() {
            Some(auth) => builder.header("Authorization", auth),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        if status != StatusCode::NOT_FOUND {
            error!("Backend API error: status={}, body={}", status, body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| format!("HTTP {}", status));

        Err(CheckoutError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> CheckoutResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| CheckoutError::Network(e.to_string()))?;

    serde_json::from_str(&body).map_err(|e| {
        CheckoutError::Serialization(format!("Failed to parse backend response: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubscriptionStatus;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PaymentsClient {
        let config = ClientConfig::new(server.uri()).with_api_token("customer-session");
        PaymentsClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_create_payment_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments"))
            .and(header("Authorization", "Bearer customer-session"))
            .and(header_exists(IDEMPOTENCE_HEADER))
            .and(body_json(json!({"plan_id": "plan_monthly", "location_id": "loc_7"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "2d4f6e1c-000f-5000-9000-1b5e7a1f2c3d",
                "status": "pending",
                "confirmation": {
                    "type": "embedded",
                    "confirmation_token": "ct-2d4f6e1c-000f-5000-9000-1b5e7a1f2c3d"
                },
                "created_at": "2026-03-01T10:15:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = CreatePaymentRequest::new("plan_monthly").with_location("loc_7");
        let intent = client.create_payment(&request).await.unwrap();

        assert_eq!(intent.id, "2d4f6e1c-000f-5000-9000-1b5e7a1f2c3d");
        assert_eq!(intent.status, PaymentStatus::Pending);
        assert_eq!(
            intent.confirmation_token.as_str(),
            "ct-2d4f6e1c-000f-5000-9000-1b5e7a1f2c3d"
        );
        assert!(intent.created_at.is_some());
    }

    #[tokio::test]
    async fn test_create_payment_without_token_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "p_1",
                "status": "pending",
                "confirmation": {"type": "embedded", "confirmation_token": ""}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_payment(&CreatePaymentRequest::new("plan_monthly"))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Api { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_backend_error_message_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"error": "Unknown plan"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_payment(&CreatePaymentRequest::new("plan_missing"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CheckoutError::Api {
                status: 422,
                message: "Unknown plan".to_string()
            }
        );
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_payment_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payments/p_42"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "p_42", "status": "succeeded"})),
            )
            .mount(&server)
            .await;

        let status = client_for(&server).payment_status("p_42").await.unwrap();
        assert_eq!(status, PaymentStatus::Succeeded);
        assert!(status.is_final());
    }

    #[tokio::test]
    async fn test_current_subscription() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "sub_9",
                "plan_id": "plan_yearly",
                "status": "active",
                "expires_at": "2027-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let sub = client_for(&server)
            .current_subscription()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sub.plan_id, "plan_yearly");
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_no_subscription_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/current"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let sub = client_for(&server).current_subscription().await.unwrap();
        assert!(sub.is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payments/p_1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client_for(&server).payment_status("p_1").await.unwrap_err();
        assert_eq!(
            err,
            CheckoutError::Api {
                status: 503,
                message: "HTTP 503 Service Unavailable".to_string()
            }
        );
        assert!(err.is_retryable());
    }
}
