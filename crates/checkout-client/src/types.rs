//! # Backend Types
//!
//! Request and response bodies exchanged with the subscription backend.

use checkout_core::ConfirmationToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Create payment request
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentRequest {
    /// Plan the customer is subscribing to
    pub plan_id: String,

    /// Location (gym, studio) the subscription applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,

    /// Where the processor redirects after 3-D Secure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

impl CreatePaymentRequest {
    pub fn new(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            location_id: None,
            return_url: None,
        }
    }

    /// Builder: set location
    pub fn with_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    /// Builder: set return URL
    pub fn with_return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = Some(url.into());
        self
    }
}

/// Payment status as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
    /// Status string this client does not know
    Other(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::WaitingForCapture => "waiting_for_capture",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Other(s) => s,
        }
    }

    /// No further status changes expected
    pub fn is_final(&self) -> bool {
        matches!(self, PaymentStatus::Succeeded | PaymentStatus::Canceled)
    }
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => PaymentStatus::Pending,
            "waiting_for_capture" => PaymentStatus::WaitingForCapture,
            "succeeded" => PaymentStatus::Succeeded,
            "canceled" | "cancelled" => PaymentStatus::Canceled,
            _ => PaymentStatus::Other(s),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A payment created on the backend, ready for the checkout widget
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub status: PaymentStatus,
    pub confirmation_token: ConfirmationToken,
    pub created_at: Option<DateTime<Utc>>,
}

/// Raw payment body from the backend
#[derive(Debug, Deserialize)]
pub(crate) struct PaymentResponse {
    pub id: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub confirmation: Option<ConfirmationBody>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmationBody {
    #[serde(default)]
    pub confirmation_token: Option<String>,
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
    Expired,
}

/// The customer's current subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Active and not past its expiry
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// Error body returned by the backend
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}
