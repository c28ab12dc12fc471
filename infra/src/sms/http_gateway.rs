//! HTTP SMS gateway
//!
//! Posts `To`, `From` and `Body` as a form to the configured endpoint with
//! basic auth, the way Twilio's Messages API expects. The provider's
//! message id is read from the `sid` field of the JSON reply.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use pv_core::errors::DomainResult;
use pv_core::SmsGateway;
use pv_shared::config::SmsConfig;
use pv_shared::utils::mask_phone_number;

use crate::InfrastructureError;

/// Provider reply; only the message id is used
#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

/// Provider error body, when it sends one
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// REST SMS gateway
pub struct HttpSmsGateway {
    client: reqwest::Client,
    endpoint: String,
    account_id: String,
    auth_token: String,
    from_number: String,
}

impl HttpSmsGateway {
    /// Build the gateway; the timeout applies to each request as a whole
    pub fn new(config: &SmsConfig, timeout: Duration) -> Result<Self, InfrastructureError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.resolved_endpoint(),
            account_id: config.account_id.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Single delivery attempt, returning the provider message id
    pub async fn deliver(
        &self,
        phone_digits: &str,
        message: &str,
    ) -> Result<String, InfrastructureError> {
        let to = format!("+{}", phone_digits);
        let masked_phone = mask_phone_number(&to);
        debug!(provider = "http", phone = %masked_phone, "Sending SMS");

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.account_id, Some(&self.auth_token))
            .form(&[
                ("To", to.as_str()),
                ("From", self.from_number.as_str()),
                ("Body", message),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(provider = "http", phone = %masked_phone, error = %e, "SMS request failed");
                InfrastructureError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(ErrorResponse {
                    code: Some(code),
                    message: Some(message),
                }) => format!("{} (code {})", message, code),
                Ok(ErrorResponse {
                    message: Some(message),
                    ..
                }) => message,
                _ => format!("HTTP {}", status.as_u16()),
            };
            error!(
                provider = "http",
                phone = %masked_phone,
                status = status.as_u16(),
                detail = %detail,
                "SMS provider rejected message"
            );
            return Err(InfrastructureError::Sms(format!(
                "provider rejected message: {}",
                detail
            )));
        }

        let reply: MessageResponse = response.json().await?;
        info!(
            provider = "http",
            phone = %masked_phone,
            message_id = %reply.sid,
            "SMS sent successfully"
        );
        Ok(reply.sid)
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send_sms(&self, phone_digits: &str, message: &str) -> DomainResult<String> {
        Ok(self.deliver(phone_digits, message).await?)
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}
