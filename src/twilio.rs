//! Twilio telephony collaborator: places outbound interview calls with a
//! recording directive pointing back at the inbound callback route.

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde_json::Value;

use crate::config::TwilioConfig;
use crate::coordinator::TelephonyApi;
use crate::error::AppError;

const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// Voice script played to the callee: a spoken prompt in the requested
/// language followed by a 60-second recording that posts back to
/// /twilio/recording.
pub fn call_twiml(language: &str) -> String {
    format!(
        "<Response>\
         <Say language=\"{}\">Hello, this is your interview call. Please answer the questions after the beep.</Say>\
         <Record maxLength=\"60\" action=\"/twilio/recording\" />\
         </Response>",
        language
    )
}

pub struct TwilioClient {
    account_sid: Option<String>,
    auth_token: Option<String>,
    phone_number: Option<String>,
    api_base: String,
    client: Client,
}

impl TwilioClient {
    /// Build a client from config, with TWILIO_* environment variables as
    /// fallback for each missing credential.
    pub fn new(config: &TwilioConfig) -> Self {
        Self {
            account_sid: config
                .account_sid
                .clone()
                .or_else(|| std::env::var("TWILIO_ACCOUNT_SID").ok()),
            auth_token: config
                .auth_token
                .clone()
                .or_else(|| std::env::var("TWILIO_AUTH_TOKEN").ok()),
            phone_number: config
                .phone_number
                .clone()
                .or_else(|| std::env::var("TWILIO_PHONE_NUMBER").ok()),
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client: Client::new(),
        }
    }

    fn credentials(&self) -> Result<(&str, &str, &str), AppError> {
        match (&self.account_sid, &self.auth_token, &self.phone_number) {
            (Some(sid), Some(token), Some(from)) => Ok((sid, token, from)),
            _ => Err(AppError::Upstream(
                "Twilio credentials not configured".to_string(),
            )),
        }
    }
}

#[async_trait]
impl TelephonyApi for TwilioClient {
    async fn start_recorded_call(&self, to: &str, language: &str) -> Result<String, AppError> {
        let (sid, token, from) = self.credentials()?;
        let url = format!("{}/2010-04-01/Accounts/{}/Calls.json", self.api_base, sid);

        let params = [
            ("Twiml", call_twiml(language)),
            ("To", to.to_string()),
            ("From", from.to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(sid, Some(token))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Outbound call failed (HTTP {}): {}", status, body);
            return Err(AppError::Upstream(format!(
                "outbound call failed (HTTP {})",
                status
            )));
        }

        let data = response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        data.get("sid")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Upstream("call response missing sid".to_string()))
    }
}
