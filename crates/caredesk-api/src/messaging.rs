use serde::{Deserialize, Serialize};

/// Body of `POST /api/sms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsRequest {
    pub recipients: Vec<String>,
    pub message: String,
}

/// What the SMS gateway reports back
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmsReceipt {
    #[serde(default)]
    pub sent: u32,
    #[serde(default)]
    pub failed: Vec<String>,
}
