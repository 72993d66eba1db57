//! Bulk SMS composition for beneficiaries, guardians and sponsors

use caredesk_api::{ApiClient, SmsReceipt, SmsRequest};
use tracing::{info, warn};

use crate::forms::{is_valid_phone, normalize_phone};
use crate::schema::Record;
use crate::{Result, ValidationErrors};

/// Longest message the gateway will split and send
pub const MAX_SEGMENTS: usize = 10;

const GSM_BASIC: &str = "@£$¥èéùìòÇ\nØø\rÅåΔ_ΦΓΛΩΠΨΣΘΞ\u{1b}ÆæßÉ !\"#¤%&'()*+,-./0123456789:;<=>?\
¡ABCDEFGHIJKLMNOPQRSTUVWXYZÄÖÑÜ§¿abcdefghijklmnopqrstuvwxyzäöñüà";

/// Characters that need the escape prefix and so cost two septets
const GSM_EXTENSION: &str = "\u{0c}^{}\\[~]|€";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gsm7,
    Ucs2,
}

impl Encoding {
    pub fn detect(message: &str) -> Self {
        if message
            .chars()
            .all(|c| GSM_BASIC.contains(c) || GSM_EXTENSION.contains(c))
        {
            Encoding::Gsm7
        } else {
            Encoding::Ucs2
        }
    }

    /// (single message, per part of a concatenated message)
    fn limits(self) -> (usize, usize) {
        match self {
            Encoding::Gsm7 => (160, 153),
            Encoding::Ucs2 => (70, 67),
        }
    }
}

/// Units the message occupies in its encoding
pub fn message_units(message: &str) -> usize {
    match Encoding::detect(message) {
        Encoding::Gsm7 => message
            .chars()
            .map(|c| if GSM_EXTENSION.contains(c) { 2 } else { 1 })
            .sum(),
        Encoding::Ucs2 => message.encode_utf16().count(),
    }
}

/// How many SMS parts the message is billed as
pub fn segment_count(message: &str) -> usize {
    let units = message_units(message);
    if units == 0 {
        return 0;
    }
    let (single, part) = Encoding::detect(message).limits();
    if units <= single {
        1
    } else {
        (units + part - 1) / part
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmsDraft {
    recipients: Vec<String>,
    message: String,
}

impl SmsDraft {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            recipients: Vec::new(),
            message: message.into(),
        }
    }

    /// Everyone in `records` with a phone number
    pub fn from_records<'a, R, I>(records: I, message: impl Into<String>) -> Self
    where
        R: Record,
        I: IntoIterator<Item = &'a R>,
    {
        let mut draft = Self::new(message);
        for record in records {
            match record.contact_phone() {
                Some(phone) => {
                    draft.add_recipient(phone);
                }
                None => warn!("{} has no phone number, skipping", record.display_name()),
            }
        }
        draft
    }

    /// Adds a normalized number; returns false for blanks and duplicates
    pub fn add_recipient(&mut self, raw: &str) -> bool {
        let phone = normalize_phone(raw.trim());
        if phone.is_empty() || self.recipients.contains(&phone) {
            return false;
        }
        self.recipients.push(phone);
        true
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn encoding(&self) -> Encoding {
        Encoding::detect(&self.message)
    }

    pub fn segments(&self) -> usize {
        segment_count(&self.message)
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.recipients.is_empty() {
            errors.add("recipients", "Add at least one recipient");
        }
        if let Some(bad) = self.recipients.iter().find(|r| !is_valid_phone(r)) {
            errors.add("recipients", format!("{} is not a valid phone number", bad));
        }
        if self.message.trim().is_empty() {
            errors.add("message", "Message is required");
        } else if self.segments() > MAX_SEGMENTS {
            errors.add(
                "message",
                format!(
                    "Message is {} parts long; the limit is {}",
                    self.segments(),
                    MAX_SEGMENTS
                ),
            );
        }
        errors
    }

    pub fn to_request(&self) -> Result<SmsRequest> {
        self.validate().into_result()?;
        Ok(SmsRequest {
            recipients: self.recipients.clone(),
            message: self.message.trim().to_string(),
        })
    }

    pub async fn send(&self, client: &ApiClient) -> Result<SmsReceipt> {
        let request = self.to_request()?;
        let receipt = client.send_sms(&request).await?;
        info!(
            "SMS sent to {} of {} recipients ({} parts each)",
            receipt.sent,
            request.recipients.len(),
            self.segments()
        );
        if !receipt.failed.is_empty() {
            warn!("SMS delivery failed for: {}", receipt.failed.join(", "));
        }
        Ok(receipt)
    }
}
