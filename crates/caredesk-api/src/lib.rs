// REST client for the CareDesk backend
pub mod auth;
pub mod client;
pub mod error;
pub mod listing;
pub mod messaging;
pub mod notifications;

// Re-export common types
pub use auth::{Credentials, LoginResponse, SessionUser};
pub use client::{ApiClient, Upload};
pub use error::{ApiError, Result};
pub use listing::Listing;
pub use messaging::{SmsReceipt, SmsRequest};
pub use notifications::{Notification, NotificationFilters, NotificationKind};
