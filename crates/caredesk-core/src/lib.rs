// Core logic for CareDesk: records, the list engine, views and sessions
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod filter;
pub mod forms;
pub mod generation;
pub mod ledger;
pub mod models;
pub mod pipeline;
pub mod reports;
pub mod schema;
pub mod session;
pub mod sms;
pub mod sort;
pub mod source;
pub mod stats;
pub mod store;
pub mod view;

pub use config::Config;
pub use error::{Error, ValidationErrors};
pub use export::{ExportFormat, Exporter};
pub use filter::{CategoryFilter, FilterState, SortDirection, SortKey, SortSpec};
pub use pipeline::DerivedList;
pub use schema::{FieldValue, ListConfig, Record};
pub use session::{Role, Session, SessionContext, ViewKind};
pub use source::{CollectionSource, Fetched, RecordSource};
pub use stats::{ChartPoint, StatsSnapshot};
pub use store::RecordStore;
pub use view::{ListView, LoadOutcome, ViewError, ViewStatus};

/// Result type alias for the core crate
pub type Result<T> = std::result::Result<T, Error>;
