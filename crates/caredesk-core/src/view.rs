use std::fmt;

use caredesk_api::ApiError;
use tracing::{debug, info, warn};

use crate::filter::{CategoryFilter, FilterState, SortDirection, SortKey, SortSpec};
use crate::generation::{Generation, Ticket};
use crate::pipeline::{self, DerivedList};
use crate::schema::{ListConfig, Record};
use crate::source::{Fetched, RecordSource};
use crate::stats::StatsSnapshot;
use crate::store::RecordStore;
use crate::{Error, Result};

/// What a failed load shows instead of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    Network(String),
    Http { status: u16, message: String },
    Parse(String),
    Other(String),
}

impl ViewError {
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Api(ApiError::Network(e)) => ViewError::Network(e.to_string()),
            Error::Api(ApiError::Http { status, message }) => ViewError::Http {
                status: *status,
                message: message.clone(),
            },
            Error::Api(ApiError::Parse(e)) => ViewError::Parse(e.to_string()),
            Error::Api(ApiError::Shape(msg)) => ViewError::Parse(msg.clone()),
            Error::DuplicateRecord(_) | Error::Serialization(_) => ViewError::Parse(error.to_string()),
            other => ViewError::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::Network(msg) => write!(f, "Could not reach the server: {}", msg),
            ViewError::Http { status, message } => write!(f, "{} (HTTP {})", message, status),
            ViewError::Parse(msg) => write!(f, "The server sent data we could not read: {}", msg),
            ViewError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// Coarse state for renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Loading,
    Ready,
    Error,
}

/// What happened to a completed load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready,
    Failed,
    /// A newer load was dispatched; this result was dropped
    Stale,
}

enum Phase<R> {
    Loading,
    Ready {
        store: RecordStore<R>,
        derived: DerivedList,
    },
    Failed(ViewError),
}

/// One mounted list screen: its records, its filter and its load state
///
/// `Loading -> Ready` or `Loading -> Error`; retry and refresh re-enter
/// `Loading`. No partially loaded store is ever visible.
pub struct ListView<R> {
    config: ListConfig<R>,
    filter: FilterState,
    phase: Phase<R>,
    generation: Generation,
}

impl<R: Record> ListView<R> {
    pub fn new() -> Self {
        Self::with_config(R::list_config())
    }

    pub fn with_config(config: ListConfig<R>) -> Self {
        Self {
            config,
            filter: FilterState::default(),
            phase: Phase::Loading,
            generation: Generation::new(),
        }
    }

    /// Seed the category from the `view` query parameter
    pub fn from_query(view: Option<&str>) -> Self {
        let mut list = Self::new();
        list.filter.active_category = list.config.resolve_view(view);
        list
    }

    pub fn config(&self) -> &ListConfig<R> {
        &self.config
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn status(&self) -> ViewStatus {
        match self.phase {
            Phase::Loading => ViewStatus::Loading,
            Phase::Ready { .. } => ViewStatus::Ready,
            Phase::Failed(_) => ViewStatus::Error,
        }
    }

    pub fn store(&self) -> Option<&RecordStore<R>> {
        match &self.phase {
            Phase::Ready { store, .. } => Some(store),
            _ => None,
        }
    }

    pub fn stats(&self) -> Option<&StatsSnapshot> {
        self.store().map(RecordStore::stats)
    }

    pub fn derived(&self) -> Option<&DerivedList> {
        match &self.phase {
            Phase::Ready { derived, .. } => Some(derived),
            _ => None,
        }
    }

    /// Rows currently on screen; empty unless `Ready`
    pub fn rows(&self) -> Vec<&R> {
        match &self.phase {
            Phase::Ready { store, derived } => derived.rows(store).collect(),
            _ => Vec::new(),
        }
    }

    pub fn error(&self) -> Option<&ViewError> {
        match &self.phase {
            Phase::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Enter `Loading` and hand out the ticket the completion must present
    pub fn begin_load(&mut self) -> Ticket {
        let ticket = self.generation.issue();
        self.phase = Phase::Loading;
        debug!("Loading {} (ticket {})", R::COLLECTION, ticket.value());
        ticket
    }

    /// Apply a finished fetch unless a newer one has been dispatched since
    pub fn complete_load(&mut self, ticket: Ticket, result: Result<Fetched<R>>) -> LoadOutcome {
        if !self.generation.is_current(ticket) {
            warn!(
                "Dropping stale {} response (ticket {}, latest {:?})",
                R::COLLECTION,
                ticket.value(),
                self.generation.latest().map(Ticket::value)
            );
            return LoadOutcome::Stale;
        }

        let built = result.and_then(|fetched| {
            RecordStore::new(fetched.records, &self.config)
                .map(|store| store.with_reported_total(fetched.reported_total))
        });

        match built {
            Ok(store) => {
                let derived = pipeline::derive(&store, &self.config, &self.filter);
                info!(
                    "{} ready: {} records, {} shown",
                    R::COLLECTION,
                    store.len(),
                    derived.len()
                );
                self.phase = Phase::Ready { store, derived };
                LoadOutcome::Ready
            }
            Err(e) => {
                warn!("Loading {} failed: {}", R::COLLECTION, e);
                self.phase = Phase::Failed(ViewError::from_error(&e));
                LoadOutcome::Failed
            }
        }
    }

    /// Initial load, retry and refresh are all the same full fetch
    pub async fn load<S>(&mut self, source: &S) -> LoadOutcome
    where
        S: RecordSource<R> + ?Sized,
    {
        let ticket = self.begin_load();
        let result = source.fetch_all().await;
        self.complete_load(ticket, result)
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filter.search_term = term.into();
        self.rederive();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.filter.search_term.push(c);
        self.rederive();
    }

    pub fn pop_search_char(&mut self) {
        if self.filter.search_term.pop().is_some() {
            self.rederive();
        }
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.filter.active_category = category;
        self.rederive();
    }

    /// Step through `All` and each configured category, wrapping around
    pub fn cycle_category(&mut self, forward: bool) {
        let keys: Vec<&'static str> = self.config.categories.iter().map(|c| c.key).collect();
        if keys.is_empty() {
            return;
        }

        // Position 0 is All, position i + 1 is keys[i]
        let current = match &self.filter.active_category {
            CategoryFilter::All => 0,
            CategoryFilter::Only(key) => keys
                .iter()
                .position(|k| k == key)
                .map(|i| i + 1)
                .unwrap_or(0),
        };
        let slots = keys.len() + 1;
        let next = if forward {
            (current + 1) % slots
        } else {
            (current + slots - 1) % slots
        };

        let category = match next {
            0 => CategoryFilter::All,
            i => CategoryFilter::Only(keys[i - 1].to_string()),
        };
        self.set_category(category);
    }

    pub fn sort_by(&mut self, key: SortKey, direction: SortDirection) {
        self.filter.sort = Some(SortSpec { key, direction });
        self.rederive();
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.filter.toggle_sort(key);
        self.rederive();
    }

    pub fn clear_sort(&mut self) {
        self.filter.sort = None;
        self.rederive();
    }

    fn rederive(&mut self) {
        if let Phase::Ready { store, derived } = &mut self.phase {
            *derived = pipeline::derive(store, &self.config, &self.filter);
        }
    }
}

impl<R: Record> Default for ListView<R> {
    fn default() -> Self {
        Self::new()
    }
}
