use std::cmp::Ordering;
use std::str::FromStr;

use crate::schema::{CategoryMatcher, FieldValue, ListConfig};
use crate::store::StoreIndex;

/// Which category bucket is selected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn key(&self) -> Option<&str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(key) => Some(key),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction: {}", other)),
        }
    }
}

/// A column reference, by position or by column key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Index(usize),
    Named(String),
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<usize>() {
            Ok(i) => SortKey::Index(i),
            Err(_) => SortKey::Named(s.trim().to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// User-controlled search, category and sort selection for one view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_term: String,
    pub active_category: CategoryFilter,
    pub sort: Option<SortSpec>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.active_category = category;
        self
    }

    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec { key, direction });
        self
    }

    /// Column-header click: same key flips direction, a new key starts ascending
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort = match self.sort.take() {
            Some(spec) if spec.key == key => Some(SortSpec {
                key,
                direction: spec.direction.toggled(),
            }),
            _ => Some(SortSpec {
                key,
                direction: SortDirection::Ascending,
            }),
        };
    }
}

/// A search term lowercased once per pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm(Option<String>);

impl SearchTerm {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            SearchTerm(None)
        } else {
            SearchTerm(Some(trimmed.to_lowercase()))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    fn hits(&self, value: FieldValue<'_>) -> bool {
        match &self.0 {
            None => true,
            Some(_) if value.is_missing() => false,
            Some(term) => value.as_text().to_lowercase().contains(term.as_str()),
        }
    }
}

/// Category half of the predicate
pub fn matches_category<R>(
    record: &R,
    category: &CategoryFilter,
    config: &ListConfig<R>,
    index: &StoreIndex,
) -> bool {
    let key = match category {
        CategoryFilter::All => return true,
        CategoryFilter::Only(key) => key,
    };
    let Some(category) = config.find_category(key) else {
        return false;
    };

    match &category.matcher {
        CategoryMatcher::Equals { field, value } => field(record).as_text() == *value,
        CategoryMatcher::AtLeast { field, min } => field(record).as_number() >= *min,
        CategoryMatcher::GroupSizeAtLeast { group_by, min } => {
            let group = group_by(record);
            if group.is_missing() {
                return false;
            }
            index.group_size(category.key, &group.as_text()) >= *min
        }
    }
}

/// Text half of the predicate: any searchable field containing the term
pub fn matches_search<R>(record: &R, term: &SearchTerm, config: &ListConfig<R>) -> bool {
    if term.is_empty() {
        return true;
    }
    config
        .search_fields
        .iter()
        .any(|field| term.hits(field(record)))
}

/// Category AND text
pub fn matches<R>(
    record: &R,
    filter: &FilterState,
    config: &ListConfig<R>,
    index: &StoreIndex,
) -> bool {
    let term = SearchTerm::new(&filter.search_term);
    matches_category(record, &filter.active_category, config, index)
        && matches_search(record, &term, config)
}
