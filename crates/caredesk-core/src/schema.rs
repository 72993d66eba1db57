use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::filter::{CategoryFilter, SortKey};
use crate::session::ViewKind;

/// A field read off a record, before normalization
///
/// Missing values stay `None` here; the engines decide how to treat them
/// (`""` for text, `0` for numbers).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Number(Option<f64>),
}

impl<'a> FieldValue<'a> {
    pub fn text(value: Option<&'a str>) -> Self {
        FieldValue::Text(value)
    }

    pub fn number<N: Into<f64>>(value: Option<N>) -> Self {
        FieldValue::Number(value.map(Into::into))
    }

    /// Missing, or text that is blank
    pub fn is_missing(&self) -> bool {
        match self {
            FieldValue::Text(value) => value.map_or(true, |s| s.trim().is_empty()),
            FieldValue::Number(value) => value.is_none(),
        }
    }

    /// Text form; missing becomes `""`
    pub fn as_text(&self) -> Cow<'a, str> {
        match *self {
            FieldValue::Text(value) => Cow::Borrowed(value.unwrap_or("")),
            FieldValue::Number(None) => Cow::Borrowed(""),
            FieldValue::Number(Some(n)) => Cow::Owned(format_number(n)),
        }
    }

    /// Numeric form; missing or non-numeric text becomes `0`
    pub fn as_number(&self) -> f64 {
        match *self {
            FieldValue::Number(value) => value.unwrap_or(0.0),
            FieldValue::Text(value) => value
                .and_then(|s| s.trim().parse::<f64>().ok())
                .unwrap_or(0.0),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Reads one field off a record
pub type Accessor<R> = for<'a> fn(&'a R) -> FieldValue<'a>;

/// A sortable, displayable column
pub struct Column<R> {
    pub key: &'static str,
    pub title: &'static str,
    pub accessor: Accessor<R>,
}

impl<R> Column<R> {
    pub fn new(key: &'static str, title: &'static str, accessor: Accessor<R>) -> Self {
        Self { key, title, accessor }
    }

    pub fn value<'a>(&self, record: &'a R) -> FieldValue<'a> {
        (self.accessor)(record)
    }
}

/// How a category bucket decides membership
pub enum CategoryMatcher<R> {
    /// Field text equals the value exactly
    Equals { field: Accessor<R>, value: &'static str },
    /// Field number is at least `min` (missing counts as 0)
    AtLeast { field: Accessor<R>, min: f64 },
    /// The record's group, across the whole store, has at least `min` members.
    /// Records without a group key never match.
    GroupSizeAtLeast { group_by: Accessor<R>, min: usize },
}

/// A named bucket used for both filtering and summary cards
pub struct Category<R> {
    pub key: &'static str,
    pub label: &'static str,
    pub matcher: CategoryMatcher<R>,
}

impl<R> Category<R> {
    pub fn equals(key: &'static str, label: &'static str, field: Accessor<R>) -> Self {
        Self {
            key,
            label,
            matcher: CategoryMatcher::Equals { field, value: key },
        }
    }

    pub fn at_least(key: &'static str, label: &'static str, field: Accessor<R>, min: f64) -> Self {
        Self {
            key,
            label,
            matcher: CategoryMatcher::AtLeast { field, min },
        }
    }

    pub fn group_size_at_least(
        key: &'static str,
        label: &'static str,
        group_by: Accessor<R>,
        min: usize,
    ) -> Self {
        Self {
            key,
            label,
            matcher: CategoryMatcher::GroupSizeAtLeast { group_by, min },
        }
    }
}

/// Everything the list engine needs to know about one record type
pub struct ListConfig<R> {
    pub columns: Vec<Column<R>>,
    /// Searched in order; the first field containing the term wins
    pub search_fields: Vec<Accessor<R>>,
    pub categories: Vec<Category<R>>,
    /// Mutually exclusive field whose counts must add up to the store size
    pub partition: Option<Accessor<R>>,
    /// `view` query value -> category key
    pub view_aliases: &'static [(&'static str, &'static str)],
}

impl<R> ListConfig<R> {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            search_fields: Vec::new(),
            categories: Vec::new(),
            partition: None,
            view_aliases: &[],
        }
    }

    pub fn column(mut self, key: &'static str, title: &'static str, accessor: Accessor<R>) -> Self {
        self.columns.push(Column::new(key, title, accessor));
        self
    }

    pub fn search(mut self, accessor: Accessor<R>) -> Self {
        self.search_fields.push(accessor);
        self
    }

    pub fn category(mut self, category: Category<R>) -> Self {
        self.categories.push(category);
        self
    }

    pub fn partition(mut self, accessor: Accessor<R>) -> Self {
        self.partition = Some(accessor);
        self
    }

    pub fn aliases(mut self, aliases: &'static [(&'static str, &'static str)]) -> Self {
        self.view_aliases = aliases;
        self
    }

    /// Resolve a sort key by position or by column key
    pub fn resolve_column(&self, key: &SortKey) -> Option<&Column<R>> {
        match key {
            SortKey::Index(i) => self.columns.get(*i),
            SortKey::Named(name) => self.columns.iter().find(|c| c.key == name.as_str()),
        }
    }

    pub fn column_index(&self, key: &SortKey) -> Option<usize> {
        match key {
            SortKey::Index(i) if *i < self.columns.len() => Some(*i),
            SortKey::Index(_) => None,
            SortKey::Named(name) => self.columns.iter().position(|c| c.key == name.as_str()),
        }
    }

    pub fn find_category(&self, key: &str) -> Option<&Category<R>> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Map a `view` query parameter to the initial category
    ///
    /// Aliases are checked first, then category keys; anything else means all.
    pub fn resolve_view(&self, view: Option<&str>) -> CategoryFilter {
        let Some(view) = view.map(str::trim).filter(|v| !v.is_empty()) else {
            return CategoryFilter::All;
        };
        if view.eq_ignore_ascii_case("all") {
            return CategoryFilter::All;
        }

        if let Some((_, key)) = self.view_aliases.iter().find(|(alias, _)| *alias == view) {
            return CategoryFilter::Only((*key).to_string());
        }
        if self.find_category(view).is_some() {
            return CategoryFilter::Only(view.to_string());
        }

        debug!("Unknown view parameter {:?}, showing all records", view);
        CategoryFilter::All
    }
}

impl<R> Default for ListConfig<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// An entity the backend serves as a collection
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Route segment and envelope key, e.g. `beneficiaries`
    const COLLECTION: &'static str;
    const KIND: ViewKind;

    fn id(&self) -> u64;

    /// Human-readable name for headers and confirmations
    fn display_name(&self) -> Cow<'_, str>;

    /// Phone number used when composing SMS from a list
    fn contact_phone(&self) -> Option<&str> {
        None
    }

    fn list_config() -> ListConfig<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        name: Option<String>,
    }

    fn name(r: &Row) -> FieldValue<'_> {
        FieldValue::text(r.name.as_deref())
    }

    #[test]
    fn test_field_value_normalization() {
        assert_eq!(FieldValue::text(None).as_text(), "");
        assert_eq!(FieldValue::Number(None).as_number(), 0.0);
        assert_eq!(FieldValue::number(Some(12u32)).as_text(), "12");
        assert_eq!(FieldValue::Number(Some(2.5)).as_text(), "2.5");
        assert_eq!(FieldValue::text(Some(" 7 ")).as_number(), 7.0);
        assert_eq!(FieldValue::text(Some("n/a")).as_number(), 0.0);
        assert!(FieldValue::text(Some("   ")).is_missing());
        assert!(!FieldValue::number(Some(0u32)).is_missing());
    }

    #[test]
    fn test_resolve_view_aliases() {
        let config: ListConfig<Row> = ListConfig::new()
            .category(Category::equals("waiting_list", "Waiting", name))
            .aliases(&[("waiting", "waiting_list")]);

        assert_eq!(
            config.resolve_view(Some("waiting")),
            CategoryFilter::Only("waiting_list".into())
        );
        assert_eq!(
            config.resolve_view(Some("waiting_list")),
            CategoryFilter::Only("waiting_list".into())
        );
        assert_eq!(config.resolve_view(Some("bogus")), CategoryFilter::All);
        assert_eq!(config.resolve_view(Some("all")), CategoryFilter::All);
        assert_eq!(config.resolve_view(None), CategoryFilter::All);
    }

    #[test]
    fn test_resolve_column_by_index_and_name() {
        let config: ListConfig<Row> = ListConfig::new()
            .column("name", "Name", name)
            .column("other", "Other", name);

        assert_eq!(config.resolve_column(&SortKey::Index(1)).map(|c| c.key), Some("other"));
        assert_eq!(
            config.resolve_column(&SortKey::Named("name".into())).map(|c| c.key),
            Some("name")
        );
        assert!(config.resolve_column(&SortKey::Index(5)).is_none());
        assert_eq!(config.column_index(&SortKey::Named("other".into())), Some(1));
    }
}
