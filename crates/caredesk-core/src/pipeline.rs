use crate::filter::{matches_category, matches_search, FilterState, SearchTerm};
use crate::schema::ListConfig;
use crate::sort::compare;
use crate::store::RecordStore;

/// Filtered and ordered positions into a `RecordStore`
///
/// Holding indices keeps the store untouched; rebuilding is the only way
/// to change it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedList {
    indices: Vec<usize>,
}

impl DerivedList {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn rows<'a, R>(&'a self, store: &'a RecordStore<R>) -> impl Iterator<Item = &'a R> + 'a {
        let records = store.records();
        self.indices.iter().filter_map(move |&i| records.get(i))
    }
}

/// `store.filter(matches).sort(compare)`, without touching the store
pub fn derive<R>(store: &RecordStore<R>, config: &ListConfig<R>, filter: &FilterState) -> DerivedList {
    if store.is_empty() {
        return DerivedList::default();
    }

    let records = store.records();
    let index = store.index();
    let term = SearchTerm::new(&filter.search_term);

    let mut indices: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            matches_category(*record, &filter.active_category, config, index)
                && matches_search(*record, &term, config)
        })
        .map(|(i, _)| i)
        .collect();

    if let Some(spec) = &filter.sort {
        if let Some(column) = config.resolve_column(&spec.key) {
            // sort_by is stable: equal keys keep their store order
            indices.sort_by(|&a, &b| compare(&records[a], &records[b], column, spec.direction));
        }
    }

    DerivedList { indices }
}

/// Convenience for callers that just want the rows
pub fn apply<'a, R>(
    store: &'a RecordStore<R>,
    config: &ListConfig<R>,
    filter: &FilterState,
) -> Vec<&'a R> {
    let records = store.records();
    derive(store, config, filter)
        .indices()
        .iter()
        .filter_map(|&i| records.get(i))
        .collect()
}
