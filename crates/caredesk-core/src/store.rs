use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::schema::{CategoryMatcher, ListConfig, Record};
use crate::stats::{self, StatsSnapshot};
use crate::{Error, Result};

/// Group sizes over the whole store, for threshold categories
///
/// Built once per store. Keyed by category key, then by the normalized
/// group value.
#[derive(Debug, Clone, Default)]
pub struct StoreIndex {
    group_sizes: HashMap<&'static str, HashMap<String, usize>>,
}

impl StoreIndex {
    pub fn build<R>(records: &[R], config: &ListConfig<R>) -> Self {
        let mut group_sizes = HashMap::new();

        for category in &config.categories {
            if let CategoryMatcher::GroupSizeAtLeast { group_by, .. } = &category.matcher {
                let mut sizes: HashMap<String, usize> = HashMap::new();
                for record in records {
                    let value = group_by(record);
                    if value.is_missing() {
                        continue;
                    }
                    *sizes.entry(value.as_text().into_owned()).or_insert(0) += 1;
                }
                group_sizes.insert(category.key, sizes);
            }
        }

        Self { group_sizes }
    }

    pub fn group_size(&self, category: &str, group: &str) -> usize {
        self.group_sizes
            .get(category)
            .and_then(|sizes| sizes.get(group))
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct groups with at least `min` members
    pub fn groups_at_least(&self, category: &str, min: usize) -> usize {
        self.group_sizes
            .get(category)
            .map(|sizes| sizes.values().filter(|&&n| n >= min).count())
            .unwrap_or(0)
    }
}

/// The full, unfiltered record set for one view
///
/// Replaced wholesale on every load; there is no way to patch it in place.
/// Statistics are computed here, once, so filter changes can never touch them.
#[derive(Debug, Clone)]
pub struct RecordStore<R> {
    records: Vec<R>,
    index: StoreIndex,
    stats: StatsSnapshot,
    reported_total: Option<u64>,
    loaded_at: DateTime<Utc>,
}

impl<R: Record> RecordStore<R> {
    /// Build a store, rejecting snapshots that repeat an id
    pub fn new(records: Vec<R>, config: &ListConfig<R>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id()) {
                return Err(Error::DuplicateRecord(record.id()));
            }
        }

        let index = StoreIndex::build(&records, config);
        let stats = stats::aggregate(&records, config, &index);
        debug!("Built {} store with {} records", R::COLLECTION, records.len());

        Ok(Self {
            records,
            index,
            stats,
            reported_total: None,
            loaded_at: Utc::now(),
        })
    }

    /// Keep the server's `total` for display; counts always use `len()`
    pub fn with_reported_total(mut self, total: Option<u64>) -> Self {
        if let Some(reported) = total.filter(|t| *t != self.records.len() as u64) {
            debug!(
                "{} reports total {} but sent {} records",
                R::COLLECTION,
                reported,
                self.records.len()
            );
        }
        self.reported_total = total;
        self
    }

    pub fn get(&self, id: u64) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }
}

impl<R> RecordStore<R> {
    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn index(&self) -> &StoreIndex {
        &self.index
    }

    pub fn stats(&self) -> &StatsSnapshot {
        &self.stats
    }

    /// Total as the server reported it, if it did
    pub fn reported_total(&self) -> Option<u64> {
        self.reported_total
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Beneficiary, BeneficiaryStatus};

    fn child(id: u64, guardian: Option<u64>) -> Beneficiary {
        Beneficiary {
            id,
            guardian_id: guardian,
            status: Some(BeneficiaryStatus::Active),
            ..Beneficiary::default()
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let config = Beneficiary::list_config();
        let result = RecordStore::new(vec![child(1, None), child(1, None)], &config);
        assert!(matches!(result, Err(Error::DuplicateRecord(1))));
    }

    #[test]
    fn test_group_sizes_skip_missing_keys() {
        let config = Beneficiary::list_config();
        let records = vec![child(1, Some(9)), child(2, Some(9)), child(3, None), child(4, Some(5))];
        let store = RecordStore::new(records, &config).unwrap();

        assert_eq!(store.index().group_size("large_family", "9"), 2);
        assert_eq!(store.index().group_size("large_family", "5"), 1);
        assert_eq!(store.index().group_size("large_family", ""), 0);
        assert_eq!(store.index().groups_at_least("large_family", 2), 1);
    }

    #[test]
    fn test_lookup_and_totals() {
        let config = Beneficiary::list_config();
        let store = RecordStore::new(vec![child(3, None), child(8, None)], &config)
            .unwrap()
            .with_reported_total(Some(40));

        assert_eq!(store.get(8).map(|b| b.id), Some(8));
        assert!(store.get(99).is_none());
        assert_eq!(store.len(), 2);
        assert_eq!(store.reported_total(), Some(40));
    }
}
