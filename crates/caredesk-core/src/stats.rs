use std::collections::BTreeMap;

use serde::Serialize;

use crate::filter::{matches_category, CategoryFilter};
use crate::schema::{Accessor, CategoryMatcher, ListConfig};
use crate::store::StoreIndex;

/// Count for one summary card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub key: String,
    pub label: String,
    pub count: usize,
}

/// `{name, value}` pair handed to chart renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: usize,
}

/// Counts over the whole store, never over the filtered list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total: usize,
    /// One entry per configured category, in config order. Buckets may
    /// overlap, so these need not add up to `total`.
    pub categories: Vec<CategoryCount>,
    /// Counts of the mutually exclusive field. Sums to `total`; records
    /// without a value are counted under `""`.
    pub partition: BTreeMap<String, usize>,
}

impl StatsSnapshot {
    /// Card count by category key, falling back to the partition
    pub fn count(&self, key: &str) -> Option<usize> {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.count)
            .or_else(|| self.partition.get(key).copied())
    }

    pub fn partition_sum(&self) -> usize {
        self.partition.values().sum()
    }

    /// Partition counts as chart points; the missing bucket is named "unknown"
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        self.partition
            .iter()
            .map(|(name, value)| ChartPoint {
                name: if name.is_empty() {
                    "unknown".to_string()
                } else {
                    name.clone()
                },
                value: *value,
            })
            .collect()
    }
}

/// Group records by one field; missing values land under `""`
pub fn group_counts<R>(records: &[R], field: Accessor<R>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let key = field(record).as_text().trim().to_string();
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Compute the snapshot for a freshly loaded store
pub fn aggregate<R>(records: &[R], config: &ListConfig<R>, index: &StoreIndex) -> StatsSnapshot {
    let categories = config
        .categories
        .iter()
        .map(|category| {
            let count = match category.matcher {
                // one per qualifying group, not per member
                CategoryMatcher::GroupSizeAtLeast { min, .. } => {
                    index.groups_at_least(category.key, min)
                }
                _ => {
                    let filter = CategoryFilter::Only(category.key.to_string());
                    records
                        .iter()
                        .filter(|r| matches_category(*r, &filter, config, index))
                        .count()
                }
            };
            CategoryCount {
                key: category.key.to_string(),
                label: category.label.to_string(),
                count,
            }
        })
        .collect();

    let partition = config
        .partition
        .map(|field| group_counts(records, field))
        .unwrap_or_default();

    StatsSnapshot {
        total: records.len(),
        categories,
        partition,
    }
}
