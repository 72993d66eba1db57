use std::cmp::Ordering;

use caredesk_core::filter::{self, CategoryFilter, FilterState, SortDirection, SortKey};
use caredesk_core::models::{Beneficiary, BeneficiaryStatus, BeneficiaryType, Guardian};
use caredesk_core::source::Fetched;
use caredesk_core::{pipeline, sort, ListView, LoadOutcome, Record, RecordStore};

fn beneficiary(
    id: u64,
    name: Option<&str>,
    guardian: Option<&str>,
    phone: Option<&str>,
    status: Option<BeneficiaryStatus>,
) -> Beneficiary {
    Beneficiary {
        id,
        full_name: name.map(str::to_string),
        guardian_name: guardian.map(str::to_string),
        phone: phone.map(str::to_string),
        status,
        ..Beneficiary::default()
    }
}

fn sample() -> Vec<Beneficiary> {
    use BeneficiaryStatus::*;
    vec![
        beneficiary(1, Some("Bob"), Some("Almaz"), Some("+251911200032"), Some(Active)),
        beneficiary(2, Some("alice"), None, Some("0911000111"), Some(WaitingList)),
        beneficiary(3, Some("Charlie"), Some("bekele"), None, Some(Active)),
        beneficiary(4, None, Some("Almaz"), Some("0922000333"), Some(Terminated)),
        beneficiary(5, Some("dawit"), Some("Chaltu"), None, None),
        Beneficiary {
            id: 6,
            beneficiary_type: Some(BeneficiaryType::Elderly),
            status: Some(Graduated),
            ..Beneficiary::default()
        },
        Beneficiary {
            id: 7,
            ..Beneficiary::default()
        },
    ]
}

fn store() -> RecordStore<Beneficiary> {
    RecordStore::new(sample(), &Beneficiary::list_config()).unwrap()
}

fn filters() -> Vec<FilterState> {
    let mut states = vec![
        FilterState::new(),
        FilterState::new().with_search("al"),
        FilterState::new().with_search("  032 "),
        FilterState::new().with_category(CategoryFilter::Only("active".into())),
        FilterState::new().with_category(CategoryFilter::Only("elderly".into())),
        FilterState::new().with_category(CategoryFilter::Only("no_such_bucket".into())),
    ];
    for column in ["full_name", "guardian_name", "age", "status"] {
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            states.push(FilterState::new().sorted_by(SortKey::Named(column.into()), direction));
        }
    }
    states.push(
        FilterState::new()
            .with_search("a")
            .with_category(CategoryFilter::Only("active".into()))
            .sorted_by(SortKey::Index(0), SortDirection::Descending),
    );
    states
}

fn ids(rows: &[&Beneficiary]) -> Vec<u64> {
    rows.iter().map(|b| b.id).collect()
}

#[test]
fn pipeline_is_deterministic() {
    let store = store();
    let config = Beneficiary::list_config();
    for state in filters() {
        let first = pipeline::derive(&store, &config, &state);
        let second = pipeline::derive(&store, &config, &state);
        assert_eq!(first, second, "{:?}", state);
    }
}

#[test]
fn derived_list_is_exactly_the_matching_records() {
    let store = store();
    let config = Beneficiary::list_config();
    for state in filters() {
        let rows = pipeline::apply(&store, &config, &state);
        for record in store.records() {
            let listed = rows.iter().any(|r| r.id == record.id);
            let matches = filter::matches(record, &state, &config, store.index());
            assert_eq!(listed, matches, "record {} under {:?}", record.id, state);
        }
        assert!(rows.len() <= store.len());
    }
}

#[test]
fn adjacent_rows_respect_the_sort() {
    let store = store();
    let config = Beneficiary::list_config();
    for state in filters() {
        let Some(spec) = &state.sort else { continue };
        let column = config.resolve_column(&spec.key).unwrap();
        let rows = pipeline::apply(&store, &config, &state);
        for pair in rows.windows(2) {
            let ordering = sort::compare(pair[0], pair[1], column, SortDirection::Ascending);
            match spec.direction {
                SortDirection::Ascending => assert_ne!(ordering, Ordering::Greater),
                SortDirection::Descending => assert_ne!(ordering, Ordering::Less),
            }
        }
    }
}

#[test]
fn stats_ignore_the_filter_state() {
    let mut view: ListView<Beneficiary> = ListView::new();
    let ticket = view.begin_load();
    assert_eq!(view.complete_load(ticket, Ok(Fetched::new(sample()))), LoadOutcome::Ready);
    let before = view.stats().cloned().unwrap();

    view.set_search("bob");
    view.set_category(CategoryFilter::Only("terminated".into()));
    view.toggle_sort(SortKey::Named("age".into()));
    assert_eq!(view.stats(), Some(&before));

    // only a new store changes the numbers
    let ticket = view.begin_load();
    view.complete_load(ticket, Ok(Fetched::new(sample()[..3].to_vec())));
    assert_ne!(view.stats(), Some(&before));
    assert_eq!(view.stats().map(|s| s.total), Some(3));
}

#[test]
fn partition_counts_add_up_to_the_store() {
    let store = store();
    assert_eq!(store.stats().partition_sum(), store.len());
    // two records have no status at all
    assert_eq!(store.stats().partition.get(""), Some(&2));

    let guardians = vec![
        Guardian { id: 1, relation: Some("mother".into()), ..Guardian::default() },
        Guardian { id: 2, ..Guardian::default() },
    ];
    let guardians = RecordStore::new(guardians, &Guardian::list_config()).unwrap();
    assert_eq!(guardians.stats().partition_sum(), 2);
    let names: Vec<String> = guardians.stats().chart_points().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["unknown".to_string(), "mother".to_string()]);
}

#[test]
fn empty_records_are_never_dropped() {
    let store = store();
    let config = Beneficiary::list_config();
    for column in 0..config.columns.len() {
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let state = FilterState::new().sorted_by(SortKey::Index(column), direction);
            let rows = pipeline::apply(&store, &config, &state);
            assert_eq!(rows.len(), store.len());
            assert!(rows.iter().any(|r| r.id == 7));
        }
    }
}

#[test]
fn scenario_status_buckets() {
    use BeneficiaryStatus::*;
    let records: Vec<Beneficiary> = [Active, Active, WaitingList, Terminated, Graduated]
        .into_iter()
        .enumerate()
        .map(|(i, status)| beneficiary(i as u64 + 1, None, None, None, Some(status)))
        .collect();
    let config = Beneficiary::list_config();
    let store = RecordStore::new(records, &config).unwrap();

    let stats = store.stats();
    assert_eq!(stats.count("active"), Some(2));
    assert_eq!(stats.count("waiting_list"), Some(1));
    assert_eq!(stats.count("terminated"), Some(1));
    assert_eq!(stats.count("graduated"), Some(1));

    let state = FilterState::new().with_category(CategoryFilter::Only("active".into()));
    assert_eq!(ids(&pipeline::apply(&store, &config, &state)), vec![1, 2]);
}

#[test]
fn scenario_case_insensitive_name_sort() {
    let records = vec![
        beneficiary(1, Some("Bob"), None, None, None),
        beneficiary(2, Some("alice"), None, None, None),
        beneficiary(3, Some("Charlie"), None, None, None),
    ];
    let config = Beneficiary::list_config();
    let store = RecordStore::new(records, &config).unwrap();
    let state = FilterState::new().sorted_by(SortKey::Named("full_name".into()), SortDirection::Ascending);

    let names: Vec<&str> = pipeline::apply(&store, &config, &state)
        .iter()
        .filter_map(|b| b.full_name.as_deref())
        .collect();
    assert_eq!(names, vec!["alice", "Bob", "Charlie"]);
}

#[test]
fn scenario_phone_substring_search() {
    let store = store();
    let config = Beneficiary::list_config();
    let state = FilterState::new().with_search("032");
    assert_eq!(ids(&pipeline::apply(&store, &config, &state)), vec![1]);
}

#[test]
fn scenario_missing_guardian_sorts_as_empty() {
    let store = store();
    let config = Beneficiary::list_config();
    let key = SortKey::Named("guardian_name".into());

    let ascending = pipeline::apply(
        &store,
        &config,
        &FilterState::new().sorted_by(key.clone(), SortDirection::Ascending),
    );
    // records 2, 6 and 7 have no guardian and keep their store order
    assert_eq!(ids(&ascending[..3]), vec![2, 6, 7]);

    let descending = pipeline::apply(
        &store,
        &config,
        &FilterState::new().sorted_by(key, SortDirection::Descending),
    );
    assert_eq!(ids(&descending[descending.len() - 3..]), vec![2, 6, 7]);
}

#[test]
fn scenario_latest_dispatched_refresh_wins() {
    let mut view: ListView<Beneficiary> = ListView::new();
    let first = view.begin_load();
    let second = view.begin_load();

    // second response arrives first
    let newer = sample();
    assert_eq!(view.complete_load(second, Ok(Fetched::new(newer))), LoadOutcome::Ready);
    let older = sample()[..2].to_vec();
    assert_eq!(view.complete_load(first, Ok(Fetched::new(older))), LoadOutcome::Stale);

    assert_eq!(view.store().map(RecordStore::len), Some(7));
}

#[test]
fn view_query_aliases_pick_the_category() {
    let view: ListView<Beneficiary> = ListView::from_query(Some("waiting"));
    assert_eq!(view.filter().active_category, CategoryFilter::Only("waiting_list".into()));

    let view: ListView<Beneficiary> = ListView::from_query(Some("bogus"));
    assert_eq!(view.filter().active_category, CategoryFilter::All);

    assert_eq!(Beneficiary::COLLECTION, "beneficiaries");
}
