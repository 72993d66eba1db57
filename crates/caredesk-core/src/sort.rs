use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::filter::SortDirection;
use crate::schema::{Column, FieldValue};

/// Alphabetical comparison the way people expect it
///
/// Letters compare by their base form first, so accents and case only
/// matter between otherwise equal strings: "Ávila" < "Bob" < "Émile" <
/// "Eve". Among those, the unaccented form comes first and then the
/// lowercase one. Raw code points break any remaining tie so the order
/// is total.
pub fn collate(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| folded(a).cmp(folded(b)))
        .then_with(|| case_order(a, b))
        .then_with(|| a.cmp(b))
}

/// Decomposed, lowercased, with combining marks dropped
fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// Decomposed and lowercased, marks kept; a bare letter sorts before
/// the same letter with an accent
fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().flat_map(char::to_lowercase)
}

fn case_order(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        if x == y {
            continue;
        }
        match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => return x.cmp(&y),
        }
    }
    Ordering::Equal
}

/// Compare two normalized field values
///
/// Missing text is `""`, missing numbers are `0`. Two numbers compare
/// arithmetically; anything mixed compares by its text form.
pub fn compare_values(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Number(_), FieldValue::Number(_)) => a.as_number().total_cmp(&b.as_number()),
        _ => collate(&a.as_text(), &b.as_text()),
    }
}

/// Order two records by one column
pub fn compare<R>(a: &R, b: &R, column: &Column<R>, direction: SortDirection) -> Ordering {
    direction.apply(compare_values(column.value(a), column.value(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut names: Vec<&str>) -> Vec<&str> {
        names.sort_by(|a, b| collate(a, b));
        names
    }

    #[test]
    fn test_locale_style_ordering() {
        assert_eq!(sorted(vec!["Bob", "alice", "Charlie"]), vec!["alice", "Bob", "Charlie"]);
        assert_eq!(sorted(vec!["Alice", "alice", "ALICE"]), vec!["alice", "Alice", "ALICE"]);
        assert_eq!(sorted(vec!["b", "", "A"]), vec!["", "A", "b"]);
    }

    #[test]
    fn test_accents_sort_with_their_base_letter() {
        assert_eq!(
            sorted(vec!["Zoe", "Émile", "Eve", "Ávila", "Bob"]),
            vec!["Ávila", "Bob", "Émile", "Eve", "Zoe"]
        );
        assert_eq!(collate("Émile", "Zoe"), Ordering::Less);
        assert_eq!(sorted(vec!["résumé", "resume", "Resume"]), vec!["resume", "Resume", "résumé"]);
        // decomposed input sorts like its precomposed spelling
        assert_eq!(collate("e\u{301}mile", "Eve"), Ordering::Less);
        assert_eq!(collate("\u{e9}", "f"), Ordering::Less);
    }

    #[test]
    fn test_numbers_compare_arithmetically() {
        let two = FieldValue::number(Some(2u32));
        let ten = FieldValue::number(Some(10u32));
        assert_eq!(compare_values(two, ten), Ordering::Less);
        // as text "10" < "2", which is exactly what must not happen
        assert_eq!(collate("10", "2"), Ordering::Less);
    }

    #[test]
    fn test_missing_values_normalize() {
        assert_eq!(
            compare_values(FieldValue::Number(None), FieldValue::number(Some(0u32))),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(FieldValue::text(None), FieldValue::text(Some(""))),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(FieldValue::text(None), FieldValue::text(Some("a"))),
            Ordering::Less
        );
    }

    #[test]
    fn test_mixed_kinds_fall_back_to_text() {
        let ordering = compare_values(FieldValue::number(Some(5u32)), FieldValue::text(Some("abc")));
        assert_eq!(ordering, collate("5", "abc"));
    }

    #[test]
    fn test_direction_negates() {
        struct R(u32);
        fn v(r: &R) -> FieldValue<'_> {
            FieldValue::number(Some(r.0))
        }
        let column = Column::new("v", "V", v);
        assert_eq!(compare(&R(1), &R(2), &column, SortDirection::Ascending), Ordering::Less);
        assert_eq!(compare(&R(1), &R(2), &column, SortDirection::Descending), Ordering::Greater);
        assert_eq!(compare(&R(2), &R(2), &column, SortDirection::Descending), Ordering::Equal);
    }
}
