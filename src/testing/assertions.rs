//! Assertions over parse output.

use super::fixtures::expected_title;
use crate::error::ParseError;
use crate::record::Title;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Range;

/// Assert that `titles` are exactly the fixture rows `ids`, in that order.
///
/// # Panics
///
/// Panics at the first position whose record differs.
pub fn assert_titles_in_order(titles: &[Title], ids: Range<usize>) {
    assert_eq!(
        titles.len(),
        ids.len(),
        "record count mismatch: expected {}, got {}",
        ids.len(),
        titles.len()
    );
    for (pos, (got, id)) in titles.iter().zip(ids).enumerate() {
        assert_eq!(*got, expected_title(id), "record mismatch at position {pos}");
    }
}

/// Assert that two record sets hold the same multiset of records.
///
/// # Panics
///
/// Panics if any record occurs a different number of times in each.
pub fn assert_same_records<T: Debug + Eq + Hash>(actual: &[T], expected: &[T]) {
    fn counts<T: Eq + Hash>(items: &[T]) -> HashMap<&T, usize> {
        let mut m = HashMap::with_capacity(items.len());
        for item in items {
            *m.entry(item).or_insert(0) += 1;
        }
        m
    }
    assert_eq!(
        actual.len(),
        expected.len(),
        "record count mismatch: expected {}, got {}",
        expected.len(),
        actual.len()
    );
    let (a, e) = (counts(actual), counts(expected));
    for (item, n) in &e {
        let got = a.get(item).copied().unwrap_or(0);
        assert_eq!(got, *n, "record {item:?} expected {n} times, found {got}");
    }
}

/// Assert that `result` failed with a schema violation at `line`.
///
/// # Panics
///
/// Panics on success or on any other error.
pub fn assert_violation_at<T: Debug>(result: Result<T, ParseError>, line: usize, found: usize) {
    match result {
        Err(ParseError::SchemaViolation {
            line: l,
            expected: 9,
            found: f,
        }) if l == line && f == found => {}
        other => panic!("expected a 9-column violation at line {line} with {found} columns, got {other:?}"),
    }
}
