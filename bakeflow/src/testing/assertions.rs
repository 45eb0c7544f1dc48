//! Test assertions for pipeline results.

use crate::core::{Item, ItemId};
use crate::errors::BakeryError;
use crate::tracking::TrackingTable;

/// Asserts that a finished item kept the input's id and type.
pub fn assert_same_item(input: &Item, output: &Item) {
    assert_eq!(input.id, output.id, "item id changed");
    assert_eq!(input.item_type, output.item_type, "item type changed");
}

/// Asserts that `id` has no tracking entry.
pub fn assert_not_tracked(table: &TrackingTable, id: &ItemId) {
    assert!(
        !table.contains(id),
        "Expected no tracking entry for '{}', in flight: {:?}",
        id,
        table.in_flight_ids()
    );
}

/// Asserts that the result is a cancellation.
pub fn assert_cancelled<T: std::fmt::Debug>(result: &Result<T, BakeryError>) {
    assert!(
        matches!(result, Err(BakeryError::Cancelled { .. })),
        "Expected cancellation, got {:?}",
        result
    );
}
