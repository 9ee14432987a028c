//! Button collection transformations.
//!
//! The button list is the single shared mutable resource in the app, so every
//! mutation here is a pure transformation of the previous collection. The
//! controller applies these under its state lock; interleaved async
//! completions can never lose updates through read-modify-write races.

use crate::relay::data::{is_truthy, RelayButton, StatusMap};
use uuid::Uuid;

/// Merge a board-reported status map into the button collection.
///
/// Matching is by the `(board_address, relay_id)` compound key, so identical
/// relay ids on different boards stay distinct. Hits update only `turned_on`;
/// misses append a fresh button at the end. Absence from the map is not
/// evidence of removal, so nothing is ever dropped here. Idempotent.
pub fn reconcile(buttons: &mut Vec<RelayButton>, board_address: &str, statuses: &StatusMap) {
    for (relay_id, value) in statuses {
        let reported_on = is_truthy(value);
        match buttons
            .iter_mut()
            .find(|b| b.board_address == board_address && &b.id == relay_id)
        {
            Some(existing) => existing.turned_on = reported_on,
            None => buttons.push(RelayButton::new(board_address, relay_id.clone(), reported_on)),
        }
    }
}

/// Flip the reversed flag on exactly one button.
///
/// Returns whether anything changed (unknown uuids are ignored).
pub fn toggle_reversed(buttons: &mut [RelayButton], uuid: Uuid) -> bool {
    match buttons.iter_mut().find(|b| b.uuid == uuid) {
        Some(button) => {
            button.reversed = !button.reversed;
            true
        }
        None => false,
    }
}

/// Hide exactly one button. Returns whether anything changed.
pub fn hide(buttons: &mut [RelayButton], uuid: Uuid) -> bool {
    match buttons.iter_mut().find(|b| b.uuid == uuid) {
        Some(button) if !button.hidden => {
            button.hidden = true;
            true
        }
        _ => false,
    }
}

/// Unhide every button. Returns whether anything changed, so callers can skip
/// the persistence write when the operation was a no-op.
pub fn unhide_all(buttons: &mut [RelayButton]) -> bool {
    let mut changed = false;
    for button in buttons.iter_mut() {
        if button.hidden {
            button.hidden = false;
            changed = true;
        }
    }
    changed
}

/// Replace the collection's order with a caller-supplied uuid sequence.
///
/// The sequence must be a permutation of the current uuid set; anything else
/// (missing, unknown or duplicated uuids, e.g. a drag completion racing a
/// reconcile that appended a button) leaves the collection untouched and
/// returns false.
pub fn reorder(buttons: &mut Vec<RelayButton>, sequence: &[Uuid]) -> bool {
    if sequence.len() != buttons.len() {
        return false;
    }

    let mut reordered = Vec::with_capacity(buttons.len());
    for uuid in sequence {
        match buttons.iter().find(|b| &b.uuid == uuid) {
            Some(button) => reordered.push(button.clone()),
            None => return false,
        }
    }
    // Duplicates in the sequence would shadow a missing uuid above, catch
    // them by checking the result covers every existing button.
    if reordered.len() != buttons.len()
        || !buttons
            .iter()
            .all(|b| reordered.iter().filter(|r| r.uuid == b.uuid).count() == 1)
    {
        return false;
    }

    *buttons = reordered;
    true
}

/// Buttons the presentation layer should render, in user order.
pub fn visible(buttons: &[RelayButton]) -> Vec<RelayButton> {
    buttons.iter().filter(|b| !b.hidden).cloned().collect()
}

/// How many buttons are currently hidden.
pub fn hidden_count(buttons: &[RelayButton]) -> usize {
    buttons.iter().filter(|b| b.hidden).count()
}
