//! Highlight controller
//!
//! Per output cell: `Idle → Active → Idle`. Entering a cell decodes its
//! annotation reference and bumps a reference count for every correlated
//! source cell that exists on the page; leaving releases exactly the set that
//! entering acquired. A source cell is highlighted while its count is above
//! zero, so overlapping hovers never clear each other's highlights.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::annotation::decode_reference;
use crate::identifier::{OutputCellPosition, TaggedCellId};
use crate::observability::{log_event_with_fields, Event};

/// Source cells whose visual state must change after an interaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HighlightDelta {
    /// Count went 0 → 1
    pub activated: Vec<TaggedCellId>,
    /// Count went 1 → 0
    pub deactivated: Vec<TaggedCellId>,
}

impl HighlightDelta {
    pub fn is_empty(&self) -> bool {
        self.activated.is_empty() && self.deactivated.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HighlightController {
    addressable: HashSet<TaggedCellId>,
    counts: HashMap<TaggedCellId, usize>,
    sessions: HashMap<OutputCellPosition, Vec<TaggedCellId>>,
}

impl HighlightController {
    /// A controller over the identifiers rendered by the source catalog
    pub fn new(addressable: impl IntoIterator<Item = TaggedCellId>) -> Self {
        Self {
            addressable: addressable.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Pointer entered the output cell at `position` carrying `reference`
    ///
    /// Re-entering an active cell changes nothing. Undecodable references and
    /// identifiers missing from the page are skipped.
    pub fn on_enter(&mut self, position: OutputCellPosition, reference: &str) -> HighlightDelta {
        if self.sessions.contains_key(&position) {
            return HighlightDelta::default();
        }

        let decoded = match decode_reference(reference) {
            Ok(set) => set,
            Err(err) => {
                log_event_with_fields(
                    Event::DecodeFailed,
                    &[
                        ("code", err.code()),
                        ("reason", err.to_string().as_str()),
                        ("reference", reference),
                    ],
                );
                return HighlightDelta::default();
            }
        };

        let owned: Vec<TaggedCellId> = decoded
            .into_iter()
            .filter(|id| self.addressable.contains(id))
            .collect();

        let mut delta = HighlightDelta::default();
        for id in &owned {
            let count = self.counts.entry(id.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                delta.activated.push(id.clone());
            }
        }
        self.sessions.insert(position, owned);
        delta
    }

    /// Pointer left the output cell at `position`
    ///
    /// Releases exactly what the matching enter acquired; leaving a cell that
    /// is not active changes nothing.
    pub fn on_leave(&mut self, position: OutputCellPosition) -> HighlightDelta {
        let mut delta = HighlightDelta::default();
        let Some(owned) = self.sessions.remove(&position) else {
            return delta;
        };

        for id in owned {
            if let Some(count) = self.counts.get_mut(&id) {
                *count -= 1;
                if *count == 0 {
                    self.counts.remove(&id);
                    delta.deactivated.push(id);
                }
            }
        }
        delta
    }

    pub fn is_highlighted(&self, id: &TaggedCellId) -> bool {
        self.counts.contains_key(id)
    }

    /// Currently highlighted source cells
    pub fn highlighted(&self) -> BTreeSet<TaggedCellId> {
        self.counts.keys().cloned().collect()
    }

    /// Full highlight state: identifier → number of hovers holding it
    pub fn state(&self) -> BTreeMap<TaggedCellId, usize> {
        self.counts.iter().map(|(id, n)| (id.clone(), *n)).collect()
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Drop all hovers; only for a fresh render
    pub fn reset(&mut self) {
        self.counts.clear();
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaggedCellId {
        TaggedCellId::parse(s).unwrap()
    }

    fn page() -> HighlightController {
        HighlightController::new(
            ["p:t1:1", "p:t2:1", "p:t1:2", "p:t2:2", "p:t3:1"]
                .iter()
                .map(|s| id(s)),
        )
    }

    const PARIS: &str = "1 ((p:t1:1;p:t2:1))";
    const OVERLAP: &str = "1 ((p:t2:1;p:t3:1))";

    #[test]
    fn test_enter_then_leave_restores_state() {
        let mut c = page();
        let at = OutputCellPosition::new(0, 1);

        let delta = c.on_enter(at, PARIS);
        assert_eq!(delta.activated, vec![id("p:t1:1"), id("p:t2:1")]);
        assert!(c.is_highlighted(&id("p:t1:1")));

        let delta = c.on_leave(at);
        assert_eq!(delta.deactivated, vec![id("p:t1:1"), id("p:t2:1")]);
        assert!(c.highlighted().is_empty());
        assert_eq!(c.active_sessions(), 0);
    }

    #[test]
    fn test_overlapping_hovers_keep_shared_cell() {
        let mut c = page();
        let a = OutputCellPosition::new(0, 1);
        let b = OutputCellPosition::new(1, 1);

        c.on_enter(a, PARIS);
        let delta = c.on_enter(b, OVERLAP);
        assert_eq!(delta.activated, vec![id("p:t3:1")]);

        let delta = c.on_leave(a);
        assert_eq!(delta.deactivated, vec![id("p:t1:1")]);
        assert!(c.is_highlighted(&id("p:t2:1")));
        assert!(c.is_highlighted(&id("p:t3:1")));

        c.on_leave(b);
        assert!(c.highlighted().is_empty());
    }

    #[test]
    fn test_symmetry_against_any_prior_state() {
        let mut c = page();
        c.on_enter(OutputCellPosition::new(5, 1), OVERLAP);
        let before = c.state();

        let at = OutputCellPosition::new(0, 1);
        c.on_enter(at, PARIS);
        c.on_leave(at);
        assert_eq!(c.state(), before);
    }

    #[test]
    fn test_reenter_is_idempotent() {
        let mut c = page();
        let at = OutputCellPosition::new(0, 1);
        c.on_enter(at, PARIS);
        let again = c.on_enter(at, PARIS);
        assert!(again.is_empty());
        assert_eq!(c.state().get(&id("p:t1:1")), Some(&1));

        c.on_leave(at);
        assert!(c.highlighted().is_empty());
        assert!(c.on_leave(at).is_empty());
    }

    #[test]
    fn test_unknown_identifiers_skipped() {
        let mut c = page();
        let delta = c.on_enter(OutputCellPosition::new(0, 1), "1 ((p:t1:1;other:t9:1))");
        assert_eq!(delta.activated, vec![id("p:t1:1")]);
        assert!(!c.is_highlighted(&id("other:t9:1")));
    }

    #[test]
    fn test_malformed_reference_degrades_to_no_highlight() {
        let mut c = page();
        let at = OutputCellPosition::new(0, 1);
        assert!(c.on_enter(at, "1 (p:t1:1;p:t2:1").is_empty());
        assert_eq!(c.active_sessions(), 0);
        assert!(c.on_leave(at).is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut c = page();
        c.on_enter(OutputCellPosition::new(0, 1), PARIS);
        c.reset();
        assert!(c.highlighted().is_empty());
        assert_eq!(c.active_sessions(), 0);
    }
}
