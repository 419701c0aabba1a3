//! Multi-select over the filtered timeline.

use std::collections::BTreeSet;

use serde::Serialize;

/// How a row was activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Plain click.
    Single,
    /// Cmd/Ctrl-click.
    Toggle,
    /// Shift-click.
    Range,
}

/// Selected row indices plus the anchor a range extends from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSelection {
    selected: BTreeSet<usize>,
    anchor: Option<usize>,
}

impl EventSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, index: usize, mode: SelectMode) {
        match (mode, self.anchor) {
            (SelectMode::Range, Some(anchor)) => {
                let (start, end) = (anchor.min(index), anchor.max(index));
                self.selected.extend(start..=end);
            }
            (SelectMode::Toggle, _) => {
                if !self.selected.remove(&index) {
                    self.selected.insert(index);
                }
                self.anchor = Some(index);
            }
            _ => {
                if self.selected.len() == 1 && self.selected.contains(&index) {
                    self.clear();
                } else {
                    self.selected = BTreeSet::from([index]);
                    self.anchor = Some(index);
                }
            }
        }
    }

    pub fn select_all(&mut self, len: usize) {
        self.selected = (0..len).collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// Ascending indices.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    /// Items at the selected indices, in index order. Out-of-range indices are skipped.
    pub fn pick<'a, T>(&self, items: &'a [T]) -> Vec<&'a T> {
        self.indices().filter_map(|i| items.get(i)).collect()
    }
}

/// Pretty JSON array of the selected items, or `None` when nothing is selected.
pub fn selected_events_json<T: Serialize>(
    selection: &EventSelection,
    items: &[T],
) -> Option<String> {
    let picked = selection.pick(items);
    if picked.is_empty() {
        return None;
    }
    serde_json::to_string_pretty(&picked).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::event;
    use serde_json::json;

    fn indices(sel: &EventSelection) -> Vec<usize> {
        sel.indices().collect()
    }

    #[test]
    fn single_click_selects_and_reclick_clears() {
        let mut sel = EventSelection::new();
        sel.select(3, SelectMode::Single);
        assert_eq!(indices(&sel), [3]);
        sel.select(5, SelectMode::Single);
        assert_eq!(indices(&sel), [5]);
        sel.select(5, SelectMode::Single);
        assert!(sel.is_empty());
        assert_eq!(sel.anchor(), None);
    }

    #[test]
    fn toggle_adds_and_removes() {
        let mut sel = EventSelection::new();
        sel.select(1, SelectMode::Toggle);
        sel.select(4, SelectMode::Toggle);
        assert_eq!(indices(&sel), [1, 4]);
        sel.select(1, SelectMode::Toggle);
        assert_eq!(indices(&sel), [4]);
        assert_eq!(sel.anchor(), Some(1));
    }

    #[test]
    fn range_extends_from_anchor_inclusive() {
        let mut sel = EventSelection::new();
        sel.select(6, SelectMode::Single);
        sel.select(2, SelectMode::Range);
        assert_eq!(indices(&sel), [2, 3, 4, 5, 6]);
        assert_eq!(sel.anchor(), Some(6));
    }

    #[test]
    fn range_without_anchor_acts_as_single() {
        let mut sel = EventSelection::new();
        sel.select(2, SelectMode::Range);
        assert_eq!(indices(&sel), [2]);
        assert_eq!(sel.anchor(), Some(2));
    }

    #[test]
    fn multi_selection_single_click_narrows() {
        let mut sel = EventSelection::new();
        sel.select_all(3);
        sel.select(1, SelectMode::Single);
        assert_eq!(indices(&sel), [1]);
    }

    #[test]
    fn selected_json_in_index_order() {
        let events = vec![
            event("started", json!({})),
            event("approved", json!({})),
            event("completed", json!({})),
        ];
        let mut sel = EventSelection::new();
        assert_eq!(selected_events_json(&sel, &events), None);
        sel.select(2, SelectMode::Toggle);
        sel.select(0, SelectMode::Toggle);
        sel.select(9, SelectMode::Toggle);
        let text = selected_events_json(&sel, &events).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let types: Vec<&str> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["type"].as_str().unwrap())
            .collect();
        assert_eq!(types, ["started", "completed"]);
    }
}
