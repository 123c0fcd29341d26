use std::collections::BTreeMap;

use super::{facet_counts, filter, FilterState, Searchable, Selection};

/// A mounted directory listing: one collection plus the filter state the
/// user is editing. Every mutation recomputes the visible records before it
/// returns.
pub struct DirectoryView<'a, R> {
    records: &'a [R],
    state: FilterState,
    visible: Vec<&'a R>,
}

impl<'a, R: Searchable> DirectoryView<'a, R> {
    pub fn mount(records: &'a [R]) -> Self {
        let state = FilterState::new();
        let visible = records.iter().collect();
        Self {
            records,
            state,
            visible,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn set_query(&mut self, query: &str) {
        self.state.query = query.to_string();
        self.recompute();
    }

    /// Sets one facet; `"all"` clears it.
    pub fn select(&mut self, facet: &str, value: &str) {
        self.state.select(facet, Selection::parse(value));
        self.recompute();
    }

    pub fn clear(&mut self) {
        self.state = FilterState::new();
        self.recompute();
    }

    pub fn results(&self) -> &[&'a R] {
        &self.visible
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn counts(&self, facet: &str) -> BTreeMap<String, usize> {
        facet_counts(self.records, facet)
    }

    fn recompute(&mut self) {
        self.visible = filter(self.records, &self.state);
    }
}
