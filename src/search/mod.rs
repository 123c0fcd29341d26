//! Faceted search over the static directory collections.
//!
//! A record type opts in by implementing [`Searchable`]: it names the text
//! fields and list fields the free-text query looks at, and resolves facet
//! names to one of three [`FacetValue`] shapes. [`filter`] is then a pure
//! function of the collection and a [`FilterState`]; it never reorders.

pub mod geo;
pub mod view;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use view::DirectoryView;

/// Sentinel selection that disables a facet.
pub const ALL: &str = "all";

/// A record's value for one facet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FacetValue<'a> {
    /// Categorical attribute, compared for exact equality.
    Exact(&'a str),
    /// List attribute; the selection must be one of the elements.
    AnyOf(&'a [String]),
    /// Boolean attribute, selected as `available` / `unavailable`.
    Flag(bool),
}

pub trait Searchable {
    /// Facet names this record type understands.
    const FACETS: &'static [&'static str];

    fn text_fields(&self) -> Vec<&str>;

    fn list_fields(&self) -> Vec<&[String]>;

    /// `None` for a facet the record type does not declare.
    fn facet(&self, name: &str) -> Option<FacetValue<'_>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum Selection {
    #[default]
    All,
    Value(String),
}

impl Selection {
    /// `"all"` (any case) maps to [`Selection::All`].
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case(ALL) {
            Selection::All
        } else {
            Selection::Value(raw.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub query: String,
    pub facets: BTreeMap<String, Selection>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_facet(mut self, name: impl Into<String>, value: &str) -> Self {
        self.facets.insert(name.into(), Selection::parse(value));
        self
    }

    pub fn select(&mut self, name: &str, selection: Selection) {
        self.facets.insert(name.to_string(), selection);
    }

    /// Facets whose selection is not the `all` sentinel.
    pub fn active_facets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.facets.iter().filter_map(|(name, selection)| match selection {
            Selection::All => None,
            Selection::Value(value) => Some((name.as_str(), value.as_str())),
        })
    }
}

/// `true` when `record` satisfies the text predicate and every active facet.
pub fn matches<R: Searchable>(record: &R, state: &FilterState) -> bool {
    matches_query(record, &state.query.to_lowercase())
        && state
            .active_facets()
            .all(|(name, selected)| matches_facet(record, name, selected))
}

/// Records of `records` that satisfy `state`, in their original order.
pub fn filter<'a, R, I>(records: I, state: &FilterState) -> Vec<&'a R>
where
    R: Searchable + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let needle = state.query.to_lowercase();
    let facets: Vec<(&str, &str)> = state.active_facets().collect();

    records
        .into_iter()
        .filter(|record| {
            matches_query(*record, &needle)
                && facets
                    .iter()
                    .all(|(name, selected)| matches_facet(*record, name, selected))
        })
        .collect()
}

/// How many records carry each value of `facet`, counted over the whole
/// collection regardless of any active filter.
pub fn facet_counts<R: Searchable>(records: &[R], facet: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        match record.facet(facet) {
            Some(FacetValue::Exact(value)) => {
                *counts.entry(value.to_string()).or_insert(0) += 1;
            }
            Some(FacetValue::AnyOf(values)) => {
                for value in values {
                    *counts.entry(value.clone()).or_insert(0) += 1;
                }
            }
            Some(FacetValue::Flag(flag)) => {
                let key = if flag { "available" } else { "unavailable" };
                *counts.entry(key.to_string()).or_insert(0) += 1;
            }
            None => {}
        }
    }
    counts
}

fn matches_query<R: Searchable>(record: &R, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    record
        .text_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
        || record
            .list_fields()
            .iter()
            .flat_map(|list| list.iter())
            .any(|item| item.to_lowercase().contains(needle))
}

fn matches_facet<R: Searchable>(record: &R, name: &str, selected: &str) -> bool {
    match record.facet(name) {
        Some(FacetValue::Exact(value)) => value == selected,
        Some(FacetValue::AnyOf(values)) => values.iter().any(|value| value == selected),
        Some(FacetValue::Flag(flag)) => parse_flag(selected) == Some(flag),
        // Undeclared facet: nothing can satisfy it.
        None => false,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "available" | "true" | "yes" => Some(true),
        "unavailable" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item {
        name: String,
        kind: String,
        tags: Vec<String>,
        open: bool,
    }

    impl Searchable for Item {
        const FACETS: &'static [&'static str] = &["kind", "tag", "open"];

        fn text_fields(&self) -> Vec<&str> {
            vec![self.name.as_str(), self.kind.as_str()]
        }

        fn list_fields(&self) -> Vec<&[String]> {
            vec![self.tags.as_slice()]
        }

        fn facet(&self, name: &str) -> Option<FacetValue<'_>> {
            match name {
                "kind" => Some(FacetValue::Exact(&self.kind)),
                "tag" => Some(FacetValue::AnyOf(&self.tags)),
                "open" => Some(FacetValue::Flag(self.open)),
                _ => None,
            }
        }
    }

    fn item(name: &str, kind: &str, tags: &[&str], open: bool) -> Item {
        Item {
            name: name.into(),
            kind: kind.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            open,
        }
    }

    fn sample() -> Vec<Item> {
        vec![
            item("Apollo Clinic", "clinic", &["Dental", "ENT"], true),
            item("City Pharmacy", "pharmacy", &["Generic Medicines"], false),
            item("Apollo Hospital", "hospital", &["Emergency", "ICU"], true),
            item("Sunrise Labs", "diagnostic", &["Blood Tests", "MRI"], false),
        ]
    }

    fn names<'a>(records: &[&'a Item]) -> Vec<&'a str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn empty_state_returns_everything_in_order() {
        let items = sample();
        let result = filter(&items, &FilterState::new());
        assert_eq!(result.len(), items.len());
        assert_eq!(names(&result)[0], "Apollo Clinic");
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        let items = sample();
        let upper = filter(&items, &FilterState::new().with_query("APOLLO"));
        let lower = filter(&items, &FilterState::new().with_query("apollo"));
        assert_eq!(upper, lower);
        assert_eq!(names(&lower), vec!["Apollo Clinic", "Apollo Hospital"]);
    }

    #[test]
    fn query_reaches_list_elements() {
        let items = sample();
        let result = filter(&items, &FilterState::new().with_query("mri"));
        assert_eq!(names(&result), vec!["Sunrise Labs"]);
    }

    #[test]
    fn query_is_not_trimmed() {
        let items = sample();
        let result = filter(&items, &FilterState::new().with_query(" apollo"));
        assert!(result.is_empty());
    }

    #[test]
    fn exact_facet_is_case_sensitive() {
        let items = sample();
        let hit = filter(&items, &FilterState::new().with_facet("kind", "clinic"));
        let miss = filter(&items, &FilterState::new().with_facet("kind", "Clinic"));
        assert_eq!(names(&hit), vec!["Apollo Clinic"]);
        assert!(miss.is_empty());
    }

    #[test]
    fn list_facet_requires_membership() {
        let items = sample();
        let result = filter(&items, &FilterState::new().with_facet("tag", "ICU"));
        assert_eq!(names(&result), vec!["Apollo Hospital"]);
    }

    #[test]
    fn flag_facet_accepts_synonyms() {
        let items = sample();
        let available = filter(&items, &FilterState::new().with_facet("open", "available"));
        let yes = filter(&items, &FilterState::new().with_facet("open", "yes"));
        let unavailable = filter(&items, &FilterState::new().with_facet("open", "unavailable"));
        assert_eq!(available, yes);
        assert_eq!(available.len(), 2);
        assert_eq!(unavailable.len(), 2);
    }

    #[test]
    fn all_sentinel_short_circuits() {
        let items = sample();
        let result = filter(
            &items,
            &FilterState::new().with_facet("kind", "all").with_facet("tag", "ALL"),
        );
        assert_eq!(result.len(), items.len());
    }

    #[test]
    fn undeclared_facet_matches_nothing() {
        let items = sample();
        let result = filter(&items, &FilterState::new().with_facet("colour", "red"));
        assert!(result.is_empty());
    }

    #[test]
    fn filter_is_idempotent() {
        let items = sample();
        let state = FilterState::new().with_query("a").with_facet("open", "available");
        let once = filter(&items, &state);
        let twice = filter(once.clone(), &state);
        assert_eq!(once, twice);
    }

    #[test]
    fn extra_constraint_yields_subsequence() {
        let items = sample();
        let loose = FilterState::new().with_query("a");
        let tight = loose.clone().with_facet("kind", "hospital");
        let wide = filter(&items, &loose);
        let narrow = filter(&items, &tight);
        assert!(narrow.len() <= wide.len());

        let mut cursor = wide.iter();
        for record in &narrow {
            assert!(cursor.any(|candidate| std::ptr::eq(*candidate, *record)));
        }
        // Filtering the loose result with the tight state equals one combined pass.
        assert_eq!(filter(wide.clone(), &tight), narrow);
    }

    #[test]
    fn empty_collection_yields_empty_result() {
        let items: Vec<Item> = Vec::new();
        assert!(filter(&items, &FilterState::new().with_query("x")).is_empty());
    }

    #[test]
    fn counts_span_whole_collection() {
        let items = sample();
        let counts = facet_counts(&items, "open");
        assert_eq!(counts.get("available"), Some(&2));
        assert_eq!(counts.get("unavailable"), Some(&2));

        let kinds = facet_counts(&items, "kind");
        assert_eq!(kinds.len(), 4);
    }

    #[test]
    fn selection_parse_recognises_sentinel() {
        assert!(Selection::parse("All").is_all());
        assert_eq!(Selection::parse("cardiology"), Selection::Value("cardiology".into()));
    }
}
