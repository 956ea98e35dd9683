//! List filter/projector.
//!
//! A pure derivation of the visible rows from a fetched collection: free-text
//! search, categorical facets and a creation-date range, ANDed together.
//! Order of the input collection is preserved.

use crate::models::{Product, Record, Ticket, User, UserStatus};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Enumerated dimensions a collection can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Facet {
    Status,
    Category,
    Priority,
}

impl Facet {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "status" => Some(Self::Status),
            "category" => Some(Self::Category),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Category => "category",
            Self::Priority => "priority",
        }
    }
}

/// Exact-match filtering on enumerated fields.
pub trait Filterable: Record {
    /// Facets this record type supports.
    fn facets() -> &'static [Facet];

    /// Normalise an operator-typed value to the canonical form compared
    /// against (e.g. `active` -> `Active`).
    fn canonical_value(facet: Facet, value: &str) -> String {
        let _ = facet;
        value.to_string()
    }

    fn facet_matches(&self, facet: Facet, value: &str) -> bool;
}

impl Filterable for User {
    fn facets() -> &'static [Facet] {
        &[Facet::Status]
    }

    fn canonical_value(_facet: Facet, value: &str) -> String {
        UserStatus::parse(value).as_str().to_string()
    }

    fn facet_matches(&self, facet: Facet, value: &str) -> bool {
        match facet {
            Facet::Status => match value {
                // The flag is authoritative for suspension
                "Suspended" => self.suspended,
                // Flag and label are not guaranteed consistent; require both
                "Active" => !self.suspended && self.status == UserStatus::Active,
                other => self.status.as_str().eq_ignore_ascii_case(other),
            },
            _ => false,
        }
    }
}

impl Filterable for Product {
    fn facets() -> &'static [Facet] {
        &[Facet::Status, Facet::Category]
    }

    fn canonical_value(facet: Facet, value: &str) -> String {
        match facet {
            Facet::Status => crate::models::ProductStatus::parse(value).as_str().to_string(),
            _ => value.to_string(),
        }
    }

    fn facet_matches(&self, facet: Facet, value: &str) -> bool {
        match facet {
            Facet::Status => self.status.as_str().eq_ignore_ascii_case(value),
            Facet::Category => self
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(value)),
            Facet::Priority => false,
        }
    }
}

impl Filterable for Ticket {
    fn facets() -> &'static [Facet] {
        &[Facet::Status, Facet::Priority]
    }

    fn canonical_value(facet: Facet, value: &str) -> String {
        match facet {
            Facet::Status => crate::models::TicketStatus::parse(value).as_str().to_string(),
            Facet::Priority => crate::models::Priority::parse(value).as_str().to_string(),
            Facet::Category => value.to_string(),
        }
    }

    fn facet_matches(&self, facet: Facet, value: &str) -> bool {
        match facet {
            Facet::Status => self.status.as_str().eq_ignore_ascii_case(value),
            Facet::Priority => self.priority.as_str().eq_ignore_ascii_case(value),
            Facet::Category => false,
        }
    }
}

/// Inclusive day range on the creation timestamp. Inert unless both bounds
/// are set. Inverted bounds are swapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_active(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    pub fn contains(&self, day: Option<NaiveDate>) -> bool {
        let (Some(a), Some(b)) = (self.from, self.to) else {
            return true;
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        match day {
            Some(d) => lo <= d && d <= hi,
            None => false,
        }
    }
}

/// Everything the operator has narrowed the list by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: String,
    pub filters: BTreeMap<Facet, String>,
    pub dates: DateRange,
}

impl ListQuery {
    /// Set or clear (empty value) a facet filter.
    pub fn set_filter(&mut self, facet: Facet, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.filters.remove(&facet);
        } else {
            self.filters.insert(facet, value.to_string());
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.filters.is_empty() && !self.dates.is_active()
    }

    pub fn matches<T: Filterable>(&self, item: &T) -> bool {
        matches_search(item, &self.search)
            && self
                .filters
                .iter()
                .all(|(facet, value)| item.facet_matches(*facet, value))
            && self.dates.contains(item.created_day())
    }
}

fn matches_search<T: Record>(item: &T, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    item.search_fields().join(" ").to_lowercase().contains(&term)
}

/// Project the visible subset of `items`, preserving order.
pub fn project<'a, T: Filterable>(items: &'a [T], query: &ListQuery) -> Vec<&'a T> {
    items.iter().filter(|item| query.matches(*item)).collect()
}

/// Distinct product categories in first-seen order, for the filter picker.
pub fn distinct_categories(products: &[Product]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for category in products.iter().filter_map(|p| p.category.as_deref()) {
        if !seen.iter().any(|c| c == category) {
            seen.push(category.to_string());
        }
    }
    seen
}
