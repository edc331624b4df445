//! Query shapes accepted by a document table
//!
//! Two shapes cover everything the record store asks for:
//! - [`RangeQuery`]: ordered range over a named index, then filter and limit
//! - [`ScanQuery`]: whole table or index equality, then filter and a [`Take`]
//!
//! Filters are [`Predicate`]s evaluated per row after the index narrowed
//! the candidate set.

use recordb_core::Record;

use crate::index::{Field, IndexKey, IndexValue};

/// Row filter
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals value
    Eq(Field, IndexValue),
    /// All sub-predicates hold (empty = true)
    And(Vec<Predicate>),
    /// Any sub-predicate holds (empty = false)
    Or(Vec<Predicate>),
}

impl Predicate {
    /// `field == value`
    pub fn eq(field: Field, value: impl Into<IndexValue>) -> Self {
        Predicate::Eq(field, value.into())
    }

    /// Conjunction of the given predicates
    ///
    /// Returns `None` when there is nothing to filter on.
    pub fn all(mut predicates: Vec<Predicate>) -> Option<Self> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::And(predicates)),
        }
    }

    /// Evaluate against a record
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Eq(field, value) => value.matches(record, *field),
            Predicate::And(preds) => preds.iter().all(|p| p.matches(record)),
            Predicate::Or(preds) => preds.iter().any(|p| p.matches(record)),
        }
    }
}

/// Iteration order over an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Smallest key first
    #[default]
    Ascending,
    /// Largest key first
    Descending,
}

/// How many matching rows a scan returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Take {
    /// Every match
    #[default]
    All,
    /// The first `n` matches
    Limit(usize),
    /// `n` matches chosen uniformly at random (fewer if there are fewer)
    Sample(usize),
}

/// Rows a scan starts from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every row in the table
    #[default]
    Table,
    /// Rows whose `index` key equals `key`
    Index {
        /// Index name
        index: String,
        /// Key to match
        key: IndexKey,
    },
}

impl Selection {
    /// Equality selection over an index
    pub fn index(index: impl Into<String>, key: IndexKey) -> Self {
        Selection::Index {
            index: index.into(),
            key,
        }
    }
}

/// Ordered range over an index: `lower <= key < upper`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    /// Index name
    pub index: String,
    /// Inclusive lower bound
    pub lower: IndexKey,
    /// Exclusive upper bound
    pub upper: IndexKey,
    /// Iteration order
    pub order: Order,
    /// Row filter applied after the range
    pub filter: Option<Predicate>,
    /// Cap on returned rows, applied after the filter
    pub limit: Option<usize>,
}

impl RangeQuery {
    /// Ascending, unfiltered, unlimited range
    pub fn new(index: impl Into<String>, lower: IndexKey, upper: IndexKey) -> Self {
        Self {
            index: index.into(),
            lower,
            upper,
            order: Order::Ascending,
            filter: None,
            limit: None,
        }
    }

    /// Set the iteration order
    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Set the row filter
    pub fn filter(mut self, filter: Option<Predicate>) -> Self {
        self.filter = filter;
        self
    }

    /// Cap the number of rows
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// Scan over a selection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanQuery {
    /// Starting rows
    pub selection: Selection,
    /// Row filter
    pub filter: Option<Predicate>,
    /// Result size policy; ignored by `count`
    pub take: Take,
}

impl ScanQuery {
    /// Unfiltered scan of a selection
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            ..Self::default()
        }
    }

    /// Set the row filter
    pub fn filter(mut self, filter: Option<Predicate>) -> Self {
        self.filter = filter;
        self
    }

    /// Set the result size policy
    pub fn take(mut self, take: Take) -> Self {
        self.take = take;
        self
    }
}
