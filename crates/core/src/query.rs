//! Query descriptors
//!
//! A [`QueryDescriptor`] is the declarative description of a read: which
//! collection, which documents, in what order, and how the results should be
//! delivered and formatted. The filter is a tagged [`Filter`] so that "no
//! filter", "do not query yet", "by id" and "by clauses" can never be
//! confused.
//!
//! ```
//! use catalog_core::{Direction, FilterOp, QueryDescriptor};
//!
//! let q = QueryDescriptor::new("assets")
//!     .filter("isApproved", FilterOp::Eq, true)
//!     .order_by("createdAt", Direction::Desc)
//!     .limit(20);
//! assert!(q.filter.is_clauses());
//! ```

use crate::document::Document;
use crate::error::CatalogError;
use crate::value::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Operators
// =============================================================================

/// Filter operators, spelled exactly as the store's query API accepts them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `array-contains`
    ArrayContains,
    /// `array-contains-any`
    ArrayContainsAny,
    /// `in`
    In,
    /// `not-in`
    NotIn,
}

impl FilterOp {
    /// All operators
    pub const ALL: [FilterOp; 10] = [
        FilterOp::Eq,
        FilterOp::Ne,
        FilterOp::Lt,
        FilterOp::Le,
        FilterOp::Gt,
        FilterOp::Ge,
        FilterOp::ArrayContains,
        FilterOp::ArrayContainsAny,
        FilterOp::In,
        FilterOp::NotIn,
    ];

    /// The store's spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
            FilterOp::ArrayContains => "array-contains",
            FilterOp::ArrayContainsAny => "array-contains-any",
            FilterOp::In => "in",
            FilterOp::NotIn => "not-in",
        }
    }

    /// Operators whose value is a list of candidates
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            FilterOp::In | FilterOp::NotIn | FilterOp::ArrayContainsAny
        )
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOp::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CatalogError::construction(format!("unsupported operator '{}'", s)))
    }
}

// =============================================================================
// Filters
// =============================================================================

/// One `(field, operator, value)` clause
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    /// Field path, passed to the store verbatim
    pub field: String,
    /// Operator
    pub op: FilterOp,
    /// Operand; references compare by path
    pub value: Value,
}

impl FilterClause {
    /// Create a clause
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        FilterClause {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Create a clause from the store's operator spelling
    pub fn parse(
        field: impl Into<String>,
        op: &str,
        value: impl Into<Value>,
    ) -> Result<Self, CatalogError> {
        Ok(FilterClause::new(field, op.parse()?, value))
    }
}

/// Which documents a descriptor selects
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Every document in the collection
    #[default]
    NoFilter,
    /// Do not query at all (a required input is not available yet)
    SkipQuery,
    /// Exactly one document, looked up directly
    ById(String),
    /// Documents matching all clauses
    ByClauses(Vec<FilterClause>),
}

impl Filter {
    /// Whether this is the `SkipQuery` sentinel
    pub fn is_skip(&self) -> bool {
        matches!(self, Filter::SkipQuery)
    }

    /// Whether this selects a single document by id
    pub fn is_by_id(&self) -> bool {
        matches!(self, Filter::ById(_))
    }

    /// Whether this is a clause list
    pub fn is_clauses(&self) -> bool {
        matches!(self, Filter::ByClauses(_))
    }
}

// =============================================================================
// Ordering and pagination
// =============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl Direction {
    /// The store's spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Sort order for one field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderBy {
    /// Field to sort on
    pub field: String,
    /// Direction
    pub direction: Direction,
}

/// Opaque pagination cursor: results start after the named document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    after_id: String,
}

impl Cursor {
    /// Start after the document with this id
    pub fn after(id: impl Into<String>) -> Self {
        Cursor {
            after_id: id.into(),
        }
    }

    /// Start after this document (typically the last one of a page)
    pub fn from_document(doc: &Document) -> Self {
        Cursor::after(doc.id.clone())
    }

    /// Id of the document to start after
    pub fn id(&self) -> &str {
        &self.after_id
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Declarative description of a read
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    /// Collection to read
    pub collection: String,
    /// Document selection
    pub filter: Filter,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Result ordering
    pub order_by: Option<OrderBy>,
    /// Keep the query live (push updates) instead of fetching once
    pub live: bool,
    /// Pagination cursor
    pub cursor: Option<Cursor>,
    /// Inline top-level reference fields
    pub expand_references: bool,
    /// Fields holding denormalized sub-objects whose own references are
    /// resolved one extra hop
    pub nested_fields: BTreeSet<String>,
}

impl QueryDescriptor {
    /// Live, expanding query over every document of `collection`
    pub fn new(collection: impl Into<String>) -> Self {
        QueryDescriptor {
            collection: collection.into(),
            filter: Filter::NoFilter,
            limit: None,
            order_by: None,
            live: true,
            cursor: None,
            expand_references: true,
            nested_fields: BTreeSet::new(),
        }
    }

    /// Replace the filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Select a single document by id
    pub fn by_id(self, id: impl Into<String>) -> Self {
        self.with_filter(Filter::ById(id.into()))
    }

    /// Mark the query as not runnable yet
    pub fn skip(self) -> Self {
        self.with_filter(Filter::SkipQuery)
    }

    /// Add a clause; any non-clause filter is replaced
    pub fn filter(
        mut self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl Into<Value>,
    ) -> Self {
        let clause = FilterClause::new(field, op, value);
        match &mut self.filter {
            Filter::ByClauses(clauses) => clauses.push(clause),
            other => *other = Filter::ByClauses(vec![clause]),
        }
        self
    }

    /// Sort results
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Cap the number of results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Start after a cursor
    pub fn start_after(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Live subscription (`true`) or one-shot fetch (`false`)
    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    /// Whether to inline reference fields
    pub fn expand_references(mut self, expand: bool) -> Self {
        self.expand_references = expand;
        self
    }

    /// Declare a nested-resolvable field
    pub fn nested_field(mut self, field: impl Into<String>) -> Self {
        self.nested_fields.insert(field.into());
        self
    }
}
