//! Descriptor to native query translation
//!
//! Validates a [`QueryDescriptor`] against the store's query vocabulary and
//! turns it into a [`QueryPlan`]: skip, direct lookup, or a [`NativeQuery`].
//! Every rejection here is a construction error and is never retried.

use super::ListenTarget;
use catalog_core::{
    CatalogError, CatalogResult, Filter, FilterClause, OrderBy, QueryDescriptor, Reference, Value,
};

/// Store-side limits applied during translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Maximum number of candidates for `in`, `not-in` and `array-contains-any`
    pub max_disjunction_values: usize,
    /// Limit applied when a descriptor sets none
    pub default_limit: Option<usize>,
}

impl Default for QueryLimits {
    fn default() -> Self {
        QueryLimits {
            max_disjunction_values: 10,
            default_limit: None,
        }
    }
}

/// Query in the store's own terms
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuery {
    /// Collection scanned
    pub collection: String,
    /// Clauses, all of which must match
    pub clauses: Vec<FilterClause>,
    /// Ordering; by id when absent
    pub order_by: Option<OrderBy>,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Start after the document with this id
    pub start_after: Option<String>,
}

impl NativeQuery {
    /// Unfiltered scan of a collection
    pub fn collection(name: impl Into<String>) -> Self {
        NativeQuery {
            collection: name.into(),
            clauses: Vec::new(),
            order_by: None,
            limit: None,
            start_after: None,
        }
    }
}

/// How a descriptor is executed
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    /// Do not contact the store
    Skip,
    /// Direct document lookup
    Lookup(Reference),
    /// Collection query
    Scan(NativeQuery),
}

impl QueryPlan {
    /// Translate a descriptor
    pub fn from_descriptor(
        descriptor: &QueryDescriptor,
        limits: &QueryLimits,
    ) -> CatalogResult<QueryPlan> {
        let clauses = match &descriptor.filter {
            Filter::SkipQuery => return Ok(QueryPlan::Skip),
            Filter::ById(id) => {
                validate_segment("collection name", &descriptor.collection)?;
                validate_segment("document id", id)?;
                return Ok(QueryPlan::Lookup(Reference::new(
                    descriptor.collection.clone(),
                    id.clone(),
                )));
            }
            Filter::NoFilter => Vec::new(),
            Filter::ByClauses(clauses) => clauses
                .iter()
                .map(|clause| translate_clause(clause, limits))
                .collect::<CatalogResult<Vec<_>>>()?,
        };
        validate_segment("collection name", &descriptor.collection)?;

        if descriptor.limit == Some(0) {
            return Err(CatalogError::construction("limit must be greater than zero"));
        }
        if let Some(order) = &descriptor.order_by {
            if order.field.is_empty() {
                return Err(CatalogError::construction("order_by field must not be empty"));
            }
        }

        Ok(QueryPlan::Scan(NativeQuery {
            collection: descriptor.collection.clone(),
            clauses,
            order_by: descriptor.order_by.clone(),
            limit: descriptor.limit.or(limits.default_limit),
            start_after: descriptor.cursor.as_ref().map(|c| c.id().to_string()),
        }))
    }

    /// Listener target, `None` for [`QueryPlan::Skip`]
    pub fn target(&self) -> Option<ListenTarget> {
        match self {
            QueryPlan::Skip => None,
            QueryPlan::Lookup(reference) => Some(ListenTarget::Document(reference.clone())),
            QueryPlan::Scan(query) => Some(ListenTarget::Query(query.clone())),
        }
    }
}

fn validate_segment(what: &str, segment: &str) -> CatalogResult<()> {
    if segment.is_empty() {
        return Err(CatalogError::construction(format!("{} must not be empty", what)));
    }
    if segment.contains('/') {
        return Err(CatalogError::construction(format!(
            "{} '{}' must not contain '/'",
            what, segment
        )));
    }
    Ok(())
}

fn translate_clause(clause: &FilterClause, limits: &QueryLimits) -> CatalogResult<FilterClause> {
    if clause.field.is_empty() {
        return Err(CatalogError::construction("filter field must not be empty"));
    }
    if clause.op.takes_list() {
        let candidates = match &clause.value {
            Value::Array(items) => items,
            other => {
                return Err(CatalogError::construction(format!(
                    "operator '{}' on '{}' requires an array, got {}",
                    clause.op,
                    clause.field,
                    other.type_name()
                )))
            }
        };
        if candidates.is_empty() {
            return Err(CatalogError::construction(format!(
                "operator '{}' on '{}' requires a non-empty array",
                clause.op, clause.field
            )));
        }
        if candidates.len() > limits.max_disjunction_values {
            return Err(CatalogError::construction(format!(
                "operator '{}' on '{}' accepts at most {} values, got {}",
                clause.op,
                clause.field,
                limits.max_disjunction_values,
                candidates.len()
            )));
        }
    }
    Ok(clause.clone())
}
