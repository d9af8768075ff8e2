//! Clause-based row filtering
//!
//! A [`FilterSpec`] is an ordered list of [`FilterClause`]s that are AND-ed
//! together. Each clause compares one field of a row against a value using a
//! [`FilterOperator`].

mod coerce;
mod engine;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use gf_core::CellValue;
use serde::{Deserialize, Serialize};

use crate::{DataError, FilterError};

pub use coerce::{coerce_pair, is_valid_date, is_valid_number, to_lower_text, to_number, to_timestamp, Coerced};
pub use engine::{compare_values, filter_rows, matches, ClauseFilter};

/// Comparison applied by a clause
///
/// Operators usually arrive by name from a UI or a JSON file. Names outside the
/// known set are kept as [`FilterOperator::Unrecognized`] and rejected when the
/// clause is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    IsNull,
    IsNotNull,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    Unrecognized(String),
}

impl FilterOperator {
    /// Every recognized operator
    pub const ALL: [FilterOperator; 12] = [
        FilterOperator::Equals,
        FilterOperator::NotEquals,
        FilterOperator::LessThan,
        FilterOperator::LessThanOrEquals,
        FilterOperator::GreaterThan,
        FilterOperator::GreaterThanOrEquals,
        FilterOperator::IsNull,
        FilterOperator::IsNotNull,
        FilterOperator::Contains,
        FilterOperator::NotContains,
        FilterOperator::StartsWith,
        FilterOperator::NotStartsWith,
    ];

    /// Resolve an operator name.
    ///
    /// Accepts the variant name, snake case and the symbolic comparison forms.
    pub fn parse(name: &str) -> FilterOperator {
        let trimmed = name.trim();
        match trimmed {
            "=" | "==" => return FilterOperator::Equals,
            "!=" | "<>" => return FilterOperator::NotEquals,
            "<" => return FilterOperator::LessThan,
            "<=" => return FilterOperator::LessThanOrEquals,
            ">" => return FilterOperator::GreaterThan,
            ">=" => return FilterOperator::GreaterThanOrEquals,
            _ => {}
        }

        let normalized: String = trimmed
            .chars()
            .filter(|c| *c != '_' && *c != ' ')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "equals" => FilterOperator::Equals,
            "notequals" => FilterOperator::NotEquals,
            "lessthan" => FilterOperator::LessThan,
            "lessthanorequals" => FilterOperator::LessThanOrEquals,
            "greaterthan" => FilterOperator::GreaterThan,
            "greaterthanorequals" => FilterOperator::GreaterThanOrEquals,
            "isnull" => FilterOperator::IsNull,
            "isnotnull" => FilterOperator::IsNotNull,
            "contains" => FilterOperator::Contains,
            "notcontains" => FilterOperator::NotContains,
            "startswith" => FilterOperator::StartsWith,
            "notstartswith" => FilterOperator::NotStartsWith,
            _ => FilterOperator::Unrecognized(name.to_string()),
        }
    }

    /// Canonical name
    pub fn as_str(&self) -> &str {
        match self {
            FilterOperator::Equals => "Equals",
            FilterOperator::NotEquals => "NotEquals",
            FilterOperator::LessThan => "LessThan",
            FilterOperator::LessThanOrEquals => "LessThanOrEquals",
            FilterOperator::GreaterThan => "GreaterThan",
            FilterOperator::GreaterThanOrEquals => "GreaterThanOrEquals",
            FilterOperator::IsNull => "IsNull",
            FilterOperator::IsNotNull => "IsNotNull",
            FilterOperator::Contains => "Contains",
            FilterOperator::NotContains => "NotContains",
            FilterOperator::StartsWith => "StartsWith",
            FilterOperator::NotStartsWith => "NotStartsWith",
            FilterOperator::Unrecognized(name) => name,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FilterOperator {
    fn from(name: &str) -> Self {
        FilterOperator::parse(name)
    }
}

impl From<String> for FilterOperator {
    fn from(name: String) -> Self {
        FilterOperator::parse(&name)
    }
}

impl From<FilterOperator> for String {
    fn from(operator: FilterOperator) -> Self {
        operator.as_str().to_string()
    }
}

/// Strict parsing, for callers that want to reject unknown names up front
impl FromStr for FilterOperator {
    type Err = FilterError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match FilterOperator::parse(name) {
            FilterOperator::Unrecognized(operator) => Err(FilterError::InvalidOperator { operator }),
            operator => Ok(operator),
        }
    }
}

/// A single field/operator/value condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: CellValue,
}

impl FilterClause {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<FilterOperator>,
        value: impl Into<CellValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// A clause with no field never constrains a row
    pub fn is_blank(&self) -> bool {
        self.field.is_empty()
    }
}

/// Ordered, AND-ed list of clauses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    clauses: Vec<FilterClause>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause
    pub fn with_clause(mut self, clause: FilterClause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn push(&mut self, clause: FilterClause) {
        self.clauses.push(clause);
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Parse a JSON array of clauses
    pub fn from_json_str(json: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON filter file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}

impl From<Vec<FilterClause>> for FilterSpec {
    fn from(clauses: Vec<FilterClause>) -> Self {
        Self { clauses }
    }
}

impl FromIterator<FilterClause> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = FilterClause>>(iter: I) -> Self {
        Self {
            clauses: iter.into_iter().collect(),
        }
    }
}
