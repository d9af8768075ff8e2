//! Clause evaluation engine

use std::cmp::Ordering;
use std::sync::Arc;

use gf_core::{CellValue, FieldAccess};
use once_cell::sync::Lazy;
use tracing::{trace, warn};

use super::coerce::{coerce_pair, to_lower_text, Coerced};
use super::{FilterClause, FilterOperator, FilterSpec};
use crate::config::FilterConfig;
use crate::store::FilterFn;
use crate::FilterError;

static DEFAULT_FILTER: Lazy<ClauseFilter> = Lazy::new(ClauseFilter::default);

/// Evaluates filter clauses against rows
#[derive(Debug, Clone, Default)]
pub struct ClauseFilter {
    config: FilterConfig,
}

impl ClauseFilter {
    /// Create an engine with the given configuration
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Keep the rows that match every clause of `spec`.
    ///
    /// An empty or absent spec keeps every row. Order is preserved and the
    /// returned handles point at the same rows as the input.
    pub fn filter_rows<R>(
        &self,
        rows: &[Arc<R>],
        spec: Option<&FilterSpec>,
    ) -> Result<Vec<Arc<R>>, FilterError>
    where
        R: FieldAccess + ?Sized,
    {
        let spec = match spec {
            Some(spec) if !spec.is_empty() && !rows.is_empty() => spec,
            _ => return Ok(rows.to_vec()),
        };

        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if self.matches(Some(row.as_ref()), spec.clauses())? {
                kept.push(Arc::clone(row));
            }
        }
        Ok(kept)
    }

    /// Check a row against AND-ed clauses.
    ///
    /// A missing row never matches. Clauses without a field are skipped and
    /// evaluation stops at the first clause that fails.
    pub fn matches<R>(&self, row: Option<&R>, clauses: &[FilterClause]) -> Result<bool, FilterError>
    where
        R: FieldAccess + ?Sized,
    {
        let Some(row) = row else {
            return Ok(false);
        };

        for clause in clauses {
            if clause.is_blank() {
                trace!(operator = %clause.operator, "Skipping clause without field");
                continue;
            }
            if !self.clause_matches(row, clause)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn clause_matches<R>(&self, row: &R, clause: &FilterClause) -> Result<bool, FilterError>
    where
        R: FieldAccess + ?Sized,
    {
        let actual = row.field(&clause.field);
        let expected = Some(&clause.value);

        let matched = match &clause.operator {
            FilterOperator::IsNull => self.is_null(actual),
            FilterOperator::IsNotNull => !self.is_null(actual),
            FilterOperator::Contains => text_test(actual, expected, |a, e| a.contains(e)),
            FilterOperator::NotContains => !text_test(actual, expected, |a, e| a.contains(e)),
            FilterOperator::StartsWith => text_test(actual, expected, |a, e| a.starts_with(e)),
            FilterOperator::NotStartsWith => !text_test(actual, expected, |a, e| a.starts_with(e)),
            FilterOperator::Unrecognized(operator) => {
                warn!(field = %clause.field, operator = %operator, "Unrecognized filter operator");
                return Err(FilterError::InvalidOperator {
                    operator: operator.clone(),
                });
            }
            FilterOperator::Equals => {
                let (actual, expected) = self.coerce(actual, expected);
                actual == expected
            }
            FilterOperator::NotEquals => {
                let (actual, expected) = self.coerce(actual, expected);
                actual != expected
            }
            FilterOperator::LessThan => self.ordering(actual, expected) == Some(Ordering::Less),
            FilterOperator::LessThanOrEquals => matches!(
                self.ordering(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::GreaterThan => self.ordering(actual, expected) == Some(Ordering::Greater),
            FilterOperator::GreaterThanOrEquals => matches!(
                self.ordering(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        };
        Ok(matched)
    }

    fn coerce(&self, actual: Option<&CellValue>, expected: Option<&CellValue>) -> (Coerced, Coerced) {
        coerce_pair(actual, expected, &self.config.date_formats)
    }

    fn ordering(&self, actual: Option<&CellValue>, expected: Option<&CellValue>) -> Option<Ordering> {
        let (actual, expected) = self.coerce(actual, expected);
        actual.partial_compare(&expected)
    }

    fn is_null(&self, value: Option<&CellValue>) -> bool {
        match value {
            None | Some(CellValue::Null) => true,
            Some(CellValue::Text(text)) => self.config.null_config.is_null(text),
            Some(_) => false,
        }
    }

    /// Order two cells with the same priority the comparison operators use.
    ///
    /// Missing and null cells sort first.
    pub fn compare(&self, a: Option<&CellValue>, b: Option<&CellValue>) -> Ordering {
        let a = a.filter(|value| !value.is_null());
        let b = b.filter(|value| !value.is_null());
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(_), Some(_)) => {
                let (a, b) = coerce_pair(a, b, &self.config.date_formats);
                a.partial_compare(&b).unwrap_or(Ordering::Equal)
            }
        }
    }

    /// Turn this engine and a spec into a row store filter function
    pub fn into_filter_fn<R>(self, spec: FilterSpec) -> FilterFn<R>
    where
        R: FieldAccess + Send + Sync + 'static,
    {
        Box::new(move |rows: &[Arc<R>]| self.filter_rows(rows, Some(&spec)))
    }
}

/// Substring test on lower-cased text; an absent or empty actual value fails
fn text_test(
    actual: Option<&CellValue>,
    expected: Option<&CellValue>,
    test: impl Fn(&str, &str) -> bool,
) -> bool {
    match to_lower_text(actual) {
        Some(actual) if !actual.is_empty() => {
            let expected = to_lower_text(expected).unwrap_or_default();
            test(&actual, &expected)
        }
        _ => false,
    }
}

/// [`ClauseFilter::filter_rows`] with the default configuration
pub fn filter_rows<R>(rows: &[Arc<R>], spec: Option<&FilterSpec>) -> Result<Vec<Arc<R>>, FilterError>
where
    R: FieldAccess + ?Sized,
{
    DEFAULT_FILTER.filter_rows(rows, spec)
}

/// [`ClauseFilter::matches`] with the default configuration
pub fn matches<R>(row: Option<&R>, clauses: &[FilterClause]) -> Result<bool, FilterError>
where
    R: FieldAccess + ?Sized,
{
    DEFAULT_FILTER.matches(row, clauses)
}

/// [`ClauseFilter::compare`] with the default configuration
pub fn compare_values(a: Option<&CellValue>, b: Option<&CellValue>) -> Ordering {
    DEFAULT_FILTER.compare(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NullConfig;
    use gf_core::{row, Row};
    use proptest::prelude::*;

    fn clause(field: &str, operator: FilterOperator, value: impl Into<CellValue>) -> FilterClause {
        FilterClause::new(field, operator, value)
    }

    fn check(row: &Row, clause: FilterClause) -> bool {
        matches(Some(row), &[clause]).unwrap()
    }

    #[test]
    fn test_numeric_strings_compare_as_numbers() {
        let row = row! { "age" => "45" };
        assert!(check(&row, clause("age", FilterOperator::GreaterThan, "30")));
        assert!(check(&row, clause("age", FilterOperator::GreaterThan, "5")));
        assert!(check(&row, clause("age", FilterOperator::Equals, 45)));
        assert!(check(&row, clause("age", FilterOperator::Equals, "45.0")));
        assert!(!check(&row, clause("age", FilterOperator::LessThanOrEquals, "44.9")));

        let hex = row! { "a" => "0x10" };
        assert!(check(&hex, clause("a", FilterOperator::Equals, "16")));
        assert!(check(&hex, clause("a", FilterOperator::GreaterThan, 15)));
    }

    #[test]
    fn test_dates_compare_as_timestamps() {
        let row = row! { "start" => "2024-01-15 10:30:00" };
        assert!(check(&row, clause("start", FilterOperator::GreaterThan, "2024-01-15")));
        assert!(check(&row, clause("start", FilterOperator::LessThan, "2024-02-01T00:00:00Z")));
        assert!(check(&row, clause("start", FilterOperator::Equals, "2024-01-15T10:30:00Z")));
    }

    #[test]
    fn test_text_compares_case_insensitively() {
        let row = row! { "name" => "Smith" };
        assert!(check(&row, clause("name", FilterOperator::Equals, "SMITH")));
        assert!(check(&row, clause("name", FilterOperator::GreaterThan, "jones")));
        assert!(check(&row, clause("name", FilterOperator::NotEquals, "smithson")));
    }

    #[test]
    fn test_contains() {
        let present = row! { "name" => "John Smithson" };
        let missing = row! { "name" => None::<String> };
        let absent = row! { "other" => 1 };

        assert!(check(&present, clause("name", FilterOperator::Contains, "Smith")));
        assert!(!check(&missing, clause("name", FilterOperator::Contains, "Smith")));
        assert!(!check(&absent, clause("name", FilterOperator::Contains, "Smith")));
        assert!(!check(&present, clause("name", FilterOperator::NotContains, "smith")));
        assert!(check(&missing, clause("name", FilterOperator::NotContains, "Smith")));
        assert!(check(&row! { "name" => "" }, clause("name", FilterOperator::NotContains, "x")));
    }

    #[test]
    fn test_starts_with_on_missing_value() {
        let present = row! { "name" => "Smithson" };
        let missing = row! { "name" => None::<String> };

        assert!(check(&present, clause("name", FilterOperator::StartsWith, "smi")));
        assert!(!check(&present, clause("name", FilterOperator::StartsWith, "son")));
        assert!(check(&present, clause("name", FilterOperator::NotStartsWith, "son")));
        assert!(!check(&missing, clause("name", FilterOperator::StartsWith, "smi")));
        assert!(check(&missing, clause("name", FilterOperator::NotStartsWith, "smi")));
    }

    #[test]
    fn test_null_checks() {
        let row = row! { "a" => None::<i64>, "b" => "", "c" => " ", "d" => 0 };
        assert!(check(&row, clause("a", FilterOperator::IsNull, CellValue::Null)));
        assert!(check(&row, clause("b", FilterOperator::IsNull, CellValue::Null)));
        assert!(check(&row, clause("missing", FilterOperator::IsNull, CellValue::Null)));
        assert!(check(&row, clause("c", FilterOperator::IsNotNull, CellValue::Null)));
        assert!(check(&row, clause("d", FilterOperator::IsNotNull, CellValue::Null)));
    }

    #[test]
    fn test_configured_null_patterns() {
        let engine = ClauseFilter::new(
            FilterConfig::default().with_null_config(NullConfig::with_common_patterns()),
        );
        let row = row! { "a" => "N/A" };
        let clauses = [clause("a", FilterOperator::IsNull, CellValue::Null)];
        assert!(engine.matches(Some(&row), &clauses).unwrap());
        assert!(!matches(Some(&row), &clauses).unwrap());
    }

    #[test]
    fn test_missing_row_never_matches() {
        assert!(!matches::<Row>(None, &[]).unwrap());
    }

    #[test]
    fn test_blank_clause_is_skipped() {
        let row = row! { "a" => 1 };
        let clauses = [
            clause("", FilterOperator::Unrecognized("??".to_string()), 0),
            clause("a", FilterOperator::Equals, 1),
        ];
        assert!(matches(Some(&row), &clauses).unwrap());
    }

    #[test]
    fn test_and_short_circuits() {
        let row = row! { "a" => 1 };
        let clauses = [
            clause("a", FilterOperator::Equals, 2),
            clause("a", FilterOperator::Unrecognized("Between".to_string()), 0),
        ];
        assert!(!matches(Some(&row), &clauses).unwrap());
    }

    #[test]
    fn test_invalid_operator() {
        let rows = vec![Arc::new(row! { "a" => 1 })];
        let spec = FilterSpec::new().with_clause(clause("a", FilterOperator::from("Between"), 1));

        let err = filter_rows(&rows, Some(&spec)).unwrap_err();
        assert_eq!(err, FilterError::InvalidOperator { operator: "Between".to_string() });
    }

    #[test]
    fn test_filter_rows_keeps_identity_and_order() {
        let rows: Vec<Arc<Row>> = (0..6).map(|i| Arc::new(row! { "n" => i })).collect();
        let spec = FilterSpec::new().with_clause(clause("n", FilterOperator::GreaterThanOrEquals, 3));

        let kept = filter_rows(&rows, Some(&spec)).unwrap();
        assert_eq!(kept.len(), 3);
        for (kept, original) in kept.iter().zip(&rows[3..]) {
            assert!(Arc::ptr_eq(kept, original));
        }

        let all = filter_rows(&rows, None).unwrap();
        assert!(all.iter().zip(&rows).all(|(a, b)| Arc::ptr_eq(a, b)));
    }

    #[test]
    fn test_compare_values_sorts_nulls_first() {
        let mut values = vec![
            Some(CellValue::from("10")),
            None,
            Some(CellValue::from("9")),
            Some(CellValue::Null),
            Some(CellValue::from("100")),
        ];
        values.sort_by(|a, b| compare_values(a.as_ref(), b.as_ref()));
        assert_eq!(
            values,
            vec![
                None,
                Some(CellValue::Null),
                Some(CellValue::from("9")),
                Some(CellValue::from("10")),
                Some(CellValue::from("100")),
            ]
        );
    }

    fn cell_strategy() -> impl Strategy<Value = CellValue> {
        prop_oneof![
            Just(CellValue::Null),
            any::<bool>().prop_map(CellValue::Bool),
            (-1000i64..1000).prop_map(CellValue::from),
            "[a-c]{0,3}".prop_map(CellValue::Text),
            (-50i64..50).prop_map(|n| CellValue::Text(n.to_string())),
        ]
    }

    fn row_strategy() -> impl Strategy<Value = Row> {
        (cell_strategy(), cell_strategy()).prop_map(|(x, y)| row! { "x" => x, "y" => y })
    }

    fn spec_strategy() -> impl Strategy<Value = FilterSpec> {
        let field = prop_oneof![Just("x"), Just("y"), Just("")];
        let operator = proptest::sample::select(FilterOperator::ALL.to_vec());
        proptest::collection::vec((field, operator, cell_strategy()), 0..4).prop_map(|clauses| {
            clauses
                .into_iter()
                .map(|(field, operator, value)| FilterClause::new(field, operator, value))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_empty_spec_is_identity(rows in proptest::collection::vec(row_strategy(), 0..20)) {
            let rows: Vec<Arc<Row>> = rows.into_iter().map(Arc::new).collect();
            for spec in [None, Some(FilterSpec::new())] {
                let kept = filter_rows(&rows, spec.as_ref()).unwrap();
                prop_assert_eq!(kept.len(), rows.len());
                prop_assert!(kept.iter().zip(&rows).all(|(a, b)| Arc::ptr_eq(a, b)));
            }
        }

        #[test]
        fn prop_kept_rows_match_and_filtering_is_idempotent(
            rows in proptest::collection::vec(row_strategy(), 0..20),
            spec in spec_strategy(),
        ) {
            let rows: Vec<Arc<Row>> = rows.into_iter().map(Arc::new).collect();
            let kept = filter_rows(&rows, Some(&spec)).unwrap();

            prop_assert!(kept.len() <= rows.len());
            for row in &kept {
                prop_assert!(matches(Some(row.as_ref()), spec.clauses()).unwrap());
            }

            let again = filter_rows(&kept, Some(&spec)).unwrap();
            prop_assert_eq!(again.len(), kept.len());
            prop_assert!(again.iter().zip(&kept).all(|(a, b)| Arc::ptr_eq(a, b)));
        }
    }
}
