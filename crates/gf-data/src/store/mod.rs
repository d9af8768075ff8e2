//! Filterable row store backing a data grid
//!
//! The store keeps every pushed row and a visible subsequence produced by an
//! injected filter function. Grids poll `get_length`/`get_item` after the
//! store's change notifications.

use std::fmt;
use std::sync::Arc;

use gf_core::{Emitter, FieldAccess, SubscriptionId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::compare_values;
use crate::FilterError;

/// Filter function installed on a store; receives every row, returns the visible ones
pub type FilterFn<T> = Box<dyn Fn(&[Arc<T>]) -> Result<Vec<Arc<T>>, FilterError> + Send + Sync>;

/// Sort direction for [`SortArgs`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Column sort request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortArgs {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortArgs {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Ordered rows with a filtered view and change notifications
pub struct FilterableRowStore<T> {
    all_rows: Vec<Arc<T>>,
    visible_rows: Vec<Arc<T>>,
    filter_fn: Option<FilterFn<T>>,
    is_filtered: bool,

    row_count_changed: Emitter<usize>,
    filter_state_changed: Emitter<()>,
    sort_completed: Emitter<SortArgs>,
}

impl<T: 'static> FilterableRowStore<T> {
    /// Create a store over an initial set of rows
    pub fn new<I>(rows: I, filter_fn: Option<FilterFn<T>>) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<T>>,
    {
        let all_rows: Vec<Arc<T>> = rows.into_iter().map(Into::into).collect();
        Self {
            visible_rows: all_rows.clone(),
            all_rows,
            filter_fn,
            is_filtered: false,
            row_count_changed: Emitter::new(),
            filter_state_changed: Emitter::new(),
            sort_completed: Emitter::new(),
        }
    }

    /// Replace the filter function; takes effect on the next `filter` or `push`
    pub fn set_filter_fn(&mut self, filter_fn: Option<FilterFn<T>>) {
        self.filter_fn = filter_fn;
    }

    fn apply_filter(&self, rows: &[Arc<T>]) -> Result<Vec<Arc<T>>, FilterError> {
        match &self.filter_fn {
            Some(filter_fn) => filter_fn(rows),
            None => Ok(rows.to_vec()),
        }
    }

    /// Append rows.
    ///
    /// Unfiltered, the visible rows become every row in push order. While filtered, the filter runs again over every row and the new
    /// visible length is announced. A failing filter leaves the store untouched.
    pub fn push<I>(&mut self, rows: I) -> Result<(), FilterError>
    where
        I: IntoIterator,
        I::Item: Into<Arc<T>>,
    {
        let new_rows: Vec<Arc<T>> = rows.into_iter().map(Into::into).collect();

        if !self.is_filtered {
            self.all_rows.extend(new_rows);
            self.visible_rows = self.all_rows.clone();
            debug!(total = self.all_rows.len(), "Pushed rows");
            return Ok(());
        }

        let mut all_rows = Vec::with_capacity(self.all_rows.len() + new_rows.len());
        all_rows.extend(self.all_rows.iter().cloned());
        all_rows.extend(new_rows);
        let visible_rows = self.apply_filter(&all_rows)?;

        self.all_rows = all_rows;
        self.visible_rows = visible_rows;
        debug!(
            total = self.all_rows.len(),
            visible = self.visible_rows.len(),
            "Pushed rows into filtered store"
        );
        self.row_count_changed.fire(&self.visible_rows.len());
        Ok(())
    }

    /// Apply the filter function and mark the store filtered
    pub fn filter(&mut self) -> Result<(), FilterError> {
        let visible_rows = self.apply_filter(&self.all_rows)?;
        self.visible_rows = visible_rows;
        self.is_filtered = true;
        debug!(
            total = self.all_rows.len(),
            visible = self.visible_rows.len(),
            "Filter applied"
        );
        self.filter_state_changed.fire(&());
        Ok(())
    }

    /// Show every row again. Notifies on every call, even when not filtered.
    pub fn clear_filter(&mut self) {
        self.visible_rows = self.all_rows.clone();
        self.is_filtered = false;
        debug!(total = self.all_rows.len(), "Filter cleared");
        self.filter_state_changed.fire(&());
    }

    /// Drop every row; the filter state is kept
    pub fn clear(&mut self) {
        self.all_rows.clear();
        self.visible_rows.clear();
        debug!("Store cleared");
        self.row_count_changed.fire(&0);
    }

    /// Number of visible rows
    pub fn get_length(&self) -> usize {
        self.visible_rows.len()
    }

    /// Number of rows regardless of filtering
    pub fn get_length_non_filtered(&self) -> usize {
        self.all_rows.len()
    }

    /// Visible row at `index`
    pub fn get_item(&self, index: usize) -> Option<&Arc<T>> {
        self.visible_rows.get(index)
    }

    /// Visible rows in display order
    pub fn get_items(&self) -> &[Arc<T>] {
        &self.visible_rows
    }

    pub fn is_filtered(&self) -> bool {
        self.is_filtered
    }

    /// Subscribe to visible row count changes
    pub fn on_row_count_change<F>(&self, handler: F) -> SubscriptionId
    where
        F: FnMut(&usize) + Send + 'static,
    {
        self.row_count_changed.subscribe_fn(handler)
    }

    /// Subscribe to filter applied/cleared notifications
    pub fn on_filter_state_change<F>(&self, mut handler: F) -> SubscriptionId
    where
        F: FnMut() + Send + 'static,
    {
        self.filter_state_changed.subscribe_fn(move |_: &()| handler())
    }

    /// Subscribe to sort completion
    pub fn on_sort_complete<F>(&self, handler: F) -> SubscriptionId
    where
        F: FnMut(&SortArgs) + Send + 'static,
    {
        self.sort_completed.subscribe_fn(handler)
    }

    /// Remove a subscription made on any of this store's events
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.row_count_changed.unsubscribe(id)
            || self.filter_state_changed.unsubscribe(id)
            || self.sort_completed.unsubscribe(id)
    }
}

impl<T: FieldAccess + 'static> FilterableRowStore<T> {
    /// Stable sort of the visible rows by one field.
    ///
    /// Only the visible order changes; a later push, re-filter or
    /// `clear_filter` starts again from push order.
    pub fn sort(&mut self, args: SortArgs) {
        let field = args.field.as_str();
        let descending = args.direction == SortDirection::Descending;
        self.visible_rows.sort_by(|a, b| {
            let ordering = compare_values(a.field(field), b.field(field));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        debug!(field, direction = ?args.direction, "Sorted visible rows");
        self.sort_completed.fire(&args);
    }
}

impl<T: 'static> Default for FilterableRowStore<T> {
    fn default() -> Self {
        Self::new(Vec::<Arc<T>>::new(), None)
    }
}

impl<T> fmt::Debug for FilterableRowStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterableRowStore")
            .field("all_rows", &self.all_rows.len())
            .field("visible_rows", &self.visible_rows.len())
            .field("has_filter_fn", &self.filter_fn.is_some())
            .field("is_filtered", &self.is_filtered)
            .finish()
    }
}
