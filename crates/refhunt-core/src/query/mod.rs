/// Read-only queries over an [`AnalysisResult`].
///
/// Filters are AND-combined in a fixed order (path substring, exact type,
/// addressable, zero references, warnings), the survivors are sorted, and
/// an optional page window is cut from the sorted list. Queries never
/// mutate the result and never re-derive its `type_counts`.
pub mod export;

use crate::model::{AnalysisMode, AnalysisResult, AssetRecord};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Field a query is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    /// Type name, lexical.
    Type,
    /// Path, lexical.
    #[default]
    Path,
    /// Size in bytes, numeric.
    Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// One of the six sort orders.
///
/// Every order is total: ties on the sort field are broken by path, which
/// is unique, so descending is always the exact reverse of ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SortMode {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortMode {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Selecting the current field again flips direction; selecting a
    /// different field starts ascending.
    pub fn toggled(self, field: SortField) -> Self {
        if self.field == field {
            Self::new(field, self.direction.reversed())
        } else {
            Self::new(field, SortDirection::Ascending)
        }
    }

    pub fn compare(&self, a: &AssetRecord, b: &AssetRecord) -> Ordering {
        let primary = match self.field {
            SortField::Type => a.type_name.cmp(&b.type_name),
            SortField::Path => Ordering::Equal,
            SortField::Size => a.size_bytes.cmp(&b.size_bytes),
        };
        let ordering = primary.then_with(|| a.path.cmp(&b.path));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Addressable filter. `All` shows everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AddressableFilter {
    #[default]
    All,
    Only,
    Exclude,
}

impl AddressableFilter {
    fn accepts(self, is_addressable: bool) -> bool {
        match self {
            Self::All => true,
            Self::Only => is_addressable,
            Self::Exclude => !is_addressable,
        }
    }
}

/// Caller-owned query parameters. Cheap to clone, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    /// Keep paths containing this substring. Empty means no filter.
    pub path_filter: String,
    /// Keep only this exact type name.
    pub type_filter: Option<String>,
    pub addressable: AddressableFilter,
    /// Keep only zero-reference assets. Ignored for unreferenced-only
    /// results, where it would be a no-op anyway.
    pub zero_refs_only: bool,
    pub warnings_only: bool,
    pub sort: SortMode,
    /// 0-based page index; `None` shows everything.
    pub page: Option<usize>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_sort(&mut self, field: SortField) {
        self.sort = self.sort.toggled(field);
    }

    /// Pull an out-of-range page back onto the last page, or to "show all"
    /// when there are no pages at all.
    pub fn clamp_page(&mut self, total: usize, page_size: usize) {
        if let Some(page) = self.page {
            let pages = page_count(total, page_size);
            self.page = if pages == 0 {
                None
            } else {
                Some(page.min(pages - 1))
            };
        }
    }

    /// Does `record` pass every filter?
    pub fn matches(&self, record: &AssetRecord, mode: AnalysisMode) -> bool {
        if !self.path_filter.is_empty() && !record.path.contains(self.path_filter.as_str()) {
            return false;
        }
        if let Some(type_name) = &self.type_filter {
            if record.type_name.as_str() != type_name.as_str() {
                return false;
            }
        }
        if !self.addressable.accepts(record.is_addressable) {
            return false;
        }
        if self.zero_refs_only && mode == AnalysisMode::AllAssets && record.references_count != 0 {
            return false;
        }
        if self.warnings_only && !record.has_warning() {
            return false;
        }
        true
    }
}

/// One page of query output.
#[derive(Debug, Clone)]
pub struct QueryPage<'a> {
    /// Records in the requested window, sorted.
    pub items: Vec<&'a AssetRecord>,
    /// Number of records that passed the filters, across all pages.
    pub total_filtered: usize,
    /// Page count for the filtered set at the page size used.
    pub page_count: usize,
}

impl QueryPage<'_> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Number of pages needed for `total` items. A zero page size is treated
/// as one item per page.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Every record passing the filters, in sort order.
pub fn filtered<'a>(result: &'a AnalysisResult, state: &QueryState) -> Vec<&'a AssetRecord> {
    let mode = result.mode();
    let mut items: Vec<&AssetRecord> = result
        .assets()
        .iter()
        .filter(|record| state.matches(record, mode))
        .collect();
    items.sort_by(|a, b| state.sort.compare(a, b));
    items
}

/// Run a query. Page `k` holds the filtered items at offsets
/// `[k * page_size, min((k + 1) * page_size, total))`; a page past the end
/// is empty.
pub fn run_query<'a>(
    result: &'a AnalysisResult,
    state: &QueryState,
    page_size: usize,
) -> QueryPage<'a> {
    let mut items = filtered(result, state);
    let total_filtered = items.len();
    let page_size = page_size.max(1);

    if let Some(page) = state.page {
        let start = page.saturating_mul(page_size).min(total_filtered);
        let end = start.saturating_add(page_size).min(total_filtered);
        items.truncate(end);
        items.drain(..start);
    }

    QueryPage {
        items,
        total_filtered,
        page_count: page_count(total_filtered, page_size),
    }
}

/// Filtered records that are safe to delete: zero references and not
/// addressable.
pub fn deletion_candidates<'a>(
    result: &'a AnalysisResult,
    state: &QueryState,
) -> Vec<&'a AssetRecord> {
    filtered(result, state)
        .into_iter()
        .filter(|record| !record.is_addressable && record.references_count == 0)
        .collect()
}

/// Type counts of the full result, for grouping. Never filtered.
pub fn type_counts(result: &AnalysisResult) -> &BTreeMap<String, usize> {
    result.type_counts()
}
