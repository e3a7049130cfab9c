//! Grid view configuration

use super::SortStatus;

/// Page sizes offered by default.
pub const PAGE_SIZES: [usize; 5] = [10, 15, 20, 50, 100];

/// Page size used until the user picks another one.
pub const DEFAULT_PAGE_SIZE: usize = 15;

/// Settings key the chosen page size is persisted under.
pub const PAGE_SIZE_KEY: &str = "mantine-table-page-size";

/// Configuration of a [`GridView`](super::GridView).
///
/// # Example
///
/// ```
/// use datagrid_lib::grid::{GridConfig, SortStatus};
///
/// let config = GridConfig::default()
///     .with_default_sort(SortStatus::asc("name"))
///     .with_selection(false);
/// ```
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Page sizes the user can choose from.
    ///
    /// Default: `[10, 15, 20, 50, 100]`
    pub page_sizes: Vec<usize>,

    /// Page size before the user picks one.
    ///
    /// Default: 15
    pub default_page_size: usize,

    /// Key the page size is persisted under.
    pub page_size_key: String,

    /// Split the sorted list into pages. When off, every record is visible.
    pub pagination: bool,

    /// Allow row selection.
    pub selection: bool,

    /// Initial sort. Defaults to the first list field, descending.
    pub default_sort: Option<SortStatus>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_sizes: PAGE_SIZES.to_vec(),
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_key: PAGE_SIZE_KEY.to_string(),
            pagination: true,
            selection: true,
            default_sort: None,
        }
    }
}

impl GridConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page sizes on offer.
    pub fn with_page_sizes(mut self, sizes: impl Into<Vec<usize>>) -> Self {
        self.page_sizes = sizes.into();
        self
    }

    /// Sets the page size used before the user picks one.
    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    /// Sets the key the page size is persisted under.
    pub fn with_page_size_key(mut self, key: impl Into<String>) -> Self {
        self.page_size_key = key.into();
        self
    }

    /// Turns pagination on or off.
    pub fn with_pagination(mut self, enabled: bool) -> Self {
        self.pagination = enabled;
        self
    }

    /// Turns row selection on or off.
    pub fn with_selection(mut self, enabled: bool) -> Self {
        self.selection = enabled;
        self
    }

    /// Sets the initial sort.
    pub fn with_default_sort(mut self, sort: SortStatus) -> Self {
        self.default_sort = Some(sort);
        self
    }
}
