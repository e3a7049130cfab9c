//! Paginated view over one collection

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use super::ColumnTypeCache;
use super::Filter;
use super::GridConfig;
use super::Pagination;
use super::SortStatus;
use super::filter;
use super::sort::sort_records;
use crate::api::QueryParams;
use crate::api::QueryResolver;
use crate::api::Tab;
use crate::api::TabSelection;
use crate::error::Error;
use crate::model::EntityId;
use crate::model::FieldDescriptor;
use crate::model::FieldView;
use crate::model::ID_FIELD;
use crate::model::Record;
use crate::model::form::FormState;
use crate::model::form::Submission;
use crate::response::Response;
use crate::settings::PersistentValue;
use crate::settings::SettingsProvider;
use crate::store::CacheKey;
use crate::store::CollectionStore;

type TabCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Load state of a view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A fetch is pending.
    Loading,
    /// The last fetch succeeded.
    Ready,
    /// The last fetch failed with this message. Previous rows stay available.
    Error(String),
}

/// Fetch activity of a view, readable while the view itself is borrowed by
/// the pending fetch.
#[derive(Debug, Clone, Default)]
pub struct LoadActivity {
    loading: Arc<AtomicBool>,
    refetching: Arc<AtomicBool>,
}

impl LoadActivity {
    /// Returns `true` while any fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Returns `true` while a manual refetch is in flight.
    pub fn is_refetching(&self) -> bool {
        self.refetching.load(Ordering::Acquire)
    }

    fn begin(&self, refetch: bool) {
        self.refetching.store(refetch, Ordering::Release);
        self.loading.store(true, Ordering::Release);
    }

    fn finish(&self) {
        self.loading.store(false, Ordering::Release);
        self.refetching.store(false, Ordering::Release);
    }
}

/// What happened after a form was submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The form moved to its next step. The record now exists on the server.
    NextStep(Record),
    /// The last step was submitted.
    Done(Record),
}

impl SubmitOutcome {
    /// The record returned by the backend.
    pub fn record(&self) -> &Record {
        match self {
            Self::NextStep(record) | Self::Done(record) => record,
        }
    }
}

/// Result of deleting the selected rows.
#[derive(Debug, Default)]
pub struct DeleteSummary {
    /// Ids that were deleted.
    pub deleted: Vec<EntityId>,
    /// Ids whose delete failed, with the error.
    pub failed: Vec<(EntityId, Error)>,
}

impl DeleteSummary {
    /// Returns `true` if every delete succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The rows a grid shows, and the state that decides them.
///
/// Every input change re-runs the whole pipeline: fetched list, filters,
/// sort, page window. Selection is kept against the sorted list, so rows that
/// disappear from it drop out of the selection.
///
/// # Example
///
/// ```ignore
/// let mut view = GridView::new(store, fields, GridConfig::default(), settings)
///     .await
///     .with_tabs(vec![Tab::new("all", "All"), Tab::new("admin", "Admins")], TabSelection::first());
///
/// view.load().await?;
/// for record in view.visible() {
///     println!("{:?}", record.get("name"));
/// }
///
/// view.select_tab("admin");
/// view.load().await?;
/// ```
pub struct GridView {
    store: CollectionStore,
    scoped: CollectionStore,
    resolver: QueryResolver,
    fields: Vec<FieldDescriptor>,
    config: GridConfig,
    types: Arc<ColumnTypeCache>,
    filters: Vec<Filter>,
    connected_keys: Vec<CacheKey>,
    active_tab: Option<String>,
    on_tab_change: Option<TabCallback>,
    state: ViewState,
    activity: LoadActivity,
    raw: Vec<Record>,
    sorted: Vec<Record>,
    sort: SortStatus,
    page: usize,
    page_size: PersistentValue<usize>,
    selection: Vec<EntityId>,
}

impl GridView {
    /// Creates a view over `store`, reading the persisted page size from `settings`.
    ///
    /// Nothing is fetched until [`load`](Self::load) is called.
    pub async fn new(
        store: CollectionStore,
        fields: Vec<FieldDescriptor>,
        config: GridConfig,
        settings: SettingsProvider,
    ) -> Self {
        let sort = config.default_sort.clone().unwrap_or_else(|| {
            let first = fields
                .iter()
                .find(|f| f.list)
                .or(fields.first())
                .map(|f| f.id.clone())
                .unwrap_or_else(|| ID_FIELD.to_string());
            SortStatus::desc(first)
        });

        let page_size = PersistentValue::load(settings, &config.page_size_key, config.default_page_size).await;
        let resolver = QueryResolver::new(store.path(), store.base_key().clone());

        let mut view = Self {
            scoped: store.clone(),
            store,
            resolver,
            fields,
            config,
            types: Arc::new(ColumnTypeCache::new()),
            filters: Vec::new(),
            connected_keys: Vec::new(),
            active_tab: None,
            on_tab_change: None,
            state: ViewState::Idle,
            activity: LoadActivity::default(),
            raw: Vec::new(),
            sorted: Vec::new(),
            sort,
            page: 1,
            page_size,
            selection: Vec::new(),
        };
        view.rescope();
        view
    }

    /// Sets the base query parameters sent with every list request.
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.resolver = self.resolver.with_params(params);
        self.rescope();
        self
    }

    /// Declares the tabs and who owns the active one.
    pub fn with_tabs(mut self, tabs: Vec<Tab>, selection: TabSelection) -> Self {
        self.resolver = self.resolver.with_tabs(tabs);
        self.active_tab = self.resolver.initial_tab(&selection);
        self.rescope();
        self
    }

    /// Sets the initial filters.
    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    /// Cache keys to invalidate after every successful list fetch.
    pub fn with_connected_keys(mut self, keys: Vec<CacheKey>) -> Self {
        self.connected_keys = keys;
        self
    }

    /// Shares a column type cache with other views.
    pub fn with_type_cache(mut self, types: Arc<ColumnTypeCache>) -> Self {
        self.types = types;
        self
    }

    /// Called with the new tab id whenever the active tab changes.
    pub fn on_tab_change(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_tab_change = Some(Box::new(callback));
        self
    }

    fn rescope(&mut self) {
        let query = self.resolver.resolve(self.active_tab.as_deref());
        self.scoped = self.store.scoped(&query);
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetches the list (from cache while fresh) and re-runs the pipeline.
    ///
    /// On failure the previous rows stay in place and the state carries the
    /// error message.
    pub async fn load(&mut self) -> Result<(), Error> {
        self.state = ViewState::Loading;
        self.activity.begin(false);
        let result = self.scoped.list_all().await;
        self.activity.finish();
        self.apply_fetch(result)
    }

    /// Fetches the list from the backend, bypassing the cache.
    pub async fn refetch(&mut self) -> Result<(), Error> {
        self.state = ViewState::Loading;
        self.activity.begin(true);
        let result = self.scoped.refetch().await;
        self.activity.finish();
        self.apply_fetch(result)
    }

    fn apply_fetch(&mut self, result: Result<Response<Vec<Record>>, Error>) -> Result<(), Error> {
        match result {
            Ok(response) => {
                self.raw = response.into_inner();
                for key in &self.connected_keys {
                    self.store.cache().invalidate(key);
                }
                self.recompute();
                self.state = ViewState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = ViewState::Error(e.message());
                Err(e)
            }
        }
    }

    async fn reload(&mut self) {
        if let Err(e) = self.load().await {
            log::warn!("Reload of {} failed: {}", self.scoped.key(), e);
        }
    }

    /// Re-reads the cached list without fetching, e.g. after another handle
    /// mutated the collection.
    pub fn sync_from_cache(&mut self) {
        if let Some(records) = self.scoped.cached() {
            self.raw = records;
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        let filtered = filter::apply(&self.raw, &self.filters);
        self.sorted = sort_records(&filtered, &self.sort, &self.types);

        let sorted = &self.sorted;
        self.selection.retain(|id| sorted.iter().any(|r| r.has_id(id)));

        self.page = self.page.clamp(1, self.page_count());
    }

    /// Current load state.
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Returns `true` while a fetch is pending.
    pub fn is_loading(&self) -> bool {
        self.state == ViewState::Loading
    }

    /// Returns `true` while a manual refetch is pending.
    pub fn is_refetching(&self) -> bool {
        self.activity.is_refetching()
    }

    /// Handle on the fetch activity that stays readable during a fetch.
    pub fn activity(&self) -> LoadActivity {
        self.activity.clone()
    }

    /// Message of the last failed fetch.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }

    // =========================================================================
    // Rows
    // =========================================================================

    /// The rows on the current page (all rows when pagination is off).
    pub fn visible(&self) -> &[Record] {
        if self.config.pagination {
            self.pagination().slice(&self.sorted)
        } else {
            &self.sorted
        }
    }

    /// Filtered and sorted rows, before pagination.
    pub fn sorted_records(&self) -> &[Record] {
        &self.sorted
    }

    /// The list as fetched.
    pub fn records(&self) -> &[Record] {
        &self.raw
    }

    /// Number of rows after filtering.
    pub fn total_records(&self) -> usize {
        self.sorted.len()
    }

    /// Field descriptors of the grid.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The store of the active tab.
    pub fn store(&self) -> &CollectionStore {
        &self.scoped
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    fn pagination(&self) -> Pagination {
        Pagination::new(*self.page_size.get()).at(self.page)
    }

    /// Current page, starting at 1.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Rows per page.
    pub fn page_size(&self) -> usize {
        *self.page_size.get()
    }

    /// Page sizes on offer.
    pub fn page_sizes(&self) -> &[usize] {
        &self.config.page_sizes
    }

    /// Number of pages. An empty grid has one page.
    pub fn page_count(&self) -> usize {
        self.pagination().page_count(self.sorted.len())
    }

    /// Moves to a page, clamped to the existing pages.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count());
    }

    /// Changes and persists the page size, and goes back to page 1.
    pub async fn set_page_size(&mut self, size: usize) -> Result<(), Error> {
        self.page_size.set(size.max(1)).await?;
        self.page = 1;
        Ok(())
    }

    // =========================================================================
    // Sorting and filtering
    // =========================================================================

    /// Current sort.
    pub fn sort(&self) -> &SortStatus {
        &self.sort
    }

    /// Changes the sort. Page, page size and selection are kept.
    pub fn set_sort(&mut self, sort: SortStatus) {
        self.sort = sort;
        self.recompute();
    }

    /// Current filters.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Replaces the filters and clears the selection.
    pub fn set_filters(&mut self, filters: Vec<Filter>) {
        self.filters = filters;
        self.selection.clear();
        self.recompute();
    }

    // =========================================================================
    // Tabs
    // =========================================================================

    /// Declared tabs.
    pub fn tabs(&self) -> &[Tab] {
        self.resolver.tabs()
    }

    /// The active tab.
    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    /// Switches to another tab.
    ///
    /// Clears the selection and goes back to page 1. Sort and page size are
    /// kept. Rows cached for the new tab are shown right away; call
    /// [`load`](Self::load) to fetch them.
    pub fn select_tab(&mut self, id: &str) {
        if self.active_tab.as_deref() == Some(id) {
            return;
        }

        self.active_tab = Some(id.to_string());
        self.rescope();
        if let Some(callback) = &self.on_tab_change {
            callback(id);
        }

        self.selection.clear();
        self.page = 1;
        self.raw = self.scoped.cached().unwrap_or_default();
        self.recompute();
        self.state = ViewState::Loading;
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Selected ids, in selection order.
    pub fn selected(&self) -> &[EntityId] {
        &self.selection
    }

    /// Selected rows, in sorted order.
    pub fn selected_records(&self) -> Vec<Record> {
        self.sorted
            .iter()
            .filter(|r| r.id().is_some_and(|id| self.selection.contains(&id)))
            .cloned()
            .collect()
    }

    /// Returns `true` if the id is selected.
    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.selection.contains(id)
    }

    /// Selects a row. Ids not in the sorted list are ignored.
    pub fn select(&mut self, id: &EntityId) {
        if !self.config.selection || self.is_selected(id) {
            return;
        }
        if self.sorted.iter().any(|r| r.has_id(id)) {
            self.selection.push(id.clone());
        }
    }

    /// Deselects a row.
    pub fn deselect(&mut self, id: &EntityId) {
        self.selection.retain(|selected| selected != id);
    }

    /// Flips the selection of a row.
    pub fn toggle(&mut self, id: &EntityId) {
        if self.is_selected(id) {
            self.deselect(id);
        } else {
            self.select(id);
        }
    }

    /// Selects every row on the current page.
    pub fn select_visible(&mut self) {
        let ids: Vec<EntityId> = self.visible().iter().filter_map(Record::id).collect();
        for id in &ids {
            self.select(id);
        }
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // =========================================================================
    // Actions
    // =========================================================================

    fn has_fields_for(&self, view: FieldView) -> bool {
        self.fields.iter().any(|f| f.participates(view))
    }

    /// Returns `true` if any field takes part in creating.
    pub fn can_create(&self) -> bool {
        self.has_fields_for(FieldView::Create)
    }

    /// Returns `true` if exactly one row is selected and any field takes part in updating.
    pub fn can_update(&self) -> bool {
        self.selection.len() == 1 && self.has_fields_for(FieldView::Update)
    }

    /// Returns `true` if a row is selected and any field takes part in deleting.
    pub fn can_delete(&self) -> bool {
        !self.selection.is_empty() && self.has_fields_for(FieldView::Delete)
    }

    /// A create form for this grid's fields.
    pub fn create_form(&self) -> FormState {
        FormState::for_create(&self.fields)
    }

    /// An update form for the single selected row.
    pub fn update_form(&self) -> Option<FormState> {
        if !self.can_update() {
            return None;
        }
        let record = self.selected_records().into_iter().next()?;
        Some(FormState::for_update(&self.fields, &record))
    }

    /// Creates a record, then reloads.
    pub async fn create(&mut self, attrs: Record) -> Result<Record, Error> {
        let result = self.scoped.create(attrs).await;
        self.reload().await;
        result
    }

    /// Updates a record, then reloads.
    pub async fn update(&mut self, partial: Record) -> Result<Record, Error> {
        let result = self.scoped.update(partial).await;
        self.reload().await;
        result
    }

    /// Deletes a record, then reloads.
    pub async fn delete(&mut self, id: &EntityId) -> Result<(), Error> {
        let result = self.scoped.delete_one(id).await;
        self.reload().await;
        result
    }

    /// Validates and submits a form.
    ///
    /// The first submit of a create form creates the record and remembers its
    /// id; later submits update it. Multi-step forms advance to the next step
    /// after each successful submit.
    pub async fn submit(&mut self, form: &mut FormState) -> Result<SubmitOutcome, Error> {
        let record = match form.submission()? {
            Submission::Create(values) => {
                let created = self.create(values).await?;
                if let Some(id) = created.id() {
                    form.set_record_id(id);
                }
                created
            }
            Submission::Update(values) => self.update(values).await?,
        };

        if form.next_step() {
            Ok(SubmitOutcome::NextStep(record))
        } else {
            Ok(SubmitOutcome::Done(record))
        }
    }

    /// Deletes every selected row, then clears the selection and reloads.
    ///
    /// Failures do not stop the remaining deletes.
    pub async fn delete_selected(&mut self) -> DeleteSummary {
        let mut summary = DeleteSummary::default();
        for id in std::mem::take(&mut self.selection) {
            match self.scoped.delete_one(&id).await {
                Ok(()) => summary.deleted.push(id),
                Err(e) => {
                    log::warn!("Failed to delete {}: {}", id, e);
                    summary.failed.push((id, e));
                }
            }
        }
        self.reload().await;
        summary
    }
}

impl std::fmt::Debug for GridView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridView")
            .field("store", &self.scoped)
            .field("state", &self.state)
            .field("active_tab", &self.active_tab)
            .field("sort", &self.sort)
            .field("page", &self.page)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}
