//! Optimistic mutations and fetch cancellation against a gated backend.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use datagrid_lib::api::Backend;
use datagrid_lib::error::ApiError;
use datagrid_lib::error::Error;
use datagrid_lib::model::EntityId;
use datagrid_lib::model::Record;
use datagrid_lib::store::CollectionCache;
use datagrid_lib::store::CollectionStore;
use tokio::sync::Notify;
use tokio::sync::Semaphore;

/// In-memory backend whose calls can be held until the test releases them.
struct Gated {
    records: Mutex<Vec<Record>>,
    next_id: AtomicI64,
    fail: AtomicBool,
    hold_lists: AtomicBool,
    hold_mutations: AtomicBool,
    entered: Notify,
    gate: Semaphore,
    list_calls: AtomicUsize,
}

impl Gated {
    fn new(records: Vec<Record>) -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI64::new(records.len() as i64 + 1),
            records: Mutex::new(records),
            fail: AtomicBool::new(false),
            hold_lists: AtomicBool::new(false),
            hold_mutations: AtomicBool::new(false),
            entered: Notify::new(),
            gate: Semaphore::new(0),
            list_calls: AtomicUsize::new(0),
        })
    }

    async fn pass(&self, hold: &AtomicBool) {
        if hold.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.gate.acquire().await.unwrap().forget();
        }
    }

    fn check(&self) -> Result<(), Error> {
        if self.fail.load(Ordering::SeqCst) {
            Err(ApiError::http(500, "boom").into())
        } else {
            Ok(())
        }
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl Backend for Gated {
    async fn list(&self, _path: &str) -> Result<Vec<Record>, Error> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pass(&self.hold_lists).await;
        Ok(self.records.lock().unwrap().clone())
    }

    async fn get(&self, _path: &str, id: &EntityId) -> Result<Record, Error> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.has_id(id))
            .cloned()
            .ok_or_else(|| ApiError::http(404, "not found").into())
    }

    async fn create(&self, _path: &str, record: &Record) -> Result<Record, Error> {
        self.pass(&self.hold_mutations).await;
        self.check()?;
        let id = EntityId::from(self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = record.clone().with_id(&id);
        self.records.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, _path: &str, record: &Record) -> Result<Record, Error> {
        self.pass(&self.hold_mutations).await;
        self.check()?;
        let id = record.id().unwrap();
        let mut records = self.records.lock().unwrap();
        let stored = records.iter_mut().find(|r| r.has_id(&id)).unwrap();
        stored.merge(record);
        Ok(stored.clone())
    }

    async fn delete(&self, _path: &str, id: &EntityId) -> Result<(), Error> {
        self.pass(&self.hold_mutations).await;
        self.check()?;
        self.records.lock().unwrap().retain(|r| !r.has_id(id));
        Ok(())
    }
}

fn users() -> Vec<Record> {
    vec![
        Record::new().set("id", 1).set("name", "Ann"),
        Record::new().set("id", 2).set("name", "Bob"),
    ]
}

fn store(backend: &Arc<Gated>) -> CollectionStore {
    CollectionStore::new(
        backend.clone(),
        Arc::new(CollectionCache::default()),
        "/users",
        "users",
    )
}

#[tokio::test]
async fn test_create_is_visible_before_the_backend_answers() {
    let backend = Gated::new(users());
    let store = store(&backend);
    store.list_all().await.unwrap();

    backend.hold_mutations.store(true, Ordering::SeqCst);
    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.create(Record::new().set("name", "x")).await }
    });
    backend.entered.notified().await;

    let cached = store.cached().unwrap();
    assert_eq!(cached.len(), 3);
    let placeholder = cached.last().unwrap();
    assert!(placeholder.id().unwrap().is_temporary());
    assert_eq!(placeholder.get_str("name"), Some("x"));

    backend.release();
    let created = pending.await.unwrap().unwrap();
    assert_eq!(created.id(), Some(EntityId::from(3)));

    // Settling invalidates the list; the next read reconciles.
    assert!(!store.cache().is_list_fresh(store.key()));
    let list = store.list_all().await.unwrap().into_inner();
    assert_eq!(list.len(), 3);
    assert!(list.iter().all(|r| !r.id().unwrap().is_temporary()));
}

#[tokio::test]
async fn test_failed_create_rolls_back() {
    let backend = Gated::new(users());
    let store = store(&backend);
    store.list_all().await.unwrap();

    backend.fail.store(true, Ordering::SeqCst);
    backend.hold_mutations.store(true, Ordering::SeqCst);
    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.create(Record::new().set("name", "x")).await }
    });
    backend.entered.notified().await;
    assert_eq!(store.cached().unwrap().len(), 3);

    backend.release();
    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(err.message(), "boom");
    assert_eq!(store.cached().unwrap(), users());
}

#[tokio::test]
async fn test_create_with_id_is_rejected() {
    let backend = Gated::new(users());
    let store = store(&backend);
    let err = store
        .create(Record::new().set("id", 9).set("name", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
}

#[tokio::test]
async fn test_update_merges_optimistically_and_rolls_back() {
    let backend = Gated::new(users());
    let store = store(&backend);
    store.list_all().await.unwrap();
    store.get_one(&EntityId::from(1)).await.unwrap();
    let record_key = store.record_key(&EntityId::from(1));

    backend.fail.store(true, Ordering::SeqCst);
    backend.hold_mutations.store(true, Ordering::SeqCst);
    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.update(Record::new().set("id", 1).set("name", "Zed")).await }
    });
    backend.entered.notified().await;

    assert_eq!(store.cached().unwrap()[0].get_str("name"), Some("Zed"));
    assert_eq!(store.cache().record(&record_key).unwrap().data.get_str("name"), Some("Zed"));

    backend.release();
    assert!(pending.await.unwrap().is_err());
    assert_eq!(store.cached().unwrap(), users());
    assert_eq!(store.cache().record(&record_key).unwrap().data.get_str("name"), Some("Ann"));
    // The record stays fresh after a failed update; only the list is invalidated.
    assert!(store.cache().is_record_fresh(&record_key));
    assert!(!store.cache().is_list_fresh(store.key()));
}

#[tokio::test]
async fn test_successful_update_invalidates_record() {
    let backend = Gated::new(users());
    let store = store(&backend);
    store.list_all().await.unwrap();
    store.get_one(&EntityId::from(1)).await.unwrap();

    let updated = store
        .update(Record::new().set("id", 1).set("name", "Zed"))
        .await
        .unwrap();
    assert_eq!(updated.get_str("name"), Some("Zed"));

    let record_key = store.record_key(&EntityId::from(1));
    assert!(!store.cache().is_record_fresh(&record_key));
    let fetched = store.get_one(&EntityId::from(1)).await.unwrap();
    assert!(fetched.is_fresh());
    assert_eq!(fetched.data().get_str("name"), Some("Zed"));
}

#[tokio::test]
async fn test_update_without_id_is_rejected() {
    let backend = Gated::new(users());
    let err = store(&backend)
        .update(Record::new().set("name", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
}

#[tokio::test]
async fn test_delete_removes_and_restores_on_failure() {
    let backend = Gated::new(users());
    let store = store(&backend);
    store.list_all().await.unwrap();
    store.get_one(&EntityId::from(2)).await.unwrap();
    let record_key = store.record_key(&EntityId::from(2));

    backend.fail.store(true, Ordering::SeqCst);
    backend.hold_mutations.store(true, Ordering::SeqCst);
    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.delete_one(&EntityId::from(2)).await }
    });
    backend.entered.notified().await;

    assert_eq!(store.cached().unwrap().len(), 1);
    assert!(store.cache().record(&record_key).is_none());

    backend.release();
    assert!(pending.await.unwrap().is_err());
    assert_eq!(store.cached().unwrap(), users());
    assert!(store.cache().record(&record_key).is_some());
}

#[tokio::test]
async fn test_delete_success() {
    let backend = Gated::new(users());
    let store = store(&backend);
    store.list_all().await.unwrap();

    store.delete_one(&EntityId::from(1)).await.unwrap();
    let list = store.list_all().await.unwrap();
    assert!(list.is_fresh());
    assert_eq!(list.into_inner().len(), 1);
}

#[tokio::test]
async fn test_mutation_cancels_in_flight_fetch() {
    let backend = Gated::new(users());
    let store = store(&backend);
    store.list_all().await.unwrap();
    store.invalidate();

    backend.hold_lists.store(true, Ordering::SeqCst);
    let fetch = tokio::spawn({
        let store = store.clone();
        async move { store.list_all().await }
    });
    backend.entered.notified().await;

    store.create(Record::new().set("name", "x")).await.unwrap();

    let response = fetch.await.unwrap().unwrap();
    assert!(response.is_stale());
    // The cancelled fetch never wrote over the optimistic list.
    assert_eq!(store.cached().unwrap().len(), 3);
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cancelled_fetch_without_data_fails() {
    let backend = Gated::new(users());
    let store = store(&backend);

    backend.hold_lists.store(true, Ordering::SeqCst);
    let fetch = tokio::spawn({
        let store = store.clone();
        async move { store.list_all().await }
    });
    backend.entered.notified().await;

    store.delete_one(&EntityId::from(1)).await.unwrap();

    let err = fetch.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(store.cached().is_none());
}

#[tokio::test]
async fn test_lists_are_cached_until_stale() {
    let backend = Gated::new(users());
    let store = store(&backend);

    assert!(store.list_all().await.unwrap().is_fresh());
    assert!(store.list_all().await.unwrap().is_cached());
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);

    assert!(store.refetch().await.unwrap().is_fresh());
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 2);
}
