//! Lists a collection through the full grid pipeline.
//!
//! Run with: cargo run --example list_collection
//!
//! Requires .env file with:
//! - DATAGRID_URL (backend base URL)
//! - DATAGRID_TOKEN (bearer token)
//! - DATAGRID_PATH (collection path, e.g. /users)
//!
//! Optional:
//! - DATAGRID_SORT (field to sort by, ascending)
//! - DATAGRID_SEARCH (substring filter on DATAGRID_SORT)

use std::env;
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use datagrid_lib::GridClient;
use datagrid_lib::auth::StaticTokenProvider;
use datagrid_lib::grid::Filter;
use datagrid_lib::grid::GridConfig;
use datagrid_lib::grid::GridView;
use datagrid_lib::grid::SortStatus;
use datagrid_lib::model::FieldDescriptor;
use datagrid_lib::settings::SettingsProvider;
use datagrid_lib::settings::SqliteBackend;
use datagrid_lib::settings::default_db_path;
use datagrid_lib::store::CacheKey;
use datagrid_lib::store::CollectionCache;
use datagrid_lib::store::CollectionStore;
use simplelog::{Config, LevelFilter, WriteLogger};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    if let Ok(log_file) = File::create("list_collection.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, Config::default(), log_file);
    }

    let url = env::var("DATAGRID_URL").expect("DATAGRID_URL not set");
    let token = env::var("DATAGRID_TOKEN").expect("DATAGRID_TOKEN not set");
    let path = env::var("DATAGRID_PATH").expect("DATAGRID_PATH not set");

    let settings = match default_db_path() {
        Some(db_path) => {
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            SettingsProvider::new(SqliteBackend::open(&db_path).await?)
        }
        None => SettingsProvider::in_memory(),
    };

    let client = GridClient::builder()
        .url(&url)
        .token_provider(StaticTokenProvider::new(token))
        .settings(settings.clone())
        .timeout(Duration::from_secs(30))
        .build()?;

    let key = CacheKey::from(path.trim_start_matches('/'));
    let store = CollectionStore::new(Arc::new(client), Arc::new(CollectionCache::default()), &path, key);

    let mut config = GridConfig::default();
    if let Ok(field) = env::var("DATAGRID_SORT") {
        config = config.with_default_sort(SortStatus::asc(field));
    }

    let fields = vec![FieldDescriptor::new("id").everywhere()];
    let mut view = GridView::new(store, fields, config, settings).await;

    if let (Ok(field), Ok(search)) = (env::var("DATAGRID_SORT"), env::var("DATAGRID_SEARCH")) {
        view.set_filters(vec![Filter::contains(field, search)]);
    }

    view.load().await?;

    println!(
        "{} records, page {}/{} ({} per page)\n",
        view.total_records(),
        view.page(),
        view.page_count(),
        view.page_size()
    );
    for record in view.visible() {
        println!("{}", serde_json::to_string(record)?);
    }

    Ok(())
}
