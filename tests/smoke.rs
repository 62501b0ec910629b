// End-to-end smoke test against the re-exported public API: a single
// `tablestore` dependency, no crate-internal paths reached into.

use serde_json::json;
use std::sync::Arc;
use tablestore::{
    ColumnDef, CreateTableStatement, InMemoryMetadataManager, RequestContext, TablestoreConfig,
};

#[tokio::test]
async fn create_insert_read_round_trip_through_public_api() {
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("TABLESTORE_DATA_PATH", tmp.path().to_str().unwrap());

    let config = TablestoreConfig::load().unwrap();
    let manager =
        tablestore::build_storage_manager(&config, Arc::new(InMemoryMetadataManager::new()))
            .unwrap();

    let ctx = RequestContext::new("smoke");
    let statement = CreateTableStatement::new(vec![
        ColumnDef::new("id", "int64", false),
        ColumnDef::new("label", "string", true),
    ]);

    manager
        .create_table(&ctx, "analytics", "events", &statement, "MEMORY")
        .await
        .unwrap();

    manager
        .insert_data(
            &ctx,
            "analytics",
            "events",
            vec![vec![json!(1), json!("clicked")]],
        )
        .await
        .unwrap();

    let rows = manager.get_table_data(&ctx, "analytics", "events").await.unwrap();
    assert_eq!(rows, vec![vec![json!(1), json!("clicked")]]);

    std::env::remove_var("TABLESTORE_DATA_PATH");
}
