use capvault_core::models::Product;
use capvault_core::traits::SnapshotStore;
use capvault_db::Database;

use crate::common::setup_test_db;

fn product(name: &str, batch: u32, image: Option<&str>) -> Product {
    Product::new(
        name.into(),
        "$25.00".into(),
        image.map(String::from),
        format!("https://www.s-craft.studio/shop/group-buy?batch_id={batch}"),
        batch,
    )
}

#[tokio::test]
async fn load_latest_on_empty_store_is_none() {
    let (db, _container) = setup_test_db().await;

    let latest = db.snapshot_repo().load_latest().await.unwrap();
    assert!(latest.is_none());
}

#[tokio::test]
async fn save_and_load_snapshot() {
    let (db, _container) = setup_test_db().await;
    let repo = db.snapshot_repo();

    let products = vec![
        product("Pikachu - Yellow", 1, Some("https://cdn.example/pika.png")),
        product("Gengar", 11, None),
    ];
    let id = repo.save(&products).await.unwrap();
    assert!(!id.is_nil());

    let latest = repo
        .load_latest()
        .await
        .unwrap()
        .expect("Should find the snapshot");

    assert_eq!(latest.id, id);
    assert_eq!(latest.products.len(), 2);
    assert_eq!(latest.products[0].name, "Pikachu - Yellow");
    assert_eq!(latest.products[0].batch, 1);
    assert_eq!(latest.products[0].price, "$25.00");
    assert_eq!(
        latest.products[0].image_url.as_deref(),
        Some("https://cdn.example/pika.png")
    );
    assert_eq!(latest.products[1].image_url, None);
}

#[tokio::test]
async fn load_latest_returns_most_recent() {
    let (db, _container) = setup_test_db().await;
    let repo = db.snapshot_repo();

    repo.save(&[product("Old", 1, None)]).await.unwrap();
    // Small delay to ensure different timestamps
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let newest = repo.save(&[product("New", 2, None)]).await.unwrap();

    let latest = SnapshotStore::load_latest(&repo).await.unwrap().unwrap();
    assert_eq!(latest.id, newest);
    assert_eq!(latest.products[0].name, "New");

    let history = repo.history(10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, newest);
    assert_eq!(history[0].product_count, 1);
}

#[tokio::test]
async fn health_check_succeeds() {
    let (db, _container) = setup_test_db().await;
    db.health_check().await.unwrap();
}

#[tokio::test]
async fn closed_pool_is_rebuilt_once() {
    let (db, _container) = setup_test_db().await;

    db.pool().close().await;

    // First operation after the loss reconnects transparently.
    let id = db
        .snapshot_repo()
        .save(&[product("Eevee", 3, None)])
        .await
        .unwrap();
    let latest = db.snapshot_repo().load_latest().await.unwrap().unwrap();
    assert_eq!(latest.id, id);
}

#[tokio::test]
async fn pool_without_config_reports_storage_unavailable() {
    let (db, _container) = setup_test_db().await;

    let borrowed = Database::from_pool(db.pool());
    borrowed.pool().close().await;

    let err = borrowed.snapshot_repo().load_latest().await.unwrap_err();
    assert!(err.is_storage());
}
