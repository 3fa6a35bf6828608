use capvault_core::models::{CollectionItemUpdate, NewCollectionItem};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::common::setup_test_db;

fn attrs(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn new_item(name: &str, vendor: Option<&str>) -> NewCollectionItem {
    NewCollectionItem {
        name: name.into(),
        vendor: vendor.map(String::from),
        attributes: Map::new(),
    }
}

#[tokio::test]
async fn insert_and_list_items() {
    let (db, _container) = setup_test_db().await;
    let repo = db.keycap_repo();

    let mut item = new_item("Pikachu - Yellow", Some("s-craft"));
    item.attributes = attrs(json!({"profile": "artisan", "count": 2}));
    let id = repo.insert(&item).await.unwrap();
    repo.insert(&new_item("Gengar", None)).await.unwrap();

    let items = repo.list(None).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, id);
    assert_eq!(items[0].name, "Pikachu - Yellow");
    assert_eq!(items[0].vendor.as_deref(), Some("s-craft"));
    assert_eq!(items[0].attributes["profile"], "artisan");
    assert_eq!(items[0].attributes["count"], 2);
    assert_eq!(items[1].vendor, None);
}

#[tokio::test]
async fn list_filters_by_vendor() {
    let (db, _container) = setup_test_db().await;
    let repo = db.keycap_repo();

    repo.insert(&new_item("Pikachu", Some("s-craft"))).await.unwrap();
    repo.insert(&new_item("Botanical", Some("gmk"))).await.unwrap();

    let items = repo.list(Some("s-craft")).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Pikachu");

    assert!(repo.list(Some("nobody")).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_merges_attributes() {
    let (db, _container) = setup_test_db().await;
    let repo = db.keycap_repo();

    let mut item = new_item("Pikachu", Some("s-craft"));
    item.attributes = attrs(json!({"profile": "artisan", "color": "yellow"}));
    let id = repo.insert(&item).await.unwrap();

    let update = CollectionItemUpdate {
        name: Some("Pikachu - Yellow".into()),
        vendor: None,
        attributes: attrs(json!({"color": "gold", "signed": true})),
    };
    assert!(repo.update(id, &update).await.unwrap());

    let items = repo.list(None).await.unwrap();
    assert_eq!(items[0].name, "Pikachu - Yellow");
    assert_eq!(items[0].vendor.as_deref(), Some("s-craft"));
    assert_eq!(items[0].attributes["profile"], "artisan");
    assert_eq!(items[0].attributes["color"], "gold");
    assert_eq!(items[0].attributes["signed"], true);
}

#[tokio::test]
async fn update_and_delete_unknown_id_report_false() {
    let (db, _container) = setup_test_db().await;
    let repo = db.keycap_repo();

    let update = CollectionItemUpdate {
        name: Some("x".into()),
        ..Default::default()
    };
    assert!(!repo.update(Uuid::new_v4(), &update).await.unwrap());
    assert!(!repo.delete(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn delete_removes_item() {
    let (db, _container) = setup_test_db().await;
    let repo = db.keycap_repo();

    let id = repo.insert(&new_item("Ditto", None)).await.unwrap();
    assert!(repo.delete(id).await.unwrap());
    assert!(repo.list(None).await.unwrap().is_empty());
}
