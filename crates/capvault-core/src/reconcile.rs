use std::collections::HashSet;

use crate::error::AppError;
use crate::models::{CollectionItem, Reconciliation, Snapshot};
use crate::traits::{CollectionStore, SnapshotStore};

/// Partition the snapshot's products into owned (`matches`) and not yet
/// owned (`missing`), comparing lower-cased names. Whitespace is
/// significant.
///
/// No snapshot yet is a normal state and yields an empty result.
pub fn reconcile(latest: Option<&Snapshot>, collection: &[CollectionItem]) -> Reconciliation {
    let Some(snapshot) = latest else {
        return Reconciliation::default();
    };

    let owned: HashSet<String> = collection
        .iter()
        .map(|item| item.name.to_lowercase())
        .collect();

    let (matches, missing) = snapshot
        .products
        .iter()
        .cloned()
        .partition(|product| owned.contains(&product.name.to_lowercase()));

    Reconciliation { matches, missing }
}

/// Load the latest snapshot and the full collection, then reconcile them.
pub async fn compare_with_collection<S, C>(
    snapshots: &S,
    collection: &C,
) -> Result<Reconciliation, AppError>
where
    S: SnapshotStore,
    C: CollectionStore,
{
    let latest = snapshots.load_latest().await?;
    let Some(snapshot) = latest else {
        tracing::info!("No scrape results found");
        return Ok(Reconciliation::default());
    };

    let items = collection.list(None).await?;
    tracing::info!(
        snapshot_id = %snapshot.id,
        products = snapshot.products.len(),
        collection = items.len(),
        "Comparing latest scrape with collection"
    );

    let result = reconcile(Some(&snapshot), &items);
    tracing::info!(
        matches = result.matches.len(),
        missing = result.missing.len(),
        "Reconciliation complete"
    );
    Ok(result)
}
