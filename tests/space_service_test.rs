mod common;

use assert_matches::assert_matches;
use common::TestStore;
use warehouse_store::{
    entities::space::SpaceKey,
    errors::ServiceError,
    services::CreateSpaceInput,
};

fn input(warehouse_id: i32, x: i32, y: i32, kind: &str) -> CreateSpaceInput {
    CreateSpaceInput {
        warehouse_id,
        x_pos: x,
        y_pos: y,
        kind: kind.to_string(),
    }
}

#[tokio::test]
async fn created_space_is_retrievable_by_key() {
    let store = TestStore::new().await;
    let owner = store.warehouse(4, 4).await;

    let created = store.space(owner.warehouse_id, 2, 3, "shelf").await;
    let found = store
        .spaces
        .get_space(SpaceKey::new(owner.warehouse_id, 2, 3))
        .await
        .unwrap();
    assert_eq!(found, created);
}

#[tokio::test]
async fn service_surfaces_constraint_failures() {
    let store = TestStore::new().await;
    let owner = store.warehouse(4, 4).await;
    store.space(owner.warehouse_id, 0, 0, "path").await;

    assert_matches!(
        store
            .spaces
            .create_space(input(owner.warehouse_id, 0, 0, "shelf"))
            .await,
        Err(ServiceError::PrimaryKeyViolation(_))
    );
    assert_matches!(
        store.spaces.create_space(input(404, 0, 0, "path")).await,
        Err(ServiceError::ForeignKeyViolation(_))
    );
}

#[tokio::test]
async fn empty_kind_is_rejected_before_insert() {
    let store = TestStore::new().await;
    let owner = store.warehouse(2, 2).await;

    assert_matches!(
        store
            .spaces
            .create_space(input(owner.warehouse_id, 0, 0, ""))
            .await,
        Err(ServiceError::ValidationError(_))
    );
    assert!(store.spaces.list_spaces(owner.warehouse_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_is_ordered_row_by_row() {
    let store = TestStore::new().await;
    let owner = store.warehouse(3, 3).await;
    let id = owner.warehouse_id;
    store.space(id, 2, 1, "path").await;
    store.space(id, 0, 2, "shelf").await;
    store.space(id, 1, 0, "path").await;
    store.space(id, 0, 1, "shelf").await;

    let coords: Vec<(i32, i32)> = store
        .spaces
        .list_spaces(id)
        .await
        .unwrap()
        .iter()
        .map(|s| (s.x_pos, s.y_pos))
        .collect();
    assert_eq!(coords, vec![(1, 0), (0, 1), (2, 1), (0, 2)]);

    let shelves = store.spaces.list_spaces_by_kind(id, "shelf").await.unwrap();
    assert_eq!(shelves.len(), 2);
    assert!(shelves.iter().all(|s| s.is_shelf()));
}

#[tokio::test]
async fn listing_an_unknown_warehouse_is_not_found() {
    let store = TestStore::new().await;
    assert_matches!(
        store.spaces.list_spaces(12).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn kind_can_be_changed_and_space_deleted() {
    let store = TestStore::new().await;
    let owner = store.warehouse(2, 2).await;
    let key = SpaceKey::new(owner.warehouse_id, 1, 1);
    store.space(owner.warehouse_id, 1, 1, "path").await;

    let updated = store
        .spaces
        .update_space_kind(key, "charging bay".to_string())
        .await
        .unwrap();
    assert_eq!(updated.kind.as_deref(), Some("charging bay"));
    assert_eq!(updated.space_kind(), None);

    store.spaces.delete_space(key).await.unwrap();
    assert_matches!(
        store.spaces.get_space(key).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        store.spaces.delete_space(key).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn default_mode_accepts_out_of_range_and_audit_reports_it() {
    let store = TestStore::new().await;
    let owner = store.warehouse(3, 2).await;
    let id = owner.warehouse_id;
    store.space(id, 0, 0, "path").await;
    store.space(id, 3, 0, "shelf").await;
    store.space(id, 1, -1, "path").await;

    let stray = store.spaces.out_of_bounds_spaces(id).await.unwrap();
    let keys: Vec<SpaceKey> = stray.iter().map(|s| s.key()).collect();
    assert_eq!(keys, vec![SpaceKey::new(id, 1, -1), SpaceKey::new(id, 3, 0)]);
}

#[tokio::test]
async fn strict_mode_rejects_out_of_range_coordinates() {
    let store = TestStore::with_strict_bounds(true).await;
    let owner = store.warehouse(3, 2).await;

    let result = store
        .spaces
        .create_space(input(owner.warehouse_id, 3, 1, "shelf"))
        .await;
    assert_matches!(
        result,
        Err(ServiceError::OutOfBounds {
            x: 3,
            y: 1,
            width: 3,
            height: 2,
            ..
        })
    );

    store.space(owner.warehouse_id, 2, 1, "shelf").await;

    // A missing owner is still reported by the engine.
    assert_matches!(
        store.spaces.create_space(input(999, 50, 50, "path")).await,
        Err(ServiceError::ForeignKeyViolation(_))
    );
}

#[tokio::test]
async fn occupancy_grid_marks_shelves() {
    let store = TestStore::new().await;
    let owner = store.warehouse(3, 2).await;
    let id = owner.warehouse_id;
    store.space(id, 0, 0, "path").await;
    store.space(id, 1, 0, "shelf").await;
    store.space(id, 2, 1, "shelf").await;
    store.space(id, 9, 9, "shelf").await;

    let grid = store.spaces.occupancy_grid(id).await.unwrap();
    assert_eq!((grid.width(), grid.height()), (3, 2));
    assert!(grid.is_free(0, 0));
    assert!(grid.is_blocked(1, 0));
    assert!(grid.is_blocked(2, 1));
    assert_eq!(grid.obstacles(), 2);
    assert_eq!(grid.to_string(), "0 1 0\n0 0 1\n");
}

#[tokio::test]
async fn occupancy_grid_refuses_oversized_warehouses() {
    let store = TestStore::new().await;
    let owner = store.warehouse(200_000, 200_000).await;
    store.space(owner.warehouse_id, 0, 0, "shelf").await;

    assert_matches!(
        store.spaces.occupancy_grid(owner.warehouse_id).await,
        Err(ServiceError::InvalidInput(_))
    );
}
