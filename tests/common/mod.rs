#![allow(dead_code)]

use std::sync::Arc;

use warehouse_store::{
    db::{self, DbConfig, DbPool},
    entities::{space, warehouse},
    services::{
        CreateSpaceInput, CreateWarehouseInput, LayoutService, SpaceService, WarehouseService,
    },
};

/// Helper harness backed by a fresh, migrated in-memory SQLite database.
pub struct TestStore {
    pub db: Arc<DbPool>,
    pub warehouses: WarehouseService,
    pub spaces: SpaceService,
    pub layouts: LayoutService,
}

impl TestStore {
    /// Store with the bounds invariant left unenforced.
    pub async fn new() -> Self {
        Self::with_strict_bounds(false).await
    }

    pub async fn with_strict_bounds(strict: bool) -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::in_memory())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let db = Arc::new(pool);
        Self {
            warehouses: WarehouseService::new(db.clone(), strict),
            spaces: SpaceService::new(db.clone(), strict),
            layouts: LayoutService::new(db.clone()),
            db,
        }
    }

    pub fn pool(&self) -> &DbPool {
        self.db.as_ref()
    }

    pub async fn warehouse(&self, width: i32, height: i32) -> warehouse::Model {
        self.warehouses
            .create_warehouse(CreateWarehouseInput {
                name: None,
                width,
                height,
            })
            .await
            .expect("failed to create warehouse")
    }

    pub async fn space(&self, warehouse_id: i32, x: i32, y: i32, kind: &str) -> space::Model {
        self.spaces
            .create_space(CreateSpaceInput {
                warehouse_id,
                x_pos: x,
                y_pos: y,
                kind: kind.to_string(),
            })
            .await
            .expect("failed to create space")
    }
}
