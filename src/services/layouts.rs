use crate::{
    db::{DatabaseAccess, DbPool},
    entities::{
        space,
        warehouse::{self, MAX_GRID_CELLS},
    },
    errors::ServiceError,
    layout::{Layout, LayoutError},
    services::warehouses::CreateWarehouseInput,
};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, NotSet, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Rows per multi-row INSERT, well under SQLite's bound-parameter limit.
const INSERT_CHUNK: usize = 500;

/// Result of importing a layout
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub warehouse: warehouse::Model,
    pub paths: usize,
    pub shelves: usize,
}

/// Loads text layouts into the database and renders stored warehouses back
#[derive(Clone)]
pub struct LayoutService {
    db: DatabaseAccess,
}

impl LayoutService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            db: DatabaseAccess::new(db),
        }
    }

    /// Insert a warehouse sized to the layout plus one space per path or
    /// shelf cell, all in one transaction. Spaces reference the ID the
    /// engine assigned to the new warehouse.
    #[instrument(skip(self, layout), fields(width = layout.width(), height = layout.height()))]
    pub async fn import_layout(
        &self,
        name: Option<String>,
        layout: &Layout,
    ) -> Result<ImportSummary, ServiceError> {
        let input = CreateWarehouseInput {
            name,
            width: layout.width(),
            height: layout.height(),
        };
        input.validate()?;

        let txn = self.db.get_pool().begin().await?;

        let created = warehouse::ActiveModel {
            warehouse_id: NotSet,
            name: input.name.map_or(NotSet, |n| Set(Some(n))),
            width: Set(input.width),
            height: Set(input.height),
        }
        .insert(&txn)
        .await?;

        let mut paths = 0;
        let mut shelves = 0;
        let rows: Vec<space::ActiveModel> = layout
            .cells()
            .filter_map(|(x, y, cell)| {
                let kind = cell.kind()?;
                match kind {
                    space::SpaceKind::Path => paths += 1,
                    space::SpaceKind::Shelf => shelves += 1,
                }
                Some(space::ActiveModel {
                    warehouse_id: Set(created.warehouse_id),
                    x_pos: Set(x),
                    y_pos: Set(y),
                    kind: Set(Some(kind.as_str().to_string())),
                })
            })
            .collect();

        for chunk in rows.chunks(INSERT_CHUNK) {
            space::Entity::insert_many(chunk.to_vec())
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        counter!("warehouse_store.layouts.imported", 1);
        info!(
            warehouse_id = created.warehouse_id,
            paths, shelves, "Imported warehouse layout"
        );

        Ok(ImportSummary {
            warehouse: created,
            paths,
            shelves,
        })
    }

    /// Read, parse and import a layout file
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn import_layout_file(
        &self,
        name: Option<String>,
        path: impl AsRef<Path>,
    ) -> Result<ImportSummary, ServiceError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LayoutError::Io(format!("{}: {}", path.display(), e)))?;
        let layout = Layout::parse(&text)?;
        self.import_layout(name, &layout).await
    }

    /// Render a stored warehouse as a text layout. Extents above
    /// `MAX_GRID_CELLS` are refused with `LayoutError::ExtentTooLarge`.
    #[instrument(skip(self))]
    pub async fn export_layout(&self, warehouse_id: i32) -> Result<Layout, ServiceError> {
        let owner = self
            .db
            .execute("warehouse.find_by_id", |db| {
                warehouse::Entity::find_by_id(warehouse_id).one(db)
            })
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {} not found", warehouse_id)))?;

        // Checked before loading rows; `from_spaces` re-checks.
        if !owner.fits_grid() {
            return Err(LayoutError::ExtentTooLarge {
                width: owner.width,
                height: owner.height,
                limit: MAX_GRID_CELLS,
            }
            .into());
        }

        let spaces = self
            .db
            .execute("space.list", |db| {
                space::Entity::find()
                    .filter(space::Column::WarehouseId.eq(warehouse_id))
                    .all(db)
            })
            .await?;

        Ok(Layout::from_spaces(owner.width, owner.height, &spaces)?)
    }
}
