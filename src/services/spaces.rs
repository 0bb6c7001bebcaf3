use crate::{
    db::{DatabaseAccess, DbPool},
    entities::{
        space::{self, SpaceKey},
        warehouse::{self, MAX_GRID_CELLS},
    },
    errors::ServiceError,
    grid::OccupancyGrid,
};
use metrics::counter;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Space service for managing the cells of a warehouse grid
#[derive(Clone)]
pub struct SpaceService {
    db: DatabaseAccess,
    strict_bounds: bool,
}

impl SpaceService {
    pub fn new(db: Arc<DbPool>, strict_bounds: bool) -> Self {
        Self {
            db: DatabaseAccess::new(db),
            strict_bounds,
        }
    }

    /// Create a new space
    ///
    /// With strict bounds on, coordinates are checked against the owning
    /// warehouse when it exists. A missing warehouse is reported by the
    /// engine as a foreign key violation.
    #[instrument(skip(self))]
    pub async fn create_space(&self, input: CreateSpaceInput) -> Result<space::Model, ServiceError> {
        input.validate()?;

        if self.strict_bounds {
            if let Some(owner) = self.find_warehouse(input.warehouse_id).await? {
                ensure_within(&owner, input.x_pos, input.y_pos)?;
            }
        }

        let model = space::ActiveModel {
            warehouse_id: Set(input.warehouse_id),
            x_pos: Set(input.x_pos),
            y_pos: Set(input.y_pos),
            kind: Set(Some(input.kind)),
        };

        let created = self
            .db
            .execute("space.insert", |db| model.insert(db))
            .await?;

        counter!("warehouse_store.spaces.created", 1);
        info!(space = %created.key(), kind = ?created.kind, "Created space");
        Ok(created)
    }

    /// Get a space by its composite key
    #[instrument(skip(self))]
    pub async fn get_space(&self, key: SpaceKey) -> Result<space::Model, ServiceError> {
        self.db
            .execute("space.find_by_id", |db| {
                space::Entity::find_by_id(<(i32, i32, i32)>::from(key)).one(db)
            })
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Space {} not found", key)))
    }

    /// List a warehouse's spaces, row by row
    #[instrument(skip(self))]
    pub async fn list_spaces(&self, warehouse_id: i32) -> Result<Vec<space::Model>, ServiceError> {
        self.require_warehouse(warehouse_id).await?;
        self.db
            .execute("space.list", |db| {
                space::Entity::find()
                    .filter(space::Column::WarehouseId.eq(warehouse_id))
                    .order_by_asc(space::Column::YPos)
                    .order_by_asc(space::Column::XPos)
                    .all(db)
            })
            .await
    }

    /// List a warehouse's spaces carrying the given `type` label
    #[instrument(skip(self))]
    pub async fn list_spaces_by_kind(
        &self,
        warehouse_id: i32,
        kind: &str,
    ) -> Result<Vec<space::Model>, ServiceError> {
        self.require_warehouse(warehouse_id).await?;
        let kind = kind.to_string();
        self.db
            .execute("space.list_by_kind", |db| {
                space::Entity::find()
                    .filter(space::Column::WarehouseId.eq(warehouse_id))
                    .filter(space::Column::Kind.eq(kind))
                    .order_by_asc(space::Column::YPos)
                    .order_by_asc(space::Column::XPos)
                    .all(db)
            })
            .await
    }

    /// Relabel a space
    #[instrument(skip(self))]
    pub async fn update_space_kind(
        &self,
        key: SpaceKey,
        kind: String,
    ) -> Result<space::Model, ServiceError> {
        if kind.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Space type must not be empty".to_string(),
            ));
        }

        let existing = self.get_space(key).await?;
        let mut active: space::ActiveModel = existing.into();
        active.kind = Set(Some(kind));

        let updated = self
            .db
            .execute("space.update", |db| active.update(db))
            .await?;

        info!(space = %key, kind = ?updated.kind, "Updated space type");
        Ok(updated)
    }

    /// Delete a space
    #[instrument(skip(self))]
    pub async fn delete_space(&self, key: SpaceKey) -> Result<(), ServiceError> {
        let deleted = self
            .db
            .execute("space.delete", |db| {
                space::Entity::delete_by_id(<(i32, i32, i32)>::from(key)).exec(db)
            })
            .await?;

        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Space {} not found", key)));
        }

        counter!("warehouse_store.spaces.deleted", 1);
        info!(space = %key, "Deleted space");
        Ok(())
    }

    /// Spaces whose coordinates fall outside their warehouse's extent
    #[instrument(skip(self))]
    pub async fn out_of_bounds_spaces(
        &self,
        warehouse_id: i32,
    ) -> Result<Vec<space::Model>, ServiceError> {
        let owner = self.require_warehouse(warehouse_id).await?;
        let stray = self
            .db
            .execute("space.out_of_bounds", |db| {
                space::Entity::find()
                    .filter(space::Column::WarehouseId.eq(warehouse_id))
                    .filter(
                        Condition::any()
                            .add(space::Column::XPos.lt(0))
                            .add(space::Column::XPos.gte(owner.width))
                            .add(space::Column::YPos.lt(0))
                            .add(space::Column::YPos.gte(owner.height)),
                    )
                    .order_by_asc(space::Column::YPos)
                    .order_by_asc(space::Column::XPos)
                    .all(db)
            })
            .await?;

        if !stray.is_empty() {
            warn!(
                warehouse_id,
                count = stray.len(),
                "Spaces found outside warehouse bounds"
            );
        }
        Ok(stray)
    }

    /// 0/1 view of a warehouse with shelves marked as obstacles. Extents
    /// above `MAX_GRID_CELLS` are refused.
    #[instrument(skip(self))]
    pub async fn occupancy_grid(&self, warehouse_id: i32) -> Result<OccupancyGrid, ServiceError> {
        let owner = self.require_warehouse(warehouse_id).await?;
        if !owner.fits_grid() {
            return Err(ServiceError::InvalidInput(format!(
                "Warehouse {} is {}x{}, above the {}-cell grid limit",
                owner.warehouse_id, owner.width, owner.height, MAX_GRID_CELLS
            )));
        }
        let spaces = self.list_spaces(warehouse_id).await?;
        Ok(OccupancyGrid::from_spaces(&owner, &spaces))
    }

    async fn find_warehouse(
        &self,
        warehouse_id: i32,
    ) -> Result<Option<warehouse::Model>, ServiceError> {
        self.db
            .execute("warehouse.find_by_id", |db| {
                warehouse::Entity::find_by_id(warehouse_id).one(db)
            })
            .await
    }

    async fn require_warehouse(&self, warehouse_id: i32) -> Result<warehouse::Model, ServiceError> {
        self.find_warehouse(warehouse_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {} not found", warehouse_id)))
    }
}

fn ensure_within(owner: &warehouse::Model, x: i32, y: i32) -> Result<(), ServiceError> {
    if owner.contains(x, y) {
        Ok(())
    } else {
        Err(ServiceError::OutOfBounds {
            warehouse_id: owner.warehouse_id,
            x,
            y,
            width: owner.width,
            height: owner.height,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateSpaceInput {
    pub warehouse_id: i32,
    pub x_pos: i32,
    pub y_pos: i32,
    #[validate(length(min = 1))]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> warehouse::Model {
        warehouse::Model {
            warehouse_id: 7,
            name: None,
            width: 3,
            height: 2,
        }
    }

    #[test]
    fn bounds_check_uses_half_open_extent() {
        assert!(ensure_within(&owner(), 0, 0).is_ok());
        assert!(ensure_within(&owner(), 2, 1).is_ok());
        assert!(matches!(
            ensure_within(&owner(), 3, 0),
            Err(ServiceError::OutOfBounds { x: 3, width: 3, .. })
        ));
        assert!(ensure_within(&owner(), 0, -1).is_err());
    }

    #[test]
    fn empty_kind_fails_validation() {
        let input = CreateSpaceInput {
            warehouse_id: 1,
            x_pos: 0,
            y_pos: 0,
            kind: String::new(),
        };
        assert!(input.validate().is_err());
    }
}
