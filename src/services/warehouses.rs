use crate::{
    db::{DatabaseAccess, DbPool},
    entities::{space, warehouse},
    errors::ServiceError,
};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, NotSet, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

/// How `delete_warehouse` treats spaces that still reference the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Plain delete; the engine refuses it while spaces reference the row.
    #[default]
    Restrict,
    /// Delete the warehouse's spaces first, in the same transaction.
    Cascade,
}

/// Warehouse service for managing warehouse rows
#[derive(Clone)]
pub struct WarehouseService {
    db: DatabaseAccess,
    strict_bounds: bool,
}

impl WarehouseService {
    pub fn new(db: Arc<DbPool>, strict_bounds: bool) -> Self {
        Self {
            db: DatabaseAccess::new(db),
            strict_bounds,
        }
    }

    /// Create a new warehouse. An absent name is left to the column default.
    #[instrument(skip(self))]
    pub async fn create_warehouse(
        &self,
        input: CreateWarehouseInput,
    ) -> Result<warehouse::Model, ServiceError> {
        input.validate()?;

        let model = warehouse::ActiveModel {
            warehouse_id: NotSet,
            name: input.name.map_or(NotSet, |name| Set(Some(name))),
            width: Set(input.width),
            height: Set(input.height),
        };

        let created = self
            .db
            .execute("warehouse.insert", |db| model.insert(db))
            .await?;

        counter!("warehouse_store.warehouses.created", 1);
        info!(
            warehouse_id = created.warehouse_id,
            width = created.width,
            height = created.height,
            "Created warehouse"
        );
        Ok(created)
    }

    /// Get a warehouse by ID
    #[instrument(skip(self))]
    pub async fn get_warehouse(&self, warehouse_id: i32) -> Result<warehouse::Model, ServiceError> {
        self.db
            .execute("warehouse.find_by_id", |db| {
                warehouse::Entity::find_by_id(warehouse_id).one(db)
            })
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {} not found", warehouse_id)))
    }

    /// List all warehouses ordered by ID
    #[instrument(skip(self))]
    pub async fn list_warehouses(&self) -> Result<Vec<warehouse::Model>, ServiceError> {
        self.db
            .execute("warehouse.list", |db| {
                warehouse::Entity::find()
                    .order_by_asc(warehouse::Column::WarehouseId)
                    .all(db)
            })
            .await
    }

    /// Update name and/or dimensions. Only provided fields change.
    #[instrument(skip(self))]
    pub async fn update_warehouse(
        &self,
        warehouse_id: i32,
        input: UpdateWarehouseInput,
    ) -> Result<warehouse::Model, ServiceError> {
        input.validate()?;

        let existing = self.get_warehouse(warehouse_id).await?;
        let new_width = input.width.unwrap_or(existing.width);
        let new_height = input.height.unwrap_or(existing.height);

        if self.strict_bounds && (new_width < existing.width || new_height < existing.height) {
            let stranded = self
                .spaces_outside(warehouse_id, new_width, new_height)
                .await?;
            if stranded > 0 {
                return Err(ServiceError::Conflict(format!(
                    "Resizing warehouse {} to {}x{} would leave {} space(s) outside its bounds",
                    warehouse_id, new_width, new_height, stranded
                )));
            }
        }

        let mut active: warehouse::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(Some(name));
        }
        if let Some(width) = input.width {
            active.width = Set(width);
        }
        if let Some(height) = input.height {
            active.height = Set(height);
        }

        let updated = self
            .db
            .execute("warehouse.update", |db| active.update(db))
            .await?;

        info!(warehouse_id, "Updated warehouse");
        Ok(updated)
    }

    /// Delete a warehouse according to `policy`
    #[instrument(skip(self))]
    pub async fn delete_warehouse(
        &self,
        warehouse_id: i32,
        policy: DeletePolicy,
    ) -> Result<DeleteWarehouseResult, ServiceError> {
        let result = match policy {
            DeletePolicy::Restrict => {
                let deleted = self
                    .db
                    .execute("warehouse.delete", |db| {
                        warehouse::Entity::delete_by_id(warehouse_id).exec(db)
                    })
                    .await?;
                if deleted.rows_affected == 0 {
                    return Err(ServiceError::NotFound(format!(
                        "Warehouse {} not found",
                        warehouse_id
                    )));
                }
                DeleteWarehouseResult {
                    warehouse_id,
                    spaces_deleted: 0,
                }
            }
            DeletePolicy::Cascade => {
                let txn = self.db.get_pool().begin().await?;

                let spaces = space::Entity::delete_many()
                    .filter(space::Column::WarehouseId.eq(warehouse_id))
                    .exec(&txn)
                    .await?;
                let deleted = warehouse::Entity::delete_by_id(warehouse_id)
                    .exec(&txn)
                    .await?;
                if deleted.rows_affected == 0 {
                    txn.rollback().await?;
                    return Err(ServiceError::NotFound(format!(
                        "Warehouse {} not found",
                        warehouse_id
                    )));
                }

                txn.commit().await?;
                DeleteWarehouseResult {
                    warehouse_id,
                    spaces_deleted: spaces.rows_affected,
                }
            }
        };

        counter!("warehouse_store.warehouses.deleted", 1);
        info!(
            warehouse_id,
            spaces_deleted = result.spaces_deleted,
            ?policy,
            "Deleted warehouse"
        );
        Ok(result)
    }

    /// Number of spaces stored for a warehouse
    #[instrument(skip(self))]
    pub async fn count_spaces(&self, warehouse_id: i32) -> Result<u64, ServiceError> {
        self.db
            .execute("space.count", |db| {
                space::Entity::find()
                    .filter(space::Column::WarehouseId.eq(warehouse_id))
                    .count(db)
            })
            .await
    }

    async fn spaces_outside(
        &self,
        warehouse_id: i32,
        width: i32,
        height: i32,
    ) -> Result<u64, ServiceError> {
        self.db
            .execute("space.count_outside", |db| {
                space::Entity::find()
                    .filter(space::Column::WarehouseId.eq(warehouse_id))
                    .filter(
                        Condition::any()
                            .add(space::Column::XPos.gte(width))
                            .add(space::Column::YPos.gte(height)),
                    )
                    .count(db)
            })
            .await
    }
}

/// Names must carry at least one visible character.
fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name");
        err.message = Some("Warehouse name must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateWarehouseInput {
    #[validate(length(min = 1, max = 255), custom = "validate_name")]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub width: i32,
    #[validate(range(min = 1))]
    pub height: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateWarehouseInput {
    #[validate(length(min = 1, max = 255), custom = "validate_name")]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub width: Option<i32>,
    #[validate(range(min = 1))]
    pub height: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteWarehouseResult {
    pub warehouse_id: i32,
    pub spaces_deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_input_rejects_non_positive_dimensions() {
        let input = CreateWarehouseInput {
            name: None,
            width: 0,
            height: 4,
        };
        assert!(input.validate().is_err());

        let input = CreateWarehouseInput {
            name: Some(String::new()),
            width: 3,
            height: 4,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn names_must_be_visible_and_bounded() {
        let named = |name: String| CreateWarehouseInput {
            name: Some(name),
            width: 1,
            height: 1,
        };
        assert!(named(" \t ".to_string()).validate().is_err());
        assert!(named("x".repeat(256)).validate().is_err());
        assert!(named("x".repeat(255)).validate().is_ok());

        let rename = UpdateWarehouseInput {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(rename.validate().is_err());
    }

    #[test]
    fn update_input_allows_partial_changes() {
        let input = UpdateWarehouseInput {
            width: Some(10),
            ..Default::default()
        };
        assert!(input.validate().is_ok());

        let input = UpdateWarehouseInput {
            height: Some(-1),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn restrict_is_the_default_policy() {
        assert_eq!(DeletePolicy::default(), DeletePolicy::Restrict);
    }
}
