use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Name stored by the `warehouse.name` column default.
pub const DEFAULT_NAME: &str = "Default name";

/// Largest extent, in cells, that is materialized as a grid or layout.
pub const MAX_GRID_CELLS: i64 = 1 << 24;

/// A rectangular warehouse grid.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "warehouse")]
pub struct Model {
    /// Assigned by the engine on insert, never reused.
    #[sea_orm(primary_key, column_name = "warehouseID")]
    pub warehouse_id: i32,

    pub name: Option<String>,

    pub width: i32,

    pub height: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::space::Entity")]
    Spaces,
}

impl Related<super::space::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Spaces.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Number of cells in the `width × height` extent.
    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    /// Whether `(x, y)` lies inside the extent.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    /// Whether the extent is small enough to render cell by cell.
    pub fn fits_grid(&self) -> bool {
        fits_grid(self.width, self.height)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_NAME)
    }
}

/// Negative dimensions count as empty.
pub fn fits_grid(width: i32, height: i32) -> bool {
    i64::from(width.max(0)) * i64::from(height.max(0)) <= MAX_GRID_CELLS
}
