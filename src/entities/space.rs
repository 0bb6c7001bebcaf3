use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One cell of a warehouse grid, keyed by `(warehouseID, xPos, yPos)`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "spaces")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "warehouseID")]
    pub warehouse_id: i32,

    #[sea_orm(primary_key, auto_increment = false, column_name = "xPos")]
    pub x_pos: i32,

    #[sea_orm(primary_key, auto_increment = false, column_name = "yPos")]
    pub y_pos: i32,

    /// Free-form label; the layout importer writes `path` and `shelf`.
    #[sea_orm(column_name = "type")]
    pub kind: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::WarehouseId"
    )]
    Warehouse,
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn key(&self) -> SpaceKey {
        SpaceKey {
            warehouse_id: self.warehouse_id,
            x_pos: self.x_pos,
            y_pos: self.y_pos,
        }
    }

    pub fn space_kind(&self) -> Option<SpaceKind> {
        self.kind.as_deref().and_then(|k| k.parse().ok())
    }

    pub fn is_shelf(&self) -> bool {
        self.space_kind() == Some(SpaceKind::Shelf)
    }
}

/// Composite primary key of a space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceKey {
    pub warehouse_id: i32,
    pub x_pos: i32,
    pub y_pos: i32,
}

impl SpaceKey {
    pub fn new(warehouse_id: i32, x_pos: i32, y_pos: i32) -> Self {
        Self {
            warehouse_id,
            x_pos,
            y_pos,
        }
    }
}

impl From<SpaceKey> for (i32, i32, i32) {
    fn from(key: SpaceKey) -> Self {
        (key.warehouse_id, key.x_pos, key.y_pos)
    }
}

impl fmt::Display for SpaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:({}, {})", self.warehouse_id, self.x_pos, self.y_pos)
    }
}

/// Well-known `type` labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceKind {
    Path,
    Shelf,
}

impl SpaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceKind::Path => "path",
            SpaceKind::Shelf => "shelf",
        }
    }
}

impl fmt::Display for SpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpaceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" => Ok(SpaceKind::Path),
            "shelf" => Ok(SpaceKind::Shelf),
            other => Err(format!("unknown space kind: {}", other)),
        }
    }
}
