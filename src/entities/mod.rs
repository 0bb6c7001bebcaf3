pub mod space;
pub mod warehouse;

pub use space::{Entity as Space, Model as SpaceModel, SpaceKey, SpaceKind};
pub use warehouse::{Entity as Warehouse, Model as WarehouseModel};
