pub mod layouts;
pub mod spaces;
pub mod warehouses;

pub use layouts::{ImportSummary, LayoutService};
pub use spaces::{CreateSpaceInput, SpaceService};
pub use warehouses::{
    CreateWarehouseInput, DeletePolicy, DeleteWarehouseResult, UpdateWarehouseInput,
    WarehouseService,
};
