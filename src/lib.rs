//! Warehouse store library
//!
//! Schema, ORM entities and services for the `warehouse` and `spaces` tables.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod grid;
pub mod layout;
pub mod migrator;
pub mod services;

pub mod prelude {
    pub use crate::config::{AppConfig, AppConfigError};
    pub use crate::db::{DbConfig, DbPool};
    pub use crate::entities::{SpaceKey, SpaceKind, SpaceModel, WarehouseModel};
    pub use crate::errors::ServiceError;
    pub use crate::grid::OccupancyGrid;
    pub use crate::layout::{Layout, LayoutCell, LayoutError};
    pub use crate::services::{
        CreateSpaceInput, CreateWarehouseInput, DeletePolicy, LayoutService, SpaceService,
        UpdateWarehouseInput, WarehouseService,
    };
}
