//! Factory Planner
//!
//! Models a production network of buildings running recipes, connected by
//! item flows. Recipes come from a game data dump; the allocator computes how
//! much of each producer's output actually reaches each consumer.

pub mod allocator;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod models;
pub mod persist;
pub mod port;
pub mod report;
pub mod sample;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use allocator::{
    Allocation, UnconnectedTotal, aggregate_unconnected, allocate, available_flow,
    unconnected_ports,
};
pub use catalog::Catalog;
pub use config::{PlannerConfig, ResidualPolicy};
pub use error::{CatalogError, FactoryError, MalformedPortId};
pub use models::{Building, Connection, Factory, IdSequence, Item, ItemRate, Position, Recipe};
pub use port::{Direction, Port};
