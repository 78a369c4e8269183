//! # Application Layer

pub mod store;

pub use store::{load_snapshot, MaterializedStore, StoreHandle};
