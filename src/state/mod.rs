//! State management module
//!
//! This module handles all slideshow state:
//! - Shared data structures (data.rs)
//! - The in-memory linked slide sequence (store.rs)
//! - Cached position lookup over the sequence (lookup.rs)
//! - The SQLite slide catalog (library.rs)
//! - The built-in default slides (seed.rs)

pub mod data;
pub mod library;
pub mod lookup;
pub mod seed;
pub mod store;
