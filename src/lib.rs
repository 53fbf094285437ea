//! Slideshow viewer core.
//!
//! - [`state::store`]: slides in a doubly linked chain with O(1) append and
//!   previous/next navigation
//! - [`state::lookup`]: "jump to slide N" with a position cache
//! - [`state::library`]: the SQLite slide catalog and the
//!   [`SlideRepository`](state::library::SlideRepository) trait
//! - [`api`]: list/create/update/delete requests with status codes
//! - [`viewer`]: user commands applied to the show
//! - [`import`]: adding a folder of images as slides

pub mod api;
pub mod config;
pub mod error;
pub mod import;
pub mod state;
pub mod viewer;

pub use error::{Result, SlideError};
