//! Route handlers for the HTTP API
//!
//! - [`batch`] — `POST /`, the batch fetch endpoint
//! - [`system`] — fallback for every other method and path

mod batch;
mod system;

pub use batch::*;
pub use system::*;
