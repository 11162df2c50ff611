//! Market data models
//!
//! - `bar` - Provider observations (RawBar)

mod bar;

pub use bar::RawBar;
