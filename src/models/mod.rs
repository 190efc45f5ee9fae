//! Data models

pub mod features;
pub mod explanation;
pub mod request;

pub use features::*;
pub use explanation::*;
pub use request::*;
