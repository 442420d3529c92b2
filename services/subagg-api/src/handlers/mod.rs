//! REST API handlers

pub mod health;
pub mod shared;
pub mod subscription;

pub use health::*;
pub use subscription::*;
