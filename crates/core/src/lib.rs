#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod navigator;
pub mod reconcile;
pub mod route;
pub mod time;
pub mod tracker;

pub use error::{Error, NotFound, RouteError};
pub use time::Clock;
