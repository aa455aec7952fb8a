pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use model::*;
pub use router::{init_activity_catalog_router, init_learning_sessions_router};
