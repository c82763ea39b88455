//! HTTP control surface.
//!
//! - [`routes`] - route table and request contract (host-testable)
//! - [`ControlServer`] - `tiny_http` server thread serving a [`Router`]

mod control_server;
pub mod routes;

pub use control_server::ControlServer;
pub use routes::{control_routes, Query, Reply, Router};
