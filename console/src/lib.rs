pub mod api;
pub mod authorizer;
pub mod config;
pub mod error;
pub mod models;
pub mod reports;
pub mod routes;
pub mod scan;
pub mod shell;

pub use api::{Backend, HttpBackend};
pub use authorizer::{authorize, Action, View};
pub use config::ConsoleConfig;
pub use error::{BackendError, BackendResult};
pub use routes::{all_routes, build_routes, find_route, Audience, Page, RouteDescriptor};
pub use shell::{AppShell, Navigation};
