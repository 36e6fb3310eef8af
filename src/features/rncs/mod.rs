pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::{PgRncRepository, RncRepository};
pub use routes::routes;
pub use services::{PhotoService, RncService};
