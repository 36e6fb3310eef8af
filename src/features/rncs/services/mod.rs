pub mod numbering;
mod photo_service;
mod rnc_service;

pub use photo_service::PhotoService;
pub use rnc_service::{RncDetail, RncService};
