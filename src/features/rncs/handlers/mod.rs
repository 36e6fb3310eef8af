mod photo_handler;
mod rnc_handler;

pub use photo_handler::*;
pub use rnc_handler::*;
