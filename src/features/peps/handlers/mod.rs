mod pep_handler;

pub use pep_handler::*;
