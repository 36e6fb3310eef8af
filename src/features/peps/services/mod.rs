mod pep_service;

pub use pep_service::{normalize_codes, PepService};
