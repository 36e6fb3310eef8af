mod rnc_dto;

pub use rnc_dto::*;
