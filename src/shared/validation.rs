use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

use crate::shared::constants::{CATEGORIES, CAUSES, EFFECTIVENESS, ORIGINS, PROCESSES, SEVERITIES};

lazy_static! {
    /// RNC number: four-digit year, hyphen, sequence of at least three digits
    /// - Valid: "2026-001", "2026-042", "2026-1000"
    /// - Invalid: "26-001", "2026-1", "2026_001", "RNC-2026-001"
    pub static ref RNC_NUMBER_REGEX: Regex = Regex::new(r"^(\d{4})-(\d{3,9})$").unwrap();
}

fn one_of(value: &str, options: &[&str], code: &'static str) -> Result<(), ValidationError> {
    if options.contains(&value) {
        Ok(())
    } else {
        let mut err = ValidationError::new(code);
        err.message = Some(format!("must be one of: {}", options.join(", ")).into());
        Err(err)
    }
}

pub fn validate_category(value: &str) -> Result<(), ValidationError> {
    one_of(value, CATEGORIES, "category")
}

pub fn validate_severity(value: &str) -> Result<(), ValidationError> {
    one_of(value, SEVERITIES, "severity")
}

pub fn validate_cause(value: &str) -> Result<(), ValidationError> {
    one_of(value, CAUSES, "cause")
}

pub fn validate_process(value: &str) -> Result<(), ValidationError> {
    one_of(value, PROCESSES, "process")
}

pub fn validate_origin(value: &str) -> Result<(), ValidationError> {
    one_of(value, ORIGINS, "origin")
}

pub fn validate_effectiveness(value: &str) -> Result<(), ValidationError> {
    one_of(value, EFFECTIVENESS, "effectiveness")
}
