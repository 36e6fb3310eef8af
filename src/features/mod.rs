pub mod auth;
pub mod backups;
pub mod notifications;
pub mod pdf_reports;
pub mod peps;
pub mod rncs;
pub mod settings;
