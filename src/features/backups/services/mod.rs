mod export_service;
mod import_service;

pub use export_service::{CsvExportService, EXPORT_FILENAME};
pub use import_service::CsvImportService;
