pub mod pdf_canvas;
pub mod report_layout;
mod report_service;

pub use report_service::PdfReportService;
