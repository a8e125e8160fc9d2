pub mod log_preview;
pub mod pdf;
