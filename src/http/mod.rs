pub mod error;
pub mod request;
pub mod server;
pub mod types;

pub use server::{health_report, serve};
