mod app;
pub mod http;
pub mod jwt;

pub use app::ApiError;
pub use http::{router, run};
