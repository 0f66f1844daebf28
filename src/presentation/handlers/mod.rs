mod calls;
mod health;

pub use calls::{BatchResponse, ErrorResponse, process_calls_handler};
pub use health::health_handler;
