mod error;
mod handlers;
mod models;
mod state;
mod translate;
mod upload;
mod util;

pub use error::{ServerError, Stage};
pub use handlers::{build_router, run_server};
pub use models::{ErrorResponse, ServerResponse};
