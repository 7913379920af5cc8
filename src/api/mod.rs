pub mod context;
pub mod state;

pub use context::{CurrentUser, RequireUser};
pub use state::{AppState, PipelineSettings};
