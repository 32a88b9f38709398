pub mod state;
pub mod viewer;

pub use state::SessionState;
pub use viewer::{DisplayState, ViewerEvent, ViewerSession};
