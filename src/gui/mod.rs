//! Terminal UI helpers shared by the SoundScope binaries.

mod error;
mod scene_selector;

pub use error::ScopeGuiError;
pub use scene_selector::scene_selector;
