mod alternatives;
mod app_state;
mod auth;
pub mod clipboard;
mod code_blocks;
#[cfg(test)]
pub mod fake_api;
mod follow_up;
mod markdown;
mod renderer;
mod search;
mod suggestions;

pub use alternatives::*;
pub use app_state::*;
pub use auth::*;
pub use code_blocks::*;
pub use follow_up::*;
pub use markdown::*;
pub use renderer::*;
pub use search::*;
pub use suggestions::*;
