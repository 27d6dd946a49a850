mod api;
mod approach;
mod chat_turn;
mod code_block;
mod error;
mod event;
mod follow_up_prompt;
mod image;
mod notice;
mod search_response;
mod serde_ext;
mod session;
mod slash_commands;
mod suggestion;

pub use api::*;
pub use approach::*;
pub use chat_turn::*;
pub use code_block::*;
pub use error::*;
pub use event::*;
pub use follow_up_prompt::*;
pub use image::*;
pub use notice::*;
pub use search_response::*;
pub use session::*;
pub use slash_commands::*;
pub use suggestion::*;
