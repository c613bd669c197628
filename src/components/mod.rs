//! Components of the bot

mod commands;
pub use commands::*;
mod masquerade;
pub use masquerade::*;
mod misc;
pub use misc::*;
