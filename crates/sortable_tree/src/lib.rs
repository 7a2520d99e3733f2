mod announce;
mod config;
mod editor;
mod error;
mod host;
mod keyboard;
mod node;
mod projection;
mod selection;
mod session;
mod tree;

pub use crate::config::*;
pub use crate::editor::*;
pub use crate::error::*;
pub use crate::host::*;
pub use crate::keyboard::*;
pub use crate::node::*;
pub use crate::projection::*;
pub use crate::selection::*;
pub use crate::session::*;
pub use crate::tree::*;
