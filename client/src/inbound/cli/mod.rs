//! Line-oriented terminal shell.

mod command;
mod render;
mod shell;

pub use command::{Command, EditField, parse_line, split_title};
pub use render::{identity_banner, render_board};
pub use shell::{Shell, Step};
