pub mod command;

pub use command::{Command, Response, StateInfo, TagInfo};
