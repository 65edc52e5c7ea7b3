mod config;
mod hierarchy;
mod ids;

pub use self::config::*;
pub use self::hierarchy::*;
pub use self::ids::*;
