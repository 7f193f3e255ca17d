mod build;
mod detect;
mod info;

pub use build::{BuildArgs, cmd_build};
pub use detect::cmd_detect;
pub use info::cmd_info;
