mod build;
mod fingerprint;
mod inputs;

pub use build::{BuildOptions, cmd_build};
pub use fingerprint::cmd_fingerprint;
pub use inputs::parse_pair;
