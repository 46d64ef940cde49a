mod config;
mod paths;
mod target;

pub use config::{ConfigError, GoupConfig};
pub use paths::GoupPaths;
pub use target::{go_arch, go_os};
