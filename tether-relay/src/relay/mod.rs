mod relay_config;
mod relay_loop;
mod relay_report;

pub use relay_config::*;
pub use relay_loop::*;
pub use relay_report::*;
