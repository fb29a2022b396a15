mod clean;
mod plan;
mod run;

pub use clean::cmd_clean;
pub use plan::cmd_plan;
pub use run::cmd_run;
