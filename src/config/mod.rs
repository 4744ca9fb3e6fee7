//! Audit plans: checks declared in TOML instead of code.

mod loader;
mod model;

pub use loader::{ConfigLoader, FileConfigLoader, LOCAL_CONFIG_NAME, LoadResult};
pub use model::{AuditPlan, CheckSpec, PLAN_VERSION};
