//! Plan import from TOML files: format, validation and the service layer.

pub mod parser;
pub mod service;
pub mod toml_format;

pub use parser::{PlanDraft, PlanImportError, parse_due, parse_plan_file};
pub use service::import_plans;
pub use toml_format::{PlanEntry, PlanFile};
