mod app_cfg;
mod app_fns;
mod arg_parse;
mod errors;
pub(crate) mod prompt;
mod worker;

//exports
pub use app_cfg::{AppCfg, OutputCfg, ReportVerbosity, WorkerCfg};
pub use app_fns::*;
pub use errors::AppError;
