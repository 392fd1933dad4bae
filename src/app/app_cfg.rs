use std::{path::PathBuf, time::Duration};

use crate::library::{BatchCfg, PipelineCfg};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

impl ReportVerbosity {
    //worker processes log at the same level as the process that started them.
    pub fn worker_args(self) -> Vec<&'static str> {
        match self {
            Self::Quiet => vec!["--quiet"],
            Self::Default => vec![],
            Self::Verbose => vec!["--verbose"],
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputCfg {
    pub verbosity: ReportVerbosity,
}

/// Set when the process was started by the orchestrator to handle a single video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCfg {
    pub src_path: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub batch_cfg: BatchCfg,
    pub pipeline_cfg: PipelineCfg,

    //when None, the interval is asked for interactively.
    pub interval: Option<u64>,
    pub prompt_timeout: Duration,
    pub in_process: bool,

    pub output_cfg: OutputCfg,
    pub worker: Option<WorkerCfg>,
}
