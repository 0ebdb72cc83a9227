//! Pipeline invocation configuration.

use std::path::{Path, PathBuf};

use fdlctl_core::RemoteSource;

/// Where the external processing pipeline lives and how to invoke it.
///
/// Program paths are plain data so tests can point them at stand-ins;
/// production values come from the environment via the CLI.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Interpreter used to create the virtual environment.
    pub python_bin: PathBuf,
    /// Pipeline checkout; working directory for every step.
    pub work_dir: PathBuf,
    /// Virtual environment directory.
    pub venv_dir: PathBuf,
    /// The pipeline entry script, relative to `work_dir` or absolute.
    pub script: PathBuf,
    /// Requirements file installed before each run.
    pub requirements: PathBuf,
    /// Archive processed in local-file mode.
    pub local_zip: Option<PathBuf>,
    /// Remote coordinates used when a run asks for the default source.
    pub default_remote: Option<RemoteSource>,
}

impl PipelineConfig {
    /// Config rooted at a pipeline checkout, with conventional paths.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        Self {
            python_bin: PathBuf::from("python3"),
            venv_dir: work_dir.join("venv"),
            script: work_dir.join("cssfdlp.py"),
            requirements: work_dir.join("requirements.txt"),
            local_zip: None,
            default_remote: None,
            work_dir,
        }
    }

    /// Python interpreter inside the virtual environment.
    pub fn venv_python(&self) -> PathBuf {
        venv_tool(&self.venv_dir, "python")
    }

    /// pip inside the virtual environment.
    pub fn venv_pip(&self) -> PathBuf {
        venv_tool(&self.venv_dir, "pip")
    }
}

fn venv_tool(venv_dir: &Path, name: &str) -> PathBuf {
    if cfg!(windows) {
        venv_dir.join("Scripts").join(format!("{name}.exe"))
    } else {
        venv_dir.join("bin").join(name)
    }
}
