//! Log setup. The terminal belongs to the animation, so records go to a
//! file in the platform data directory instead of stderr.

use std::fs::{self, File};
use std::path::PathBuf;

use color_eyre::eyre::{Result, eyre};
use directories::ProjectDirs;
use env_logger::{Builder, Env, Target};

/// Log file name inside the data directory.
const LOG_FILE: &str = "nimbus.log";

/// Where the log file is written.
pub fn log_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "nimbus").map(|dirs| dirs.data_local_dir().join(LOG_FILE))
}

/// Initialize `env_logger`, honouring `RUST_LOG` and defaulting to `info`.
pub fn init() -> Result<PathBuf> {
    let path = log_path().ok_or_else(|| eyre!("could not determine a data directory"))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(&path)?;
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(path)
}
