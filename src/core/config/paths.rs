//! Filesystem locations used by the binary.
//!
//! Everything lives under two directories: the project root, where a shared
//! `config.yml` may sit, and a data directory holding per-user config,
//! secrets, logs and generated outlines.

use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::errors::OutlineError;

pub const ROOT_ENV: &str = "DOC_OUTLINE_ROOT";
pub const DATA_DIR_ENV: &str = "DOC_OUTLINE_DATA_DIR";
const DATA_DIR_NAME: &str = ".doc-outline";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl AppPaths {
    /// `$DOC_OUTLINE_ROOT` or the working directory; `$DOC_OUTLINE_DATA_DIR`
    /// or `<root>/.doc-outline`.
    pub fn from_env() -> Result<Self, OutlineError> {
        let root = match env::var_os(ROOT_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => env::current_dir().map_err(|e| OutlineError::io(".", e))?,
        };
        let data_dir = env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join(DATA_DIR_NAME));
        Self::under(root, data_dir)
    }

    /// Lay out paths below explicit directories and create `logs/` and
    /// `outlines/` inside the data directory.
    pub fn under(
        root: impl Into<PathBuf>,
        data_dir: impl Into<PathBuf>,
    ) -> Result<Self, OutlineError> {
        let data_dir = data_dir.into();
        let paths = Self {
            root: root.into(),
            log_dir: data_dir.join("logs"),
            output_dir: data_dir.join("outlines"),
            data_dir,
        };

        for dir in [&paths.log_dir, &paths.output_dir] {
            fs::create_dir_all(dir).map_err(|e| OutlineError::io(dir, e))?;
        }
        Ok(paths)
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.data_dir.join("secrets.yaml")
    }

    /// `config.yml` locations, most specific first.
    pub fn config_candidates(&self) -> [PathBuf; 2] {
        [
            self.data_dir.join("config.yml"),
            self.root.join("config.yml"),
        ]
    }
}
