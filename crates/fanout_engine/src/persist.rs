use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fanout_core::PipelineError;
use fanout_logging::fanout_warn;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {} missing or not writable: {message}", path.display())]
    OutputDir { path: PathBuf, message: String },
    #[error("refusing to replace existing file {}", .0.display())]
    Exists(PathBuf),
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<PersistError> for PipelineError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::OutputDir { path, message } => {
                PipelineError::io(path, io::Error::other(message))
            }
            PersistError::Exists(path) => PipelineError::FileConflict { path },
            PersistError::Io { path, source } => PipelineError::io(path, source),
        }
    }
}

fn io_at(path: &Path) -> impl FnOnce(io::Error) -> PersistError + '_ {
    move |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let output_dir_err = |e: io::Error| PersistError::OutputDir {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(output_dir_err)?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir {
                path: dir.to_path_buf(),
                message: "path is not a directory".into(),
            });
        }
    } else {
        fs::create_dir_all(dir).map_err(output_dir_err)?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(output_dir_err)?;
    Ok(())
}

/// A set of files written to hidden temporaries in one directory, made
/// visible together by [`StagedWrite::commit`].
///
/// Dropping an uncommitted batch removes every temporary.
pub struct StagedWrite {
    dir: PathBuf,
    staged: Vec<(PathBuf, NamedTempFile)>,
}

impl StagedWrite {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        ensure_output_dir(&dir)?;
        Ok(Self {
            dir,
            staged: Vec::new(),
        })
    }

    /// Write `content` to a synced temporary destined for `{dir}/{file_name}`.
    pub fn stage(&mut self, file_name: &str, content: &[u8]) -> Result<(), PersistError> {
        let target = self.dir.join(file_name);
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_at(&self.dir))?;
        tmp.write_all(content).map_err(io_at(&target))?;
        tmp.flush().map_err(io_at(&target))?;
        tmp.as_file_mut().sync_all().map_err(io_at(&target))?;
        self.staged.push((target, tmp));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Rename every temporary into place, in staging order.
    ///
    /// With `replace == false` an existing target aborts the commit with
    /// [`PersistError::Exists`]; files already placed by this commit are
    /// removed again so the directory is left as it was.
    pub fn commit(self, replace: bool) -> Result<Vec<PathBuf>, PersistError> {
        let mut committed: Vec<PathBuf> = Vec::with_capacity(self.staged.len());
        for (target, tmp) in self.staged {
            let persisted = if replace {
                tmp.persist(&target)
            } else {
                tmp.persist_noclobber(&target)
            };
            if let Err(err) = persisted {
                rollback(&committed);
                if !replace && err.error.kind() == io::ErrorKind::AlreadyExists {
                    return Err(PersistError::Exists(target));
                }
                return Err(PersistError::Io {
                    path: target,
                    source: err.error,
                });
            }
            committed.push(target);
        }
        Ok(committed)
    }
}

fn rollback(committed: &[PathBuf]) {
    for path in committed {
        if let Err(err) = fs::remove_file(path) {
            fanout_warn!("rollback could not remove {:?}: {}", path, err);
        }
    }
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
    replace: bool,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, replace: true }
    }

    /// Whether an existing file may be replaced; defaults to true.
    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let mut staged = StagedWrite::new(self.dir.clone())?;
        staged.stage(filename, content)?;
        staged.commit(self.replace)?;
        Ok(self.dir.join(filename))
    }
}
