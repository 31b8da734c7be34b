//! Migration files read from a directory on disk

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::migration::MIGRATION_SUFFIX;
use crate::domain::result::{Error, Result};
use crate::domain::MigrationFile;
use crate::ports::MigrationFileProvider;

/// Provider that reads every `*.sql` file in a directory
///
/// Other entries (READMEs, subdirectories) are ignored.
#[derive(Debug, Clone)]
pub struct DirectoryMigrations {
    dir: PathBuf,
}

impl DirectoryMigrations {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_error(&self, path: &Path, source: std::io::Error) -> Error {
        Error::DirectoryRead {
            path: path.display().to_string(),
            source,
        }
    }
}

impl MigrationFileProvider for DirectoryMigrations {
    fn origin(&self) -> String {
        self.dir.display().to_string()
    }

    fn files(&self) -> Result<Vec<MigrationFile>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| self.read_error(&self.dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| self.read_error(&self.dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(MIGRATION_SUFFIX) {
                continue;
            }

            let contents = fs::read_to_string(&path).map_err(|e| self.read_error(&path, e))?;
            files.push(MigrationFile::new(name, contents));
        }

        Ok(files)
    }
}
