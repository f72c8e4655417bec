//! CSV table writer
//!
//! Each table is written to `<dir>/<name>.csv`. Rows go to a temporary file
//! in the same directory first. Once every table of a set has been written,
//! the temporary files are renamed over their targets; if any step fails the
//! previous tables are restored and the temporary files removed.

use crate::output::traits::{OutputError, OutputResult, Table, TableWriter};
use std::path::{Path, PathBuf};

/// Writes tables as CSV files into one directory
#[derive(Debug, Clone)]
pub struct CsvOutput {
    dir: PathBuf,
}

impl CsvOutput {
    /// Creates the output directory (and parents) if needed
    ///
    /// # Returns
    ///
    /// * `Ok(CsvOutput)` - The directory exists and is ready
    /// * `Err(OutputError::CreateDir)` - The directory could not be created
    pub fn create(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// The directory tables are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the CSV file for a table name
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }

    fn staged_table(&self, name: &str) -> StagedTable {
        StagedTable {
            staging: self.dir.join(format!(".{}.csv.tmp", name)),
            backup: self.dir.join(format!(".{}.csv.bak", name)),
            target: self.table_path(name),
        }
    }

    /// Writes one table to its temporary file
    fn stage(&self, table: &Table) -> OutputResult<StagedTable> {
        let staged = self.staged_table(table.name);

        if let Err(e) = write_csv(&staged.staging, table) {
            staged.discard();
            return Err(e);
        }

        Ok(staged)
    }
}

impl TableWriter for CsvOutput {
    fn write_table(&self, table: &Table) -> OutputResult<PathBuf> {
        let mut paths = self.write_tables(std::slice::from_ref(table))?;
        paths.pop().ok_or(OutputError::NotAFile {
            path: self.table_path(table.name),
        })
    }

    fn write_tables(&self, tables: &[Table]) -> OutputResult<Vec<PathBuf>> {
        for table in tables {
            let path = self.table_path(table.name);
            if path.exists() && !path.is_file() {
                return Err(OutputError::NotAFile { path });
            }
        }

        let mut staged = Vec::with_capacity(tables.len());
        for table in tables {
            match self.stage(table) {
                Ok(table) => staged.push(table),
                Err(e) => {
                    staged.iter().for_each(StagedTable::discard);
                    return Err(e);
                }
            }
        }

        commit_all(&staged)?;

        for (table, staged) in tables.iter().zip(&staged) {
            tracing::debug!("Wrote {} rows to {}", table.len(), staged.target.display());
        }
        Ok(staged.into_iter().map(|s| s.target).collect())
    }
}

/// A table written to its temporary file, not yet in place
#[derive(Debug)]
struct StagedTable {
    staging: PathBuf,
    backup: PathBuf,
    target: PathBuf,
}

impl StagedTable {
    /// Moves the previous table aside and the new one into place
    ///
    /// Returns whether a previous table was moved aside.
    fn commit(&self) -> std::io::Result<bool> {
        let backed_up = self.target.is_file();
        if backed_up {
            std::fs::rename(&self.target, &self.backup)?;
        }

        if let Err(e) = std::fs::rename(&self.staging, &self.target) {
            if backed_up {
                restore(&self.backup, &self.target);
            }
            return Err(e);
        }

        Ok(backed_up)
    }

    /// Undoes a successful commit
    fn rollback(&self, backed_up: bool) {
        if backed_up {
            restore(&self.backup, &self.target);
        } else {
            remove_quietly(&self.target);
        }
    }

    fn discard(&self) {
        remove_quietly(&self.staging);
    }
}

fn write_csv(path: &Path, table: &Table) -> OutputResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Commits every staged table, or none of them
fn commit_all(staged: &[StagedTable]) -> OutputResult<()> {
    let mut committed: Vec<(&StagedTable, bool)> = Vec::with_capacity(staged.len());

    for table in staged {
        match table.commit() {
            Ok(backed_up) => committed.push((table, backed_up)),
            Err(e) => {
                tracing::error!("Failed to move {} into place: {}", table.target.display(), e);
                for (done, backed_up) in committed.iter().rev() {
                    done.rollback(*backed_up);
                }
                staged.iter().for_each(StagedTable::discard);
                return Err(e.into());
            }
        }
    }

    for (table, backed_up) in committed {
        if backed_up {
            remove_quietly(&table.backup);
        }
    }
    Ok(())
}

fn restore(backup: &Path, target: &Path) {
    if let Err(e) = std::fs::rename(backup, target) {
        tracing::warn!("Failed to restore {}: {}", target.display(), e);
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}
