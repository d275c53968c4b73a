use crate::pipeline::diagnostic::Diagnostic;
use crate::table::error::TableError;
use crate::table::output::SpiTable;
use std::path::{Path, PathBuf};

/// Everything one pipeline run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiReport {
    pub(crate) tables: Vec<SpiTable>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl SpiReport {
    /// One table per configured window, in the configured order.
    pub fn tables(&self) -> &[SpiTable] {
        &self.tables
    }

    /// The table for a window of `months` months, if it was configured.
    pub fn table(&self, months: u32) -> Option<&SpiTable> {
        self.tables.iter().find(|t| t.window().months() == months)
    }

    /// Diagnostics in station order, then window order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn diagnostics_for<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.station_code == code)
    }

    /// Writes every table to `dir` as `spi_<months>.csv` and returns the paths written.
    pub fn write_csv_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, TableError> {
        std::fs::create_dir_all(dir).map_err(|e| TableError::Io(dir.to_path_buf(), e))?;
        self.tables
            .iter()
            .map(|table| {
                let path = dir.join(format!("spi_{}.csv", table.window().months()));
                table.write_csv(&path)?;
                Ok(path)
            })
            .collect()
    }

    pub fn into_parts(self) -> (Vec<SpiTable>, Vec<Diagnostic>) {
        (self.tables, self.diagnostics)
    }
}
