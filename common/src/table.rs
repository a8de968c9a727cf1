use core::fmt::Display;
use std::path::Path;

use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::error::GenerateError;

/// A labelled 2-D grid read from a CSV whose first column is the row index
#[derive(Debug, Clone, PartialEq)]
pub struct Table<T> {
    pub index_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row<T>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row<T> {
    pub label: String,
    pub cells: Vec<T>,
}

/// Position of a cell, by row label and column name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef<'a> {
    pub row: &'a str,
    pub column: &'a str,
}

impl Table<String> {
    /// Parses a layout CSV. `path` is only used for error reporting.
    pub fn from_csv(data: &str, path: &Path) -> Result<Self, GenerateError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data.as_bytes());

        let headers = reader.headers()?.clone();
        let mut headers = headers.iter();
        let index_name = headers
            .next()
            .ok_or_else(|| GenerateError::Layout {
                path: path.to_path_buf(),
                reason: "missing header row".to_owned(),
            })?
            .to_owned();
        let columns = headers.map(|x| x.to_owned()).collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut fields = record.iter().map(|x| x.to_owned());
            let label = fields.next().unwrap_or_default();
            rows.push(Row {
                label,
                cells: fields.collect(),
            });
        }

        Ok(Self {
            index_name,
            columns,
            rows,
        })
    }
}

impl<T> Table<T> {
    /// (rows, columns) of the data grid, excluding the index column
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Builds a new table of the same shape, visiting cells in row-major
    /// order and stopping at the first error.
    pub fn try_map<U, E, F>(&self, mut f: F) -> Result<Table<U>, E>
    where
        F: FnMut(CellRef<'_>, &T) -> Result<U, E>,
    {
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let cells = row
                .cells
                .iter()
                .zip(&self.columns)
                .map(|(cell, column)| {
                    f(
                        CellRef {
                            row: &row.label,
                            column,
                        },
                        cell,
                    )
                })
                .collect::<Result<Vec<_>, E>>()?;
            rows.push(Row {
                label: row.label.clone(),
                cells,
            });
        }
        Ok(self.with_rows(rows))
    }

    /// Same as [`Table::try_map`], but cells are visited on the current rayon
    /// pool. The resulting table is identical as long as `f` only depends on
    /// its arguments.
    pub fn par_try_map<U, E, F>(&self, f: F) -> Result<Table<U>, E>
    where
        T: Sync,
        U: Send,
        E: Send,
        F: Fn(CellRef<'_>, &T) -> Result<U, E> + Sync,
    {
        let rows = self
            .rows
            .par_iter()
            .map(|row| {
                let cells = row
                    .cells
                    .par_iter()
                    .zip(self.columns.par_iter())
                    .map(|(cell, column)| {
                        f(
                            CellRef {
                                row: &row.label,
                                column,
                            },
                            cell,
                        )
                    })
                    .collect::<Result<Vec<_>, E>>()?;
                Ok(Row {
                    label: row.label.clone(),
                    cells,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;
        Ok(self.with_rows(rows))
    }

    fn with_rows<U>(&self, rows: Vec<Row<U>>) -> Table<U> {
        Table {
            index_name: self.index_name.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }
}

impl<T: Display> Table<T> {
    pub fn to_csv(&self) -> Result<Vec<u8>, GenerateError> {
        let mut buf = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            writer.write_record(std::iter::once(&self.index_name).chain(&self.columns))?;
            for row in &self.rows {
                writer.write_record(
                    std::iter::once(row.label.clone())
                        .chain(row.cells.iter().map(|x| x.to_string())),
                )?;
            }
            writer.flush().map_err(csv::Error::from)?;
        }
        Ok(buf)
    }
}
