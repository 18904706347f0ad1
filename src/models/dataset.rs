use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Cell values treated as missing, in addition to the empty string.
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(cell: &str) -> bool {
    cell.is_empty() || NA_TOKENS.contains(&cell)
}

/// An in-memory CSV table. Row order is preserved from the source file and
/// is the only key tying output cells back to input rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows.into_iter().map(|row| pad(row, width)).collect();
        Self { headers, rows }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open {}: {}", path.display(), e),
            ))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let width = headers.len();

        // Short rows are padded; wide rows have no header to land under
        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record: StringRecord = record?;
            if record.len() > width {
                return Err(Error::Dataset(format!(
                    "row {} has {} fields but the header has {}",
                    index + 1,
                    record.len(),
                    width
                )));
            }
            rows.push(pad(record.iter().map(String::from).collect(), width));
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Column values in row order; missing cells come back as `None`.
    pub fn column(&self, name: &str) -> Result<Vec<Option<String>>> {
        let idx = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| {
                let cell = &row[idx];
                (!is_missing(cell)).then(|| cell.clone())
            })
            .collect())
    }

    /// Raw cell text in row order, missing or not.
    pub fn raw_column(&self, name: &str) -> Result<Vec<String>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    pub fn has_missing(&self, name: &str) -> Result<bool> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().any(|row| is_missing(&row[idx])))
    }

    /// Overwrites `name` if it exists, otherwise appends it as the last column.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::Dataset(format!(
                "column '{}' has {} values but the dataset has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        match self.headers.iter().position(|h| h == name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }

        Ok(())
    }

    /// Keeps only the rows whose position in `keep` is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        let mut idx = 0;
        self.rows.retain(|_| {
            let kept = keep.get(idx).copied().unwrap_or(true);
            idx += 1;
            kept
        });
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        self.write_to(file)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = WriterBuilder::new().from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn pad(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}
