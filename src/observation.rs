//! Loading and cleaning of the daily observation table.
//!
//! The input is a `;` separated file with a header row and exactly three
//! columns: a date, the precipitation in mm and the snowfall in cm. Columns
//! are bound by position, the header text itself is never looked at.

use std::{
    fs::File,
    io::{self, Read},
    num::ParseFloatError,
    path::{Path, PathBuf},
    slice,
};

use log::{debug, trace};
use miette::Diagnostic;
use thiserror::Error;
use time::Date;

use crate::date::{parse_date, DateError};

/// Cells that stand for "no measurement".
const MISSING_MARKERS: [&str; 11] = [
    "", "NaN", "nan", "-NaN", "NA", "N/A", "n/a", "NULL", "null", "None", "#N/A",
];

const COLUMNS: usize = 3;

#[derive(Debug, Error, Diagnostic)]
#[error("'{}' could not be found", .path.display())]
#[diagnostic(
    code(meteo_report::missing_input),
    help("the observation file must sit in the directory the report is run from")
)]
pub struct MissingInputError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Error, Diagnostic)]
pub enum MalformedInputError {
    #[error("Could not read the observation table")]
    #[diagnostic(code(meteo_report::malformed_input::csv))]
    Csv(#[from] csv::Error),
    #[error("Line {line}: expected 3 columns, found {found}")]
    #[diagnostic(
        code(meteo_report::malformed_input::columns),
        help("the columns are date;precipitation;snowfall")
    )]
    ColumnCount { line: u64, found: usize },
    #[error("Line {line}: bad date `{value}`")]
    #[diagnostic(code(meteo_report::malformed_input::date))]
    Date {
        line: u64,
        value: String,
        #[source]
        source: DateError,
    },
    #[error("Line {line}: bad {column} value `{value}`")]
    #[diagnostic(code(meteo_report::malformed_input::number))]
    Number {
        line: u64,
        column: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("Line {line}: {column} value `{value}` is not a finite number")]
    #[diagnostic(code(meteo_report::malformed_input::non_finite))]
    NonFinite {
        line: u64,
        column: &'static str,
        value: String,
    },
}

/// One unparsed line of the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: u64,
    pub time: String,
    pub precipitation: String,
    pub snowfall: String,
}

/// The input file as read, in source order, header removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn from_reader(reader: impl Read, delimiter: u8) -> Result<Self, MalformedInputError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header = reader.headers()?;
        if header.len() != COLUMNS {
            return Err(MalformedInputError::ColumnCount {
                line: 1,
                found: header.len(),
            });
        }
        trace!("discarding header {:?}", header);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |position| position.line());
            if record.len() != COLUMNS {
                return Err(MalformedInputError::ColumnCount {
                    line,
                    found: record.len(),
                });
            }
            rows.push(RawRow {
                line,
                time: record[0].to_string(),
                precipitation: record[1].to_string(),
                snowfall: record[2].to_string(),
            });
        }

        Ok(Self { rows })
    }
}

/// An opened input file. Opening is split from reading so that a missing file
/// is known before anything gets written.
#[derive(Debug)]
pub struct Loader {
    path: PathBuf,
    file: File,
}

impl Loader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref().to_path_buf();
        match File::open(&path) {
            Ok(file) => Ok(Self { path, file }),
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                Err(MissingInputError { path, source }.into())
            }
            Err(e) => Err(MalformedInputError::Csv(e.into()).into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(self, delimiter: u8) -> Result<RawTable, MalformedInputError> {
        let table = RawTable::from_reader(self.file, delimiter)?;
        debug!("read {} rows from {}", table.rows.len(), self.path.display());
        Ok(table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub time: Date,
    pub precipitation_mm: f64,
    pub snowfall_cm: Option<f64>,
}

impl Observation {
    /// Month number, 1 to 12.
    pub fn month(&self) -> u8 {
        self.time.month() as u8
    }
}

/// Observations in source order. Every row carries a precipitation value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    rows: Vec<Observation>,
}

impl ObservationTable {
    pub fn new(rows: Vec<Observation>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Observation> {
        self.rows.iter()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.rows
    }
}

impl FromIterator<Observation> for ObservationTable {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ObservationTable {
    type Item = &'a Observation;
    type IntoIter = slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub table: ObservationTable,
    pub original_rows: usize,
    pub dropped: usize,
}

/// Parses every row and drops the ones without a precipitation value.
///
/// Dates are parsed for all rows before anything is dropped, so a bad date
/// fails the run even on a row that would have been discarded. Snowfall is
/// allowed to be missing.
pub fn normalize(raw: RawTable) -> Result<Normalized, MalformedInputError> {
    let original_rows = raw.rows.len();

    let dated = raw
        .rows
        .into_iter()
        .map(|row| match parse_date(&row.time) {
            Ok(time) => Ok((time, row)),
            Err(source) => Err(MalformedInputError::Date {
                line: row.line,
                value: row.time,
                source,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::with_capacity(dated.len());
    for (time, row) in dated {
        let precipitation_mm = parse_value(&row, "precipitation_mm", &row.precipitation)?;
        let snowfall_cm = parse_value(&row, "snowfall_cm", &row.snowfall)?;

        match precipitation_mm {
            Some(precipitation_mm) => rows.push(Observation {
                time,
                precipitation_mm,
                snowfall_cm,
            }),
            None => debug!("line {}: no precipitation, row dropped", row.line),
        }
    }

    let table = ObservationTable::new(rows);
    Ok(Normalized {
        dropped: original_rows - table.len(),
        original_rows,
        table,
    })
}

fn parse_value(
    row: &RawRow,
    column: &'static str,
    cell: &str,
) -> Result<Option<f64>, MalformedInputError> {
    let cell = cell.trim();
    if MISSING_MARKERS.contains(&cell) {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_nan() => Ok(None),
        Ok(value) if value.is_infinite() => Err(MalformedInputError::NonFinite {
            line: row.line,
            column,
            value: cell.to_string(),
        }),
        Ok(value) => Ok(Some(value)),
        Err(source) => Err(MalformedInputError::Number {
            line: row.line,
            column,
            value: cell.to_string(),
            source,
        }),
    }
}
