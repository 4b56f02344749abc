//! Daily precipitation report for a single city.
//!
//! A run reads `munich.csv`, drops the days without a precipitation value,
//! summarises the period, draws a daily and a monthly chart and writes a
//! plain text report that is mirrored on the console. See [`pipeline::run`].

use std::io;

use miette::Diagnostic;
use thiserror::Error;

pub mod chart;
pub mod config;
pub mod date;
pub mod observation;
pub mod pipeline;
pub mod report;
pub mod summary;

pub use chart::{BitmapCharts, ChartRenderer, RenderError};
pub use config::Settings;
pub use observation::{
    Loader, MalformedInputError, MissingInputError, Normalized, Observation, ObservationTable,
};
pub use summary::{AggregationError, MonthlyPrecipitation, Summary};

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    MissingInput(#[from] MissingInputError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    MalformedInput(#[from] MalformedInputError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] RenderError),
    #[error("Could not write the report")]
    #[diagnostic(code(meteo_report::report))]
    Report(#[from] io::Error),
}

impl Error {
    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::MissingInput(_) => 1,
            _ => 2,
        }
    }
}
