use std::io::Write;

use log::{error, info, warn};

use crate::{
    chart::ChartRenderer,
    config::Settings,
    observation::{normalize, Loader},
    report::{self, ReportSink},
    summary::Summary,
    Error,
};

/// What a successful run computed.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub original_rows: usize,
    pub dropped: usize,
    pub summary: Summary,
}

/// Runs the whole analysis: load, clean, summarise, draw, report.
///
/// A missing input file is reported on `console` only and nothing is written
/// to disk. Once the report file exists every error is written into it with
/// its cause chain, and the report is closed before the error is returned.
pub fn run<C>(
    settings: &Settings,
    charts: &impl ChartRenderer,
    mut console: C,
) -> Result<Outcome, Error>
where
    C: Write + 'static,
{
    let loader = match Loader::open(&settings.input) {
        Err(Error::MissingInput(missing)) => {
            let written = report::missing_input(&settings.input)
                .iter()
                .try_for_each(|line| writeln!(console, "{line}"));
            if let Err(e) = written {
                warn!("could not print the missing input notice: {e}");
            }
            return Err(missing.into());
        }
        opened => opened,
    };

    let mut sink = ReportSink::create(&settings.report, console)?;
    match analyse(settings, charts, loader, &mut sink) {
        Ok(outcome) => {
            sink.close()?;
            info!("report written to {}", settings.report.display());
            Ok(outcome)
        }
        Err(err) => {
            error!("analysis failed: {err}");
            if let Err(e) = sink.emit_all(report::failure(&err)) {
                warn!("could not write the failure into the report: {e}");
            }
            if let Err(e) = sink.close() {
                warn!("could not close the report: {e}");
            }
            Err(err)
        }
    }
}

fn analyse(
    settings: &Settings,
    charts: &impl ChartRenderer,
    loader: Result<Loader, Error>,
    sink: &mut ReportSink,
) -> Result<Outcome, Error> {
    sink.emit_all(report::title(settings))?;

    sink.emit(report::preparation_heading())?;
    let raw = loader?.read(settings.delimiter)?;
    sink.emit(report::loaded(settings))?;
    let normalized = normalize(raw)?;
    sink.emit_all(report::cleaned(&normalized))?;

    let summary = Summary::compute(&normalized.table)?;
    sink.blank()?;
    sink.emit_all(report::analysis(&summary, settings))?;

    sink.blank()?;
    sink.emit(report::visualisation_heading())?;
    charts.daily_trend(&normalized.table, &summary, &settings.daily_chart)?;
    sink.emit(report::chart_created(&settings.daily_chart))?;
    charts.monthly_pattern(&summary, &settings.monthly_chart)?;
    sink.emit(report::chart_created(&settings.monthly_chart))?;

    sink.blank()?;
    sink.emit(report::executive_summary_heading())?;
    sink.emit_all(report::executive_summary(&summary, settings))?;
    sink.emit_all(report::closing())?;

    Ok(Outcome {
        original_rows: normalized.original_rows,
        dropped: normalized.dropped,
        summary,
    })
}
