//! The report document: where its lines go and what they say.

use std::{
    fs::File,
    io::{self, LineWriter, Write},
    path::{Path, PathBuf},
};

use log::warn;
use miette::{GraphicalReportHandler, GraphicalTheme};

use crate::{
    config::Settings,
    date::{format_iso, month_abbr, month_name},
    observation::Normalized,
    summary::{MonthlyPrecipitation, Summary},
    Error,
};

const BANNER_WIDTH: usize = 60;

/// Writes every report line to the report file and to the console.
///
/// The file is truncated on creation and flushed after each line, so whatever
/// was emitted before a crash is on disk. Dropping the sink flushes both
/// destinations, [`ReportSink::close`] does the same but reports failures.
pub struct ReportSink {
    path: PathBuf,
    file: LineWriter<File>,
    console: Box<dyn Write>,
    closed: bool,
}

impl ReportSink {
    pub fn create(path: impl AsRef<Path>, console: impl Write + 'static) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = LineWriter::new(File::create(&path)?);
        Ok(Self {
            path,
            file,
            console: Box::new(console),
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn emit(&mut self, line: impl AsRef<str>) -> io::Result<()> {
        let line = line.as_ref();
        writeln!(self.file, "{line}")?;
        writeln!(self.console, "{line}")?;
        self.console.flush()
    }

    pub fn blank(&mut self) -> io::Result<()> {
        self.emit("")
    }

    pub fn emit_all<I>(&mut self, lines: I) -> io::Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        lines.into_iter().try_for_each(|line| self.emit(line))
    }

    pub fn close(mut self) -> io::Result<()> {
        self.closed = true;
        self.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.console.flush()
    }
}

impl Drop for ReportSink {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.flush() {
            warn!("could not flush {}: {e}", self.path.display());
        }
    }
}

fn banner() -> String {
    "=".repeat(BANNER_WIDTH)
}

fn heading(title: &str) -> String {
    format!("--- {title} ---")
}

pub fn title(settings: &Settings) -> Vec<String> {
    vec![
        banner(),
        heading(&format!(
            "WEATHER DATA ANALYSIS REPORT ({})",
            settings.city.to_uppercase()
        )),
        banner(),
        format!("Report file: {}", Settings::display_name(&settings.report)),
        String::new(),
    ]
}

pub fn preparation_heading() -> String {
    heading("STAGE 1: DATA LOADING AND PREPARATION")
}

pub fn loaded(settings: &Settings) -> String {
    format!(
        "Done: '{}' loaded.",
        Settings::display_name(&settings.input)
    )
}

pub fn cleaned(normalized: &Normalized) -> Vec<String> {
    vec![
        String::from("Done: column names cleaned ('time', 'precipitation_mm', 'snowfall_cm')."),
        String::from("Done: 'time' column converted to dates."),
        format!(
            "Done: missing values removed ({} rows).",
            normalized.dropped
        ),
        format!(
            "{} valid rows left to analyse.",
            normalized.table.len()
        ),
    ]
}

pub fn analysis(summary: &Summary, settings: &Settings) -> Vec<String> {
    let mut lines = vec![
        heading("STAGE 2: BASIC ANALYSIS (CLIMATE TRENDS)"),
        format!(
            "Analysis period: {} to {}.",
            format_iso(summary.period_start),
            format_iso(summary.period_end)
        ),
        String::new(),
        String::from("Totals:"),
        format!(
            "  Total precipitation: {:.2} mm",
            summary.total_precipitation
        ),
        format!("  Total snowfall: {:.2} cm", summary.total_snowfall),
        String::new(),
        String::from("Outliers (wettest day):"),
        format!("  Wettest day: {}", format_iso(summary.wettest_day.time)),
        format!(
            "  Precipitation: {} mm",
            summary.wettest_day.precipitation_mm
        ),
        String::new(),
        String::from("Monthly total precipitation (seasonal pattern):"),
    ];
    lines.extend(monthly_table(&summary.monthly_precipitation));
    lines.push(format!(
        "(See '{}' for details.)",
        Settings::display_name(&settings.monthly_chart)
    ));
    lines
}

/// The monthly frequency table, one row per month present in the data.
pub fn monthly_table(monthly: &MonthlyPrecipitation) -> Vec<String> {
    let mut lines = vec![format!(
        "{:>5}  {:<5}{:>26}",
        "month", "name", "total precipitation (mm)"
    )];
    lines.extend(monthly.iter().map(|(month, total)| {
        format!(
            "{:>5}  {:<5}{:>26.2}",
            month,
            month_abbr(month).unwrap_or("?"),
            total
        )
    }));
    lines
}

pub fn visualisation_heading() -> String {
    heading("STAGE 3: VISUALISATION")
}

pub fn chart_created(path: &Path) -> String {
    format!("Chart created: '{}'", Settings::display_name(path))
}

pub fn executive_summary_heading() -> String {
    heading("STAGE 4: EXECUTIVE SUMMARY")
}

/// The closing paragraph. The seasonal sentence names the two months with the
/// most precipitation, wettest first.
pub fn executive_summary(summary: &Summary, settings: &Settings) -> Vec<String> {
    let months: Vec<String> = summary
        .monthly_precipitation
        .wettest_months(2)
        .into_iter()
        .filter_map(month_name)
        .collect();
    let months = match months.as_slice() {
        [first, second, ..] => format!("{first} and {second}"),
        [only] => only.clone(),
        [] => String::from("no particular month"),
    };

    vec![
        format!(
            "The analysis covers {} days of {} weather data between {} and {}.",
            summary.observed_days,
            settings.city,
            format_iso(summary.period_start),
            format_iso(summary.period_end)
        ),
        format!(
            "A total of {:.2} mm of precipitation was recorded in this period.",
            summary.total_precipitation
        ),
        format!(
            "The heaviest precipitation was measured on {} with {} mm.",
            format_iso(summary.wettest_day.time),
            summary.wettest_day.precipitation_mm
        ),
        format!(
            "The monthly analysis shows precipitation concentrated in {} (see '{}').",
            months,
            Settings::display_name(&settings.monthly_chart)
        ),
    ]
}

pub fn closing() -> Vec<String> {
    vec![
        String::new(),
        String::new(),
        banner(),
        heading("WEATHER ANALYSIS REPORT COMPLETE"),
        banner(),
    ]
}

/// The two console lines printed when the observation file is absent.
pub fn missing_input(path: &Path) -> [String; 2] {
    let name = Settings::display_name(path);
    [
        format!("[ERROR] '{name}' could not be found."),
        format!("Make sure '{name}' is in the directory the report is run from."),
    ]
}

/// Error banner, message and the full cause chain of a failed run.
pub fn failure(err: &Error) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        String::from("!!! AN UNEXPECTED ERROR OCCURRED DURING THE ANALYSIS !!!"),
        format!("Error detail: {err}"),
        String::from("Trace:"),
    ];

    let mut trace = String::new();
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    if handler.render_report(&mut trace, err).is_err() {
        trace = format!("{err:?}");
    }
    lines.extend(trace.lines().map(|line| line.trim_end().to_string()));
    lines
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use time::{Date, Month};

    use super::*;
    use crate::{
        observation::{Observation, ObservationTable},
        summary::AggregationError,
    };

    #[derive(Clone, Default)]
    struct Console(Rc<RefCell<Vec<u8>>>);

    impl Write for Console {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn summary(rows: &[(u8, u8, f64)]) -> Summary {
        let table: ObservationTable = rows
            .iter()
            .map(|&(month, day, precipitation_mm)| Observation {
                time: Date::from_calendar_date(2024, Month::try_from(month).unwrap(), day)
                    .unwrap(),
                precipitation_mm,
                snowfall_cm: Some(0.5),
            })
            .collect();
        Summary::compute(&table).unwrap()
    }

    #[test]
    fn sink_mirrors_lines_to_file_and_console() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let console = Console::default();

        let mut sink = ReportSink::create(&path, console.clone()).unwrap();
        assert_eq!(sink.path(), path);
        sink.emit("first").unwrap();
        sink.blank().unwrap();
        sink.emit_all(["second", "third"]).unwrap();
        // already on disk before closing
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "first\n\nsecond\nthird\n"
        );
        sink.close().unwrap();

        let console = String::from_utf8(console.0.borrow().clone()).unwrap();
        assert_eq!(console, "first\n\nsecond\nthird\n");
    }

    #[test]
    fn sink_truncates_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "an old and much longer report\n").unwrap();

        let mut sink = ReportSink::create(&path, io::sink()).unwrap();
        sink.emit("new").unwrap();
        drop(sink);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn monthly_table_rows() {
        let summary = summary(&[(3, 1, 2.0), (4, 1, 5.0)]);
        let table = monthly_table(&summary.monthly_precipitation);
        assert_eq!(table.len(), 3);
        assert!(table[1].trim_start().starts_with("3  Mar"));
        assert!(table[1].ends_with("2.00"));
        assert!(table[2].trim_start().starts_with("4  Apr"));
        assert!(table[2].ends_with("5.00"));
    }

    #[test]
    fn summary_names_the_wettest_months() {
        let summary = summary(&[(3, 1, 2.0), (5, 1, 9.0), (6, 2, 4.0), (4, 1, 1.0)]);
        let lines = executive_summary(&summary, &Settings::default());
        assert_eq!(
            lines,
            vec![
                "The analysis covers 4 days of Munich weather data between 2024-03-01 and 2024-06-02.",
                "A total of 16.00 mm of precipitation was recorded in this period.",
                "The heaviest precipitation was measured on 2024-05-01 with 9 mm.",
                "The monthly analysis shows precipitation concentrated in May and June (see 'monthly_precipitation_pattern.png').",
            ]
        );
    }

    #[test]
    fn summary_with_a_single_month() {
        let summary = summary(&[(3, 1, 2.5), (3, 2, 0.5)]);
        let lines = executive_summary(&summary, &Settings::default());
        assert!(lines[3].contains("concentrated in March (see"));
    }

    #[test]
    fn analysis_formats_totals() {
        let summary = summary(&[(3, 1, 2.0), (4, 1, 5.25)]);
        let lines = analysis(&summary, &Settings::default());
        assert!(lines.contains(&String::from("  Total precipitation: 7.25 mm")));
        assert!(lines.contains(&String::from("  Total snowfall: 1.00 cm")));
        assert!(lines.contains(&String::from("  Wettest day: 2024-04-01")));
        assert!(lines.contains(&String::from("  Precipitation: 5.25 mm")));
        assert_eq!(
            lines.last().unwrap(),
            "(See 'monthly_precipitation_pattern.png' for details.)"
        );
    }

    #[test]
    fn title_names_the_city_and_report() {
        let lines = title(&Settings::in_dir("/somewhere"));
        assert_eq!(lines[0], "=".repeat(60));
        assert_eq!(lines[1], "--- WEATHER DATA ANALYSIS REPORT (MUNICH) ---");
        assert_eq!(lines[3], "Report file: hava_durumu_raporu.txt");
    }

    #[test]
    fn failure_contains_the_cause_chain() {
        let err = Error::from(AggregationError::EmptySeries { column: "time" });
        let lines = failure(&err);
        assert_eq!(
            lines[1],
            "!!! AN UNEXPECTED ERROR OCCURRED DURING THE ANALYSIS !!!"
        );
        assert!(lines[2].starts_with("Error detail: No observation left"));
        let trace = lines[4..].join("\n");
        assert!(trace.contains("meteo_report::aggregation::empty_series"));
    }

    #[test]
    fn missing_input_lines() {
        let [first, second] = missing_input(Path::new("/data/munich.csv"));
        assert_eq!(first, "[ERROR] 'munich.csv' could not be found.");
        assert!(second.contains("'munich.csv'"));
    }
}
