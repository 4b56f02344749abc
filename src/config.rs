use std::path::{Path, PathBuf};

pub const INPUT_FILE: &str = "munich.csv";
pub const REPORT_FILE: &str = "hava_durumu_raporu.txt";
pub const DAILY_CHART_FILE: &str = "daily_precipitation_trend.png";
pub const MONTHLY_CHART_FILE: &str = "monthly_precipitation_pattern.png";

/// Every knob of a run. There is no flag or file to change them; the binary
/// always uses [`Settings::default`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub city: String,
    pub input: PathBuf,
    pub delimiter: u8,
    pub report: PathBuf,
    pub daily_chart: PathBuf,
    pub monthly_chart: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            city: String::from("Munich"),
            input: PathBuf::from(INPUT_FILE),
            delimiter: b';',
            report: PathBuf::from(REPORT_FILE),
            daily_chart: PathBuf::from(DAILY_CHART_FILE),
            monthly_chart: PathBuf::from(MONTHLY_CHART_FILE),
        }
    }
}

impl Settings {
    /// The default settings with every file living in `dir` instead of the
    /// working directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            input: dir.join(INPUT_FILE),
            report: dir.join(REPORT_FILE),
            daily_chart: dir.join(DAILY_CHART_FILE),
            monthly_chart: dir.join(MONTHLY_CHART_FILE),
            ..Self::default()
        }
    }

    /// Name of a file as it should appear in the report, without the
    /// directory it was written to.
    pub fn display_name(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_in_the_working_directory() {
        let settings = Settings::default();
        assert_eq!(settings.input, Path::new("munich.csv"));
        assert_eq!(settings.report, Path::new("hava_durumu_raporu.txt"));
        assert_eq!(settings.delimiter, b';');
    }

    #[test]
    fn in_dir_moves_every_file() {
        let settings = Settings::in_dir("/tmp/run");
        assert_eq!(settings.input, Path::new("/tmp/run/munich.csv"));
        assert_eq!(
            settings.monthly_chart,
            Path::new("/tmp/run/monthly_precipitation_pattern.png")
        );
        assert_eq!(Settings::display_name(&settings.daily_chart), DAILY_CHART_FILE);
        assert_eq!(settings.city, "Munich");
    }
}
