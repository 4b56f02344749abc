use std::process::ExitCode;

use meteo_report::{pipeline, BitmapCharts, Settings};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let settings = Settings::default();
    let charts = BitmapCharts::new(settings.city.clone());

    match pipeline::run(&settings, &charts, std::io::stdout()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(err.exit_code()),
    }
}
