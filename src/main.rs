use std::process::ExitCode;

use asciitiler::app::TilerApp;
use asciitiler::settings::Settings;
use asciitiler::{cli, io, log_err, logger};

fn main() -> ExitCode {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        return cli::run(cli::CliArgs::parse());
    }

    // -- GUI mode -----------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let settings = Settings::load();

    // Window icon is optional; a missing file only costs the title-bar image
    let icon = load_app_icon(&settings);

    let options = eframe::NativeOptions {
        viewport: {
            let mut vp = egui::ViewportBuilder::default()
                .with_inner_size([1280.0, 720.0])
                .with_maximized(true)
                .with_title("ASCII Art Generator");
            if let Some(icon_data) = icon {
                vp = vp.with_icon(std::sync::Arc::new(icon_data));
            }
            vp
        },
        ..Default::default()
    };

    match eframe::run_native(
        "AsciiTiler",
        options,
        Box::new(|cc| Box::new(TilerApp::new(cc, settings))),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_err!("Window failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Decode the configured icon file into raw RGBA for the egui viewport.
fn load_app_icon(settings: &Settings) -> Option<egui::viewport::IconData> {
    let (rgba, width, height) = io::load_icon_rgba(&settings.icon_path)?;
    Some(egui::viewport::IconData {
        rgba,
        width,
        height,
    })
}
