use std::error::Error;

use modality_homogeneity::config::{self, ReportFormat};
use modality_homogeneity::ingest::store::load_store;
use modality_homogeneity::logging::{self, Stage};
use modality_homogeneity::render::{PlotDataExporter, SeriesRenderer};
use modality_homogeneity::report;
use modality_homogeneity::runner::{run_analysis, CategoryOutcome};

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let path = config::config_path(std::env::args().nth(1));
    let config = config::load_config(&path)?;
    logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );

    let bounds = config.window_bounds()?;

    logging::info(
        Stage::Store,
        None,
        &format!("🔍 Loading {}...", config.store_path.display()),
    );
    let store = match load_store(&config.store_path) {
        Ok(store) => store,
        Err(e) => {
            logging::error(Stage::Store, None, &e.to_string());
            return Err(e.into());
        }
    };
    logging::info(Stage::Store, None, &format!("{} categories loaded", store.len()));

    let exporter = config.plot_dir.as_ref().map(PlotDataExporter::new);
    let renderer = exporter.as_ref().map(|e| e as &dyn SeriesRenderer);

    let text = config.report_format == ReportFormat::Text;
    if text {
        println!("{}", report::format_run_header(&bounds));
    }

    let summary = run_analysis(store, &bounds, renderer, |outcome| {
        if !text {
            return;
        }
        if let CategoryOutcome::Analyzed { category, report: category_report, artifact } = outcome {
            println!("\n{}", report::format_report(category, category_report));
            if let Some(path) = artifact {
                println!("   📊 Plot data saved to: {}", path.display());
            }
        }
    });

    match config.report_format {
        ReportFormat::Text => println!("\n{}", report::format_summary(&summary)),
        ReportFormat::Json => println!("{}", report::format_json(&bounds, &summary)?),
    }

    Ok(())
}
