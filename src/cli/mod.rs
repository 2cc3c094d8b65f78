// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
//   rnnvis seeddb    — seed the document store from config
//   rnnvis analyze   — export hidden-state statistics
//   rnnvis server    — not part of this binary
//
// `--debug` / `-d` raises the log level to debug.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{bail, Result};
use clap::Parser;
use commands::Method;

use crate::application::{
    analyze_use_case::{AnalyzeConfig, AnalyzeUseCase},
    seed_use_case::SeedUseCase,
    settings::Settings,
};
use crate::infra::{document_store::JsonFileStore, download::ZipDownloader};

#[derive(Parser, Debug)]
#[command(
    name = "rnnvis",
    version = "0.1.0",
    about = "Command line tools for running RNNVis"
)]
pub struct Cli {
    /// `server` to run the server, `seeddb` to initialise the db from
    /// config files, `analyze` to export hidden-state statistics
    #[arg(value_enum)]
    pub method: Method,

    /// Set this flag to debug
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// Default tracing directive for this invocation
    pub fn log_directive(&self) -> &'static str {
        if self.debug { "rnnvis=debug" } else { "rnnvis=info" }
    }

    /// Dispatch to the use case for `method`.
    pub fn run(self) -> Result<()> {
        let settings = Settings::from_env();
        match self.method {
            Method::Server  => bail!("the visualisation server is a separate front-end and is not built into this binary"),
            Method::Seeddb  => self.run_seeddb(&settings),
            Method::Analyze => self.run_analyze(&settings),
        }
    }

    fn run_seeddb(&self, settings: &Settings) -> Result<()> {
        let store = JsonFileStore::open(&settings.db_dir)?;
        let mut use_case = SeedUseCase::new(store, Box::new(ZipDownloader::sst()), &settings.data_dir);
        let seeded = use_case.execute(&settings.seed_config(), false)?;

        println!("Seeded {} datasets: {}", seeded.len(), seeded.join(", "));
        Ok(())
    }

    fn run_analyze(&self, settings: &Settings) -> Result<()> {
        let config = AnalyzeConfig::load(&settings.analysis_config())?;
        let store  = JsonFileStore::open(&settings.db_dir)?;
        let output = config.output_dir.clone();
        let report = AnalyzeUseCase::new(&store, config).execute()?;

        println!(
            "Analysed {} states ({} ids, {} layers); results in '{}'",
            report.state_count,
            report.distinct_ids,
            report.layer_count,
            output.display()
        );
        Ok(())
    }
}
