mod config;
mod wiring;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use turbo_codec::SpecimenResult;

#[derive(Parser, Debug)]
#[command(author, version, about = "Turbo coding BER simulation harness")]
struct Args {
    /// TOML config file naming the specimens to run
    config: PathBuf,

    /// Override the worker-thread count from the config file
    #[arg(long)]
    workers: Option<usize>,

    /// Optional file to additionally mirror log output to
    #[arg(long)]
    log_file: Option<String>,
}

fn load_config_from_toml(path: &PathBuf) -> config::SimConfig {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to read {}: {e}", path.display());
            std::process::exit(1);
        }
    };
    match config::from_str(&raw) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load configuration from {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn main() {
    let args = Args::parse();
    let _log_guard = turbo_core::debug::setup_logging_default(args.log_file.clone());

    let sim_config = load_config_from_toml(&args.config);
    let workers = args.workers.unwrap_or(sim_config.workers);

    tracing::info!(runs = sim_config.runs.len(), workers, "loaded configuration");

    let mut specimens = Vec::with_capacity(sim_config.runs.len());
    for run in &sim_config.runs {
        match wiring::build_specimen(run) {
            Ok(specimen) => specimens.push(specimen),
            Err(e) => {
                eprintln!("invalid run '{}': {e}", run.description);
                std::process::exit(1);
            }
        }
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        tracing::warn!("received interrupt, finishing the in-flight repeat then stopping");
        shutdown_handler.store(true, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    let start_time = std::time::Instant::now();
    let results = turbo_codec::harness::run_all(specimens, workers, shutdown);

    for result in &results {
        match result {
            Ok(r) => print_progress(r),
            Err(e) => eprintln!("specimen failed: {e}"),
        }
    }

    let time_elapsed = start_time.elapsed().as_secs_f64();
    let ok_results: Vec<SpecimenResult> = results.into_iter().filter_map(Result::ok).collect();
    let log_file = args.log_file.clone().unwrap_or_default();
    match save_results(&args.config, time_elapsed, workers, &log_file, &ok_results) {
        Ok(path) => println!("\nFile saved: {}", path.display()),
        Err(e) => eprintln!("failed to save results: {e}"),
    }
}

fn print_progress(result: &SpecimenResult) {
    print!("[{}] ", result.description);
    for (ebn0_db, ber) in result.ebn0s.iter().zip(result.bers.iter()) {
        print!("{ebn0_db:.1}dB={ber:.3e} ");
    }
    println!();
}

fn save_results(
    config_path: &PathBuf,
    time_elapsed: f64,
    processes: usize,
    log_file: &str,
    results: &[SpecimenResult],
) -> std::io::Result<PathBuf> {
    let out_folder = PathBuf::from("out");
    fs::create_dir_all(&out_folder)?;

    let entries = fs::read_dir(&out_folder)?.count();
    let basename = config_path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "run".to_string());
    let out_file = out_folder.join(format!("{:x}_{}.json", entries, basename));

    let document = ResultDocument {
        date: chrono::Local::now().to_rfc3339(),
        time_elapsed,
        specimens: results.len(),
        processes,
        log_file: log_file.to_string(),
        results: results.to_vec(),
    };
    let json = serde_json::to_string_pretty(&document)?;
    fs::write(&out_file, json)?;
    Ok(out_file)
}

/// Mirrors the reference simulation driver's persisted result document
/// verbatim: `{date, time_elapsed, specimens, processes, log_file, results}`.
#[derive(serde::Serialize)]
struct ResultDocument {
    date: String,
    time_elapsed: f64,
    specimens: usize,
    processes: usize,
    log_file: String,
    results: Vec<SpecimenResult>,
}
