//! Entry point for the brainio application.
//! Handles CLI parsing and logging setup, and dispatches path resolution, resource
//! planning, rescaling and conversion commands.

use brainio::resources::{check_mem, detect_core_source};
use brainio::stack_io::StackLoadOptions;
use brainio::version::{check_for_update, CratesIoSource, CRATE_NAME, CURRENT_VERSION};
use brainio::{convert, paths, scale};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Args, Command, WorkerArgs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Paths { input, ext } => {
            for path in paths::get_sorted_file_paths(&input, ext.as_deref())? {
                println!("{path}");
            }
        }
        Command::Plan { workers, json } => {
            let source = detect_core_source();
            let budget = brainio::resources::compute_process_budget(
                source.as_ref(),
                workers.min_free_cores,
                workers.max_processes,
            )?;

            if json {
                let plan = serde_json::json!({
                    "source": source.name(),
                    "usable_cores": source.usable_cores()?,
                    "min_free_cores": workers.min_free_cores,
                    "max_processes": workers.max_processes,
                    "processes": budget,
                });
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("📊 Core source: {}", source.name());
                println!("   Usable cores: {}", source.usable_cores()?);
                println!("   Worker processes: {budget}");
                if budget < 1 {
                    println!("⚠ Budget leaves no workers; loaders will fall back to one");
                }
            }
        }
        Command::CheckMem {
            plane_bytes,
            planes,
        } => {
            check_mem(plane_bytes, planes)?;
            println!("✅ {planes} planes of {plane_bytes} bytes fit in available memory");
        }
        Command::ScaleZ {
            input,
            output,
            factor,
            workers,
        } => {
            let volume = convert::load_any(&input, &load_options(&workers, None))?;
            let scaled = scale::to_u16(&scale::scale_z(&volume.mapv(f32::from), factor)?);

            let written = convert::save_any(&scaled, &output)?;
            println!(
                "✅ Scaled {:?} -> {:?}, saved {} file(s) to {}",
                volume.shape(),
                scaled.shape(),
                written.len(),
                output.display()
            );
        }
        Command::ToNii {
            input,
            output,
            ext,
            workers,
        } => {
            convert::tiffs_to_nii(&input, &output, &load_options(&workers, ext))?;
            println!("✅ Saved result to {}", output.display());
        }
        Command::ToTiffs { input, output_dir } => {
            let written = convert::nii_to_tiffs(&input, &output_dir)?;
            println!("✅ Saved {} planes to {}", written.len(), output_dir.display());
        }
        Command::ToTiff { input, output } => {
            convert::nii_to_tiff(&input, &output)?;
            println!("✅ Saved result to {}", output.display());
        }
        Command::CheckVersion => {
            match check_for_update(CRATE_NAME, CURRENT_VERSION, &CratesIoSource::new())? {
                Some(notice) => println!("{notice}"),
                None => println!("✅ {CRATE_NAME} {CURRENT_VERSION} is up to date"),
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "brainio=debug" } else { "brainio=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_options(workers: &WorkerArgs, extension: Option<String>) -> StackLoadOptions {
    StackLoadOptions {
        extension,
        parallel: !workers.sequential,
        min_free_cores: workers.min_free_cores,
        max_processes: workers.max_processes,
        x_scale: workers.x_scale,
        y_scale: workers.y_scale,
    }
}
