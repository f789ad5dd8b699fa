use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use whitecrop::process::{ProcessError, ProcessRequest};
use whitecrop::profile::CropMode;
use whitecrop::{config, output, process};

/// Shared flag for commands that read a config file.
#[derive(clap::Args, Clone)]
struct ConfigArgs {
    /// Path to a config.toml (stock defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "whitecrop")]
#[command(about = "Crop product photos to their foreground and frame them on a white canvas")]
#[command(long_about = "\
Crop product photos to their foreground and frame them on a white canvas

Every image is trimmed to the region that differs from its white backdrop,
fit into the profile's content box, and pasted onto a white canvas:

  default     content 1200x1200 centered on a 1620x1620 canvas
  alternate   content 1620x1300 at (0, 100) on a 1620x1620 canvas

More profiles can be defined in config.toml under [profiles.<name>].
Outputs are written as <output>/<input stem>.<format extension>.

Run 'whitecrop gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Log pipeline stages (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop and frame images
    Process {
        /// Image files and directories (directories are walked recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "processed")]
        output: PathBuf,

        /// Output profile name
        #[arg(short, long, default_value = "default")]
        profile: String,

        /// Convert format only: skip detection, cropping, and framing
        #[arg(long)]
        no_crop: bool,

        /// Disable the output cache and force re-encoding of all images
        #[arg(long)]
        no_cache: bool,

        /// Print the batch report as JSON instead of progress lines
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },
    /// List the available output profiles
    Profiles(ConfigArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Process {
            inputs,
            output,
            profile,
            no_crop,
            no_cache,
            json,
            config: config_args,
        } => {
            let app_config = config::load_config(config_args.config.as_deref())?;
            init_thread_pool(&app_config.processing);

            let request = ProcessRequest {
                inputs,
                output_dir: output,
                profile,
                mode: if no_crop {
                    CropMode::NoCrop
                } else {
                    CropMode::Crop
                },
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    if json {
                        continue;
                    }
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(&request, &app_config, !no_cache, Some(tx));
            printer.join().ok();

            let report = match result {
                Ok(report) => report,
                Err(ProcessError::BatchFailed { total, failures }) if json => {
                    let json = serde_json::json!({ "total": total, "failures": failures });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_summary(&report);
            }
            if !report.is_complete() {
                std::process::exit(1);
            }
        }
        Command::Profiles(config_args) => {
            let app_config = config::load_config(config_args.config.as_deref())?;
            output::print_profiles(&app_config.profiles);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the log subscriber: `warn` by default, `debug` with `--verbose`.
///
/// `RUST_LOG`, when set, wins over both.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. Users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
