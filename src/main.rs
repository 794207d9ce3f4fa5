//! # laserlink CLI
//!
//! Command-line front-end for sending jobs to laser cutters and plotters.
//!
//! ## Usage
//!
//! ```bash
//! # Write the default settings for a dialect
//! laserlink init --dialect marlin -o driver.toml
//!
//! # Send a job to the configured device
//! laserlink send --config driver.toml job.json
//!
//! # Engrave a bitmap at 300 dpi
//! laserlink send --config driver.toml --dpi 300 --power 60 logo.png
//!
//! # Write the G-code a device would receive to a file
//! laserlink save --config driver.toml job.json -o job.gcode
//!
//! # List serial ports in the order auto-connect tries them
//! laserlink ports
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

use laserlink::{
    init_logging, is_candidate_port, list_ports, load_job, save_job, DeviceSession, DialectKind,
    DriverSettings, ImageImport, Point, ProgressListener, BUILD_DATE, VERSION,
};

/// laserlink - send laser and plotter jobs to G-code controllers
#[derive(Parser, Debug)]
#[command(name = "laserlink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a job to the device
    Send {
        #[command(flatten)]
        source: JobSource,
    },

    /// Write the G-code for a job without connecting
    Save {
        #[command(flatten)]
        source: JobSource,

        /// Output file ("-" for stdout)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List serial ports in the order auto-connect tries them
    Ports,

    /// Write default settings for a dialect
    Init {
        /// Dialect (generic, marlin, lasersaur, makeblock)
        #[arg(long, default_value = "generic")]
        dialect: DialectKind,

        /// Settings file to create (defaults to the user config directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct JobSource {
    /// Job file (.json, or a bitmap image)
    job: PathBuf,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resolution of bitmap jobs in dpi
    #[arg(long, default_value_t = 500.0)]
    dpi: f64,

    /// Laser power for bitmap jobs in percent
    #[arg(long, default_value_t = 100.0)]
    power: f64,

    /// Speed for bitmap jobs in percent
    #[arg(long, default_value_t = 100.0)]
    speed: f64,

    /// Keep grey levels of bitmap jobs
    #[arg(long)]
    greyscale: bool,

    /// Job origin on the bed, in pixels, as X,Y
    #[arg(long, value_parser = parse_point)]
    start: Option<Point>,
}

impl JobSource {
    fn image_import(&self) -> ImageImport {
        ImageImport {
            dpi: self.dpi,
            power: self.power,
            speed: self.speed,
            greyscale: self.greyscale,
            ..Default::default()
        }
    }
}

/// Reports progress through the log
struct LogProgress;

impl ProgressListener for LogProgress {
    fn progress_changed(&mut self, percent: u8) {
        info!("{}%", percent);
    }

    fn task_changed(&mut self, task: &str) {
        info!("{}", task);
    }
}

fn parse_point(s: &str) -> std::result::Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{s}'"))?;
    let x = x.trim().parse().map_err(|_| format!("invalid X '{x}'"))?;
    let y = y.trim().parse().map_err(|_| format!("invalid Y '{y}'"))?;
    Ok(Point::new(x, y))
}

fn load_settings(path: Option<&Path>) -> Result<DriverSettings> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(DriverSettings::default_path);
    if !path.exists() {
        info!("No settings at {}, using defaults", path.display());
        return Ok(DriverSettings::default());
    }
    DriverSettings::load_from_file(&path)
        .with_context(|| format!("Failed to load settings {}", path.display()))
}

fn prepare(source: &JobSource) -> Result<(DriverSettings, laserlink::LaserJob)> {
    let settings = load_settings(source.config.as_deref())?;
    let mut job = load_job(&source.job, &source.image_import())?;
    if let Some(start) = source.start {
        job = job.with_start_point(start);
    }
    Ok((settings, job))
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    info!("laserlink {} (built {})", VERSION, BUILD_DATE);

    match cli.command {
        Commands::Send { source } => {
            let (settings, job) = prepare(&source)?;
            let config = settings.session_config()?;
            let mut session = DeviceSession::new(config);
            session.send_job(&job, &mut LogProgress)?;
            info!("Job '{}' sent", job.name);
        }

        Commands::Save { source, output } => {
            let (settings, job) = prepare(&source)?;
            let config = settings.session_config()?;
            let lines = if output.as_os_str() == "-" {
                save_job(&config, &job, io::stdout().lock())?
            } else {
                let file = File::create(&output)
                    .with_context(|| format!("Failed to create {}", output.display()))?;
                save_job(&config, &job, BufWriter::new(file))?
            };
            info!("Wrote {} lines to {}", lines, output.display());
        }

        Commands::Ports => {
            let ports = list_ports()?;
            if ports.is_empty() {
                println!("No serial ports found");
            }
            // "*" marks ports that look like USB controllers
            for port in ports {
                let marker = if is_candidate_port(&port.port_name) { "*" } else { " " };
                match port.manufacturer {
                    Some(manufacturer) => println!(
                        "{} {}\t{} ({})",
                        marker, port.port_name, port.description, manufacturer
                    ),
                    None => println!("{} {}\t{}", marker, port.port_name, port.description),
                }
            }
        }

        Commands::Init { dialect, output } => {
            let path = output.unwrap_or_else(DriverSettings::default_path);
            let settings = DriverSettings::for_dialect(dialect);
            settings.save_to_file(&path)?;
            println!("Wrote {} settings to {}", dialect, path.display());
        }
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
