// Copyright 2025-2026 CEMAXECUTER LLC

use clap::Parser;
use std::path::PathBuf;

use mw_app::pipeline::{self, Output};
use mw_app::Config;
use mw_output::Publisher;

#[derive(Parser, Debug)]
#[command(name = "mmwave-heatmap")]
#[command(about = "Range-azimuth heatmaps from an mmWave radar UART stream")]
struct Cli {
    /// Byte input: a capture file or an already-configured serial device
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Maximum bytes per read
    #[arg(long)]
    chunk_size: Option<usize>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid half-width in metres (x spans -w..w)
    #[arg(long)]
    range_width: Option<f64>,

    /// Grid depth in metres (y spans 0..d)
    #[arg(long)]
    range_depth: Option<f64>,

    /// Grid points along each axis
    #[arg(long)]
    grid_points: Option<usize>,

    /// Print statistics
    #[arg(long)]
    stats: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Publish over ZMQ PUB (connects to the endpoint)
    #[cfg(feature = "zmq")]
    #[arg(long)]
    publish: Option<String>,

    /// Publish over a ZMQ PUB socket bound to the endpoint
    #[cfg(feature = "zmq")]
    #[arg(long, conflicts_with = "publish")]
    publish_bind: Option<String>,

    /// Publish raw sample blocks instead of heatmaps
    #[cfg(feature = "zmq")]
    #[arg(long)]
    samples_only: bool,

    /// Bind a ZMQ SUB socket and build heatmaps from received sample blocks
    #[cfg(feature = "zmq")]
    #[arg(long, conflicts_with = "file")]
    subscribe: Option<String>,
}

impl Cli {
    fn load_config(&self) -> Result<Config, String> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(n) = self.chunk_size {
            config.chunk_size = n;
        }
        if let Some(w) = self.range_width {
            config.range_width = w;
        }
        if let Some(d) = self.range_depth {
            config.range_depth = d;
        }
        if let Some(n) = self.grid_points {
            config.grid_points_x = n;
            config.grid_points_y = n;
        }
        Ok(config)
    }

    #[cfg(feature = "zmq")]
    fn output(&self) -> Output {
        if self.samples_only {
            Output::Samples
        } else {
            Output::Heatmaps
        }
    }

    #[cfg(not(feature = "zmq"))]
    fn output(&self) -> Output {
        Output::Heatmaps
    }

    #[cfg(feature = "zmq")]
    fn subscribe_endpoint(&self) -> Option<&str> {
        self.subscribe.as_deref()
    }

    #[cfg(not(feature = "zmq"))]
    fn subscribe_endpoint(&self) -> Option<&str> {
        None
    }

    #[cfg(feature = "zmq")]
    fn publisher(&self) -> Result<Option<Box<dyn Publisher>>, String> {
        use mw_output::zmq_pub::ZmqPublisher;

        let publisher = match (&self.publish, &self.publish_bind) {
            (Some(endpoint), _) => ZmqPublisher::connect(endpoint),
            (None, Some(endpoint)) => ZmqPublisher::bind(endpoint),
            (None, None) => {
                if self.samples_only {
                    return Err("--samples-only needs --publish or --publish-bind".to_string());
                }
                return Ok(None);
            }
        };
        publisher
            .map(|p| Some(Box::new(p) as Box<dyn Publisher>))
            .map_err(|e| e.to_string())
    }

    #[cfg(not(feature = "zmq"))]
    fn publisher(&self) -> Result<Option<Box<dyn Publisher>>, String> {
        Ok(None)
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = cli.load_config()?;

    if cli.verbose {
        log::info!("mmwave-heatmap starting");
        log::info!("config: {:?}", config);
    }

    let publisher = cli.publisher()?;

    if let Some(endpoint) = cli.subscribe_endpoint() {
        return subscribe(endpoint, &config, publisher.as_deref());
    }

    match &cli.file {
        Some(file) => {
            pipeline::run_file(file, &config, cli.output(), publisher.as_deref(), cli.stats)?;
            Ok(())
        }
        None => Err("no input specified. Use -f <file> for a capture file or serial device.".to_string()),
    }
}

#[cfg(feature = "zmq")]
fn subscribe(endpoint: &str, config: &Config, publisher: Option<&dyn Publisher>) -> Result<(), String> {
    let mut subscriber = mw_output::zmq_pub::ZmqSubscriber::bind(endpoint, &[mw_output::TOPIC_SAMPLES])
        .map_err(|e| e.to_string())?;
    pipeline::run_subscriber(&mut subscriber, config, publisher)?;
    Ok(())
}

#[cfg(not(feature = "zmq"))]
fn subscribe(_endpoint: &str, _config: &Config, _publisher: Option<&dyn Publisher>) -> Result<(), String> {
    Err("built without zmq support".to_string())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
