//! Objectify native client entry point

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use clap::Parser;
    use objectify::config::{ClientConfig, LogLevel};
    use objectify::constants::ENDPOINT_ENV_VAR;
    use objectify::download::FsArtifactSink;
    use objectify::native::{
        FilePreviews, TerminalFeedback, load_file, pick_image_file, run_interactive,
    };
    use objectify::{DetectionController, HttpDetectionClient};

    /// Send an image to an object-detection service and show what it found.
    #[derive(Debug, Parser)]
    #[command(name = "objectify-native", version)]
    pub struct Args {
        /// Image to submit. Opens a file dialog when omitted.
        pub image: Option<PathBuf>,

        /// Confidence threshold (clamped to 0.05 - 0.9)
        #[arg(short, long)]
        pub conf: Option<f64>,

        /// Detection endpoint URL
        #[arg(long, env = ENDPOINT_ENV_VAR)]
        pub endpoint: Option<String>,

        /// Configuration file (defaults to the user config directory)
        #[arg(long)]
        pub config: Option<PathBuf>,

        /// Directory for annotated.jpg
        #[arg(short, long)]
        pub output_dir: Option<PathBuf>,

        /// Save the annotated image after a successful submission
        #[arg(short, long)]
        pub download: bool,

        /// Only check that the detection service is reachable
        #[arg(long)]
        pub check: bool,

        /// Read commands from stdin instead of submitting once
        #[arg(short, long)]
        pub interactive: bool,

        /// Log verbosity (RUST_LOG takes precedence)
        #[arg(long, value_enum)]
        pub log_level: Option<LogLevel>,
    }

    fn load_config(args: &Args) -> Result<ClientConfig, String> {
        let config = match &args.config {
            Some(path) => ClientConfig::load(path)
                .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?,
            None => ClientConfig::load_from_default_path().unwrap_or_default(),
        };
        Ok(config.with_endpoint_override(args.endpoint.as_deref()))
    }

    fn init_logging(level: LogLevel) {
        env_logger::Builder::new()
            .filter_level(level.to_level_filter())
            .parse_default_env()
            .init();
    }

    pub async fn run(args: Args) -> ExitCode {
        let mut config = match load_config(&args) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        };
        if let Some(level) = args.log_level {
            config.log_level = level;
        }
        init_logging(config.log_level);

        let endpoint = match config.endpoint_url() {
            Ok(url) => url,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        };

        let output_dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.download_dir));
        let controller = DetectionController::new(
            &config,
            HttpDetectionClient::new(endpoint),
            Box::new(FilePreviews::default()),
            Box::new(FsArtifactSink::new(output_dir)),
            Box::new(TerminalFeedback),
        );
        if let Some(conf) = args.conf {
            controller.set_confidence_threshold(conf);
        }

        if args.check {
            return match controller.check_service().await {
                Ok(status) if status.is_ok() => {
                    println!(
                        "service: {} (model: {})",
                        status.status,
                        status.model.as_deref().unwrap_or("unknown")
                    );
                    ExitCode::SUCCESS
                }
                Ok(status) => {
                    eprintln!("service reports '{}'", status.status);
                    ExitCode::FAILURE
                }
                Err(e) => {
                    eprintln!("service unreachable: {}", e);
                    ExitCode::FAILURE
                }
            };
        }

        if args.interactive {
            if let Some(path) = &args.image {
                controller.select_file(load_file(path, &TerminalFeedback));
            }
            let stdin = std::io::stdin();
            return match run_interactive(&controller, &TerminalFeedback, stdin.lock(), std::io::stdout())
                .await
            {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("I/O error: {}", e);
                    ExitCode::FAILURE
                }
            };
        }

        let Some(path) = args.image.clone().or_else(pick_image_file) else {
            eprintln!("No image selected");
            return ExitCode::FAILURE;
        };
        controller.select_file(load_file(&path, &TerminalFeedback));
        if controller.submit().await.is_err() {
            return ExitCode::FAILURE;
        }
        print!("{}", controller.view());

        if args.download {
            match controller.download_annotated() {
                Ok(Some(location)) => println!("saved {}", location),
                Ok(None) => println!("no annotated image in the response"),
                Err(_) => return ExitCode::FAILURE,
            }
        }
        ExitCode::SUCCESS
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    use clap::Parser;

    cli::run(cli::Args::parse()).await
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
