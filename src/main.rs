// Standard library
use std::process;

// 3rd party crates
use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

// Project imports
use wut::errors::WutError;
use wut::functions::run;
use wut::settings::types::{Cli, Options, Settings};
use wut::utility::ip_detector::types::IpDetector;
use wut::VERSION;

/// Entry point of `wut`.
///
/// Prints the public address(es) of this host, either as a short single
/// address or as one line per family followed by the query time. Only
/// option and bind problems end the process with a failure status; network
/// failures are part of the report.
#[tokio::main]
async fn main() {
    // loads the .env file from the current directory or parents.
    dotenvy::dotenv().ok();

    let cli: Cli = Cli::parse();

    if let Err(e) = start(cli).await {
        eprintln!("{}", e);
        if e.is_usage_error() {
            eprintln!("{}", Cli::command().render_help());
        }
        process::exit(1);
    }
}

async fn start(cli: Cli) -> Result<(), WutError> {
    let settings: Settings = Settings::load()?;

    setup_logging(&settings.get_log_level());
    debug!("Settings have been loaded: {:?}", settings);

    let options: Options = Options::resolve(&cli, &settings)?;
    debug!("Resolved options: {:?}", options);

    if options.version {
        println!("`wut` version {}", VERSION);
        return Ok(());
    }

    let detector = IpDetector::http(options.apis.clone(), options.timeout);
    let output: String = run(&options, &detector).await?;

    if options.short {
        print!("{}", output);
    } else {
        println!("{}", output);
    }

    Ok(())
}

/// Logs go to stderr so stdout only carries the report.
fn setup_logging(log_level: &str) {
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .parse_lossy(format!(
            "{},hyper_util=error,reqwest=error,hyper=error",
            log_level
        ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}
