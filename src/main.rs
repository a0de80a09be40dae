use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use vic_forcing::{
    config::Config,
    extract::{extract_points, merge_artifacts},
    normalize::{self, Unit},
    PrepError,
};

fn main() {
    init_logging();
    let matches = build_cli().get_matches();

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let result = match matches.subcommand() {
        Some(("normalize", sub_matches)) => run_normalize(&config, sub_matches),
        Some(("extract", _)) => extract_points(&config)
            .map(|_| ())
            .map_err(|e| e.in_unit("extract")),
        Some(("merge", _)) => merge_artifacts(&config)
            .map(|_| ())
            .map_err(|e| e.in_unit("merge")),
        _ => {
            error!("Please specify a subcommand. Use --help for more information.");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vic_forcing=info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(matches: &ArgMatches) -> Result<Config, PrepError> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    let config = match matches.get_one::<PathBuf>("work-dir") {
        Some(dir) => config.with_work_dir(dir),
        None => config,
    };
    config.validate()?;
    Ok(config)
}

/// Run the requested units. With `all`, every unit runs even if an earlier
/// one failed.
fn run_normalize(config: &Config, matches: &ArgMatches) -> Result<(), PrepError> {
    let units: Vec<Unit> = match matches.get_one::<String>("unit").map(String::as_str) {
        Some("all") | None => Unit::ALL.to_vec(),
        Some(name) => vec![name.parse::<Unit>()?],
    };

    let mut failed = 0;
    for unit in &units {
        match normalize::run(config, *unit) {
            Ok(paths) => info!("{} done ({} artifact(s))", unit, paths.len()),
            Err(e) => {
                error!("{}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        if units.len() > 1 {
            error!("{} of {} unit(s) failed", failed, units.len());
        }
        std::process::exit(1);
    }
    Ok(())
}

fn build_cli() -> Command {
    let unit_names: Vec<&'static str> = Unit::ALL
        .iter()
        .map(|u| u.name())
        .chain(std::iter::once("all"))
        .collect();

    Command::new("vic_forcing")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Prepare VIC forcing input from ERA5 and CHIRPS NetCDF downloads")
        .subcommand_required(true)
        .arg(
            Arg::new("work-dir")
                .long("work-dir")
                .value_name("DIR")
                .help("Directory holding download/, preprocess/ and the outputs")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON file overriding the default domain and layout")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .subcommand(
            Command::new("normalize")
                .about("Normalize raw downloads into per-variable artifacts")
                .arg(
                    Arg::new("unit")
                        .value_name("UNIT")
                        .help("Unit to run")
                        .default_value("all")
                        .value_parser(unit_names),
                ),
        )
        .subcommand(
            Command::new("extract")
                .about("Write one VIC ASCII forcing file per point of lon_lat.txt"),
        )
        .subcommand(
            Command::new("merge")
                .about("Merge all artifacts into one VIC NetCDF forcing file"),
        )
}
