use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;

use jp2rt_cli::commands;
use jp2rt_cli::config::{load_estimate_config, EstimateConfig};
use jp2rt_descriptors::ENGINE_ENV;

fn engine_arg() -> Arg {
    Arg::new("engine")
        .long("engine")
        .help(format!(
            "Descriptor engine command line. Defaults to the value of {}.",
            ENGINE_ENV
        ))
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .value_hint(ValueHint::CommandString)
}

fn path_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .help(help)
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn cli() -> Command {
    Command::new("jp2rt")
        .version(clap::crate_version!())
        .about("Retention time prediction from molecular descriptors")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("compute-descriptors")
                .about("Append molecular descriptors to a tab separated file of SMILES")
                .arg(path_arg(
                    "src",
                    "Source tab separated file (SMILES on the last column)",
                ))
                .arg(path_arg(
                    "dst",
                    "Destination file (the columns of SRC followed by descriptor values)",
                ))
                .arg(engine_arg()),
        )
        .subcommand(
            Command::new("list-descriptors")
                .about("List the known molecular descriptors")
                .arg(
                    Arg::new("json")
                        .short('j')
                        .long("json")
                        .help("Produce JSON output")
                        .action(ArgAction::SetTrue),
                )
                .arg(engine_arg()),
        )
        .subcommand(
            Command::new("predict")
                .visible_alias("predict-rt")
                .about("Predict retention times with a saved model")
                .arg(path_arg("model", "The model file"))
                .arg(path_arg(
                    "src",
                    "Source tab separated file (descriptors on the last columns)",
                ))
                .arg(path_arg(
                    "dst",
                    "Destination file (predicted retention time followed by the columns of SRC)",
                )),
        )
        .subcommand(
            Command::new("estimate-model")
                .about("Estimate a model with the given ensemble regressor")
                .arg(
                    Arg::new("name")
                        .help("Ensemble regressor name (see list-models)")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(path_arg(
                    "src",
                    "Source tab separated file (retention time on the first column, descriptors on the last columns)",
                ))
                .arg(path_arg("dst", "Destination model file"))
                .arg(
                    Arg::new("evaluate")
                        .short('e')
                        .long("evaluate")
                        .help("Evaluate the model using cross validation and write an HTML report")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("JSON file with regressor and evaluation settings")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("folds")
                        .long("folds")
                        .help("Number of cross validation folds. Overrides the configuration file.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("confidence")
                        .long("confidence")
                        .help("Confidence of the residual quantile band. Overrides the configuration file.")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Random seed for the regressor and the fold shuffle")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(Command::new("list-models").about("List the known ensemble regressors"))
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("JP2RT_LOG", "error,jp2rt=info"))
        .init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("compute-descriptors", m)) => commands::compute_descriptors(
            required(m, "src")?,
            required(m, "dst")?,
            m.get_one::<String>("engine").map(String::as_str),
        ),
        Some(("list-descriptors", m)) => commands::list_descriptors(
            m.get_flag("json"),
            m.get_one::<String>("engine").map(String::as_str),
        ),
        Some(("predict", m)) => commands::predict(
            required(m, "model")?,
            required(m, "src")?,
            required(m, "dst")?,
        ),
        Some(("estimate-model", m)) => handle_estimate(m),
        Some(("list-models", _)) => {
            commands::print_models();
            Ok(())
        }
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a PathBuf> {
    matches
        .get_one::<PathBuf>(id)
        .ok_or_else(|| anyhow!("missing argument <{}>", id))
}

fn handle_estimate(matches: &ArgMatches) -> Result<()> {
    let name = matches
        .get_one::<String>("name")
        .ok_or_else(|| anyhow!("missing argument <name>"))?;

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            log::info!("Using config: {}", path.display());
            load_estimate_config(path)?
        }
        None => EstimateConfig::default(),
    };
    if let Some(folds) = matches.get_one::<usize>("folds") {
        config.evaluation.folds = *folds;
    }
    if let Some(confidence) = matches.get_one::<f64>("confidence") {
        config.evaluation.confidence = *confidence;
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(*seed);
    }

    commands::estimate_model(
        name,
        required(matches, "src")?,
        required(matches, "dst")?,
        &config,
        matches.get_flag("evaluate"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        cli().debug_assert();
    }
}
