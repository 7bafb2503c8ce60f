mod config;
mod events;
mod probe;

use anyhow::Error;
use clap::Parser;
use config::Config;
use input::privileges;
use log::LevelFilter;
use std::path::PathBuf;
use std::process;

#[derive(clap::Subcommand)]
enum Verb {
    /// Print decoded events of the input devices on the configured seat
    Events {
        /// Read these event nodes instead of the seat
        #[clap(long = "path", value_parser)]
        paths: Vec<PathBuf>,

        /// Print device and event details
        #[clap(short, long)]
        verbose: bool,
    },
    /// Show a network interface and its parent device
    Net { iface: String },
    /// List block devices
    Block,
    /// Print udev hot-plug events
    Monitor,
    /// Print the effective configuration
    Config,
}

#[derive(clap::Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    verb: Verb,

    #[clap(short, long, value_parser, default_value = "/etc/evprobe/config.toml")]
    config_path: PathBuf,
}

fn exit_on_error(result: Result<(), Error>) {
    if let Err(err) = result {
        log::error!("Error: {:#}", err);
        process::exit(1);
    }
}

impl Verb {
    fn touches_devices(&self) -> bool {
        !matches!(self, Verb::Config)
    }
}

async fn run_events(config: &Config, paths: &[PathBuf], verbose: bool) {
    let mut context = match events::open(&config.seat, paths) {
        Ok(context) => context,
        Err(err) => {
            log::error!("Error: {:#}", err);
            process::exit(1);
        }
    };

    let mut failed = false;
    tokio::select! {
        result = events::print(&mut context, verbose) => {
            if let Err(err) = result {
                log::error!("Error: {:#}", err);
                failed = true;
            }
        }

        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                log::error!("Error setting up signal handler: {}", err);
                failed = true;
            } else {
                log::info!("Exiting on signal");
            }
        }
    }

    context.shutdown().await;
    if failed {
        process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    env_logger::builder()
        .format_timestamp(None)
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let config = match Config::new(&args.config_path) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Error reading config: {}", err);
            process::exit(1);
        }
    };

    if args.verb.touches_devices() {
        let euid = input::effective_uid();
        println!("{}", privileges::banner(euid));
        if !privileges::should_run(euid, config.require_root) {
            return;
        }
    }

    match args.verb {
        Verb::Events { paths, verbose } => run_events(&config, &paths, verbose).await,
        Verb::Net { iface } => exit_on_error(probe::print_net(&config.net, &iface)),
        Verb::Block => exit_on_error(probe::print_block(&config.block)),
        Verb::Monitor => {
            tokio::select! {
                result = probe::print_hotplug(&config.monitor) => exit_on_error(result),

                result = tokio::signal::ctrl_c() => {
                    if let Err(err) = result {
                        log::error!("Error setting up signal handler: {}", err);
                        process::exit(1);
                    }

                    log::info!("Exiting on signal");
                }
            }
        }
        Verb::Config => match config.to_toml() {
            Ok(text) => print!("{}", text),
            Err(err) => {
                log::error!("Error rendering config: {}", err);
                process::exit(1);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_verb_but_config_is_gated() {
        let verbs = [
            Verb::Events {
                paths: Vec::new(),
                verbose: false,
            },
            Verb::Net {
                iface: String::from("eth0"),
            },
            Verb::Block,
            Verb::Monitor,
        ];
        assert!(verbs.iter().all(Verb::touches_devices));
        assert!(!Verb::Config.touches_devices());
    }

    #[test]
    fn verbs_parse() {
        let args = Args::parse_from(["evprobe", "-c", "/tmp/evprobe.toml", "block"]);
        assert!(matches!(args.verb, Verb::Block));
        assert_eq!(args.config_path, PathBuf::from("/tmp/evprobe.toml"));

        let args = Args::parse_from(["evprobe", "events", "--path", "/dev/input/event3", "-v"]);
        match args.verb {
            Verb::Events { paths, verbose } => {
                assert_eq!(paths, vec![PathBuf::from("/dev/input/event3")]);
                assert!(verbose);
            }
            _ => panic!("expected the events verb"),
        }
    }
}
