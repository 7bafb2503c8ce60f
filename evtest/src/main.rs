use anyhow::{Context, Error};
use clap::Parser;
use input::report::{self, DeviceReport};
use input::{privileges, EventReader, RawDevice, ReadStatus};
use log::LevelFilter;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::process;

const DROPPED: &str = "::::::::::::::::::::: dropped ::::::::::::::::::::::";
const RESYNCED: &str = "::::::::::::::::::::: re-synced ::::::::::::::::::::::";

#[derive(clap::Parser)]
#[clap(
    author,
    version,
    about = "Print the capabilities and events of an input device",
    long_about = None
)]
struct Args {
    /// Event device node, e.g. /dev/input/event0
    #[clap(value_parser)]
    device: PathBuf,

    /// Grab the device so no other client receives its events
    #[clap(long)]
    grab: bool,

    /// Carry on even when not running as root
    #[clap(long)]
    no_root_check: bool,
}

fn open(path: &Path) -> Result<EventReader, Error> {
    let raw = match RawDevice::open(path) {
        Ok(raw) => raw,
        Err(err) => {
            println!("open device fd -1");
            return Err(Error::new(err).context(format!("Failed to open {}", path.display())));
        }
    };
    println!("open device fd {}", raw.as_raw_fd());

    EventReader::from_raw(path, raw).map_err(|err| {
        let (raw, err) = err.into_parts();
        println!("close device fd {}", raw.as_raw_fd());
        Error::new(err).context(format!("Failed to query {}", path.display()))
    })
}

fn close(reader: EventReader) {
    let raw = reader.into_raw();
    println!("close device fd {}", raw.as_raw_fd());
}

fn print_status(status: &ReadStatus) {
    match status {
        ReadStatus::Success(event) => println!("{}", report::format_event(event)),
        ReadStatus::Dropped => println!("{}", DROPPED),
        ReadStatus::Sync(event) => println!("{}", report::format_sync_event(event)),
        ReadStatus::Resynced => println!("{}", RESYNCED),
    }
}

async fn run(reader: &mut EventReader) -> Result<(), Error> {
    loop {
        let status = reader.read().await.context("Failed to handle events")?;
        print_status(&status);
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

    let euid = input::effective_uid();
    println!("{}", privileges::banner(euid));
    if !privileges::should_run(euid, !args.no_root_check) {
        return;
    }

    let mut reader = match open(&args.device) {
        Ok(reader) => reader,
        Err(err) => {
            log::error!("{:#}", err);
            process::exit(1);
        }
    };

    print!("{}", DeviceReport(&reader.device));

    if args.grab {
        if let Err(err) = reader.grab() {
            log::error!("Failed to grab {}: {}", args.device.display(), err);
            close(reader);
            process::exit(1);
        }
    }

    let mut failed = false;
    tokio::select! {
        result = run(&mut reader) => {
            if let Err(err) = result {
                log::error!("{:#}", err);
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

    close(reader);
    if failed {
        process::exit(1);
    }
}
