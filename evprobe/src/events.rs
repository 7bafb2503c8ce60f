use anyhow::{Context as _, Error};
use input::dispatch::{Event, EventKind};
use input::{Context, Interface, RawDevice};
use std::collections::HashMap;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Opens nodes directly and reports every open and close on stdout.
struct PrintingInterface;

impl Interface for PrintingInterface {
    fn open_restricted(&self, path: &Path) -> Result<RawDevice, io::Error> {
        match RawDevice::open(path) {
            Ok(device) => {
                println!("open device fd {}", device.as_raw_fd());
                Ok(device)
            }
            Err(err) => {
                println!("open device fd -1");
                Err(err)
            }
        }
    }

    fn close_restricted(&self, device: RawDevice) {
        println!("close device fd {}", device.as_raw_fd());
    }
}

/// A context on `seat`, or on exactly `paths` when any are given.
pub fn open(seat: &str, paths: &[PathBuf]) -> Result<Context, Error> {
    if paths.is_empty() {
        let mut context = Context::udev(PrintingInterface);
        context
            .assign_seat(seat)
            .with_context(|| format!("Failed to assign seat {}", seat))?;
        return Ok(context);
    }

    let mut context = Context::path(PrintingInterface);
    for path in paths {
        context
            .add_device(path)
            .with_context(|| format!("Failed to add {}", path.display()))?;
    }

    Ok(context)
}

pub async fn print(context: &mut Context, verbose: bool) -> Result<(), Error> {
    let mut sysnames = HashMap::new();

    loop {
        let event = context.next_event().await?;

        if !verbose {
            println!("{}", event.kind.name());
            continue;
        }

        if event.kind == EventKind::DeviceAdded {
            if let Some((_, info)) = context.devices().find(|(id, _)| *id == event.device) {
                sysnames.insert(event.device, info.sysname.clone());
                println!("{}: {} [{}]", info.sysname, info.name, info.capabilities);
            }
        }

        let sysname = sysnames.get(&event.device).map(String::as_str).unwrap_or("-");
        println!("{}", format_verbose(sysname, &event));

        if event.kind == EventKind::DeviceRemoved {
            sysnames.remove(&event.device);
        }
    }
}

fn format_verbose(sysname: &str, event: &Event) -> String {
    format!("{:<8} {:>10.3}s  {}", sysname, event.time.as_secs_f64(), event.kind)
}
