mod context;
mod devices;
mod event_reader;
mod monitor;

pub use context::{Context, DirectInterface, Error, Interface};
pub use devices::{block_devices, net_device};
pub use event_reader::{EventReader, FromRawError, OpenError};
pub use monitor::Monitor;

pub use evdev::raw_stream::RawDevice;

use std::io;
use std::os::unix::io::RawFd;

pub fn effective_uid() -> u32 {
    unsafe { libc::geteuid() }
}

pub(crate) fn set_nonblocking(fd: RawFd) -> Result<(), io::Error> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}
