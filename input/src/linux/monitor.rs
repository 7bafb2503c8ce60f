use crate::info::HotplugEvent;
use crate::linux::devices::lossy;
use crate::linux::set_nonblocking;
use std::io::Error;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use tokio::io::unix::AsyncFd;

/// Hot-plug notifications from the udev netlink socket.
pub struct Monitor {
    socket: AsyncFd<udev::MonitorSocket>,
}

impl Monitor {
    pub fn new(subsystem: Option<&str>, devtype: Option<&str>) -> Result<Self, Error> {
        let builder = udev::MonitorBuilder::new()?;
        let builder = match (subsystem, devtype) {
            (Some(subsystem), Some(devtype)) => {
                builder.match_subsystem_devtype(subsystem, devtype)?
            }
            (Some(subsystem), None) => builder.match_subsystem(subsystem)?,
            (None, _) => builder,
        };

        let socket = builder.listen()?;
        set_nonblocking(socket.as_raw_fd())?;
        log::debug!("Listening for {} events", subsystem.unwrap_or("all"));

        Ok(Self {
            socket: AsyncFd::new(socket)?,
        })
    }

    pub async fn recv(&mut self) -> Result<HotplugEvent, Error> {
        loop {
            let mut guard = self.socket.readable_mut().await?;
            if let Some(event) = guard.get_inner_mut().iter().next() {
                return Ok(HotplugEvent {
                    action: event.action().map(lossy).unwrap_or_default(),
                    seqnum: event.sequence_number(),
                    sysname: lossy(event.sysname()),
                    devpath: lossy(event.devpath()),
                    subsystem: event.subsystem().map(lossy),
                    devnode: event.devnode().map(Path::to_owned),
                    address: event.attribute_value("address").map(lossy),
                    seat: event.property_value("ID_SEAT").map(lossy),
                });
            }

            // Nothing buffered anymore, wait for the socket to become readable again.
            guard.clear_ready();
        }
    }
}
