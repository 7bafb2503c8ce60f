use crate::codes;
use crate::event::{AbsInfo, Capability, Device, InputEvent, InputId, Timestamp};
use crate::linux::set_nonblocking;
use crate::sync::{is_multitouch_axis, DeviceState, ReadStatus, Synchronizer};
use evdev::raw_stream::RawDevice;
use std::fmt;
use std::io::Error;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;
use tokio::io::unix::AsyncFd;

pub struct EventReader {
    pub device: Device,
    path: PathBuf,
    file: AsyncFd<RawDevice>,
    sync: Synchronizer,
}

impl EventReader {
    pub fn open(path: &Path) -> Result<Self, OpenError> {
        let is_event_node = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("event"))
            .unwrap_or(false);
        if !is_event_node {
            return Err(OpenError::NotEventDevice(path.to_owned()));
        }

        let raw = RawDevice::open(path)?;
        Self::from_raw(path, raw).map_err(|err| OpenError::Io(err.error))
    }

    /// Wraps a device that was opened elsewhere. On failure the device is
    /// handed back untouched so whoever opened it can close it.
    pub fn from_raw(path: &Path, raw: RawDevice) -> Result<Self, FromRawError> {
        let (device, state) = match prepare(&raw) {
            Ok(prepared) => prepared,
            Err(error) => return Err(FromRawError { raw, error }),
        };

        let file = AsyncFd::try_new(raw).map_err(|err| {
            let (raw, error) = err.into_parts();
            FromRawError { raw, error }
        })?;

        Ok(Self {
            device,
            path: path.to_owned(),
            file,
            sync: Synchronizer::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn grab(&mut self) -> Result<(), Error> {
        self.file.get_mut().grab()
    }

    pub fn ungrab(&mut self) -> Result<(), Error> {
        self.file.get_mut().ungrab()
    }

    pub fn into_raw(self) -> RawDevice {
        self.file.into_inner()
    }

    pub async fn read(&mut self) -> Result<ReadStatus, Error> {
        loop {
            if let Some(status) = self.sync.pop() {
                return Ok(status);
            }

            let result = self.file.readable_mut().await?.try_io(|file| {
                let events = file
                    .get_mut()
                    .fetch_events()?
                    .map(|event| {
                        InputEvent::new(
                            Timestamp::from_system_time(event.timestamp()),
                            event.event_type().0,
                            event.code(),
                            event.value(),
                        )
                    })
                    .collect::<Vec<_>>();
                Ok(events)
            });

            let events = match result {
                Ok(Ok(events)) => events,
                Ok(Err(err)) => return Err(err),
                Err(_) => continue, // This means it would block.
            };

            for event in events {
                let Self { file, device, sync, .. } = self;
                sync.push(event, || query_state(file.get_ref(), device))?;
            }
        }
    }
}

impl AsRawFd for EventReader {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

fn prepare(raw: &RawDevice) -> Result<(Device, DeviceState), Error> {
    set_nonblocking(raw.as_raw_fd())?;

    let device = describe(raw)?;
    let state = query_state(raw, &device)?;
    Ok((device, state))
}

fn describe(raw: &RawDevice) -> Result<Device, Error> {
    let id = raw.input_id();
    let (major, minor, patch) = raw.driver_version();

    let mut capabilities = Vec::new();
    let mut push = |type_: u16, code: u16| capabilities.push(Capability::Other { type_, code });
    if let Some(keys) = raw.supported_keys() {
        keys.iter().for_each(|key| push(codes::EV_KEY, key.code()));
    }
    if let Some(axes) = raw.supported_relative_axes() {
        axes.iter().for_each(|axis| push(codes::EV_REL, axis.0));
    }
    if let Some(misc) = raw.misc_properties() {
        misc.iter().for_each(|misc| push(codes::EV_MSC, misc.0));
    }
    if let Some(switches) = raw.supported_switches() {
        switches.iter().for_each(|switch| push(codes::EV_SW, switch.0));
    }
    if let Some(leds) = raw.supported_leds() {
        leds.iter().for_each(|led| push(codes::EV_LED, led.0));
    }

    if let Some(axes) = raw.supported_absolute_axes() {
        let abs_state = raw.get_abs_state()?;
        for axis in axes.iter() {
            let raw_info = &abs_state[usize::from(axis.0)];
            capabilities.push(Capability::Abs {
                code: axis.0,
                info: AbsInfo {
                    value: raw_info.value,
                    minimum: raw_info.minimum,
                    maximum: raw_info.maximum,
                    fuzz: raw_info.fuzz,
                    flat: raw_info.flat,
                    resolution: raw_info.resolution,
                },
            });
        }
    }

    Ok(Device {
        name: raw.name().unwrap_or_default().to_owned(),
        phys: raw.physical_path().map(str::to_owned),
        uniq: raw.unique_name().map(str::to_owned),
        id: InputId {
            bustype: id.bus_type().0,
            vendor: id.vendor(),
            product: id.product(),
            version: id.version(),
        },
        driver_version: u32::from(major) << 16 | u32::from(minor) << 8 | u32::from(patch),
        event_types: raw.supported_events().iter().map(|type_| type_.0).collect(),
        capabilities,
        properties: raw.properties().iter().map(|prop| prop.0).collect(),
    })
}

fn query_state(raw: &RawDevice, device: &Device) -> Result<DeviceState, Error> {
    let mut state = DeviceState::default();

    if device.has_type(codes::EV_KEY) {
        state.keys = raw.get_key_state()?.iter().map(|key| key.code()).collect();
    }
    if device.has_type(codes::EV_LED) {
        state.leds = raw.get_led_state()?.iter().map(|led| led.0).collect();
    }
    if device.has_type(codes::EV_SW) {
        state.switches = raw.get_switch_state()?.iter().map(|switch| switch.0).collect();
    }
    if device.has_type(codes::EV_ABS) {
        let abs_state = raw.get_abs_state()?;
        state.abs = device
            .codes(codes::EV_ABS)
            .into_iter()
            .filter(|&code| !is_multitouch_axis(code))
            .map(|code| (code, abs_state[usize::from(code)].value))
            .collect();
    }

    Ok(state)
}

#[derive(ThisError)]
#[error("{error}")]
pub struct FromRawError {
    pub raw: RawDevice,
    #[source]
    pub error: Error,
}

impl FromRawError {
    pub fn into_parts(self) -> (RawDevice, Error) {
        (self.raw, self.error)
    }
}

impl fmt::Debug for FromRawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromRawError")
            .field("fd", &self.raw.as_raw_fd())
            .field("error", &self.error)
            .finish()
    }
}

#[derive(Debug, ThisError)]
pub enum OpenError {
    #[error("{} is not an event device node", .0.display())]
    NotEventDevice(PathBuf),
    #[error(transparent)]
    Io(#[from] Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_event_nodes_are_opened() {
        for path in ["/dev/input/mouse0", "/dev/input/by-id", "/"] {
            match EventReader::open(Path::new(path)) {
                Err(OpenError::NotEventDevice(rejected)) => assert_eq!(rejected, Path::new(path)),
                Err(err) => panic!("{}: unexpected error {}", path, err),
                Ok(_) => panic!("{}: opened", path),
            }
        }
    }

    #[test]
    fn missing_nodes_are_io_errors() {
        match EventReader::open(Path::new("/nonexistent/event99")) {
            Err(OpenError::Io(err)) => assert_eq!(err.kind(), std::io::ErrorKind::NotFound),
            Err(err) => panic!("unexpected error {}", err),
            Ok(_) => panic!("opened"),
        }
    }
}
