use crate::dispatch::{
    Classifier, DeviceCapabilities, DeviceId, DeviceInfo, Event, EventKind, DEFAULT_SEAT,
};
use crate::event::Timestamp;
use crate::info::HotplugEvent;
use crate::linux::devices::{self, InputNode};
use crate::linux::event_reader::{EventReader, FromRawError};
use crate::linux::monitor::Monitor;
use crate::sync::ReadStatus;
use evdev::raw_stream::RawDevice;
use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error as ThisError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Opens and closes device nodes on behalf of a [`Context`].
///
/// Implementations can hand out descriptors obtained elsewhere, e.g. from a
/// session manager, instead of opening the node themselves.
pub trait Interface: Send + Sync + 'static {
    fn open_restricted(&self, path: &Path) -> Result<RawDevice, io::Error>;

    fn close_restricted(&self, device: RawDevice);
}

/// Opens device nodes directly.
pub struct DirectInterface;

impl Interface for DirectInterface {
    fn open_restricted(&self, path: &Path) -> Result<RawDevice, io::Error> {
        let device = RawDevice::open(path)?;
        log::debug!("Opened {} (fd {})", path.display(), device.as_raw_fd());
        Ok(device)
    }

    fn close_restricted(&self, device: RawDevice) {
        log::debug!("Closing fd {}", device.as_raw_fd());
    }
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("A seat has already been assigned")]
    SeatAlreadyAssigned,
    #[error("Operation not supported by the {0} backend")]
    WrongBackend(&'static str),
    #[error("No device with id {0}")]
    UnknownDevice(DeviceId),
    #[error("{} is not a keyboard, pointer, touch or switch device", .0.display())]
    Unsupported(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}

enum Backend {
    Udev {
        seat: Option<String>,
        monitor: Option<Monitor>,
    },
    Path {
        paths: Vec<PathBuf>,
    },
}

impl Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::Udev { .. } => "udev",
            Backend::Path { .. } => "path",
        }
    }
}

struct Slot {
    info: DeviceInfo,
    classifier: Classifier,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

type Message = (DeviceId, Result<ReadStatus, io::Error>);

enum Wakeup {
    Device(DeviceId, Result<ReadStatus, io::Error>),
    Hotplug(Result<HotplugEvent, io::Error>),
}

/// Decoded events of a set of devices, discovered either through udev or by
/// explicitly added paths.
///
/// Devices are read by background tasks, so a context has to be used from
/// within a tokio runtime.
pub struct Context {
    interface: Arc<dyn Interface>,
    backend: Backend,
    devices: BTreeMap<DeviceId, Slot>,
    next_id: DeviceId,
    queue: VecDeque<Event>,
    suspended: bool,
    event_sender: mpsc::UnboundedSender<Message>,
    event_receiver: mpsc::UnboundedReceiver<Message>,
}

impl Context {
    pub fn udev<I: Interface>(interface: I) -> Self {
        Self::new(
            Arc::new(interface),
            Backend::Udev {
                seat: None,
                monitor: None,
            },
        )
    }

    pub fn path<I: Interface>(interface: I) -> Self {
        Self::new(Arc::new(interface), Backend::Path { paths: Vec::new() })
    }

    fn new(interface: Arc<dyn Interface>, backend: Backend) -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();

        Self {
            interface,
            backend,
            devices: BTreeMap::new(),
            next_id: 0,
            queue: VecDeque::new(),
            suspended: false,
            event_sender,
            event_receiver,
        }
    }

    /// Adds every input device of `seat` and starts watching for hot-plugged ones.
    pub fn assign_seat(&mut self, seat: &str) -> Result<(), Error> {
        match &self.backend {
            Backend::Path { .. } => return Err(Error::WrongBackend("path")),
            Backend::Udev { seat: Some(_), .. } => return Err(Error::SeatAlreadyAssigned),
            Backend::Udev { seat: None, .. } => {}
        }

        // The monitor goes first so nothing plugged in during the scan is missed.
        let monitor = Monitor::new(Some("input"), None)?;
        self.attach_seat(seat, Some(monitor), devices::input_nodes())
    }

    /// Takes `seat` over once its devices are known. A failed scan leaves the
    /// context without a seat so assigning can be retried.
    fn attach_seat(
        &mut self,
        seat: &str,
        monitor: Option<Monitor>,
        nodes: Result<Vec<InputNode>, io::Error>,
    ) -> Result<(), Error> {
        let nodes = nodes?;
        if let Backend::Udev {
            seat: assigned,
            monitor: current,
        } = &mut self.backend
        {
            *assigned = Some(seat.to_owned());
            *current = monitor;
        }

        self.add_nodes(seat, nodes);
        Ok(())
    }

    pub fn add_device(&mut self, path: &Path) -> Result<DeviceId, Error> {
        match &self.backend {
            Backend::Path { .. } => {}
            backend => return Err(Error::WrongBackend(backend.name())),
        }

        let id = self
            .add(path, None)?
            .ok_or_else(|| Error::Unsupported(path.to_owned()))?;

        if let Backend::Path { paths } = &mut self.backend {
            paths.push(path.to_owned());
        }

        Ok(id)
    }

    pub fn remove_device(&mut self, id: DeviceId) -> Result<(), Error> {
        match &self.backend {
            Backend::Path { .. } => {}
            backend => return Err(Error::WrongBackend(backend.name())),
        }

        let devnode = self
            .devices
            .get(&id)
            .map(|slot| slot.info.devnode.clone())
            .ok_or(Error::UnknownDevice(id))?;

        if let Backend::Path { paths } = &mut self.backend {
            paths.retain(|path| *path != devnode);
        }

        self.remove(id);
        Ok(())
    }

    pub fn devices(&self) -> impl Iterator<Item = (DeviceId, &DeviceInfo)> {
        self.devices.iter().map(|(id, slot)| (*id, &slot.info))
    }

    /// Removes every device, keeping what is needed to bring them back with
    /// [`Context::resume`].
    pub fn suspend(&mut self) {
        if self.suspended {
            return;
        }

        let ids = self.devices.keys().copied().collect::<Vec<_>>();
        for id in ids {
            self.remove(id);
        }

        if let Backend::Udev { monitor, .. } = &mut self.backend {
            *monitor = None;
        }

        self.suspended = true;
        log::debug!("Suspended");
    }

    pub fn resume(&mut self) -> Result<(), Error> {
        if !self.suspended {
            return Ok(());
        }

        self.suspended = false;
        log::debug!("Resuming");

        match &mut self.backend {
            Backend::Udev { seat: Some(seat), monitor } => {
                let seat = seat.clone();
                *monitor = Some(Monitor::new(Some("input"), None)?);
                let nodes = devices::input_nodes()?;
                self.add_nodes(&seat, nodes);
                Ok(())
            }
            Backend::Udev { seat: None, .. } => Ok(()),
            Backend::Path { paths } => {
                let paths = paths.clone();
                for path in paths {
                    if let Err(err) = self.add(&path, None) {
                        log::warn!("Failed to reopen {}: {}", path.display(), err);
                    }
                }

                Ok(())
            }
        }
    }

    pub async fn next_event(&mut self) -> Result<Event, Error> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Ok(event);
            }

            let wakeup = {
                let Self {
                    event_receiver,
                    backend,
                    ..
                } = &mut *self;

                let monitor = match backend {
                    Backend::Udev {
                        monitor: Some(monitor),
                        ..
                    } => Some(monitor),
                    _ => None,
                };

                tokio::select! {
                    // The context holds a sender itself, so this never yields None.
                    Some((id, result)) = event_receiver.recv() => Wakeup::Device(id, result),
                    result = next_hotplug(monitor) => Wakeup::Hotplug(result),
                }
            };

            match wakeup {
                Wakeup::Device(id, result) => self.handle_read(id, result),
                Wakeup::Hotplug(result) => self.handle_hotplug(result?),
            }
        }
    }

    /// Stops every reader task and waits until their devices are closed.
    pub async fn shutdown(mut self) {
        let slots = std::mem::take(&mut self.devices);
        for (_, mut slot) in slots {
            if let Some(stop) = slot.stop.take() {
                let _ = stop.send(());
            }

            if let Err(err) = slot.task.await {
                log::warn!("Reader task for {} failed: {}", slot.info.sysname, err);
            }
        }
    }

    fn add_nodes(&mut self, seat: &str, nodes: Vec<InputNode>) {
        for node in nodes {
            if node.seat != seat {
                log::debug!("{}: on {}, ignoring", node.sysname, node.seat);
                continue;
            }

            if let Err(err) = self.add(&node.devnode, Some(node.seat)) {
                log::warn!("Failed to open {}: {}", node.devnode.display(), err);
            }
        }
    }

    /// Returns `None` if the device was opened but turned out to be of no
    /// interest.
    fn add(&mut self, path: &Path, seat: Option<String>) -> Result<Option<DeviceId>, Error> {
        let raw = self.interface.open_restricted(path)?;
        let interface = &self.interface;
        let reader = adopt(
            raw,
            |raw| EventReader::from_raw(path, raw).map_err(FromRawError::into_parts),
            |raw| interface.close_restricted(raw),
        )?;

        let capabilities = DeviceCapabilities::from_device(&reader.device);
        if capabilities.is_empty() {
            log::debug!("{}: {}, ignoring", path.display(), reader.device.name);
            self.interface.close_restricted(reader.into_raw());
            return Ok(None);
        }

        let id = self.next_id;
        self.next_id += 1;

        let info = DeviceInfo {
            id,
            name: reader.device.name.clone(),
            sysname: sysname(path),
            devnode: path.to_owned(),
            seat,
            capabilities,
        };
        log::info!("Added device {} ({}): {}", id, info.sysname, info.name);

        let classifier = Classifier::new(&reader.device);
        let (stop_sender, stop_receiver) = oneshot::channel();
        let task = tokio::spawn(handle_events(
            id,
            reader,
            self.interface.clone(),
            self.event_sender.clone(),
            stop_receiver,
        ));

        self.devices.insert(
            id,
            Slot {
                info,
                classifier,
                stop: Some(stop_sender),
                task,
            },
        );
        self.queue.push_back(Event {
            device: id,
            time: now(),
            kind: EventKind::DeviceAdded,
        });

        Ok(Some(id))
    }

    fn remove(&mut self, id: DeviceId) {
        let mut slot = match self.devices.remove(&id) {
            Some(slot) => slot,
            None => return,
        };

        let time = now();
        for kind in slot.classifier.reset() {
            self.queue.push_back(Event { device: id, time, kind });
        }

        // The task may already be gone if the device vanished.
        if let Some(stop) = slot.stop.take() {
            let _ = stop.send(());
        }

        log::info!("Removed device {} ({})", id, slot.info.sysname);
        self.queue.push_back(Event {
            device: id,
            time,
            kind: EventKind::DeviceRemoved,
        });
    }

    fn handle_read(&mut self, id: DeviceId, result: Result<ReadStatus, io::Error>) {
        // Stale messages of devices removed in the meantime.
        let slot = match self.devices.get_mut(&id) {
            Some(slot) => slot,
            None => return,
        };

        match result {
            Ok(ReadStatus::Success(event)) | Ok(ReadStatus::Sync(event)) => {
                for kind in slot.classifier.process(&event) {
                    self.queue.push_back(Event {
                        device: id,
                        time: event.time,
                        kind,
                    });
                }
            }
            Ok(ReadStatus::Dropped) => {
                log::warn!("{}: kernel buffer overrun, resynchronizing", slot.info.sysname);
                let time = now();
                for kind in slot.classifier.reset() {
                    self.queue.push_back(Event { device: id, time, kind });
                }
            }
            Ok(ReadStatus::Resynced) => {
                log::debug!("{}: resynchronized", slot.info.sysname);
            }
            Err(err) => {
                if err.raw_os_error() == Some(libc::ENODEV) {
                    log::debug!("{}: device gone", slot.info.sysname);
                } else {
                    log::error!("{}: read failed: {}", slot.info.sysname, err);
                }

                self.remove(id);
            }
        }
    }

    fn handle_hotplug(&mut self, event: HotplugEvent) {
        let assigned = match &self.backend {
            Backend::Udev { seat: Some(seat), .. } => seat.clone(),
            _ => return,
        };

        if !event.sysname.starts_with("event") {
            return;
        }

        match event.action.as_str() {
            "add" => {
                let seat = event.seat.unwrap_or_else(|| String::from(DEFAULT_SEAT));
                if seat != assigned {
                    log::debug!("{}: on {}, ignoring", event.sysname, seat);
                    return;
                }

                let devnode = match event.devnode {
                    Some(devnode) => devnode,
                    None => return,
                };

                if let Err(err) = self.add(&devnode, Some(seat)) {
                    log::warn!("Failed to open {}: {}", devnode.display(), err);
                }
            }
            "remove" => {
                let id = self
                    .devices
                    .iter()
                    .find(|(_, slot)| slot.info.sysname == event.sysname)
                    .map(|(id, _)| *id);

                if let Some(id) = id {
                    self.remove(id);
                }
            }
            _ => {}
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        for slot in self.devices.values_mut() {
            if let Some(stop) = slot.stop.take() {
                let _ = stop.send(());
            }
        }
    }
}

/// Wraps a freshly opened node, handing it to `close` if `wrap` gives it back.
fn adopt<R, T>(
    raw: R,
    wrap: impl FnOnce(R) -> Result<T, (R, io::Error)>,
    close: impl FnOnce(R),
) -> Result<T, io::Error> {
    wrap(raw).map_err(|(raw, err)| {
        close(raw);
        err
    })
}

async fn next_hotplug(monitor: Option<&mut Monitor>) -> Result<HotplugEvent, io::Error> {
    match monitor {
        Some(monitor) => monitor.recv().await,
        None => std::future::pending().await,
    }
}

async fn handle_events(
    id: DeviceId,
    mut reader: EventReader,
    interface: Arc<dyn Interface>,
    sender: mpsc::UnboundedSender<Message>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut stop => break,
            result = reader.read() => {
                let failed = result.is_err();
                if sender.send((id, result)).is_err() || failed {
                    break;
                }
            }
        }
    }

    interface.close_restricted(reader.into_raw());
}

fn sysname(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn now() -> Timestamp {
    Timestamp::from_system_time(SystemTime::now())
}
