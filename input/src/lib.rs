pub mod codes;
pub mod dispatch;
mod event;
pub mod info;
pub mod names;
pub mod privileges;
pub mod report;
mod sync;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::{
    block_devices, effective_uid, net_device, Context, DirectInterface, Error, EventReader,
    FromRawError, Interface, Monitor, OpenError, RawDevice,
};

pub use event::{AbsInfo, Capability, Device, InputEvent, InputId, Timestamp};
pub use sync::{DeviceState, ReadStatus, Synchronizer};
