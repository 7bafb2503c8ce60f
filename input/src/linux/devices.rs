use crate::dispatch::DEFAULT_SEAT;
use crate::info::{BlockDevice, BlockFilter, NetDevice, ParentDevice};
use std::ffi::OsStr;
use std::io::Error;
use std::path::{Path, PathBuf};

pub(crate) fn lossy(value: &OsStr) -> String {
    value.to_string_lossy().into_owned()
}

/// Looks up a network interface below `class_path` (normally `/sys/class/net`).
pub fn net_device(class_path: &Path, iface: &str) -> Result<NetDevice, Error> {
    let device = udev::Device::from_syspath(&class_path.join(iface))?;

    let parent = device.parent().map(|parent| ParentDevice {
        driver: parent.driver().map(lossy),
        sysname: lossy(parent.sysname()),
        devpath: lossy(parent.devpath()),
    });

    Ok(NetDevice {
        sysname: lossy(device.sysname()),
        devpath: lossy(device.devpath()),
        address: device.attribute_value("address").map(lossy),
        parent,
    })
}

/// Enumerates the `block` subsystem.
pub fn block_devices(filter: BlockFilter) -> Result<Vec<BlockDevice>, Error> {
    let mut enumerator = udev::Enumerator::new()?;
    enumerator.match_subsystem("block")?;

    let devices = enumerator
        .scan_devices()?
        .map(|device| BlockDevice {
            devnode: device.devnode().map(Path::to_owned),
            sysname: lossy(device.sysname()),
            devpath: lossy(device.devpath()),
            devtype: device.devtype().map(lossy),
            size_sectors: device
                .attribute_value("size")
                .and_then(|size| size.to_str())
                .and_then(|size| size.trim().parse().ok()),
        })
        .filter(|device| filter.keep(device))
        .collect();

    Ok(devices)
}

/// An evdev node of the `input` subsystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct InputNode {
    pub sysname: String,
    pub devnode: PathBuf,
    pub seat: String,
}

pub(crate) fn input_nodes() -> Result<Vec<InputNode>, Error> {
    let mut enumerator = udev::Enumerator::new()?;
    enumerator.match_subsystem("input")?;

    let nodes = enumerator
        .scan_devices()?
        .filter_map(|device| {
            let sysname = lossy(device.sysname());
            if !sysname.starts_with("event") {
                return None;
            }

            Some(InputNode {
                sysname,
                devnode: device.devnode()?.to_owned(),
                seat: device
                    .property_value("ID_SEAT")
                    .map(lossy)
                    .unwrap_or_else(|| String::from(DEFAULT_SEAT)),
            })
        })
        .collect();

    Ok(nodes)
}
