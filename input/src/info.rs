//! Device records gathered from udev, printed in `udevadm`-like `I: KEY=value` lines.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Bytes per unit of the sysfs `size` attribute, independent of the logical block size.
pub const SECTOR_SIZE: u64 = 512;

const BYTES_PER_GB: u64 = 1_000_000_000;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParentDevice {
    pub driver: Option<String>,
    pub sysname: String,
    pub devpath: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetDevice {
    pub sysname: String,
    pub devpath: String,
    pub address: Option<String>,
    pub parent: Option<ParentDevice>,
}

impl Display for NetDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "I: DEVNAME={}", self.sysname)?;
        writeln!(f, "I: DEVPATH={}", self.devpath)?;
        writeln!(f, "I: MACADDR={}", self.address.as_deref().unwrap_or_default())?;

        if let Some(parent) = &self.parent {
            writeln!(f, "I: DRIVER={}", parent.driver.as_deref().unwrap_or_default())?;
            writeln!(f, "\tI: DEVNAME={}", parent.sysname)?;
            writeln!(f, "\tI: DEVPATH={}", parent.devpath)?;
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockDevice {
    pub devnode: Option<PathBuf>,
    pub sysname: String,
    pub devpath: String,
    pub devtype: Option<String>,
    /// Value of the sysfs `size` attribute, in 512 byte sectors.
    pub size_sectors: Option<u64>,
}

impl BlockDevice {
    pub fn is_partition(&self) -> bool {
        self.devtype.as_deref() == Some("partition")
    }

    pub fn is_loop(&self) -> bool {
        self.sysname.starts_with("loop")
    }

    pub fn is_optical(&self) -> bool {
        self.sysname.starts_with("sr")
    }

    /// Capacity in decimal gigabytes, rounded down. Optical drives report no
    /// meaningful size.
    pub fn size_gb(&self) -> Option<u64> {
        if self.is_optical() {
            return None;
        }

        let sectors = self.size_sectors.unwrap_or(0);
        Some(sectors.saturating_mul(SECTOR_SIZE) / BYTES_PER_GB)
    }
}

impl Display for BlockDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let devnode = self
            .devnode
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        writeln!(f, "I: DEVNODE={}", devnode)?;
        writeln!(f, "I: KERNEL={}", self.sysname)?;
        writeln!(f, "I: DEVPATH={}", self.devpath)?;
        writeln!(f, "I: DEVTYPE={}", self.devtype.as_deref().unwrap_or_default())?;
        match self.size_gb() {
            Some(size) => writeln!(f, "I: DEVSIZE={} GB", size),
            None => writeln!(f, "I: DEVSIZE=n/a"),
        }
    }
}

/// Which block devices an enumeration reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockFilter {
    pub include_partitions: bool,
    pub include_loop: bool,
}

impl BlockFilter {
    pub fn keep(&self, device: &BlockDevice) -> bool {
        (self.include_partitions || !device.is_partition())
            && (self.include_loop || !device.is_loop())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HotplugEvent {
    pub action: String,
    pub seqnum: u64,
    pub sysname: String,
    pub devpath: String,
    pub subsystem: Option<String>,
    pub devnode: Option<PathBuf>,
    pub address: Option<String>,
    /// `ID_SEAT` of the device; unset means the default seat.
    pub seat: Option<String>,
}

impl Display for HotplugEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "I: ACTION={}", self.action)?;
        writeln!(f, "I: DEVNAME={}", self.sysname)?;
        writeln!(f, "I: DEVPATH={}", self.devpath)?;
        writeln!(f, "I: MACADDR={}", self.address.as_deref().unwrap_or_default())?;
        if let Some(subsystem) = &self.subsystem {
            writeln!(f, "I: SUBSYSTEM={}", subsystem)?;
        }
        if let Some(devnode) = &self.devnode {
            writeln!(f, "I: DEVNODE={}", devnode.display())?;
        }
        writeln!(f, "----------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(sysname: &str, devtype: &str, size_sectors: u64) -> BlockDevice {
        BlockDevice {
            devnode: Some(PathBuf::from("/dev").join(sysname)),
            sysname: sysname.to_owned(),
            devpath: format!("/devices/virtual/block/{}", sysname),
            devtype: Some(devtype.to_owned()),
            size_sectors: Some(size_sectors),
        }
    }

    #[test]
    fn net_device_lines() {
        let device = NetDevice {
            sysname: String::from("eth0"),
            devpath: String::from("/devices/pci0000:00/0000:00:1f.6/net/eth0"),
            address: Some(String::from("52:54:00:12:34:56")),
            parent: Some(ParentDevice {
                driver: Some(String::from("e1000e")),
                sysname: String::from("0000:00:1f.6"),
                devpath: String::from("/devices/pci0000:00/0000:00:1f.6"),
            }),
        };

        assert_eq!(
            device.to_string(),
            concat!(
                "I: DEVNAME=eth0\n",
                "I: DEVPATH=/devices/pci0000:00/0000:00:1f.6/net/eth0\n",
                "I: MACADDR=52:54:00:12:34:56\n",
                "I: DRIVER=e1000e\n",
                "\tI: DEVNAME=0000:00:1f.6\n",
                "\tI: DEVPATH=/devices/pci0000:00/0000:00:1f.6\n",
            )
        );
    }

    #[test]
    fn virtual_net_device_has_no_parent_lines() {
        let device = NetDevice {
            sysname: String::from("lo"),
            devpath: String::from("/devices/virtual/net/lo"),
            address: None,
            parent: None,
        };
        assert_eq!(
            device.to_string(),
            "I: DEVNAME=lo\nI: DEVPATH=/devices/virtual/net/lo\nI: MACADDR=\n"
        );
    }

    #[test]
    fn block_sizes() {
        // 1 TB disk
        assert_eq!(block("sda", "disk", 1_953_525_168).size_gb(), Some(1000));
        assert_eq!(block("nvme0n1", "disk", 0).size_gb(), Some(0));
        assert_eq!(block("sr0", "disk", 2_097_151).size_gb(), None);

        let unknown = BlockDevice {
            size_sectors: None,
            ..block("vda", "disk", 0)
        };
        assert_eq!(unknown.size_gb(), Some(0));
    }

    #[test]
    fn block_lines() {
        assert_eq!(
            block("sr0", "disk", 10).to_string(),
            concat!(
                "I: DEVNODE=/dev/sr0\n",
                "I: KERNEL=sr0\n",
                "I: DEVPATH=/devices/virtual/block/sr0\n",
                "I: DEVTYPE=disk\n",
                "I: DEVSIZE=n/a\n",
            )
        );
        assert!(block("sda", "disk", 500_118_192)
            .to_string()
            .ends_with("I: DEVSIZE=256 GB\n"));
    }

    #[test]
    fn filter_skips_partitions_and_loops_by_default() {
        let filter = BlockFilter::default();
        assert!(filter.keep(&block("sda", "disk", 1)));
        assert!(!filter.keep(&block("sda1", "partition", 1)));
        assert!(!filter.keep(&block("loop0", "disk", 1)));

        let everything = BlockFilter {
            include_partitions: true,
            include_loop: true,
        };
        assert!(everything.keep(&block("sda1", "partition", 1)));
        assert!(everything.keep(&block("loop0", "disk", 1)));
    }

    #[test]
    fn hotplug_lines() {
        let event = HotplugEvent {
            action: String::from("add"),
            seqnum: 4711,
            sysname: String::from("event7"),
            devpath: String::from("/devices/virtual/input/input21/event7"),
            subsystem: Some(String::from("input")),
            devnode: Some(PathBuf::from("/dev/input/event7")),
            address: None,
            seat: None,
        };
        assert_eq!(
            event.to_string(),
            concat!(
                "I: ACTION=add\n",
                "I: DEVNAME=event7\n",
                "I: DEVPATH=/devices/virtual/input/input21/event7\n",
                "I: MACADDR=\n",
                "I: SUBSYSTEM=input\n",
                "I: DEVNODE=/dev/input/event7\n",
                "----------\n",
            )
        );
    }

    #[test]
    fn hotplug_lines_carry_the_address() {
        let event = HotplugEvent {
            action: String::from("remove"),
            sysname: String::from("wlan0"),
            devpath: String::from("/devices/pci0000:00/0000:00:14.3/net/wlan0"),
            address: Some(String::from("52:54:00:12:34:56")),
            ..HotplugEvent::default()
        };
        assert_eq!(
            event.to_string(),
            concat!(
                "I: ACTION=remove\n",
                "I: DEVNAME=wlan0\n",
                "I: DEVPATH=/devices/pci0000:00/0000:00:14.3/net/wlan0\n",
                "I: MACADDR=52:54:00:12:34:56\n",
                "----------\n",
            )
        );
    }
}
