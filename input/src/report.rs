//! Text rendering in the format of the `evtest` tool.

use crate::codes;
use crate::event::{Device, InputEvent};
use crate::names;
use std::fmt::{self, Display, Formatter};

const UNKNOWN: &str = "?";

// Types whose codes are listed individually under "Supported events".
const LISTED_TYPES: [u16; 6] = [
    codes::EV_KEY,
    codes::EV_REL,
    codes::EV_ABS,
    codes::EV_MSC,
    codes::EV_SW,
    codes::EV_LED,
];

/// Formats like C's `%#x`, which prints zero without the prefix.
pub fn format_hex(value: u32) -> String {
    if value == 0 {
        String::from("0")
    } else {
        format!("{:#x}", value)
    }
}

fn type_name(type_: u16) -> &'static str {
    names::event_type_name(type_).unwrap_or(UNKNOWN)
}

fn code_name(type_: u16, code: u16) -> &'static str {
    names::event_code_name(type_, code).unwrap_or(UNKNOWN)
}

pub fn format_event(event: &InputEvent) -> String {
    let time = format!("Event: time {}.{:06}", event.time.sec, event.time.usec);
    if event.type_ == codes::EV_SYN {
        format!(
            "{}, -------------- {} --------------",
            time,
            code_name(event.type_, event.code)
        )
    } else {
        format!(
            "{}, type {} ({}), code {} ({}), value {}",
            time,
            event.type_,
            type_name(event.type_),
            event.code,
            code_name(event.type_, event.code),
            event.value
        )
    }
}

pub fn format_sync_event(event: &InputEvent) -> String {
    format!("SYNC: {}", format_event(event))
}

/// Full capability listing of a device.
pub struct DeviceReport<'a>(pub &'a Device);

impl DeviceReport<'_> {
    fn fmt_codes(&self, f: &mut Formatter<'_>, type_: u16) -> fmt::Result {
        let device = self.0;
        for code in device.codes(type_) {
            writeln!(f, "    Event code {} ({})", code, code_name(type_, code))?;
            if type_ != codes::EV_ABS {
                continue;
            }

            if let Some(abs) = device.abs_info(code) {
                writeln!(f, "\tValue\t{:6}", abs.value)?;
                writeln!(f, "\tMin\t{:6}", abs.minimum)?;
                writeln!(f, "\tMax\t{:6}", abs.maximum)?;
                if abs.fuzz != 0 {
                    writeln!(f, "\tFuzz\t{:6}", abs.fuzz)?;
                }
                if abs.flat != 0 {
                    writeln!(f, "\tFlat\t{:6}", abs.flat)?;
                }
                if abs.resolution != 0 {
                    writeln!(f, "\tResolution\t{:6}", abs.resolution)?;
                }
            }
        }

        Ok(())
    }
}

impl Display for DeviceReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let device = self.0;
        writeln!(
            f,
            "Input device ID: bus {} vendor {} product {}",
            format_hex(device.id.bustype.into()),
            format_hex(device.id.vendor.into()),
            format_hex(device.id.product.into())
        )?;
        writeln!(f, "Evdev version: {:x}", device.driver_version)?;
        writeln!(f, "Input device name: \"{}\"", device.name)?;
        writeln!(f, "Phys location: {}", device.phys.as_deref().unwrap_or(""))?;
        writeln!(f, "Uniq identifier: {}", device.uniq.as_deref().unwrap_or(""))?;

        writeln!(f, "Supported events:")?;
        for type_ in 0..=codes::EV_MAX {
            if !device.has_type(type_) {
                continue;
            }
            writeln!(f, "  Event type {} ({})", type_, type_name(type_))?;
            if LISTED_TYPES.contains(&type_) {
                self.fmt_codes(f, type_)?;
            }
        }

        writeln!(f, "Properties:")?;
        for prop in 0..=codes::INPUT_PROP_MAX {
            if device.has_property(prop) {
                writeln!(
                    f,
                    "  Property type {} ({})",
                    prop,
                    names::property_name(prop).unwrap_or(UNKNOWN)
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::{abs, device};
    use crate::event::{AbsInfo, Capability, InputId, Timestamp};

    #[test]
    fn hex_matches_c_alternate_form() {
        assert_eq!(format_hex(0), "0");
        assert_eq!(format_hex(3), "0x3");
        assert_eq!(format_hex(0x046d), "0x46d");
    }

    #[test]
    fn event_lines() {
        let time = Timestamp { sec: 1712479533, usec: 42 };
        let key = InputEvent::new(time, codes::EV_KEY, codes::KEY_A, 1);
        assert_eq!(
            format_event(&key),
            "Event: time 1712479533.000042, type 1 (EV_KEY), code 30 (KEY_A), value 1"
        );
        assert_eq!(
            format_event(&InputEvent::syn_report(time)),
            "Event: time 1712479533.000042, -------------- SYN_REPORT --------------"
        );
        assert_eq!(
            format_sync_event(&key),
            "SYNC: Event: time 1712479533.000042, type 1 (EV_KEY), code 30 (KEY_A), value 1"
        );
    }

    #[test]
    fn unknown_codes_render_as_question_mark() {
        let event = InputEvent::new(Timestamp::default(), 0x1e, 7, -1);
        assert_eq!(
            format_event(&event),
            "Event: time 0.000000, type 30 (?), code 7 (?), value -1"
        );
    }

    #[test]
    fn force_feedback_codes_are_named() {
        let event = InputEvent::new(Timestamp::default(), codes::EV_FF, 0x50, 1);
        assert_eq!(
            format_event(&event),
            "Event: time 0.000000, type 21 (EV_FF), code 80 (FF_RUMBLE), value 1"
        );
    }

    #[test]
    fn device_report() {
        let mut device = device(
            &[codes::EV_SYN, codes::EV_KEY, codes::EV_ABS],
            vec![
                Capability::Other { type_: codes::EV_KEY, code: codes::BTN_TOUCH },
                Capability::Abs {
                    code: codes::ABS_X,
                    info: AbsInfo { fuzz: 4, resolution: 12, ..abs(0, 1920) },
                },
            ],
            &[codes::INPUT_PROP_DIRECT],
        );
        device.id = InputId { bustype: 3, vendor: 0x1234, product: 0, version: 1 };
        device.driver_version = 0x010001;
        device.phys = Some(String::from("usb-0000:00:14.0-1/input0"));

        let expected = concat!(
            "Input device ID: bus 0x3 vendor 0x1234 product 0\n",
            "Evdev version: 10001\n",
            "Input device name: \"Test Device\"\n",
            "Phys location: usb-0000:00:14.0-1/input0\n",
            "Uniq identifier: \n",
            "Supported events:\n",
            "  Event type 0 (EV_SYN)\n",
            "  Event type 1 (EV_KEY)\n",
            "    Event code 330 (BTN_TOUCH)\n",
            "  Event type 3 (EV_ABS)\n",
            "    Event code 0 (ABS_X)\n",
            "\tValue\t     0\n",
            "\tMin\t     0\n",
            "\tMax\t  1920\n",
            "\tFuzz\t     4\n",
            "\tResolution\t    12\n",
            "Properties:\n",
            "  Property type 1 (INPUT_PROP_DIRECT)\n",
        );
        assert_eq!(DeviceReport(&device).to_string(), expected);
    }
}
