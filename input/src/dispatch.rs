//! High level events decoded from the raw streams of one or more devices.

mod classify;

pub use classify::{Classifier, PINCH_THRESHOLD, WHEEL_CLICK_ANGLE};

use crate::codes;
use crate::event::{Device, Timestamp};
use crate::names;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

pub type DeviceId = u32;

/// Seat of devices that carry no `ID_SEAT` tag.
pub const DEFAULT_SEAT: &str = "seat0";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyState {
    Released,
    Pressed,
}

impl KeyState {
    fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Released),
            1 => Some(KeyState::Pressed),
            // 2 is autorepeat, which is left to the consumer.
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisSource {
    Wheel,
    Finger,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EventKind {
    DeviceAdded,
    DeviceRemoved,
    KeyboardKey { key: u16, state: KeyState },
    PointerMotion { dx: f64, dy: f64 },
    /// Coordinates are normalized to `[0, 1]` over the axis range.
    PointerMotionAbsolute { x: f64, y: f64 },
    PointerButton { button: u16, state: KeyState },
    /// Wheel values are in degrees, positive down and right.
    PointerAxis { source: AxisSource, vertical: f64, horizontal: f64 },
    TouchDown { slot: usize, x: f64, y: f64 },
    TouchUp { slot: usize },
    TouchMotion { slot: usize, x: f64, y: f64 },
    TouchCancel { slot: usize },
    TouchFrame,
    GestureSwipeBegin { fingers: u8 },
    GestureSwipeUpdate { fingers: u8, dx: f64, dy: f64 },
    GestureSwipeEnd { fingers: u8, cancelled: bool },
    GesturePinchBegin { fingers: u8 },
    GesturePinchUpdate { fingers: u8, scale: f64, dx: f64, dy: f64 },
    GesturePinchEnd { fingers: u8, cancelled: bool },
    SwitchToggle { switch: u16, on: bool },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::DeviceAdded => "DEVICE_ADDED",
            EventKind::DeviceRemoved => "DEVICE_REMOVED",
            EventKind::KeyboardKey { .. } => "KEYBOARD_KEY",
            EventKind::PointerMotion { .. } => "POINTER_MOTION",
            EventKind::PointerMotionAbsolute { .. } => "POINTER_MOTION_ABSOLUTE",
            EventKind::PointerButton { .. } => "POINTER_BUTTON",
            EventKind::PointerAxis { .. } => "POINTER_AXIS",
            EventKind::TouchDown { .. } => "TOUCH_DOWN",
            EventKind::TouchUp { .. } => "TOUCH_UP",
            EventKind::TouchMotion { .. } => "TOUCH_MOTION",
            EventKind::TouchCancel { .. } => "TOUCH_CANCEL",
            EventKind::TouchFrame => "TOUCH_FRAME",
            EventKind::GestureSwipeBegin { .. } => "GESTURE_SWIPE_BEGIN",
            EventKind::GestureSwipeUpdate { .. } => "GESTURE_SWIPE_UPDATE",
            EventKind::GestureSwipeEnd { .. } => "GESTURE_SWIPE_END",
            EventKind::GesturePinchBegin { .. } => "GESTURE_PINCH_BEGIN",
            EventKind::GesturePinchUpdate { .. } => "GESTURE_PINCH_UPDATE",
            EventKind::GesturePinchEnd { .. } => "GESTURE_PINCH_END",
            EventKind::SwitchToggle { .. } => "SWITCH_TOGGLE",
        }
    }
}

fn state_str(state: KeyState) -> &'static str {
    match state {
        KeyState::Released => "released",
        KeyState::Pressed => "pressed",
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        match *self {
            EventKind::DeviceAdded | EventKind::DeviceRemoved | EventKind::TouchFrame => Ok(()),
            EventKind::KeyboardKey { key: code, state }
            | EventKind::PointerButton { button: code, state } => write!(
                f,
                " {} ({}) {}",
                names::event_code_name(codes::EV_KEY, code).unwrap_or("?"),
                code,
                state_str(state)
            ),
            EventKind::PointerMotion { dx, dy } => write!(f, " {:.2}/{:.2}", dx, dy),
            EventKind::PointerMotionAbsolute { x, y } => write!(f, " {:.3}/{:.3}", x, y),
            EventKind::PointerAxis { source, vertical, horizontal } => write!(
                f,
                " vert {:.2} horiz {:.2} ({:?})",
                vertical, horizontal, source
            ),
            EventKind::TouchDown { slot, x, y } | EventKind::TouchMotion { slot, x, y } => {
                write!(f, " {} ({:.3}/{:.3})", slot, x, y)
            }
            EventKind::TouchUp { slot } | EventKind::TouchCancel { slot } => write!(f, " {}", slot),
            EventKind::GestureSwipeBegin { fingers } | EventKind::GesturePinchBegin { fingers } => {
                write!(f, " {} fingers", fingers)
            }
            EventKind::GestureSwipeUpdate { fingers, dx, dy } => {
                write!(f, " {} fingers {:.2}/{:.2}", fingers, dx, dy)
            }
            EventKind::GesturePinchUpdate { fingers, scale, dx, dy } => write!(
                f,
                " {} fingers {:.2}/{:.2} scale {:.2}",
                fingers, dx, dy, scale
            ),
            EventKind::GestureSwipeEnd { fingers, cancelled }
            | EventKind::GesturePinchEnd { fingers, cancelled } => {
                write!(f, " {} fingers", fingers)?;
                if cancelled {
                    write!(f, " cancelled")?;
                }
                Ok(())
            }
            EventKind::SwitchToggle { switch, on } => write!(
                f,
                " {} {}",
                names::event_code_name(codes::EV_SW, switch).unwrap_or("?"),
                if on { "on" } else { "off" }
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event {
    pub device: DeviceId,
    pub time: Timestamp,
    pub kind: EventKind,
}

/// What kind of input a device produces, derived from its capabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub keyboard: bool,
    pub pointer: bool,
    pub absolute_pointer: bool,
    pub touchpad: bool,
    pub touchscreen: bool,
    pub multitouch: bool,
    pub switch: bool,
}

impl DeviceCapabilities {
    pub fn from_device(device: &Device) -> Self {
        let has_key = |code| device.has_code(codes::EV_KEY, code);
        let has_abs = |code| device.has_code(codes::EV_ABS, code);

        let keyboard = device
            .codes(codes::EV_KEY)
            .into_iter()
            .any(|code| code > 0 && code < codes::BTN_MISC);
        let multitouch = has_abs(codes::ABS_MT_SLOT) && has_abs(codes::ABS_MT_POSITION_X);
        let absolute = has_abs(codes::ABS_X) || has_abs(codes::ABS_MT_POSITION_X);
        let direct = device.has_property(codes::INPUT_PROP_DIRECT);

        let touchpad = absolute && has_key(codes::BTN_TOOL_FINGER) && !direct;
        let touchscreen = absolute
            && !touchpad
            && !has_key(codes::BTN_TOOL_PEN)
            && (multitouch || has_key(codes::BTN_TOUCH));
        let absolute_pointer = has_abs(codes::ABS_X)
            && has_abs(codes::ABS_Y)
            && !touchpad
            && !touchscreen;
        let relative = device.has_code(codes::EV_REL, codes::REL_X)
            && device.has_code(codes::EV_REL, codes::REL_Y);

        Self {
            keyboard,
            pointer: relative || touchpad || absolute_pointer || has_key(codes::BTN_LEFT),
            absolute_pointer,
            touchpad,
            touchscreen,
            multitouch,
            switch: device.has_type(codes::EV_SW),
        }
    }

    /// Devices nothing in this module can decode are not worth opening.
    pub fn is_empty(&self) -> bool {
        !(self.keyboard || self.pointer || self.touchscreen || self.switch)
    }
}

impl Display for DeviceCapabilities {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.keyboard, "keyboard"),
            (self.pointer, "pointer"),
            (self.touchpad, "touchpad"),
            (self.touchscreen, "touch"),
            (self.switch, "switch"),
        ];
        let names: Vec<&str> = flags
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", names.join(" "))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    pub sysname: String,
    pub devnode: PathBuf,
    pub seat: Option<String>,
    pub capabilities: DeviceCapabilities,
}
