use crate::codes;
use crate::dispatch::{AxisSource, DeviceCapabilities, EventKind, KeyState};
use crate::event::{AbsInfo, Device, InputEvent};

/// Degrees of wheel rotation per detent.
pub const WHEEL_CLICK_ANGLE: f64 = 15.0;

/// Relative change of the distance between two fingers that turns a two
/// finger gesture into a pinch instead of a scroll.
pub const PINCH_THRESHOLD: f64 = 0.15;

const MAX_SLOTS: usize = 16;

#[derive(Clone, Copy, Debug, Default)]
struct Slot {
    active: bool,
    x: i32,
    y: i32,
    next_x: i32,
    next_y: i32,
    begin: bool,
    end: bool,
    moved: bool,
}

impl Slot {
    fn commit_position(&mut self) -> (i32, i32) {
        let delta = (self.next_x - self.x, self.next_y - self.y);
        self.x = self.next_x;
        self.y = self.next_y;
        delta
    }

    fn clear_flags(&mut self) {
        self.begin = false;
        self.end = false;
        self.moved = false;
    }
}

// Changes collected between two SYN_REPORTs.
#[derive(Debug, Default)]
struct Frame {
    keys: Vec<(u16, KeyState)>,
    buttons: Vec<(u16, KeyState)>,
    switches: Vec<(u16, bool)>,
    rel_x: i32,
    rel_y: i32,
    wheel: i32,
    hwheel: i32,
    abs_x: Option<i32>,
    abs_y: Option<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    None,
    // Two fingers down, not yet known whether they scroll or pinch.
    TwoFinger { initial_spread: f64 },
    Scroll,
    Pinch { initial_spread: f64 },
    Swipe,
}

fn is_button(code: u16) -> bool {
    (codes::BTN_MISC..codes::KEY_OK).contains(&code)
}

fn tool_finger_count(code: u16) -> Option<u8> {
    match code {
        codes::BTN_TOOL_FINGER => Some(1),
        codes::BTN_TOOL_DOUBLETAP => Some(2),
        codes::BTN_TOOL_TRIPLETAP => Some(3),
        codes::BTN_TOOL_QUADTAP => Some(4),
        codes::BTN_TOOL_QUINTTAP => Some(5),
        _ => None,
    }
}

fn normalize(axis: Option<AbsInfo>, value: i32) -> f64 {
    match axis {
        Some(info) => info.normalize(value),
        None => f64::from(value),
    }
}

fn spread(points: &[(i32, i32)]) -> f64 {
    match points {
        [(x1, y1), (x2, y2), ..] => f64::from(x2 - x1).hypot(f64::from(y2 - y1)),
        _ => 0.0,
    }
}

/// Decodes the raw event stream of a single device, one frame at a time.
#[derive(Debug)]
pub struct Classifier {
    capabilities: DeviceCapabilities,
    x_axis: Option<AbsInfo>,
    y_axis: Option<AbsInfo>,
    mt_x_axis: Option<AbsInfo>,
    mt_y_axis: Option<AbsInfo>,
    frame: Frame,
    slots: Vec<Slot>,
    current_slot: usize,
    tool_fingers: u8,
    fingers: u8,
    gesture: Gesture,
    position: (i32, i32),
}

impl Classifier {
    pub fn new(device: &Device) -> Self {
        let capabilities = DeviceCapabilities::from_device(device);
        let slot_count = if capabilities.multitouch {
            device
                .abs_info(codes::ABS_MT_SLOT)
                .map(|info| info.maximum.max(0) as usize + 1)
                .unwrap_or(1)
                .min(MAX_SLOTS)
        } else {
            1
        };
        let x_axis = device.abs_info(codes::ABS_X).copied();
        let y_axis = device.abs_info(codes::ABS_Y).copied();

        Self {
            capabilities,
            x_axis,
            y_axis,
            mt_x_axis: device.abs_info(codes::ABS_MT_POSITION_X).copied(),
            mt_y_axis: device.abs_info(codes::ABS_MT_POSITION_Y).copied(),
            frame: Frame::default(),
            slots: vec![Slot::default(); slot_count],
            current_slot: 0,
            tool_fingers: 0,
            fingers: 0,
            gesture: Gesture::None,
            position: (
                x_axis.map(|info| info.value).unwrap_or(0),
                y_axis.map(|info| info.value).unwrap_or(0),
            ),
        }
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    // Touch devices without slots report their single contact through
    // ABS_X/ABS_Y and BTN_TOUCH.
    fn single_touch(&self) -> bool {
        !self.capabilities.multitouch
            && (self.capabilities.touchscreen || self.capabilities.touchpad)
    }

    fn slot_mut(&mut self) -> Option<&mut Slot> {
        self.slots.get_mut(self.current_slot)
    }

    /// Feeds one raw event. Decoded events are returned once the frame is
    /// complete, i.e. on `SYN_REPORT`.
    pub fn process(&mut self, event: &InputEvent) -> Vec<EventKind> {
        match event.type_ {
            codes::EV_KEY => self.process_key(event.code, event.value),
            codes::EV_REL => match event.code {
                codes::REL_X => self.frame.rel_x += event.value,
                codes::REL_Y => self.frame.rel_y += event.value,
                codes::REL_WHEEL => self.frame.wheel += event.value,
                codes::REL_HWHEEL => self.frame.hwheel += event.value,
                _ => {}
            },
            codes::EV_ABS => self.process_abs(event.code, event.value),
            codes::EV_SW => self.frame.switches.push((event.code, event.value != 0)),
            codes::EV_SYN if event.code == codes::SYN_REPORT => return self.flush(),
            _ => {}
        }

        Vec::new()
    }

    fn process_key(&mut self, code: u16, value: i32) {
        if let Some(count) = tool_finger_count(code) {
            if value != 0 {
                self.tool_fingers = count;
            } else if self.tool_fingers == count {
                self.tool_fingers = 0;
            }
            return;
        }

        if code == codes::BTN_TOUCH {
            if self.single_touch() {
                if let Some(slot) = self.slot_mut() {
                    if value != 0 {
                        slot.begin = true;
                    } else {
                        slot.end = true;
                    }
                }
            }
            return;
        }

        let state = match KeyState::from_value(value) {
            Some(state) => state,
            None => return,
        };

        if !is_button(code) {
            self.frame.keys.push((code, state));
        } else if (codes::BTN_LEFT..=codes::BTN_TASK).contains(&code) {
            self.frame.buttons.push((code, state));
        }
    }

    fn process_abs(&mut self, code: u16, value: i32) {
        match code {
            codes::ABS_MT_SLOT => {
                self.current_slot = usize::try_from(value).unwrap_or(usize::MAX);
            }
            codes::ABS_MT_TRACKING_ID => {
                if let Some(slot) = self.slot_mut() {
                    if value >= 0 {
                        slot.begin = true;
                    } else {
                        slot.end = true;
                    }
                }
            }
            codes::ABS_MT_POSITION_X | codes::ABS_MT_POSITION_Y => {
                if let Some(slot) = self.slot_mut() {
                    if code == codes::ABS_MT_POSITION_X {
                        slot.next_x = value;
                    } else {
                        slot.next_y = value;
                    }
                    slot.moved = true;
                }
            }
            codes::ABS_X | codes::ABS_Y if self.single_touch() => {
                let slot = &mut self.slots[0];
                if code == codes::ABS_X {
                    slot.next_x = value;
                } else {
                    slot.next_y = value;
                }
                slot.moved = true;
            }
            codes::ABS_X if self.capabilities.absolute_pointer => self.frame.abs_x = Some(value),
            codes::ABS_Y if self.capabilities.absolute_pointer => self.frame.abs_y = Some(value),
            _ => {}
        }
    }

    fn flush(&mut self) -> Vec<EventKind> {
        let frame = std::mem::take(&mut self.frame);
        let mut events = Vec::new();

        events.extend(
            frame
                .keys
                .iter()
                .map(|&(key, state)| EventKind::KeyboardKey { key, state }),
        );
        events.extend(
            frame
                .switches
                .iter()
                .map(|&(switch, on)| EventKind::SwitchToggle { switch, on }),
        );

        if self.capabilities.touchpad {
            self.flush_touchpad(&mut events);
        } else {
            if frame.rel_x != 0 || frame.rel_y != 0 {
                events.push(EventKind::PointerMotion {
                    dx: f64::from(frame.rel_x),
                    dy: f64::from(frame.rel_y),
                });
            }

            if frame.abs_x.is_some() || frame.abs_y.is_some() {
                self.position = (
                    frame.abs_x.unwrap_or(self.position.0),
                    frame.abs_y.unwrap_or(self.position.1),
                );
                events.push(EventKind::PointerMotionAbsolute {
                    x: normalize(self.x_axis, self.position.0),
                    y: normalize(self.y_axis, self.position.1),
                });
            }
        }

        events.extend(
            frame
                .buttons
                .iter()
                .map(|&(button, state)| EventKind::PointerButton { button, state }),
        );

        if frame.wheel != 0 || frame.hwheel != 0 {
            events.push(EventKind::PointerAxis {
                source: AxisSource::Wheel,
                vertical: -f64::from(frame.wheel) * WHEEL_CLICK_ANGLE,
                horizontal: f64::from(frame.hwheel) * WHEEL_CLICK_ANGLE,
            });
        }

        if self.capabilities.touchscreen {
            self.flush_touch(&mut events);
        }

        events
    }

    fn touch_position(&self, slot: &Slot) -> (f64, f64) {
        if self.capabilities.multitouch {
            (normalize(self.mt_x_axis, slot.x), normalize(self.mt_y_axis, slot.y))
        } else {
            (normalize(self.x_axis, slot.x), normalize(self.y_axis, slot.y))
        }
    }

    fn flush_touch(&mut self, events: &mut Vec<EventKind>) {
        let before = events.len();

        for index in 0..self.slots.len() {
            let mut slot = self.slots[index];

            if slot.begin {
                if slot.active {
                    events.push(EventKind::TouchUp { slot: index });
                }
                slot.active = true;
                slot.commit_position();
                let (x, y) = self.touch_position(&slot);
                events.push(EventKind::TouchDown { slot: index, x, y });
            } else if slot.moved && slot.active {
                slot.commit_position();
                let (x, y) = self.touch_position(&slot);
                events.push(EventKind::TouchMotion { slot: index, x, y });
            } else {
                slot.commit_position();
            }

            if slot.end && slot.active {
                slot.active = false;
                events.push(EventKind::TouchUp { slot: index });
            }

            slot.clear_flags();
            self.slots[index] = slot;
        }

        if events.len() > before {
            events.push(EventKind::TouchFrame);
        }
    }

    fn flush_touchpad(&mut self, events: &mut Vec<EventKind>) {
        let mut sum = (0, 0);
        let mut moved = false;

        for slot in &mut self.slots {
            if slot.begin {
                slot.active = true;
                slot.commit_position();
            } else if slot.active && slot.moved {
                let (dx, dy) = slot.commit_position();
                sum = (sum.0 + dx, sum.1 + dy);
                moved |= dx != 0 || dy != 0;
            } else {
                slot.commit_position();
            }

            if slot.end {
                slot.active = false;
            }
            slot.clear_flags();
        }

        let active: Vec<(i32, i32)> = self
            .slots
            .iter()
            .filter(|slot| slot.active)
            .map(|slot| (slot.x, slot.y))
            .collect();
        let fingers = self.tool_fingers.max(active.len() as u8);

        if fingers != self.fingers {
            self.end_gesture(events, false);
            self.fingers = fingers;
            self.gesture = if fingers == 2 && active.len() >= 2 {
                Gesture::TwoFinger {
                    initial_spread: spread(&active),
                }
            } else {
                Gesture::None
            };
        }

        if !moved || active.is_empty() {
            return;
        }

        let count = active.len() as f64;
        let (dx, dy) = (f64::from(sum.0) / count, f64::from(sum.1) / count);

        match (fingers, self.gesture) {
            (1, _) => events.push(EventKind::PointerMotion { dx, dy }),
            (2, Gesture::TwoFinger { initial_spread }) => {
                let scale = spread(&active) / initial_spread;
                if initial_spread > 0.0 && (scale - 1.0).abs() > PINCH_THRESHOLD {
                    self.gesture = Gesture::Pinch { initial_spread };
                    events.push(EventKind::GesturePinchBegin { fingers });
                    events.push(EventKind::GesturePinchUpdate { fingers, scale, dx, dy });
                } else {
                    self.gesture = Gesture::Scroll;
                    events.push(finger_scroll(dx, dy));
                }
            }
            (2, Gesture::None) => {
                self.gesture = Gesture::Scroll;
                events.push(finger_scroll(dx, dy));
            }
            (2, Gesture::Scroll) => events.push(finger_scroll(dx, dy)),
            (2, Gesture::Pinch { initial_spread }) => {
                let scale = spread(&active) / initial_spread;
                events.push(EventKind::GesturePinchUpdate { fingers, scale, dx, dy });
            }
            (3..=u8::MAX, Gesture::None) => {
                self.gesture = Gesture::Swipe;
                events.push(EventKind::GestureSwipeBegin { fingers });
                events.push(EventKind::GestureSwipeUpdate { fingers, dx, dy });
            }
            (3..=u8::MAX, Gesture::Swipe) => {
                events.push(EventKind::GestureSwipeUpdate { fingers, dx, dy });
            }
            _ => {}
        }
    }

    fn end_gesture(&mut self, events: &mut Vec<EventKind>, cancelled: bool) {
        let fingers = self.fingers;
        match self.gesture {
            Gesture::Scroll => events.push(finger_scroll(0.0, 0.0)),
            Gesture::Pinch { .. } => events.push(EventKind::GesturePinchEnd { fingers, cancelled }),
            Gesture::Swipe => events.push(EventKind::GestureSwipeEnd { fingers, cancelled }),
            Gesture::None | Gesture::TwoFinger { .. } => {}
        }
        self.gesture = Gesture::None;
    }

    /// Forgets all contacts, e.g. after events were lost. Returns the events
    /// that cancel whatever was in progress.
    pub fn reset(&mut self) -> Vec<EventKind> {
        let mut events = Vec::new();

        if self.capabilities.touchpad {
            self.end_gesture(&mut events, true);
        } else if self.capabilities.touchscreen {
            for (index, slot) in self.slots.iter().enumerate() {
                if slot.active {
                    events.push(EventKind::TouchCancel { slot: index });
                }
            }
            if !events.is_empty() {
                events.push(EventKind::TouchFrame);
            }
        }

        for slot in &mut self.slots {
            slot.active = false;
            slot.clear_flags();
        }
        self.frame = Frame::default();
        self.tool_fingers = 0;
        self.fingers = 0;

        events
    }
}

fn finger_scroll(dx: f64, dy: f64) -> EventKind {
    EventKind::PointerAxis {
        source: AxisSource::Finger,
        vertical: dy,
        horizontal: dx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::{abs, device};
    use crate::event::{Capability, Timestamp};

    fn ev(type_: u16, code: u16, value: i32) -> InputEvent {
        InputEvent::new(Timestamp::default(), type_, code, value)
    }

    fn feed(classifier: &mut Classifier, events: &[(u16, u16, i32)]) -> Vec<EventKind> {
        let mut out = Vec::new();
        for &(type_, code, value) in events {
            out.extend(classifier.process(&ev(type_, code, value)));
        }
        out.extend(classifier.process(&InputEvent::syn_report(Timestamp::default())));
        out
    }

    fn key(code: u16) -> Capability {
        Capability::Other { type_: codes::EV_KEY, code }
    }

    fn rel(code: u16) -> Capability {
        Capability::Other { type_: codes::EV_REL, code }
    }

    fn keyboard() -> Classifier {
        Classifier::new(&device(&[codes::EV_KEY, codes::EV_SW], vec![key(codes::KEY_A)], &[]))
    }

    fn mouse() -> Classifier {
        Classifier::new(&device(
            &[codes::EV_KEY, codes::EV_REL],
            vec![
                key(codes::BTN_LEFT),
                rel(codes::REL_X),
                rel(codes::REL_Y),
                rel(codes::REL_WHEEL),
            ],
            &[],
        ))
    }

    fn touchscreen() -> Classifier {
        Classifier::new(&device(
            &[codes::EV_KEY, codes::EV_ABS],
            vec![
                key(codes::BTN_TOUCH),
                Capability::Abs { code: codes::ABS_X, info: abs(0, 1000) },
                Capability::Abs { code: codes::ABS_Y, info: abs(0, 1000) },
                Capability::Abs { code: codes::ABS_MT_SLOT, info: abs(0, 9) },
                Capability::Abs { code: codes::ABS_MT_POSITION_X, info: abs(0, 1000) },
                Capability::Abs { code: codes::ABS_MT_POSITION_Y, info: abs(0, 1000) },
                Capability::Abs { code: codes::ABS_MT_TRACKING_ID, info: abs(0, 65535) },
            ],
            &[codes::INPUT_PROP_DIRECT],
        ))
    }

    fn touchpad() -> Classifier {
        Classifier::new(&device(
            &[codes::EV_KEY, codes::EV_ABS],
            vec![
                key(codes::BTN_LEFT),
                key(codes::BTN_TOUCH),
                key(codes::BTN_TOOL_FINGER),
                key(codes::BTN_TOOL_DOUBLETAP),
                key(codes::BTN_TOOL_TRIPLETAP),
                Capability::Abs { code: codes::ABS_X, info: abs(0, 1000) },
                Capability::Abs { code: codes::ABS_Y, info: abs(0, 1000) },
                Capability::Abs { code: codes::ABS_MT_SLOT, info: abs(0, 4) },
                Capability::Abs { code: codes::ABS_MT_POSITION_X, info: abs(0, 1000) },
                Capability::Abs { code: codes::ABS_MT_POSITION_Y, info: abs(0, 1000) },
                Capability::Abs { code: codes::ABS_MT_TRACKING_ID, info: abs(0, 65535) },
            ],
            &[codes::INPUT_PROP_POINTER],
        ))
    }

    fn touch_down(slot: i32, x: i32, y: i32) -> [(u16, u16, i32); 4] {
        [
            (codes::EV_ABS, codes::ABS_MT_SLOT, slot),
            (codes::EV_ABS, codes::ABS_MT_TRACKING_ID, 100 + slot),
            (codes::EV_ABS, codes::ABS_MT_POSITION_X, x),
            (codes::EV_ABS, codes::ABS_MT_POSITION_Y, y),
        ]
    }

    fn touch_up(slot: i32) -> [(u16, u16, i32); 2] {
        [
            (codes::EV_ABS, codes::ABS_MT_SLOT, slot),
            (codes::EV_ABS, codes::ABS_MT_TRACKING_ID, -1),
        ]
    }

    #[test]
    fn nothing_before_syn_report() {
        let mut classifier = keyboard();
        assert!(classifier.process(&ev(codes::EV_KEY, codes::KEY_A, 1)).is_empty());
        assert_eq!(
            classifier.process(&InputEvent::syn_report(Timestamp::default())),
            vec![EventKind::KeyboardKey { key: codes::KEY_A, state: KeyState::Pressed }]
        );
    }

    #[test]
    fn keyboard_drops_autorepeat() {
        let mut classifier = keyboard();
        assert!(feed(&mut classifier, &[(codes::EV_KEY, codes::KEY_A, 2)]).is_empty());
        assert_eq!(
            feed(&mut classifier, &[(codes::EV_KEY, codes::KEY_A, 0)]),
            vec![EventKind::KeyboardKey { key: codes::KEY_A, state: KeyState::Released }]
        );
    }

    #[test]
    fn switch_toggle() {
        let mut classifier = keyboard();
        assert_eq!(
            feed(&mut classifier, &[(codes::EV_SW, 0, 1)]),
            vec![EventKind::SwitchToggle { switch: 0, on: true }]
        );
    }

    #[test]
    fn mouse_motion_button_and_wheel() {
        let mut classifier = mouse();
        assert_eq!(
            feed(
                &mut classifier,
                &[
                    (codes::EV_REL, codes::REL_X, 5),
                    (codes::EV_REL, codes::REL_Y, -3),
                    (codes::EV_KEY, codes::BTN_LEFT, 1),
                ]
            ),
            vec![
                EventKind::PointerMotion { dx: 5.0, dy: -3.0 },
                EventKind::PointerButton { button: codes::BTN_LEFT, state: KeyState::Pressed },
            ]
        );
        assert_eq!(
            feed(&mut classifier, &[(codes::EV_REL, codes::REL_WHEEL, 1)]),
            vec![EventKind::PointerAxis {
                source: AxisSource::Wheel,
                vertical: -15.0,
                horizontal: 0.0,
            }]
        );
    }

    #[test]
    fn absolute_pointer_keeps_last_position() {
        let mut classifier = Classifier::new(&device(
            &[codes::EV_KEY, codes::EV_ABS],
            vec![
                key(codes::BTN_LEFT),
                Capability::Abs { code: codes::ABS_X, info: abs(0, 100) },
                Capability::Abs { code: codes::ABS_Y, info: abs(0, 200) },
            ],
            &[],
        ));
        assert!(classifier.capabilities().absolute_pointer);

        assert_eq!(
            feed(
                &mut classifier,
                &[(codes::EV_ABS, codes::ABS_X, 50), (codes::EV_ABS, codes::ABS_Y, 50)]
            ),
            vec![EventKind::PointerMotionAbsolute { x: 0.5, y: 0.25 }]
        );
        assert_eq!(
            feed(&mut classifier, &[(codes::EV_ABS, codes::ABS_Y, 200)]),
            vec![EventKind::PointerMotionAbsolute { x: 0.5, y: 1.0 }]
        );
    }

    #[test]
    fn multitouch_down_motion_up() {
        let mut classifier = touchscreen();
        assert_eq!(
            feed(&mut classifier, &touch_down(0, 500, 250)),
            vec![
                EventKind::TouchDown { slot: 0, x: 0.5, y: 0.25 },
                EventKind::TouchFrame,
            ]
        );
        assert_eq!(
            feed(&mut classifier, &[(codes::EV_ABS, codes::ABS_MT_POSITION_X, 1000)]),
            vec![
                EventKind::TouchMotion { slot: 0, x: 1.0, y: 0.25 },
                EventKind::TouchFrame,
            ]
        );
        assert_eq!(
            feed(&mut classifier, &touch_up(0)),
            vec![EventKind::TouchUp { slot: 0 }, EventKind::TouchFrame]
        );
        assert!(feed(&mut classifier, &[]).is_empty());
    }

    #[test]
    fn second_contact_uses_its_own_slot() {
        let mut classifier = touchscreen();
        feed(&mut classifier, &touch_down(0, 0, 0));
        assert_eq!(
            feed(&mut classifier, &touch_down(3, 1000, 1000)),
            vec![
                EventKind::TouchDown { slot: 3, x: 1.0, y: 1.0 },
                EventKind::TouchFrame,
            ]
        );
    }

    #[test]
    fn single_touch_screen() {
        let mut classifier = Classifier::new(&device(
            &[codes::EV_KEY, codes::EV_ABS],
            vec![
                key(codes::BTN_TOUCH),
                Capability::Abs { code: codes::ABS_X, info: abs(0, 100) },
                Capability::Abs { code: codes::ABS_Y, info: abs(0, 100) },
            ],
            &[codes::INPUT_PROP_DIRECT],
        ));
        assert_eq!(
            feed(
                &mut classifier,
                &[
                    (codes::EV_KEY, codes::BTN_TOUCH, 1),
                    (codes::EV_ABS, codes::ABS_X, 25),
                    (codes::EV_ABS, codes::ABS_Y, 75),
                ]
            ),
            vec![
                EventKind::TouchDown { slot: 0, x: 0.25, y: 0.75 },
                EventKind::TouchFrame,
            ]
        );
        assert_eq!(
            feed(&mut classifier, &[(codes::EV_KEY, codes::BTN_TOUCH, 0)]),
            vec![EventKind::TouchUp { slot: 0 }, EventKind::TouchFrame]
        );
    }

    #[test]
    fn touchpad_single_finger_moves_pointer() {
        let mut classifier = touchpad();
        let mut landing = touch_down(0, 100, 100).to_vec();
        landing.push((codes::EV_KEY, codes::BTN_TOOL_FINGER, 1));
        assert!(feed(&mut classifier, &landing).is_empty());

        assert_eq!(
            feed(
                &mut classifier,
                &[
                    (codes::EV_ABS, codes::ABS_MT_POSITION_X, 110),
                    (codes::EV_ABS, codes::ABS_MT_POSITION_Y, 96),
                ]
            ),
            vec![EventKind::PointerMotion { dx: 10.0, dy: -4.0 }]
        );
        assert_eq!(
            feed(&mut classifier, &[(codes::EV_KEY, codes::BTN_LEFT, 1)]),
            vec![EventKind::PointerButton { button: codes::BTN_LEFT, state: KeyState::Pressed }]
        );
    }

    #[test]
    fn touchpad_two_finger_scroll() {
        let mut classifier = touchpad();
        let mut landing = touch_down(0, 100, 100).to_vec();
        landing.extend(touch_down(1, 200, 100));
        landing.push((codes::EV_KEY, codes::BTN_TOOL_DOUBLETAP, 1));
        assert!(feed(&mut classifier, &landing).is_empty());

        assert_eq!(
            feed(
                &mut classifier,
                &[
                    (codes::EV_ABS, codes::ABS_MT_SLOT, 0),
                    (codes::EV_ABS, codes::ABS_MT_POSITION_Y, 110),
                    (codes::EV_ABS, codes::ABS_MT_SLOT, 1),
                    (codes::EV_ABS, codes::ABS_MT_POSITION_Y, 110),
                ]
            ),
            vec![EventKind::PointerAxis {
                source: AxisSource::Finger,
                vertical: 10.0,
                horizontal: 0.0,
            }]
        );

        let mut lift = touch_up(0).to_vec();
        lift.extend(touch_up(1));
        lift.push((codes::EV_KEY, codes::BTN_TOOL_DOUBLETAP, 0));
        assert_eq!(
            feed(&mut classifier, &lift),
            vec![EventKind::PointerAxis {
                source: AxisSource::Finger,
                vertical: 0.0,
                horizontal: 0.0,
            }]
        );
    }

    #[test]
    fn touchpad_pinch() {
        let mut classifier = touchpad();
        let mut landing = touch_down(0, 100, 100).to_vec();
        landing.extend(touch_down(1, 200, 100));
        landing.push((codes::EV_KEY, codes::BTN_TOOL_DOUBLETAP, 1));
        feed(&mut classifier, &landing);

        assert_eq!(
            feed(
                &mut classifier,
                &[
                    (codes::EV_ABS, codes::ABS_MT_SLOT, 1),
                    (codes::EV_ABS, codes::ABS_MT_POSITION_X, 300),
                ]
            ),
            vec![
                EventKind::GesturePinchBegin { fingers: 2 },
                EventKind::GesturePinchUpdate { fingers: 2, scale: 2.0, dx: 50.0, dy: 0.0 },
            ]
        );

        let mut lift = touch_up(0).to_vec();
        lift.extend(touch_up(1));
        lift.push((codes::EV_KEY, codes::BTN_TOOL_DOUBLETAP, 0));
        assert_eq!(
            feed(&mut classifier, &lift),
            vec![EventKind::GesturePinchEnd { fingers: 2, cancelled: false }]
        );
    }

    #[test]
    fn touchpad_three_finger_swipe() {
        let mut classifier = touchpad();
        let mut landing = touch_down(0, 100, 100).to_vec();
        landing.extend(touch_down(1, 200, 100));
        landing.extend(touch_down(2, 300, 100));
        landing.push((codes::EV_KEY, codes::BTN_TOOL_TRIPLETAP, 1));
        assert!(feed(&mut classifier, &landing).is_empty());

        let mut movement = Vec::new();
        for (slot, x) in [(0, 130), (1, 230), (2, 330)] {
            movement.push((codes::EV_ABS, codes::ABS_MT_SLOT, slot));
            movement.push((codes::EV_ABS, codes::ABS_MT_POSITION_X, x));
        }
        assert_eq!(
            feed(&mut classifier, &movement),
            vec![
                EventKind::GestureSwipeBegin { fingers: 3 },
                EventKind::GestureSwipeUpdate { fingers: 3, dx: 30.0, dy: 0.0 },
            ]
        );

        assert_eq!(
            classifier.reset(),
            vec![EventKind::GestureSwipeEnd { fingers: 3, cancelled: true }]
        );
    }

    #[test]
    fn reset_cancels_touches() {
        let mut classifier = touchscreen();
        feed(&mut classifier, &touch_down(0, 10, 10));
        feed(&mut classifier, &touch_down(1, 20, 20));

        assert_eq!(
            classifier.reset(),
            vec![
                EventKind::TouchCancel { slot: 0 },
                EventKind::TouchCancel { slot: 1 },
                EventKind::TouchFrame,
            ]
        );
        assert!(classifier.reset().is_empty());
    }
}
