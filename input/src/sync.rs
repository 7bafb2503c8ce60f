//! Recovery from kernel buffer overruns.
//!
//! When a client falls behind, the kernel drops the queued events and inserts
//! `SYN_DROPPED`. Everything up to the next `SYN_REPORT` is then incomplete and
//! must be thrown away; the device state is re-read and the difference to what
//! the client last saw is delivered as synthetic events.

use crate::codes;
use crate::event::{InputEvent, Timestamp};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io::Error;

/// Outcome of reading from a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadStatus {
    /// An event read in normal order.
    Success(InputEvent),
    /// The kernel reported lost events; sync events follow.
    Dropped,
    /// A synthetic event bringing the client back in line with the device.
    Sync(InputEvent),
    /// Synchronization finished, normal events follow.
    Resynced,
}

/// The state an event device carries between frames.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub keys: BTreeSet<u16>,
    pub leds: BTreeSet<u16>,
    pub switches: BTreeSet<u16>,
    pub abs: BTreeMap<u16, i32>,
}

// Slot values are per contact and cannot be compared against a single snapshot.
pub(crate) fn is_multitouch_axis(code: u16) -> bool {
    (codes::ABS_MT_SLOT..=codes::ABS_MAX).contains(&code)
}

fn set_bit(set: &mut BTreeSet<u16>, code: u16, on: bool) {
    if on {
        set.insert(code);
    } else {
        set.remove(&code);
    }
}

impl DeviceState {
    pub fn apply(&mut self, event: &InputEvent) {
        match event.type_ {
            codes::EV_KEY => set_bit(&mut self.keys, event.code, event.value != 0),
            codes::EV_LED => set_bit(&mut self.leds, event.code, event.value != 0),
            codes::EV_SW => set_bit(&mut self.switches, event.code, event.value != 0),
            codes::EV_ABS if !is_multitouch_axis(event.code) => {
                self.abs.insert(event.code, event.value);
            }
            _ => {}
        }
    }

    /// Events that turn `self` into `new`, terminated by a `SYN_REPORT`.
    /// Empty when nothing changed.
    pub fn diff(&self, new: &DeviceState, time: Timestamp) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for (type_, old_bits, new_bits) in [
            (codes::EV_KEY, &self.keys, &new.keys),
            (codes::EV_LED, &self.leds, &new.leds),
            (codes::EV_SW, &self.switches, &new.switches),
        ] {
            let mut changed: Vec<(u16, i32)> = new_bits
                .difference(old_bits)
                .map(|&code| (code, 1))
                .chain(old_bits.difference(new_bits).map(|&code| (code, 0)))
                .collect();
            changed.sort_unstable();
            events.extend(
                changed
                    .into_iter()
                    .map(|(code, value)| InputEvent::new(time, type_, code, value)),
            );
        }

        for (&code, &value) in &new.abs {
            if self.abs.get(&code) != Some(&value) {
                events.push(InputEvent::new(time, codes::EV_ABS, code, value));
            }
        }

        if !events.is_empty() {
            events.push(InputEvent::syn_report(time));
        }

        events
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Normal,
    Dropped,
}

/// Turns the raw event stream of one device into [`ReadStatus`] values.
#[derive(Debug)]
pub struct Synchronizer {
    state: DeviceState,
    mode: Mode,
    pending: VecDeque<ReadStatus>,
}

impl Synchronizer {
    pub fn new(state: DeviceState) -> Self {
        Self {
            state,
            mode: Mode::Normal,
            pending: VecDeque::new(),
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn pop(&mut self) -> Option<ReadStatus> {
        self.pending.pop_front()
    }

    /// Feeds one raw event. `fetch` is only called when a drop has to be
    /// resolved and must return the current state of the device.
    pub fn push<F>(&mut self, event: InputEvent, fetch: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<DeviceState, Error>,
    {
        match self.mode {
            Mode::Normal if event.is_syn_dropped() => {
                self.mode = Mode::Dropped;
                self.pending.push_back(ReadStatus::Dropped);
            }
            Mode::Normal => {
                self.state.apply(&event);
                self.pending.push_back(ReadStatus::Success(event));
            }
            Mode::Dropped if event.is_syn_report() => {
                let fresh = fetch()?;
                self.pending.extend(
                    self.state
                        .diff(&fresh, event.time)
                        .into_iter()
                        .map(ReadStatus::Sync),
                );
                self.pending.push_back(ReadStatus::Resynced);
                self.state = fresh;
                self.mode = Mode::Normal;
            }
            Mode::Dropped => log::trace!("Discarding {:?} after SYN_DROPPED", event),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    fn time(usec: i64) -> Timestamp {
        Timestamp { sec: 10, usec }
    }

    fn key(code: u16, value: i32) -> InputEvent {
        InputEvent::new(time(0), codes::EV_KEY, code, value)
    }

    fn drain(sync: &mut Synchronizer) -> Vec<ReadStatus> {
        std::iter::from_fn(|| sync.pop()).collect()
    }

    #[test]
    fn apply_tracks_bits_and_axes() {
        let mut state = DeviceState::default();
        state.apply(&key(codes::KEY_A, 1));
        state.apply(&InputEvent::new(time(0), codes::EV_LED, 1, 1));
        state.apply(&InputEvent::new(time(0), codes::EV_ABS, codes::ABS_X, 42));
        state.apply(&InputEvent::new(time(0), codes::EV_ABS, codes::ABS_MT_POSITION_X, 7));
        assert!(state.keys.contains(&codes::KEY_A));
        assert!(state.leds.contains(&1));
        assert_eq!(state.abs.get(&codes::ABS_X), Some(&42));
        assert!(state.abs.get(&codes::ABS_MT_POSITION_X).is_none());

        state.apply(&key(codes::KEY_A, 0));
        assert!(state.keys.is_empty());
    }

    #[test]
    fn diff_of_equal_states_is_empty() {
        let mut state = DeviceState::default();
        state.keys.insert(codes::KEY_A);
        assert!(state.diff(&state.clone(), time(0)).is_empty());
    }

    #[test]
    fn diff_releases_presses_and_moves() {
        let mut old = DeviceState::default();
        old.keys.insert(codes::KEY_A);
        old.abs.insert(codes::ABS_X, 10);
        old.abs.insert(codes::ABS_Y, 20);

        let mut new = DeviceState::default();
        new.keys.insert(codes::KEY_SPACE);
        new.switches.insert(0);
        new.abs.insert(codes::ABS_X, 10);
        new.abs.insert(codes::ABS_Y, 25);

        let events = old.diff(&new, time(5));
        let triples: Vec<_> = events.iter().map(|e| (e.type_, e.code, e.value)).collect();
        assert_eq!(
            triples,
            vec![
                (codes::EV_KEY, codes::KEY_A, 0),
                (codes::EV_KEY, codes::KEY_SPACE, 1),
                (codes::EV_SW, 0, 1),
                (codes::EV_ABS, codes::ABS_Y, 25),
                (codes::EV_SYN, codes::SYN_REPORT, 0),
            ]
        );
        assert!(events.iter().all(|e| e.time == time(5)));
    }

    #[test]
    fn normal_events_pass_through() {
        let mut sync = Synchronizer::new(DeviceState::default());
        sync.push(key(codes::KEY_A, 1), || unreachable!()).unwrap();
        sync.push(InputEvent::syn_report(time(0)), || unreachable!()).unwrap();

        assert_eq!(
            drain(&mut sync),
            vec![
                ReadStatus::Success(key(codes::KEY_A, 1)),
                ReadStatus::Success(InputEvent::syn_report(time(0))),
            ]
        );
        assert!(sync.state().keys.contains(&codes::KEY_A));
    }

    #[test]
    fn drop_discards_until_report_then_syncs() {
        let mut sync = Synchronizer::new(DeviceState::default());
        sync.push(key(codes::KEY_A, 1), || unreachable!()).unwrap();

        let dropped = InputEvent::new(time(1), codes::EV_SYN, codes::SYN_DROPPED, 0);
        sync.push(dropped, || unreachable!()).unwrap();
        sync.push(key(codes::KEY_SPACE, 1), || unreachable!()).unwrap();

        let mut fresh = DeviceState::default();
        fresh.keys.insert(codes::KEY_SPACE);
        sync.push(InputEvent::syn_report(time(2)), || Ok(fresh.clone()))
            .unwrap();

        let statuses = drain(&mut sync);
        assert_eq!(statuses[0], ReadStatus::Success(key(codes::KEY_A, 1)));
        assert_eq!(statuses[1], ReadStatus::Dropped);
        assert_eq!(
            statuses[2],
            ReadStatus::Sync(InputEvent::new(time(2), codes::EV_KEY, codes::KEY_A, 0))
        );
        assert_eq!(
            statuses[3],
            ReadStatus::Sync(InputEvent::new(time(2), codes::EV_KEY, codes::KEY_SPACE, 1))
        );
        assert_eq!(statuses[4], ReadStatus::Sync(InputEvent::syn_report(time(2))));
        assert_eq!(statuses[5], ReadStatus::Resynced);
        assert_eq!(statuses.len(), 6);
        assert_eq!(sync.state(), &fresh);

        sync.push(key(codes::KEY_SPACE, 0), || unreachable!()).unwrap();
        assert_eq!(drain(&mut sync), vec![ReadStatus::Success(key(codes::KEY_SPACE, 0))]);
    }

    #[test]
    fn fetch_error_is_propagated() {
        let mut sync = Synchronizer::new(DeviceState::default());
        let dropped = InputEvent::new(time(1), codes::EV_SYN, codes::SYN_DROPPED, 0);
        sync.push(dropped, || unreachable!()).unwrap();

        let result = sync.push(InputEvent::syn_report(time(2)), || {
            Err(Error::from(ErrorKind::BrokenPipe))
        });
        assert_eq!(result.unwrap_err().kind(), ErrorKind::BrokenPipe);
    }
}
