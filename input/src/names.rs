//! Symbolic names for event types, codes and device properties.

mod table;

use crate::codes;

pub fn event_type_name(type_: u16) -> Option<&'static str> {
    lookup(table::TYPE, type_)
}

/// Returns the symbolic name of `code` within event type `type_`, e.g. `KEY_A` or `ABS_MT_SLOT`.
pub fn event_code_name(type_: u16, code: u16) -> Option<&'static str> {
    let table = match type_ {
        codes::EV_SYN => table::SYN,
        codes::EV_KEY => table::KEY,
        codes::EV_REL => table::REL,
        codes::EV_ABS => table::ABS,
        codes::EV_MSC => table::MSC,
        codes::EV_SW => table::SW,
        codes::EV_LED => table::LED,
        codes::EV_SND => table::SND,
        codes::EV_REP => table::REP,
        codes::EV_FF => table::FF,
        _ => return None,
    };

    lookup(table, code)
}

pub fn property_name(prop: u16) -> Option<&'static str> {
    lookup(table::PROP, prop)
}

/// Highest valid code for an event type, or `None` if the type carries no codes we know of.
pub fn event_type_max(type_: u16) -> Option<u16> {
    let max = match type_ {
        codes::EV_SYN => codes::SYN_MAX,
        codes::EV_KEY => codes::KEY_MAX,
        codes::EV_REL => codes::REL_MAX,
        codes::EV_ABS => codes::ABS_MAX,
        codes::EV_MSC => codes::MSC_MAX,
        codes::EV_SW => codes::SW_MAX,
        codes::EV_LED => codes::LED_MAX,
        codes::EV_SND => codes::SND_MAX,
        codes::EV_REP => codes::REP_MAX,
        codes::EV_FF => codes::FF_MAX,
        _ => return None,
    };

    Some(max)
}

fn lookup(table: &'static [(u16, &'static str)], code: u16) -> Option<&'static str> {
    table
        .binary_search_by_key(&code, |&(value, _)| value)
        .ok()
        .map(|index| table[index].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_sorted() {
        for table in [
            table::TYPE,
            table::SYN,
            table::KEY,
            table::REL,
            table::ABS,
            table::MSC,
            table::SW,
            table::LED,
            table::SND,
            table::REP,
            table::FF,
            table::PROP,
        ] {
            assert!(table.windows(2).all(|pair| pair[0].0 < pair[1].0));
        }
    }

    #[test]
    fn type_names() {
        assert_eq!(event_type_name(codes::EV_SYN), Some("EV_SYN"));
        assert_eq!(event_type_name(codes::EV_KEY), Some("EV_KEY"));
        assert_eq!(event_type_name(codes::EV_FF), Some("EV_FF"));
        assert_eq!(event_type_name(0x06), None);
        assert_eq!(event_type_name(codes::EV_MAX), None);
    }

    #[test]
    fn code_names() {
        assert_eq!(event_code_name(codes::EV_KEY, codes::KEY_A), Some("KEY_A"));
        assert_eq!(event_code_name(codes::EV_REL, codes::REL_WHEEL), Some("REL_WHEEL"));
        assert_eq!(event_code_name(codes::EV_ABS, codes::ABS_MT_SLOT), Some("ABS_MT_SLOT"));
        assert_eq!(event_code_name(codes::EV_SYN, codes::SYN_DROPPED), Some("SYN_DROPPED"));
        assert_eq!(event_code_name(codes::EV_LED, 0), Some("LED_NUML"));
        assert_eq!(event_code_name(codes::EV_FF, 0x50), Some("FF_RUMBLE"));
        assert_eq!(event_code_name(codes::EV_FF, 0x5a), Some("FF_SINE"));
        assert_eq!(event_code_name(codes::EV_FF, 0x60), Some("FF_GAIN"));
        assert_eq!(event_code_name(codes::EV_FF, 0), None);
        assert_eq!(event_code_name(codes::EV_FF, codes::FF_MAX), None);
    }

    #[test]
    fn range_markers_and_aliases_are_not_names() {
        assert_eq!(event_code_name(codes::EV_KEY, codes::BTN_MISC), Some("BTN_0"));
        assert_eq!(event_code_name(codes::EV_KEY, codes::BTN_LEFT), Some("BTN_LEFT"));
        assert_eq!(event_code_name(codes::EV_KEY, 0x130), Some("BTN_SOUTH"));
        assert_eq!(event_code_name(codes::EV_KEY, codes::KEY_MAX), None);
    }

    #[test]
    fn property_names() {
        assert_eq!(property_name(codes::INPUT_PROP_POINTER), Some("INPUT_PROP_POINTER"));
        assert_eq!(property_name(codes::INPUT_PROP_BUTTONPAD), Some("INPUT_PROP_BUTTONPAD"));
        assert_eq!(property_name(codes::INPUT_PROP_MAX), None);
    }

    #[test]
    fn type_max() {
        assert_eq!(event_type_max(codes::EV_KEY), Some(0x2ff));
        assert_eq!(event_type_max(codes::EV_ABS), Some(0x3f));
        assert_eq!(event_type_max(0x1e), None);
    }
}
