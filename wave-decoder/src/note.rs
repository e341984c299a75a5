//! Best-effort extraction of `key:value` / `key=value` entries from a wave note.
//!
//! Notes are free text; acquisition software commonly writes one entry per line
//! (Igor uses carriage returns) or separates entries with semicolons.

const DATA_UNIT_KEYS: [&str; 3] = ["dataunits", "yunits", "units"];
const TIME_UNIT_KEYS: [&str; 2] = ["xunits", "timeunits"];

pub(crate) fn entries(note: &str) -> impl Iterator<Item = (&str, &str)> {
    note.split(['\r', '\n', ';'])
        .filter_map(|entry| entry.split_once([':', '=']))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
}

fn lookup<'a>(note: &'a str, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|wanted| {
        entries(note)
            .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value)
    })
}

pub(crate) fn data_units(note: &str) -> Option<&str> {
    lookup(note, &DATA_UNIT_KEYS)
}

pub(crate) fn time_units(note: &str) -> Option<&str> {
    lookup(note, &TIME_UNIT_KEYS)
}
