//! Child process environment

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;

/// Overlay declared `KEY=VALUE` entries onto an ambient environment
///
/// Later entries win. An entry without `=` sets the key to the empty string;
/// an entry with an empty key is skipped.
pub fn merge_env<I, K, V>(ambient: I, declared: &[String]) -> BTreeMap<OsString, OsString>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
{
    let mut merged: BTreeMap<OsString, OsString> = ambient
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();

    for entry in declared {
        let (key, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
        if key.is_empty() {
            log::warn!("Ignoring env entry without a name: '{}'", entry);
            continue;
        }
        merged.insert(OsString::from(key), OsString::from(value));
    }

    merged
}

/// The current process environment with `declared` applied on top
pub fn process_env(declared: &[String]) -> BTreeMap<OsString, OsString> {
    merge_env(env::vars_os(), declared)
}
