// src/exec/env.rs

//! Environment snapshots handed to child processes.
//!
//! The runner never reads `std::env` while building a command. It captures
//! the ambient environment once into an [`Environment`] and `with_env`
//! overlays `KEY=VALUE` entries on top of that snapshot. Tests substitute
//! their own snapshot through `Runner::with_environment`.

use std::collections::BTreeMap;

use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn ambient() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Build a snapshot from `KEY=VALUE` entries; later duplicates win.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new().merged(entries)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of this snapshot with `KEY=VALUE` entries applied in order.
    ///
    /// Entries without `=` or with an empty key are ignored.
    pub fn merged<I, S>(&self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = self.clone();
        for entry in entries {
            let entry = entry.as_ref();
            match split_entry(entry) {
                Some((key, value)) => out.set(key, value),
                None => debug!(entry, "ignoring malformed environment entry"),
            }
        }
        out
    }
}

/// Split `KEY=VALUE` at the first `=`. The value may itself contain `=`.
pub fn split_entry(entry: &str) -> Option<(&str, &str)> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Some((key, value)),
        _ => None,
    }
}
