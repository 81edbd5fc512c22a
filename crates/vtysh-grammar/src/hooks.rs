//! Collaborator hooks supplied by the embedding shell.
//!
//! The engine never needs these to be wired in: every domain matcher
//! defaults to accepting the word, and a grammar whose dynamic-help names
//! are not registered simply has no dynamic help.
//!
//! Hooks run synchronously inside matching and describing. They may read
//! live external state (an interface table, say) but must return promptly
//! and must not touch the registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Validators for the device-specific name classes (`IFNAME`, `PORT`,
/// `VLAN`, `A:B:C:D:E:F`).
pub trait DomainMatchers {
    /// Whether `word` names an interface.
    fn is_ifname(&self, _word: &str) -> bool {
        true
    }

    /// Whether `word` names a switch port.
    fn is_port(&self, _word: &str) -> bool {
        true
    }

    /// Whether `word` names a VLAN.
    fn is_vlan(&self, _word: &str) -> bool {
        true
    }

    /// Whether `word` is a MAC address.
    fn is_mac(&self, _word: &str) -> bool {
        true
    }
}

/// The default matcher set: every name is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveMatchers;

impl DomainMatchers for PermissiveMatchers {}

/// Dynamic help callback. Receives the grammar atom (e.g. `IFNAME`) and
/// returns the help text to show for it.
pub type DynamicHelp = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Name to callback table consulted while compiling grammars.
#[derive(Clone, Default)]
pub struct DynHelpTable {
    callbacks: HashMap<String, DynamicHelp>,
}

impl DynHelpTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback under `name`. Replaces any previous entry.
    pub fn register<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.callbacks.insert(name.to_string(), Arc::new(callback));
    }

    pub fn get(&self, name: &str) -> Option<DynamicHelp> {
        self.callbacks.get(name).map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl fmt::Debug for DynHelpTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.callbacks.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("DynHelpTable").field("names", &names).finish()
    }
}
