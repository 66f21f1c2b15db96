//! Per-app hook table keyed by registration signature.

use serde_json::Value;
use tracing::debug;

use super::definitions::{HookRegistration, clamp_priority};

/// Deterministic signature of a `(hook, callback, priority)` triple.
///
/// The MD5 digest of the three values concatenated, as lowercase hex. The
/// priority is clamped first, so the result matches what registration stores.
pub fn hook_signature(hook: &str, callback: &str, priority: i32) -> String {
    let priority = clamp_priority(priority);
    format!("{:x}", md5::compute(format!("{hook}{callback}{priority}")))
}

/// Registrations of one app, in insertion order, unique by signature.
#[derive(Debug, Clone, Default)]
pub struct HookTable {
    /// Registrations, first insertion first.
    entries: Vec<HookRegistration>,
}

impl HookTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the signature a registration would receive.
    pub fn key_of(hook: &str, callback: &str, priority: i32) -> String {
        hook_signature(hook, callback, priority)
    }

    /// Adds a hook and returns its signature.
    ///
    /// Registering the same triple again overwrites the earlier record in
    /// place, keeping its original position.
    pub fn register(
        &mut self,
        hook: &str,
        callback: &str,
        priority: i32,
        arguments: Option<Value>,
    ) -> String {
        let mut registration = HookRegistration::new(hook, callback, priority);
        registration.arguments = arguments;
        self.insert(registration)
    }

    /// Inserts a prepared registration and returns its signature.
    pub fn insert(&mut self, registration: HookRegistration) -> String {
        let signature = registration.signature.clone();

        match self
            .entries
            .iter_mut()
            .find(|existing| existing.signature == signature)
        {
            Some(existing) => {
                debug!(
                    hook = %registration.hook,
                    callback = %registration.callback,
                    "Hook re-registered, overwriting"
                );
                *existing = registration;
            }
            None => self.entries.push(registration),
        }

        signature
    }

    /// Whether any registration targets `hook`.
    pub fn uses_hook(&self, hook: &str) -> bool {
        self.entries.iter().any(|entry| entry.hook == hook)
    }

    /// Registrations for `hook`, by ascending priority, ties in insertion order.
    pub fn entries_for(&self, hook: &str) -> Vec<&HookRegistration> {
        let mut matching: Vec<&HookRegistration> =
            self.entries.iter().filter(|entry| entry.hook == hook).collect();
        // sort_by_key is stable
        matching.sort_by_key(|entry| entry.priority);
        matching
    }

    /// Lowest priority registered for `hook`.
    pub fn lowest_priority(&self, hook: &str) -> Option<i32> {
        self.entries
            .iter()
            .filter(|entry| entry.hook == hook)
            .map(|entry| entry.priority)
            .min()
    }

    /// Looks up a registration by signature.
    pub fn get(&self, signature: &str) -> Option<&HookRegistration> {
        self.entries.iter().find(|entry| entry.signature == signature)
    }

    /// Distinct hook names, in first-registration order.
    pub fn hook_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.hook.as_str()) {
                names.push(&entry.hook);
            }
        }
        names
    }

    /// All registrations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &HookRegistration> {
        self.entries.iter()
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
