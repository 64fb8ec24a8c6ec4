//! Virtual Command Registry
//!
//! Process-wide map from command name to handler, consulted before
//! spawning an external program. Disabling the registry makes every
//! lookup miss while preserving the contents for a later re-enable.
//! Mutations are serialized behind the lock; lookups clone the handler
//! out so dispatch never holds it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::types::{Command, Handler, StreamingCommand};

pub struct VirtualRegistry {
    commands: HashMap<String, Handler>,
    enabled: bool,
}

impl VirtualRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            enabled: true,
        }
    }

    /// A registry pre-populated with the builtin command set.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, handler) in super::builtin_handlers() {
            registry.commands.insert(name.to_string(), handler);
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Handler) {
        self.commands.insert(name.into(), handler);
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.commands.remove(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    /// Honors the enable flag; names are case-sensitive.
    pub fn contains(&self, name: &str) -> bool {
        self.enabled && self.commands.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Handler> {
        if !self.enabled {
            return None;
        }
        self.commands.get(name).cloned()
    }
}

impl Default for VirtualRegistry {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static::lazy_static! {
    static ref REGISTRY: RwLock<VirtualRegistry> = RwLock::new(VirtualRegistry::with_builtins());
}

/// Register a handler under a name, replacing any previous handler.
pub fn register(name: impl Into<String>, handler: Handler) {
    REGISTRY.write().unwrap().register(name, handler)
}

/// Register a batched command under its own name.
pub fn register_command(command: Arc<dyn Command>) {
    let name = command.name().to_string();
    register(name, Handler::Batched(command));
}

/// Register a streaming command under its own name.
pub fn register_streaming(command: Arc<dyn StreamingCommand>) {
    let name = command.name().to_string();
    register(name, Handler::Streaming(command));
}

/// Remove a handler. Returns whether it existed.
pub fn unregister(name: &str) -> bool {
    REGISTRY.write().unwrap().unregister(name)
}

/// Registered names, sorted, regardless of the enable flag.
pub fn list() -> Vec<String> {
    REGISTRY.read().unwrap().names()
}

/// Make every name resolve as external until re-enabled.
pub fn disable() {
    REGISTRY.write().unwrap().enabled = false;
}

/// Restore virtual dispatch with the preserved contents.
pub fn enable() {
    REGISTRY.write().unwrap().enabled = true;
}

pub fn is_enabled() -> bool {
    REGISTRY.read().unwrap().enabled
}

/// Whether `name` currently dispatches virtually.
pub fn has(name: &str) -> bool {
    REGISTRY.read().unwrap().contains(name)
}

/// Handler for `name`, honoring the enable flag.
pub(crate) fn lookup(name: &str) -> Option<Handler> {
    REGISTRY.read().unwrap().get(name)
}
