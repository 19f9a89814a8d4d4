//! Hook binding.
//!
//! Hosts register named, zero-argument hooks explicitly. [`MethodBindings`]
//! flattens a list of hosts into one name → hook map and refuses ambiguous
//! names instead of letting one host shadow another.

use crate::error::DefinitionError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A zero-argument lifecycle callback.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// A named collection of hooks supplied by one collaborator.
#[derive(Clone)]
pub struct Host {
    name: String,
    hooks: Vec<(String, Hook)>,
}

impl Host {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: Vec::new(),
        }
    }

    /// Registers a hook under `name`.
    pub fn hook<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.push((name.into(), Arc::new(f)));
        self
    }

    /// Registers an already shared hook under `name`.
    pub fn shared_hook(mut self, name: impl Into<String>, hook: Hook) -> Self {
        self.hooks.push((name.into(), hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hook names in registration order.
    pub fn hook_names(&self) -> impl Iterator<Item = &str> {
        self.hooks.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("name", &self.name)
            .field("hooks", &self.hook_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Implemented by domain objects that expose hooks for a state machine.
///
/// ```rust
/// use statewright_core::{Host, HookProvider};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// struct Station {
///     runs: Arc<AtomicUsize>,
/// }
///
/// impl HookProvider for Station {
///     fn host(&self) -> Host {
///         let runs = self.runs.clone();
///         Host::new("station").hook("OnRun", move || {
///             runs.fetch_add(1, Ordering::SeqCst);
///         })
///     }
/// }
/// ```
pub trait HookProvider {
    fn host(&self) -> Host;
}

impl HookProvider for Host {
    fn host(&self) -> Host {
        self.clone()
    }
}

/// A hook together with the host that supplied it.
#[derive(Clone)]
pub struct BoundHook {
    name: String,
    host: String,
    hook: Hook,
}

impl BoundHook {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn invoke(&self) {
        tracing::trace!("invoking hook {} on host {}", self.name, self.host);
        (self.hook)()
    }
}

impl fmt::Debug for BoundHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundHook")
            .field("name", &self.name)
            .field("host", &self.host)
            .finish()
    }
}

/// Flat name → hook map built from a list of hosts.
#[derive(Debug, Clone, Default)]
pub struct MethodBindings {
    hooks: HashMap<String, BoundHook>,
}

impl MethodBindings {
    /// Registers every hook of every host, in order.
    ///
    /// A name registered twice, whether by two hosts or by one, is an error.
    pub fn resolve(hosts: &[Host]) -> Result<Self, DefinitionError> {
        let mut bindings = Self::default();
        for host in hosts {
            for (name, hook) in &host.hooks {
                if let Some(existing) = bindings.hooks.get(name) {
                    return Err(DefinitionError::DuplicateBinding {
                        method: name.clone(),
                        first_host: existing.host.clone(),
                        second_host: host.name.clone(),
                    });
                }

                bindings.hooks.insert(
                    name.clone(),
                    BoundHook {
                        name: name.clone(),
                        host: host.name.clone(),
                        hook: hook.clone(),
                    },
                );
            }
        }
        Ok(bindings)
    }

    pub fn get(&self, name: &str) -> Option<&BoundHook> {
        self.hooks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
