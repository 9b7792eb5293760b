//! Interceptor chains and manager lifecycle events.
//!
//! An [`InterceptorChain`] is an ordered list of callbacks that may rewrite
//! a payload or veto the operation it belongs to. Callbacks run in the
//! order they were connected and the first veto stops the chain.
//!
//! ```
//! use purple_plugin::signal::{Flow, InterceptorChain};
//!
//! let mut chain: InterceptorChain<String> = InterceptorChain::new();
//! chain.connect(|text: String| Flow::Proceed(text.to_uppercase()));
//! chain.connect(|text: String| {
//!     if text.contains("SECRET") {
//!         Flow::Veto("redacted".into())
//!     } else {
//!         Flow::Proceed(text)
//!     }
//! });
//!
//! assert_eq!(chain.run("hello".into()), Flow::Proceed("HELLO".into()));
//! assert!(chain.run("a secret".into()).is_veto());
//! ```

use std::fmt;

use crate::plugin::Plugin;

/// Outcome of an interceptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flow<T> {
    /// Continue with this (possibly rewritten) payload.
    Proceed(T),
    /// Stop; the payload is dropped. Carries the reason.
    Veto(String),
}

impl<T> Flow<T> {
    pub fn is_veto(&self) -> bool {
        matches!(self, Flow::Veto(_))
    }

    /// The payload, if the chain proceeded.
    pub fn proceeded(self) -> Option<T> {
        match self {
            Flow::Proceed(t) => Some(t),
            Flow::Veto(_) => None,
        }
    }
}

/// Handle returned by [`InterceptorChain::connect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(u64);

type Hook<T> = Box<dyn Fn(T) -> Flow<T> + Send + Sync>;

/// Ordered list of interceptors over payloads of type `T`.
pub struct InterceptorChain<T> {
    hooks: Vec<(HookId, Hook<T>)>,
    next_id: u64,
}

impl<T> Default for InterceptorChain<T> {
    fn default() -> Self {
        Self {
            hooks: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> InterceptorChain<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor.
    pub fn connect<F>(&mut self, hook: F) -> HookId
    where
        F: Fn(T) -> Flow<T> + Send + Sync + 'static,
    {
        let id = HookId(self.next_id);
        self.next_id += 1;
        self.hooks.push((id, Box::new(hook)));
        id
    }

    /// Remove an interceptor. Returns whether it was connected.
    pub fn disconnect(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(hid, _)| *hid != id);
        self.hooks.len() != before
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every interceptor in order.
    pub fn run(&self, payload: T) -> Flow<T> {
        let mut current = payload;
        for (_, hook) in &self.hooks {
            match hook(current) {
                Flow::Proceed(next) => current = next,
                veto @ Flow::Veto(_) => return veto,
            }
        }
        Flow::Proceed(current)
    }
}

impl<T> fmt::Debug for InterceptorChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Notifications emitted by the plugin manager.
#[derive(Clone, Debug)]
pub enum ManagerEvent {
    LoaderRegistered(String),
    LoaderUnregistered(String),
    Loaded(Plugin),
    LoadFailed(Plugin, String),
    Unloaded(Plugin),
    UnloadFailed(Plugin, String),
}

type Listener = Box<dyn Fn(&ManagerEvent) + Send + Sync>;

/// Subscribers to [`ManagerEvent`]s.
#[derive(Default)]
pub struct Listeners {
    listeners: Vec<Listener>,
}

impl Listeners {
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&ManagerEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&self, event: ManagerEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
