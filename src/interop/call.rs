//! Name resolution and invocation
//!
//! Each call re-resolves the name in the runtime's current namespace. Nothing
//! is cached and a failed lookup is never retried under another name.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::OnceCell;
use tracing::warn;

use super::types::{Arguments, NativeValue};
use crate::errors::{find_similar_names, ErrorKind};
use crate::frontend::config::DispatchConfig;
use crate::logging;
use crate::runtime::{Runtime, RuntimeFault};

/// Dispatch failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    NameNotFound { name: String, suggestions: Vec<String> },
    NotCallable { name: String, kind: String },
    CallFailed { name: String, description: String },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NameNotFound { .. } => ErrorKind::NameNotFound,
            Self::NotCallable { .. } => ErrorKind::NotCallable,
            Self::CallFailed { .. } => ErrorKind::CallFailed,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::NameNotFound { name, .. }
            | Self::NotCallable { name, .. }
            | Self::CallFailed { name, .. } => name,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameNotFound { name, .. } => {
                write!(f, "no function named '{}' in the runtime namespace", name)
            }
            Self::NotCallable { name, kind } => {
                write!(f, "'{}' is bound to a {}, which is not callable", name, kind)
            }
            Self::CallFailed { name, description } => {
                write!(f, "call to '{}' failed: {}", name, description)
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// Resolves function names and invokes them
///
/// Stateless apart from its policy flags; the runtime context is passed in on
/// every call.
#[derive(Debug, Clone)]
pub struct CallDispatcher {
    quiet_panics: bool,
    suggest_similar: bool,
    max_suggestions: usize,
}

impl Default for CallDispatcher {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

impl CallDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            quiet_panics: config.quiet_panics,
            suggest_similar: config.suggest_similar,
            max_suggestions: config.max_suggestions,
        }
    }

    /// Whether a caught host panic is still reported by the panic hook
    pub fn with_quiet_panics(mut self, quiet: bool) -> Self {
        self.quiet_panics = quiet;
        self
    }

    pub fn with_suggestions(mut self, max: usize) -> Self {
        self.suggest_similar = max > 0;
        self.max_suggestions = max;
        self
    }

    /// Call `name` with an argument list (possibly empty)
    pub fn invoke<R>(
        &self,
        runtime: &mut R,
        name: &str,
        args: &[NativeValue],
    ) -> Result<NativeValue, DispatchError>
    where
        R: Runtime + ?Sized,
    {
        self.dispatch(runtime, name, Arguments::List(args))
    }

    /// Call `name` without a parameter list
    pub fn invoke_no_args<R>(&self, runtime: &mut R, name: &str) -> Result<NativeValue, DispatchError>
    where
        R: Runtime + ?Sized,
    {
        self.dispatch(runtime, name, Arguments::Unit)
    }

    fn dispatch<R>(
        &self,
        runtime: &mut R,
        name: &str,
        args: Arguments<'_>,
    ) -> Result<NativeValue, DispatchError>
    where
        R: Runtime + ?Sized,
    {
        let binding = self.resolve(runtime, name)?;
        let callee = binding
            .as_callable()
            .ok_or_else(|| DispatchError::NotCallable {
                name: name.to_string(),
                kind: binding.kind_name().to_string(),
            })?;

        logging::log_call_start(name, args.len(), args.is_unit());

        // Host panics never cross the bridge
        let outcome = {
            let _quiet = QuietPanics::enter(self.quiet_panics);
            panic::catch_unwind(AssertUnwindSafe(|| runtime.invoke_binding(callee, args)))
        }
        .unwrap_or_else(|payload| {
            let msg = panic_message(payload.as_ref());
            warn!(event = "host_panic", function = name, panic = %msg, "Host function panicked");
            Err(RuntimeFault::Panic(msg))
        });

        outcome.map_err(|fault| DispatchError::CallFailed {
            name: name.to_string(),
            description: fault.to_string(),
        })
    }

    fn resolve<R>(&self, runtime: &R, name: &str) -> Result<NativeValue, DispatchError>
    where
        R: Runtime + ?Sized,
    {
        match runtime.lookup(name) {
            Some(binding) => Ok(binding),
            None => Err(DispatchError::NameNotFound {
                name: name.to_string(),
                suggestions: self.suggest(runtime, name),
            }),
        }
    }

    fn suggest<R>(&self, runtime: &R, name: &str) -> Vec<String>
    where
        R: Runtime + ?Sized,
    {
        if !self.suggest_similar {
            return Vec::new();
        }
        // Only names that could actually be called
        let callable: Vec<String> = runtime
            .names()
            .into_iter()
            .filter(|candidate| {
                runtime
                    .lookup(candidate)
                    .map_or(false, |binding| binding.as_callable().is_some())
            })
            .collect();
        let mut similar = find_similar_names(name, &callable, 2);
        similar.truncate(self.max_suggestions);
        similar
    }
}

thread_local! {
    static QUIET_DEPTH: Cell<usize> = Cell::new(0);
}

static QUIET_HOOK: OnceCell<()> = OnceCell::new();

/// Silences the panic hook on this thread while a host call runs
///
/// The process-wide hook is wrapped once; panics on other threads, or outside
/// a quiet call, still reach the previous hook.
struct QuietPanics {
    active: bool,
}

impl QuietPanics {
    fn enter(quiet: bool) -> Self {
        if quiet {
            QUIET_HOOK.get_or_init(|| {
                let previous = panic::take_hook();
                panic::set_hook(Box::new(move |info| {
                    if QUIET_DEPTH.with(Cell::get) == 0 {
                        previous(info);
                    }
                }));
            });
            QUIET_DEPTH.with(|depth| depth.set(depth.get() + 1));
        }
        Self { active: quiet }
    }
}

impl Drop for QuietPanics {
    fn drop(&mut self) {
        if self.active {
            QUIET_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
        }
    }
}

#[cfg(test)]
pub(super) fn panics_quieted() -> bool {
    QUIET_DEPTH.with(Cell::get) > 0
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
