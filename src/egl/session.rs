//! Per thread-of-control binding state
//!
//! A [`Session`] replaces the thread-local "current context" of EGL. Each thread of control
//! owns one session and passes it to every entry point that depends on the current binding.
//! The session keeps the bound context and surfaces alive: destroying them on the display only
//! unlinks them, they are freed once the session lets go of them.

use std::rc::Rc;

use tracing::warn;

use super::{context::Context, surface::Surface, ContextId, SurfaceId};
use crate::st::ClientApi;

/// The bound (context, draw, read) triple
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) context: Rc<Context>,
    pub(crate) draw: Rc<Surface>,
    pub(crate) read: Rc<Surface>,
}

impl Binding {
    fn attach(&self) {
        self.context.set_current(true);
        self.draw.set_bound_context(Some(&self.context));
        self.read.set_bound_context(Some(&self.context));
    }

    fn detach(&self) {
        self.context.set_current(false);
        self.draw.set_bound_context(None);
        self.read.set_bound_context(None);
    }
}

/// Binding state of one thread of control
#[derive(Debug, Default)]
pub struct Session {
    current: Option<Binding>,
}

impl Session {
    /// Creates an unbound session
    pub fn new() -> Session {
        Session::default()
    }

    /// Returns true if a context is current
    pub fn is_bound(&self) -> bool {
        self.current.is_some()
    }

    /// The current context
    pub fn current_context(&self) -> Option<ContextId> {
        self.current.as_ref().map(|binding| binding.context.handle())
    }

    /// The current draw surface
    pub fn current_draw(&self) -> Option<SurfaceId> {
        self.current.as_ref().map(|binding| binding.draw.handle())
    }

    /// The current read surface
    pub fn current_read(&self) -> Option<SurfaceId> {
        self.current.as_ref().map(|binding| binding.read.handle())
    }

    pub(crate) fn binding(&self) -> Option<&Binding> {
        self.current.as_ref()
    }

    /// The current context, if its handle is `context`
    pub(crate) fn bound_context(&self, context: ContextId) -> Option<&Rc<Context>> {
        self.current
            .as_ref()
            .map(|binding| &binding.context)
            .filter(|bound| bound.handle() == context)
    }

    /// The current context, if it renders with `api`
    pub(crate) fn api_context(&self, api: ClientApi) -> Option<&Rc<Context>> {
        self.current
            .as_ref()
            .map(|binding| &binding.context)
            .filter(|context| context.attributes().api == api)
    }

    /// Checks that the objects of `binding` are not current in another session
    pub(crate) fn check_access(&self, binding: &Binding) -> bool {
        let own = self.current.as_ref().map(|current| &current.context);
        let is_own = |context: &Rc<Context>| own.map(|own| Rc::ptr_eq(own, context)).unwrap_or(false);

        if binding.context.is_current() && !is_own(&binding.context) {
            return false;
        }
        [&binding.draw, &binding.read].into_iter().all(|surface| {
            surface
                .bound_context()
                .map(|context| is_own(&context))
                .unwrap_or(true)
        })
    }

    /// Replaces the current binding, returning the previous one
    pub(crate) fn swap(&mut self, binding: Option<Binding>) -> Option<Binding> {
        if let Some(old) = self.current.as_ref() {
            old.detach();
        }
        if let Some(new) = binding.as_ref() {
            new.attach();
        }
        std::mem::replace(&mut self.current, binding)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(binding) = self.current.take() {
            warn!(
                context = ?binding.context.handle(),
                "Session dropped while a context is current"
            );
            binding.detach();
        }
    }
}
