//! EGL rendering contexts

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use tracing::{debug, trace};

use super::{ConfigId, RenderBuffer};
use crate::{
    pipe::{FenceRef, FlushFlags},
    st::{ApiSlot, ClientApi, StApi, StContext},
    utils::ids::id_gen,
};

id_gen!(context_ids);

/// Attributes requested at context creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAttributes {
    /// The client API the context renders with
    pub api: ClientApi,
    /// Major version of the client API
    pub version: i32,
}

impl Default for ContextAttributes {
    fn default() -> Self {
        ContextAttributes {
            api: ClientApi::OpenGlEs,
            version: 1,
        }
    }
}

/// Handle of a context of a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId {
    pub(crate) display: usize,
    pub(crate) id: usize,
}

/// A rendering context: the chosen state tracker and its context
pub(crate) struct Context {
    token: context_ids::Token,
    display: usize,
    config: ConfigId,
    attributes: ContextAttributes,
    slot: ApiSlot,
    api: Rc<dyn StApi>,
    st: RefCell<Box<dyn StContext>>,
    window_render_buffer: Cell<RenderBuffer>,
    current: Cell<bool>,
    pub(crate) span: tracing::Span,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.token.get())
            .field("display", &self.display)
            .field("config", &self.config)
            .field("attributes", &self.attributes)
            .field("slot", &self.slot)
            .field("window_render_buffer", &self.window_render_buffer.get())
            .field("current", &self.current.get())
            .finish()
    }
}

impl Context {
    pub(crate) fn new(
        display: usize,
        config: ConfigId,
        attributes: ContextAttributes,
        slot: ApiSlot,
        api: Rc<dyn StApi>,
        st: Box<dyn StContext>,
        parent: &tracing::Span,
    ) -> Context {
        let token = context_ids::Token::new();
        let span = tracing::debug_span!(parent: parent, "context", id = token.get(), ?slot);
        Context {
            token,
            display,
            config,
            attributes,
            slot,
            api,
            st: RefCell::new(st),
            window_render_buffer: Cell::new(RenderBuffer::None),
            current: Cell::new(false),
            span,
        }
    }

    pub(crate) fn handle(&self) -> ContextId {
        ContextId {
            display: self.display,
            id: self.token.get(),
        }
    }

    pub(crate) fn attributes(&self) -> ContextAttributes {
        self.attributes
    }

    pub(crate) fn api(&self) -> &Rc<dyn StApi> {
        &self.api
    }

    pub(crate) fn st(&self) -> &RefCell<Box<dyn StContext>> {
        &self.st
    }

    pub(crate) fn window_render_buffer(&self) -> RenderBuffer {
        self.window_render_buffer.get()
    }

    pub(crate) fn set_window_render_buffer(&self, render_buffer: RenderBuffer) {
        self.window_render_buffer.set(render_buffer);
    }

    pub(crate) fn is_current(&self) -> bool {
        self.current.get()
    }

    pub(crate) fn set_current(&self, current: bool) {
        self.current.set(current);
    }

    /// Flushes the render cache and ends the frame
    pub(crate) fn flush(&self) {
        let _guard = self.span.enter();
        trace!("Flushing context");
        let _ = self.st.borrow_mut().flush(FlushFlags::FRAME_BOUNDARY, false);
    }

    /// Flushes like [`Context::flush`] and asks for a fence covering the submitted work
    pub(crate) fn flush_with_fence(&self) -> Option<FenceRef> {
        let _guard = self.span.enter();
        trace!("Flushing context with fence");
        self.st.borrow_mut().flush(FlushFlags::FRAME_BOUNDARY, true)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        let _guard = self.span.enter();
        debug!("Destroying context");
    }
}
