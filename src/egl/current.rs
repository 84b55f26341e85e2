//! Binding contexts and surfaces to a session

use std::rc::Rc;

use tracing::{debug, instrument, trace, warn};

use super::{
    session::{Binding, Session},
    ContextId, Display, Error, RenderBuffer, SurfaceId, SurfaceType,
};
use crate::st::StAttachment;

impl Display {
    /// Makes `context` current in `session`, drawing to `draw` and reading from `read`.
    ///
    /// Passing no context and no surfaces releases the current binding. The previously bound
    /// context is flushed. Contexts and surfaces destroyed while bound are freed once this call
    /// unbinds them, whether or not binding the new context succeeds.
    ///
    /// If the state tracker refuses the new binding, or refuses to release the old one, the
    /// session is left unbound and [`Error::BindFailure`] is returned.
    #[instrument(level = "trace", parent = &self.span, skip(self, session))]
    pub fn make_current(
        &self,
        session: &mut Session,
        context: Option<ContextId>,
        draw: Option<SurfaceId>,
        read: Option<SurfaceId>,
    ) -> Result<(), Error> {
        let binding = match (context, draw, read) {
            (Some(context), Some(draw), Some(read)) => Some(Binding {
                context: self.lookup_context(context)?.clone(),
                draw: self.lookup_surface(draw)?.clone(),
                read: self.lookup_surface(read)?.clone(),
            }),
            (None, None, None) => None,
            _ => return Err(Error::BadMatch("context and surfaces must be given together")),
        };
        if let Some(binding) = binding.as_ref() {
            if !session.check_access(binding) {
                return Err(Error::BadAccess);
            }
        }

        let old = session.swap(binding.clone());
        if let Some(old) = old.as_ref() {
            old.context.flush();
        }

        let result = match (binding.as_ref(), old.as_ref()) {
            (Some(new), _) => {
                if bind(new) {
                    Ok(())
                } else {
                    warn!(context = ?new.context.handle(), "State tracker refused the binding");
                    let _ = session.swap(None);
                    Err(Error::BindFailure)
                }
            }
            (None, Some(old)) => {
                let _guard = old.context.span.enter();
                let released = old.context.api().make_current(None, None, None);
                old.context.set_window_render_buffer(RenderBuffer::None);
                if released {
                    debug!("Context released");
                    Ok(())
                } else {
                    warn!("State tracker failed to release the context");
                    Err(Error::BindFailure)
                }
            }
            (None, None) => Ok(()),
        };

        drop(binding);
        if let Some(old) = old {
            collect_orphans(old);
        }
        result
    }
}

fn bind(binding: &Binding) -> bool {
    let Binding { context, draw, read } = binding;
    let _guard = context.span.enter();

    let bound = {
        let mut st = context.st().borrow_mut();
        context
            .api()
            .make_current(Some(&mut **st), Some(draw.framebuffer()), Some(read.framebuffer()))
    };
    if !bound {
        return false;
    }

    {
        let mut st = context.st().borrow_mut();
        st.notify_invalid_framebuffer(draw.framebuffer());
        if !Rc::ptr_eq(draw, read) {
            st.notify_invalid_framebuffer(read.framebuffer());
        }
    }

    if draw.kind() == SurfaceType::Window {
        let render_buffer = if draw.framebuffer().visual().render_buffer == StAttachment::FrontLeft {
            RenderBuffer::Single
        } else {
            RenderBuffer::Back
        };
        context.set_window_render_buffer(render_buffer);
    }
    debug!(draw = ?draw.handle(), read = ?read.handle(), "Context made current");
    true
}

/// Drops the previous binding, freeing whatever the display no longer links
fn collect_orphans(old: Binding) {
    let Binding { context, draw, read } = old;
    if Rc::strong_count(&context) == 1 {
        trace!(context = ?context.handle(), "Freeing orphaned context");
    }
    drop(context);

    // draw and read may be the same surface, only its last reference frees it
    for surface in [draw, read] {
        if Rc::strong_count(&surface) == 1 {
            trace!(surface = ?surface.handle(), "Freeing orphaned surface");
        }
        drop(surface);
    }
}
