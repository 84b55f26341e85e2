//! Presentation and synchronization entry points

use std::rc::Rc;

use tracing::{debug, instrument, trace, warn};

use super::{
    context::Context,
    session::Session,
    surface::{export_pipe_surface, Surface},
    ContextId, Display, Error, SurfaceId, SurfaceType, CORE_NATIVE_ENGINE,
};
use crate::{
    native::{Attachment, NativePixmap},
    pipe::BindFlags,
    st::StAttachment,
    utils::Point,
};

/// The context of `session` if `surface` is its draw surface
fn drawing_context<'a>(session: &'a Session, surface: &Rc<Surface>) -> Option<&'a Rc<Context>> {
    session
        .binding()
        .filter(|binding| Rc::ptr_eq(&binding.draw, surface))
        .map(|binding| &binding.context)
}

impl Display {
    /// Posts the back buffer of a window surface.
    ///
    /// Pixmap and pbuffer surfaces have nothing to post, neither do single-buffered
    /// surfaces: for those this is a successful no-op. If the surface is the draw surface
    /// of `session`, the current context is flushed first.
    #[instrument(level = "trace", parent = &self.span, skip(self, session))]
    #[profiling::function]
    pub fn swap_buffers(&self, session: &Session, surface: SurfaceId) -> Result<(), Error> {
        let surface = self.lookup_surface(surface)?;
        if matches!(surface.kind(), SurfaceType::Pixmap | SurfaceType::Pbuffer) {
            return Ok(());
        }
        if surface.framebuffer().visual().render_buffer == StAttachment::FrontLeft {
            trace!("Single-buffered surface, nothing to swap");
            return Ok(());
        }

        if let Some(context) = drawing_context(session, surface) {
            context.flush();
        }

        let swapped = surface
            .framebuffer()
            .with_native(|native| native.swap_buffers())
            .unwrap_or(false);
        if swapped {
            Ok(())
        } else {
            warn!(surface = ?surface.handle(), "Native surface failed to swap buffers");
            Err(Error::SwapFailed)
        }
    }

    /// Copies the color buffer of `surface` into a native pixmap.
    ///
    /// Like [`Display::swap_buffers`] this is a successful no-op for pixmap and pbuffer
    /// surfaces. Nothing is copied until a state tracker rendered into the surface.
    #[instrument(level = "trace", parent = &self.span, skip(self, session))]
    #[profiling::function]
    pub fn copy_buffers(&self, session: &Session, surface: SurfaceId, pixmap: NativePixmap) -> Result<(), Error> {
        let surface = self.lookup_surface(surface)?;
        if matches!(surface.kind(), SurfaceType::Pixmap | SurfaceType::Pbuffer) {
            trace!(kind = ?surface.kind(), "Nothing to copy from");
            return Ok(());
        }
        let Some(render_texture) = surface.framebuffer().render_texture() else {
            trace!("Surface has no render texture yet");
            return Ok(());
        };

        let config = self.find_pixmap_config(pixmap).ok_or(Error::NoMatchingConfig)?;
        // declared before the views, so it outlives every view taken from it
        let Some(mut target) = self.native().create_pixmap_surface(pixmap, config.native()) else {
            warn!(?pixmap, "Failed to create a surface for the native pixmap");
            return Err(Error::BadNativePixmap);
        };

        if let Some(context) = drawing_context(session, surface) {
            context.flush();
        }

        let mut pipe = self.pipe.borrow_mut();
        if pipe.is_none() {
            debug!("Creating auxiliary pipe context");
            *pipe = self.pipe_screen.context_create();
        }
        let Some(pipe) = pipe.as_mut() else {
            warn!("Failed to create the auxiliary pipe context");
            return Err(Error::CopyFailed);
        };

        let Some(dst) = export_pipe_surface(
            &*self.pipe_screen,
            &mut *target,
            Attachment::FrontLeft,
            BindFlags::BLIT_DESTINATION,
        ) else {
            debug!("Pixmap has no front buffer to copy into");
            return Ok(());
        };
        let Some(src) = self
            .pipe_screen
            .get_tex_surface(&render_texture, 0, 0, 0, BindFlags::BLIT_SOURCE)
        else {
            debug!("Failed to create a view of the render texture");
            return Ok(());
        };

        pipe.surface_copy(&*dst, Point::default(), &*src, Point::default(), dst.size());
        drop(src);
        if !target.flush_frontbuffer() {
            warn!(?pixmap, "Failed to flush the pixmap");
        }
        drop(dst);
        Ok(())
    }

    /// Blocks until all rendering submitted through `context` has completed.
    ///
    /// The current context of `session` is resolved through the session, so it can be waited
    /// on even after it was destroyed.
    #[instrument(level = "trace", parent = &self.span, skip(self, session))]
    #[profiling::function]
    pub fn wait_client(&self, session: &Session, context: ContextId) -> Result<(), Error> {
        let context = match session.bound_context(context) {
            Some(context) => context,
            None => self.lookup_context(context)?,
        };
        let Some(fence) = context.flush_with_fence() else {
            trace!("State tracker returned no fence");
            return Ok(());
        };
        if !self.pipe_screen.fence_finish(&fence, None) {
            warn!("Waiting for the client fence failed");
        }
        Ok(())
    }

    /// Blocks until native rendering to the current draw surface of `session` has completed.
    ///
    /// Only [`CORE_NATIVE_ENGINE`] is known.
    #[instrument(level = "trace", parent = &self.span, skip(self, session))]
    pub fn wait_native(&self, session: &Session, engine: i32) -> Result<(), Error> {
        if engine != CORE_NATIVE_ENGINE {
            return Err(Error::InvalidParameter("engine"));
        }
        if let Some(binding) = session.binding() {
            binding.draw.framebuffer().with_native(|native| native.wait());
        }
        Ok(())
    }
}
