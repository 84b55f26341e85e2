//! Binding pbuffers as OpenGL ES texture images

use tracing::{debug, instrument, trace, warn};

use super::{session::Session, Display, Error, RenderBuffer, SurfaceId, SurfaceType};
use crate::{
    pipe::Format,
    st::{ClientApi, TextureType},
};

impl Display {
    /// Binds the color buffer of a pbuffer as texture image of the current OpenGL ES context.
    ///
    /// Succeeds without binding anything if `session` has no current OpenGL ES context, or if
    /// its state tracker cannot take texture images.
    #[instrument(level = "trace", parent = &self.span, skip(self, session))]
    pub fn bind_tex_image(&self, session: &Session, surface: SurfaceId, buffer: RenderBuffer) -> Result<(), Error> {
        let surface = self.lookup_surface(surface)?;
        if surface.kind() != SurfaceType::Pbuffer {
            return Err(Error::BadSurface);
        }
        if buffer != RenderBuffer::Back {
            return Err(Error::InvalidParameter("buffer"));
        }
        if surface.is_bound_to_texture() {
            return Err(Error::AlreadyBound);
        }

        let attributes = surface.attributes();
        let format = attributes
            .texture_format
            .pipe_format()
            .ok_or(Error::UnsupportedFormat)?;
        let target = attributes
            .texture_target
            .texture_type()
            .ok_or(Error::UnsupportedFormat)?;

        let Some(es) = session.api_context(ClientApi::OpenGlEs) else {
            trace!("No OpenGL ES context is current");
            return Ok(());
        };
        let Some(texture) = surface.framebuffer().render_texture() else {
            debug!("Pbuffer has no render texture to bind");
            return Err(Error::TexImageFailed);
        };

        if let Some(context) = surface.bound_context() {
            context.flush();
        }

        let mut st = es.st().borrow_mut();
        if !st.supports_teximage() {
            trace!("State tracker cannot take texture images");
            return Ok(());
        }
        if !st.teximage(
            target,
            surface.mipmap_level(),
            format,
            Some(&texture),
            attributes.mipmap_texture,
        ) {
            warn!(surface = ?surface.handle(), "State tracker failed to take the texture image");
            return Err(Error::TexImageFailed);
        }
        surface.set_bound_to_texture(true);
        debug!(surface = ?surface.handle(), level = surface.mipmap_level(), "Bound to texture");
        Ok(())
    }

    /// Releases a pbuffer bound by [`Display::bind_tex_image`].
    ///
    /// The surface is unbound even if no OpenGL ES context is current any more.
    #[instrument(level = "trace", parent = &self.span, skip(self, session))]
    pub fn release_tex_image(
        &self,
        session: &Session,
        surface: SurfaceId,
        buffer: RenderBuffer,
    ) -> Result<(), Error> {
        let surface = self.lookup_surface(surface)?;
        if surface.kind() != SurfaceType::Pbuffer {
            return Err(Error::BadSurface);
        }
        if !surface.is_bound_to_texture() {
            return Err(Error::NotBound);
        }
        if buffer != RenderBuffer::Back {
            return Err(Error::InvalidParameter("buffer"));
        }

        if surface.framebuffer().has_render_texture() {
            if let Some(es) = session.api_context(ClientApi::OpenGlEs) {
                let _ = es.st().borrow_mut().teximage(
                    TextureType::Texture2D,
                    surface.mipmap_level(),
                    Format::None,
                    None,
                    false,
                );
            }
        }

        surface.set_bound_to_texture(false);
        debug!(surface = ?surface.handle(), "Released from texture");
        Ok(())
    }
}
