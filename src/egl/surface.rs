//! EGL surfaces

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use tracing::{debug, trace};

use super::{context::Context, ConfigId, Framebuffer, RenderBuffer};
use crate::{
    native::{Attachment, NativeSurface},
    pipe::{BindFlags, Format, PipeScreen, PipeSurface},
    st::TextureType,
    utils::{ids::id_gen, Size},
};

id_gen!(surface_ids);

/// Type of an EGL surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceType {
    /// Backed by a native window
    Window,
    /// Backed by a native pixmap
    Pixmap,
    /// Off-screen, without native backing
    Pbuffer,
    /// Scanned out directly by a CRTC
    Screen,
}

/// `EGL_TEXTURE_FORMAT` of a pbuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// The surface cannot be bound to a texture
    #[default]
    NoTexture,
    /// Bound as RGB texture
    Rgb,
    /// Bound as RGBA texture
    Rgba,
}

impl TextureFormat {
    /// Pipe format of the texture image, if the format can be bound
    pub fn pipe_format(&self) -> Option<Format> {
        match self {
            TextureFormat::Rgb => Some(Format::R8G8B8Unorm),
            TextureFormat::Rgba => Some(Format::B8G8R8A8Unorm),
            TextureFormat::NoTexture => None,
        }
    }
}

/// `EGL_TEXTURE_TARGET` of a pbuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureTarget {
    /// The surface cannot be bound to a texture
    #[default]
    NoTexture,
    /// Bound to a 2D texture
    Texture2D,
}

impl TextureTarget {
    /// Texture type of the state tracker, if the target can be bound
    pub fn texture_type(&self) -> Option<TextureType> {
        match self {
            TextureTarget::Texture2D => Some(TextureType::Texture2D),
            TextureTarget::NoTexture => None,
        }
    }
}

/// Attributes requested at surface creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceAttributes {
    /// Size of pbuffer and screen surfaces. Window and pixmap surfaces take the native size.
    pub size: Size,
    /// Requested render buffer, [`RenderBuffer::Back`] or [`RenderBuffer::Single`]
    pub render_buffer: RenderBuffer,
    /// Format when bound to a texture
    pub texture_format: TextureFormat,
    /// Target when bound to a texture
    pub texture_target: TextureTarget,
    /// Whether storage for mipmaps should be allocated
    pub mipmap_texture: bool,
}

impl Default for SurfaceAttributes {
    fn default() -> Self {
        SurfaceAttributes {
            size: Size::default(),
            render_buffer: RenderBuffer::Back,
            texture_format: TextureFormat::NoTexture,
            texture_target: TextureTarget::NoTexture,
            mipmap_texture: false,
        }
    }
}

/// Handle of a surface of a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId {
    pub(crate) display: usize,
    pub(crate) id: usize,
}

pub(crate) struct Surface {
    token: surface_ids::Token,
    display: usize,
    kind: SurfaceType,
    config: ConfigId,
    attributes: SurfaceAttributes,
    framebuffer: Rc<Framebuffer>,
    mipmap_level: Cell<i32>,
    bound_to_texture: Cell<bool>,
    bound_context: RefCell<Weak<Context>>,
    pub(crate) span: tracing::Span,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.token.get())
            .field("display", &self.display)
            .field("kind", &self.kind)
            .field("config", &self.config)
            .field("attributes", &self.attributes)
            .field("framebuffer", &self.framebuffer)
            .field("bound_to_texture", &self.bound_to_texture.get())
            .finish()
    }
}

impl Surface {
    pub(crate) fn new(
        display: usize,
        kind: SurfaceType,
        config: ConfigId,
        attributes: SurfaceAttributes,
        build: impl FnOnce(&tracing::Span) -> Framebuffer,
        parent: &tracing::Span,
    ) -> Surface {
        let token = surface_ids::Token::new();
        let span = tracing::debug_span!(parent: parent, "surface", id = token.get(), ?kind);
        let framebuffer = Rc::new(build(&span));
        Surface {
            token,
            display,
            kind,
            config,
            attributes,
            framebuffer,
            mipmap_level: Cell::new(0),
            bound_to_texture: Cell::new(false),
            bound_context: RefCell::new(Weak::new()),
            span,
        }
    }

    pub(crate) fn handle(&self) -> SurfaceId {
        SurfaceId {
            display: self.display,
            id: self.token.get(),
        }
    }

    pub(crate) fn kind(&self) -> SurfaceType {
        self.kind
    }

    pub(crate) fn attributes(&self) -> &SurfaceAttributes {
        &self.attributes
    }

    pub(crate) fn framebuffer(&self) -> &Rc<Framebuffer> {
        &self.framebuffer
    }

    /// The render buffer this surface effectively renders to
    pub(crate) fn render_buffer(&self) -> RenderBuffer {
        if self.framebuffer.visual().is_single_buffered() {
            RenderBuffer::Single
        } else {
            RenderBuffer::Back
        }
    }

    pub(crate) fn mipmap_level(&self) -> i32 {
        self.mipmap_level.get()
    }

    pub(crate) fn set_mipmap_level(&self, level: i32) {
        self.mipmap_level.set(level);
    }

    pub(crate) fn is_bound_to_texture(&self) -> bool {
        self.bound_to_texture.get()
    }

    pub(crate) fn set_bound_to_texture(&self, bound: bool) {
        self.bound_to_texture.set(bound);
    }

    /// The context this surface is a draw or read target of
    pub(crate) fn bound_context(&self) -> Option<Rc<Context>> {
        self.bound_context.borrow().upgrade()
    }

    pub(crate) fn set_bound_context(&self, context: Option<&Rc<Context>>) {
        *self.bound_context.borrow_mut() = context.map(Rc::downgrade).unwrap_or_default();
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        let _guard = self.span.enter();
        debug!("Destroying surface");
        self.framebuffer.release();
    }
}

/// Returns a view of the texture backing `attachment` of `native`, created for `usage`.
///
/// The caller owns the returned view, dropping it releases it.
pub(crate) fn export_pipe_surface(
    screen: &dyn PipeScreen,
    native: &mut dyn NativeSurface,
    attachment: Attachment,
    usage: BindFlags,
) -> Option<Box<dyn PipeSurface>> {
    let mut validated = native.validate(attachment.mask())?;
    let texture = validated.textures.take(attachment)?;
    trace!(?attachment, ?usage, "Exporting native attachment");
    screen.get_tex_surface(&texture, 0, 0, 0, usage)
}
