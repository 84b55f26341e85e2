//! Drawables handed to state trackers
//!
//! Every EGL surface derives one [`Framebuffer`]. State trackers validate it to obtain the
//! textures they render into, and flush it to make front buffer rendering visible.
//! Window, pixmap and screen surfaces forward both to their native surface, pbuffers
//! allocate their single color buffer from the pipe screen.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use super::SurfaceType;
use crate::{
    native::{AttachmentMask, NativeSurface},
    pipe::{BindFlags, PipeScreen, ResourceRef, ResourceTemplate},
    st::{StAttachment, Visual},
    utils::Size,
};

/// Textures returned by [`Framebuffer::validate`], one per requested attachment
pub type ValidatedTextures = SmallVec<[Option<ResourceRef>; 4]>;

struct FramebufferState {
    native: Option<Box<dyn NativeSurface>>,
    render_texture: Option<ResourceRef>,
    size: Size,
    sequence_number: u32,
    released: bool,
}

/// The drawable of an EGL surface, as seen by a state tracker
pub struct Framebuffer {
    kind: SurfaceType,
    visual: Visual,
    screen: Rc<dyn PipeScreen>,
    stamp: Cell<u32>,
    state: RefCell<FramebufferState>,
    span: tracing::Span,
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Framebuffer")
            .field("kind", &self.kind)
            .field("visual", &self.visual)
            .field("stamp", &self.stamp.get())
            .field("size", &state.size)
            .field("has_native", &state.native.is_some())
            .field("has_render_texture", &state.render_texture.is_some())
            .field("released", &state.released)
            .finish()
    }
}

impl Framebuffer {
    pub(crate) fn new(
        kind: SurfaceType,
        visual: Visual,
        screen: Rc<dyn PipeScreen>,
        native: Option<Box<dyn NativeSurface>>,
        size: Size,
        sequence_number: u32,
        parent: &tracing::Span,
    ) -> Framebuffer {
        Framebuffer {
            kind,
            visual,
            screen,
            stamp: Cell::new(0),
            state: RefCell::new(FramebufferState {
                native,
                render_texture: None,
                size,
                sequence_number,
                released: false,
            }),
            span: tracing::trace_span!(parent: parent, "framebuffer"),
        }
    }

    /// Type of the surface this framebuffer was derived from
    pub fn kind(&self) -> SurfaceType {
        self.kind
    }

    /// The visual of the framebuffer
    pub fn visual(&self) -> &Visual {
        &self.visual
    }

    /// Bumped whenever the attachments were reallocated by the native surface.
    ///
    /// State trackers compare it against the value they saw last to know when to
    /// validate again.
    pub fn stamp(&self) -> u32 {
        self.stamp.get()
    }

    /// Size of the framebuffer as of the last validation
    pub fn size(&self) -> Size {
        self.state.borrow().size
    }

    /// Returns the textures of `attachments`, in the same order.
    ///
    /// Attachments the surface does not provide are `None`. Returns `None` if the native
    /// surface failed to validate or the surface was destroyed.
    pub fn validate(&self, attachments: &[StAttachment]) -> Option<ValidatedTextures> {
        let _guard = self.span.enter();
        let mut state = self.state.borrow_mut();
        if state.released {
            warn!("Validating the framebuffer of a destroyed surface");
            return None;
        }

        if self.kind == SurfaceType::Pbuffer {
            return self.validate_pbuffer(&mut state, attachments);
        }

        let mask = attachments
            .iter()
            .filter_map(|attachment| attachment.native())
            .fold(AttachmentMask::empty(), |mask, attachment| mask | attachment.mask());

        let native = state.native.as_mut()?;
        let validated = match native.validate(mask) {
            Some(validated) => validated,
            None => {
                debug!(?mask, "Native surface failed to validate");
                return None;
            }
        };

        let out = attachments
            .iter()
            .map(|attachment| {
                let texture = attachment
                    .native()
                    .and_then(|native| validated.textures.get(native).cloned());
                if *attachment == self.visual.render_buffer {
                    state.render_texture = texture.clone();
                }
                texture
            })
            .collect::<ValidatedTextures>();

        state.size = validated.size;
        if state.sequence_number != validated.sequence_number {
            trace!(
                old = state.sequence_number,
                new = validated.sequence_number,
                "Native buffers changed"
            );
            state.sequence_number = validated.sequence_number;
            self.stamp.set(self.stamp.get().wrapping_add(1));
        }

        Some(out)
    }

    fn validate_pbuffer(
        &self,
        state: &mut FramebufferState,
        attachments: &[StAttachment],
    ) -> Option<ValidatedTextures> {
        let mut out = ValidatedTextures::with_capacity(attachments.len());
        for attachment in attachments {
            if *attachment != self.visual.render_buffer {
                out.push(None);
                continue;
            }

            if state.render_texture.is_none() {
                let template = ResourceTemplate::texture_2d(
                    self.visual.color_format,
                    state.size,
                    BindFlags::RENDER_TARGET | BindFlags::SAMPLER_VIEW,
                );
                match self.screen.resource_create(&template) {
                    Some(texture) => {
                        debug!(size = ?state.size, "Allocated pbuffer render texture");
                        state.render_texture = Some(texture);
                    }
                    None => {
                        warn!(?template, "Failed to allocate pbuffer render texture");
                        return None;
                    }
                }
            }
            out.push(state.render_texture.clone());
        }
        Some(out)
    }

    /// Makes front buffer rendering visible. Pbuffers have nothing to show.
    pub fn flush_front(&self, attachment: StAttachment) -> bool {
        let _guard = self.span.enter();
        trace!(?attachment, "Flushing front buffer");
        if self.kind == SurfaceType::Pbuffer {
            return true;
        }
        self.with_native(|native| native.flush_frontbuffer())
            .unwrap_or(false)
    }

    /// The texture of the render buffer, once a state tracker validated it
    pub(crate) fn render_texture(&self) -> Option<ResourceRef> {
        self.state.borrow().render_texture.clone()
    }

    pub(crate) fn has_render_texture(&self) -> bool {
        self.state.borrow().render_texture.is_some()
    }

    /// Runs `f` with the native surface, if the framebuffer has one
    pub(crate) fn with_native<R>(
        &self,
        f: impl FnOnce(&mut (dyn NativeSurface + 'static)) -> R,
    ) -> Option<R> {
        let mut state = self.state.borrow_mut();
        state.native.as_deref_mut().map(f)
    }

    /// Releases the render texture and destroys the native surface.
    ///
    /// State trackers may still hold the framebuffer, it stays usable as an empty drawable.
    pub(crate) fn release(&self) {
        let (native, texture) = {
            let mut state = self.state.borrow_mut();
            state.released = true;
            (state.native.take(), state.render_texture.take())
        };
        drop(texture);
        if native.is_some() {
            let _guard = self.span.enter();
            debug!("Destroying native surface");
        }
        drop(native);
    }
}
