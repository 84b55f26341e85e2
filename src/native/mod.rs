//! Native window system abstraction
//!
//! A [`NativeDisplay`] is the platform side of an EGL display. It creates one
//! [`NativeSurface`] per window, pixmap or scanout target, and tells which configs can render
//! into a given pixmap.
//!
//! Native surfaces own exactly one platform resource. Dropping the boxed surface destroys it.

use std::{fmt, rc::Rc};

use crate::{
    pipe::{Format, PipeScreen, ResourceRef},
    utils::Size,
};

mod modeset;
pub use self::modeset::{NativeConnector, NativeMode, NativeModeset};

/// Opaque handle of a platform window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeWindow(pub usize);

/// Opaque handle of a platform pixmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativePixmap(pub usize);

/// Color buffers a native surface can provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Front buffer, left eye
    FrontLeft,
    /// Back buffer, left eye
    BackLeft,
    /// Front buffer, right eye
    FrontRight,
    /// Back buffer, right eye
    BackRight,
}

/// Number of [`Attachment`] variants
pub const NUM_ATTACHMENTS: usize = 4;

impl Attachment {
    /// All attachments, ordered by index
    pub const ALL: [Attachment; NUM_ATTACHMENTS] = [
        Attachment::FrontLeft,
        Attachment::BackLeft,
        Attachment::FrontRight,
        Attachment::BackRight,
    ];

    /// Index of the attachment in an [`AttachmentTextures`] set
    pub fn index(self) -> usize {
        match self {
            Attachment::FrontLeft => 0,
            Attachment::BackLeft => 1,
            Attachment::FrontRight => 2,
            Attachment::BackRight => 3,
        }
    }

    /// The mask containing only this attachment
    pub fn mask(self) -> AttachmentMask {
        AttachmentMask::from_bits_truncate(1 << self.index())
    }
}

bitflags::bitflags! {
    /// Set of [`Attachment`]s
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttachmentMask: u32 {
        /// [`Attachment::FrontLeft`]
        const FRONT_LEFT = 1 << 0;
        /// [`Attachment::BackLeft`]
        const BACK_LEFT = 1 << 1;
        /// [`Attachment::FrontRight`]
        const FRONT_RIGHT = 1 << 2;
        /// [`Attachment::BackRight`]
        const BACK_RIGHT = 1 << 3;
    }
}

impl AttachmentMask {
    /// Iterates the attachments contained in the mask
    pub fn attachments(self) -> impl Iterator<Item = Attachment> {
        Attachment::ALL
            .into_iter()
            .filter(move |attachment| self.contains(attachment.mask()))
    }
}

/// One optional texture per [`Attachment`]
#[derive(Debug, Clone, Default)]
pub struct AttachmentTextures {
    textures: [Option<ResourceRef>; NUM_ATTACHMENTS],
}

impl AttachmentTextures {
    /// Returns the texture of `attachment`, if any
    pub fn get(&self, attachment: Attachment) -> Option<&ResourceRef> {
        self.textures[attachment.index()].as_ref()
    }

    /// Sets the texture of `attachment`, returning the previous one
    pub fn set(&mut self, attachment: Attachment, texture: Option<ResourceRef>) -> Option<ResourceRef> {
        std::mem::replace(&mut self.textures[attachment.index()], texture)
    }

    /// Takes the texture of `attachment` out of the set
    pub fn take(&mut self, attachment: Attachment) -> Option<ResourceRef> {
        self.textures[attachment.index()].take()
    }

    /// Attachments which have a texture
    pub fn mask(&self) -> AttachmentMask {
        Attachment::ALL
            .into_iter()
            .filter(|attachment| self.textures[attachment.index()].is_some())
            .fold(AttachmentMask::empty(), |mask, attachment| mask | attachment.mask())
    }
}

/// Result of a successful [`NativeSurface::validate`]
#[derive(Debug, Clone, Default)]
pub struct Validated {
    /// Changes whenever the buffers of the surface were reallocated
    pub sequence_number: u32,
    /// Textures of the requested attachments. Dropping releases them.
    pub textures: AttachmentTextures,
    /// Current size of the surface
    pub size: Size,
}

/// Native part of a config, as reported by the native display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeConfig {
    /// Identifier of the config on the native side
    pub id: u32,
    /// Color buffers provided by surfaces of this config
    pub buffer_mask: AttachmentMask,
    /// Format of the color buffers
    pub color_format: Format,
    /// Format of the depth/stencil buffer, [`Format::None`] if there is none
    pub depth_format: Format,
}

/// A window, pixmap or scanout target of the native window system
///
/// Dropping the surface destroys it.
pub trait NativeSurface: fmt::Debug {
    /// Returns the current textures of `attachments` and the current geometry.
    ///
    /// An empty mask only queries the geometry. Returns `None` if the surface cannot be
    /// validated, for example because the underlying window is gone.
    fn validate(&mut self, attachments: AttachmentMask) -> Option<Validated>;

    /// Presents the back buffer
    fn swap_buffers(&mut self) -> bool;

    /// Makes rendering into the front buffer visible
    fn flush_frontbuffer(&mut self) -> bool;

    /// Waits for pending native rendering to the surface
    fn wait(&mut self);
}

/// The native window system of a display
pub trait NativeDisplay: fmt::Debug {
    /// The pipe screen rendering for this display
    fn screen(&self) -> Rc<dyn PipeScreen>;

    /// Creates a surface for a native window
    fn create_window_surface(
        &self,
        window: NativeWindow,
        config: &NativeConfig,
    ) -> Option<Box<dyn NativeSurface>>;

    /// Creates a surface for a native pixmap
    fn create_pixmap_surface(
        &self,
        pixmap: NativePixmap,
        config: &NativeConfig,
    ) -> Option<Box<dyn NativeSurface>>;

    /// Checks whether surfaces of `config` can render into `pixmap`
    fn is_pixmap_supported(&self, pixmap: NativePixmap, config: &NativeConfig) -> bool;

    /// Mode setting interface, if the display supports it
    fn modeset(&self) -> Option<&dyn NativeModeset> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_masks_round_trip() {
        for attachment in Attachment::ALL {
            let mask = attachment.mask();
            assert_eq!(mask.attachments().collect::<Vec<_>>(), vec![attachment]);
        }
        let mask = AttachmentMask::FRONT_LEFT | AttachmentMask::BACK_RIGHT;
        assert_eq!(
            mask.attachments().collect::<Vec<_>>(),
            vec![Attachment::FrontLeft, Attachment::BackRight]
        );
    }

    #[test]
    fn empty_texture_set_has_empty_mask() {
        let textures = AttachmentTextures::default();
        assert!(textures.mask().is_empty());
        assert!(textures.get(Attachment::BackLeft).is_none());
    }
}
