use crate::{
    native::{Attachment, AttachmentMask, NativeConfig},
    pipe::Format,
};

/// Buffers of a framebuffer as seen by a state tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StAttachment {
    /// Front buffer, left eye
    FrontLeft,
    /// Back buffer, left eye
    BackLeft,
    /// Front buffer, right eye
    FrontRight,
    /// Back buffer, right eye
    BackRight,
    /// Depth/stencil buffer
    DepthStencil,
    /// Accumulation buffer
    Accum,
    /// Multisample resolve buffer
    Sample,
}

impl StAttachment {
    /// The native attachment backing this one, if it is a color buffer
    pub fn native(self) -> Option<Attachment> {
        match self {
            StAttachment::FrontLeft => Some(Attachment::FrontLeft),
            StAttachment::BackLeft => Some(Attachment::BackLeft),
            StAttachment::FrontRight => Some(Attachment::FrontRight),
            StAttachment::BackRight => Some(Attachment::BackRight),
            StAttachment::DepthStencil | StAttachment::Accum | StAttachment::Sample => None,
        }
    }
}

impl From<Attachment> for StAttachment {
    fn from(attachment: Attachment) -> StAttachment {
        match attachment {
            Attachment::FrontLeft => StAttachment::FrontLeft,
            Attachment::BackLeft => StAttachment::BackLeft,
            Attachment::FrontRight => StAttachment::FrontRight,
            Attachment::BackRight => StAttachment::BackRight,
        }
    }
}

/// Properties of a framebuffer a state tracker renders into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visual {
    /// Color buffers available
    pub buffer_mask: AttachmentMask,
    /// Format of the color buffers
    pub color_format: Format,
    /// Format of the depth/stencil buffer
    pub depth_stencil_format: Format,
    /// Format of the accumulation buffer
    pub accum_format: Format,
    /// Number of samples per pixel
    pub samples: u32,
    /// The buffer rendering goes to
    pub render_buffer: StAttachment,
}

impl Visual {
    /// Derives the visual of a native config
    ///
    /// Double-buffered configs render to the back buffer, everything else to the front buffer.
    pub fn from_native(config: &NativeConfig) -> Visual {
        let render_buffer = if config.buffer_mask.contains(AttachmentMask::BACK_LEFT) {
            StAttachment::BackLeft
        } else {
            StAttachment::FrontLeft
        };

        Visual {
            buffer_mask: config.buffer_mask,
            color_format: config.color_format,
            depth_stencil_format: config.depth_format,
            accum_format: Format::None,
            samples: 0,
            render_buffer,
        }
    }

    /// Returns true if rendering goes straight to the front buffer
    pub fn is_single_buffered(&self) -> bool {
        self.render_buffer == StAttachment::FrontLeft
    }

    /// Checks whether the render buffer is one of the available color buffers
    pub fn has_render_buffer(&self) -> bool {
        self.render_buffer
            .native()
            .map(|attachment| self.buffer_mask.contains(attachment.mask()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native_config(buffer_mask: AttachmentMask) -> NativeConfig {
        NativeConfig {
            id: 1,
            buffer_mask,
            color_format: Format::B8G8R8A8Unorm,
            depth_format: Format::Z24UnormS8Uscaled,
        }
    }

    #[test]
    fn double_buffered_config_renders_to_back() {
        let visual =
            Visual::from_native(&native_config(AttachmentMask::FRONT_LEFT | AttachmentMask::BACK_LEFT));
        assert_eq!(visual.render_buffer, StAttachment::BackLeft);
        assert!(!visual.is_single_buffered());
        assert!(visual.has_render_buffer());
        assert_eq!(visual.depth_stencil_format, Format::Z24UnormS8Uscaled);
    }

    #[test]
    fn single_buffered_config_renders_to_front() {
        let visual = Visual::from_native(&native_config(AttachmentMask::FRONT_LEFT));
        assert_eq!(visual.render_buffer, StAttachment::FrontLeft);
        assert!(visual.is_single_buffered());
    }

    #[test]
    fn depth_is_not_a_native_attachment() {
        assert_eq!(StAttachment::DepthStencil.native(), None);
        assert_eq!(
            StAttachment::from(Attachment::BackRight).native(),
            Some(Attachment::BackRight)
        );
    }
}
