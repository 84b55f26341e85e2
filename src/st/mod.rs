//! Client API state trackers
//!
//! A state tracker implements one client API (OpenGL ES 1, OpenGL ES 2, desktop OpenGL or
//! OpenVG) on top of the pipe. The bridge owns one [`StApi`] per supported API and creates one
//! [`StContext`] per EGL context. Framebuffers handed to a state tracker are
//! [`Framebuffer`](crate::egl::Framebuffer)s derived from EGL surfaces.

use std::{fmt, rc::Rc};

use downcast_rs::{impl_downcast, Downcast};

use crate::{
    egl::Framebuffer,
    pipe::{FenceRef, FlushFlags, Format, ResourceRef},
};

mod visual;
pub use self::visual::{StAttachment, Visual};

/// Client APIs of EGL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientApi {
    /// OpenGL ES
    OpenGlEs,
    /// OpenVG
    OpenVg,
    /// Desktop OpenGL
    OpenGl,
}

/// Slot of a state tracker in a [`StApiTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiSlot {
    /// OpenGL ES 1.x
    OpenGlEs1,
    /// OpenGL ES 2.x
    OpenGlEs2,
    /// Desktop OpenGL
    OpenGl,
    /// OpenVG
    OpenVg,
}

/// Number of [`ApiSlot`]s
pub const NUM_API_SLOTS: usize = 4;

impl ApiSlot {
    fn index(self) -> usize {
        match self {
            ApiSlot::OpenGlEs1 => 0,
            ApiSlot::OpenGlEs2 => 1,
            ApiSlot::OpenGl => 2,
            ApiSlot::OpenVg => 3,
        }
    }
}

/// Which state tracker serves which (client API, client version).
///
/// A `None` version matches every version of the API.
static API_SLOTS: [(ClientApi, Option<i32>, ApiSlot); NUM_API_SLOTS] = [
    (ClientApi::OpenGlEs, Some(1), ApiSlot::OpenGlEs1),
    (ClientApi::OpenGlEs, Some(2), ApiSlot::OpenGlEs2),
    (ClientApi::OpenGl, None, ApiSlot::OpenGl),
    (ClientApi::OpenVg, None, ApiSlot::OpenVg),
];

/// Looks up the slot serving `api` at `version`
pub fn choose_slot(api: ClientApi, version: i32) -> Option<ApiSlot> {
    API_SLOTS
        .iter()
        .find(|(slot_api, slot_version, _)| {
            *slot_api == api && slot_version.map(|v| v == version).unwrap_or(true)
        })
        .map(|(_, _, slot)| *slot)
}

/// Texture targets a surface can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    /// `GL_TEXTURE_2D`
    Texture2D,
}

/// Entry point of a state tracker
pub trait StApi: fmt::Debug {
    /// Creates a context rendering with `visual`, sharing objects with `share` if given
    fn create_context(&self, visual: &Visual, share: Option<&dyn StContext>) -> Option<Box<dyn StContext>>;

    /// Makes `context` current with the given framebuffers.
    ///
    /// `None` for all arguments unbinds the current context of this API.
    fn make_current(
        &self,
        context: Option<&mut dyn StContext>,
        draw: Option<&Rc<Framebuffer>>,
        read: Option<&Rc<Framebuffer>>,
    ) -> bool;
}

/// A rendering context of a state tracker
///
/// Dropping the context destroys it.
pub trait StContext: fmt::Debug + Downcast {
    /// Flushes the context, returning a fence if `want_fence` is set and one was created
    fn flush(&mut self, flags: FlushFlags, want_fence: bool) -> Option<FenceRef>;

    /// Tells the context that the attachments of `framebuffer` need to be validated again
    fn notify_invalid_framebuffer(&mut self, framebuffer: &Rc<Framebuffer>);

    /// Returns whether [`StContext::teximage`] is implemented
    fn supports_teximage(&self) -> bool {
        false
    }

    /// Replaces the image of the currently bound texture at `level`.
    ///
    /// `None` for `resource` together with [`Format::None`] clears the image.
    fn teximage(
        &mut self,
        _target: TextureType,
        _level: i32,
        _format: Format,
        _resource: Option<&ResourceRef>,
        _mipmap: bool,
    ) -> bool {
        false
    }
}
impl_downcast!(StContext);

/// The state trackers a driver was built with
#[derive(Debug, Clone, Default)]
pub struct StApiTable {
    apis: [Option<Rc<dyn StApi>>; NUM_API_SLOTS],
}

impl StApiTable {
    /// Creates an empty table
    pub fn new() -> StApiTable {
        StApiTable::default()
    }

    /// Registers `api` for `slot`
    pub fn with(mut self, slot: ApiSlot, api: Rc<dyn StApi>) -> StApiTable {
        self.apis[slot.index()] = Some(api);
        self
    }

    /// The state tracker of `slot`, if the driver has one
    pub fn get(&self, slot: ApiSlot) -> Option<&Rc<dyn StApi>> {
        self.apis[slot.index()].as_ref()
    }

    /// Returns true if no state tracker is registered
    pub fn is_empty(&self) -> bool {
        self.apis.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn es_versions_pick_distinct_slots() {
        assert_eq!(choose_slot(ClientApi::OpenGlEs, 1), Some(ApiSlot::OpenGlEs1));
        assert_eq!(choose_slot(ClientApi::OpenGlEs, 2), Some(ApiSlot::OpenGlEs2));
    }

    #[test]
    fn unknown_es_version_has_no_slot() {
        assert_eq!(choose_slot(ClientApi::OpenGlEs, 3), None);
        assert_eq!(choose_slot(ClientApi::OpenGlEs, 0), None);
    }

    #[test]
    fn gl_and_vg_ignore_the_version() {
        assert_eq!(choose_slot(ClientApi::OpenGl, 1), Some(ApiSlot::OpenGl));
        assert_eq!(choose_slot(ClientApi::OpenGl, 4), Some(ApiSlot::OpenGl));
        assert_eq!(choose_slot(ClientApi::OpenVg, 1), Some(ApiSlot::OpenVg));
    }

    #[test]
    fn empty_table_has_no_api() {
        let table = StApiTable::new();
        assert!(table.is_empty());
        assert!(table.get(ApiSlot::OpenGlEs2).is_none());
    }
}
