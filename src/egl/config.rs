//! Frame buffer configurations of a display

use crate::{native::NativeConfig, st::Visual};

/// Handle of a [`Config`] of a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigId(pub(crate) usize);

impl ConfigId {
    /// Position of the config in [`Display::configs`](super::Display::configs)
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A frame buffer configuration: the native config and the visual derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    id: ConfigId,
    native: NativeConfig,
    visual: Visual,
}

impl Config {
    pub(crate) fn new(id: ConfigId, native: NativeConfig) -> Config {
        let visual = Visual::from_native(&native);
        Config { id, native, visual }
    }

    /// Handle of this config
    pub fn id(&self) -> ConfigId {
        self.id
    }

    /// The native config
    pub fn native(&self) -> &NativeConfig {
        &self.native
    }

    /// The visual of surfaces and contexts using this config
    pub fn visual(&self) -> &Visual {
        &self.visual
    }
}
