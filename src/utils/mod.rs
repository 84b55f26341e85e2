//! Various utilities functions and types

mod geometry;
pub(crate) mod ids;

pub use self::geometry::{Point, Size};
