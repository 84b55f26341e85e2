#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
// Allow acronyms like EGL
#![allow(clippy::upper_case_acronyms)]

//! # egl-g3d: EGL for Gallium3D drivers
//!
//! This crate implements the EGL entry points of a driver built on the Gallium3D
//! architecture. It does not talk to any window system or GPU by itself: it coordinates
//! three kinds of collaborators, each expressed as a set of traits.
//!
//! ## Structure of the crate
//!
//! - [`pipe`] is the graphics pipe: a screen allocating resources and creating pipe contexts.
//! - [`native`] is the window system: native displays create surfaces for windows, pixmaps
//!   and scanout, and hand out the textures backing their color buffers.
//! - [`st`] are the state trackers implementing the client APIs (OpenGL ES, OpenGL, OpenVG)
//!   on top of the pipe.
//! - [`egl`] brings them together: displays, configs, contexts, surfaces and the binding of
//!   contexts to a [`Session`](egl::Session).
//!
//! A driver implements the collaborator traits and initializes an [`egl::Display`] with them.
//!
//! ### Threads of control
//!
//! Everything is single threaded per display. The "current context" of EGL is not a
//! thread-local: it lives in a [`Session`](egl::Session) that callers create per thread of
//! control and pass to the entry points depending on it.
//!
//! ### Logging
//!
//! egl-g3d makes extensive use of [`tracing`] for its internal logging.
//!
//! For release builds it is recommended to limit the log level during compile time.
//! This can be done by adding a dependency to [`tracing`] and enabling the corresponding features.
//! For example to enable `trace` messages for debug builds, but limit release builds to `debug` add
//! the following in your binary crate `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! tracing = { version = "0.1", features = ["max_level_trace", "release_max_level_debug"] }
//! ```

pub mod egl;
pub mod native;
pub mod pipe;
pub mod st;
pub mod utils;

#[cfg(any(test, feature = "driver_test"))]
pub mod test;
