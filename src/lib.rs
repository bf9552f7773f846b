//! pixelate library crate.
//!
//! Turns an RGBA image into a grid of averaged colors and paints each cell as
//! a circle or a square. The [`session::Session`] ties the pieces together for
//! interactive use; the [`cli`] module drives it from the command line.

pub mod cache;
pub mod cli;
pub mod config;
pub mod loader;
pub mod pixels;
pub mod render;
pub mod session;
