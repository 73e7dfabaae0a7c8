//! Reexports [`glam`] and adds the [`Rect`] type used for layout areas
//! and clip regions.

mod rect;

pub use glam::*;

pub use self::rect::*;
