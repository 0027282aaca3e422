//! Shared foundational types used across the strata toolchain.
//!
//! This crate provides the integer-micrometre geometry primitives that the
//! fabric model, the placement cost function, and the clock tree synthesizer
//! all agree on: points, rectangles, and bounding-box accumulation.

#![warn(missing_docs)]

pub mod geom;

pub use geom::{BoundingBox, Point, Rect};
