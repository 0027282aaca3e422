//! Fabric construction errors.

use thiserror::Error;

/// A fatal problem with the fabric description.
///
/// All variants abort the run; a fabric that fails validation is never
/// partially usable.
#[derive(Debug, Error)]
pub enum FabricError {
    /// The fabric contains no slots at all.
    #[error("invalid fabric: no slots defined; check the fabric file")]
    Empty,

    /// Two slots share the same canonical name.
    #[error("invalid fabric: duplicate slot name `{name}`; slot names must be unique")]
    DuplicateSlot {
        /// The repeated slot name.
        name: String,
    },

    /// A slot lies outside the die bounding box.
    #[error(
        "invalid fabric: slot `{name}` at ({x}, {y}) lies outside the die box; \
         fix the slot coordinates or enlarge the die"
    )]
    OutOfBounds {
        /// The offending slot name.
        name: String,
        /// Slot x coordinate in µm.
        x: i64,
        /// Slot y coordinate in µm.
        y: i64,
    },

    /// The fabric file could not be read or parsed.
    #[error("invalid fabric: {0}")]
    Load(String),
}
