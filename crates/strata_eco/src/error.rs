//! Engineering-change errors.

use thiserror::Error;

/// A fatal conflict during the engineering-change rewrite.
#[derive(Debug, Error)]
pub enum EcoError {
    /// An instance reached the rewrite without a slot binding.
    #[error(
        "eco conflict: instance `{instance}` has no slot binding; \
         run placement to completion before the rewrite"
    )]
    MissingBinding {
        /// The unbound instance.
        instance: String,
    },

    /// Two instances would end up with the same fabric name.
    #[error(
        "eco conflict: rename collision on `{name}`; \
         two instances map to the same fabric slot name"
    )]
    RenameCollision {
        /// The colliding name.
        name: String,
    },

    /// A flip-flop served by the clock tree has no pin on the clock net.
    #[error(
        "eco conflict: flip-flop `{instance}` has no clock pin on the clock net; \
         check the clock net name"
    )]
    MissingClockPin {
        /// The flip-flop without a clock pin.
        instance: String,
    },

    /// The design has no clock net to rewire.
    #[error("eco conflict: the design has no clock net; nothing to attach the clock tree to")]
    NoClock,

    /// The rewritten netlist failed validation.
    ///
    /// Indicates an internal inconsistency between the inputs, not a user
    /// error.
    #[error("eco conflict: rewritten netlist is inconsistent: {0}")]
    Rebuild(#[from] strata_netlist::NetlistError),
}
