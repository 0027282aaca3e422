//! Placement errors.

use strata_fabric::SlotKind;
use thiserror::Error;

/// A fatal placement problem.
///
/// The state-manipulation variants (`KindMismatch`, `SlotOccupied`,
/// `AlreadyBound`, `NotBound`) indicate misuse of the placement state by a
/// caller; they are surfaced rather than asserted so the toolchain exits
/// with a diagnostic instead of a panic.
#[derive(Debug, Error)]
pub enum PlaceError {
    /// No kind-compatible free slot exists for a required instance.
    #[error(
        "unplaceable instance `{instance}`: no free {wanted} slot left; \
         the fabric is out of capacity for this cell kind"
    )]
    Unplaceable {
        /// The instance that could not be placed.
        instance: String,
        /// The slot kind the instance requires.
        wanted: SlotKind,
    },

    /// A bind or swap paired an instance with an incompatible slot kind.
    #[error(
        "kind mismatch: instance `{instance}` cannot occupy {actual} slot `{slot}` \
         (needs a {wanted} slot)"
    )]
    KindMismatch {
        /// The instance being bound.
        instance: String,
        /// The slot it was aimed at.
        slot: String,
        /// The kind the instance requires.
        wanted: SlotKind,
        /// The kind the slot actually has.
        actual: SlotKind,
    },

    /// A bind targeted a slot that is already occupied.
    #[error("slot `{slot}` is already occupied; unbind its instance first")]
    SlotOccupied {
        /// The occupied slot.
        slot: String,
    },

    /// A bind targeted an instance that is already placed.
    #[error("instance `{instance}` is already bound; unbind it first")]
    AlreadyBound {
        /// The doubly-bound instance.
        instance: String,
    },

    /// A swap or relocate named an unbound instance.
    #[error("instance `{instance}` is not bound; seed the placement first")]
    NotBound {
        /// The unbound instance.
        instance: String,
    },
}
