//! `es-envelope`: speed-vs-position curves and the machinery that builds them.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                       |
//! |----------------|----------------------------------------------------------------|
//! | [`part`]       | `EnvelopePart`, `PartKind`, step interpolation helpers         |
//! | [`envelope`]   | `Envelope`: contiguous parts, speed and time queries           |
//! | [`cursor`]     | `EnvelopeCursor`, `CursorState`: monotonic traversal           |
//! | [`constraint`] | `PartConstraint`: floors, ceilings, position bounds            |
//! | [`builder`]    | `EnvelopePartBuilder`, `ConstrainedPartBuilder`                |
//! | [`overlay`]    | `OverlayEnvelopeBuilder`: splice parts into a base envelope    |
//! | [`error`]      | `EnvelopeError`, `EnvelopeResult<T>`                           |
//!
//! # Building a curve
//!
//! The physics integrator lives in `es-physics`; this crate only stores and
//! checks points.  A typical overlay:
//!
//! 1. Create a [`ConstrainedPartBuilder`] with the constraints the curve must
//!    respect (e.g. the current envelope as a ceiling).
//! 2. Feed it integration steps until `add_step` returns `false`.
//! 3. Turn it into an [`EnvelopePart`] and add it to an
//!    [`OverlayEnvelopeBuilder`] over the current envelope.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                             |
//! |---------|----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to parts/envelopes. |

pub mod builder;
pub mod constraint;
pub mod cursor;
pub mod envelope;
pub mod error;
pub mod overlay;
pub mod part;

#[cfg(test)]
mod tests;

pub use builder::{ConstrainedPartBuilder, EnvelopePartBuilder};
pub use constraint::{EnvelopeConstraintKind, PartConstraint, SpeedConstraintKind, StepCheck};
pub use cursor::{CursorState, EnvelopeCursor};
pub use envelope::Envelope;
pub use error::{EnvelopeError, EnvelopeResult};
pub use overlay::OverlayEnvelopeBuilder;
pub use part::{EnvelopePart, PartKind};
