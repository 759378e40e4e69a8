//! Replace ranges of a base envelope with new parts.

use crate::envelope::Envelope;
use crate::part::EnvelopePart;
use crate::{EnvelopeError, EnvelopeResult};

/// Collects non-overlapping overlay parts over a base envelope, then splices
/// them in.  The base is cut at each overlay's bounds; positions not covered
/// by an overlay keep the base curve.
///
/// A forward builder takes overlays in increasing position order, a backward
/// builder in decreasing order.
#[derive(Clone, Debug)]
pub struct OverlayEnvelopeBuilder<'a> {
    base:     &'a Envelope,
    backward: bool,
    overlays: Vec<EnvelopePart>,
    last_pos: f64,
}

impl<'a> OverlayEnvelopeBuilder<'a> {
    pub fn forward(base: &'a Envelope) -> Self {
        Self { base, backward: false, overlays: Vec::new(), last_pos: base.begin_pos() }
    }

    pub fn backward(base: &'a Envelope) -> Self {
        Self { base, backward: true, overlays: Vec::new(), last_pos: base.end_pos() }
    }

    /// The far bound of the last overlay in build order (the base's start
    /// bound before any overlay).
    pub fn last_pos(&self) -> f64 {
        self.last_pos
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn add_part(&mut self, part: EnvelopePart) -> EnvelopeResult<()> {
        let (begin, end) = (part.begin_pos(), part.end_pos());
        if begin < self.base.begin_pos() || end > self.base.end_pos() {
            return Err(EnvelopeError::OverlayOutOfRange {
                begin,
                end,
                base_begin: self.base.begin_pos(),
                base_end:   self.base.end_pos(),
            });
        }
        let overlaps = if self.backward { end > self.last_pos } else { begin < self.last_pos };
        if overlaps {
            return Err(EnvelopeError::OverlappingOverlay { begin, end, last: self.last_pos });
        }
        self.last_pos = if self.backward { begin } else { end };
        self.overlays.push(part);
        Ok(())
    }

    pub fn build(self) -> EnvelopeResult<Envelope> {
        let mut overlays = self.overlays;
        if self.backward {
            overlays.reverse();
        }
        let base = self.base;
        log::trace!(
            "splicing {} overlays into a {}-part envelope",
            overlays.len(),
            base.part_count()
        );
        let mut parts = Vec::with_capacity(base.part_count() + 2 * overlays.len());
        let mut position = base.begin_pos();
        for overlay in overlays {
            if overlay.begin_pos() > position {
                parts.extend(base.slice_parts(position, overlay.begin_pos()));
            }
            position = overlay.end_pos();
            parts.push(overlay);
        }
        if position < base.end_pos() {
            parts.extend(base.slice_parts(position, base.end_pos()));
        }
        Envelope::new(parts)
    }
}
