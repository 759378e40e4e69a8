//! Monotonic traversal over an envelope.
//!
//! A cursor walks an [`Envelope`] forward (increasing positions) or backward,
//! part by part and step by step.  It never moves against its direction: a
//! search that would need to go back fails and leaves the cursor in place.
//!
//! Every effective move bumps a revision counter.  A search that is already
//! satisfied at the current location does not move the cursor and does not
//! bump the revision, so callers can compare [`CursorState`] values to
//! detect progress.
//!
//! Predicates over adjacent samples receive
//! `(prev_pos, prev_speed, next_pos, next_speed)` in traversal order.

use crate::envelope::Envelope;
use crate::part::EnvelopePart;

/// A comparable snapshot of a cursor's location.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CursorState {
    pub part_index:  usize,
    pub step_index:  usize,
    pub position:    f64,
    pub reached_end: bool,
    pub revision:    u64,
}

/// Single-owner traversal state over a borrowed envelope.
#[derive(Clone, Debug)]
pub struct EnvelopeCursor<'a> {
    envelope:    &'a Envelope,
    backward:    bool,
    part_index:  usize,
    /// Step index in storage order.
    step_index:  usize,
    position:    f64,
    reached_end: bool,
    revision:    u64,
}

impl<'a> EnvelopeCursor<'a> {
    pub fn new(envelope: &'a Envelope, backward: bool) -> Self {
        let part_index = if backward { envelope.part_count() - 1 } else { 0 };
        let part = envelope.part(part_index);
        let (step_index, position) = if backward {
            (part.step_count() - 1, part.end_pos())
        } else {
            (0, part.begin_pos())
        };
        Self {
            envelope,
            backward,
            part_index,
            step_index,
            position,
            reached_end: false,
            revision: 0,
        }
    }

    pub fn forward(envelope: &'a Envelope) -> Self {
        Self::new(envelope, false)
    }

    pub fn backward(envelope: &'a Envelope) -> Self {
        Self::new(envelope, true)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn envelope(&self) -> &'a Envelope {
        self.envelope
    }

    pub fn is_backward(&self) -> bool {
        self.backward
    }

    /// `+1.0` forward, `-1.0` backward.
    pub fn direction(&self) -> f64 {
        if self.backward { -1.0 } else { 1.0 }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Speed of the current part at the cursor position.
    pub fn speed(&self) -> f64 {
        self.part().interpolate_speed_in_step(self.step_index, self.position)
    }

    pub fn part_index(&self) -> usize {
        self.part_index
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn part(&self) -> &'a EnvelopePart {
        self.envelope.part(self.part_index)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_reached_end(&self) -> bool {
        self.reached_end
    }

    pub fn state(&self) -> CursorState {
        CursorState {
            part_index:  self.part_index,
            step_index:  self.step_index,
            position:    self.position,
            reached_end: self.reached_end,
            revision:    self.revision,
        }
    }

    // ── Traversal-order geometry ──────────────────────────────────────────

    /// Begin of `step` of `part_index`, in traversal order.
    fn step_begin(&self, part_index: usize, step: usize) -> (f64, f64) {
        let part = self.envelope.part(part_index);
        let i = if self.backward { step + 1 } else { step };
        (part.position(i), part.speed(i))
    }

    /// End of `step` of `part_index`, in traversal order.
    fn step_end(&self, part_index: usize, step: usize) -> (f64, f64) {
        let part = self.envelope.part(part_index);
        let i = if self.backward { step } else { step + 1 };
        (part.position(i), part.speed(i))
    }

    fn part_begin(&self, part_index: usize) -> (f64, f64) {
        let part = self.envelope.part(part_index);
        if self.backward {
            (part.end_pos(), part.end_speed())
        } else {
            (part.begin_pos(), part.begin_speed())
        }
    }

    fn part_end(&self, part_index: usize) -> (f64, f64) {
        let part = self.envelope.part(part_index);
        if self.backward {
            (part.begin_pos(), part.begin_speed())
        } else {
            (part.end_pos(), part.end_speed())
        }
    }

    fn first_step(&self, part_index: usize) -> usize {
        if self.backward { self.envelope.part(part_index).step_count() - 1 } else { 0 }
    }

    fn last_step(&self, part_index: usize) -> usize {
        if self.backward { 0 } else { self.envelope.part(part_index).step_count() - 1 }
    }

    fn neighbor_part(&self, part_index: usize) -> Option<usize> {
        if self.backward {
            part_index.checked_sub(1)
        } else {
            let next = part_index + 1;
            (next < self.envelope.part_count()).then_some(next)
        }
    }

    fn neighbor_step(&self, part_index: usize, step: usize) -> Option<(usize, usize)> {
        let step_count = self.envelope.part(part_index).step_count();
        if self.backward && step > 0 {
            return Some((part_index, step - 1));
        }
        if !self.backward && step + 1 < step_count {
            return Some((part_index, step + 1));
        }
        let next = self.neighbor_part(part_index)?;
        Some((next, self.first_step(next)))
    }

    // ── Moves ─────────────────────────────────────────────────────────────

    fn move_to(&mut self, part_index: usize, step_index: usize, position: f64, reached_end: bool) {
        let unchanged = self.part_index == part_index
            && self.step_index == step_index
            && self.position == position
            && self.reached_end == reached_end;
        if unchanged {
            return;
        }
        self.part_index = part_index;
        self.step_index = step_index;
        self.position = position;
        self.reached_end = reached_end;
        self.revision += 1;
    }

    /// Park the cursor at the traversal end of the envelope.
    fn finish(&mut self) {
        let last_part = if self.backward { 0 } else { self.envelope.part_count() - 1 };
        let step = self.last_step(last_part);
        let (position, _) = self.part_end(last_part);
        self.move_to(last_part, step, position, true);
    }

    /// Move to `position`.  Fails without moving if it lies behind the
    /// cursor or outside the envelope.
    pub fn find_position(&mut self, position: f64) -> bool {
        let envelope = self.envelope;
        if self.reached_end
            || position < envelope.begin_pos()
            || position > envelope.end_pos()
            || (position - self.position) * self.direction() < 0.0
        {
            return false;
        }
        let (part_index, step_index) = if self.backward {
            let part_index = envelope.left_part_index(position);
            (part_index, envelope.part(part_index).find_step_left(position))
        } else {
            let part_index = envelope.right_part_index(position);
            (part_index, envelope.part(part_index).find_step(position))
        };
        self.move_to(part_index, step_index, position, false);
        true
    }

    /// Move to the traversal begin of the first step (current included)
    /// matching `predicate`.  Parks at the end and returns `false` if none
    /// does.
    pub fn find_step<F>(&mut self, mut predicate: F) -> bool
    where
        F: FnMut(f64, f64, f64, f64) -> bool,
    {
        if self.reached_end {
            return false;
        }
        let (mut part_index, mut step) = (self.part_index, self.step_index);
        loop {
            let (prev_pos, prev_speed) = self.step_begin(part_index, step);
            let (next_pos, next_speed) = self.step_end(part_index, step);
            if predicate(prev_pos, prev_speed, next_pos, next_speed) {
                if (part_index, step) != (self.part_index, self.step_index) {
                    self.move_to(part_index, step, prev_pos, false);
                }
                return true;
            }
            match self.neighbor_step(part_index, step) {
                Some((p, s)) => (part_index, step) = (p, s),
                None => {
                    self.finish();
                    return false;
                }
            }
        }
    }

    /// Find the first part transition (from the current part on) whose
    /// `(prev part end, next part begin)` samples match `predicate`, and move
    /// to the traversal end of the part preceding it.
    pub fn find_part_transition<F>(&mut self, mut predicate: F) -> bool
    where
        F: FnMut(f64, f64, f64, f64) -> bool,
    {
        if self.reached_end {
            return false;
        }
        let mut part_index = self.part_index;
        loop {
            let Some(next) = self.neighbor_part(part_index) else {
                self.finish();
                return false;
            };
            let (prev_pos, prev_speed) = self.part_end(part_index);
            let (next_pos, next_speed) = self.part_begin(next);
            if predicate(prev_pos, prev_speed, next_pos, next_speed) {
                let step = self.last_step(part_index);
                self.move_to(part_index, step, prev_pos, false);
                return true;
            }
            part_index = next;
        }
    }

    /// Move to the traversal begin of the first part (current included)
    /// matching `predicate`.  The cursor stays put if the current part
    /// matches.
    pub fn find_part<F>(&mut self, mut predicate: F) -> bool
    where
        F: FnMut(&EnvelopePart) -> bool,
    {
        if self.reached_end {
            return false;
        }
        let mut part_index = self.part_index;
        loop {
            if predicate(self.envelope.part(part_index)) {
                if part_index != self.part_index {
                    let step = self.first_step(part_index);
                    let (position, _) = self.part_begin(part_index);
                    self.move_to(part_index, step, position, false);
                }
                return true;
            }
            match self.neighbor_part(part_index) {
                Some(next) => part_index = next,
                None => {
                    self.finish();
                    return false;
                }
            }
        }
    }

    /// Move to the traversal begin of the next part, or park at the end.
    pub fn next_part(&mut self) {
        if self.reached_end {
            return;
        }
        match self.neighbor_part(self.part_index) {
            Some(next) => {
                let step = self.first_step(next);
                let (position, _) = self.part_begin(next);
                self.move_to(next, step, position, false);
            }
            None => self.finish(),
        }
    }

    /// Evaluate `predicate` on the current part without moving.
    pub fn check_part<F>(&self, predicate: F) -> bool
    where
        F: FnOnce(&EnvelopePart) -> bool,
    {
        !self.reached_end && predicate(self.part())
    }

    /// Evaluate `predicate` on the transition after the current part
    /// without moving.
    pub fn check_part_transition<F>(&self, predicate: F) -> bool
    where
        F: FnOnce(f64, f64, f64, f64) -> bool,
    {
        if self.reached_end {
            return false;
        }
        let Some(next) = self.neighbor_part(self.part_index) else {
            return false;
        };
        let (prev_pos, prev_speed) = self.part_end(self.part_index);
        let (next_pos, next_speed) = self.part_begin(next);
        predicate(prev_pos, prev_speed, next_pos, next_speed)
    }
}
