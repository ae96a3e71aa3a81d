//! Pointer sampling for the fluid pass.
//!
//! Positions are canvas-local pixels with Y measured from the bottom edge.

/// Movement older than this (seconds) counts as "stopped".
pub const STALE_AFTER: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub pos: [f32; 2],
    pub prev: [f32; 2],
    last_move: Option<f64>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a move and return the `iMouse` value: (x, y, prev_x, prev_y).
    pub fn record_move(&mut self, x: f32, y: f32, now: f64) -> [f32; 4] {
        self.prev = self.pos;
        self.pos = [x, y];
        self.last_move = Some(now);
        self.uniform()
    }

    pub fn uniform(&self) -> [f32; 4] {
        [self.pos[0], self.pos[1], self.prev[0], self.prev[1]]
    }

    /// True when no move was ever recorded or the last one is older than [`STALE_AFTER`].
    pub fn is_stale(&self, now: f64) -> bool {
        match self.last_move {
            Some(t) => now - t > STALE_AFTER,
            None => true,
        }
    }

    /// Forget the last move so the next frame zeroes the interaction uniform.
    ///
    /// Positions are kept: the next move computes its velocity from where the
    /// pointer was last seen.
    pub fn deactivate(&mut self) {
        self.last_move = None;
    }
}
