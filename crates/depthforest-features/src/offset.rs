use std::fmt;

use crate::random::RandomSource;

/// 2-D pixel displacement from a sample, `dx` along columns and `dy` along rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Offset {
    /// Column displacement.
    pub dx: i32,
    /// Row displacement.
    pub dy: i32,
}

impl Offset {
    /// Create an offset.
    #[must_use]
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Draw both coordinates uniformly from `[-bound, bound]`, `dx` first.
    pub fn random<R: RandomSource + ?Sized>(random: &mut R, bound: i32) -> Self {
        let dx = random.next_int(-bound, bound);
        let dy = random.next_int(-bound, bound);
        Self { dx, dy }
    }

    /// Chebyshev length of the offset.
    #[must_use]
    pub fn reach(self) -> usize {
        self.dx.unsigned_abs().max(self.dy.unsigned_abs()) as usize
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.dx, self.dy)
    }
}
