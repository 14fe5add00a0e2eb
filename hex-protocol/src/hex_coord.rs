//! Hex-grid coordinates and Cartesian projection used for distance checks.

use serde::{Deserialize, Serialize};

/// A single-cell step has Cartesian length 1; projection uses this tolerance
/// everywhere distance comparisons cross the float boundary.
pub const DISTANCE_TOLERANCE: f64 = 1.001;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// A hex-grid coordinate addressed as two interleaved triangular sub-lattices,
/// selected by `a`. Every reachable coordinate has `a ∈ {0, 1}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub a: i32,
    pub r: i32,
    pub c: i32,
}

impl HexCoord {
    pub const ORIGIN: HexCoord = HexCoord { a: 0, r: 0, c: 0 };

    pub fn new(a: i32, r: i32, c: i32) -> HexCoord {
        HexCoord { a, r, c }
    }

    /// Componentwise addition with a carry rule that keeps `a` in `{0, 1}`.
    /// When both operands carry the odd sub-lattice bit, the sum carries one
    /// extra unit into *both* `r` and `c` (each contributes 0.5 to both the
    /// x and y projection), not just `r` — folding it into `r` alone drops
    /// half a unit of x every time two odd-lattice deltas combine.
    pub fn add(self, other: HexCoord) -> HexCoord {
        let a_sum = self.a + other.a;
        let carry = a_sum / 2;
        HexCoord {
            a: a_sum % 2,
            r: self.r + other.r + carry,
            c: self.c + other.c + carry,
        }
    }

    /// True inverse of [`add`]: `base.add(delta).sub(delta) == base` for any
    /// `delta`, including ones with `a == 1`.
    pub fn sub(self, other: HexCoord) -> HexCoord {
        self.add(HexCoord {
            a: other.a,
            r: -other.r - other.a,
            c: -other.c - other.a,
        })
    }

    pub fn equals(self, other: HexCoord) -> bool {
        self == other
    }

    /// Projects onto the plane; a single hex step always has norm 1.
    pub fn cartesian(self) -> (f64, f64) {
        let x = self.c as f64 + self.a as f64 * 0.5;
        let y = (self.r as f64 + self.a as f64 * 0.5) * SQRT_3;
        (x, y)
    }

    /// Cartesian distance from the origin, used to validate translate steps.
    pub fn cartesian_norm(self) -> f64 {
        let (x, y) = self.cartesian();
        (x * x + y * y).sqrt()
    }

    /// The six unit-length displacements reachable from any cell.
    pub fn neighbors(self) -> [HexCoord; 6] {
        NEIGHBOR_DELTAS.map(|d| self.add(d))
    }
}

/// Canonical single-step displacement vectors; each has Cartesian norm 1.
pub const NEIGHBOR_DELTAS: [HexCoord; 6] = [
    HexCoord { a: 0, r: 0, c: 1 },
    HexCoord { a: 0, r: 0, c: -1 },
    HexCoord { a: 1, r: 0, c: 0 },
    HexCoord { a: 1, r: 0, c: -1 },
    HexCoord { a: 1, r: -1, c: 0 },
    HexCoord { a: 1, r: -1, c: -1 },
];
