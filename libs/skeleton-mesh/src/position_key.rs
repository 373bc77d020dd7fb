//! # Position Keys
//!
//! Quantized positions used to recognize the same point after vertices have
//! been re-indexed (CSG output, welding, mirroring).

use config::constants::POSITION_KEY_SCALE;
use glam::DVec3;

/// Hashable, quantized 3D position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey([i64; 3]);

impl PositionKey {
    /// Quantizes a position.
    pub fn new(position: DVec3) -> Self {
        let scaled = (position * POSITION_KEY_SCALE).round();
        Self([scaled.x as i64, scaled.y as i64, scaled.z as i64])
    }
}

impl From<DVec3> for PositionKey {
    fn from(position: DVec3) -> Self {
        Self::new(position)
    }
}

/// Unordered pair of position keys identifying an edge.
pub type EdgeKey = (PositionKey, PositionKey);

/// Builds an orientation-independent edge key.
pub fn edge_key(a: DVec3, b: DVec3) -> EdgeKey {
    let (a, b) = (PositionKey::new(a), PositionKey::new(b));
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearby_positions_share_key() {
        let a = PositionKey::new(DVec3::new(0.1, 0.2, 0.3));
        let b = PositionKey::new(DVec3::new(0.1 + 1e-9, 0.2, 0.3 - 1e-9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_positions_differ() {
        let a = PositionKey::new(DVec3::new(0.1, 0.2, 0.3));
        let b = PositionKey::new(DVec3::new(0.1, 0.2, 0.31));
        assert_ne!(a, b);
    }

    #[test]
    fn test_edge_key_is_unordered() {
        let a = DVec3::new(1.0, 0.0, 0.0);
        let b = DVec3::new(0.0, 1.0, 0.0);
        assert_eq!(edge_key(a, b), edge_key(b, a));
    }
}
