//! Shared types used across the torus placement crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing dimension triples or selectors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimensionError {
    #[error("{what} dimensions must be positive on every axis, got {}x{}x{}", axes[0], axes[1], axes[2])]
    ZeroAxis { what: &'static str, axes: [usize; 3] },

    #[error("{what} volume {}x{}x{} does not fit in a node index", axes[0], axes[1], axes[2])]
    Overflow { what: &'static str, axes: [usize; 3] },

    #[error("malformed dimension triple '{0}', expected AxBxC")]
    Malformed(String),

    #[error("unknown placement policy '{0}'")]
    UnknownPolicy(String),

    #[error("unknown job order '{0}', expected 'name' or 'declared'")]
    UnknownOrder(String),
}

/// A coordinate on a 3D grid. `x` varies fastest in linear indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    pub fn axes(self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }

    /// Component-wise sum, used to translate a box-local offset to an absolute coordinate.
    pub fn offset(self, by: Coord) -> Coord {
        Coord::new(self.x + by.x, self.y + by.y, self.z + by.z)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Physical torus extent (width, length, height). Immutable for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[usize; 3]", into = "[usize; 3]")]
pub struct TorusDimensions {
    width: usize,
    length: usize,
    height: usize,
}

impl TorusDimensions {
    pub fn new(width: usize, length: usize, height: usize) -> Result<Self, DimensionError> {
        let axes = [width, length, height];
        if axes.contains(&0) {
            return Err(DimensionError::ZeroAxis { what: "torus", axes });
        }
        if checked_volume(axes).is_none() {
            return Err(DimensionError::Overflow { what: "torus", axes });
        }
        Ok(Self { width, length, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn axes(&self) -> [usize; 3] {
        [self.width, self.length, self.height]
    }

    /// Total physical node count W·L·H. Cannot overflow once constructed.
    pub fn volume(&self) -> usize {
        self.width * self.length * self.height
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.length && coord.z < self.height
    }

    /// Every coordinate of the torus, in linear-index order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.volume()).map(|i| crate::coords::coord_from_linear(i, self.axes()))
    }
}

impl TryFrom<[usize; 3]> for TorusDimensions {
    type Error = DimensionError;

    fn try_from(axes: [usize; 3]) -> Result<Self, Self::Error> {
        Self::new(axes[0], axes[1], axes[2])
    }
}

impl From<TorusDimensions> for [usize; 3] {
    fn from(dims: TorusDimensions) -> Self {
        dims.axes()
    }
}

impl FromStr for TorusDimensions {
    type Err = DimensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(parse_triple(s)?)
    }
}

impl fmt::Display for TorusDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.length, self.height)
    }
}

/// Logical job extent: data-, tensor- and pipeline-parallel degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[usize; 3]", into = "[usize; 3]")]
pub struct JobShape {
    dp: usize,
    tp: usize,
    pp: usize,
}

impl JobShape {
    pub fn new(dp: usize, tp: usize, pp: usize) -> Result<Self, DimensionError> {
        let axes = [dp, tp, pp];
        if axes.contains(&0) {
            return Err(DimensionError::ZeroAxis { what: "job", axes });
        }
        if checked_volume(axes).is_none() {
            return Err(DimensionError::Overflow { what: "job", axes });
        }
        Ok(Self { dp, tp, pp })
    }

    pub fn dp(&self) -> usize {
        self.dp
    }

    pub fn tp(&self) -> usize {
        self.tp
    }

    pub fn pp(&self) -> usize {
        self.pp
    }

    pub fn axes(&self) -> [usize; 3] {
        [self.dp, self.tp, self.pp]
    }

    /// Number of nodes the job needs, D·T·P. Cannot overflow once constructed.
    pub fn volume(&self) -> usize {
        self.dp * self.tp * self.pp
    }
}

impl TryFrom<[usize; 3]> for JobShape {
    type Error = DimensionError;

    fn try_from(axes: [usize; 3]) -> Result<Self, Self::Error> {
        Self::new(axes[0], axes[1], axes[2])
    }
}

impl From<JobShape> for [usize; 3] {
    fn from(shape: JobShape) -> Self {
        shape.axes()
    }
}

impl FromStr for JobShape {
    type Err = DimensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(parse_triple(s)?)
    }
}

impl fmt::Display for JobShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.dp, self.tp, self.pp)
    }
}

fn checked_volume(axes: [usize; 3]) -> Option<usize> {
    axes.into_iter().try_fold(1usize, usize::checked_mul)
}

fn parse_triple(s: &str) -> Result<[usize; 3], DimensionError> {
    let malformed = || DimensionError::Malformed(s.to_string());
    let parts: Vec<&str> = s.trim().split('x').collect();
    if parts.len() != 3 {
        return Err(malformed());
    }
    let mut axes = [0usize; 3];
    for (slot, part) in axes.iter_mut().zip(parts) {
        *slot = part.trim().parse().map_err(|_| malformed())?;
    }
    Ok(axes)
}

/// Allocation policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Lexicographically first free axis-aligned bounding box.
    FirstFit,
    /// Free cells taken in Hilbert-curve order.
    SpaceFillingCurve,
    /// Free cells closest (torus L1) to a sampled center.
    L1Clustering,
    /// Fixed-size blocks, first free torus block per job block.
    Block,
    /// Fixed-size blocks, seeded random free torus block per job block.
    RandomBlock,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 5] = [
        PolicyKind::FirstFit,
        PolicyKind::SpaceFillingCurve,
        PolicyKind::L1Clustering,
        PolicyKind::Block,
        PolicyKind::RandomBlock,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PolicyKind::FirstFit => "first-fit",
            PolicyKind::SpaceFillingCurve => "space-filling-curve",
            PolicyKind::L1Clustering => "l1-clustering",
            PolicyKind::Block => "block",
            PolicyKind::RandomBlock => "random-block",
        }
    }

    /// Whether the policy works on fixed-size sub-blocks rather than cells.
    pub fn is_block_oriented(&self) -> bool {
        matches!(self, PolicyKind::Block | PolicyKind::RandomBlock)
    }
}

impl FromStr for PolicyKind {
    type Err = DimensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "first-fit" | "ff" => Ok(PolicyKind::FirstFit),
            "space-filling-curve" | "sfc" | "hilbert" => Ok(PolicyKind::SpaceFillingCurve),
            "l1-clustering" | "l1" => Ok(PolicyKind::L1Clustering),
            "block" => Ok(PolicyKind::Block),
            "random-block" => Ok(PolicyKind::RandomBlock),
            _ => Err(DimensionError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Order in which the orchestrator visits jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobOrder {
    /// Ascending job name.
    #[default]
    Name,
    /// The order jobs were declared in.
    Declared,
}

impl FromStr for JobOrder {
    type Err = DimensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" => Ok(JobOrder::Name),
            "declared" => Ok(JobOrder::Declared),
            other => Err(DimensionError::UnknownOrder(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_axis() {
        assert!(TorusDimensions::new(4, 0, 4).is_err());
        assert!(JobShape::new(0, 1, 1).is_err());
    }

    #[test]
    fn rejects_volume_overflow() {
        let half = usize::MAX / 2 + 1;
        assert!(matches!(
            JobShape::new(half, 2, 1),
            Err(DimensionError::Overflow { what: "job", .. })
        ));
        assert!(matches!(
            TorusDimensions::new(2, 1, half),
            Err(DimensionError::Overflow { what: "torus", .. })
        ));
        assert!(format!("{}x{}x2", usize::MAX, usize::MAX).parse::<JobShape>().is_err());
        assert_eq!(JobShape::new(half, 1, 1).unwrap().volume(), half);
    }

    #[test]
    fn parses_triples() {
        let dims: TorusDimensions = "4x2x3".parse().unwrap();
        assert_eq!(dims.axes(), [4, 2, 3]);
        assert_eq!(dims.volume(), 24);

        let shape: JobShape = "2x2x1".parse().unwrap();
        assert_eq!(shape.volume(), 4);
        assert_eq!(shape.to_string(), "2x2x1");
    }

    #[test]
    fn rejects_malformed_triples() {
        assert!("4x4".parse::<TorusDimensions>().is_err());
        assert!("4xax4".parse::<JobShape>().is_err());
        assert!("4x4x0".parse::<JobShape>().is_err());
    }

    #[test]
    fn policy_selectors_round_trip_labels() {
        for kind in PolicyKind::ALL {
            assert_eq!(kind.label().parse::<PolicyKind>().unwrap(), kind);
        }
        assert_eq!("hilbert".parse::<PolicyKind>().unwrap(), PolicyKind::SpaceFillingCurve);
        assert!(matches!(
            "best-fit".parse::<PolicyKind>(),
            Err(DimensionError::UnknownPolicy(_))
        ));
    }

    #[test]
    fn coords_iterate_in_linear_order() {
        let dims = TorusDimensions::new(2, 2, 2).unwrap();
        let coords: Vec<Coord> = dims.coords().collect();
        assert_eq!(coords.len(), 8);
        assert_eq!(coords[0], Coord::new(0, 0, 0));
        assert_eq!(coords[1], Coord::new(1, 0, 0));
        assert_eq!(coords[2], Coord::new(0, 1, 0));
        assert_eq!(coords[4], Coord::new(0, 0, 1));
    }
}
