use std::collections::HashSet;

use rand::Rng;
use rand::seq::index;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SirdError};
use crate::population::Coord;

/// Subtracted from `floor(rows * cols * mean_degree / 2)` to get the edge
/// target. Set it to 0 on the builder for the uncorrected count.
pub const EDGE_TARGET_OFFSET: usize = 1;

/// Rejection-sampling draws allowed before construction gives up.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 10_000_000;

/// How candidate pairs are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    /// Draw two distinct individuals uniformly and keep the pair if it is
    /// close enough and new.
    #[default]
    Rejection,
    /// List every within-radius pair, then sample the target count of them
    /// without replacement.
    Enumerated,
}

/// Undirected contact between two distinct individuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEdge {
    pub a: Coord,
    pub b: Coord,
}

impl ContactEdge {
    /// Orientation-free identity of the edge.
    pub fn key(&self) -> (Coord, Coord) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }

    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }
}

/// Contact edges in the order they were accepted. Transmission walks them in
/// exactly this order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactGraph {
    rows: usize,
    cols: usize,
    edges: Vec<ContactEdge>,
}

impl ContactGraph {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn edges(&self) -> &[ContactEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains(&self, p: Coord, q: Coord) -> bool {
        let key = ContactEdge { a: p, b: q }.key();
        self.edges.iter().any(|e| e.key() == key)
    }

    pub fn mean_degree(&self) -> f64 {
        let n = self.rows * self.cols;
        if n == 0 {
            return 0.0;
        }
        2.0 * self.edges.len() as f64 / n as f64
    }

    /// Builds a graph from an explicit edge list, rejecting out-of-bounds
    /// endpoints, self-loops, and duplicates in either orientation.
    pub fn from_edges(rows: usize, cols: usize, edges: Vec<ContactEdge>) -> Result<ContactGraph> {
        let mut seen = HashSet::with_capacity(edges.len());
        for edge in &edges {
            let in_bounds = |c: Coord| c.row < rows && c.col < cols;
            if !in_bounds(edge.a) || !in_bounds(edge.b) {
                return Err(SirdError::invalid(
                    "contact_graph",
                    format!("edge {edge:?} leaves the {rows}x{cols} grid"),
                ));
            }
            if edge.a == edge.b {
                return Err(SirdError::invalid(
                    "contact_graph",
                    format!("self-loop at {:?}", edge.a),
                ));
            }
            if !seen.insert(edge.key()) {
                return Err(SirdError::invalid(
                    "contact_graph",
                    format!("duplicate edge {edge:?}"),
                ));
            }
        }
        Ok(ContactGraph { rows, cols, edges })
    }
}

/// Random contact graph over a `rows x cols` grid where every edge spans at
/// most `radius`.
#[derive(Debug, Clone)]
pub struct ContactGraphBuilder {
    rows: usize,
    cols: usize,
    radius: f64,
    mean_degree: f64,
    target_offset: usize,
    max_attempts: u64,
    sampling: Sampling,
}

impl ContactGraphBuilder {
    pub fn new(rows: usize, cols: usize, radius: f64, mean_degree: f64) -> ContactGraphBuilder {
        ContactGraphBuilder {
            rows,
            cols,
            radius,
            mean_degree,
            target_offset: EDGE_TARGET_OFFSET,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            sampling: Sampling::default(),
        }
    }

    pub fn target_offset(mut self, offset: usize) -> Self {
        self.target_offset = offset;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn target_edges(&self) -> usize {
        let half = (self.rows * self.cols) as f64 * self.mean_degree / 2.0;
        (half.floor() as usize).saturating_sub(self.target_offset)
    }

    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ContactGraph> {
        let target = self.target_edges();
        let edges = match self.sampling {
            Sampling::Rejection => self.rejection(target, rng)?,
            Sampling::Enumerated => self.enumerated(target, rng)?,
        };
        Ok(ContactGraph {
            rows: self.rows,
            cols: self.cols,
            edges,
        })
    }

    fn coord(&self, idx: usize) -> Coord {
        Coord::new(idx / self.cols, idx % self.cols)
    }

    fn rejection<R: Rng + ?Sized>(&self, target: usize, rng: &mut R) -> Result<Vec<ContactEdge>> {
        let n = self.rows * self.cols;
        let mut edges = Vec::with_capacity(target);
        if target == 0 {
            return Ok(edges);
        }
        if n < 2 {
            return Err(SirdError::GraphUnsatisfiable {
                target,
                accepted: 0,
                attempts: 0,
            });
        }

        let mut seen = HashSet::with_capacity(target);
        let mut attempts = 0;
        while edges.len() < target {
            if attempts == self.max_attempts {
                return Err(SirdError::GraphUnsatisfiable {
                    target,
                    accepted: edges.len(),
                    attempts,
                });
            }
            attempts += 1;
            let pair = index::sample(rng, n, 2);
            let edge = ContactEdge {
                a: self.coord(pair.index(0)),
                b: self.coord(pair.index(1)),
            };
            if edge.length() <= self.radius && seen.insert(edge.key()) {
                edges.push(edge);
            }
        }
        debug!(
            target,
            attempts,
            acceptance = target as f64 / attempts as f64,
            "contact graph built by rejection sampling"
        );
        Ok(edges)
    }

    /// Every within-radius pair once, smaller coordinate first.
    fn candidates(&self) -> Vec<ContactEdge> {
        // Radii past the grid diagonal add nothing.
        let reach = self.radius.max(0.0).min((self.rows + self.cols) as f64).floor() as usize;
        let mut pairs = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let a = Coord::new(row, col);
                for r2 in row..self.rows.min(row + reach + 1) {
                    let c_lo = if r2 == row { col + 1 } else { col.saturating_sub(reach) };
                    for c2 in c_lo..self.cols.min(col + reach + 1) {
                        let b = Coord::new(r2, c2);
                        if a.distance(b) <= self.radius {
                            pairs.push(ContactEdge { a, b });
                        }
                    }
                }
            }
        }
        pairs
    }

    fn enumerated<R: Rng + ?Sized>(&self, target: usize, rng: &mut R) -> Result<Vec<ContactEdge>> {
        let pairs = self.candidates();
        if pairs.len() < target {
            return Err(SirdError::GraphUnsatisfiable {
                target,
                accepted: pairs.len(),
                attempts: pairs.len() as u64,
            });
        }
        debug!(target, candidates = pairs.len(), "sampling contact graph from candidate pairs");
        Ok(index::sample(rng, pairs.len(), target)
            .into_iter()
            .map(|i| pairs[i])
            .collect())
    }
}
