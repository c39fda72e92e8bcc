use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use rand::Rng;
use rand::distr::{Distribution, weighted::WeightedIndex};

use crate::error::{Result, SirdError};

/// Health status of a single individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Susceptible,
    Infected,
    Recovered,
    Dead,
}

impl Status {
    pub fn letter(self) -> char {
        match self {
            Status::Susceptible => 'S',
            Status::Infected => 'I',
            Status::Recovered => 'R',
            Status::Dead => 'D',
        }
    }

    /// Recovered and Dead have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Recovered | Status::Dead)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Status {
    type Err = SirdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "S" | "s" => Ok(Status::Susceptible),
            "I" | "i" => Ok(Status::Infected),
            "R" | "r" => Ok(Status::Recovered),
            "D" | "d" => Ok(Status::Dead),
            other => Err(SirdError::UnknownStatus(other.to_string())),
        }
    }
}

/// Grid position of an individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Coord {
        Coord { row, col }
    }

    pub fn distance(self, other: Coord) -> f64 {
        let dr = self.row.abs_diff(other.row) as f64;
        let dc = self.col.abs_diff(other.col) as f64;
        (dr * dr + dc * dc).sqrt()
    }
}

/// Number of individuals in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
    pub dead: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.recovered + self.dead
    }

    fn add(&mut self, status: Status) {
        match status {
            Status::Susceptible => self.susceptible += 1,
            Status::Infected => self.infected += 1,
            Status::Recovered => self.recovered += 1,
            Status::Dead => self.dead += 1,
        }
    }
}

/// Row-major `rows x cols` grid of health statuses.
///
/// Cloning produces an independent snapshot; nothing in the crate hands out
/// shared mutable access to a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Population {
    rows: usize,
    cols: usize,
    cells: Vec<Status>,
}

impl Population {
    pub fn new(rows: usize, cols: usize, fill: Status) -> Population {
        Population {
            rows,
            cols,
            cells: vec![fill; rows * cols],
        }
    }

    pub fn from_rows(rows: Vec<Vec<Status>>) -> Result<Population> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if n_rows == 0 || n_cols == 0 {
            return Err(SirdError::invalid("initial_state", "grid has no cells"));
        }
        let mut cells = Vec::with_capacity(n_rows * n_cols);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(SirdError::RaggedRow {
                    row: index,
                    expected: n_cols,
                    found: row.len(),
                });
            }
            cells.extend(row);
        }
        Ok(Population {
            rows: n_rows,
            cols: n_cols,
            cells,
        })
    }

    /// Draws every cell independently as Infected, Recovered or Susceptible
    /// with probabilities `alpha_infected`, `alpha_recovered` and the
    /// remainder. Cells are drawn in row-major order.
    pub fn random<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        alpha_infected: f64,
        alpha_recovered: f64,
        rng: &mut R,
    ) -> Result<Population> {
        const CHOICES: [Status; 3] = [Status::Infected, Status::Recovered, Status::Susceptible];
        let remainder = (1.0 - alpha_infected - alpha_recovered).max(0.0);
        let dist = WeightedIndex::new([alpha_infected, alpha_recovered, remainder])
            .map_err(|e| SirdError::invalid("alpha_infected", e.to_string()))?;
        let cells = (0..rows * cols)
            .map(|_| CHOICES[dist.sample(rng)])
            .collect();
        Ok(Population { rows, cols, cells })
    }

    /// Reads a headerless CSV of status letters, one grid row per record.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Population> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let row = record
                .iter()
                .map(str::parse)
                .collect::<Result<Vec<Status>>>()?;
            rows.push(row);
        }
        Population::from_rows(rows)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Population> {
        let file = std::fs::File::open(path)?;
        Population::from_csv_reader(file)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    pub fn get(&self, coord: Coord) -> Status {
        self.cells[self.index(coord)]
    }

    pub fn set(&mut self, coord: Coord, status: Status) {
        let idx = self.index(coord);
        self.cells[idx] = status;
    }

    pub fn cells(&self) -> &[Status] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, Status)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &status)| (Coord::new(i / self.cols, i % self.cols), status))
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for &status in &self.cells {
            counts.add(status);
        }
        counts
    }

    /// Panics on coordinates outside the grid.
    fn index(&self, coord: Coord) -> usize {
        assert!(self.contains(coord), "{coord:?} outside {}x{}", self.rows, self.cols);
        coord.row * self.cols + coord.col
    }
}
