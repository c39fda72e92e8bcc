use grid_sird::{ContactGraph, SimulationHistory};
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
pub struct DailyCounts {
    pub day: usize,
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
    pub dead: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EdgeRow {
    pub row_a: usize,
    pub col_a: usize,
    pub row_b: usize,
    pub col_b: usize,
}

pub fn daily_counts(history: &SimulationHistory) -> Vec<DailyCounts> {
    history
        .counts()
        .into_iter()
        .enumerate()
        .map(|(day, c)| DailyCounts {
            day,
            susceptible: c.susceptible,
            infected: c.infected,
            recovered: c.recovered,
            dead: c.dead,
        })
        .collect()
}

pub fn edge_rows(graph: &ContactGraph) -> Vec<EdgeRow> {
    graph
        .edges()
        .iter()
        .map(|e| EdgeRow {
            row_a: e.a.row,
            col_a: e.a.col,
            row_b: e.b.row,
            col_b: e.b.col,
        })
        .collect()
}
