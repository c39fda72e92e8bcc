use rand::Rng;
use rand::distr::weighted::WeightedIndex;
use rand_distr::{Bernoulli, Distribution};
use tracing::trace;

use crate::contact::ContactGraph;
use crate::error::{Result, SirdError};
use crate::population::{Population, Status, StatusCounts};

/// Daily snapshots of a run. Index 0 is the initial grid, index `d` the grid
/// after day `d`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationHistory {
    snapshots: Vec<Population>,
}

impl SimulationHistory {
    pub fn snapshots(&self) -> &[Population] {
        &self.snapshots
    }

    pub fn day(&self, day: usize) -> Option<&Population> {
        self.snapshots.get(day)
    }

    pub fn initial(&self) -> &Population {
        &self.snapshots[0]
    }

    pub fn last(&self) -> &Population {
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// Number of snapshots, i.e. simulated days plus one.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn counts(&self) -> Vec<StatusCounts> {
        self.snapshots.iter().map(Population::counts).collect()
    }
}

const PROGRESSION: [Status; 3] = [Status::Recovered, Status::Dead, Status::Infected];

/// Day-by-day SIRD dynamics over a fixed contact graph.
pub struct EpidemicSimulator<'g> {
    graph: &'g ContactGraph,
    transmission: Bernoulli,
    progression: WeightedIndex<f64>,
}

impl<'g> EpidemicSimulator<'g> {
    pub fn new(
        graph: &'g ContactGraph,
        gamma: f64,
        beta_recovered: f64,
        beta_death: f64,
    ) -> Result<EpidemicSimulator<'g>> {
        let transmission =
            Bernoulli::new(gamma).map_err(|e| SirdError::invalid("gamma", e.to_string()))?;
        let remain = (1.0 - beta_recovered - beta_death).max(0.0);
        let progression = WeightedIndex::new([beta_recovered, beta_death, remain])
            .map_err(|e| SirdError::invalid("beta_recovered", e.to_string()))?;
        Ok(EpidemicSimulator {
            graph,
            transmission,
            progression,
        })
    }

    /// Advances `live` by `n_days`, returning `n_days + 1` snapshots. The
    /// grid must have the shape the contact graph was built for.
    pub fn run<R: Rng + ?Sized>(
        &self,
        live: &mut Population,
        n_days: usize,
        rng: &mut R,
    ) -> Result<SimulationHistory> {
        self.check_shape(live)?;
        let mut snapshots = Vec::with_capacity(n_days + 1);
        snapshots.push(live.clone());
        for day in 1..=n_days {
            self.advance(live, rng);
            trace!(day, counts = ?live.counts(), "day simulated");
            snapshots.push(live.clone());
        }
        Ok(SimulationHistory { snapshots })
    }

    /// One day: transmission along every edge, then progression of whoever
    /// was infected when the day began.
    pub fn step<R: Rng + ?Sized>(&self, live: &mut Population, rng: &mut R) -> Result<()> {
        self.check_shape(live)?;
        self.advance(live, rng);
        Ok(())
    }

    fn check_shape(&self, live: &Population) -> Result<()> {
        if live.rows() != self.graph.rows() || live.cols() != self.graph.cols() {
            return Err(SirdError::GridShape {
                expected_rows: self.graph.rows(),
                expected_cols: self.graph.cols(),
                rows: live.rows(),
                cols: live.cols(),
            });
        }
        Ok(())
    }

    fn advance<R: Rng + ?Sized>(&self, live: &mut Population, rng: &mut R) {
        let infected_at_dawn: Vec<_> = live
            .iter()
            .filter(|&(_, status)| status == Status::Infected)
            .map(|(coord, _)| coord)
            .collect();

        // Later edges see infections made by earlier ones.
        for edge in self.graph.edges() {
            match (live.get(edge.a), live.get(edge.b)) {
                (Status::Infected, Status::Susceptible) => {
                    if self.transmission.sample(rng) {
                        live.set(edge.b, Status::Infected);
                    }
                }
                (Status::Susceptible, Status::Infected) => {
                    if self.transmission.sample(rng) {
                        live.set(edge.a, Status::Infected);
                    }
                }
                _ => {}
            }
        }

        for coord in infected_at_dawn {
            live.set(coord, PROGRESSION[self.progression.sample(rng)]);
        }
    }
}

#[cfg(test)]
mod test {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::contact::{ContactEdge, ContactGraphBuilder};
    use crate::population::Coord;

    fn pair_graph() -> ContactGraph {
        ContactGraph::from_edges(
            1,
            2,
            vec![ContactEdge {
                a: Coord::new(0, 0),
                b: Coord::new(0, 1),
            }],
        )
        .unwrap()
    }

    fn grid(cells: &[Status]) -> Population {
        Population::from_rows(vec![cells.to_vec()]).unwrap()
    }

    #[test]
    fn test_certain_transmission() {
        let graph = pair_graph();
        let sim = EpidemicSimulator::new(&graph, 1.0, 0.0, 0.0).unwrap();
        let mut live = grid(&[Status::Infected, Status::Susceptible]);
        let history = sim.run(&mut live, 1, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.day(1).unwrap().cells(), &[Status::Infected, Status::Infected]);
    }

    #[test]
    fn test_transmission_from_second_endpoint() {
        let graph = pair_graph();
        let sim = EpidemicSimulator::new(&graph, 1.0, 0.0, 0.0).unwrap();
        let mut live = grid(&[Status::Susceptible, Status::Infected]);
        sim.run(&mut live, 1, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(live.cells(), &[Status::Infected, Status::Infected]);
    }

    #[test]
    fn test_no_transmission() {
        let graph = pair_graph();
        let sim = EpidemicSimulator::new(&graph, 0.0, 0.0, 0.0).unwrap();
        let mut live = grid(&[Status::Infected, Status::Susceptible]);
        let history = sim.run(&mut live, 1, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(history.last().cells(), &[Status::Infected, Status::Susceptible]);
    }

    #[test]
    fn test_certain_recovery_is_permanent() {
        let graph = ContactGraph::from_edges(1, 1, vec![]).unwrap();
        let sim = EpidemicSimulator::new(&graph, 0.5, 1.0, 0.0).unwrap();
        let mut live = grid(&[Status::Infected]);
        let history = sim.run(&mut live, 10, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(history.initial().cells(), &[Status::Infected]);
        for day in 1..=10 {
            assert_eq!(history.day(day).unwrap().cells(), &[Status::Recovered]);
        }
    }

    #[test]
    fn test_certain_death() {
        let graph = pair_graph();
        let sim = EpidemicSimulator::new(&graph, 0.0, 0.0, 1.0).unwrap();
        let mut live = grid(&[Status::Infected, Status::Recovered]);
        sim.run(&mut live, 3, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(live.cells(), &[Status::Dead, Status::Recovered]);
    }

    #[test]
    fn test_newly_infected_skip_progression() {
        // Certain infection and certain death: the source dies on day 1, the
        // individual it infected only dies on day 2.
        let graph = pair_graph();
        let sim = EpidemicSimulator::new(&graph, 1.0, 0.0, 1.0).unwrap();
        let mut live = grid(&[Status::Infected, Status::Susceptible]);
        let history = sim.run(&mut live, 2, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(history.day(1).unwrap().cells(), &[Status::Dead, Status::Infected]);
        assert_eq!(history.day(2).unwrap().cells(), &[Status::Dead, Status::Dead]);
    }

    #[test]
    fn test_same_day_cascade_follows_edge_order() {
        // (0,0)-(0,1) comes before (0,1)-(0,2), so one day spreads the
        // infection two hops. Reversing the order only reaches one hop.
        let a = Coord::new(0, 0);
        let b = Coord::new(0, 1);
        let c = Coord::new(0, 2);
        let forward = ContactGraph::from_edges(
            1,
            3,
            vec![ContactEdge { a, b }, ContactEdge { a: b, b: c }],
        )
        .unwrap();
        let backward = ContactGraph::from_edges(
            1,
            3,
            vec![ContactEdge { a: b, b: c }, ContactEdge { a, b }],
        )
        .unwrap();
        let start = grid(&[Status::Infected, Status::Susceptible, Status::Susceptible]);

        let mut live = start.clone();
        EpidemicSimulator::new(&forward, 1.0, 0.0, 0.0)
            .unwrap()
            .step(&mut live, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(live.counts().infected, 3);

        let mut live = start;
        EpidemicSimulator::new(&backward, 1.0, 0.0, 0.0)
            .unwrap()
            .step(&mut live, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(
            live.cells(),
            &[Status::Infected, Status::Infected, Status::Susceptible]
        );
    }

    #[test]
    fn test_zero_days() {
        let graph = pair_graph();
        let sim = EpidemicSimulator::new(&graph, 1.0, 0.0, 0.0).unwrap();
        let mut live = grid(&[Status::Infected, Status::Susceptible]);
        let history = sim.run(&mut live, 0, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(live.cells(), &[Status::Infected, Status::Susceptible]);
    }

    #[test]
    fn test_snapshots_do_not_alias_live_grid() {
        let graph = pair_graph();
        let sim = EpidemicSimulator::new(&graph, 0.0, 0.0, 0.0).unwrap();
        let initial = grid(&[Status::Infected, Status::Susceptible]);
        let mut live = initial.clone();
        let history = sim.run(&mut live, 2, &mut StdRng::seed_from_u64(0)).unwrap();
        live.set(Coord::new(0, 1), Status::Dead);
        assert_eq!(history.initial(), &initial);
        assert_eq!(history.last(), &initial);
    }

    fn random_run(seed: u64) -> SimulationHistory {
        let mut rng = StdRng::seed_from_u64(seed);
        let graph = ContactGraphBuilder::new(20, 15, 2.0, 4.0)
            .build(&mut rng)
            .unwrap();
        let mut live = Population::random(20, 15, 0.05, 0.0, &mut rng).unwrap();
        let sim = EpidemicSimulator::new(&graph, 0.2, 0.1, 0.05).unwrap();
        sim.run(&mut live, 60, &mut rng).unwrap()
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        let history = random_run(8675309);
        assert_eq!(history.len(), 61);
        for window in history.snapshots().windows(2) {
            for (before, after) in window[0].cells().iter().zip(window[1].cells()) {
                if before.is_terminal() {
                    assert_eq!(before, after);
                }
                if *before == Status::Infected {
                    assert_ne!(*after, Status::Susceptible);
                }
            }
        }
        let counts = history.counts();
        assert!(counts.iter().all(|c| c.total() == 300));
        for pair in counts.windows(2) {
            assert!(pair[1].dead >= pair[0].dead);
            assert!(pair[1].susceptible <= pair[0].susceptible);
        }
    }

    #[test]
    fn test_same_seed_same_history() {
        assert_eq!(random_run(7), random_run(7));
    }

    #[test]
    fn test_grid_must_match_graph_shape() {
        // 1x3 graph against a 3x1 grid: (0,1) does not exist in the grid
        let graph = ContactGraph::from_edges(
            1,
            3,
            vec![ContactEdge {
                a: Coord::new(0, 0),
                b: Coord::new(0, 1),
            }],
        )
        .unwrap();
        let sim = EpidemicSimulator::new(&graph, 1.0, 0.0, 0.0).unwrap();
        let start = Population::from_rows(vec![
            vec![Status::Infected],
            vec![Status::Susceptible],
            vec![Status::Susceptible],
        ])
        .unwrap();

        let mut live = start.clone();
        let err = sim
            .run(&mut live, 1, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(
            err,
            SirdError::GridShape {
                expected_rows: 1,
                expected_cols: 3,
                rows: 3,
                cols: 1,
            }
        ));
        assert!(sim.step(&mut live, &mut StdRng::seed_from_u64(0)).is_err());
        assert_eq!(live, start);
    }

    #[test]
    fn test_rejects_bad_probabilities() {
        let graph = pair_graph();
        assert!(matches!(
            EpidemicSimulator::new(&graph, 1.5, 0.0, 0.0),
            Err(SirdError::InvalidParameter { name: "gamma", .. })
        ));
        assert!(EpidemicSimulator::new(&graph, 0.5, -0.1, 0.0).is_err());
    }
}
