mod common;

use physio_reasoner::config::EngineConfig;
use physio_reasoner::model::{NodeId, Op, Perturbation};
use physio_reasoner::propagation::{simulate, SimulationOptions, SimulationRequest};

#[test]
fn ten_repeated_runs_are_byte_identical() {
    let graph = common::sample_graph();
    let request = SimulationRequest {
        perturbations: vec![Perturbation {
            node_id: NodeId::new("cardio.hemodynamics.map"),
            op: Op::Decrease,
        }],
        context: Default::default(),
        options: SimulationOptions {
            max_hops: 5,
            ..SimulationOptions::default()
        },
    };
    let config = EngineConfig::default();

    let first = serde_json::to_string(&simulate(&graph, &request, &config).unwrap()).unwrap();
    for _ in 0..9 {
        let again = serde_json::to_string(&simulate(&graph, &request, &config).unwrap()).unwrap();
        assert_eq!(again, first);
    }
}
