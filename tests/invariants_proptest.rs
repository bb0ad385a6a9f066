//! Property tests for the universally-quantified invariants named in
//! the scenario descriptions: confidence stays in `[0, 1]` for every
//! affected node, regardless of which seed operation or hop budget is
//! used, and alias normalization round-trips through resolution.

#[macro_use]
extern crate proptest;

mod common;

use proptest::prelude::*;

use physio_reasoner::config::EngineConfig;
use physio_reasoner::graph::normalize_alias;
use physio_reasoner::model::{NodeId, Op, Perturbation};
use physio_reasoner::propagation::{simulate, SimulationOptions, SimulationRequest};

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Increase), Just(Op::Decrease)]
}

fn seed_strategy() -> impl Strategy<Value = NodeId> {
    prop_oneof![
        Just(NodeId::new("cardio.hemodynamics.map")),
        Just(NodeId::new("neuro.ans.sympathetic_tone")),
        Just(NodeId::new("pulm.ventilation.alveolar_ventilation")),
        Just(NodeId::new("pulm.gasexchange.pao2")),
    ]
}

proptest! {
    #[test]
    fn confidence_stays_in_unit_interval(
        seed in seed_strategy(),
        op in op_strategy(),
        max_hops in 0u32..8,
    ) {
        let graph = common::sample_graph();
        let request = SimulationRequest {
            perturbations: vec![Perturbation { node_id: seed, op }],
            context: Default::default(),
            options: SimulationOptions { max_hops, ..SimulationOptions::default() },
        };
        let response = simulate(&graph, &request, &EngineConfig::default()).unwrap();

        for node in &response.affected_nodes {
            prop_assert!(node.confidence >= 0.0 && node.confidence <= 1.0);
        }
        for steps in response.traces.values() {
            for step in steps {
                prop_assert!(step.confidence >= 0.0 && step.confidence <= 1.0);
            }
        }
    }

    #[test]
    fn alias_normalization_is_idempotent(raw in "[A-Za-z][A-Za-z0-9 _]{0,24}") {
        let once = normalize_alias(&raw);
        let twice = normalize_alias(&once);
        prop_assert_eq!(once, twice);
    }
}
