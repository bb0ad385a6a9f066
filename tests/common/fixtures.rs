//! A small hand-authored knowledge pack covering the canonical
//! end-to-end scenarios, built from the same node identifiers used in
//! the scenario descriptions.

use physio_reasoner::graph::Graph;
use physio_reasoner::loader::{self, PackDocument};

const PACK_YAML: &str = r#"
nodes:
  - id: cardio.hemodynamics.map
    label: Mean Arterial Pressure
    domain: cardio
    type: variable
    state_type: qualitative
  - id: neuro.ans.sympathetic_tone
    label: Sympathetic Tone
    domain: neuro
    type: variable
    state_type: qualitative
  - id: renal.raas.renin
    label: Renin
    domain: renal
    type: hormone
    state_type: qualitative
  - id: renal.raas.angiotensin_ii
    label: Angiotensin II
    domain: renal
    type: hormone
    state_type: qualitative
  - id: cardio.mechanics.preload
    label: Cardiac Preload
    domain: cardio
    type: variable
    state_type: qualitative
  - id: pulm.ventilation.alveolar_ventilation
    label: Alveolar Ventilation
    domain: pulm
    type: variable
    state_type: qualitative
  - id: pulm.gasexchange.paco2
    label: Arterial PaCO2
    domain: pulm
    type: variable
    state_type: qualitative
  - id: acidbase.blood.h_concentration
    label: Blood Hydrogen Ion Concentration
    domain: acidbase
    type: variable
    state_type: qualitative
  - id: acidbase.blood.ph
    label: Blood pH
    domain: acidbase
    type: variable
    state_type: qualitative
  - id: pulm.gasexchange.pao2
    label: Arterial PaO2
    domain: pulm
    type: variable
    state_type: qualitative
  - id: cardio.hemodynamics.heart_rate
    label: Heart Rate
    domain: cardio
    type: variable
    state_type: qualitative

edges:
  - source: cardio.hemodynamics.map
    target: neuro.ans.sympathetic_tone
    rel: decreases
    weight: 0.8
    delay: immediate
  - source: neuro.ans.sympathetic_tone
    target: renal.raas.renin
    rel: increases
    weight: 0.6
    delay: minutes
  - source: cardio.hemodynamics.map
    target: renal.raas.renin
    rel: decreases
    weight: 0.5
    delay: minutes
  - source: renal.raas.renin
    target: renal.raas.angiotensin_ii
    rel: increases
    weight: 0.9
    delay: minutes
    context:
      ace_inhibitor: false
  - source: renal.raas.angiotensin_ii
    target: cardio.mechanics.preload
    rel: increases
    weight: 0.7
    delay: hours
  - source: pulm.ventilation.alveolar_ventilation
    target: pulm.gasexchange.paco2
    rel: decreases
    weight: 0.9
    delay: immediate
  - source: pulm.gasexchange.paco2
    target: acidbase.blood.h_concentration
    rel: increases
    weight: 0.8
    delay: immediate
  - source: acidbase.blood.h_concentration
    target: acidbase.blood.ph
    rel: decreases
    weight: 0.95
    delay: immediate
  - source: pulm.gasexchange.pao2
    target: neuro.ans.sympathetic_tone
    rel: decreases
    weight: 0.6
    delay: immediate
  - source: neuro.ans.sympathetic_tone
    target: cardio.hemodynamics.heart_rate
    rel: increases
    weight: 0.7
    delay: immediate
    context:
      beta_blocker: false

rules:
  - id: heart_failure_compensation
    when: "ctx.heart_failure"
    then:
      neuro.ans.sympathetic_tone: increase
"#;

pub fn sample_graph() -> Graph {
    let doc = PackDocument::from_yaml_str(PACK_YAML).expect("fixture pack parses");
    let (graph, diagnostics) = loader::load_pack(&[doc]).expect("fixture pack loads");
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    graph
}
