//! Post-process stage: derived per-triangle attributes of the last mesh.

use std::sync::Arc;

use config::GenerationConfig;
use skeleton_mesh::postprocess::postprocess;
use skeleton_mesh::Outcome;

use crate::pipeline::PipelineInputs;
use crate::stage::Stage;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcessStage;

impl Stage for PostProcessStage {
    type Context = PipelineInputs;
    type Input = (Arc<Outcome>, GenerationConfig);
    type Output = Outcome;

    const NAME: &'static str = "postprocess";

    fn capture(&self, inputs: &PipelineInputs) -> Option<Self::Input> {
        inputs
            .mesh
            .as_ref()
            .map(|outcome| (Arc::clone(outcome), inputs.config))
    }

    fn run((outcome, config): Self::Input) -> Outcome {
        postprocess(&outcome, &config)
    }

    fn failed(message: String) -> Outcome {
        Outcome::failed(message)
    }

    fn succeeded(outcome: &Outcome) -> bool {
        outcome.succeeded
    }
}
