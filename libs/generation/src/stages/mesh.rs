//! Mesh stage: one [`MeshGenerator`] run per request.

use std::sync::Arc;

use skeleton_mesh::{MeshGenerator, Outcome};

use crate::pipeline::PipelineInputs;
use crate::stage::Stage;

/// Regenerates the combined mesh from the current snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshStage;

impl Stage for MeshStage {
    type Context = PipelineInputs;
    type Input = MeshGenerator;
    type Output = Outcome;

    const NAME: &'static str = "mesh";

    fn capture(&self, inputs: &PipelineInputs) -> Option<MeshGenerator> {
        Some(
            MeshGenerator::new(Arc::clone(&inputs.snapshot), inputs.config)
                .with_cache(Arc::clone(&inputs.cache)),
        )
    }

    fn run(generator: MeshGenerator) -> Outcome {
        generator.generate()
    }

    fn failed(message: String) -> Outcome {
        Outcome::failed(message)
    }

    fn succeeded(outcome: &Outcome) -> bool {
        outcome.succeeded
    }
}
