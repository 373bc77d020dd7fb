//! # Stage Pipeline
//!
//! Owns one [`Coordinator`] per stage plus the state they capture from, and
//! forwards every published result into the stages that consume it.
//!
//! ```text
//! snapshot ─► mesh ─► post-process ─┬─► texture ─► ContentStore
//!                                   ├─► mouse pick
//!                                   └─► rig ─┬─► motions
//!                                            └─► pose preview
//! ```
//!
//! The pipeline is driven from a single control thread: [`Pipeline::pump`]
//! publishes whatever is ready without blocking, [`Pipeline::wait_idle`]
//! blocks until every stage has settled.

use std::sync::Arc;

use config::GenerationConfig;
use skeleton_mesh::{GeneratedCacheContext, Outcome};
use skeleton_snapshot::Snapshot;
use tracing::{debug, info};

use crate::coordinator::{Coordinator, RequestStatus};
use crate::stage::Stage;
use crate::stages::{
    MeshStage, MotionsOutcome, MotionsStage, MousePickStage, PickResult, PosePreview,
    PosePreviewStage, PostProcessStage, Ray, Rig, RigStage, TextureOutcome, TextureStage,
};
use crate::store::ContentStore;

/// Everything the stages capture their inputs from.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub snapshot: Arc<Snapshot>,
    pub config: GenerationConfig,
    pub cache: Arc<GeneratedCacheContext>,
    pub store: Arc<ContentStore>,
    /// Last combined mesh
    pub mesh: Option<Arc<Outcome>>,
    /// Last post-processed mesh
    pub processed: Option<Arc<Outcome>>,
    pub rig: Option<Arc<Rig>>,
    pub preview_pose: Option<String>,
    pub pick_ray: Option<Ray>,
}

impl PipelineInputs {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            snapshot: Arc::new(Snapshot::default()),
            config,
            cache: Arc::new(GeneratedCacheContext::new(config.cache_capacity)),
            store: Arc::new(ContentStore::new()),
            mesh: None,
            processed: None,
            rig: None,
            preview_pose: None,
            pick_ray: None,
        }
    }
}

/// The full generation pipeline.
pub struct Pipeline {
    inputs: PipelineInputs,
    mesh: Coordinator<MeshStage>,
    postprocess: Coordinator<PostProcessStage>,
    texture: Coordinator<TextureStage>,
    rig: Coordinator<RigStage>,
    motions: Coordinator<MotionsStage>,
    pose_preview: Coordinator<PosePreviewStage>,
    mouse_pick: Coordinator<MousePickStage>,
}

impl Pipeline {
    pub fn new(config: GenerationConfig) -> Self {
        Self::with_inputs(PipelineInputs::new(config))
    }

    /// Builds a pipeline over existing inputs, e.g. to share a cache or
    /// store between pipelines.
    pub fn with_inputs(inputs: PipelineInputs) -> Self {
        Self {
            inputs,
            mesh: Coordinator::new(MeshStage),
            postprocess: Coordinator::new(PostProcessStage),
            texture: Coordinator::new(TextureStage),
            rig: Coordinator::new(RigStage),
            motions: Coordinator::new(MotionsStage),
            pose_preview: Coordinator::new(PosePreviewStage),
            mouse_pick: Coordinator::new(MousePickStage),
        }
    }

    /// Replaces the snapshot and requests a new mesh.
    pub fn set_snapshot(&mut self, snapshot: Snapshot) -> RequestStatus {
        self.inputs.snapshot = Arc::new(snapshot);
        self.mesh.request(&self.inputs)
    }

    /// Selects the pose to preview, or none.
    pub fn set_preview_pose(&mut self, pose_id: Option<String>) -> RequestStatus {
        self.inputs.preview_pose = pose_id;
        self.pose_preview.request(&self.inputs)
    }

    /// Casts a pick ray against the current post-processed mesh. The ray
    /// stays active and is re-cast whenever the mesh changes.
    pub fn pick(&mut self, ray: Ray) -> RequestStatus {
        self.inputs.pick_ray = Some(ray);
        self.mouse_pick.request(&self.inputs)
    }

    /// Publishes every finished result without blocking. Returns how many
    /// results were published.
    pub fn pump(&mut self) -> usize {
        self.step(false)
    }

    /// Blocks until no stage has a worker in flight.
    pub fn wait_idle(&mut self) -> usize {
        let mut published = 0;
        while self.is_running() {
            published += self.step(true);
        }
        info!(published, "pipeline idle");
        published
    }

    pub fn is_running(&self) -> bool {
        self.mesh.is_running()
            || self.postprocess.is_running()
            || self.texture.is_running()
            || self.rig.is_running()
            || self.motions.is_running()
            || self.pose_preview.is_running()
            || self.mouse_pick.is_running()
    }

    pub fn inputs(&self) -> &PipelineInputs {
        &self.inputs
    }

    pub fn store(&self) -> &Arc<ContentStore> {
        &self.inputs.store
    }

    pub fn cache(&self) -> &Arc<GeneratedCacheContext> {
        &self.inputs.cache
    }

    /// Last post-processed mesh.
    pub fn outcome(&self) -> Option<&Arc<Outcome>> {
        self.inputs.processed.as_ref()
    }

    pub fn texture(&self) -> Option<&Arc<TextureOutcome>> {
        self.texture.latest()
    }

    pub fn rig(&self) -> Option<&Arc<Rig>> {
        self.inputs.rig.as_ref()
    }

    pub fn motions(&self) -> Option<&Arc<MotionsOutcome>> {
        self.motions.latest()
    }

    pub fn pose_preview(&self) -> Option<&Arc<PosePreview>> {
        self.pose_preview.latest()
    }

    pub fn pick_result(&self) -> Option<&Arc<PickResult>> {
        self.mouse_pick.latest()
    }

    pub fn mesh_coordinator(&self) -> &Coordinator<MeshStage> {
        &self.mesh
    }

    /// Collects results stage by stage in chain order, so a result
    /// published early in a step can start its consumers in the same step.
    fn step(&mut self, blocking: bool) -> usize {
        let mut published = 0;

        if let Some(outcome) = collect(&mut self.mesh, &self.inputs, blocking) {
            published += 1;
            self.inputs.mesh = Some(outcome);
            self.postprocess.request(&self.inputs);
        }

        if let Some(processed) = collect(&mut self.postprocess, &self.inputs, blocking) {
            published += 1;
            self.inputs.processed = Some(processed);
            self.texture.request(&self.inputs);
            self.rig.request(&self.inputs);
            if self.inputs.pick_ray.is_some() {
                self.mouse_pick.request(&self.inputs);
            }
        }

        if let Some(texture) = collect(&mut self.texture, &self.inputs, blocking) {
            published += 1;
            // Only the latest texture is referenced
            if let Some(id) = texture.image {
                self.inputs.store.retain(&[id]);
            }
        }

        if let Some(rig) = collect(&mut self.rig, &self.inputs, blocking) {
            published += 1;
            self.inputs.rig = Some(rig);
            self.motions.request(&self.inputs);
            if self.inputs.preview_pose.is_some() {
                self.pose_preview.request(&self.inputs);
            }
        }

        published += usize::from(collect(&mut self.motions, &self.inputs, blocking).is_some());
        published += usize::from(collect(&mut self.pose_preview, &self.inputs, blocking).is_some());
        published += usize::from(collect(&mut self.mouse_pick, &self.inputs, blocking).is_some());

        if published > 0 {
            debug!(published, blocking, "pipeline step");
        }
        published
    }
}

fn collect<S>(
    coordinator: &mut Coordinator<S>,
    inputs: &PipelineInputs,
    blocking: bool,
) -> Option<Arc<S::Output>>
where
    S: Stage<Context = PipelineInputs>,
{
    let output = if blocking {
        coordinator.wait(inputs)
    } else {
        coordinator.poll(inputs)
    };
    // Results are consumed through the pipeline state
    coordinator.take_result();
    output
}

#[cfg(test)]
mod tests;
