//! # Texture Stage
//!
//! Paints the texture atlas: every part's UV rect is filled with the part's
//! color. The encoded image goes into the [`ContentStore`]; the published
//! output only carries its [`ContentId`].

use std::collections::BTreeMap;
use std::sync::Arc;

use config::constants::DEFAULT_COLOR;
use skeleton_mesh::{Outcome, UvRect};
use tracing::debug;

use crate::error::{GenerationError, Result};
use crate::pipeline::PipelineInputs;
use crate::stage::Stage;
use crate::store::{ContentId, ContentStore};

/// Square RGBA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub size: usize,
    /// Row-major pixels, `size * size` of them
    pub pixels: Vec<[u8; 4]>,
}

impl TextureImage {
    pub fn new(size: usize, fill: [u8; 4]) -> Self {
        Self {
            size,
            pixels: vec![fill; size * size],
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        (x < self.size && y < self.size).then(|| self.pixels[y * self.size + x])
    }

    /// Fills the pixels covered by a UV rect.
    pub fn fill_rect(&mut self, rect: &UvRect, color: [u8; 4]) {
        let size = self.size as f64;
        let span = |start: f64, length: f64| {
            let from = (start * size).floor().clamp(0.0, size) as usize;
            let to = ((start + length) * size).ceil().clamp(0.0, size) as usize;
            from..to
        };
        for y in span(rect.top, rect.height) {
            for x in span(rect.left, rect.width) {
                self.pixels[y * self.size + x] = color;
            }
        }
    }

    /// Encodes as a little-endian `u32` edge length followed by RGBA bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + self.pixels.len() * 4);
        bytes.extend_from_slice(&(self.size as u32).to_le_bytes());
        bytes.extend(self.pixels.iter().flatten());
        bytes
    }

    /// Decodes [`to_bytes`](Self::to_bytes) output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (header, body) = bytes
            .split_first_chunk::<4>()
            .ok_or_else(|| GenerationError::invalid_image("missing size header"))?;
        let size = u32::from_le_bytes(*header) as usize;
        if body.len() != size * size * 4 {
            return Err(GenerationError::invalid_image(format!(
                "expected {} pixel bytes for size {size}, found {}",
                size * size * 4,
                body.len()
            )));
        }
        let pixels = body
            .chunks_exact(4)
            .map(|chunk| [chunk[0], chunk[1], chunk[2], chunk[3]])
            .collect();
        Ok(Self { size, pixels })
    }
}

/// Published texture result.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureOutcome {
    pub image: Option<ContentId>,
    pub size: usize,
    pub succeeded: bool,
    pub messages: Vec<String>,
}

impl TextureOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            image: None,
            size: 0,
            succeeded: false,
            messages: vec![message.into()],
        }
    }
}

/// Input captured for one texture run.
#[derive(Debug, Clone)]
pub struct TextureInput {
    pub outcome: Arc<Outcome>,
    pub store: Arc<ContentStore>,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextureStage;

impl Stage for TextureStage {
    type Context = PipelineInputs;
    type Input = TextureInput;
    type Output = TextureOutcome;

    const NAME: &'static str = "texture";

    fn capture(&self, inputs: &PipelineInputs) -> Option<TextureInput> {
        inputs.processed.as_ref().map(|outcome| TextureInput {
            outcome: Arc::clone(outcome),
            store: Arc::clone(&inputs.store),
            size: inputs.config.texture_size,
        })
    }

    fn run(input: TextureInput) -> TextureOutcome {
        let image = paint(&input.outcome, input.size);
        let id = input.store.insert(image.to_bytes());
        debug!(%id, size = input.size, "texture stored");
        TextureOutcome {
            image: Some(id),
            size: input.size,
            succeeded: true,
            messages: Vec::new(),
        }
    }

    fn failed(message: String) -> TextureOutcome {
        TextureOutcome::failed(message)
    }

    fn succeeded(output: &TextureOutcome) -> bool {
        output.succeeded
    }
}

/// Paints every part rect of `outcome` with its part color.
pub fn paint(outcome: &Outcome, size: usize) -> TextureImage {
    let mut image = TextureImage::new(size, to_rgba8(DEFAULT_COLOR));
    let mut part_colors: BTreeMap<&str, [f32; 4]> = BTreeMap::new();
    for node in outcome.nodes.iter().filter(|node| !node.is_mirror()) {
        part_colors.entry(node.part_id.as_str()).or_insert(node.color);
    }
    for (part_id, rect) in &outcome.part_uv_rects {
        let color = part_colors
            .get(part_id.as_str())
            .copied()
            .unwrap_or(DEFAULT_COLOR);
        image.fill_rect(rect, to_rgba8(color));
    }
    image
}

fn to_rgba8(color: [f32; 4]) -> [u8; 4] {
    color.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use skeleton_mesh::OutcomeNode;
    use skeleton_snapshot::BoneMark;

    fn outcome_with_part(color: [f32; 4]) -> Outcome {
        let mut outcome = Outcome::default();
        outcome.nodes.push(OutcomeNode {
            part_id: "p".into(),
            node_id: "n".into(),
            origin: DVec3::ZERO,
            radius: 0.1,
            color,
            bone_mark: BoneMark::None,
            mirror_from_part_id: None,
        });
        outcome.part_uv_rects.insert(
            "p".into(),
            UvRect {
                left: 0.0,
                top: 0.0,
                width: 0.5,
                height: 0.5,
            },
        );
        outcome
    }

    #[test]
    fn test_part_rect_is_painted() {
        let image = paint(&outcome_with_part([1.0, 0.0, 0.0, 1.0]), 8);
        assert_eq!(image.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(image.pixel(3, 3), Some([255, 0, 0, 255]));
        assert_eq!(image.pixel(7, 7), Some([255, 255, 255, 255]));
        assert_eq!(image.pixel(8, 0), None);
    }

    #[test]
    fn test_image_bytes_decode() {
        let image = paint(&outcome_with_part([0.0, 0.0, 1.0, 1.0]), 4);
        let decoded = TextureImage::from_bytes(&image.to_bytes()).unwrap();
        assert_eq!(decoded, image);
        assert!(TextureImage::from_bytes(&[1, 0]).is_err());
        assert!(TextureImage::from_bytes(&[2, 0, 0, 0, 1]).is_err());
    }

    #[test]
    fn test_run_stores_image() {
        let store = Arc::new(ContentStore::new());
        let output = TextureStage::run(TextureInput {
            outcome: Arc::new(outcome_with_part([0.0, 1.0, 0.0, 1.0])),
            store: Arc::clone(&store),
            size: 4,
        });
        assert!(output.succeeded);
        let bytes = store.get(output.image.unwrap()).unwrap();
        let image = TextureImage::from_bytes(&bytes).unwrap();
        assert_eq!(image.pixel(1, 1), Some([0, 255, 0, 255]));
    }
}
