//! Boundary to the remote image-generation and cat-detection services.

use std::{future::Future, io::Cursor, sync::Arc};

use anyhow::{Context, Result};
use image::ImageReader;
use serde::Deserialize;

use crate::{
    error::GameError,
    geometry::BoundingBox,
    models::{ArtStyle, Difficulty},
};

/// External service that paints a scene and finds the cats in it.
///
/// Implementations report failures as `anyhow` errors; the controller turns
/// them into `GameError::Generation` / `GameError::Detection`.
pub trait SceneProvider: Send + Sync + 'static {
    fn generate_image(
        &self,
        difficulty: Difficulty,
        style: ArtStyle,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Boxes on the 0–1000 scale, in detection order.
    fn detect_objects(
        &self,
        image: &[u8],
        difficulty: Difficulty,
        style: ArtStyle,
    ) -> impl Future<Output = Result<Vec<BoundingBox>>> + Send;
}

/// Generated scene plus its natural pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneImage {
    pub bytes: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
}

impl SceneImage {
    /// Probes the image header for its dimensions without decoding pixels.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, GameError> {
        let (width, height) = probe_dimensions(&bytes)
            .map_err(|err| GameError::Generation(format!("{err:#}")))?;
        if width == 0 || height == 0 {
            return Err(GameError::Generation(format!(
                "generated image has no area ({width}x{height})"
            )));
        }

        Ok(Self {
            bytes: bytes.into(),
            width,
            height,
        })
    }
}

fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("failed to read generated image")?
        .into_dimensions()
        .context("generated image is not a supported format")
}

#[derive(Debug, Deserialize)]
struct DetectionPayload {
    #[serde(default)]
    boxes: Vec<BoundingBox>,
}

/// Parses a `{"boxes": [{"ymin", "xmin", "ymax", "xmax"}, ...]}` detection reply.
/// A missing `boxes` key is an empty list; any box outside the scene scale
/// or with inverted edges makes the whole reply malformed.
pub fn parse_detection_payload(json: &str) -> Result<Vec<BoundingBox>, GameError> {
    let payload: DetectionPayload = serde_json::from_str(json)
        .map_err(|err| GameError::Detection(format!("unreadable detection reply: {err}")))?;
    validate_boxes(&payload.boxes)?;
    Ok(payload.boxes)
}

/// Rejects empty or malformed detection results.
pub fn validate_boxes(boxes: &[BoundingBox]) -> Result<(), GameError> {
    if boxes.is_empty() {
        return Err(GameError::Detection(
            "no cats were found in the generated scene".into(),
        ));
    }
    if let Some((index, bad)) = boxes.iter().enumerate().find(|(_, b)| !b.is_valid()) {
        return Err(GameError::Detection(format!(
            "box {index} is outside the scene: {bad:?}"
        )));
    }
    Ok(())
}
