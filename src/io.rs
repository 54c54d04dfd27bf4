use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::config::PopupStyle;
use crate::positioner::PlacementRecord;
use crate::style::XvizStyleParser;
use crate::types::{Frame, Metadata, ObjectId, ObjectSelection};

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: &Path, object: &T) -> anyhow::Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    let mut file = std::fs::File::create(output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    file.write_all(j.as_bytes())?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(file_path)
        .with_context(|| format!("reading {}", file_path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", file_path.display()))
}

/// A recorded scene: stream metadata, styling, selection and a run of frames.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub metadata: Metadata,
    pub styles: XvizStyleParser,
    pub selection: ObjectSelection,
    pub popup: PopupStyle,
    /// Opaque camera state handed to the renderer as is.
    pub viewport: Option<Value>,
    pub frames: Vec<Frame>,
}

impl Scene {
    /// Streams referenced by objects but missing a feature or metadata entry.
    pub fn missing_streams(&self) -> Vec<(ObjectId, String)> {
        self.frames
            .iter()
            .flat_map(|f| f.objects.values())
            .flat_map(|o| {
                o.stream_names
                    .iter()
                    .filter(|s| o.get_feature(s).is_none() || self.metadata.stream(s).is_none())
                    .map(|s| (o.id.clone(), s.clone()))
            })
            .collect()
    }
}

pub fn load_scene(path: &Path) -> anyhow::Result<Scene> {
    let scene: Scene = object_from_json(path)?;
    let missing = scene.missing_streams();
    if !missing.is_empty() {
        log::warn!(
            "{} object streams lack a feature or metadata, first: {:?}",
            missing.len(),
            missing[0]
        );
    }
    log::info!("loaded {} frames from {}", scene.frames.len(), path.display());
    Ok(scene)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedLabel<C> {
    pub id: ObjectId,
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
    pub content: C,
    pub is_selected: bool,
}

impl<C: Clone> From<&PlacementRecord<'_, C>> for PlacedLabel<C> {
    fn from(record: &PlacementRecord<'_, C>) -> Self {
        Self {
            id: record.id.clone(),
            longitude: record.longitude,
            latitude: record.latitude,
            altitude: record.altitude,
            content: record.content.clone(),
            is_selected: record.style_props.is_selected,
        }
    }
}

/// Labels of one frame together with what the rendering surface needs to draw them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelOverlay<C> {
    pub timestamp: f64,
    pub viewport: Option<Value>,
    pub style: PopupStyle,
    pub placements: Vec<PlacedLabel<C>>,
}

impl<C: Clone> LabelOverlay<C> {
    pub fn new(
        frame: &Frame,
        viewport: Option<&Value>,
        style: &PopupStyle,
        records: &[PlacementRecord<'_, C>],
    ) -> LabelOverlay<C> {
        LabelOverlay {
            timestamp: frame.timestamp,
            viewport: viewport.cloned(),
            style: style.clone(),
            placements: records.iter().map(PlacedLabel::from).collect(),
        }
    }
}
