use indexmap::IndexMap;
use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

pub type ObjectId = String;
pub type StreamName = String;

/// Ids of the currently selected objects.
pub type ObjectSelection = HashSet<ObjectId>;

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Generation token identifying one frame instance.
///
/// Two frames with equal content still carry different epochs, so a cache keyed
/// by epoch is invalidated whenever a new frame is adopted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameEpoch(u64);

impl FrameEpoch {
    pub fn next() -> FrameEpoch {
        FrameEpoch(NEXT_EPOCH.fetch_add(1, Ordering::Relaxed))
    }
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Per-stream geometry of one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub center: Option<[f64; 3]>,
    #[serde(default)]
    pub vertices: Option<Vec<[f64; 3]>>,
    /// Style classes used by stylesheet selectors.
    #[serde(default)]
    pub classes: Vec<String>,
    /// Inline style, wins over any stylesheet rule.
    #[serde(default)]
    pub style: serde_json::Map<String, serde_json::Value>,
}

impl Feature {
    pub fn has_geometry(&self) -> bool {
        self.center.is_some() || self.vertices.is_some()
    }
}

/// A tracked entity, described by one or more streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    /// Sensor-frame position.
    pub position: [f64; 3],
    /// Streams contributing geometry, in priority order.
    #[serde(default)]
    pub stream_names: Vec<StreamName>,
    #[serde(default)]
    pub features: HashMap<StreamName, Feature>,
}

impl SceneObject {
    pub fn new(id: &str, position: [f64; 3]) -> SceneObject {
        SceneObject {
            id: id.to_string(),
            position,
            ..Default::default()
        }
    }

    /// Appends a stream and its feature, keeping `stream_names` ordered.
    pub fn with_feature(mut self, stream_name: &str, feature: Feature) -> SceneObject {
        if !self.stream_names.iter().any(|s| s == stream_name) {
            self.stream_names.push(stream_name.to_string());
        }
        self.features.insert(stream_name.to_string(), feature);
        self
    }

    pub fn get_feature(&self, stream_name: &str) -> Option<&Feature> {
        self.features.get(stream_name)
    }
}

/// One scene snapshot.
///
/// A clone is a new frame instance and gets its own epoch.
#[derive(Debug, Serialize, Deserialize)]
pub struct Frame {
    #[serde(skip, default = "FrameEpoch::next")]
    epoch: FrameEpoch,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub objects: IndexMap<ObjectId, SceneObject>,
    /// Camera origin as longitude, latitude, altitude.
    #[serde(default)]
    pub origin: Option<[f64; 3]>,
    /// Vehicle pose relative to `origin`, used by vehicle relative streams.
    #[serde(default)]
    pub vehicle_relative_transform: Option<na::Matrix4<f64>>,
    /// Named transforms referenced by dynamic streams.
    #[serde(default)]
    pub transforms: HashMap<String, na::Matrix4<f64>>,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            epoch: FrameEpoch::next(),
            timestamp: 0.0,
            objects: IndexMap::new(),
            origin: None,
            vehicle_relative_transform: None,
            transforms: HashMap::new(),
        }
    }
}

impl Clone for Frame {
    fn clone(&self) -> Self {
        Self {
            epoch: FrameEpoch::next(),
            timestamp: self.timestamp,
            objects: self.objects.clone(),
            origin: self.origin,
            vehicle_relative_transform: self.vehicle_relative_transform,
            transforms: self.transforms.clone(),
        }
    }
}

impl Frame {
    pub fn new(timestamp: f64, objects: impl IntoIterator<Item = SceneObject>) -> Frame {
        Frame {
            timestamp,
            objects: objects.into_iter().map(|o| (o.id.clone(), o)).collect(),
            ..Default::default()
        }
    }

    pub fn with_origin(mut self, origin: [f64; 3]) -> Frame {
        self.origin = Some(origin);
        self
    }

    pub fn epoch(&self) -> FrameEpoch {
        self.epoch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoordinateKind {
    Geographic,
    Wgs84,
    Dynamic,
    VehicleRelative,
    Identity,
}

/// Stream pose, meters and radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub roll: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,
}

impl Pose {
    pub fn to_matrix(&self) -> na::Matrix4<f64> {
        na::Isometry3::from_parts(
            na::Translation3::new(self.x, self.y, self.z),
            na::UnitQuaternion::from_euler_angles(self.roll, self.pitch, self.yaw),
        )
        .to_homogeneous()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamMetadata {
    #[serde(default)]
    pub coordinate: Option<CoordinateKind>,
    /// Name of the frame transform used by dynamic streams.
    #[serde(default)]
    pub transform: Option<String>,
    #[serde(default)]
    pub pose: Option<Pose>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub streams: HashMap<StreamName, StreamMetadata>,
}

impl Metadata {
    pub fn stream(&self, stream_name: &str) -> Option<&StreamMetadata> {
        self.streams.get(stream_name)
    }
}
