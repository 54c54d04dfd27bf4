use serde_json::Value;

use crate::style::{StyleParser, numeric_property};
use crate::transform::{TrackingPoint, TransformOverride, position_to_lng_lat};
use crate::transform_cache::CoordinateTransformCache;
use crate::types::{Frame, Metadata, ObjectId, ObjectSelection, SceneObject};

pub const HEIGHT_PROPERTY: &str = "height";

/// Content produced by a label renderer. Blank content shows no label.
pub trait LabelContent {
    fn is_blank(&self) -> bool;
}

impl LabelContent for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl LabelContent for &str {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T> LabelContent for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl LabelContent for Value {
    fn is_blank(&self) -> bool {
        match self {
            Value::Null | Value::Bool(false) => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// What a label renderer gets to see about one object.
#[derive(Clone, Copy)]
pub struct StyleProps<'a> {
    pub id: &'a str,
    pub is_selected: bool,
    pub object: &'a SceneObject,
    pub xviz_styles: &'a dyn StyleParser,
}

impl std::fmt::Debug for StyleProps<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleProps")
            .field("id", &self.id)
            .field("is_selected", &self.is_selected)
            .field("object", &self.object)
            .finish_non_exhaustive()
    }
}

/// Geographic anchor and content of one label.
#[derive(Debug, Clone)]
pub struct PlacementRecord<'a, C> {
    pub id: ObjectId,
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
    pub content: C,
    pub style_props: StyleProps<'a>,
}

impl<C> PlacementRecord<'_, C> {
    pub fn tracking_point(&self) -> TrackingPoint {
        [self.longitude, self.latitude, self.altitude]
    }
}

/// Everything `place_all` reads for one frame.
#[derive(Clone, Copy)]
pub struct PlacementInputs<'a> {
    pub frame: Option<&'a Frame>,
    pub metadata: &'a Metadata,
    pub object_selection: &'a ObjectSelection,
    pub xviz_style_parser: &'a dyn StyleParser,
    pub transform_override: Option<&'a TransformOverride<'a>>,
}

/// Shows `ID: <id>` for selected objects and nothing otherwise.
pub fn default_object_label(style_props: &StyleProps) -> Option<String> {
    style_props
        .is_selected
        .then(|| format!("ID: {}", style_props.id))
}

/// First stream, in order, whose feature has a center or vertices.
pub fn tracking_stream(object: &SceneObject) -> Option<&str> {
    object
        .stream_names
        .iter()
        .find(|s| object.get_feature(s).is_some_and(|f| f.has_geometry()))
        .map(String::as_str)
}

/// Height from the stylesheet of the first stream with vertices that defines a
/// non-zero one. A zero height lets later streams provide it.
pub fn object_height(object: &SceneObject, style_parser: &dyn StyleParser) -> Option<f64> {
    object.stream_names.iter().find_map(|s| {
        let feature = object.get_feature(s).filter(|f| f.vertices.is_some())?;
        numeric_property(style_parser, s, HEIGHT_PROPERTY, feature).filter(|h| *h != 0.0)
    })
}

/// Computes label anchors for the objects of a frame.
///
/// Holds the transform cache across calls; the cache follows the frame passed to
/// [`ObjectLabelPositioner::place_all`].
#[derive(Debug, Default)]
pub struct ObjectLabelPositioner {
    cache: CoordinateTransformCache,
}

impl ObjectLabelPositioner {
    pub fn new() -> ObjectLabelPositioner {
        Self::default()
    }

    pub fn cache(&self) -> &CoordinateTransformCache {
        &self.cache
    }

    pub fn invalidate(&mut self, frame: &Frame) {
        self.cache.invalidate(frame);
    }

    /// Places one label per object that renders non-blank content and has geometry.
    ///
    /// Output order follows `frame.objects`. Without a frame or a renderer the
    /// result is empty.
    pub fn place_all<'a, C, R>(
        &mut self,
        inputs: &PlacementInputs<'a>,
        render_object_label: Option<R>,
    ) -> Vec<PlacementRecord<'a, C>>
    where
        C: LabelContent,
        R: FnMut(&StyleProps<'a>) -> Option<C>,
    {
        let (Some(frame), Some(mut render)) = (inputs.frame, render_object_label) else {
            return Vec::new();
        };
        if self.cache.sync(frame) {
            log::debug!(
                "placing labels for frame {} ({} objects)",
                frame.timestamp,
                frame.objects.len()
            );
        }

        frame
            .objects
            .values()
            .filter_map(|object| self.place_object(inputs, frame, object, &mut render))
            .collect()
    }

    fn place_object<'a, C, R>(
        &mut self,
        inputs: &PlacementInputs<'a>,
        frame: &'a Frame,
        object: &'a SceneObject,
        render: &mut R,
    ) -> Option<PlacementRecord<'a, C>>
    where
        C: LabelContent,
        R: FnMut(&StyleProps<'a>) -> Option<C>,
    {
        let style_props = StyleProps {
            id: &object.id,
            is_selected: inputs.object_selection.contains(&object.id),
            object,
            xviz_styles: inputs.xviz_style_parser,
        };

        let content = render(&style_props).filter(|c| !c.is_blank())?;

        let Some(stream_name) = tracking_stream(object) else {
            log::debug!("object {} has no center or vertices, no label", object.id);
            return None;
        };
        let transform = self.cache.resolve(
            stream_name,
            frame,
            inputs.metadata,
            inputs.transform_override,
        );
        let mut tracking_point = position_to_lng_lat(&object.position, &transform);

        tracking_point[2] += object_height(object, inputs.xviz_style_parser).unwrap_or(0.0);

        // compensate for camera offset
        if let Some(origin) = frame.origin {
            tracking_point[2] -= origin[2];
        }

        log::trace!("object {} anchored at {:?}", object.id, tracking_point);
        Some(PlacementRecord {
            id: object.id.clone(),
            longitude: tracking_point[0],
            latitude: tracking_point[1],
            altitude: tracking_point[2],
            content,
            style_props,
        })
    }
}
