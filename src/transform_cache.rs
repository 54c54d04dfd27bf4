use std::collections::HashMap;
use std::rc::Rc;

use crate::transform::{CoordinateTransform, TransformOverride, resolve_coordinate_transform};
use crate::types::{Frame, FrameEpoch, Metadata, StreamName};

/// Memoizes one [`CoordinateTransform`] per stream for the active frame.
///
/// Entries belong to the frame epoch they were derived for. Adopting a frame with
/// a different epoch drops every entry, so a transform is never served for a
/// stale frame.
#[derive(Debug, Default)]
pub struct CoordinateTransformCache {
    epoch: Option<FrameEpoch>,
    entries: HashMap<StreamName, Rc<CoordinateTransform>>,
    derivations: usize,
}

impl CoordinateTransformCache {
    pub fn new() -> CoordinateTransformCache {
        Self::default()
    }

    /// Clears all entries and adopts `frame` as the active frame.
    pub fn invalidate(&mut self, frame: &Frame) {
        log::trace!(
            "invalidating {} cached transforms, epoch {:?} -> {}",
            self.entries.len(),
            self.epoch.map(|e| e.value()),
            frame.epoch().value()
        );
        self.entries.clear();
        self.epoch = Some(frame.epoch());
    }

    /// Invalidates only when `frame` is not the active frame. Returns whether it did.
    pub fn sync(&mut self, frame: &Frame) -> bool {
        if self.epoch == Some(frame.epoch()) {
            return false;
        }
        self.invalidate(frame);
        true
    }

    /// Returns the transform for `stream_name`, deriving it on first use.
    ///
    /// A present `transform_override` replaces the default derivation entirely.
    pub fn resolve(
        &mut self,
        stream_name: &str,
        frame: &Frame,
        metadata: &Metadata,
        transform_override: Option<&TransformOverride<'_>>,
    ) -> Rc<CoordinateTransform> {
        self.sync(frame);

        if let Some(cached) = self.entries.get(stream_name) {
            return Rc::clone(cached);
        }

        let stream_metadata = metadata.stream(stream_name);
        if stream_metadata.is_none() {
            log::debug!("no metadata for stream {}, using frame default", stream_name);
        }
        let transform = match transform_override {
            Some(f) => f(frame, stream_metadata),
            None => resolve_coordinate_transform(frame, stream_metadata),
        };
        self.derivations += 1;

        let transform = Rc::new(transform);
        self.entries.insert(stream_name.to_string(), Rc::clone(&transform));
        transform
    }

    pub fn epoch(&self) -> Option<FrameEpoch> {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, stream_name: &str) -> bool {
        self.entries.contains_key(stream_name)
    }

    /// Number of transforms derived since construction.
    pub fn derivations(&self) -> usize {
        self.derivations
    }
}
