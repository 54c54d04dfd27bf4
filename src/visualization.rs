use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rerun::{RecordingStream, TimeCell};
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::positioner::PlacementRecord;

pub fn id_to_color(id: &str) -> (u8, u8, u8, u8) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let mut rng = ChaCha8Rng::seed_from_u64(hasher.finish());
    let color_num = rng.random_range(0..2u32.pow(24));
    (
        ((color_num >> 16) % 256) as u8,
        ((color_num >> 8) % 256) as u8,
        (color_num % 256) as u8,
        255,
    )
}

/// Logs label anchors as labeled points, longitude and latitude on x and y.
pub fn log_placements<C: std::fmt::Display>(
    recording: &RecordingStream,
    topic: &str,
    frame_idx: i64,
    placements: &[PlacementRecord<'_, C>],
) -> anyhow::Result<()> {
    let (pts, colors_labels): (Vec<_>, Vec<_>) = placements
        .iter()
        .map(|p| {
            (
                [p.longitude as f32, p.latitude as f32, p.altitude as f32],
                (id_to_color(&p.id), p.content.to_string()),
            )
        })
        .unzip();
    let (colors, labels): (Vec<_>, Vec<_>) = colors_labels.into_iter().unzip();

    recording.set_time("frame", TimeCell::from_sequence(frame_idx));
    recording.log(
        format!("{}/labels", topic),
        &rerun::Points3D::new(pts)
            .with_colors(colors)
            .with_labels(labels)
            .with_radii([rerun::Radius::new_ui_points(5.0)]),
    )?;
    Ok(())
}
