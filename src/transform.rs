use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, PI};

use crate::types::{CoordinateKind, Frame, StreamMetadata};

/// Web mercator world size in units.
const TILE_SIZE: f64 = 512.0;
/// Meters, as used by the map projection.
pub const EARTH_CIRCUMFERENCE: f64 = 40.03e6;

pub const DEFAULT_ORIGIN: [f64; 3] = [0.0, 0.0, 0.0];

/// Longitude, latitude, altitude.
pub type TrackingPoint = [f64; 3];

/// Caller supplied replacement for [`resolve_coordinate_transform`].
pub type TransformOverride<'a> =
    dyn Fn(&Frame, Option<&StreamMetadata>) -> CoordinateTransform + 'a;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// Positions already are longitude, latitude, altitude.
    LngLat,
    /// Positions are east, north, up meters from `coordinate_origin`.
    MeterOffsets,
}

/// Converts sensor-frame positions of one stream into geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateTransform {
    pub coordinate_system: CoordinateSystem,
    pub coordinate_origin: [f64; 3],
    pub model_matrix: Option<na::Matrix4<f64>>,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self {
            coordinate_system: CoordinateSystem::MeterOffsets,
            coordinate_origin: DEFAULT_ORIGIN,
            model_matrix: None,
        }
    }
}

/// Builds the transform for a stream from the frame and the stream metadata.
///
/// Streams without metadata or without a coordinate kind are treated as vehicle
/// relative, so they follow the frame's `vehicle_relative_transform`.
pub fn resolve_coordinate_transform(
    frame: &Frame,
    stream_metadata: Option<&StreamMetadata>,
) -> CoordinateTransform {
    let coordinate_origin = frame.origin.unwrap_or(DEFAULT_ORIGIN);
    let coordinate = stream_metadata.and_then(|m| m.coordinate);

    let (coordinate_system, model_matrix) = match coordinate {
        Some(CoordinateKind::Geographic) | Some(CoordinateKind::Wgs84) => {
            (CoordinateSystem::LngLat, None)
        }
        Some(CoordinateKind::Dynamic) => {
            let name = stream_metadata.and_then(|m| m.transform.as_deref());
            let matrix = name.and_then(|n| frame.transforms.get(n)).copied();
            if matrix.is_none() {
                log::warn!("dynamic transform {:?} not found in frame", name);
            }
            (CoordinateSystem::MeterOffsets, matrix)
        }
        Some(CoordinateKind::Identity) => (CoordinateSystem::MeterOffsets, None),
        Some(CoordinateKind::VehicleRelative) | None => {
            (CoordinateSystem::MeterOffsets, frame.vehicle_relative_transform)
        }
    };

    let model_matrix = match stream_metadata.and_then(|m| m.pose) {
        Some(pose) => Some(model_matrix.unwrap_or_else(na::Matrix4::identity) * pose.to_matrix()),
        None => model_matrix,
    };

    CoordinateTransform {
        coordinate_system,
        coordinate_origin,
        model_matrix,
    }
}

/// Converts a sensor-frame position to longitude, latitude, altitude.
pub fn position_to_lng_lat(position: &[f64; 3], transform: &CoordinateTransform) -> TrackingPoint {
    let p = na::Point3::from(*position);
    let p = match &transform.model_matrix {
        Some(m) => m.transform_point(&p),
        None => p,
    };
    match transform.coordinate_system {
        CoordinateSystem::LngLat => [p.x, p.y, p.z],
        CoordinateSystem::MeterOffsets => {
            add_meters_to_lng_lat(&transform.coordinate_origin, &[p.x, p.y, p.z])
        }
    }
}

fn lng_lat_to_world(lng: f64, lat: f64) -> (f64, f64) {
    let lambda = lng.to_radians();
    let phi = lat.to_radians();
    let x = TILE_SIZE * (lambda + PI) / (2.0 * PI);
    let y = TILE_SIZE * (PI + (FRAC_PI_4 + phi / 2.0).tan().ln()) / (2.0 * PI);
    (x, y)
}

fn world_to_lng_lat(x: f64, y: f64) -> (f64, f64) {
    let lambda = x / TILE_SIZE * 2.0 * PI - PI;
    let phi = 2.0 * ((y / TILE_SIZE * 2.0 * PI - PI).exp().atan() - FRAC_PI_4);
    (lambda.to_degrees(), phi.to_degrees())
}

/// Offsets `lng_lat_z` by east, north, up meters.
///
/// Uses the mercator distance scale at the origin latitude plus a first order
/// correction for the scale change along the north axis.
pub fn add_meters_to_lng_lat(lng_lat_z: &[f64; 3], xyz: &[f64; 3]) -> [f64; 3] {
    let [lng, lat, z0] = *lng_lat_z;
    let [x, y, z] = *xyz;

    let lat_cosine = lat.to_radians().cos();
    let units_per_meter = TILE_SIZE / EARTH_CIRCUMFERENCE / lat_cosine;
    let earth_radius = EARTH_CIRCUMFERENCE / (2.0 * PI);
    let units_per_meter2 = units_per_meter * lat.to_radians().tan() / earth_radius;

    let (wx, wy) = lng_lat_to_world(lng, lat);
    let wx = wx + x * (units_per_meter + units_per_meter2 * y);
    let wy = wy + y * (units_per_meter + units_per_meter2 * y / 2.0);
    let (new_lng, new_lat) = world_to_lng_lat(wx, wy);

    [new_lng, new_lat, z0 + z]
}
