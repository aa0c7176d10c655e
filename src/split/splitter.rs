//! Sequential trail splitting. Cuts are horizontal measures along the
//! trail; each cut inserts an interpolated vertex and starts a new
//! segment.

use itertools::Itertools;
use log::debug;

use crate::config::SplitConfig;
use crate::geo::{haversine_m, horizontal_length_m};
use crate::trail::{Trail, TrailPoint, TrailSegment};

/// Splits one trail at the supplied cut measures, returning the surviving
/// segments and the count of degenerate segments dropped.
///
/// Cuts are sanitised before use: sorted, clamped away from the trail's
/// endpoints, and merged when closer together than the minimum segment
/// length.
pub fn split_trail(
    trail: &Trail,
    cuts: &[f64],
    config: &SplitConfig,
) -> (Vec<TrailSegment>, usize) {
    let length = horizontal_length_m(trail.points());

    let cuts: Vec<f64> = cuts
        .iter()
        .copied()
        .filter(|m| {
            *m > config.min_segment_length_m && *m < length - config.min_segment_length_m
        })
        .sorted_by(|a, b| a.total_cmp(b))
        .coalesce(|a, b| {
            if b - a < config.min_segment_length_m {
                Ok(a)
            } else {
                Err((a, b))
            }
        })
        .collect();

    if !cuts.is_empty() {
        debug!("splitting trail {:?} at {} cuts", trail.id(), cuts.len());
    }

    let mut segments = Vec::with_capacity(cuts.len() + 1);
    let mut dropped = 0;
    let mut ordinal = 0u32;

    for piece in cut_polyline(trail.points(), &cuts) {
        let segment = TrailSegment::new(trail.id(), ordinal, piece);
        if segment.is_degenerate() {
            dropped += 1;
        } else {
            segments.push(segment);
            ordinal += 1;
        }
    }

    (segments, dropped)
}

/// Cuts a polyline at ascending horizontal measures, inserting an
/// interpolated vertex at each cut. The concatenation of the returned
/// pieces always reconstructs the input geometry.
pub(crate) fn cut_polyline(points: &[TrailPoint], cuts: &[f64]) -> Vec<Vec<TrailPoint>> {
    if points.len() < 2 {
        return vec![points.to_vec()];
    }

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut pending = cuts.iter().copied().peekable();
    let mut current = vec![points[0]];
    let mut cursor = 0.0;

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let step = haversine_m(&a, &b);

        while let Some(&measure) = pending.peek() {
            if measure >= cursor + step {
                break;
            }
            pending.next();

            let frac = if step > 0.0 {
                (measure - cursor) / step
            } else {
                0.0
            };
            let vertex = TrailPoint {
                lng: a.lng + (b.lng - a.lng) * frac,
                lat: a.lat + (b.lat - a.lat) * frac,
                elevation: a.elevation + (b.elevation - a.elevation) * frac,
            };

            current.push(vertex);
            pieces.push(std::mem::replace(&mut current, vec![vertex]));
        }

        current.push(b);
        cursor += step;
    }

    pieces.push(current);
    pieces
}
