//! Pairwise intersection detection. Trail pairs are pruned by R-tree
//! envelope overlap before any segment-level geometry runs.

use geo::{Coord, Line, LineLocatePoint, Point};
use itertools::Itertools;
use log::debug;
use rstar::{RTree, RTreeObject};
use rustc_hash::FxHashMap;
use smallvec::smallvec;

use crate::config::SplitConfig;
use crate::geo::{
    haversine_m, horizontal_length_m, line_pair_intersection, measure_along_m, SegmentCrossing,
};
use crate::split::{
    GeometryError, IntersectionId, IntersectionKind, IntersectionPoint,
};
use crate::trail::{Trail, TrailId, TrailPoint};

/// Output of the detection pass: the intersection points themselves plus
/// the cut measures (horizontal metres along each trail) the splitter
/// will cut at.
#[derive(Debug, Clone)]
pub struct Detection {
    pub intersections: Vec<IntersectionPoint>,
    pub cuts: FxHashMap<TrailId, Vec<f64>>,
    pub skipped: Vec<GeometryError>,
}

/// One location where two polylines meet, with the measure along each.
#[derive(Debug, Clone, Copy)]
struct Meeting {
    point: TrailPoint,
    measure_a: f64,
    measure_b: f64,
}

/// Detects all intersections between the supplied trails.
pub fn detect_intersections(trails: &[Trail], config: &SplitConfig) -> Detection {
    let mut skipped = Vec::new();
    let mut intersections = Vec::new();
    let mut cuts: FxHashMap<TrailId, Vec<f64>> = FxHashMap::default();
    let mut next_id = 0u64;

    let mut alloc_id = |intersections: &mut Vec<IntersectionPoint>,
                        point: TrailPoint,
                        trail_ids: smallvec::SmallVec<[TrailId; 2]>,
                        kind: IntersectionKind| {
        intersections.push(IntersectionPoint {
            id: IntersectionId(next_id),
            point,
            trail_ids,
            kind,
        });
        next_id += 1;
    };

    // Degenerate trails are excluded up front.
    let valid: Vec<&Trail> = trails
        .iter()
        .filter(|trail| {
            if trail.is_degenerate() {
                skipped.push(GeometryError::DegenerateTrail(trail.id()));
                false
            } else {
                true
            }
        })
        .collect();

    // Self-intersections first: a trail with unsplittable self-overlap is
    // excluded from everything that follows. Closed loops are exempt and
    // are never split against themselves.
    let mut self_excluded = Vec::new();
    for trail in valid.iter().copied() {
        if trail.is_loop(config.loop_closing_tolerance_m) {
            debug!("trail {:?} closes into a loop, self-split exempt", trail.id());
            continue;
        }

        match self_meetings(trail) {
            Ok(meetings) => {
                for meeting in dedupe_meetings(meetings, config.snap_tolerance_m) {
                    alloc_id(
                        &mut intersections,
                        meeting.point,
                        smallvec![trail.id()],
                        IntersectionKind::Crossing,
                    );
                    record_cut(&mut cuts, trail, meeting.measure_a, config);
                    record_cut(&mut cuts, trail, meeting.measure_b, config);
                }
            }
            Err(error) => {
                self_excluded.push(trail.id());
                skipped.push(error);
            }
        }
    }

    let candidates: Vec<&Trail> = valid
        .iter()
        .copied()
        .filter(|trail| !self_excluded.contains(&trail.id()))
        .collect();

    // Envelope index, padded by the snap tolerance so near-miss pairs
    // still register as overlapping.
    let tree = RTree::bulk_load(
        candidates
            .iter()
            .map(|trail| trail.bounds(config.snap_tolerance_m))
            .collect(),
    );

    let by_id: FxHashMap<TrailId, &Trail> =
        candidates.iter().map(|t| (t.id(), *t)).collect();

    // Unordered pairs with overlapping envelopes, in deterministic order.
    let pairs: Vec<(TrailId, TrailId)> = candidates
        .iter()
        .flat_map(|trail| {
            let bounds = trail.bounds(config.snap_tolerance_m);
            tree.locate_in_envelope_intersecting(&bounds.envelope())
                .filter(|other| other.id > trail.id())
                .map(|other| (trail.id(), other.id))
                .collect::<Vec<_>>()
        })
        .sorted()
        .collect();

    for (id_a, id_b) in pairs {
        let (a, b) = (by_id[&id_a], by_id[&id_b]);
        let (meetings, collinear) = pair_meetings(a, b, config.snap_tolerance_m);
        let meetings = dedupe_meetings(meetings, config.snap_tolerance_m);

        if meetings.is_empty() {
            continue;
        }

        let kind = classify(a, b, &meetings, collinear, config.snap_tolerance_m);
        for meeting in &meetings {
            alloc_id(
                &mut intersections,
                snap_meeting_point(a, b, meeting, config.min_segment_length_m),
                smallvec![a.id(), b.id()],
                kind,
            );
            record_cut(&mut cuts, a, meeting.measure_a, config);
            record_cut(&mut cuts, b, meeting.measure_b, config);
        }
    }

    Detection {
        intersections,
        cuts,
        skipped,
    }
}

fn as_line(a: &TrailPoint, b: &TrailPoint) -> Line<f64> {
    Line::new(Coord { x: a.lng, y: a.lat }, Coord { x: b.lng, y: b.lat })
}

fn interpolate(a: &TrailPoint, b: &TrailPoint, frac: f64) -> TrailPoint {
    TrailPoint {
        lng: a.lng + (b.lng - a.lng) * frac,
        lat: a.lat + (b.lat - a.lat) * frac,
        elevation: a.elevation + (b.elevation - a.elevation) * frac,
    }
}

/// All meetings between two distinct trails: true segment crossings plus
/// near-miss endpoint projections within the snap tolerance.
fn pair_meetings(a: &Trail, b: &Trail, snap_tolerance_m: f64) -> (Vec<Meeting>, bool) {
    let mut meetings = Vec::new();
    let mut collinear = false;

    let mut cursor_a = 0.0;
    for wa in a.points().windows(2) {
        let len_a = haversine_m(&wa[0], &wa[1]);
        let line_a = as_line(&wa[0], &wa[1]);

        let mut cursor_b = 0.0;
        for wb in b.points().windows(2) {
            let len_b = haversine_m(&wb[0], &wb[1]);
            let line_b = as_line(&wb[0], &wb[1]);

            match line_pair_intersection(line_a, line_b) {
                Some(SegmentCrossing::Point { at, .. }) => {
                    let point = Point::from(at);
                    let frac_a = line_a.line_locate_point(&point).unwrap_or(0.0);
                    let frac_b = line_b.line_locate_point(&point).unwrap_or(0.0);

                    meetings.push(Meeting {
                        point: interpolate(&wa[0], &wa[1], frac_a),
                        measure_a: cursor_a + len_a * frac_a,
                        measure_b: cursor_b + len_b * frac_b,
                    });
                }
                Some(SegmentCrossing::Collinear { overlap }) => {
                    collinear = true;
                    for end in [overlap.start, overlap.end] {
                        let point = Point::from(end);
                        let frac_a = line_a.line_locate_point(&point).unwrap_or(0.0);
                        let frac_b = line_b.line_locate_point(&point).unwrap_or(0.0);

                        meetings.push(Meeting {
                            point: interpolate(&wa[0], &wa[1], frac_a),
                            measure_a: cursor_a + len_a * frac_a,
                            measure_b: cursor_b + len_b * frac_b,
                        });
                    }
                }
                None => {}
            }

            cursor_b += len_b;
        }

        cursor_a += len_a;
    }

    // Near-miss T/Y meetings: an endpoint of one trail hovering within
    // the snap tolerance of the other, without a true crossing.
    let len_a = horizontal_length_m(a.points());
    let len_b = horizontal_length_m(b.points());

    let first_a = *a.points().first().unwrap_or(&TrailPoint::new(0.0, 0.0, 0.0));
    let last_a = *a.points().last().unwrap_or(&first_a);
    for (endpoint, measure_a) in [(first_a, 0.0), (last_a, len_a)] {
        if let Some(hit) = measure_along_m(b.points(), endpoint.as_point()) {
            if hit.offset_m <= snap_tolerance_m {
                meetings.push(Meeting {
                    point: hit.projected,
                    measure_a,
                    measure_b: hit.measure_m,
                });
            }
        }
    }

    let first_b = *b.points().first().unwrap_or(&TrailPoint::new(0.0, 0.0, 0.0));
    let last_b = *b.points().last().unwrap_or(&first_b);
    for (endpoint, measure_b) in [(first_b, 0.0), (last_b, len_b)] {
        if let Some(hit) = measure_along_m(a.points(), endpoint.as_point()) {
            if hit.offset_m <= snap_tolerance_m {
                meetings.push(Meeting {
                    point: hit.projected,
                    measure_a: hit.measure_m,
                    measure_b,
                });
            }
        }
    }

    (meetings, collinear)
}

/// Meetings of a (non-loop) trail with itself. Only non-adjacent segment
/// pairs are tested, so shared vertices never register as crossings.
fn self_meetings(trail: &Trail) -> Result<Vec<Meeting>, GeometryError> {
    let points = trail.points();
    let mut meetings = Vec::new();

    let mut cursors = Vec::with_capacity(points.len());
    let mut cursor = 0.0;
    for pair in points.windows(2) {
        cursors.push(cursor);
        cursor += haversine_m(&pair[0], &pair[1]);
    }

    for i in 0..points.len().saturating_sub(1) {
        for j in (i + 2)..points.len() - 1 {
            let line_i = as_line(&points[i], &points[i + 1]);
            let line_j = as_line(&points[j], &points[j + 1]);

            match line_pair_intersection(line_i, line_j) {
                Some(SegmentCrossing::Point { at, proper }) if proper => {
                    let point = Point::from(at);
                    let frac_i = line_i.line_locate_point(&point).unwrap_or(0.0);
                    let frac_j = line_j.line_locate_point(&point).unwrap_or(0.0);

                    meetings.push(Meeting {
                        point: interpolate(&points[i], &points[i + 1], frac_i),
                        measure_a: cursors[i]
                            + haversine_m(&points[i], &points[i + 1]) * frac_i,
                        measure_b: cursors[j]
                            + haversine_m(&points[j], &points[j + 1]) * frac_j,
                    });
                }
                Some(SegmentCrossing::Collinear { .. }) => {
                    // A trail doubling back over its own geometry cannot
                    // be split into well-formed segments.
                    return Err(GeometryError::UnsplittableSelfOverlap(trail.id()));
                }
                _ => {}
            }
        }
    }

    Ok(meetings)
}

/// Collapses meetings within the snap tolerance of one another into one
/// representative (the first encountered).
fn dedupe_meetings(meetings: Vec<Meeting>, snap_tolerance_m: f64) -> Vec<Meeting> {
    let mut kept: Vec<Meeting> = Vec::new();

    for meeting in meetings {
        if kept
            .iter()
            .all(|prior| haversine_m(&prior.point, &meeting.point) > snap_tolerance_m)
        {
            kept.push(meeting);
        }
    }

    kept
}

/// Classifies how two trails meet. Depends only on geometry, never on
/// trail naming.
fn classify(
    a: &Trail,
    b: &Trail,
    meetings: &[Meeting],
    collinear: bool,
    snap_tolerance_m: f64,
) -> IntersectionKind {
    if collinear || meetings.len() > 1 {
        return IntersectionKind::MultiPoint;
    }

    let meeting = &meetings[0];
    let len_a = horizontal_length_m(a.points());
    let len_b = horizontal_length_m(b.points());

    let at_end_a =
        meeting.measure_a <= snap_tolerance_m || meeting.measure_a >= len_a - snap_tolerance_m;
    let at_end_b =
        meeting.measure_b <= snap_tolerance_m || meeting.measure_b >= len_b - snap_tolerance_m;

    match (at_end_a, at_end_b) {
        (true, true) => IntersectionKind::YIntersection,
        (true, false) | (false, true) => IntersectionKind::TIntersection,
        (false, false) => IntersectionKind::Crossing,
    }
}

/// Snaps a meeting's coordinate to an existing trail endpoint when it
/// falls within the minimum segment length of one, avoiding near-duplicate
/// nodes downstream.
fn snap_meeting_point(
    a: &Trail,
    b: &Trail,
    meeting: &Meeting,
    min_segment_length_m: f64,
) -> TrailPoint {
    let len_a = horizontal_length_m(a.points());
    let len_b = horizontal_length_m(b.points());

    if meeting.measure_a < min_segment_length_m {
        return a.points()[0];
    }
    if meeting.measure_a > len_a - min_segment_length_m {
        return a.points()[a.points().len() - 1];
    }
    if meeting.measure_b < min_segment_length_m {
        return b.points()[0];
    }
    if meeting.measure_b > len_b - min_segment_length_m {
        return b.points()[b.points().len() - 1];
    }

    meeting.point
}

/// Records a cut measure unless it snaps to the trail's start or end.
fn record_cut(
    cuts: &mut FxHashMap<TrailId, Vec<f64>>,
    trail: &Trail,
    measure_m: f64,
    config: &SplitConfig,
) {
    let length = horizontal_length_m(trail.points());

    if measure_m < config.min_segment_length_m
        || measure_m > length - config.min_segment_length_m
    {
        // Snapped to an existing endpoint, no cut needed.
        return;
    }

    cuts.entry(trail.id()).or_default().push(measure_m);
}
