//! Parallel-line grouping for street counting.
//!
//! Streets are drawn as bundles of long parallel strokes (centerline, edge of
//! pavement, curb). Grouping long segments by direction and perpendicular
//! distance gives a street count without reading any labels.

use super::detector::angle_difference;
use super::Segment;
use crate::config::StreetGroupingConfig;
use crate::geometry::point_to_line_distance;
use serde::Serialize;

/// Segments judged to belong to one street.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineGroup {
    /// Members, seed segment first
    pub segments: Vec<Segment>,
}

impl LineGroup {
    /// Seed segment the group was grown from.
    pub fn seed(&self) -> &Segment {
        &self.segments[0]
    }
}

/// Group parallel, nearby segments.
///
/// Segments shorter than `min_segment_length` are ignored. Each remaining
/// segment not yet grouped seeds a group and claims every later ungrouped
/// segment whose direction is within `angle_threshold` (180° wrap aware) and
/// whose midpoint lies within `distance_threshold` of the seed's infinite
/// line. A group is kept when it has at least two members, or when its seed
/// alone is at least `long_line_length` long.
pub fn group_parallel_lines(segments: &[Segment], config: &StreetGroupingConfig) -> Vec<LineGroup> {
    let candidates: Vec<&Segment> = segments
        .iter()
        .filter(|s| s.length() >= config.min_segment_length)
        .collect();

    let mut used = vec![false; candidates.len()];
    let mut groups = Vec::new();

    for i in 0..candidates.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let seed = candidates[i];
        let mut members = vec![*seed];

        for j in (i + 1)..candidates.len() {
            if used[j] {
                continue;
            }
            let other = candidates[j];
            if angle_difference(seed.angle_degrees(), other.angle_degrees()) > config.angle_threshold {
                continue;
            }
            let distance = point_to_line_distance(&other.midpoint(), &seed.start, &seed.end);
            if distance < config.distance_threshold {
                members.push(*other);
                used[j] = true;
            }
        }

        if members.len() >= 2 || seed.length() >= config.long_line_length {
            groups.push(LineGroup { segments: members });
        }
    }

    log::debug!("Grouped {} long segments into {} street(s)", candidates.len(), groups.len());
    groups
}
