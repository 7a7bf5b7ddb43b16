//! Greedy IoU-based non-maximum suppression.
//!
//! Candidate boxes arrive from an external detection head; this module only
//! consumes and filters them. The algorithm is total and deterministic:
//! stable sort by descending score (ties keep input order), then greedy
//! keep-unless-overlapping against every already-kept box.

use serde::Deserialize;
use tracing::debug;

/// Guards the IoU denominator when both areas are zero.
const IOU_EPS: f32 = 1e-5;

/// A scored, classed candidate box. Corners are inclusive pixel edges;
/// callers supply `x2 ≥ x1`, `y2 ≥ y1`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScoredBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge (≥ x1).
    pub x2: f32,
    /// Bottom edge (≥ y1).
    pub y2: f32,
    /// Detection confidence.
    pub score: f32,
    /// Class label.
    pub class_id: u32,
}

impl ScoredBox {
    /// Inclusive pixel-edge area: `(x2−x1+1)·(y2−y1+1)`.
    #[must_use]
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1 + 1.0) * (self.y2 - self.y1 + 1.0)
    }

    /// Intersection-over-union against `other`, well-defined for
    /// degenerate boxes via the ε term.
    #[must_use]
    pub fn iou(&self, other: &Self) -> f32 {
        let iw = (self.x2.min(other.x2) - self.x1.max(other.x1) + 1.0).max(0.0);
        let ih = (self.y2.min(other.y2) - self.y1.max(other.y1) + 1.0).max(0.0);
        let inter = iw * ih;
        inter / (self.area() + other.area() - inter + IOU_EPS)
    }
}

/// Greedy suppression: keep a box iff its IoU against every already-kept
/// box is at most `iou_threshold`. Survivors come back in selection order
/// (descending score; input order among equals).
#[must_use]
pub fn suppress(boxes: &[ScoredBox], iou_threshold: f32) -> Vec<ScoredBox> {
    // Stable sort keeps first-seen-wins on score ties.
    let mut ordered: Vec<&ScoredBox> = boxes.iter().collect();
    ordered.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<ScoredBox> = Vec::new();
    for candidate in ordered {
        if kept.iter().all(|k| k.iou(candidate) <= iou_threshold) {
            kept.push(*candidate);
        }
    }

    debug!("NMS kept {} of {} boxes", kept.len(), boxes.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sb(x1: f32, y1: f32, x2: f32, y2: f32, score: f32, class_id: u32) -> ScoredBox {
        ScoredBox {
            x1,
            y1,
            x2,
            y2,
            score,
            class_id,
        }
    }

    #[test]
    fn empty_input_empty_output() {
        assert!(suppress(&[], 0.5).is_empty());
    }

    #[test]
    fn low_overlap_pair_both_kept() {
        // IoU = 36/169 ≈ 0.213 ≤ 0.3 ⇒ both survive, A first.
        let a = sb(0.0, 0.0, 10.0, 10.0, 0.9, 1);
        let b = sb(5.0, 5.0, 15.0, 15.0, 0.8, 1);
        let iou = a.iou(&b);
        assert!((iou - 36.0 / 169.0).abs() < 1e-4);

        let kept = suppress(&[a, b], 0.3);
        assert_eq!(kept, vec![a, b]);
    }

    #[test]
    fn high_overlap_drops_lower_score() {
        let a = sb(0.0, 0.0, 10.0, 10.0, 0.9, 1);
        let b = sb(1.0, 1.0, 11.0, 11.0, 0.8, 1);
        let kept = suppress(&[b, a], 0.3);
        assert_eq!(kept, vec![a]);
    }

    #[test]
    fn survivors_in_descending_score_order() {
        let boxes = [
            sb(0.0, 0.0, 4.0, 4.0, 0.5, 0),
            sb(100.0, 100.0, 104.0, 104.0, 0.9, 0),
            sb(200.0, 200.0, 204.0, 204.0, 0.7, 0),
        ];
        let kept = suppress(&boxes, 0.3);
        let scores: Vec<f32> = kept.iter().map(|b| b.score).collect();
        assert_eq!(scores, vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn score_ties_keep_input_order() {
        let first = sb(0.0, 0.0, 10.0, 10.0, 0.8, 0);
        let second = sb(0.0, 0.0, 10.0, 10.0, 0.8, 1);
        let kept = suppress(&[first, second], 0.9);
        // Identical geometry, identical score: stable sort keeps the
        // first-submitted box ahead.
        assert_eq!(kept[0].class_id, 0);
    }

    #[test]
    fn idempotent_on_own_output() {
        let boxes = [
            sb(0.0, 0.0, 10.0, 10.0, 0.9, 1),
            sb(5.0, 5.0, 15.0, 15.0, 0.8, 1),
            sb(1.0, 1.0, 11.0, 11.0, 0.85, 2),
            sb(40.0, 40.0, 50.0, 50.0, 0.6, 1),
        ];
        let once = suppress(&boxes, 0.3);
        let twice = suppress(&once, 0.3);
        assert_eq!(once, twice);
    }

    #[test]
    fn degenerate_box_has_unit_area_and_finite_iou() {
        let point = sb(3.0, 3.0, 3.0, 3.0, 0.9, 0);
        assert!((point.area() - 1.0).abs() < f32::EPSILON);
        let other = sb(3.0, 3.0, 3.0, 3.0, 0.8, 0);
        assert!(point.iou(&other).is_finite());
        // Identical unit boxes overlap fully.
        assert!(point.iou(&other) > 0.99);
    }
}
