//! Intersection-over-Union on two-corner boxes.

/// IoU of two boxes in `(x_min, y_min, x_max, y_max)` form.
///
/// `intersection / (area_a + area_b - intersection)`; a zero or negative
/// union yields 0.
pub fn iou(a: [f32; 4], b: [f32; 4]) -> f32 {
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);

    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;

    let union = area_a + area_b - inter;
    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}

/// Full pairwise IoU matrix: `rows[i]` against `cols[j]` at `[i][j]`.
pub fn iou_matrix(rows: &[[f32; 4]], cols: &[[f32; 4]]) -> Vec<Vec<f32>> {
    rows.iter()
        .map(|a| cols.iter().map(|b| iou(*a, *b)).collect())
        .collect()
}
