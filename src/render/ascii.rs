//! Terminal preview of a trace.

use super::polyline::TraceProjection;

/// Rasterizes `samples` onto a `columns × rows` character grid.
///
/// Each column shows the vertical span of the samples that fall in it,
/// so narrow spikes such as the R wave survive downsampling. Rows are
/// returned top to bottom; an empty trace yields a blank grid with the
/// baseline marked.
pub fn plot(samples: &[f32], columns: usize, rows: usize, gain: f64) -> Vec<String> {
    if columns == 0 || rows == 0 {
        return Vec::new();
    }

    let projection = TraceProjection {
        width: columns as f64,
        height: rows as f64,
        gain,
    };

    let mut grid = vec![vec![' '; columns]; rows];
    let baseline = (rows / 2).min(rows - 1);
    for cell in grid[baseline].iter_mut() {
        *cell = '·';
    }

    // Vertical extent covered in each column
    let mut spans: Vec<Option<(usize, usize)>> = vec![None; columns];
    for point in projection.project(samples) {
        let col = (point.x.floor() as usize).min(columns - 1);
        let row = point.y.floor().clamp(0.0, (rows - 1) as f64) as usize;
        spans[col] = Some(match spans[col] {
            Some((lo, hi)) => (lo.min(row), hi.max(row)),
            None => (row, row),
        });
    }

    // Join neighbouring columns so the trace reads as a line
    let mut previous: Option<usize> = None;
    for (col, span) in spans.iter().enumerate() {
        let Some((lo, hi)) = *span else {
            continue;
        };
        let (top, bottom) = match previous {
            Some(prev) => (lo.min(prev), hi.max(prev)),
            None => (lo, hi),
        };
        for row in grid.iter_mut().take(bottom + 1).skip(top) {
            row[col] = '█';
        }
        previous = Some((lo + hi) / 2);
    }

    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}
