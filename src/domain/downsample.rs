// Downsampling - largest-triangle-one-bucket reduction for chart lines
use super::point::Point;

/// Smallest bucket used when reducing a line.
pub const MIN_BUCKET_SIZE: usize = 10;

/// Largest-Triangle-One-Bucket downsampling.
///
/// The first and last points are always kept. Interior points are split into
/// consecutive buckets of `bucket_size`; from each bucket the point with the
/// largest effective area (the triangle it forms with its immediate
/// neighbours) survives.
pub fn largest_triangle_one_bucket(points: &[Point], bucket_size: usize) -> Vec<Point> {
    let n = points.len();
    if n <= 2 || bucket_size <= 1 {
        return points.to_vec();
    }

    let mut sampled = Vec::with_capacity(2 + (n - 2).div_ceil(bucket_size));
    sampled.push(points[0]);

    let mut start = 1;
    while start < n - 1 {
        let end = (start + bucket_size).min(n - 1);
        let mut best = start;
        let mut best_area = -1.0;
        for k in start..end {
            let area = triangle_area(points[k - 1], points[k], points[k + 1]);
            if area > best_area {
                best_area = area;
                best = k;
            }
        }
        sampled.push(points[best]);
        start = end;
    }

    sampled.push(points[n - 1]);
    sampled
}

/// Reduce `points` so the result holds at most `limit` points.
///
/// The bucket size grows beyond [`MIN_BUCKET_SIZE`] when needed to meet the
/// limit. Below three points there is no interior to sample: a limit of two
/// keeps the endpoints, one keeps the newest point, zero keeps nothing.
pub fn downsample_to(points: &[Point], limit: usize) -> Vec<Point> {
    let n = points.len();
    if n <= limit {
        return points.to_vec();
    }
    match limit {
        0 => Vec::new(),
        1 => vec![points[n - 1]],
        2 => vec![points[0], points[n - 1]],
        _ => {
            let bucket_size = (n - 2).div_ceil(limit - 2).max(MIN_BUCKET_SIZE);
            largest_triangle_one_bucket(points, bucket_size)
        }
    }
}

fn triangle_area(a: Point, b: Point, c: Point) -> f64 {
    ((a.timestamp - c.timestamp) * (b.value - a.value)
        - (a.timestamp - b.timestamp) * (c.value - a.value))
        .abs()
        * 0.5
}
