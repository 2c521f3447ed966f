// Line domain model - one time-ordered sample sequence per (variable, kind)
use super::downsample::downsample_to;
use super::fixed_buffer::FixedBuffer;
use super::point::Point;

/// Whether a line carries sensor readings or control setpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Measured,
    Desired,
}

impl LineKind {
    pub fn from_is_desired(is_desired: bool) -> Self {
        if is_desired { Self::Desired } else { Self::Measured }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Measured => "measured",
            Self::Desired => "desired",
        }
    }
}

/// Static description of one charted variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableConfig {
    pub variable: String,
    pub title: String,
    pub unit: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub color: String,
}

impl VariableConfig {
    /// Fixed y-axis domain, present only when both bounds are configured.
    pub fn fixed_domain(&self) -> Option<(f64, f64)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Line {
    config: VariableConfig,
    kind: LineKind,
    points: FixedBuffer<Point>,
}

impl Line {
    pub fn new(config: VariableConfig, kind: LineKind, points: FixedBuffer<Point>) -> Self {
        Self {
            config,
            kind,
            points,
        }
    }

    /// Append a point. Returns false (and changes nothing) unless the point is
    /// strictly later than the current last point.
    pub fn append(&mut self, point: Point) -> bool {
        if let Some(last) = self.points.last() {
            if point.timestamp <= last.timestamp {
                return false;
            }
        }
        self.points.advance_mut(point);
        true
    }

    /// Extend the last value to `timestamp` when it is strictly later.
    pub fn tick(&mut self, timestamp: f64) -> bool {
        match self.points.last().copied() {
            Some(last) if last.timestamp < timestamp => {
                let carried = last.carry_forward(timestamp);
                self.points.advance_mut(carried);
                true
            }
            _ => false,
        }
    }

    /// Reduce the line to at most `limit` points once it grows past `limit`.
    pub fn downsample(&mut self, limit: usize) -> bool {
        if self.points.len() <= limit {
            return false;
        }
        self.points.reduce(|points| downsample_to(points, limit));
        true
    }

    pub fn points(&self) -> &[Point] {
        self.points.as_slice()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn config(&self) -> &VariableConfig {
        &self.config
    }

    pub fn variable(&self) -> &str {
        &self.config.variable
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    pub fn unit(&self) -> &str {
        &self.config.unit
    }

    pub fn color(&self) -> &str {
        &self.config.color
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::num::NonZeroUsize;

    pub(crate) fn air_temperature() -> VariableConfig {
        VariableConfig {
            variable: "air_temperature".to_string(),
            title: "Air".to_string(),
            unit: "°".to_string(),
            min: None,
            max: None,
            color: "#fff".to_string(),
        }
    }

    fn line(history: usize) -> Line {
        Line::new(
            air_temperature(),
            LineKind::Measured,
            FixedBuffer::seeded(NonZeroUsize::new(history).unwrap(), 3),
        )
    }

    #[test]
    fn test_append_rejects_stale_points() {
        let mut line = line(100);
        assert!(line.append(Point::new(50.0, 1.0)));
        assert!(!line.append(Point::new(10.0, 2.0)));
        assert!(!line.append(Point::new(50.0, 3.0)));
        assert_eq!(line.points(), &[Point::new(50.0, 1.0)]);
    }

    #[test]
    fn test_tick_is_idempotent() {
        let mut line = line(100);
        assert!(!line.tick(100.0));

        line.append(Point::new(10.0, 4.0));
        assert!(line.tick(100.0));
        let once = line.points().to_vec();
        assert!(!line.tick(100.0));
        assert_eq!(line.points(), once.as_slice());
        assert_eq!(once.last(), Some(&Point::new(100.0, 4.0)));
    }

    #[test]
    fn test_downsample_only_past_limit() {
        let mut line = line(10_000);
        for i in 0..600 {
            line.append(Point::new(i as f64, (i % 7) as f64));
        }
        assert!(!line.downsample(600));
        assert!(line.downsample(500));
        assert!(line.len() <= 500);
        assert_eq!(line.points().first().map(|p| p.timestamp), Some(0.0));
        assert_eq!(line.points().last().map(|p| p.timestamp), Some(599.0));
    }

    #[test]
    fn test_fixed_domain_requires_both_bounds() {
        let mut config = air_temperature();
        assert_eq!(config.fixed_domain(), None);
        config.min = Some(0.0);
        assert_eq!(config.fixed_domain(), None);
        config.max = Some(40.0);
        assert_eq!(config.fixed_domain(), Some((0.0, 40.0)));
    }

    proptest! {
        #[test]
        fn prop_append_keeps_timestamps_increasing(
            stamps in proptest::collection::vec(0u32..1_000, 0..300),
        ) {
            let mut line = line(64);
            for stamp in stamps {
                let before = line.len();
                let last = line.points().last().map(|p| p.timestamp);
                let accepted = line.append(Point::new(stamp as f64, 0.0));
                if let Some(last) = last {
                    if stamp as f64 <= last {
                        prop_assert!(!accepted);
                        prop_assert_eq!(line.len(), before);
                    }
                }
                prop_assert!(line.points().windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            }
        }
    }
}
