// Series domain model - every configured line, indexed by variable
use super::doc::{self, Doc};
use super::fixed_buffer::{BufferError, FixedBuffer};
use super::line::{Line, LineKind, VariableConfig};
use super::point::Point;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Hard per-line memory cap; downsampling normally keeps lines far below it.
pub const DEFAULT_HISTORY_LIMIT: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(limit) => limit,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LinePair {
    measured: usize,
    desired: usize,
}

impl LinePair {
    fn get(&self, kind: LineKind) -> usize {
        match kind {
            LineKind::Measured => self.measured,
            LineKind::Desired => self.desired,
        }
    }
}

/// All chart lines, two per configured variable.
#[derive(Debug, Clone)]
pub struct Series {
    lines: Vec<Line>,
    index: HashMap<String, LinePair>,
    extent: Option<(f64, f64)>,
    rev: u64,
}

impl Series {
    pub fn from_configs(configs: &[VariableConfig]) -> Self {
        let mut series = Self::empty();
        for config in configs {
            series.push_pair(config, |_| FixedBuffer::empty(DEFAULT_HISTORY_LIMIT));
        }
        series
    }

    /// Build a series with an explicit per-line history cap. A seed makes
    /// eviction reproducible; each line derives its own stream from it.
    pub fn with_history(
        configs: &[VariableConfig],
        history_limit: usize,
        seed: Option<u64>,
    ) -> Result<Self, BufferError> {
        let limit = NonZeroUsize::new(history_limit).ok_or(BufferError::ZeroLimit)?;
        let mut series = Self::empty();
        for config in configs {
            series.push_pair(config, |slot| match seed {
                Some(seed) => FixedBuffer::empty_with_rng(
                    limit,
                    StdRng::seed_from_u64(seed.wrapping_add(slot as u64)),
                ),
                None => FixedBuffer::empty(limit),
            });
        }
        Ok(series)
    }

    fn empty() -> Self {
        Self {
            lines: Vec::new(),
            index: HashMap::new(),
            extent: None,
            rev: 0,
        }
    }

    fn push_pair<F>(&mut self, config: &VariableConfig, mut buffer: F)
    where
        F: FnMut(usize) -> FixedBuffer<Point>,
    {
        if self.index.contains_key(&config.variable) {
            tracing::warn!("Duplicate chart variable {} ignored", config.variable);
            return;
        }
        let measured = self.lines.len();
        self.lines
            .push(Line::new(config.clone(), LineKind::Measured, buffer(measured)));
        let desired = self.lines.len();
        self.lines
            .push(Line::new(config.clone(), LineKind::Desired, buffer(desired)));
        self.index
            .insert(config.variable.clone(), LinePair { measured, desired });
    }

    /// Append one reading. Unknown variables are ignored and leave the
    /// revision untouched.
    pub fn append(&mut self, timestamp: f64, value: f64, variable: &str, is_desired: bool) -> bool {
        let Some(pair) = self.index.get(variable) else {
            return false;
        };
        let slot = pair.get(LineKind::from_is_desired(is_desired));
        if !self.lines[slot].append(Point::new(timestamp, value)) {
            return false;
        }
        self.extend_extent(timestamp);
        self.rev += 1;
        true
    }

    /// Carry every line forward to `timestamp`.
    pub fn tick(&mut self, timestamp: f64) -> &mut Self {
        for line in &mut self.lines {
            line.tick(timestamp);
        }
        if let Some((min, max)) = self.extent {
            if timestamp > max {
                self.extent = Some((min, timestamp));
            }
        }
        self.rev += 1;
        self
    }

    pub fn downsample(&mut self, limit: usize) -> &mut Self {
        for line in &mut self.lines {
            line.downsample(limit);
        }
        self.rev += 1;
        self
    }

    /// Ingest a batch: sort its readings by time, append them all, then
    /// downsample, then tick to `now`.
    pub fn advance(&mut self, docs: &[Doc], now: f64, limit: usize) -> &mut Self {
        let mut readings: Vec<(&Doc, Point)> = docs
            .iter()
            .filter_map(|doc| doc::read_point(doc).map(|point| (doc, point)))
            .collect();
        readings.sort_by(|a, b| a.1.timestamp.total_cmp(&b.1.timestamp));

        for (doc, point) in readings {
            self.append(point.timestamp, point.value, &doc.variable, doc.is_desired);
        }
        self.downsample(limit);
        self.tick(now);
        self
    }

    fn extend_extent(&mut self, timestamp: f64) {
        self.extent = Some(match self.extent {
            Some((min, max)) => (min.min(timestamp), max.max(timestamp)),
            None => (timestamp, timestamp),
        });
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, variable: &str, kind: LineKind) -> Option<&Line> {
        self.index
            .get(variable)
            .map(|pair| &self.lines[pair.get(kind)])
    }

    /// Measured/desired pairs in configuration order.
    pub fn pairs(&self) -> impl Iterator<Item = (&Line, &Line)> + '_ {
        self.lines.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }

    pub fn min(&self) -> Option<f64> {
        self.extent.map(|(min, _)| min)
    }

    pub fn max(&self) -> Option<f64> {
        self.extent.map(|(_, max)| max)
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn point_count(&self) -> usize {
        self.lines.iter().map(Line::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(Line::is_empty)
    }
}

/// Shared, copy-on-write handle over a [`Series`].
///
/// Every advancing operation returns a new view when the revision moved and
/// hands back the very same allocation otherwise, so consumers can detect
/// change with [`SeriesView::same_as`].
#[derive(Debug, Clone)]
pub struct SeriesView {
    inner: Arc<Series>,
}

impl SeriesView {
    pub fn new(series: Series) -> Self {
        Self {
            inner: Arc::new(series),
        }
    }

    /// Append a single document without downsampling or ticking.
    pub fn advance(self, doc: &Doc) -> Self {
        self.apply(|series| {
            if let Some(point) = doc::read_point(doc) {
                series.append(point.timestamp, point.value, &doc.variable, doc.is_desired);
            }
        })
    }

    pub fn advance_many(self, docs: &[Doc], now: f64, limit: usize) -> Self {
        self.apply(|series| {
            series.advance(docs, now, limit);
        })
    }

    pub fn tick(self, now: f64) -> Self {
        self.apply(|series| {
            series.tick(now);
        })
    }

    fn apply<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut Series),
    {
        let mut next = Series::clone(&self.inner);
        f(&mut next);
        if next.rev() == self.inner.rev() {
            self
        } else {
            Self::new(next)
        }
    }

    pub fn same_as(&self, other: &SeriesView) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn series(&self) -> &Series {
        &self.inner
    }
}

impl std::ops::Deref for SeriesView {
    type Target = Series;

    fn deref(&self) -> &Series {
        &self.inner
    }
}
