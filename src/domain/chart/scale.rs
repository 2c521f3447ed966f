// Linear scale - maps a data domain onto a pixel range

/// A linear map from `domain` to `range`, optionally clamped to the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
    clamp: bool,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            domain,
            range,
            clamp: false,
        }
    }

    pub fn clamped(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            domain,
            range,
            clamp: true,
        }
    }

    /// Map a domain value to the range. A zero-width domain maps everything
    /// to the start of the range.
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        let mut t = if span == 0.0 { 0.0 } else { (value - d0) / span };
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        r0 + t * (r1 - r0)
    }

    /// Map a range value back into the domain.
    pub fn invert(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        let mut t = if span == 0.0 { 0.0 } else { (value - r0) / span };
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        d0 + t * (d1 - d0)
    }
}
