// Fixed-capacity sample buffer with randomized eviction
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::num::NonZeroUsize;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer limit must be at least 1")]
    ZeroLimit,
    #[error("{len} initial items exceed the buffer limit of {limit}")]
    Overflow { len: usize, limit: usize },
}

/// A buffer that never holds more than `limit` items.
///
/// When a push overflows the buffer, one element is removed at a uniformly
/// random index that excludes the element just pushed. Over a long stream this
/// keeps a statistical sample of the whole history instead of a sliding
/// window. Removal keeps the survivors in their original order.
#[derive(Debug, Clone)]
pub struct FixedBuffer<T, R = StdRng> {
    items: Vec<T>,
    limit: usize,
    rng: R,
}

impl<T> FixedBuffer<T, StdRng> {
    pub fn new(items: Vec<T>, limit: usize) -> Result<Self, BufferError> {
        Self::with_rng(items, limit, StdRng::from_entropy())
    }

    pub fn empty(limit: NonZeroUsize) -> Self {
        Self::empty_with_rng(limit, StdRng::from_entropy())
    }

    pub fn seeded(limit: NonZeroUsize, seed: u64) -> Self {
        Self::empty_with_rng(limit, StdRng::seed_from_u64(seed))
    }
}

impl<T, R: Rng> FixedBuffer<T, R> {
    pub fn with_rng(items: Vec<T>, limit: usize, rng: R) -> Result<Self, BufferError> {
        if limit < 1 {
            return Err(BufferError::ZeroLimit);
        }
        if items.len() > limit {
            return Err(BufferError::Overflow {
                len: items.len(),
                limit,
            });
        }
        Ok(Self { items, limit, rng })
    }

    pub fn empty_with_rng(limit: NonZeroUsize, rng: R) -> Self {
        Self {
            items: Vec::new(),
            limit: limit.get(),
            rng,
        }
    }

    /// Push `datum`, evicting a random older element on overflow.
    pub fn advance_mut(&mut self, datum: T) -> &mut Self {
        self.items.push(datum);
        if self.items.len() > self.limit {
            let victim = self.rng.gen_range(0..self.items.len() - 1);
            self.items.remove(victim);
        }
        self
    }

    /// Replace the contents with `f(items)`. If `f` returns more than `limit`
    /// items only the newest `limit` are kept.
    pub fn reduce<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&[T]) -> Vec<T>,
    {
        let mut next = f(&self.items);
        if next.len() > self.limit {
            next.drain(..next.len() - self.limit);
        }
        self.items = next;
        self
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
