//! Fixed-capacity sample history used by the per-household learning records.

/// Append-only ring buffer of `f32` samples.
///
/// Once full, each push overwrites the oldest sample, so memory is bounded by
/// the capacity chosen at construction. Iteration order is oldest to newest.
#[derive(Debug, Clone)]
pub struct History {
    buf: Vec<f32>,
    cap: usize,
    head: usize,
}

impl History {
    /// Creates an empty history holding at most `cap` samples.
    ///
    /// # Panics
    ///
    /// Panics if `cap` is zero.
    pub fn new(cap: usize) -> Self {
        assert!(cap > 0, "history capacity must be > 0");
        Self {
            buf: Vec::with_capacity(cap),
            cap,
            head: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Appends a sample, evicting the oldest once at capacity.
    pub fn push(&mut self, value: f32) {
        if self.buf.len() < self.cap {
            self.buf.push(value);
        } else {
            self.buf[self.head] = value;
            self.head = (self.head + 1) % self.cap;
        }
    }

    /// Samples in chronological order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let (older, newer) = self.buf.split_at(self.head);
        newer.iter().chain(older.iter()).copied()
    }

    /// Arithmetic mean, or 0.0 when empty.
    pub fn mean(&self) -> f32 {
        if self.buf.is_empty() {
            0.0
        } else {
            self.buf.iter().sum::<f32>() / self.buf.len() as f32
        }
    }

    /// Mean of the most recent `n` samples (all samples if fewer exist).
    pub fn recent_mean(&self, n: usize) -> f32 {
        let len = self.len();
        if len == 0 {
            return 0.0;
        }
        let take = n.min(len);
        let sum: f32 = self.iter().skip(len - take).sum();
        sum / take as f32
    }

    /// Ratio of the recent-half mean to the older-half mean, clamped to
    /// `[0.8, 1.2]`. Returns 1.0 with fewer than 4 samples or a near-zero
    /// older mean.
    pub fn trend(&self) -> f32 {
        let len = self.len();
        if len < 4 {
            return 1.0;
        }
        let half = len / 2;
        let older: f32 = self.iter().take(half).sum::<f32>() / half as f32;
        let newer: f32 =
            self.iter().skip(len - half).sum::<f32>() / half as f32;
        if older.abs() < 1e-3 {
            return 1.0;
        }
        (newer / older).clamp(0.8, 1.2)
    }
}
