//! RBF kernel segment cost
//!
//! For a one-dimensional signal `s`, the Gram matrix is
//! `K[i][j] = exp(-gamma * (s[i] - s[j])^2)` with `gamma` set to the inverse
//! median pairwise squared distance. The cost of segment `[a, b)` is
//!
//! ```text
//! (b - a) - sum(K[a..b, a..b]) / (b - a)
//! ```
//!
//! which is zero for a segment of identical values and grows as the segment
//! mixes distant values. A 2-D prefix sum over `K` makes each query O(1).

/// Upper clip on `gamma * d^2`; keeps `exp` away from underflow
const MAX_SCALED_DISTANCE: f64 = 100.0;

/// Precomputed kernel cost for one signal
#[derive(Debug, Clone)]
pub struct RbfCost {
    n: usize,
    gamma: f64,
    /// `(n + 1) x (n + 1)` row-major; `prefix[i][j] = sum K[0..i, 0..j]`
    prefix: Vec<f64>,
}

impl RbfCost {
    /// Build the kernel prefix table. O(n^2) time and memory.
    pub fn new(signal: &[f64]) -> Self {
        let n = signal.len();
        let gamma = bandwidth(signal);
        let width = n + 1;
        let mut prefix = vec![0.0; width * width];

        for i in 0..n {
            let mut row_sum = 0.0;
            for j in 0..n {
                let d = signal[i] - signal[j];
                let scaled = (gamma * d * d).min(MAX_SCALED_DISTANCE);
                row_sum += (-scaled).exp();
                prefix[(i + 1) * width + (j + 1)] = prefix[i * width + (j + 1)] + row_sum;
            }
        }

        Self { n, gamma, prefix }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Sum of `K` over the square block `[a, b) x [a, b)`
    fn block_sum(&self, a: usize, b: usize) -> f64 {
        let w = self.n + 1;
        self.prefix[b * w + b] - self.prefix[a * w + b] - self.prefix[b * w + a]
            + self.prefix[a * w + a]
    }

    /// Cost of segment `[start, end)`; requires `start < end <= len()`
    pub fn error(&self, start: usize, end: usize) -> f64 {
        debug_assert!(start < end && end <= self.n);
        let len = (end - start) as f64;
        (len - self.block_sum(start, end) / len).max(0.0)
    }
}

/// `1 / median` of the pairwise squared distances, or 1 when the median is 0
fn bandwidth(signal: &[f64]) -> f64 {
    let n = signal.len();
    if n < 2 {
        return 1.0;
    }

    let mut distances = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = signal[i] - signal[j];
            distances.push(d * d);
        }
    }

    let median = median(&mut distances);
    if median > 0.0 {
        1.0 / median
    } else {
        1.0
    }
}

/// Median with even-length averaging; reorders `values`
fn median(values: &mut [f64]) -> f64 {
    let len = values.len();
    let mid = len / 2;
    let (lower, upper_mid, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper_mid = *upper_mid;
    if len % 2 == 1 {
        return upper_mid;
    }
    let lower_mid = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (lower_mid + upper_mid) / 2.0
}
