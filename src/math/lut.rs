use crate::util::Interval;

/// A lookup table of equally spaced samples of a scalar function,
/// linearly interpolated between samples.
#[derive(Clone, Debug)]
pub struct LookupTable {
    range: Interval<f64>,
    step: f64,
    values: Vec<f64>,
}

impl LookupTable {
    /// Creates a lookup table from a sample function.
    ///
    /// Both ends of `range` are sampled; at least two samples are always taken.
    pub fn from_samples(range: Interval<f64>, num_samples: usize, f: impl FnMut(f64) -> f64) -> Self {
        let num_samples = usize::max(num_samples, 2);
        let step = range.length() / (num_samples - 1) as f64;
        let xs = (0..num_samples).map(|i| range.min + (i as f64) * step);
        let values = xs.map(f).collect();
        Self {
            range,
            step,
            values,
        }
    }

    /// Samples the lookup table. Values outside the range are clamped to the end samples.
    pub fn sample(&self, x: f64) -> f64 {
        let last = self.values.len() - 1;
        if !(self.step > 0.0) {
            return self.values[0];
        }
        let t = ((x - self.range.min) / self.step).clamp(0.0, last as f64);
        let idx = usize::min(t as usize, last - 1);
        let frac = t - idx as f64;
        self.values[idx] + frac * (self.values[idx + 1] - self.values[idx])
    }

    /// The range covered by the table.
    pub fn range(&self) -> Interval<f64> {
        self.range
    }

    /// The number of samples in the table.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterates over the `(x, f(x))` samples in ascending order of `x`.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, y)| (self.range.min + (i as f64) * self.step, *y))
    }
}
