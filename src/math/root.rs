use crate::util::Interval;

/// The maximum number of bisection steps.
const MAX_ITERATIONS: usize = 100;

/// Finds the zero crossing of a function which is non-increasing over `bracket`.
///
/// If `f` is already non-positive at `bracket.min` the lower bound is returned,
/// and if it is still non-negative at `bracket.max` the upper bound is returned.
///
/// # Parameters
/// * `bracket` - The interval to search
/// * `tolerance` - The width of the final bracket
/// * `f` - The function
pub fn bisect(bracket: Interval<f64>, tolerance: f64, f: impl Fn(f64) -> f64) -> f64 {
    if !(f(bracket.min) > 0.0) {
        return bracket.min;
    }
    if f(bracket.max) >= 0.0 {
        return bracket.max;
    }

    let mut bracket = bracket;
    for _ in 0..MAX_ITERATIONS {
        if bracket.length() <= tolerance {
            break;
        }
        let mid = bracket.midpoint();
        if f(mid) > 0.0 {
            bracket.min = mid;
        } else {
            bracket.max = mid;
        }
    }
    bracket.midpoint()
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn finds_root() {
        let root = bisect(Interval::new(0.0, 10.0), 1e-9, |x| 4.0 - x * x);
        assert_approx_eq!(root, 2.0, 1e-8);
    }

    #[test]
    fn clamps_to_bracket() {
        assert_eq!(bisect(Interval::new(1.0, 2.0), 1e-9, |_| -1.0), 1.0);
        assert_eq!(bisect(Interval::new(1.0, 2.0), 1e-9, |_| 1.0), 2.0);
        assert_eq!(bisect(Interval::new(1.0, 2.0), 1e-9, |_| f64::NEG_INFINITY), 1.0);
    }
}
