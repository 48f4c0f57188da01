//! Paired significance tests over aligned per-query metric series.
//!
//! Both tests consume two series of the same length whose i-th entries come
//! from the same query under two different system configurations. The
//! t-distribution and normal tail probabilities are computed in-crate
//! (incomplete beta via a continued fraction, Abramowitz-Stegun erf); no
//! statistics dependency is pulled in for two functions.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::evaluator::trainer::MetricKind;

/// Which paired test to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestKind {
    /// Paired Student's t-test.
    T,
    /// Wilcoxon signed-rank test, average ranks for tied magnitudes, zero
    /// differences ranked and kept (Pratt).
    Wilcoxon,
}

/// Outcome of one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Two-tailed p-value.
    pub p_value: f64,
    /// `p_value < alpha`.
    pub rejected: bool,
}

/// Compare two aligned metric series with the chosen paired test.
///
/// Fails with [`Error::UnalignedSeries`] when the lengths differ. With
/// fewer than two pairs, or two identical series, there is no detectable
/// difference and the p-value is 1.0.
pub fn compare(series_a: &[f64], series_b: &[f64], kind: TestKind, alpha: f64) -> Result<Comparison> {
    if series_a.len() != series_b.len() {
        return Err(Error::UnalignedSeries {
            left: series_a.len(),
            right: series_b.len(),
        });
    }
    let p_value = match kind {
        TestKind::T => paired_t_p_value(series_a, series_b),
        TestKind::Wilcoxon => wilcoxon_p_value(series_a, series_b),
    };
    Ok(Comparison {
        p_value,
        rejected: p_value < alpha,
    })
}

/// [`compare`] with the reference MAP transform applied.
///
/// When the series hold per-query AP values compared as MAP and the test is
/// the t-test, both series are first replaced by their cumulative averages
/// (the running MAP after each query). Precision, recall and the Wilcoxon
/// path compare the raw series.
pub fn compare_metric(
    series_a: &[f64],
    series_b: &[f64],
    metric: MetricKind,
    kind: TestKind,
    alpha: f64,
) -> Result<Comparison> {
    if metric == MetricKind::Map && kind == TestKind::T {
        let a = cumulative_average(series_a);
        let b = cumulative_average(series_b);
        compare(&a, &b, kind, alpha)
    } else {
        compare(series_a, series_b, kind, alpha)
    }
}

/// Running mean of a series: `out[i] = mean(series[..=i])`.
pub fn cumulative_average(series: &[f64]) -> Vec<f64> {
    let mut sum = 0.0;
    series
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            sum += v;
            sum / (i + 1) as f64
        })
        .collect()
}

fn paired_t_p_value(series_a: &[f64], series_b: &[f64]) -> f64 {
    let n = series_a.len();
    if n < 2 {
        return 1.0;
    }
    let df = n - 1;

    let diffs: Vec<f64> = series_a
        .iter()
        .zip(series_b.iter())
        .map(|(a, b)| a - b)
        .collect();
    let mean = diffs.iter().sum::<f64>() / n as f64;
    let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / df as f64;
    let se = (variance / n as f64).sqrt();
    if se == 0.0 {
        // Constant difference of zero spread: either no difference at all
        // (mean 0) or a difference the t statistic cannot scale.
        return if mean == 0.0 { 1.0 } else { 0.0 };
    }
    let t = mean / se;
    t_two_tailed_p(t.abs(), df)
}

fn wilcoxon_p_value(series_a: &[f64], series_b: &[f64]) -> f64 {
    let diffs: Vec<f64> = series_a
        .iter()
        .zip(series_b.iter())
        .map(|(a, b)| a - b)
        .collect();
    let n = diffs.len();
    if n == 0 {
        return 1.0;
    }

    // Rank |d| ascending, zeros included (Pratt), average ranks for ties.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| diffs[i].abs().total_cmp(&diffs[j].abs()));
    let mut ranks = vec![0.0; n];
    let mut tie_correction = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && diffs[order[j + 1]].abs() == diffs[order[i]].abs() {
            j += 1;
        }
        // Positions i..=j share the same magnitude: average their ranks.
        let avg_rank = (i + 1 + j + 1) as f64 / 2.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        if diffs[order[i]] != 0.0 {
            let t = (j - i + 1) as f64;
            tie_correction += t * t * t - t;
        }
        i = j + 1;
    }

    let w_plus: f64 = diffs
        .iter()
        .zip(ranks.iter())
        .filter(|(&d, _)| d > 0.0)
        .map(|(_, &r)| r)
        .sum();

    // Pratt adjustment: the zero block's ranks leave both the mean and the
    // variance of W+.
    let n_f = n as f64;
    let n0 = diffs.iter().filter(|&&d| d == 0.0).count() as f64;
    let mean = (n_f * (n_f + 1.0) - n0 * (n0 + 1.0)) / 4.0;
    let variance = (n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) - n0 * (n0 + 1.0) * (2.0 * n0 + 1.0))
        / 24.0
        - tie_correction / 48.0;
    if variance <= 0.0 {
        return 1.0;
    }

    let z = (w_plus - mean) / variance.sqrt();
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

// Tail probabilities ---------------------------------------------------------

/// Two-tailed p-value of a Student's t statistic with `df` degrees of
/// freedom, via `I_{df/(df+t^2)}(df/2, 1/2)`; normal approximation above
/// df = 100.
fn t_two_tailed_p(t_abs: f64, df: usize) -> f64 {
    if df > 100 {
        return (2.0 * (1.0 - normal_cdf(t_abs))).clamp(0.0, 1.0);
    }
    let df = df as f64;
    incomplete_beta(df / 2.0, 0.5, df / (df + t_abs * t_abs)).clamp(0.0, 1.0)
}

fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Abramowitz & Stegun 7.1.26, |error| < 1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Regularized incomplete beta function `I_x(a, b)`.
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let front =
        (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Lentz continued fraction for the incomplete beta.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 1e-12;
    const TINY: f64 = 1e-30;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let numerator = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + numerator * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + numerator / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let numerator = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + numerator * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + numerator / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Lanczos-style log-gamma (Numerical Recipes coefficients).
fn ln_gamma(x: f64) -> f64 {
    let coeffs = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut series = 1.000000000190015;
    for (i, &c) in coeffs.iter().enumerate() {
        series += c / (x + 1.0 + i as f64);
    }
    -tmp + (2.5066282746310005 * series / x).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identical_series_are_never_rejected() {
        let series = vec![0.41, 0.38, 0.52, 0.47, 0.33, 0.45];
        for kind in [TestKind::T, TestKind::Wilcoxon] {
            let result = compare(&series, &series, kind, 0.05).unwrap();
            assert!(!result.rejected, "{kind:?} rejected identical series");
            assert_relative_eq!(result.p_value, 1.0);
        }
        // Any reasonable alpha, same conclusion.
        let result = compare(&series, &series, TestKind::T, 0.5).unwrap();
        assert!(!result.rejected);
    }

    #[test]
    fn unaligned_series_are_an_error() {
        assert_eq!(
            compare(&[0.1, 0.2], &[0.1], TestKind::T, 0.05),
            Err(Error::UnalignedSeries { left: 2, right: 1 })
        );
    }

    #[test]
    fn t_test_detects_a_clear_paired_shift() {
        let a = vec![0.90, 0.92, 0.88, 0.91, 0.89, 0.93, 0.87, 0.90];
        let b = vec![0.70, 0.72, 0.68, 0.71, 0.69, 0.73, 0.67, 0.70];
        let result = compare(&a, &b, TestKind::T, 0.05).unwrap();
        assert!(result.rejected);
        assert!(result.p_value < 0.001);
    }

    #[test]
    fn t_test_ignores_noise_level_differences() {
        let a = vec![0.85, 0.87, 0.86, 0.84, 0.85];
        let b = vec![0.84, 0.86, 0.87, 0.85, 0.86];
        let result = compare(&a, &b, TestKind::T, 0.05).unwrap();
        assert!(!result.rejected);
    }

    #[test]
    fn t_test_is_symmetric_in_its_arguments() {
        let a = vec![0.6, 0.7, 0.65, 0.72, 0.58];
        let b = vec![0.5, 0.75, 0.6, 0.7, 0.64];
        let ab = compare(&a, &b, TestKind::T, 0.05).unwrap();
        let ba = compare(&b, &a, TestKind::T, 0.05).unwrap();
        assert_relative_eq!(ab.p_value, ba.p_value, epsilon = 1e-12);
    }

    #[test]
    fn wilcoxon_detects_consistent_positive_differences() {
        // Twelve pairs, every difference positive, no ties, no zeros:
        // W+ = 78, E[W] = 39, Var = 162.5, z ~ 3.06.
        let a: Vec<f64> = (1..=12).map(|i| 0.5 + i as f64 * 0.01).collect();
        let b = vec![0.5; 12];
        let result = compare(&a, &b, TestKind::Wilcoxon, 0.05).unwrap();
        assert!(result.rejected);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn wilcoxon_keeps_zero_differences_in_the_ranking() {
        // Half the pairs are exactly equal; the rest lean one way, but the
        // retained zero block keeps z modest.
        let a = vec![0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.52, 0.53, 0.51, 0.54];
        let b = vec![0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.50, 0.50, 0.50, 0.50];
        let result = compare(&a, &b, TestKind::Wilcoxon, 0.01).unwrap();
        assert!(result.p_value > 0.0);
        assert!(!result.rejected);
    }

    #[test]
    fn cumulative_average_is_the_running_mean() {
        let series = vec![1.0, 0.0, 0.5, 0.5];
        assert_eq!(cumulative_average(&series), vec![1.0, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn map_t_test_path_compares_running_means() {
        let a = vec![0.9, 0.1, 0.9, 0.1, 0.9, 0.1];
        let b = vec![0.1, 0.9, 0.1, 0.9, 0.1, 0.9];
        let raw = compare(&a, &b, TestKind::T, 0.05).unwrap();
        let transformed = compare_metric(&a, &b, MetricKind::Map, TestKind::T, 0.05).unwrap();
        let expected = compare(
            &cumulative_average(&a),
            &cumulative_average(&b),
            TestKind::T,
            0.05,
        )
        .unwrap();
        assert_relative_eq!(transformed.p_value, expected.p_value, epsilon = 1e-12);
        // Precision takes the raw path.
        let precision =
            compare_metric(&a, &b, MetricKind::Precision, TestKind::T, 0.05).unwrap();
        assert_relative_eq!(precision.p_value, raw.p_value, epsilon = 1e-12);
    }

    #[test]
    fn tail_helpers_match_known_values() {
        assert_relative_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-9);
        assert_relative_eq!(normal_cdf(1.96), 0.975, epsilon = 1e-3);
        // t = 2.262 at df = 9 sits on the 0.05 two-tailed boundary.
        assert_relative_eq!(t_two_tailed_p(2.262, 9), 0.05, epsilon = 1e-3);
    }
}
