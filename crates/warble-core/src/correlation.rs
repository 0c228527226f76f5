//! Lag search by cross-correlation, and harmonic summation for pitch.

/// `Σ reference[i]·search[lag + i]` over `length` samples.
#[inline]
pub fn correlation(reference: &[f32], search: &[f32], length: usize, lag: usize) -> f32 {
    reference[..length]
        .iter()
        .zip(&search[lag..lag + length])
        .map(|(a, b)| a * b)
        .sum()
}

/// Number of lags in `[0, window)` that keep `length` samples inside `search`.
#[inline]
fn lag_count(search: &[f32], length: usize, window: usize) -> usize {
    window.min((search.len() + 1).saturating_sub(length))
}

/// Lag in `[0, window)` maximizing the plain cross-correlation of
/// `reference[..length]` against `search[lag..]`. The first maximum wins.
pub fn find_max_correlation(reference: &[f32], search: &[f32], length: usize, window: usize) -> usize {
    let mut best_lag = 0;
    let mut best = f32::NEG_INFINITY;
    for lag in 0..lag_count(search, length, window) {
        let corr = correlation(reference, search, length, lag);
        if corr > best {
            best = corr;
            best_lag = lag;
        }
    }
    best_lag
}

/// Like [`find_max_correlation`] but weights `reference[i]` by `i·(length - i)`,
/// so the middle of the overlap counts most and its edges not at all.
pub fn find_max_correlation_quad(
    reference: &[f32],
    search: &[f32],
    length: usize,
    window: usize,
) -> usize {
    let mut best_lag = 0;
    let mut best = f32::NEG_INFINITY;
    for lag in 0..lag_count(search, length, window) {
        let corr: f32 = reference[..length]
            .iter()
            .zip(&search[lag..lag + length])
            .enumerate()
            .map(|(i, (a, b))| a * (i * (length - i)) as f32 * b)
            .sum();
        if corr > best {
            best = corr;
            best_lag = lag;
        }
    }
    best_lag
}

/// Summation of residual harmonics for fundamental bin `freq_bin`.
///
/// Adds `residual[k·f]` for harmonics `k = 1..harmonics` and subtracts the
/// bins halfway between harmonics, `residual[⌊(k - ½)·f⌋]` for `k = 2..harmonics`.
/// Only the first `size` bins are read.
pub fn srh(residual: &[f32], size: usize, freq_bin: usize, harmonics: usize) -> f32 {
    if freq_bin == 0 {
        return f32::NEG_INFINITY;
    }
    let size = size.min(residual.len());

    let peaks = harmonics.min(size.div_ceil(freq_bin));
    let harmonic_sum: f32 = (1..peaks)
        .map(|k| k * freq_bin)
        .filter(|&bin| bin < size)
        .map(|bin| residual[bin])
        .sum();

    let between_sum: f32 = (2..harmonics)
        .map(|k| (2 * k - 1) * freq_bin / 2)
        .take_while(|&bin| bin < size)
        .map(|bin| residual[bin])
        .sum();

    harmonic_sum - between_sum
}

/// Bin in `[min_bin, max_bin)` with the largest [`srh`] score.
///
/// Returns `max_bin` when the range is empty. The first maximum wins.
pub fn srh_argmax(
    residual: &[f32],
    size: usize,
    min_bin: usize,
    max_bin: usize,
    harmonics: usize,
) -> usize {
    let mut best_bin = max_bin;
    let mut best = f32::NEG_INFINITY;
    for bin in min_bin.max(1)..max_bin {
        let score = srh(residual, size, bin, harmonics);
        if score > best {
            best = score;
            best_bin = bin;
        }
    }
    best_bin
}
