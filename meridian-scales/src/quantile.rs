use std::fmt::Debug;

/// A quantile scale maps a continuous domain to discrete values based on sample quantiles.
///
/// The scale is either built from a sample population, in which case breakpoints are
/// recomputed from the sample, or directly from precomputed breakpoints. A value `x` maps to
/// `range[i]` where `i` is the number of breakpoints `<= x`, so equal values always share a
/// bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileScale<R>
where
    R: Clone + Debug,
{
    breakpoints: Vec<f64>,
    range: Vec<R>,
    default: R,
}

impl<R> QuantileScale<R>
where
    R: Clone + Debug,
{
    /// Build from a sample population. Non-finite samples are ignored.
    pub fn from_sample(sample: &[f64], range: Vec<R>, default: R) -> Self {
        let mut sorted: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);
        let breakpoints = quantile_breakpoints(&sorted, range.len());
        Self {
            breakpoints,
            range,
            default,
        }
    }

    /// Build from breakpoints, which must be ascending
    pub fn from_breakpoints(breakpoints: Vec<f64>, range: Vec<R>, default: R) -> Self {
        Self {
            breakpoints,
            range,
            default,
        }
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn range(&self) -> &[R] {
        &self.range
    }

    pub fn scale(&self, value: f64) -> R {
        if !value.is_finite() || self.range.is_empty() {
            return self.default.clone();
        }
        let idx = self.breakpoints.partition_point(|t| *t <= value);
        self.range[idx.min(self.range.len() - 1)].clone()
    }
}

/// Run starts considered on each side of a breakpoint's ideal position
const CANDIDATE_WINDOW: usize = 2;

/// Compute up to `buckets - 1` breakpoints splitting `sorted` into runs of near-equal size.
///
/// Breakpoints are always the first value of a run of equal values, so a run is never split
/// across two buckets. Each breakpoint is picked among the run starts nearest its ideal
/// position `n * i / buckets`. The chosen combination has the smallest spread between the
/// largest and smallest bucket, preferring spreads no wider than a chosen breakpoint's run.
/// No bucket is empty unless `buckets` exceeds the number of distinct values, in which case
/// every run start becomes a breakpoint.
///
/// `sorted` must be ascending and free of `NaN`.
pub fn quantile_breakpoints(sorted: &[f64], buckets: usize) -> Vec<f64> {
    let n = sorted.len();
    if n == 0 || buckets <= 1 {
        return vec![];
    }

    // Positions where a new run of equal values starts
    let run_starts: Vec<usize> = (1..n).filter(|&i| sorted[i] != sorted[i - 1]).collect();
    let wanted = buckets - 1;
    if run_starts.len() <= wanted {
        return run_starts.iter().map(|&i| sorted[i]).collect();
    }

    let layers = candidate_layers(n, buckets, &run_starts);
    balanced_path(n, &run_starts, &layers)
        .into_iter()
        .map(|j| sorted[run_starts[j]])
        .collect()
}

/// Candidate run start indices for each breakpoint, ascending.
///
/// Always contains the run start closest to the ideal position (earlier run on ties) among
/// those that leave one run start per remaining breakpoint, so a valid path exists.
fn candidate_layers(n: usize, buckets: usize, run_starts: &[usize]) -> Vec<Vec<usize>> {
    let wanted = buckets - 1;
    let mut layers = Vec::with_capacity(wanted);
    let mut lo = 0;
    for i in 1..buckets {
        let target = (n * i) as f64 / buckets as f64;
        // Inclusive bound that keeps one run start available per remaining breakpoint
        let hi = run_starts.len() - 1 - (wanted - i);

        let p = run_starts.partition_point(|&start| (start as f64) < target);
        let before = p.saturating_sub(1).clamp(lo, hi);
        let after = p.clamp(lo, hi);
        let distance = |j: usize| (run_starts[j] as f64 - target).abs();
        let nearest = if distance(after) < distance(before) {
            after
        } else {
            before
        };

        let first = p.saturating_sub(CANDIDATE_WINDOW).clamp(i - 1, hi);
        let last = (p + CANDIDATE_WINDOW - 1).clamp(i - 1, hi);
        let mut layer: Vec<usize> = (first..=last).collect();
        if !layer.contains(&nearest) {
            layer.push(nearest);
            layer.sort_unstable();
        }
        layers.push(layer);
        lo = nearest + 1;
    }
    layers
}

/// Pick one candidate per layer, strictly increasing, with balanced bucket sizes.
///
/// Prefers the smallest `max - min` bucket spread among paths whose spread is within the run
/// length of some chosen breakpoint, falling back to the smallest spread overall. Ties keep
/// the earliest path found.
fn balanced_path(n: usize, run_starts: &[usize], layers: &[Vec<usize>]) -> Vec<usize> {
    let last_layer = layers.len() - 1;
    let mut sizes: Vec<usize> = layers[0].iter().map(|&j| run_starts[j]).collect();
    sizes.extend(layers[last_layer].iter().map(|&j| n - run_starts[j]));
    for pair in layers.windows(2) {
        for &a in &pair[0] {
            for &b in pair[1].iter().filter(|&&b| b > a) {
                sizes.push(run_starts[b] - run_starts[a]);
            }
        }
    }
    sizes.sort_unstable();
    sizes.dedup();

    let mut run_lengths: Vec<usize> = layers
        .iter()
        .flatten()
        .map(|&j| run_length(n, run_starts, j))
        .collect();
    run_lengths.sort_unstable();
    run_lengths.dedup();

    let mut within_run: Option<(usize, Vec<usize>)> = None;
    let mut smallest: Option<(usize, Vec<usize>)> = None;
    for &min_size in &sizes {
        if let Some((largest, path)) = min_largest_bucket(n, run_starts, layers, min_size, 0) {
            keep_smaller(&mut smallest, largest - min_size, path);
        }
        for &min_run in &run_lengths {
            let Some((largest, path)) =
                min_largest_bucket(n, run_starts, layers, min_size, min_run)
            else {
                continue;
            };
            if largest - min_size <= min_run {
                keep_smaller(&mut within_run, largest - min_size, path);
            }
        }
    }
    within_run
        .or(smallest)
        .map(|(_, path)| path)
        .unwrap_or_default()
}

fn keep_smaller(best: &mut Option<(usize, Vec<usize>)>, spread: usize, path: Vec<usize>) {
    if best.as_ref().map_or(true, |(s, _)| spread < *s) {
        *best = Some((spread, path));
    }
}

fn run_length(n: usize, run_starts: &[usize], j: usize) -> usize {
    run_starts.get(j + 1).copied().unwrap_or(n) - run_starts[j]
}

/// DP cell: largest bucket so far, predecessor candidate and its flag
type Cell = Option<(usize, usize, usize)>;

/// Smallest achievable largest bucket when every bucket holds at least `min_size` values and
/// at least one breakpoint starts a run of `min_run` or more values
fn min_largest_bucket(
    n: usize,
    run_starts: &[usize],
    layers: &[Vec<usize>],
    min_size: usize,
    min_run: usize,
) -> Option<(usize, Vec<usize>)> {
    let long_run = |j: usize| usize::from(run_length(n, run_starts, j) >= min_run);

    // Indexed by layer, candidate, then whether a long run was chosen yet
    let mut table: Vec<Vec<[Cell; 2]>> = Vec::with_capacity(layers.len());
    table.push(
        layers[0]
            .iter()
            .map(|&j| {
                let mut cells: [Cell; 2] = [None; 2];
                if run_starts[j] >= min_size {
                    cells[long_run(j)] = Some((run_starts[j], 0, 0));
                }
                cells
            })
            .collect(),
    );
    for l in 1..layers.len() {
        let row: Vec<[Cell; 2]> = layers[l]
            .iter()
            .map(|&b| {
                let mut cells: [Cell; 2] = [None; 2];
                for (k, &a) in layers[l - 1].iter().enumerate() {
                    if b <= a || run_starts[b] - run_starts[a] < min_size {
                        continue;
                    }
                    for flag in 0..2 {
                        let Some((largest, _, _)) = table[l - 1][k][flag] else {
                            continue;
                        };
                        let next = flag.max(long_run(b));
                        let largest = largest.max(run_starts[b] - run_starts[a]);
                        if cells[next].map_or(true, |(c, _, _)| largest < c) {
                            cells[next] = Some((largest, k, flag));
                        }
                    }
                }
                cells
            })
            .collect();
        table.push(row);
    }

    let last_layer = layers.len() - 1;
    let (largest, mut k) = layers[last_layer]
        .iter()
        .enumerate()
        .filter_map(|(k, &j)| {
            let (largest, _, _) = table[last_layer][k][1]?;
            let tail = n - run_starts[j];
            (tail >= min_size).then_some((largest.max(tail), k))
        })
        .min_by_key(|(largest, _)| *largest)?;

    let mut path = vec![0; layers.len()];
    let mut flag = 1;
    for l in (0..layers.len()).rev() {
        path[l] = layers[l][k];
        if let Some((_, prev, prev_flag)) = table[l][k][flag] {
            k = prev;
            flag = prev_flag;
        }
    }
    Some((largest, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    /// Bucket sizes of `sorted` under the given breakpoints
    fn bucket_sizes(sorted: &[f64], breakpoints: &[f64]) -> Vec<usize> {
        let mut sizes = vec![0; breakpoints.len() + 1];
        for v in sorted {
            sizes[breakpoints.partition_point(|t| t <= v)] += 1;
        }
        sizes
    }

    #[test]
    fn test_quantile_scale_basic() {
        let domain = vec![1.0, 1.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 5.0];
        let scale = QuantileScale::from_sample(&domain, vec!["small", "medium", "large"], "default");

        let thresholds = scale.breakpoints();
        assert_eq!(thresholds.len(), 2);
        assert_approx_eq!(f64, thresholds[0], 3.0); // [1,1,2]
        assert_approx_eq!(f64, thresholds[1], 4.0); // [3,3,3], then [4,4,5]

        assert_eq!(scale.scale(1.5), "small");
        assert_eq!(scale.scale(3.0), "medium");
        assert_eq!(scale.scale(4.5), "large");
        assert_eq!(scale.scale(f64::NAN), "default");
    }

    #[test]
    fn test_even_split() {
        let sorted: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let breakpoints = quantile_breakpoints(&sorted, 4);
        assert_eq!(breakpoints, vec![3.0, 6.0, 9.0]);
        assert_eq!(bucket_sizes(&sorted, &breakpoints), vec![3, 3, 3, 3]);
    }

    #[test]
    fn test_runs_are_never_split() {
        let sorted = vec![1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0, 4.0];
        let breakpoints = quantile_breakpoints(&sorted, 2);
        assert_eq!(breakpoints, vec![3.0]);
        assert_eq!(bucket_sizes(&sorted, &breakpoints), vec![6, 2]);

        let breakpoints = quantile_breakpoints(&sorted, 3);
        assert_eq!(breakpoints, vec![2.0, 3.0]);
        assert_eq!(bucket_sizes(&sorted, &breakpoints), vec![1, 5, 2]);
    }

    #[test]
    fn test_no_empty_buckets_with_enough_distinct_values() {
        let sorted = vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0];
        let breakpoints = quantile_breakpoints(&sorted, 4);
        assert_eq!(breakpoints, vec![1.0, 2.0, 3.0]);
        assert!(bucket_sizes(&sorted, &breakpoints).iter().all(|s| *s > 0));
    }

    #[test]
    fn test_balances_across_breakpoints() {
        // Nearest run starts alone give [1, 3, 6] and sizes [2, 2, 4, 1]
        let sorted = vec![0.0, 0.0, 1.0, 1.0, 3.0, 4.0, 4.0, 4.0, 6.0];
        let breakpoints = quantile_breakpoints(&sorted, 4);
        assert_eq!(breakpoints, vec![1.0, 4.0, 6.0]);
        assert_eq!(bucket_sizes(&sorted, &breakpoints), vec![2, 3, 3, 1]);
    }

    #[test]
    fn test_prefers_spread_within_breakpoint_run() {
        let sorted = vec![1.0, 2.0, 2.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let breakpoints = quantile_breakpoints(&sorted, 3);
        assert_eq!(breakpoints, vec![2.0, 4.0]);
        assert_eq!(bucket_sizes(&sorted, &breakpoints), vec![1, 4, 4]);
    }

    #[test]
    fn test_more_buckets_than_distinct_values() {
        let sorted = vec![5.0, 5.0, 7.0, 7.0];
        assert_eq!(quantile_breakpoints(&sorted, 6), vec![7.0]);
        assert!(quantile_breakpoints(&[], 6).is_empty());
        assert!(quantile_breakpoints(&sorted, 1).is_empty());
    }

    #[test]
    fn test_from_breakpoints() {
        let scale = QuantileScale::from_breakpoints(vec![10.0, 20.0], vec![1, 2, 3], 0);
        assert_eq!(scale.scale(9.9), 1);
        assert_eq!(scale.scale(10.0), 2);
        assert_eq!(scale.scale(25.0), 3);
    }
}
