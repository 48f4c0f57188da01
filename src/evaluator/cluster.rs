use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::evaluator::similarity::cosine_of_docs;
use crate::evaluator::weights::DocVector;

/// One k-means cluster: a centroid and the indices of its current members
/// in the caller's point slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Current centroid, same dimension as the input points.
    pub centroid: Vec<f64>,
    /// Indices into the input point slice assigned to this cluster.
    pub members: Vec<usize>,
    converged: bool,
    /// A cluster that recentered onto zero members is terminal: its centroid
    /// is frozen and it receives no further points.
    frozen: bool,
}

impl Cluster {
    fn new(centroid: Vec<f64>) -> Self {
        Cluster {
            centroid,
            members: Vec::new(),
            converged: false,
            frozen: false,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.converged
    }
}

/// Result of one k-means run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clustering {
    pub clusters: Vec<Cluster>,
    /// Fit-quality diagnostic: sum of every point's Euclidean distance to
    /// its final cluster centroid.
    pub objective: f64,
}

/// K-means clustering over document vectors.
///
/// Baseline policy, not an optimality claim: initial centroids are sampled
/// uniformly per dimension between the observed min and max (no k-means++),
/// and convergence tests exact centroid equality. Exact equality is strict
/// but well-defined here — recentering is a deterministic function of the
/// assignment, so equality is reached as soon as assignments stop changing.
#[derive(Debug)]
pub struct KMeans;

impl KMeans {
    /// Cluster `points` into `k` groups with a thread-local RNG.
    pub fn run(points: &[DocVector], k: usize) -> Result<Clustering> {
        Self::run_with_rng(points, k, &mut rand::thread_rng())
    }

    /// Deterministic variant for reproducible runs and tests.
    pub fn run_seeded(points: &[DocVector], k: usize, seed: u64) -> Result<Clustering> {
        Self::run_with_rng(points, k, &mut StdRng::seed_from_u64(seed))
    }

    fn run_with_rng<R: Rng>(points: &[DocVector], k: usize, rng: &mut R) -> Result<Clustering> {
        if points.is_empty() || k == 0 {
            return Err(Error::InvalidClusterRequest {
                points: points.len(),
                k,
            });
        }
        let dim = points[0].len();
        for p in points {
            if p.len() != dim {
                return Err(Error::DimensionMismatch {
                    left: dim,
                    right: p.len(),
                });
            }
        }

        let mut clusters = Self::choose_initial_centroids(points, k, dim, rng);
        let mut iterations = 0usize;
        while !clusters.iter().all(Cluster::is_converged) {
            Self::assign(points, &mut clusters);
            Self::recenter(points, &mut clusters);
            iterations += 1;
            debug!(
                iterations,
                converged = clusters.iter().filter(|c| c.converged).count(),
                "k-means iteration"
            );
        }

        let objective = Self::objective(points, &clusters);
        debug!(iterations, objective, "k-means converged");
        Ok(Clustering {
            clusters,
            objective,
        })
    }

    /// One centroid value per dimension, uniform between the per-dimension
    /// min and max observed across all points; independent per centroid.
    fn choose_initial_centroids<R: Rng>(
        points: &[DocVector],
        k: usize,
        dim: usize,
        rng: &mut R,
    ) -> Vec<Cluster> {
        let mut mins = vec![f64::INFINITY; dim];
        let mut maxs = vec![f64::NEG_INFINITY; dim];
        for p in points {
            for (d, &v) in p.as_slice().iter().enumerate() {
                if v < mins[d] {
                    mins[d] = v;
                }
                if v > maxs[d] {
                    maxs[d] = v;
                }
            }
        }

        (0..k)
            .map(|_| {
                let centroid = (0..dim)
                    .map(|d| rng.gen::<f64>() * (maxs[d] - mins[d]) + mins[d])
                    .collect();
                Cluster::new(centroid)
            })
            .collect()
    }

    /// Assign every point to the nearest non-frozen cluster. Distance ties
    /// keep the first cluster in enumeration order (strict `<` below).
    fn assign(points: &[DocVector], clusters: &mut [Cluster]) {
        for cluster in clusters.iter_mut() {
            cluster.members.clear();
        }
        for (idx, point) in points.iter().enumerate() {
            let mut nearest = None;
            let mut min_dist = f64::INFINITY;
            for (c, cluster) in clusters.iter().enumerate() {
                if cluster.frozen {
                    continue;
                }
                let dist = euclidean(point.as_slice(), &cluster.centroid);
                if dist < min_dist {
                    min_dist = dist;
                    nearest = Some(c);
                }
            }
            if let Some(c) = nearest {
                clusters[c].members.push(idx);
            }
        }
    }

    /// Move each centroid to the coordinate-wise mean of its members.
    /// Empty cluster: converged and frozen. Unchanged centroid: converged.
    fn recenter(points: &[DocVector], clusters: &mut [Cluster]) {
        for cluster in clusters.iter_mut() {
            if cluster.frozen {
                continue;
            }
            if cluster.members.is_empty() {
                cluster.converged = true;
                cluster.frozen = true;
                continue;
            }
            let dim = cluster.centroid.len();
            let mut mean = vec![0.0; dim];
            let n = cluster.members.len() as f64;
            for &idx in &cluster.members {
                for (d, &v) in points[idx].as_slice().iter().enumerate() {
                    mean[d] += v / n;
                }
            }
            if mean == cluster.centroid {
                cluster.converged = true;
            } else {
                cluster.centroid = mean;
            }
        }
    }

    fn objective(points: &[DocVector], clusters: &[Cluster]) -> f64 {
        clusters
            .iter()
            .map(|cluster| {
                cluster
                    .members
                    .iter()
                    .map(|&idx| euclidean(points[idx].as_slice(), &cluster.centroid))
                    .sum::<f64>()
            })
            .sum()
    }
}

#[inline]
fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Rank `candidates` by cosine similarity to `target`, best first.
///
/// The front-end of a clustering run: pick one document, order the rest of
/// the collection against it, cluster the top of that ranking. Degenerate
/// NaN similarities (a zero-norm side) are dropped from the ranking — the
/// "treat as no similarity" convention applied at this call site.
pub fn rank_similar<K: Clone>(
    target: &DocVector,
    candidates: &[(K, DocVector)],
) -> Result<Vec<(K, f64)>> {
    let mut ranked = Vec::with_capacity(candidates.len());
    for (key, vec) in candidates {
        let score = cosine_of_docs(target, vec)?;
        if !score.is_nan() {
            ranked.push((key.clone(), score));
        }
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(ranked)
}
