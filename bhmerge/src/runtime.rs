use rayon::ThreadPoolBuilder;
use std::sync::Once;
use tracing::{info, warn};

// checked in order; batch schedulers export their allocation under these
const ENV_HINTS: [&str; 6] = [
    "BHMERGE_THREADS",
    "RAYON_NUM_THREADS",
    "SLURM_CPUS_PER_TASK",
    "SLURM_CPUS_ON_NODE",
    "PBS_NP",
    "OMP_NUM_THREADS",
];

#[derive(Debug, PartialEq)]
struct PoolSize {
    threads: usize,
    source: String,
}

fn positive(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|&n| n > 0)
}

fn from_env(keys: &[&str]) -> Option<PoolSize> {
    keys.iter().find_map(|&key| {
        let threads = positive(&std::env::var(key).ok()?)?;
        Some(PoolSize {
            threads,
            source: key.to_string(),
        })
    })
}

fn pool_size(requested: Option<usize>) -> PoolSize {
    if let Some(threads) = requested.filter(|&n| n > 0) {
        return PoolSize {
            threads,
            source: "--threads".to_string(),
        };
    }
    from_env(&ENV_HINTS).unwrap_or_else(|| PoolSize {
        threads: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        source: "available_parallelism".to_string(),
    })
}

/// Sizes the global rayon pool that regions are spread over when
/// `--parallel-regions` is on. Only the first call has an effect.
pub fn configure_thread_pool(requested: Option<usize>) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let size = pool_size(requested);
        match ThreadPoolBuilder::new()
            .num_threads(size.threads)
            .thread_name(|i| format!("bhmerge-region-{i}"))
            .build_global()
        {
            Ok(()) => info!(
                "[threads] region pool = {} threads (from {})",
                size.threads, size.source
            ),
            Err(err) => warn!("[threads] could not size region pool ({err}); using rayon default"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_request_wins() {
        let size = pool_size(Some(3));
        assert_eq!(size.threads, 3);
        assert_eq!(size.source, "--threads");
    }

    #[test]
    fn zero_and_garbage_are_not_hints() {
        assert_eq!(positive("0"), None);
        assert_eq!(positive("four"), None);
        assert_eq!(positive(" 8\n"), Some(8));
        assert!(from_env(&["BHMERGE_TEST_UNSET_THREAD_HINT"]).is_none());
        assert!(pool_size(Some(0)).threads >= 1);
    }
}
