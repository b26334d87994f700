//! Nearest-neighbor haplotype matching for detecting genotyping errors.
//!
//! This crate splits phased genotypes into genomic windows, indexes every haplotype of a
//! window in a BK-tree, and looks up each query haplotype's closest unrelated neighbors
//! under Hamming distance. Where the query disagrees with the consensus of its neighbors,
//! a likely genotyping error is flagged. It is part of the [gtars](https://github.com/databio/gtars)
//! project.
//!
//! ## Features
//!
//! - **Exact nearest neighbors**: [`BKTree`] lookups return every vector tied at the minimum
//!   distance, skipping nodes whose elements are all excluded
//! - **Pluggable metrics**: anything implementing [`Metric`] (closures included) can drive the tree
//! - **Parallel windows**: windows are matched independently on a rayon pool
//! - **Error simulation**: inject allele flips at known rates and score predictions against them
//!
//! ## Quick Start
//!
//! ```rust
//! use gtars_hapmatch::{consensus, find_diffs, BKTree};
//! use std::collections::HashSet;
//!
//! let mut tree = BKTree::new();
//! tree.insert(["mom"], vec![0, 1, 1, 0]).unwrap();
//! tree.insert(["dad"], vec![0, 1, 1, 0]).unwrap();
//! tree.insert(["aunt"], vec![1, 0, 0, 0]).unwrap();
//!
//! let query = [0, 1, 0, 0];
//! let hits = tree.lookup(&query, &HashSet::new()).unwrap();
//! assert_eq!(hits.distance, Some(1));
//!
//! let consensus = consensus(&hits.vectors()).unwrap();
//! assert_eq!(find_diffs(&query, &consensus, 0).unwrap(), vec![2]);
//! ```

pub mod bktree;
pub mod collate;
pub mod config;
pub mod consensus;
pub mod consts;
pub mod distance;
pub mod errors;
pub mod genotypes;
pub mod matching;
pub mod noise;
pub mod relatives;
pub mod utils;
pub mod windows;

// re-exports
pub use self::bktree::{BKTree, BKTreeNode, Insertion, Lookup};
pub use self::collate::{CollateSummary, ErrorMetrics, collate_all, collate_window};
pub use self::config::MatchConfig;
pub use self::consensus::{ConsensusRecord, consensus, find_diffs};
pub use self::distance::{Allele, Distance, Hamming, Metric, hamming_distance};
pub use self::errors::{HapMatchError, Result};
pub use self::genotypes::{GenotypeMatrix, VariantSite};
pub use self::matching::{
    MatchContext, WindowResult, match_window, match_windows, read_window_results, run_match,
    write_window_results,
};
pub use self::noise::{FlipRates, InjectedError, inject_errors};
pub use self::relatives::{SampleMap, read_sample_list, read_sample_map};
pub use self::windows::{Window, partition_windows};
