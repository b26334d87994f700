//! Consensus haplotypes from nearest-neighbor matches.
//!
//! Given the vectors tied for the best distance to a query, the consensus takes the most
//! common allele at every position. A tie between reference and alternate resolves to
//! the alternate allele, biasing the consensus towards flagging potential variants.

use serde::{Deserialize, Serialize};

use crate::consts::{ALT_ALLELE, REF_ALLELE};
use crate::distance::{Allele, Distance};
use crate::errors::{HapMatchError, Result};

/// Everything learned about one query haplotype in one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusRecord {
    pub window: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub hap_index: usize,
    pub sample_name: String,
    /// Samples this record's diff markers are credited to when collating.
    pub attributed_to: Vec<String>,
    pub query: Vec<Allele>,
    pub matches: Vec<Vec<Allele>>,
    /// Owning samples of each matched vector, parallel to `matches`. Samples excluded for
    /// this query (itself, its relatives) are left out even when they share the vector.
    pub match_samples: Vec<Vec<String>>,
    pub edit_distance: Option<Distance>,
    pub consensus: Vec<Allele>,
    /// Absolute variant indices where the query disagrees with the consensus, ascending.
    pub diff_markers: Vec<usize>,
    pub neighborhood_size: usize,
}

///
/// Build the consensus vector of a set of equal-length matches.
///
/// At each position the allele with the strictly highest count wins. If the reference
/// and alternate alleles tie for the highest count the alternate allele wins. Any other
/// tie is outside the binary-allele assumption and is reported as an error.
///
/// # Arguments
/// - matches: the matched vectors, all of the same length
///
pub fn consensus<V: AsRef<[Allele]>>(matches: &[V]) -> Result<Vec<Allele>> {
    let first = matches.first().ok_or(HapMatchError::EmptyConsensus)?;
    let width = first.as_ref().len();

    if let Some(bad) = matches.iter().find(|m| m.as_ref().len() != width) {
        return Err(HapMatchError::DimensionMismatch {
            expected: width,
            found: bad.as_ref().len(),
        });
    }

    let mut counts = [0usize; 256];
    let mut result = Vec::with_capacity(width);

    for position in 0..width {
        counts.fill(0);
        for m in matches {
            counts[m.as_ref()[position] as usize] += 1;
        }
        result.push(column_winner(&counts, position)?);
    }

    Ok(result)
}

fn column_winner(counts: &[usize; 256], position: usize) -> Result<Allele> {
    let top = counts.iter().copied().max().unwrap_or(0);
    let tied: Vec<Allele> = counts
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == top)
        .map(|(allele, _)| allele as Allele)
        .collect();

    match tied.as_slice() {
        [only] => Ok(*only),
        [REF_ALLELE, ALT_ALLELE] => Ok(ALT_ALLELE),
        _ => Err(HapMatchError::AmbiguousConsensus {
            position,
            values: tied,
        }),
    }
}

///
/// Positions where `query` and `consensus` disagree, offset by `start`.
///
/// # Arguments
/// - query: the query vector
/// - consensus: the consensus vector built from the query's matches
/// - start: absolute index of the window's first variant
///
pub fn find_diffs(query: &[Allele], consensus: &[Allele], start: usize) -> Result<Vec<usize>> {
    if query.len() != consensus.len() {
        return Err(HapMatchError::DimensionMismatch {
            expected: consensus.len(),
            found: query.len(),
        });
    }

    Ok(query
        .iter()
        .zip(consensus)
        .enumerate()
        .filter(|(_, (q, c))| q != c)
        .map(|(i, _)| start + i)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(vec![vec![0], vec![1]], vec![1])]
    #[case(vec![vec![0], vec![0], vec![1]], vec![0])]
    #[case(vec![vec![1], vec![1], vec![0]], vec![1])]
    #[case(vec![vec![0, 0, 1], vec![1, 1, 1]], vec![1, 1, 1])]
    #[case(vec![vec![0, 1, 0]], vec![0, 1, 0])]
    #[case(vec![vec![0, 1], vec![0, 1], vec![1, 0], vec![1, 0]], vec![1, 1])]
    fn test_consensus(#[case] matches: Vec<Vec<Allele>>, #[case] expected: Vec<Allele>) {
        assert_eq!(consensus(&matches).unwrap(), expected);
    }

    #[rstest]
    fn test_consensus_of_slices() {
        let a: &[Allele] = &[0, 0, 1];
        let b: &[Allele] = &[1, 1, 1];
        assert_eq!(consensus(&[a, b]).unwrap(), vec![1, 1, 1]);
    }

    #[rstest]
    fn test_consensus_empty() {
        let matches: Vec<Vec<Allele>> = vec![];
        assert!(matches!(
            consensus(&matches),
            Err(HapMatchError::EmptyConsensus)
        ));
    }

    #[rstest]
    fn test_consensus_length_mismatch() {
        let matches = vec![vec![0, 1], vec![0]];
        assert!(matches!(
            consensus(&matches),
            Err(HapMatchError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[rstest]
    #[case(vec![vec![1], vec![2]], vec![1, 2])]
    #[case(vec![vec![0], vec![1], vec![2]], vec![0, 1, 2])]
    fn test_consensus_non_binary_tie(#[case] matches: Vec<Vec<Allele>>, #[case] tied: Vec<Allele>) {
        match consensus(&matches) {
            Err(HapMatchError::AmbiguousConsensus { position, values }) => {
                assert_eq!(position, 0);
                assert_eq!(values, tied);
            }
            other => panic!("expected an ambiguous consensus, got {:?}", other),
        }
    }

    #[rstest]
    fn test_consensus_non_binary_majority() {
        // a strict winner is fine even outside {0, 1}
        let matches = vec![vec![2], vec![2], vec![1]];
        assert_eq!(consensus(&matches).unwrap(), vec![2]);
    }

    #[rstest]
    fn test_find_diffs() {
        assert_eq!(find_diffs(&[0, 1, 1], &[1, 1, 1], 0).unwrap(), vec![0]);
        assert_eq!(find_diffs(&[0, 1, 0, 1], &[1, 1, 1, 1], 100).unwrap(), vec![100, 102]);
        assert_eq!(find_diffs(&[0, 1], &[0, 1], 7).unwrap(), Vec::<usize>::new());
    }

    #[rstest]
    fn test_find_diffs_length_mismatch() {
        assert!(find_diffs(&[0, 1], &[0], 0).is_err());
    }
}
