//! Synthetic genotyping errors.
//!
//! Flips alleles at independent per-direction rates and records every flip, so that the
//! errors predicted by matching can later be scored against a known truth.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{ALT_ALLELE, DEFAULT_ONE_TO_ZERO, DEFAULT_ZERO_TO_ONE, REF_ALLELE};
use crate::distance::Allele;
use crate::errors::{HapMatchError, Result};
use crate::genotypes::GenotypeMatrix;
use crate::utils::{get_dynamic_reader, get_dynamic_writer};

/// One flipped allele.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedError {
    pub variant_index: usize,
    pub position: u64,
    pub hap: usize,
    pub sample_name: String,
    /// The allele before the flip.
    pub original_allele: Allele,
}

/// Per-site probabilities of flipping an allele.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipRates {
    zero_to_one: f64,
    one_to_zero: f64,
}

impl Default for FlipRates {
    fn default() -> Self {
        Self {
            zero_to_one: DEFAULT_ZERO_TO_ONE,
            one_to_zero: DEFAULT_ONE_TO_ZERO,
        }
    }
}

impl FlipRates {
    pub fn new(zero_to_one: f64, one_to_zero: f64) -> Result<Self> {
        for (name, value) in [("zero_to_one", zero_to_one), ("one_to_zero", one_to_zero)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(HapMatchError::InvalidRate { name, value });
            }
        }
        Ok(Self {
            zero_to_one,
            one_to_zero,
        })
    }

    pub fn zero_to_one(&self) -> f64 {
        self.zero_to_one
    }

    pub fn one_to_zero(&self) -> f64 {
        self.one_to_zero
    }
}

///
/// Flip alleles of `matrix` in place.
///
/// Every allele is considered independently: a reference allele flips with probability
/// `zero_to_one`, an alternate allele with probability `one_to_zero`.
///
/// # Returns
/// - every flip, ordered by variant and then haplotype
///
pub fn inject_errors<R: Rng>(
    matrix: &mut GenotypeMatrix,
    rates: FlipRates,
    rng: &mut R,
) -> Vec<InjectedError> {
    let mut edits = Vec::new();

    for variant in 0..matrix.num_variants() {
        let position = matrix.sites()[variant].position;
        for hap in 0..matrix.num_haplotypes() {
            let allele = matrix.allele(variant, hap);
            let (rate, flipped) = match allele {
                ALT_ALLELE => (rates.one_to_zero, REF_ALLELE),
                _ => (rates.zero_to_one, ALT_ALLELE),
            };
            if !rng.random_bool(rate) {
                continue;
            }

            matrix.set_allele(variant, hap, flipped);
            edits.push(InjectedError {
                variant_index: variant,
                position,
                hap,
                sample_name: matrix.sample_of(hap).to_string(),
                original_allele: allele,
            });
        }
    }

    log::info!(
        "Injected {} errors over {} variants",
        edits.len(),
        matrix.num_variants()
    );
    edits
}

///
/// Write injected errors as CSV (gzipped if `path` ends in `.gz`).
///
pub fn write_edits(path: &Path, edits: &[InjectedError]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(get_dynamic_writer(path)?);
    for edit in edits {
        writer.serialize(edit)?;
    }
    writer.flush()?;
    Ok(())
}

///
/// Read injected errors written by [`write_edits`].
///
pub fn read_edits(path: &Path) -> Result<Vec<InjectedError>> {
    let mut reader = csv::Reader::from_reader(get_dynamic_reader(path)?);
    let mut edits = Vec::new();
    for edit in reader.deserialize() {
        edits.push(edit?);
    }
    Ok(edits)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::{fixture, rstest};
    use tempfile::tempdir;

    use crate::genotypes::VariantSite;

    #[fixture]
    fn matrix() -> GenotypeMatrix {
        let samples = (0..20).map(|i| format!("s{}", i)).collect();
        let sites = (0..50).map(|i| VariantSite::new("chr2", 1_000 + 10 * i)).collect();
        let haplotypes: Vec<Vec<Allele>> = (0..40)
            .map(|h| (0..50).map(|v| ((h + v) % 3 == 0) as Allele).collect())
            .collect();
        GenotypeMatrix::from_haplotypes(samples, sites, &haplotypes).unwrap()
    }

    #[rstest]
    #[case(-0.1, 0.5)]
    #[case(0.5, 1.5)]
    #[case(f64::NAN, 0.5)]
    fn test_invalid_rates(#[case] zero_to_one: f64, #[case] one_to_zero: f64) {
        assert!(matches!(
            FlipRates::new(zero_to_one, one_to_zero),
            Err(HapMatchError::InvalidRate { .. })
        ));
    }

    #[rstest]
    fn test_zero_rates_change_nothing(matrix: GenotypeMatrix) {
        let mut noisy = matrix.clone();
        let mut rng = StdRng::seed_from_u64(1);
        let edits = inject_errors(&mut noisy, FlipRates::new(0.0, 0.0).unwrap(), &mut rng);

        assert!(edits.is_empty());
        assert_eq!(noisy, matrix);
    }

    #[rstest]
    fn test_certain_rates_flip_everything(matrix: GenotypeMatrix) {
        let mut noisy = matrix.clone();
        let mut rng = StdRng::seed_from_u64(1);
        let edits = inject_errors(&mut noisy, FlipRates::new(1.0, 1.0).unwrap(), &mut rng);

        assert_eq!(edits.len(), matrix.num_variants() * matrix.num_haplotypes());
        for edit in &edits {
            assert_eq!(matrix.allele(edit.variant_index, edit.hap), edit.original_allele);
            assert_eq!(noisy.allele(edit.variant_index, edit.hap), 1 - edit.original_allele);
        }
    }

    #[rstest]
    fn test_edits_describe_the_flips(matrix: GenotypeMatrix) {
        let mut noisy = matrix.clone();
        let mut rng = StdRng::seed_from_u64(99);
        let edits = inject_errors(&mut noisy, FlipRates::new(0.1, 0.3).unwrap(), &mut rng);
        assert!(!edits.is_empty());

        // undoing the recorded flips restores the original
        for edit in &edits {
            assert_eq!(edit.sample_name, matrix.sample_of(edit.hap));
            assert_eq!(edit.position, matrix.sites()[edit.variant_index].position);
            noisy.set_allele(edit.variant_index, edit.hap, edit.original_allele);
        }
        assert_eq!(noisy, matrix);
    }

    #[rstest]
    fn test_edits_round_trip(matrix: GenotypeMatrix) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.csv");

        let mut noisy = matrix;
        let mut rng = StdRng::seed_from_u64(5);
        let edits = inject_errors(&mut noisy, FlipRates::new(0.05, 0.05).unwrap(), &mut rng);

        write_edits(&path, &edits).unwrap();
        assert_eq!(read_edits(&path).unwrap(), edits);
    }
}
