//! Distance functions over fixed-length discrete vectors.
//!
//! The [`BKTree`](crate::bktree::BKTree) only relies on the metric being symmetric and
//! satisfying the triangle inequality; [`Hamming`] is the default.

/// One entry of a discrete vector (a single marker of a haplotype).
pub type Allele = u8;

/// An integer distance between two discrete vectors.
pub type Distance = u32;

/// A metric over two equal-length discrete vectors.
pub trait Metric: Send + Sync {
    fn distance(&self, a: &[Allele], b: &[Allele]) -> Distance;
}

/// Count of positions at which two vectors differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hamming;

impl Metric for Hamming {
    #[inline]
    fn distance(&self, a: &[Allele], b: &[Allele]) -> Distance {
        hamming_distance(a, b)
    }
}

impl<F> Metric for F
where
    F: Fn(&[Allele], &[Allele]) -> Distance + Send + Sync,
{
    #[inline]
    fn distance(&self, a: &[Allele], b: &[Allele]) -> Distance {
        self(a, b)
    }
}

///
/// Hamming distance between two vectors.
///
/// Only the overlapping prefix is compared; callers are expected to have
/// checked that the lengths agree.
///
#[inline]
pub fn hamming_distance(a: &[Allele], b: &[Allele]) -> Distance {
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count() as Distance
}
