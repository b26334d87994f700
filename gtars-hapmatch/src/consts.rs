use crate::distance::Allele;

pub const HAPMATCH_CMD: &str = "hapmatch";
pub const MATCH_CMD: &str = "match";
pub const ADD_ERRORS_CMD: &str = "add-errors";
pub const COLLATE_CMD: &str = "collate";

/// Reference allele code in the binary haplotype encoding.
pub const REF_ALLELE: Allele = 0;
/// Alternate allele code. Wins consensus ties against [`REF_ALLELE`].
pub const ALT_ALLELE: Allele = 1;

pub const DEFAULT_WINDOW_SIZE: u64 = 100_000;
pub const DEFAULT_THREAD_COUNT: usize = 4;
pub const DEFAULT_RECORDS_OUT: &str = "hapmatch_records.jsonl";
pub const DEFAULT_EDITS_OUT: &str = "edits.csv";

pub const DEFAULT_ZERO_TO_ONE: f64 = 0.001;
pub const DEFAULT_ONE_TO_ZERO: f64 = 0.01;
