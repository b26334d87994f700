//! Window-by-window haplotype matching.
//!
//! Every window gets its own [`BKTree`] built from all haplotypes in that window. Each
//! query haplotype is then looked up with its relatives excluded, and the matches are
//! reduced to a consensus and a list of positions where the query disagrees with it.
//! Windows share nothing, so they are processed in parallel.

use std::io::{BufRead, Write};
use std::path::Path;

use fxhash::FxHashSet as HashSet;
use indicatif::ProgressBar;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bktree::BKTree;
use crate::config::MatchConfig;
use crate::consensus::{ConsensusRecord, consensus, find_diffs};
use crate::distance::Allele;
use crate::errors::{HapMatchError, Result};
use crate::genotypes::GenotypeMatrix;
use crate::relatives::{SampleMap, attributed_names};
use crate::utils::{get_dynamic_reader, get_dynamic_writer};
use crate::windows::{Window, partition_windows};

/// Who gets queried, what each query must not match, and who gets credit for its diffs.
#[derive(Debug, Clone)]
pub struct MatchContext {
    relatives: SampleMap,
    queries: Option<HashSet<String>>,
    attribution: SampleMap,
    skip_self: bool,
}

impl Default for MatchContext {
    fn default() -> Self {
        Self {
            relatives: SampleMap::default(),
            queries: None,
            attribution: SampleMap::default(),
            skip_self: true,
        }
    }
}

impl MatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relatives(mut self, relatives: SampleMap) -> Self {
        self.relatives = relatives;
        self
    }

    /// Only query haplotypes of these samples. By default every sample is queried.
    pub fn with_queries<I: IntoIterator<Item = String>>(mut self, queries: I) -> Self {
        self.queries = Some(queries.into_iter().collect());
        self
    }

    pub fn with_attribution(mut self, attribution: SampleMap) -> Self {
        self.attribution = attribution;
        self
    }

    /// Whether a sample may match its own haplotypes. Skipped by default, otherwise every
    /// query trivially finds itself.
    pub fn with_skip_self(mut self, skip_self: bool) -> Self {
        self.skip_self = skip_self;
        self
    }

    pub fn is_query(&self, sample: &str) -> bool {
        self.queries
            .as_ref()
            .is_none_or(|queries| queries.contains(sample))
    }

    pub fn queries(&self) -> Option<&HashSet<String>> {
        self.queries.as_ref()
    }

    pub fn skip_set(&self, sample: &str) -> HashSet<String> {
        let mut skip: HashSet<String> = self
            .relatives
            .get(sample)
            .map(|relatives| relatives.iter().cloned().collect())
            .unwrap_or_default();
        if self.skip_self {
            skip.insert(sample.to_string());
        }
        skip
    }

    pub fn attributed_to(&self, sample: &str) -> Vec<String> {
        attributed_names(&self.attribution, sample)
    }
}

/// All records produced for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    pub window: Window,
    pub records: Vec<ConsensusRecord>,
}

///
/// Match every query haplotype of one window against all haplotypes of that window.
///
/// Queries for which every candidate is excluded produce no record.
///
/// # Arguments
/// - matrix: the genotypes
/// - window: the variant range to match over
/// - ctx: query selection, exclusions and attribution
///
pub fn match_window(
    matrix: &GenotypeMatrix,
    window: &Window,
    ctx: &MatchContext,
) -> Result<WindowResult> {
    let haplotypes = matrix.window_haplotypes(window);

    let mut tree: BKTree<String> = BKTree::new();
    for (h, hap) in haplotypes.iter().enumerate() {
        tree.insert([matrix.sample_of(h).to_string()], hap.clone())?;
    }
    debug!(
        "Window {}: {} haplotypes collapsed into {} nodes (depth {})",
        window.index,
        tree.num_elements(),
        tree.len(),
        tree.depth()
    );

    let mut records = Vec::new();
    for (h, query) in haplotypes.iter().enumerate() {
        let sample = matrix.sample_of(h);
        if !ctx.is_query(sample) {
            continue;
        }

        let skip = ctx.skip_set(sample);
        let mut hits = tree.lookup(query, &skip)?;
        if hits.is_empty() {
            debug!(
                "Window {}: no usable neighbor for haplotype {} ({})",
                window.index, h, sample
            );
            continue;
        }
        hits.nodes.sort_by(|a, b| a.vector().cmp(b.vector()));

        let matches: Vec<Vec<Allele>> = hits.nodes.iter().map(|n| n.vector().to_vec()).collect();
        let match_samples = hits
            .nodes
            .iter()
            .map(|n| {
                n.elements()
                    .iter()
                    .filter(|e| !skip.contains(*e))
                    .cloned()
                    .collect()
            })
            .collect();
        let consensus = consensus(&matches)?;
        let diff_markers = find_diffs(query, &consensus, window.start)?;

        records.push(ConsensusRecord {
            window: window.index,
            start_index: window.start,
            end_index: window.end,
            hap_index: h,
            sample_name: sample.to_string(),
            attributed_to: ctx.attributed_to(sample),
            query: query.clone(),
            neighborhood_size: matches.len(),
            matches,
            match_samples,
            edit_distance: hits.distance,
            consensus,
            diff_markers,
        });
    }

    Ok(WindowResult {
        window: *window,
        records,
    })
}

///
/// Match all windows in parallel on the current rayon pool.
///
/// Results come back in the order of `windows`. `progress` is ticked once per window.
///
pub fn match_windows(
    matrix: &GenotypeMatrix,
    windows: &[Window],
    ctx: &MatchContext,
    progress: Option<&ProgressBar>,
) -> Result<Vec<WindowResult>> {
    windows
        .par_iter()
        .map(|window| {
            let result = match_window(matrix, window, ctx);
            if let Some(bar) = progress {
                bar.inc(1);
            }
            result
        })
        .collect()
}

///
/// Run a full matching pass as described by `config` and write the records to
/// `config.output`.
///
/// Every requested query sample must exist in the genotypes.
///
pub fn run_match(config: &MatchConfig, progress: Option<&ProgressBar>) -> Result<Vec<WindowResult>> {
    let matrix = GenotypeMatrix::from_vcf(&config.genotypes)?;
    let ctx = config.context()?;

    if let Some(queries) = ctx.queries() {
        let known: HashSet<&str> = matrix.samples().iter().map(String::as_str).collect();
        if let Some(missing) = queries.iter().find(|q| !known.contains(q.as_str())) {
            return Err(HapMatchError::UnknownSample(missing.clone()));
        }
    }

    let windows = partition_windows(&matrix.positions(), config.window_size)?;
    log::info!(
        "Matching {} haplotypes over {} variants in {} windows",
        matrix.num_haplotypes(),
        matrix.num_variants(),
        windows.len()
    );
    if let Some(bar) = progress {
        bar.set_length(windows.len() as u64);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let results = pool.install(|| match_windows(&matrix, &windows, &ctx, progress))?;

    write_window_results(&config.output, &results)?;
    log::info!(
        "Wrote {} records to {:?}",
        results.iter().map(|r| r.records.len()).sum::<usize>(),
        config.output
    );

    Ok(results)
}

///
/// Write window results as JSON lines, one window per line.
///
pub fn write_window_results(path: &Path, results: &[WindowResult]) -> Result<()> {
    let mut writer = get_dynamic_writer(path)?;
    for result in results {
        serde_json::to_writer(&mut writer, result)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

///
/// Read window results written by [`write_window_results`].
///
pub fn read_window_results(path: &Path) -> Result<Vec<WindowResult>> {
    let reader = get_dynamic_reader(path)?;
    let mut results = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        results.push(serde_json::from_str(&line)?);
    }
    Ok(results)
}
