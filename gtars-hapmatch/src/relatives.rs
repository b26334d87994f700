//! Per-sample side tables: relatives to exclude, which samples to query, and who a
//! sample's predicted errors are credited to.
//!
//! All of them are plain text, one sample per line. Blank lines and lines starting with
//! `#` are ignored.

use std::io::BufRead;
use std::path::Path;

use fxhash::FxHashMap as HashMap;

use crate::errors::{HapMatchError, Result};
use crate::utils::get_dynamic_reader;

/// Sample name to a list of other sample names.
pub type SampleMap = HashMap<String, Vec<String>>;

///
/// Read a `sample<TAB>name1,name2,...` table.
///
/// The second column may be missing or empty, mapping the sample to nothing. A sample
/// listed twice accumulates both lists.
///
pub fn read_sample_map(path: &Path) -> Result<SampleMap> {
    let reader = get_dynamic_reader(path)?;
    let mut map = SampleMap::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t');
        let sample = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| HapMatchError::SampleTableParse {
                line: i + 1,
                message: "missing sample name".to_string(),
            })?;

        let names = fields
            .next()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        map.entry(sample.to_string()).or_default().extend(names);
    }

    Ok(map)
}

///
/// Names `sample` is credited as in an attribution table; the sample itself when absent.
///
pub fn attributed_names(attribution: &SampleMap, sample: &str) -> Vec<String> {
    match attribution.get(sample) {
        Some(names) => names.clone(),
        None => vec![sample.to_string()],
    }
}

///
/// Read one sample name per line.
///
pub fn read_sample_list(path: &Path) -> Result<Vec<String>> {
    let reader = get_dynamic_reader(path)?;
    let mut samples = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() || name.starts_with('#') {
            continue;
        }
        samples.push(name.to_string());
    }

    Ok(samples)
}
