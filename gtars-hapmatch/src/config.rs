use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_RECORDS_OUT, DEFAULT_THREAD_COUNT, DEFAULT_WINDOW_SIZE};
use crate::errors::Result;
use crate::matching::MatchContext;
use crate::relatives::{read_sample_list, read_sample_map};

/// Settings for a matching run.
///
/// Usually read from YAML, where relative paths are resolved against the directory of the
/// config file:
///
/// ```yaml
/// genotypes: chr20.vcf.gz
/// window_size: 50000
/// relatives: relatives.tsv
/// queries: trios.txt
/// attribution: children.tsv
/// output: out/records.jsonl
/// threads: 8
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Phased VCF with the haplotypes to index and query.
    pub genotypes: PathBuf,

    /// Window span in base pairs.
    #[serde(default = "default_window_size")]
    pub window_size: u64,

    /// `sample<TAB>rel1,rel2` table of samples excluded from each sample's matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relatives: Option<PathBuf>,

    /// Samples to query, one per line. Every sample when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<PathBuf>,

    /// `sample<TAB>name1,name2` table of who a sample's predicted errors are credited to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<PathBuf>,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default = "default_threads")]
    pub threads: usize,

    #[serde(default = "default_skip_self")]
    pub skip_self: bool,
}

fn default_window_size() -> u64 {
    DEFAULT_WINDOW_SIZE
}
fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_RECORDS_OUT)
}
fn default_threads() -> usize {
    DEFAULT_THREAD_COUNT
}
fn default_skip_self() -> bool {
    true
}

impl MatchConfig {
    pub fn new(genotypes: PathBuf) -> Self {
        Self {
            genotypes,
            window_size: default_window_size(),
            relatives: None,
            queries: None,
            attribution: None,
            output: default_output(),
            threads: default_threads(),
            skip_self: default_skip_self(),
        }
    }

    /// Resolve `path` against `base_dir` unless it is absolute or empty.
    fn resolve_config_path(path: &Path, base_dir: &Path) -> PathBuf {
        if path.is_absolute() || path.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or_else(|| Path::new(""));
        config.genotypes = Self::resolve_config_path(&config.genotypes, config_dir);
        config.output = Self::resolve_config_path(&config.output, config_dir);
        for table in [
            &mut config.relatives,
            &mut config.queries,
            &mut config.attribution,
        ]
        .into_iter()
        .flatten()
        {
            *table = Self::resolve_config_path(table, config_dir);
        }

        Ok(config)
    }

    pub fn to_yaml(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the side tables named by this config.
    pub fn context(&self) -> Result<MatchContext> {
        let mut ctx = MatchContext::new().with_skip_self(self.skip_self);
        if let Some(path) = &self.relatives {
            ctx = ctx.with_relatives(read_sample_map(path)?);
        }
        if let Some(path) = &self.queries {
            ctx = ctx.with_queries(read_sample_list(path)?);
        }
        if let Some(path) = &self.attribution {
            ctx = ctx.with_attribution(read_sample_map(path)?);
        }
        Ok(ctx)
    }
}
