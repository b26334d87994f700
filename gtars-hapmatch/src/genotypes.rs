//! Phased biallelic genotypes, stored as sparse per-variant carrier lists.
//!
//! Haplotype `h` belongs to sample `h / 2`. Each variant keeps the sorted indices of the
//! haplotypes that carry the alternate allele, which is what the matching windows are
//! materialized from.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::consts::{ALT_ALLELE, REF_ALLELE};
use crate::distance::Allele;
use crate::errors::{HapMatchError, Result};
use crate::utils::{get_dynamic_reader, get_dynamic_writer};
use crate::windows::Window;

/// Fixed columns preceding the per-sample genotypes in a VCF data line.
const VCF_FIXED_COLUMNS: usize = 9;

/// Site-level information of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSite {
    pub chrom: String,
    pub position: u64,
    pub id: String,
    pub ref_allele: String,
    pub alt_allele: String,
}

impl VariantSite {
    pub fn new(chrom: &str, position: u64) -> Self {
        Self {
            chrom: chrom.to_string(),
            position,
            id: ".".to_string(),
            ref_allele: "A".to_string(),
            alt_allele: "G".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenotypeMatrix {
    samples: Vec<String>,
    sites: Vec<VariantSite>,
    carriers: Vec<Vec<u32>>,
}

impl GenotypeMatrix {
    ///
    /// Build a matrix from dense haplotypes (one vector per haplotype, one entry per site).
    ///
    pub fn from_haplotypes(
        samples: Vec<String>,
        sites: Vec<VariantSite>,
        haplotypes: &[Vec<Allele>],
    ) -> Result<Self> {
        if haplotypes.len() != samples.len() * 2 {
            return Err(HapMatchError::DimensionMismatch {
                expected: samples.len() * 2,
                found: haplotypes.len(),
            });
        }
        if let Some(bad) = haplotypes.iter().find(|h| h.len() != sites.len()) {
            return Err(HapMatchError::DimensionMismatch {
                expected: sites.len(),
                found: bad.len(),
            });
        }

        let carriers = (0..sites.len())
            .map(|variant| {
                haplotypes
                    .iter()
                    .enumerate()
                    .filter(|(_, hap)| hap[variant] == ALT_ALLELE)
                    .map(|(h, _)| h as u32)
                    .collect()
            })
            .collect();

        Ok(Self {
            samples,
            sites,
            carriers,
        })
    }

    ///
    /// Read a phased VCF (optionally gzipped).
    ///
    /// `GT` must be the first FORMAT key and every sample must be diploid. Missing alleles
    /// (`.`) are read as reference.
    ///
    /// # Arguments
    /// - path: path to the VCF file
    ///
    pub fn from_vcf(path: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(path)?;

        let mut samples: Option<Vec<String>> = None;
        let mut sites = Vec::new();
        let mut carriers = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;

            if line.starts_with("##") || line.trim().is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('#') {
                let names = header
                    .split('\t')
                    .skip(VCF_FIXED_COLUMNS)
                    .map(|s| s.to_string())
                    .collect();
                samples = Some(names);
                continue;
            }

            let num_samples = match samples.as_ref() {
                Some(names) => names.len(),
                None => {
                    return Err(parse_error(line_no, "data line before the #CHROM header"));
                }
            };

            let (site, alt_carriers) = parse_vcf_record(&line, num_samples, line_no)?;
            sites.push(site);
            carriers.push(alt_carriers);
        }

        let samples = samples.ok_or_else(|| parse_error(0, "missing #CHROM header"))?;
        log::debug!(
            "Read {} variants for {} samples from {:?}",
            sites.len(),
            samples.len(),
            path
        );

        Ok(Self {
            samples,
            sites,
            carriers,
        })
    }

    ///
    /// Write the matrix as a phased VCF (gzipped if `path` ends in `.gz`).
    ///
    pub fn to_vcf(&self, path: &Path) -> Result<()> {
        let mut writer = get_dynamic_writer(path)?;

        writeln!(writer, "##fileformat=VCFv4.2")?;
        writeln!(
            writer,
            "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">"
        )?;
        write!(writer, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT")?;
        for sample in &self.samples {
            write!(writer, "\t{}", sample)?;
        }
        writeln!(writer)?;

        let mut dense = vec![REF_ALLELE; self.num_haplotypes()];
        for (site, alt_carriers) in self.sites.iter().zip(&self.carriers) {
            dense.fill(REF_ALLELE);
            for &h in alt_carriers {
                dense[h as usize] = ALT_ALLELE;
            }

            write!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t.\tPASS\t.\tGT",
                site.chrom, site.position, site.id, site.ref_allele, site.alt_allele
            )?;
            for pair in dense.chunks(2) {
                write!(writer, "\t{}|{}", pair[0], pair[1])?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn sites(&self) -> &[VariantSite] {
        &self.sites
    }

    pub fn positions(&self) -> Vec<u64> {
        self.sites.iter().map(|s| s.position).collect()
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn num_haplotypes(&self) -> usize {
        self.samples.len() * 2
    }

    pub fn num_variants(&self) -> usize {
        self.sites.len()
    }

    /// Name of the sample owning haplotype `hap`.
    pub fn sample_of(&self, hap: usize) -> &str {
        &self.samples[hap / 2]
    }

    /// Haplotypes carrying the alternate allele at `variant`, ascending.
    pub fn carriers(&self, variant: usize) -> &[u32] {
        &self.carriers[variant]
    }

    pub fn allele(&self, variant: usize, hap: usize) -> Allele {
        match self.carriers[variant].binary_search(&(hap as u32)) {
            Ok(_) => ALT_ALLELE,
            Err(_) => REF_ALLELE,
        }
    }

    pub fn set_allele(&mut self, variant: usize, hap: usize, allele: Allele) {
        let carriers = &mut self.carriers[variant];
        match (carriers.binary_search(&(hap as u32)), allele == ALT_ALLELE) {
            (Err(slot), true) => carriers.insert(slot, hap as u32),
            (Ok(slot), false) => {
                carriers.remove(slot);
            }
            _ => {}
        }
    }

    ///
    /// Materialize the dense haplotypes of a window.
    ///
    /// Returns one vector per haplotype, each of length `window.len()`. The window's end
    /// variant is not included.
    ///
    pub fn window_haplotypes(&self, window: &Window) -> Vec<Vec<Allele>> {
        let mut haplotypes = vec![vec![REF_ALLELE; window.len()]; self.num_haplotypes()];
        for (offset, variant) in window.range().enumerate() {
            for &h in &self.carriers[variant] {
                haplotypes[h as usize][offset] = ALT_ALLELE;
            }
        }
        haplotypes
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> HapMatchError {
    HapMatchError::GenotypeParse {
        line,
        message: message.into(),
    }
}

fn parse_vcf_record(
    line: &str,
    num_samples: usize,
    line_no: usize,
) -> Result<(VariantSite, Vec<u32>)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != VCF_FIXED_COLUMNS + num_samples {
        return Err(parse_error(
            line_no,
            format!(
                "expected {} columns, found {}",
                VCF_FIXED_COLUMNS + num_samples,
                fields.len()
            ),
        ));
    }

    let position = fields[1]
        .parse::<u64>()
        .map_err(|e| parse_error(line_no, format!("bad position `{}`: {}", fields[1], e)))?;

    if fields[8].split(':').next() != Some("GT") {
        return Err(parse_error(line_no, "GT must be the first FORMAT key"));
    }

    let site = VariantSite {
        chrom: fields[0].to_string(),
        position,
        id: fields[2].to_string(),
        ref_allele: fields[3].to_string(),
        alt_allele: fields[4].to_string(),
    };

    let mut alt_carriers = Vec::new();
    for (s, field) in fields[VCF_FIXED_COLUMNS..].iter().enumerate() {
        let gt = field.split(':').next().unwrap_or_default();
        let mut alleles = gt.split(['|', '/']);
        let (Some(a), Some(b), None) = (alleles.next(), alleles.next(), alleles.next()) else {
            return Err(parse_error(line_no, format!("genotype `{}` is not diploid", gt)));
        };

        for (phase, allele) in [a, b].into_iter().enumerate() {
            match allele {
                "0" | "." => {}
                "1" => alt_carriers.push((2 * s + phase) as u32),
                other => {
                    return Err(parse_error(
                        line_no,
                        format!("allele `{}` is not biallelic", other),
                    ));
                }
            }
        }
    }

    Ok((site, alt_carriers))
}
