use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;

use gtars_hapmatch::consts::*;
use gtars_hapmatch::genotypes::GenotypeMatrix;
use gtars_hapmatch::matching::{read_window_results, run_match};
use gtars_hapmatch::noise::{FlipRates, inject_errors, read_edits, write_edits};
use gtars_hapmatch::{ErrorMetrics, MatchConfig, SampleMap, collate_all, read_sample_map};

pub fn run_hapmatch(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some((MATCH_CMD, matches)) => run_match_cmd(matches),
        Some((ADD_ERRORS_CMD, matches)) => run_add_errors(matches),
        Some((COLLATE_CMD, matches)) => run_collate(matches),
        _ => unreachable!("hapmatch subcommand not found"),
    }
}

/// Build the run config from `--config` (if given) and let explicit arguments override it.
fn match_config(matches: &ArgMatches) -> Result<MatchConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => MatchConfig::from_yaml(Path::new(path))
            .with_context(|| format!("Failed to load config file: {}", path))?,
        None => {
            let genotypes = matches
                .get_one::<String>("genotypes")
                .context("--genotypes is required without --config")?;
            MatchConfig::new(PathBuf::from(genotypes))
        }
    };

    if let Some(genotypes) = matches.get_one::<String>("genotypes") {
        config.genotypes = PathBuf::from(genotypes);
    }
    if let Some(window_size) = matches.get_one::<u64>("window-size") {
        config.window_size = *window_size;
    }
    if let Some(relatives) = matches.get_one::<String>("relatives") {
        config.relatives = Some(PathBuf::from(relatives));
    }
    if let Some(queries) = matches.get_one::<String>("queries") {
        config.queries = Some(PathBuf::from(queries));
    }
    if let Some(attribution) = matches.get_one::<String>("attribution") {
        config.attribution = Some(PathBuf::from(attribution));
    }
    if let Some(output) = matches.get_one::<String>("output") {
        config.output = PathBuf::from(output);
    }
    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.threads = *threads;
    }
    if matches.get_flag("keep-self") {
        config.skip_self = false;
    }

    Ok(config)
}

fn run_match_cmd(matches: &ArgMatches) -> Result<()> {
    let config = match_config(matches)?;

    eprintln!(
        "Matching haplotypes in {} (window size {} bp, {} threads)...",
        config.genotypes.display(),
        config.window_size,
        config.threads
    );

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} windows")?
            .progress_chars("##-"),
    );

    let results = run_match(&config, Some(&bar))?;
    bar.finish_and_clear();

    let num_records: usize = results.iter().map(|r| r.records.len()).sum();
    let num_markers: usize = results
        .iter()
        .flat_map(|r| &r.records)
        .map(|r| r.diff_markers.len())
        .sum();
    eprintln!(
        "{} windows, {} records, {} diff markers",
        results.len(),
        num_records,
        num_markers
    );
    eprintln!("Output written to {}", config.output.display());

    Ok(())
}

fn run_add_errors(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<String>("input")
        .expect("An input VCF is required");
    let output = matches
        .get_one::<String>("output")
        .expect("An output VCF is required");
    let edits_out = matches
        .get_one::<String>("edits")
        .expect("--edits has a default");

    let zero_to_one = matches
        .get_one::<f64>("zero-to-one")
        .copied()
        .unwrap_or(DEFAULT_ZERO_TO_ONE);
    let one_to_zero = matches
        .get_one::<f64>("one-to-zero")
        .copied()
        .unwrap_or(DEFAULT_ONE_TO_ZERO);
    let rates = FlipRates::new(zero_to_one, one_to_zero)?;

    let mut rng = match matches.get_one::<u64>("seed") {
        Some(seed) => StdRng::seed_from_u64(*seed),
        None => StdRng::from_os_rng(),
    };

    let mut matrix = GenotypeMatrix::from_vcf(Path::new(input))
        .with_context(|| format!("Failed to read genotypes: {}", input))?;
    let edits = inject_errors(&mut matrix, rates, &mut rng);

    matrix.to_vcf(Path::new(output))?;
    write_edits(Path::new(edits_out), &edits)?;

    eprintln!(
        "Flipped {} alleles ({} haplotypes x {} variants)",
        edits.len(),
        matrix.num_haplotypes(),
        matrix.num_variants()
    );
    eprintln!("Noisy genotypes written to {}", output);
    eprintln!("Edits written to {}", edits_out);

    Ok(())
}

fn write_metrics<W: Write>(out: &mut W, window: usize, metrics: &ErrorMetrics) -> io::Result<()> {
    writeln!(
        out,
        "{},{},{},{}",
        window, metrics.true_errors, metrics.predicted_errors, metrics.overlap
    )
}

fn run_collate(matches: &ArgMatches) -> Result<()> {
    let records = matches
        .get_one::<String>("records")
        .expect("--records is required");
    let edits = matches
        .get_one::<String>("edits")
        .expect("--edits is required");

    let results = read_window_results(Path::new(records))
        .with_context(|| format!("Failed to read records: {}", records))?;
    let edits = read_edits(Path::new(edits))
        .with_context(|| format!("Failed to read edits: {}", edits))?;

    let attribution = match matches.get_one::<String>("attribution") {
        Some(p) => read_sample_map(Path::new(p))
            .with_context(|| format!("Failed to read attribution table: {}", p))?,
        None => SampleMap::default(),
    };

    let summary = collate_all(&results, &edits, &attribution);

    let mut out: Box<dyn Write> = match matches.get_one::<String>("output") {
        Some(p) => Box::new(
            File::create(Path::new(p))
                .with_context(|| format!("Failed to create output file: {}", p))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    writeln!(out, "window,true_errors,predicted_errors,overlap")?;
    for (result, metrics) in results.iter().zip(&summary.per_window) {
        write_metrics(&mut out, result.window.index, metrics)?;
    }
    out.flush()?;

    let total = summary.total;
    eprintln!(
        "Total: {} true errors, {} predicted, {} overlapping",
        total.true_errors, total.predicted_errors, total.overlap
    );
    if let Some(precision) = total.precision() {
        eprintln!("Precision: {:.4}", precision);
    }
    if let Some(recall) = total.recall() {
        eprintln!("Recall: {:.4}", recall);
    }

    Ok(())
}
