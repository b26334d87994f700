use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use gtars_hapmatch::noise::{read_edits, write_edits};
use gtars_hapmatch::*;
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rstest::*;
use tempfile::tempdir;

#[fixture]
fn path_to_data() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

/// Six samples in two groups of identical triplets. Within a group every haplotype has two
/// exact copies; across haplotypes the distance is at least four.
#[fixture]
fn path_to_triplicates(path_to_data: PathBuf) -> PathBuf {
    path_to_data.join("triplicates.vcf")
}

#[fixture]
fn path_to_relatives(path_to_data: PathBuf) -> PathBuf {
    path_to_data.join("relatives.tsv")
}

fn record_for(results: &[WindowResult], hap: usize) -> &ConsensusRecord {
    results
        .iter()
        .flat_map(|r| &r.records)
        .find(|r| r.hap_index == hap)
        .unwrap()
}

#[rstest]
fn test_exact_match_and_tie_resolution() {
    let mut tree = BKTree::new();
    tree.insert(["A"], vec![0, 0, 0]).unwrap();
    tree.insert(["B"], vec![0, 0, 1]).unwrap();
    tree.insert(["C"], vec![1, 1, 1]).unwrap();
    let no_skip: HashSet<&str> = HashSet::new();

    let exact = tree.lookup(&[0, 0, 1], &no_skip).unwrap();
    assert_eq!(exact.distance, Some(0));
    assert_eq!(exact.nodes.len(), 1);
    assert_eq!(exact.nodes[0].elements(), &["B"]);

    let query = [0, 1, 1];
    let tied = tree.lookup(&query, &no_skip).unwrap();
    assert_eq!(tied.distance, Some(1));
    let mut names: Vec<&str> = tied.nodes.iter().flat_map(|n| n.elements()).copied().collect();
    names.sort();
    assert_eq!(names, vec!["B", "C"]);

    let consensus = consensus(&tied.vectors()).unwrap();
    assert_eq!(consensus, vec![1, 1, 1]);
    assert_eq!(find_diffs(&query, &consensus, 0).unwrap(), vec![0]);
}

#[rstest]
fn test_read_triplicates(path_to_triplicates: PathBuf) {
    let matrix = GenotypeMatrix::from_vcf(&path_to_triplicates).unwrap();
    assert_eq!(matrix.samples(), &["a1", "a2", "a3", "b1", "b2", "b3"]);
    assert_eq!(matrix.num_variants(), 8);
    assert_eq!(matrix.positions(), (1..=8).map(|i| i * 100).collect::<Vec<u64>>());

    let windows = partition_windows(&matrix.positions(), 400).unwrap();
    assert_eq!(
        windows.iter().map(|w| w.range()).collect::<Vec<_>>(),
        vec![0..4, 4..8]
    );
}

#[rstest]
fn test_clean_panel_has_no_diffs(path_to_triplicates: PathBuf) {
    let dir = tempdir().unwrap();
    let mut config = MatchConfig::new(path_to_triplicates);
    config.window_size = 400;
    config.output = dir.path().join("records.jsonl");

    let results = run_match(&config, None).unwrap();
    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.records.len(), 12);
        for record in &result.records {
            assert_eq!(record.edit_distance, Some(0));
            assert!(record.diff_markers.is_empty());
        }
    }
}

#[rstest]
fn test_relatives_are_never_matched(path_to_triplicates: PathBuf, path_to_relatives: PathBuf) {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    fs::write(
        &config_path,
        format!(
            "genotypes: {}\nwindow_size: 1000\nrelatives: {}\nqueries: queries.txt\noutput: records.jsonl\nthreads: 2\n",
            path_to_triplicates.display(),
            path_to_relatives.display()
        ),
    )
    .unwrap();
    fs::write(dir.path().join("queries.txt"), "a1\nb1\n").unwrap();

    let config = MatchConfig::from_yaml(&config_path).unwrap();
    let results = run_match(&config, None).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].records.len(), 4);

    // a1 still has a3; a1 and a2 share its node but are excluded
    let a1 = record_for(&results, 0);
    assert_eq!(a1.edit_distance, Some(0));
    assert_eq!(a1.match_samples, vec![vec!["a3"]]);

    // b1 has to fall back on the other group
    let b1_first = record_for(&results, 6);
    assert_eq!(b1_first.edit_distance, Some(4));
    assert_eq!(b1_first.matches, vec![vec![0; 8]]);
    assert_eq!(b1_first.diff_markers, vec![4, 5, 6, 7]);

    let b1_second = record_for(&results, 7);
    assert_eq!(b1_second.edit_distance, Some(4));
    assert_eq!(
        b1_second.matches,
        vec![vec![0; 8], vec![1, 1, 1, 1, 0, 0, 0, 0]]
    );
    assert_eq!(b1_second.consensus, vec![1, 1, 1, 1, 0, 0, 0, 0]);
    assert_eq!(b1_second.diff_markers, vec![2, 3, 4, 5]);

    assert_eq!(read_window_results(&config.output).unwrap(), results);
}

#[rstest]
fn test_single_flip_is_detected(path_to_triplicates: PathBuf) {
    let dir = tempdir().unwrap();
    let mut matrix = GenotypeMatrix::from_vcf(&path_to_triplicates).unwrap();
    matrix.set_allele(2, 0, 1);
    let edits = vec![InjectedError {
        variant_index: 2,
        position: 300,
        hap: 0,
        sample_name: "a1".to_string(),
        original_allele: 0,
    }];

    let noisy = dir.path().join("noisy.vcf.gz");
    matrix.to_vcf(&noisy).unwrap();

    let mut config = MatchConfig::new(noisy);
    config.window_size = 1000;
    config.output = dir.path().join("records.jsonl");
    let results = run_match(&config, None).unwrap();

    let flipped = record_for(&results, 0);
    assert_eq!(flipped.edit_distance, Some(1));
    assert_eq!(flipped.diff_markers, vec![2]);

    let summary = collate_all(&results, &edits, &SampleMap::default());
    assert_eq!(
        summary.total,
        ErrorMetrics {
            true_errors: 1,
            predicted_errors: 1,
            overlap: 1,
        }
    );
    assert_eq!(summary.total.precision(), Some(1.0));
    assert_eq!(summary.total.recall(), Some(1.0));
}

#[rstest]
fn test_attributed_flip_is_credited(path_to_triplicates: PathBuf) {
    let dir = tempdir().unwrap();
    let mut matrix = GenotypeMatrix::from_vcf(&path_to_triplicates).unwrap();
    matrix.set_allele(2, 0, 1);
    let edits = vec![InjectedError {
        variant_index: 2,
        position: 300,
        hap: 0,
        sample_name: "a1".to_string(),
        original_allele: 0,
    }];

    let noisy = dir.path().join("noisy.vcf");
    matrix.to_vcf(&noisy).unwrap();
    let attribution_path = dir.path().join("attribution.tsv");
    fs::write(&attribution_path, "a1\tb3\n").unwrap();

    let mut config = MatchConfig::new(noisy);
    config.window_size = 1000;
    config.attribution = Some(attribution_path.clone());
    config.output = dir.path().join("records.jsonl");
    let results = run_match(&config, None).unwrap();
    assert_eq!(record_for(&results, 0).attributed_to, vec!["b3"]);

    let attribution = read_sample_map(&attribution_path).unwrap();
    let summary = collate_all(&results, &edits, &attribution);
    assert_eq!(
        summary.total,
        ErrorMetrics {
            true_errors: 1,
            predicted_errors: 1,
            overlap: 1,
        }
    );
}

#[rstest]
fn test_add_errors_then_collate(path_to_triplicates: PathBuf) {
    let dir = tempdir().unwrap();
    let clean = GenotypeMatrix::from_vcf(&path_to_triplicates).unwrap();

    let mut noisy = clean.clone();
    let mut rng = StdRng::seed_from_u64(2024);
    let edits = inject_errors(&mut noisy, FlipRates::new(0.05, 0.05).unwrap(), &mut rng);

    let noisy_path = dir.path().join("noisy.vcf");
    let edits_path = dir.path().join("edits.csv");
    noisy.to_vcf(&noisy_path).unwrap();
    write_edits(&edits_path, &edits).unwrap();

    assert_eq!(GenotypeMatrix::from_vcf(&noisy_path).unwrap(), noisy);
    let edits = read_edits(&edits_path).unwrap();
    for edit in &edits {
        assert_eq!(clean.allele(edit.variant_index, edit.hap), edit.original_allele);
        assert_ne!(noisy.allele(edit.variant_index, edit.hap), edit.original_allele);
    }

    let mut config = MatchConfig::new(noisy_path);
    config.window_size = 400;
    config.output = dir.path().join("records.jsonl");
    let results = run_match(&config, None).unwrap();

    let summary = collate_all(&results, &edits, &SampleMap::default());
    assert_eq!(summary.per_window.len(), results.len());
    assert_eq!(summary.total.true_errors, edits.len());
    assert!(summary.total.overlap <= summary.total.true_errors);
    assert!(summary.total.overlap <= summary.total.predicted_errors);
}
