use clap::{Arg, ArgAction, Command, arg, value_parser};

pub use gtars_hapmatch::consts::*;

pub fn create_hapmatch_cli() -> Command {
    Command::new(HAPMATCH_CMD)
        .author("Databio")
        .about("Flag likely genotyping errors by matching haplotypes against their nearest unrelated neighbors.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(create_match_cli())
        .subcommand(create_add_errors_cli())
        .subcommand(create_collate_cli())
}

fn create_match_cli() -> Command {
    Command::new(MATCH_CMD)
        .about("Match every query haplotype window by window and write consensus records as JSON lines.")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("YAML config file. Other arguments override its values."),
        )
        .arg(
            Arg::new("genotypes")
                .long("genotypes")
                .short('g')
                .required_unless_present("config")
                .help("Phased VCF (optionally gzipped)"),
        )
        .arg(
            Arg::new("window-size")
                .long("window-size")
                .short('w')
                .value_parser(value_parser!(u64))
                .help("Window span in base pairs"),
        )
        .arg(arg!(--relatives <relatives> "Sample to relatives table (TSV)"))
        .arg(arg!(--queries <queries> "Samples to query, one per line"))
        .arg(arg!(--attribution <attribution> "Sample to credited samples table (TSV)"))
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Output records file (.jsonl or .jsonl.gz)"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('t')
                .value_parser(value_parser!(usize))
                .help("Number of threads"),
        )
        .arg(
            Arg::new("keep-self")
                .long("keep-self")
                .action(ArgAction::SetTrue)
                .help("Allow a haplotype to match other haplotypes of its own sample"),
        )
}

fn create_add_errors_cli() -> Command {
    Command::new(ADD_ERRORS_CMD)
        .about("Flip alleles at random and record every flip.")
        .arg(Arg::new("input").required(true).help("Phased VCF to add errors to"))
        .arg(Arg::new("output").required(true).help("Where to write the noisy VCF"))
        .arg(
            Arg::new("zero-to-one")
                .long("zero-to-one")
                .short('p')
                .value_parser(value_parser!(f64))
                .help("Probability of flipping a reference allele [default: 0.001]"),
        )
        .arg(
            Arg::new("one-to-zero")
                .long("one-to-zero")
                .short('n')
                .value_parser(value_parser!(f64))
                .help("Probability of flipping an alternate allele [default: 0.01]"),
        )
        .arg(
            Arg::new("edits")
                .long("edits")
                .short('e')
                .default_value(DEFAULT_EDITS_OUT)
                .help("Where to write the list of flips (CSV)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Seed for reproducible errors"),
        )
}

fn create_collate_cli() -> Command {
    Command::new(COLLATE_CMD)
        .about("Score the errors predicted by `match` against the errors added by `add-errors`.")
        .arg(
            Arg::new("records")
                .long("records")
                .short('r')
                .required(true)
                .help("Records written by `match`"),
        )
        .arg(
            Arg::new("edits")
                .long("edits")
                .short('e')
                .required(true)
                .help("Flips written by `add-errors`"),
        )
        .arg(arg!(--attribution <attribution> "Sample to credited samples table (TSV), as given to `match`"))
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Write per-window counts here instead of stdout"),
        )
}
