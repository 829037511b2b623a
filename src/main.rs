use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;

use rust_vcf::types::DEFAULT_ANNOTATION_KEY;
use rust_vcf::{ReaderOptions, VariantRecord, VcfRecords};

#[derive(Parser)]
#[command(version, about = "Read VCF records, optionally split into one record per ALT allele")]
struct Cli {
    // Input VCF, plain or gzip compressed
    #[arg(help = "Input VCF, or - for stdin")]
    input: PathBuf,

    // Split multiallelic records
    #[arg(short = 's', long = "split", default_value_t = false)]
    split: bool,

    // INFO key holding per-allele annotations
    #[arg(long = "annotation-key", default_value = DEFAULT_ANNOTATION_KEY)]
    annotation_key: String,

    // Only print the number of records
    #[arg(long = "count", default_value_t = false)]
    count: bool,

    // Verbosity, repeat for more
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_log(log_max_level: usize) -> Result<()> {
    stderrlog::new()
        .module(module_path!())
        .quiet(false)
        .verbosity(log_max_level)
        .timestamp(stderrlog::Timestamp::Off)
        .init()?;
    Ok(())
}

fn summary(record: &VariantRecord) -> String {
    let site = match record.variant_id() {
        Some(id) => id.to_owned(),
        None => format!(
            "{}:{} {}>{}",
            record.chrom(),
            record.pos(),
            record.ref_allele(),
            record.alt()
        ),
    };
    record
        .genotypes()
        .iter()
        .map(|(sample, call)| format!("{}={}", sample, call))
        .fold(site, |line, call| line + "\t" + &call)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_log(1 + cli.verbose as usize)?;

    let options = ReaderOptions::default()
        .with_split_variants(cli.split)
        .with_annotation_key(cli.annotation_key);
    let records = if cli.input.as_os_str() == "-" {
        VcfRecords::from_reader(Box::new(io::stdin()), options)?
    } else {
        VcfRecords::from_path(&cli.input, options)
            .with_context(|| format!("failed to open {}", cli.input.display()))?
    };
    log::info!(
        "{} samples: {}",
        records.header().samples().len(),
        records.header().samples().iter().join(",")
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut n = 0usize;
    for record in records {
        let record = record?;
        n += 1;
        if !cli.count {
            writeln!(out, "{}", summary(&record))?;
        }
    }
    if cli.count {
        writeln!(out, "{}", n)?;
    }
    log::info!("read {} records", n);
    out.flush()?;
    Ok(())
}
