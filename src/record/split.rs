use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::{Error, Result};
use crate::record::annotation::{self, AnnotationBlock};
use crate::record::genotype::{GenotypeCall, Separator};
use crate::record::{variant_id, Info, VariantRecord};
use crate::types::{Header, InfoNumber, Sample};

/// How the values of one INFO key are distributed over the split records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    /// The reserved annotation key: rebuilt from the allele's own entries.
    Annotation,
    /// `Number=A`
    PerAltAllele,
    /// `Number=R`
    PerAllele,
    /// Describes the whole site, copied as-is.
    Site,
}

/// The single-allele records of one multiallelic record, produced lazily.
///
/// Created by [`split`]; the source record is owned by the iterator and dropped
/// with it.
#[derive(Debug)]
pub struct SplitAlleles {
    record: VariantRecord,
    alt_alleles: Vec<String>,
    projections: Vec<(String, Projection)>,
    layout: Vec<String>,
    next: usize,
}

/// Split `record` into one record per ALT allele.
///
/// Every INFO key of the record must be declared in `header`, otherwise nothing is
/// produced and [`Error::SchemaInconsistency`] is returned.
///
/// # Examples
///
/// ```
/// use rust_vcf::record::{split, VariantRecord};
/// use rust_vcf::types::Header;
///
/// let mut header = Header::default();
/// header
///     .parse_meta_line(r#"##INFO=<ID=AF,Number=A,Type=Float,Description="Allele Frequency">"#)
///     .unwrap();
/// header
///     .parse_column_header_line("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO")
///     .unwrap();
/// let record = VariantRecord::decode("1\t10\t.\tC\tA,G\t.\tPASS\tAF=0.1,0.2", &header).unwrap();
/// let alleles: Vec<_> = split(record, &header).unwrap().collect();
/// assert_eq!(alleles.len(), 2);
/// assert_eq!(alleles[1].alt(), "G");
/// assert_eq!(alleles[1].info_values("AF").unwrap(), ["0.2"]);
/// ```
pub fn split(record: VariantRecord, header: &Header) -> Result<SplitAlleles> {
    let with_layout = !header.annotation_subfield_names().is_empty();
    let projections = record
        .info
        .keys()
        .map(|key| -> Result<(String, Projection)> {
            let number = header
                .cardinality_of(key)
                .ok_or_else(|| Error::SchemaInconsistency {
                    line: 0,
                    key: key.clone(),
                })?;
            let projection = match number {
                _ if with_layout && key == header.annotation_key() => Projection::Annotation,
                InfoNumber::AlternateAlleles => Projection::PerAltAllele,
                InfoNumber::Alleles => Projection::PerAllele,
                _ => Projection::Site,
            };
            Ok((key.clone(), projection))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SplitAlleles {
        alt_alleles: record.alt_alleles().into_iter().map(str::to_owned).collect(),
        projections,
        layout: header.annotation_subfield_names().clone(),
        record,
        next: 0,
    })
}

impl VariantRecord {
    /// Shorthand for [`split`].
    pub fn split(self, header: &Header) -> Result<SplitAlleles> {
        split(self, header)
    }
}

impl SplitAlleles {
    fn allele(&self, i: usize) -> VariantRecord {
        let source = &self.record;
        let alt = &self.alt_alleles[i];

        let ids = source.ids();
        let id = if ids.len() > i {
            ids[i].to_owned()
        } else {
            source.id.clone()
        };

        let mut annotations = AnnotationBlock::new();
        let mut info = Info::new();
        for (key, projection) in &self.projections {
            let values = &source.info[key];
            match projection {
                Projection::Annotation => {
                    if let Some(entries) = source.annotations.get(alt) {
                        info.insert(
                            key.clone(),
                            vec![annotation::encode(entries, &self.layout)],
                        );
                        annotations.insert(alt.clone(), entries.clone());
                    }
                }
                Projection::PerAltAllele => {
                    let value = values.get(i).or_else(|| values.first());
                    info.insert(key.clone(), value.into_iter().cloned().collect());
                }
                Projection::PerAllele => {
                    if let (Some(reference), Some(value)) = (values.first(), values.get(i + 1)) {
                        info.insert(key.clone(), vec![reference.clone(), value.clone()]);
                    }
                }
                Projection::Site => {
                    info.insert(key.clone(), values.clone());
                }
            }
        }

        let n_alt = self.alt_alleles.len();
        let sample_fields: IndexMap<Sample, String> = source
            .sample_fields
            .iter()
            .map(|(sample, token)| {
                (
                    sample.clone(),
                    project_sample(&source.format, token, i + 1, n_alt),
                )
            })
            .collect();
        let genotypes: IndexMap<Sample, GenotypeCall> = sample_fields
            .iter()
            .map(|(sample, token)| {
                (
                    sample.clone(),
                    GenotypeCall::from_checked_sample(source.format.as_slice(), token),
                )
            })
            .collect();

        VariantRecord {
            chrom: source.chrom.clone(),
            pos: source.pos,
            id,
            ref_allele: source.ref_allele.clone(),
            alt: alt.clone(),
            qual: source.qual,
            filter: source.filter.clone(),
            format: source.format.clone(),
            info,
            annotations,
            sample_fields,
            genotypes,
            variant_id: Some(variant_id(&source.chrom, source.pos, &source.ref_allele, alt)),
        }
    }
}

impl Iterator for SplitAlleles {
    type Item = VariantRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.alt_alleles.len() {
            return None;
        }
        let record = self.allele(self.next);
        self.next += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.alt_alleles.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SplitAlleles {}

/// Rewrite one sample column relative to ALT allele `allele` (1-based allele index).
fn project_sample(format: &[String], token: &str, allele: usize, n_alt: usize) -> String {
    let ploidy = format
        .iter()
        .position(|key| key == "GT")
        .and_then(|i| token.split(':').nth(i))
        .map(|gt| if Separator::of(gt).is_some() { 2 } else { 1 })
        .unwrap_or(2);
    token
        .split(':')
        .enumerate()
        .map(|(i, value)| match format.get(i).map(String::as_str) {
            Some("GT") => project_gt(value, allele),
            Some("AD") => project_per_allele(value, allele, n_alt),
            Some("PL") | Some("GL") => project_per_genotype(value, allele, n_alt, ploidy),
            _ => value.to_owned(),
        })
        .join(":")
}

/// The allele itself becomes `1`, the reference and every other ALT allele `0`.
fn project_gt(gt: &str, allele: usize) -> String {
    let target = allele.to_string();
    let recode = |index: &str| match index {
        "." => ".",
        _ if index == target => "1",
        _ => "0",
    };
    let projected = match Separator::of(gt) {
        Some(separator) => gt
            .split(separator.as_char())
            .map(recode)
            .join(&separator.as_char().to_string()),
        None => recode(gt).to_owned(),
    };
    if projected.is_empty() {
        ".".to_owned()
    } else {
        projected
    }
}

fn project_per_allele(value: &str, allele: usize, n_alt: usize) -> String {
    let values = value.split(',').collect_vec();
    if values.len() != n_alt + 1 {
        return value.to_owned();
    }
    [values[0], values[allele]].join(",")
}

/// Genotype `j/k` (`j <= k`) is stored at `k * (k + 1) / 2 + j`.
fn project_per_genotype(value: &str, allele: usize, n_alt: usize, ploidy: usize) -> String {
    let values = value.split(',').collect_vec();
    let n_alleles = n_alt + 1;
    let indices = match ploidy {
        1 if values.len() == n_alleles => vec![0, allele],
        2 if values.len() == n_alleles * (n_alleles + 1) / 2 => {
            let het = allele * (allele + 1) / 2;
            vec![0, het, het + allele]
        }
        _ => return value.to_owned(),
    };
    indices.into_iter().map(|i| values[i]).join(",")
}
