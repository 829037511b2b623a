mod annotation;
mod genotype;
mod split;

use getset::Getters;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::{Error, Result};
use crate::types::{Header, Sample};
pub use annotation::{Annotation, AnnotationBlock, ALLELE_SUBFIELD};
pub use genotype::{Depth, GenotypeCall, Separator};
pub use split::{split, SplitAlleles};

const MANDATORY_COLUMNS: usize = 8;

/// Separator of the fields composing [`VariantRecord::variant_id`].
pub const VARIANT_ID_SEPARATOR: &str = "_";

/// INFO key to values; flags map to an empty list.
pub type Info = IndexMap<String, Vec<String>>;

/// One decoded data line, or one allele of it after splitting.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct VariantRecord {
    pub(crate) chrom: String,
    #[getset(skip)]
    pub(crate) pos: u64,
    pub(crate) id: String,
    pub(crate) ref_allele: String,
    /// ALT as written; comma-separated when the record is multiallelic.
    pub(crate) alt: String,
    #[getset(skip)]
    pub(crate) qual: Option<f32>,
    pub(crate) filter: String,
    pub(crate) format: Vec<String>,
    pub(crate) info: Info,
    pub(crate) annotations: AnnotationBlock,
    /// Raw sample columns, in header order.
    pub(crate) sample_fields: IndexMap<Sample, String>,
    pub(crate) genotypes: IndexMap<Sample, GenotypeCall>,
    #[getset(skip)]
    pub(crate) variant_id: Option<String>,
}

impl VariantRecord {
    /// Decode one tab-separated data line against the header it belongs to.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_vcf::record::VariantRecord;
    /// use rust_vcf::types::Header;
    ///
    /// let mut header = Header::default();
    /// header
    ///     .parse_column_header_line("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tproband")
    ///     .unwrap();
    /// let record = VariantRecord::decode(
    ///     "1\t879537\trs1\tT\tC\t50\tPASS\tDP=12;DB\tGT:DP\t0/1:12",
    ///     &header,
    /// )
    /// .unwrap();
    /// assert_eq!(record.pos(), 879537);
    /// assert_eq!(record.variant_id(), Some("1_879537_T_C"));
    /// assert!(record.has_flag("DB"));
    /// assert!(record.genotype("proband").unwrap().het());
    /// ```
    pub fn decode(line: &str, header: &Header) -> Result<Self> {
        let columns = line.trim_end_matches(&['\r', '\n'][..]).split('\t').collect_vec();
        if columns.len() < MANDATORY_COLUMNS {
            return Err(Error::structural(
                0,
                format!(
                    "expected at least {} columns, found {}",
                    MANDATORY_COLUMNS,
                    columns.len()
                ),
            ));
        }
        let pos: u64 = columns[1]
            .parse()
            .map_err(|_| Error::structural(0, format!("invalid POS {:?}", columns[1])))?;
        let qual: Option<f32> = match columns[5] {
            "." => None,
            qual => Some(
                qual.parse()
                    .map_err(|_| Error::structural(0, format!("invalid QUAL {:?}", qual)))?,
            ),
        };
        let ref_allele = columns[3].to_owned();
        let alt = columns[4].to_owned();
        let info = decode_info(columns[7]);

        let annotations = match info.get(header.annotation_key().as_str()) {
            Some(entries) if !header.annotation_subfield_names().is_empty() => {
                annotation::decode_block(
                    entries,
                    header.annotation_subfield_names(),
                    &ref_allele,
                    &alt.split(',').collect_vec(),
                )
            }
            _ => AnnotationBlock::new(),
        };

        let format = columns
            .get(MANDATORY_COLUMNS)
            .map(|format| format.split(':').map(str::to_owned).collect_vec())
            .unwrap_or_default();
        let tokens = columns.get(MANDATORY_COLUMNS + 1..).unwrap_or(&[]);
        if tokens.len() != header.samples().len() {
            return Err(Error::structural(
                0,
                format!(
                    "header declares {} samples, found {} sample columns",
                    header.samples().len(),
                    tokens.len()
                ),
            ));
        }
        let sample_fields: IndexMap<Sample, String> = header
            .samples()
            .iter()
            .cloned()
            .zip(tokens.iter().map(|&t| t.to_owned()))
            .collect();
        let genotypes: IndexMap<Sample, GenotypeCall> = sample_fields
            .iter()
            .map(|(sample, token)| {
                GenotypeCall::from_sample(format.as_slice(), token)
                    .map(|call| (sample.clone(), call))
            })
            .collect::<Result<_>>()?;

        let chrom = columns[0].to_owned();
        let variant_id = if alt.contains(',') {
            None
        } else {
            Some(variant_id(&chrom, pos, &ref_allele, &alt))
        };
        Ok(VariantRecord {
            chrom,
            pos,
            id: columns[2].to_owned(),
            ref_allele,
            alt,
            qual,
            filter: columns[6].to_owned(),
            format,
            info,
            annotations,
            sample_fields,
            genotypes,
            variant_id,
        })
    }

    /// POS, 1-based.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// QUAL, `None` if missing (`.`).
    pub fn qual(&self) -> Option<f32> {
        self.qual
    }

    /// `chrom_pos_ref_alt`, only defined for records with a single ALT allele.
    pub fn variant_id(&self) -> Option<&str> {
        self.variant_id.as_deref()
    }

    pub fn alt_alleles(&self) -> Vec<&str> {
        self.alt.split(',').collect()
    }

    pub fn is_multiallelic(&self) -> bool {
        self.alt.contains(',')
    }

    pub fn ids(&self) -> Vec<&str> {
        self.id.split(';').collect()
    }

    pub fn filters(&self) -> Vec<&str> {
        self.filter.split(';').collect()
    }

    pub fn info_values(&self, key: &str) -> Option<&[String]> {
        self.info.get(key).map(Vec::as_slice)
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.info.contains_key(key)
    }

    pub fn annotations_for(&self, allele: &str) -> Option<&[Annotation]> {
        self.annotations.get(allele).map(Vec::as_slice)
    }

    pub fn genotype(&self, sample: &str) -> Option<&GenotypeCall> {
        self.genotypes.get(sample)
    }

    pub fn sample_field(&self, sample: &str) -> Option<&str> {
        self.sample_fields.get(sample).map(String::as_str)
    }
}

pub(crate) fn variant_id(chrom: &str, pos: u64, ref_allele: &str, alt: &str) -> String {
    [
        chrom.to_owned(),
        pos.to_string(),
        ref_allele.to_owned(),
        alt.to_owned(),
    ]
    .join(VARIANT_ID_SEPARATOR)
}

fn decode_info(column: &str) -> Info {
    if column == "." {
        return Info::new();
    }
    column
        .split(';')
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((key, values)) => (
                key.to_owned(),
                values.split(',').map(str::to_owned).collect(),
            ),
            None => (entry.to_owned(), Vec::new()),
        })
        .collect()
}
