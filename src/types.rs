use std::collections::HashMap;
#[cfg(not(feature = "sync"))]
use std::rc::Rc;
use std::str::FromStr;
#[cfg(feature = "sync")]
use std::sync::Arc;

use getset::Getters;
use indexmap::IndexMap;
use multimap::MultiMap;
use nom::combinator::all_consuming;
use strum::EnumString;

use crate::error::{Error, Result};
use crate::parser;

/// The INFO key under which a third-party annotation tool (e.g. VEP) stores its
/// per-allele annotations.
pub const DEFAULT_ANNOTATION_KEY: &str = "CSQ";

/// Shared, read-only handle to a fully parsed header.
#[cfg(not(feature = "sync"))]
pub type HeaderRef = Rc<Header>;
#[cfg(feature = "sync")]
pub type HeaderRef = Arc<Header>;

pub type Sample = String;

/// Declared relationship between the number of values of a field and the
/// number of alleles at a site, i.e. `Number=` in the header.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum InfoNumber {
    Count(usize),
    /// `R`: one value per allele, reference included.
    Alleles,
    /// `A`: one value per alternative allele.
    AlternateAlleles,
    /// `G`: one value per possible genotype.
    Genotypes,
    Unknown,
}

#[derive(Debug, Clone, Eq, PartialEq, EnumString)]
pub enum InfoType {
    Integer,
    Float,
    Flag,
    Character,
    String,
}

#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct Header {
    /// Raw values of every `##key=value` line, grouped by key.
    meta: MultiMap<String, String>,
    info: IndexMap<String, HeaderInfo>,
    format: IndexMap<String, HeaderFormat>,
    samples: Vec<Sample>,
    annotation_key: String,
    annotation_subfield_names: Vec<String>,
    #[getset(skip)]
    column_header: bool,
}

impl Default for Header {
    fn default() -> Self {
        Header::new(DEFAULT_ANNOTATION_KEY)
    }
}

impl Header {
    pub fn new(annotation_key: &str) -> Self {
        Header {
            meta: MultiMap::new(),
            info: IndexMap::new(),
            format: IndexMap::new(),
            samples: Vec::new(),
            annotation_key: annotation_key.to_owned(),
            annotation_subfield_names: Vec::new(),
            column_header: false,
        }
    }

    /// Consume one `##` meta-information line.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_vcf::types::{Header, InfoNumber};
    ///
    /// let mut header = Header::default();
    /// header
    ///     .parse_meta_line(r#"##INFO=<ID=AF,Number=A,Type=Float,Description="Allele Frequency">"#)
    ///     .unwrap();
    /// assert_eq!(header.cardinality_of("AF"), Some(InfoNumber::AlternateAlleles));
    /// assert_eq!(header.cardinality_of("DP"), None);
    /// ```
    pub fn parse_meta_line(&mut self, line: &str) -> Result<()> {
        let (_, (key, value)) = parser::meta_line(line)
            .map_err(|_| Error::header(0, format!("expected ##key=value, found {:?}", line)))?;
        match key {
            "INFO" => {
                let info = HeaderInfo::try_from(parser::structured_value(value)?)?;
                if info.id == self.annotation_key {
                    self.annotation_subfield_names =
                        parser::annotation_format(&info.description).unwrap_or_default();
                }
                self.info.insert(info.id.clone(), info);
            }
            "FORMAT" => {
                let format = HeaderFormat::try_from(parser::structured_value(value)?)?;
                self.format.insert(format.id.clone(), format);
            }
            _ => {}
        }
        self.meta.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    /// Consume the `#CHROM` column header line, which lists the samples.
    pub fn parse_column_header_line(&mut self, line: &str) -> Result<()> {
        let columns: Vec<&str> = line.trim_end().split('\t').collect();
        if !columns[0].starts_with("#CHROM") || columns.len() < 8 {
            return Err(Error::header(
                0,
                format!("expected #CHROM column header, found {:?}", line),
            ));
        }
        self.samples = columns.iter().skip(9).map(|&s| s.to_owned()).collect();
        self.column_header = true;
        Ok(())
    }

    pub fn has_column_header(&self) -> bool {
        self.column_header
    }

    /// Declared cardinality of INFO field `key`, `None` if it was never declared.
    pub fn cardinality_of(&self, key: &str) -> Option<InfoNumber> {
        self.info.get(key).map(|info| info.number)
    }
}

fn mandatory<'a>(h: &mut HashMap<&str, &'a str>, key: &str, line: &str) -> Result<&'a str> {
    h.remove(key)
        .ok_or_else(|| Error::header(0, format!("{} is mandatory in {} lines", key, line)))
}

fn number(value: &str) -> Result<InfoNumber> {
    all_consuming(parser::info_number)(value)
        .map(|(_, number)| number)
        .map_err(|_| Error::header(0, format!("unknown Number {:?}", value)))
}

fn kind(value: &str) -> Result<InfoType> {
    InfoType::from_str(value).map_err(|_| Error::header(0, format!("unknown Type {:?}", value)))
}

#[derive(Debug, Getters, Clone)]
#[getset(get = "pub")]
pub struct HeaderInfo {
    id: String,
    number: InfoNumber,
    kind: InfoType,
    description: String,
    // may be empty
    source: String,
    // may be empty
    version: String,
    additional: HashMap<String, String>,
}

impl<'a> TryFrom<Vec<(&'a str, &'a str)>> for HeaderInfo {
    type Error = Error;

    fn try_from(data: Vec<(&'a str, &'a str)>) -> Result<Self> {
        let mut h: HashMap<_, _> = data.into_iter().collect();
        Ok(HeaderInfo {
            id: mandatory(&mut h, "ID", "INFO")?.into(),
            number: number(mandatory(&mut h, "Number", "INFO")?)?,
            kind: kind(h.remove("Type").unwrap_or("String"))?,
            description: h.remove("Description").unwrap_or("").into(),
            source: h.remove("Source").unwrap_or("").into(),
            version: h.remove("Version").unwrap_or("").into(),
            additional: h.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        })
    }
}

#[derive(Debug, Getters, Clone)]
#[getset(get = "pub")]
pub struct HeaderFormat {
    id: String,
    number: InfoNumber,
    kind: InfoType,
    description: String,
}

impl<'a> TryFrom<Vec<(&'a str, &'a str)>> for HeaderFormat {
    type Error = Error;

    fn try_from(data: Vec<(&'a str, &'a str)>) -> Result<Self> {
        let mut h: HashMap<_, _> = data.into_iter().collect();
        Ok(HeaderFormat {
            id: mandatory(&mut h, "ID", "FORMAT")?.into(),
            number: number(mandatory(&mut h, "Number", "FORMAT")?)?,
            kind: kind(h.remove("Type").unwrap_or("String"))?,
            description: h.remove("Description").unwrap_or("").into(),
        })
    }
}
