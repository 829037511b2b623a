use std::io::{BufRead, BufReader, Read};
use std::path::Path;
#[cfg(not(feature = "sync"))]
use std::rc::Rc;
#[cfg(feature = "sync")]
use std::sync::Arc;

use getset::{CopyGetters, Getters, Setters};

use crate::error::{Error, Result};
use crate::record::{split, SplitAlleles, VariantRecord};
use crate::types::{Header, HeaderRef, DEFAULT_ANNOTATION_KEY};

#[derive(Debug, Clone, Getters, CopyGetters, Setters)]
pub struct ReaderOptions {
    /// Emit one record per ALT allele of multiallelic records.
    #[getset(get_copy = "pub", set = "pub")]
    split_variants: bool,
    /// INFO key holding third-party per-allele annotations.
    #[getset(get = "pub", set = "pub")]
    annotation_key: String,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            split_variants: false,
            annotation_key: DEFAULT_ANNOTATION_KEY.to_owned(),
        }
    }
}

impl ReaderOptions {
    pub fn with_split_variants(mut self, split_variants: bool) -> Self {
        self.split_variants = split_variants;
        self
    }

    pub fn with_annotation_key<S: Into<String>>(mut self, annotation_key: S) -> Self {
        self.annotation_key = annotation_key.into();
        self
    }
}

/// Forward-only iterator over the records of a VCF stream.
///
/// The header is read when the iterator is created. Each data line yields one
/// record, or one record per ALT allele when splitting is enabled. The first error
/// ends the iteration.
pub struct VcfRecords<R: BufRead> {
    header: HeaderRef,
    options: ReaderOptions,
    inner: R,
    buf: String,
    line_number: usize,
    pending: Option<String>,
    group: Option<SplitAlleles>,
    done: bool,
}

impl<R: BufRead> VcfRecords<R> {
    pub fn header(&self) -> &Header {
        self.header.as_ref()
    }

    /// A shared handle to the header, valid beyond the lifetime of the reader.
    pub fn header_ref(&self) -> HeaderRef {
        self.header.clone()
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }
}

impl VcfRecords<BufReader<Box<dyn Read>>> {
    /// Open a plain or compressed VCF file.
    pub fn from_path<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let (reader, _format) = niffler::from_path(path)?;
        Self::new(BufReader::new(reader), options)
    }

    /// Read a plain or compressed VCF from any byte stream, e.g. stdin.
    pub fn from_reader(reader: Box<dyn Read>, options: ReaderOptions) -> Result<Self> {
        let (reader, _format) = niffler::get_reader(reader)?;
        Self::new(BufReader::new(reader), options)
    }
}

impl<R: BufRead> VcfRecords<R> {
    pub fn new(mut reader: R, options: ReaderOptions) -> Result<Self> {
        let mut header = Header::new(options.annotation_key());
        let mut buf = String::new();
        let mut line_number = 0;
        let mut pending = None;
        loop {
            buf.clear();
            if reader.read_line(&mut buf)? == 0 {
                break;
            }
            line_number += 1;
            let line = buf.trim_end_matches(&['\r', '\n'][..]);
            if line.starts_with("##") {
                header
                    .parse_meta_line(line)
                    .map_err(|e| e.at_line(line_number))?;
            } else if line.starts_with('#') {
                header
                    .parse_column_header_line(line)
                    .map_err(|e| e.at_line(line_number))?;
            } else if !line.trim().is_empty() {
                pending = Some(line.to_owned());
                break;
            }
        }
        if pending.is_some() && !header.has_column_header() {
            return Err(Error::MissingColumnHeader);
        }
        log::debug!(
            "read header: {} INFO fields, {} samples, {} annotation sub-fields",
            header.info().len(),
            header.samples().len(),
            header.annotation_subfield_names().len()
        );
        log::debug!("split variants = {}", options.split_variants());

        Ok(Self {
            #[cfg(not(feature = "sync"))]
            header: Rc::new(header),
            #[cfg(feature = "sync")]
            header: Arc::new(header),
            options,
            inner: reader,
            buf,
            line_number,
            pending,
            group: None,
            done: false,
        })
    }

    /// The next non-blank data line, `None` at the end of input.
    fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        loop {
            self.buf.clear();
            if self.inner.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let line = self.buf.trim_end_matches(&['\r', '\n'][..]);
            if !line.trim().is_empty() {
                return Ok(Some(line.to_owned()));
            }
        }
    }

    fn read_group(&mut self) -> Result<Option<VariantRecord>> {
        let line = match self.next_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        let record =
            VariantRecord::decode(&line, &self.header).map_err(|e| e.at_line(self.line_number))?;
        if !(self.options.split_variants() && record.is_multiallelic()) {
            return Ok(Some(record));
        }
        log::trace!(
            "splitting {}:{} into {} records",
            record.chrom(),
            record.pos(),
            record.alt_alleles().len()
        );
        let mut group =
            split(record, &self.header).map_err(|e| e.at_line(self.line_number))?;
        let first = group.next();
        self.group = Some(group);
        Ok(first)
    }
}

impl<R: BufRead> Iterator for VcfRecords<R> {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(record) = self.group.as_mut().and_then(Iterator::next) {
            return Some(Ok(record));
        }
        self.group = None;
        if self.done {
            return None;
        }
        match self.read_group() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use itertools::Itertools;
    use pretty_assertions::assert_eq;

    use super::*;

    const VCF: &str = "##fileformat=VCFv4.2
##INFO=<ID=AC,Number=A,Type=Integer,Description=\"Allele count\">
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tfather\tmother
1\t100\trs1\tA\tG\t50\tPASS\tAC=1;DP=10\tGT\t0/1\t0/0
1\t200\trs2;rs3\tC\tA,T\t50\tPASS\tAC=1,2;DP=12\tGT\t1/2\t0/2
2\t300\t.\tG\tC\t.\tPASS\tDP=8\tGT\t./.\t1/1

";

    fn records(vcf: &str, split_variants: bool) -> Vec<Result<VariantRecord>> {
        let options = ReaderOptions::default().with_split_variants(split_variants);
        VcfRecords::new(Cursor::new(vcf.as_bytes()), options)
            .unwrap()
            .collect()
    }

    #[test]
    fn test_header() {
        let reader = VcfRecords::new(Cursor::new(VCF.as_bytes()), ReaderOptions::default()).unwrap();
        assert_eq!(reader.header().samples(), &["father", "mother"]);
        assert_eq!(reader.header().info().len(), 2);
        assert!(!reader.options().split_variants());
    }

    #[test]
    fn test_unsplit() -> anyhow::Result<()> {
        let records = records(VCF, false).into_iter().collect::<Result<Vec<_>>>()?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].alt(), "A,T");
        assert_eq!(records[1].variant_id(), None);
        assert_eq!(records[1].info_values("AC").unwrap(), ["1", "2"]);
        Ok(())
    }

    #[test]
    fn test_split() -> anyhow::Result<()> {
        let records = records(VCF, true).into_iter().collect::<Result<Vec<_>>>()?;
        assert_eq!(
            records.iter().map(|r| r.variant_id().unwrap()).collect_vec(),
            vec!["1_100_A_G", "1_200_C_A", "1_200_C_T", "2_300_G_C"]
        );
        assert_eq!(records[1].id(), "rs2");
        assert_eq!(records[2].id(), "rs3");
        assert_eq!(records[2].info_values("AC").unwrap(), ["2"]);
        assert_eq!(records[1].genotype("mother").unwrap().genotype(), "0/0");
        assert_eq!(records[2].genotype("mother").unwrap().genotype(), "0/1");
        Ok(())
    }

    #[test]
    fn test_structural_error_ends_iteration() {
        let vcf = VCF.replace("2\t300\t.\tG\tC\t.\tPASS\tDP=8", "2\t300\t.\tG");
        let results = records(&vcf, false);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok() && results[1].is_ok());
        match &results[2] {
            Err(Error::Structural { line, .. }) => assert_eq!(*line, 8),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_schema_inconsistency_aborts_the_group() {
        let vcf = VCF.replace("AC=1,2;DP=12", "AC=1,2;DP=12;XX=3");
        let results = records(&vcf, true);
        assert_eq!(results.len(), 2);
        match &results[1] {
            Err(Error::SchemaInconsistency { line, key }) => {
                assert_eq!(*line, 7);
                assert_eq!(key, "XX");
            }
            other => panic!("unexpected {:?}", other),
        }

        // undeclared keys are fine as long as nothing is split
        assert!(records(&vcf, false).iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_from_reader() -> anyhow::Result<()> {
        let plain = VcfRecords::from_reader(
            Box::new(Cursor::new(VCF.as_bytes().to_vec())),
            ReaderOptions::default().with_split_variants(true),
        )?;
        assert_eq!(plain.collect::<Result<Vec<_>>>()?.len(), 4);

        let compressed = std::fs::read("resources/example.vcf.gz")?;
        let reader = VcfRecords::from_reader(
            Box::new(Cursor::new(compressed)),
            ReaderOptions::default(),
        )?;
        assert_eq!(reader.header().samples(), &["father", "mother", "proband"]);
        let records = reader.collect::<Result<Vec<_>>>()?;
        assert_eq!(records.len(), 4);
        assert_eq!(records[1].alt(), "A,T");
        Ok(())
    }

    #[test]
    fn test_missing_column_header() {
        let vcf = "##fileformat=VCFv4.2\n1\t100\t.\tA\tG\t.\tPASS\t.\n";
        let result = VcfRecords::new(Cursor::new(vcf.as_bytes()), ReaderOptions::default());
        assert!(matches!(result, Err(Error::MissingColumnHeader)));
    }

    #[test]
    fn test_header_only() {
        let vcf = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        assert!(records(vcf, true).is_empty());
    }

    #[test]
    fn test_malformed_header_reports_line() {
        let vcf = "##fileformat=VCFv4.2\n##INFO=<ID=AC,Number=Q,Type=Integer>\n";
        let result = VcfRecords::new(Cursor::new(vcf.as_bytes()), ReaderOptions::default());
        assert!(matches!(result, Err(Error::Header { line: 2, .. })));
    }
}
