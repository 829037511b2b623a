use std::fmt;

use getset::{CopyGetters, Getters};
use num_enum::TryFromPrimitive;

use crate::error::{Error, Result};

const MISSING: &str = ".";
const REF_INDEX: &str = "0";

/// Separator between the two alleles of a diploid GT token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Separator {
    Unphased = 0x2f,
    Phased = 0x7c,
}

impl Separator {
    /// The first separator found in a GT token, `None` for haploid calls.
    pub fn of(gt: &str) -> Option<Separator> {
        gt.bytes().find_map(|b| Separator::try_from(b).ok())
    }

    pub fn as_char(self) -> char {
        self as u8 as char
    }
}

/// An allelic depth as found in `AD`; tokens that are not counts are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Depth {
    Count(u32),
    Raw(String),
}

impl From<&str> for Depth {
    fn from(token: &str) -> Self {
        token
            .parse()
            .map(Depth::Count)
            .unwrap_or_else(|_| Depth::Raw(token.to_owned()))
    }
}

impl Depth {
    pub fn count(&self) -> Option<u32> {
        match self {
            Depth::Count(n) => Some(*n),
            Depth::Raw(_) => None,
        }
    }
}

/// The typed call of one sample at one record.
///
/// Alleles are taken as the first and last character of the GT token, so allele
/// indices above 9 are not represented faithfully.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct GenotypeCall {
    #[getset(get = "pub")]
    allele_1: String,
    #[getset(get = "pub")]
    allele_2: String,
    #[getset(get = "pub")]
    genotype: String,
    #[getset(get_copy = "pub")]
    phased: bool,
    #[getset(get_copy = "pub")]
    genotyped: bool,
    #[getset(get_copy = "pub")]
    hom_ref: bool,
    #[getset(get_copy = "pub")]
    hom_alt: bool,
    #[getset(get_copy = "pub")]
    het: bool,
    #[getset(get_copy = "pub")]
    has_variant: bool,
    #[getset(get = "pub")]
    ref_depth: Depth,
    #[getset(get = "pub")]
    alt_depth: Depth,
    #[getset(get_copy = "pub")]
    depth_of_coverage: Option<u32>,
    #[getset(get_copy = "pub")]
    genotype_quality: Option<f32>,
    #[getset(get = "pub")]
    phred_likelihoods: Vec<u32>,
}

impl GenotypeCall {
    /// Decode a call from its individual sub-field tokens. Absent sub-fields take
    /// the values of an uncalled sample (`./.`, `.,.`, `0`, `0`, no likelihoods).
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_vcf::record::GenotypeCall;
    ///
    /// let call = GenotypeCall::decode("0/1", Some("10,12"), Some("22"), Some("99"), None).unwrap();
    /// assert!(call.het() && call.has_variant());
    /// assert_eq!(call.ref_depth().count(), Some(10));
    /// assert_eq!(call.depth_of_coverage(), Some(22));
    /// ```
    pub fn decode(
        gt: &str,
        ad: Option<&str>,
        dp: Option<&str>,
        gq: Option<&str>,
        pl: Option<&str>,
    ) -> Result<Self> {
        if gt.is_empty() {
            return Err(Error::structural(0, "empty genotype token"));
        }
        Ok(GenotypeCall::call(gt, ad, dp, gq, pl))
    }

    /// Decode a sample column, using the FORMAT keys to locate the sub-fields.
    pub fn from_sample<S: AsRef<str>>(format: &[S], token: &str) -> Result<Self> {
        let (gt, ad, dp, gq, pl) = subfields(format, token);
        GenotypeCall::decode(gt, ad, dp, gq, pl)
    }

    /// Decode a sample column whose GT is known to be non-empty.
    pub(crate) fn from_checked_sample<S: AsRef<str>>(format: &[S], token: &str) -> Self {
        let (gt, ad, dp, gq, pl) = subfields(format, token);
        GenotypeCall::call(gt, ad, dp, gq, pl)
    }

    fn call(
        gt: &str,
        ad: Option<&str>,
        dp: Option<&str>,
        gq: Option<&str>,
        pl: Option<&str>,
    ) -> Self {
        let phased = Separator::of(gt) == Some(Separator::Phased);
        let (allele_1, allele_2) = if gt.chars().count() < 3 {
            (gt.to_owned(), MISSING.to_owned())
        } else {
            let mut chars = gt.chars();
            // both exist, the token has at least three characters
            let first = chars.next().unwrap_or('.');
            let last = chars.next_back().unwrap_or('.');
            (first.to_string(), last.to_string())
        };
        let genotype = format!("{}/{}", allele_1, allele_2);

        let genotyped = !(allele_1 == MISSING && allele_2 == MISSING);
        let hom_ref = genotyped && allele_1 == REF_INDEX && allele_2 == REF_INDEX;
        let hom_alt = genotyped && !hom_ref && allele_1 == allele_2;
        let het = genotyped && !hom_ref && !hom_alt;

        let mut depths = ad.unwrap_or(".,.").split(',');
        let ref_depth = Depth::from(depths.next().unwrap_or(MISSING));
        let alt_depth = depths
            .next()
            .map(Depth::from)
            .unwrap_or_else(|| ref_depth.clone());

        GenotypeCall {
            allele_1,
            allele_2,
            genotype,
            phased,
            genotyped,
            hom_ref,
            hom_alt,
            het,
            has_variant: hom_alt || het,
            ref_depth,
            alt_depth,
            depth_of_coverage: dp.unwrap_or("0").parse().ok(),
            genotype_quality: gq.unwrap_or("0").parse().ok(),
            phred_likelihoods: pl.map(likelihoods).unwrap_or_default(),
        }
    }
}

type Subfields<'a> = (
    &'a str,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
);

/// GT, AD, DP, GQ and PL of a sample column; a missing GT reads as `./.`.
fn subfields<'a, S: AsRef<str>>(format: &[S], token: &'a str) -> Subfields<'a> {
    let field = |key: &str| {
        format
            .iter()
            .position(|f| f.as_ref() == key)
            .and_then(|i| token.split(':').nth(i))
    };
    (
        field("GT").unwrap_or("./."),
        field("AD"),
        field("DP"),
        field("GQ"),
        field("PL"),
    )
}

/// All-or-nothing, so that scores stay aligned with genotype indices.
fn likelihoods(pl: &str) -> Vec<u32> {
    pl.split(',')
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .unwrap_or_default()
}

impl fmt::Display for GenotypeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.genotype)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{Depth, GenotypeCall, Separator};

    fn gt(token: &str) -> GenotypeCall {
        GenotypeCall::decode(token, None, None, None, None).unwrap()
    }

    #[rstest]
    #[case("0/0")]
    #[case("0/1")]
    #[case("1/1")]
    #[case("1|2")]
    #[case("./.")]
    #[case(".|.")]
    #[case("./1")]
    #[case("0")]
    #[case("1")]
    #[case(".")]
    #[case("2/2")]
    fn test_exactly_one_zygosity(#[case] token: &str) {
        let call = gt(token);
        let flags = [call.hom_ref(), call.hom_alt(), call.het()];
        let set = flags.iter().filter(|&&f| f).count();
        if call.genotyped() {
            assert_eq!(set, 1, "{:?}", call);
        } else {
            assert_eq!(set, 0, "{:?}", call);
        }
        assert_eq!(call.has_variant(), call.hom_alt() || call.het());
    }

    #[test]
    fn test_het() {
        let call = gt("0/1");
        assert_eq!(call.allele_1(), "0");
        assert_eq!(call.allele_2(), "1");
        assert!(!call.phased());
        assert!(call.het());
        assert!(call.has_variant());
        assert!(call.genotyped());
    }

    #[test]
    fn test_phased_hom_alt() {
        let call = gt("1|1");
        assert!(call.phased());
        assert!(call.hom_alt());
        assert_eq!(call.genotype(), "1/1");
        assert_eq!(call.to_string(), "1/1");
    }

    #[test]
    fn test_no_call() {
        let call = gt("./.");
        assert!(!call.genotyped());
        assert!(!call.hom_ref() && !call.hom_alt() && !call.het() && !call.has_variant());
    }

    #[test]
    fn test_haploid() {
        let call = gt("1");
        assert_eq!(call.allele_1(), "1");
        assert_eq!(call.allele_2(), ".");
        assert!(!call.phased());
        assert!(call.het());
        let call = gt("0");
        assert_eq!(call.genotype(), "0/.");
        assert!(call.het());
    }

    #[test]
    fn test_empty_genotype_is_an_error() {
        assert!(GenotypeCall::decode("", None, None, None, None).is_err());
    }

    #[test]
    fn test_defaults() {
        let call = gt("0/1");
        assert_eq!(call.ref_depth(), &Depth::Raw(".".to_owned()));
        assert_eq!(call.alt_depth(), &Depth::Raw(".".to_owned()));
        assert_eq!(call.depth_of_coverage(), Some(0));
        assert_eq!(call.genotype_quality(), Some(0.0));
        assert!(call.phred_likelihoods().is_empty());
    }

    #[test]
    fn test_numeric_subfields() {
        let call =
            GenotypeCall::decode("0/1", Some("10,12"), Some("22"), Some("99.5"), Some("120,0,90"))
                .unwrap();
        assert_eq!(call.ref_depth(), &Depth::Count(10));
        assert_eq!(call.alt_depth(), &Depth::Count(12));
        assert_eq!(call.depth_of_coverage(), Some(22));
        assert_eq!(call.genotype_quality(), Some(99.5));
        assert_eq!(call.phred_likelihoods(), &vec![120, 0, 90]);
    }

    #[test]
    fn test_malformed_numeric_subfields_are_absorbed() {
        let call = GenotypeCall::decode("0/1", Some(".,7"), Some("."), Some("x"), Some("0,.,3"))
            .unwrap();
        assert_eq!(call.ref_depth(), &Depth::Raw(".".to_owned()));
        assert_eq!(call.alt_depth(), &Depth::Count(7));
        assert_eq!(call.depth_of_coverage(), None);
        assert_eq!(call.genotype_quality(), None);
        assert!(call.phred_likelihoods().is_empty());
    }

    #[test]
    fn test_from_sample() {
        let format = ["GT", "AD", "DP", "GQ", "PL"];
        let call = GenotypeCall::from_sample(&format[..], "1/1:0,30:30:90:900,90,0").unwrap();
        assert!(call.hom_alt());
        assert_eq!(call.alt_depth().count(), Some(30));
        assert_eq!(call.phred_likelihoods(), &vec![900, 90, 0]);

        // trailing sub-fields may be dropped
        let call = GenotypeCall::from_sample(&format[..], "./.").unwrap();
        assert!(!call.genotyped());
        assert_eq!(call.depth_of_coverage(), Some(0));

        let call = GenotypeCall::from_sample(&["DP"][..], "12").unwrap();
        assert!(!call.genotyped());
        assert_eq!(call.depth_of_coverage(), Some(12));
    }

    #[test]
    fn test_separator() {
        assert_eq!(Separator::of("0/1"), Some(Separator::Unphased));
        assert_eq!(Separator::of("0|1"), Some(Separator::Phased));
        assert_eq!(Separator::of("1"), None);
        assert_eq!(Separator::Phased.as_char(), '|');
    }
}
