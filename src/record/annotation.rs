use indexmap::IndexMap;
use itertools::Itertools;

/// Name of the annotation sub-field that names the allele an entry belongs to.
pub const ALLELE_SUBFIELD: &str = "Allele";

/// One annotation entry, sub-field name to value.
pub type Annotation = IndexMap<String, String>;

/// Annotation entries grouped by the ALT allele they describe.
pub type AnnotationBlock = IndexMap<String, Vec<Annotation>>;

/// Group the comma-separated entries of the annotation INFO value by allele.
pub(crate) fn decode_block(
    entries: &[String],
    layout: &[String],
    ref_allele: &str,
    alt_alleles: &[&str],
) -> AnnotationBlock {
    let allele_position = layout
        .iter()
        .position(|name| name == ALLELE_SUBFIELD)
        .unwrap_or(0);
    let mut block = AnnotationBlock::new();
    for entry in entries {
        let values = entry.split('|').collect_vec();
        let allele = resolve_allele(
            values.get(allele_position).copied().unwrap_or(""),
            ref_allele,
            alt_alleles,
        );
        let annotation: Annotation = layout
            .iter()
            .cloned()
            .zip(values.into_iter().map(str::to_owned))
            .collect();
        block.entry(allele).or_default().push(annotation);
    }
    block
}

/// Re-encode entries into a single INFO value, sub-fields in layout order.
pub(crate) fn encode(annotations: &[Annotation], layout: &[String]) -> String {
    annotations
        .iter()
        .map(|annotation| {
            layout
                .iter()
                .map(|name| annotation.get(name).map(String::as_str).unwrap_or(""))
                .join("|")
        })
        .join(",")
}

/// Annotation tools drop the leading base that indel alleles share with the reference
/// (`-` when nothing remains), so an entry's allele may not be spelled like the ALT.
fn resolve_allele(allele: &str, ref_allele: &str, alt_alleles: &[&str]) -> String {
    if let [alt] = alt_alleles {
        return (*alt).to_owned();
    }
    // a verbatim match on any ALT wins over a trimmed match on an earlier one
    alt_alleles
        .iter()
        .find(|&&alt| alt == allele)
        .or_else(|| {
            alt_alleles
                .iter()
                .find(|&&alt| trimmed(ref_allele, alt) == allele)
        })
        .map(|&alt| alt.to_owned())
        .unwrap_or_else(|| allele.to_owned())
}

fn trimmed<'a>(ref_allele: &str, alt: &'a str) -> &'a str {
    let mut rest = alt.chars();
    let anchored =
        (ref_allele.len() > 1 || alt.len() > 1) && ref_allele.chars().next() == rest.next();
    match if anchored { rest.as_str() } else { alt } {
        "" => "-",
        rest => rest,
    }
}
