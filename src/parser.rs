use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_until};
use nom::character::complete::{alpha1, anychar, char, digit1, none_of, space0};
use nom::combinator::{map, map_res, opt, recognize, rest};
use nom::multi::{many0, separated_list0, separated_list1};
use nom::sequence::{delimited, pair, preceded, separated_pair};
use nom::IResult;

use crate::error::{Error, Result};
use crate::types::InfoNumber;

/// Split a `##key=value` line into key and (possibly empty) value.
pub(crate) fn meta_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, key) = preceded(tag("##"), is_not("="))(input)?;
    let (input, value) = opt(preceded(char('='), rest))(input)?;
    Ok((input, (key, value.unwrap_or("").trim_end())))
}

pub(crate) fn info_number(input: &str) -> IResult<&str, InfoNumber> {
    alt((
        map(
            map_res(digit1, |digits: &str| digits.parse::<usize>()),
            InfoNumber::Count,
        ),
        map_res(alt((alpha1, tag("."))), |number: &str| match number {
            "A" => Ok(InfoNumber::AlternateAlleles),
            "R" => Ok(InfoNumber::Alleles),
            "G" => Ok(InfoNumber::Genotypes),
            "." => Ok(InfoNumber::Unknown),
            _ => Err(()),
        }),
    ))(input)
}

/// A double-quoted string; escapes are kept verbatim.
fn string(input: &str) -> IResult<&str, &str> {
    delimited(
        char('"'),
        recognize(many0(alt((
            recognize(preceded(char('\\'), anychar)),
            recognize(none_of("\\\"")),
        )))),
        char('"'),
    )(input)
}

fn keys_and_values(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
        separated_pair(is_not("<,=>"), char('='), alt((string, is_not(",>"))))(input)
    }
    separated_list0(char(','), key_value)(input)
}

/// Parse the `<ID=..,Number=..,...>` value of a structured meta line.
pub(crate) fn structured_value(input: &str) -> Result<Vec<(&str, &str)>> {
    delimited(char('<'), keys_and_values, char('>'))(input)
        .map(|(_, pairs)| pairs)
        .map_err(|_| Error::header(0, format!("malformed structured value {:?}", input)))
}

/// Extract the sub-field layout from an annotation description such as
/// `Consequence annotations from Ensembl VEP. Format: Allele|Consequence|IMPACT`.
pub(crate) fn annotation_format(description: &str) -> Option<Vec<String>> {
    fn names(input: &str) -> IResult<&str, Vec<&str>> {
        preceded(
            pair(take_until("Format:"), tag("Format:")),
            preceded(space0, separated_list1(char('|'), is_not("|\""))),
        )(input)
    }
    names(description)
        .ok()
        .map(|(_, names)| names.into_iter().map(|n| n.trim().to_owned()).collect())
}
