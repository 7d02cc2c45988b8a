// Token-level helpers for the directive grammar

use crate::palette::Rgb;
use nom::{
    bytes::complete::take_till,
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map_res},
    multi::separated_list0,
    sequence::{delimited, tuple},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Split a directive body on `;`. Empty fields are kept.
pub fn split_fields(input: &str) -> Vec<&str> {
    let result: IResult<&str, Vec<&str>> =
        separated_list0(char(';'), take_till(|c| c == ';'))(input);
    match result {
        Ok((_, fields)) => fields,
        Err(_) => vec![input],
    }
}

/// Trim whitespace and stray closing braces left over from the `}}}` marker
pub fn clean_field(field: &str) -> &str {
    field.trim_matches(|c: char| c.is_whitespace() || c == '}')
}

/// Strip the `{{{` / `}}}` markers around a raw placeholder
pub fn strip_markers(raw: &str) -> &str {
    raw.trim_matches(|c| c == '{' || c == '}')
}

/// A field made only of digits, e.g. the optional font size of a graph
pub fn bare_integer(field: &str) -> Option<u32> {
    let result: IResult<&str, u32> = all_consuming(map_res(digit1, str::parse::<u32>))(field);
    result.ok().map(|(_, n)| n)
}

fn color_component(input: &str) -> IResult<&str, u8> {
    ws(map_res(digit1, str::parse::<u8>))(input)
}

/// Parse `r,g,b` with each component in 0..=255
pub fn rgb_triple(field: &str) -> Option<Rgb> {
    let result: IResult<&str, (u8, char, u8, char, u8)> = all_consuming(tuple((
        color_component,
        char(','),
        color_component,
        char(','),
        color_component,
    )))(field);
    result.ok().map(|(_, (r, _, g, _, b))| Rgb(r, g, b))
}
