// Directive parser
//
// Grammar: fields separated by `;`
//   <output type> ; <statistic or column> ; <arguments...>
// Classification is by case-insensitive substring, first match wins.

use super::ast::{Directive, GraphDirective, GraphKind, StatKind, TextDirective};
use super::lexer::{bare_integer, clean_field, rgb_triple, split_fields};

/// Parse one directive body (already stripped of its `{{{ }}}` markers).
///
/// Never fails outright: malformed input yields [`Directive::Invalid`].
pub fn parse_directive(input: &str) -> Directive {
    let fields = split_fields(input);
    if fields.len() < 2 {
        return invalid(
            input,
            "malformed directive: expected an output type and a statistic separated by ';'",
        );
    }

    let output_type = fields[0].to_lowercase();
    let selector = fields[1].to_lowercase();

    if output_type.contains("colors") || output_type.contains("colorpalette") {
        return parse_palette(input, &fields[1..]);
    }
    if output_type.contains("order") {
        return parse_order(&fields[1..]);
    }

    let stat = classify_stat(&selector);

    if output_type.contains("bar") {
        parse_graph(input, GraphKind::Bar, stat, &fields[2..])
    } else if output_type.contains("pie") {
        parse_graph(input, GraphKind::Pie, stat, &fields[2..])
    } else {
        parse_text(input, stat, &fields)
    }
}

/// Map the second field to a statistic
pub fn classify_stat(selector: &str) -> StatKind {
    if selector.contains("range") {
        StatKind::Range
    } else if selector.contains("mean") {
        StatKind::Mean
    } else if selector.contains("percentage") || selector.contains('%') {
        StatKind::Percentage
    } else if selector.contains("count") {
        StatKind::Count
    } else {
        StatKind::RawValue
    }
}

fn parse_graph(input: &str, kind: GraphKind, stat: StatKind, args: &[&str]) -> Directive {
    let Some((title, rest)) = args.split_last() else {
        return invalid(input, "malformed directive: graph requires a title field");
    };

    // A leading bare integer is the font size, as long as a title still follows it.
    let (font_size, column_fields) = match rest.split_first() {
        Some((first, tail)) => match bare_integer(clean_field(first)) {
            Some(size) => (size, tail),
            None => (0, rest),
        },
        None => (0, rest),
    };

    Directive::Graph(GraphDirective {
        kind,
        stat,
        column_refs: collect_refs(column_fields),
        font_size,
        title: clean_field(title).to_string(),
        raw_input: input.to_string(),
    })
}

fn parse_text(input: &str, stat: StatKind, fields: &[&str]) -> Directive {
    let column_refs = if stat == StatKind::RawValue {
        collect_refs(&fields[1..2])
    } else {
        collect_refs(&fields[2..])
    };

    Directive::Text(TextDirective {
        stat,
        column_refs,
        raw_input: input.to_string(),
    })
}

fn parse_palette(input: &str, args: &[&str]) -> Directive {
    let mut colors = Vec::new();
    for field in args.iter().map(|f| clean_field(f)).filter(|f| !f.is_empty()) {
        match rgb_triple(field) {
            Some(rgb) => colors.push(rgb),
            None => {
                return invalid(
                    input,
                    &format!("bad palette color '{}': expected r,g,b with values 0-255", field),
                )
            }
        }
    }

    if colors.is_empty() {
        return invalid(input, "bad palette color: palette declares no colors");
    }

    Directive::PaletteDeclaration(colors)
}

fn parse_order(args: &[&str]) -> Directive {
    Directive::OrderDeclaration(collect_refs(args))
}

fn collect_refs(fields: &[&str]) -> Vec<String> {
    fields
        .iter()
        .map(|f| clean_field(f))
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn invalid(input: &str, reason: &str) -> Directive {
    Directive::Invalid {
        reason: reason.to_string(),
        raw_input: input.to_string(),
    }
}
