use crate::aggregate::Column;
use crate::error::{ReportError, Result};
use crate::ir::{ChartLayout, ChartOutput, Series, SeriesPoint};
use crate::parser::ast::{GraphDirective, GraphKind, StatKind};
use crate::resolve::NormalizedColumns;
use crate::runtime::PipelineContext;
use crate::text::round_to;
use tracing::warn;

pub const UNKNOWN_LABEL: &str = "Unknown";

/// Main entry point: turn normalized columns into ordered, coloured series
pub fn assemble_series(
    normalized: &NormalizedColumns,
    directive: &GraphDirective,
    context: &PipelineContext,
) -> Result<ChartOutput> {
    if !matches!(directive.stat, StatKind::Count | StatKind::Percentage) {
        return Err(ReportError::Schema(format!(
            "graphs support count or percentage, not {} ('{}')",
            directive.stat.name(),
            directive.raw_input
        )));
    }

    let columns = &normalized.columns;
    if directive.kind == GraphKind::Pie && columns.len() > 1 {
        return Err(ReportError::Schema(format!(
            "a pie chart takes exactly one column, got {} ('{}')",
            columns.len(),
            directive.raw_input
        )));
    }

    let (categories, series, warnings) = if columns.len() > 1 {
        assemble_grouped(normalized, directive, context)
    } else {
        assemble_single(&columns[0], directive, context)
    };

    Ok(ChartOutput {
        title: directive.title.clone(),
        kind: directive.kind,
        stat: directive.stat,
        categories,
        series,
        layout: ChartLayout::for_chart(
            directive.kind,
            directive.stat,
            columns.len(),
            directive.font_size,
        ),
        warnings,
    })
}

type Assembled = (Vec<String>, Vec<Series>, Vec<crate::error::ReportWarning>);

/// Several columns: one category slot per column, one series per answer.
fn assemble_grouped(
    normalized: &NormalizedColumns,
    directive: &GraphDirective,
    context: &PipelineContext,
) -> Assembled {
    let columns = &normalized.columns;
    let categories: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

    let mut series: Vec<Series> = normalized
        .reference_column()
        .categories
        .iter()
        .map(|c| Series::new(c.name.clone(), directive.kind))
        .collect();

    for column in columns {
        // Unknown rows are left out of the multi-column denominator.
        let denominator = column.category_total();
        for s in series.iter_mut() {
            let count = column.category(&s.name).map_or(0, |c| c.count);
            s.push(column.name.clone(), stat_value(directive.stat, count, denominator));
        }

        let omitted = column
            .categories
            .iter()
            .filter(|c| !series.iter().any(|s| s.name == c.name))
            .count();
        if omitted > 0 {
            warn!(
                column = %column.name,
                omitted,
                "categories missing from the reference column are not charted"
            );
        }
    }

    apply_order(&mut series, context.order(), |s| s.name.as_str());

    let (colors, warning) = context.palette().assign(series.len());
    for (s, color) in series.iter_mut().zip(colors) {
        s.set_color(color);
    }

    let series = insert_fillers(series, &categories, directive.kind);
    (categories, series, warning.into_iter().collect())
}

/// One column: a single series whose points are that column's answers.
fn assemble_single(
    column: &Column,
    directive: &GraphDirective,
    context: &PipelineContext,
) -> Assembled {
    let denominator = column.category_total() + column.unknown_count;
    let mut points: Vec<SeriesPoint> = column
        .categories
        .iter()
        .map(|c| point(&c.name, stat_value(directive.stat, c.count, denominator)))
        .collect();
    let unknown = (column.unknown_count > 0).then(|| {
        point(
            UNKNOWN_LABEL,
            stat_value(directive.stat, column.unknown_count, denominator),
        )
    });

    match directive.kind {
        GraphKind::Bar => {
            points.extend(unknown);
            apply_order(&mut points, context.order(), |p| p.label.as_str());
        }
        GraphKind::Pie => {
            apply_order(&mut points, context.order(), |p| p.label.as_str());
            points.extend(unknown);
            // Largest slice first; ties keep their order.
            points.sort_by(|a, b| b.value.total_cmp(&a.value));
        }
    }

    let (colors, warning) = context.palette().assign(points.len());
    for (p, color) in points.iter_mut().zip(colors) {
        p.color = Some(color);
    }

    let categories = points.iter().map(|p| p.label.clone()).collect();
    let series = Series {
        name: column.name.clone(),
        points,
        chart_type: directive.kind,
        visible: true,
    };
    (categories, vec![series], warning.into_iter().collect())
}

fn point(label: &str, value: f64) -> SeriesPoint {
    SeriesPoint {
        label: label.to_string(),
        value,
        color: None,
    }
}

fn stat_value(stat: StatKind, count: usize, denominator: usize) -> f64 {
    match stat {
        StatKind::Percentage if denominator == 0 => 0.0,
        StatKind::Percentage => round_to(count as f64 / denominator as f64 * 100.0, 1),
        _ => count as f64,
    }
}

/// Move every item named in `order` to the index it has there.
///
/// Each match is swapped with whatever currently sits in its target slot, so
/// items not named in `order` can be displaced.
pub fn apply_order<T, F>(items: &mut [T], order: &[String], key: F)
where
    F: Fn(&T) -> &str,
{
    if order.is_empty() {
        return;
    }
    for i in 0..items.len() {
        let target = order.iter().position(|name| name == key(&items[i]));
        if let Some(target) = target {
            if target < items.len() {
                items.swap(i, target);
            }
        }
    }
}

/// Surround and separate the real series with invisible zero-valued spacers.
fn insert_fillers(series: Vec<Series>, categories: &[String], kind: GraphKind) -> Vec<Series> {
    if kind != GraphKind::Bar {
        return series;
    }

    let filler = |suffix: &str| {
        let mut s = Series::new(format!("filler{}", suffix), kind);
        for category in categories {
            s.push(category.clone(), 0.0);
        }
        s.visible = false;
        s
    };

    let mut out = Vec::with_capacity(series.len() * 2 + 4);
    out.push(filler("beginning"));
    out.push(filler("beginning1"));
    for (j, s) in series.into_iter().enumerate() {
        if j > 0 {
            out.push(filler(&s.name));
        }
        out.push(s);
    }
    out.push(filler("end"));
    out.push(filler("end1"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{abbreviated_label, CategoryCount};
    use crate::error::ReportWarning;
    use crate::palette::{ColorPalette, Rgb};
    use crate::resolve::normalize_columns;

    fn column(index: usize, name: &str, categories: &[(&str, usize)], unknown: usize) -> Column {
        let categories: Vec<CategoryCount> = categories
            .iter()
            .map(|(n, c)| CategoryCount::new(*n, *c))
            .collect();
        let total = unknown + categories.iter().map(|c| c.count).sum::<usize>();
        Column {
            name: name.to_string(),
            abbreviated_label: abbreviated_label(index),
            categories,
            total_count: total,
            unknown_count: unknown,
        }
    }

    fn graph(kind: GraphKind, stat: StatKind) -> GraphDirective {
        GraphDirective {
            kind,
            stat,
            column_refs: vec![],
            font_size: 0,
            title: "Chart".to_string(),
            raw_input: "test".to_string(),
        }
    }

    fn labels(series: &Series) -> Vec<&str> {
        series.points.iter().map(|p| p.label.as_str()).collect()
    }

    fn values(series: &Series) -> Vec<f64> {
        series.points.iter().map(|p| p.value).collect()
    }

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_column_count_with_unknown() {
        let n = normalize_columns(vec![column(0, "Pet", &[("cat", 2), ("dog", 5)], 3)]);
        let ctx = PipelineContext::default();
        let chart = assemble_series(&n, &graph(GraphKind::Bar, StatKind::Count), &ctx).unwrap();
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.categories, vec!["cat", "dog", "Unknown"]);
        assert_eq!(values(&chart.series[0]), vec![2.0, 5.0, 3.0]);
        assert!(chart.warnings.is_empty());
    }

    #[test]
    fn test_single_column_percentage_includes_unknown() {
        let n = normalize_columns(vec![column(0, "Pet", &[("cat", 1), ("dog", 1)], 1)]);
        let ctx = PipelineContext::default();
        let chart =
            assemble_series(&n, &graph(GraphKind::Bar, StatKind::Percentage), &ctx).unwrap();
        assert_eq!(values(&chart.series[0]), vec![33.3, 33.3, 33.3]);
        assert_eq!(chart.layout.value_axis_max, Some(100.0));
    }

    #[test]
    fn test_no_unknown_slot_without_blanks() {
        let n = normalize_columns(vec![column(0, "Pet", &[("cat", 1)], 0)]);
        let ctx = PipelineContext::default();
        let chart = assemble_series(&n, &graph(GraphKind::Bar, StatKind::Count), &ctx).unwrap();
        assert_eq!(chart.categories, vec!["cat"]);
    }

    #[test]
    fn test_single_column_points_colored_cyclically() {
        let cats = [("a", 1), ("b", 1), ("c", 1), ("d", 1)];
        let n = normalize_columns(vec![column(0, "Q", &cats, 0)]);
        let ctx = PipelineContext::default();
        let chart = assemble_series(&n, &graph(GraphKind::Bar, StatKind::Count), &ctx).unwrap();
        let points = &chart.series[0].points;
        assert_eq!(points[3].color, points[0].color);
        assert_eq!(
            chart.warnings,
            vec![ReportWarning::PaletteInsufficient { needed: 4, available: 3 }]
        );
    }

    #[test]
    fn test_multi_column_series_per_category() {
        let a = column(0, "Q1", &[("No", 2), ("Yes", 3)], 1);
        let b = column(1, "Q2", &[("Yes", 4)], 0);
        let n = normalize_columns(vec![a, b]);
        let ctx = PipelineContext::default();
        let chart = assemble_series(&n, &graph(GraphKind::Bar, StatKind::Count), &ctx).unwrap();

        assert_eq!(chart.categories, vec!["Q1", "Q2"]);
        let real: Vec<&Series> = chart.visible_series().collect();
        assert_eq!(real.len(), 2);
        assert_eq!(real[0].name, "No");
        assert_eq!(labels(real[0]), vec!["Q1", "Q2"]);
        assert_eq!(values(real[0]), vec![2.0, 0.0]);
        assert_eq!(real[1].name, "Yes");
        assert_eq!(values(real[1]), vec![3.0, 4.0]);
        assert_eq!(real[0].points[0].color, Some(Rgb(215, 63, 9)));
        assert_eq!(real[1].points[0].color, Some(Rgb(170, 157, 46)));
    }

    #[test]
    fn test_multi_column_percentage_excludes_unknown() {
        let a = column(0, "Q1", &[("No", 1), ("Yes", 3)], 4);
        let b = column(1, "Q2", &[("No", 1), ("Yes", 1)], 0);
        let n = normalize_columns(vec![a, b]);
        let ctx = PipelineContext::default();
        let chart =
            assemble_series(&n, &graph(GraphKind::Bar, StatKind::Percentage), &ctx).unwrap();
        let real: Vec<&Series> = chart.visible_series().collect();
        assert_eq!(values(real[0]), vec![25.0, 50.0]);
        assert_eq!(values(real[1]), vec![75.0, 50.0]);
    }

    #[test]
    fn test_filler_series_layout() {
        let a = column(0, "Q1", &[("No", 1), ("Yes", 1)], 0);
        let b = column(1, "Q2", &[("No", 1), ("Yes", 1)], 0);
        let n = normalize_columns(vec![a, b]);
        let ctx = PipelineContext::default();
        let chart = assemble_series(&n, &graph(GraphKind::Bar, StatKind::Count), &ctx).unwrap();
        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "fillerbeginning",
                "fillerbeginning1",
                "No",
                "fillerYes",
                "Yes",
                "fillerend",
                "fillerend1"
            ]
        );
        for filler in chart.series.iter().filter(|s| !s.visible) {
            assert_eq!(values(filler), vec![0.0, 0.0]);
            assert!(filler.points.iter().all(|p| p.color.is_none()));
        }
    }

    #[test]
    fn test_order_reorders_series() {
        let a = column(0, "Q1", &[("Maybe", 1), ("No", 1), ("Yes", 1)], 0);
        let n = normalize_columns(vec![a.clone(), a.clone()]);
        let mut ctx = PipelineContext::default();
        ctx.set_order(order(&["Yes", "No", "Maybe"]));
        let chart = assemble_series(&n, &graph(GraphKind::Bar, StatKind::Count), &ctx).unwrap();
        let names: Vec<&str> = chart.visible_series().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Yes", "No", "Maybe"]);
        // Colours follow the final order
        assert_eq!(
            chart.visible_series().next().unwrap().points[0].color,
            Some(Rgb(215, 63, 9))
        );
    }

    #[test]
    fn test_order_reorders_single_column_points() {
        let n = normalize_columns(vec![column(0, "Q", &[("No", 1), ("Yes", 2)], 1)]);
        let mut ctx = PipelineContext::default();
        ctx.set_order(order(&["Yes", "No", "Unknown"]));
        let chart = assemble_series(&n, &graph(GraphKind::Bar, StatKind::Count), &ctx).unwrap();
        assert_eq!(chart.categories, vec!["Yes", "No", "Unknown"]);
    }

    #[test]
    fn test_apply_order_swaps_rather_than_sorts() {
        let mut items = vec!["a", "b", "c", "d"];
        apply_order(&mut items, &order(&["x", "y", "d"]), |s| *s);
        // "d" is swapped into slot 2, displacing "c" to the end
        assert_eq!(items, vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_apply_order_ignores_out_of_range_targets() {
        let mut items = vec!["b", "a"];
        apply_order(&mut items, &order(&["x", "y", "z", "b"]), |s| *s);
        assert_eq!(items, vec!["b", "a"]);
    }

    #[test]
    fn test_pie_sorted_descending_with_unknown() {
        let n = normalize_columns(vec![column(0, "Q", &[("a", 1), ("b", 5), ("c", 3)], 4)]);
        let ctx = PipelineContext::default();
        let chart = assemble_series(&n, &graph(GraphKind::Pie, StatKind::Count), &ctx).unwrap();
        assert_eq!(chart.categories, vec!["b", "Unknown", "c", "a"]);
        assert_eq!(values(&chart.series[0]), vec![5.0, 4.0, 3.0, 1.0]);
        assert_eq!(chart.series[0].points[0].color, Some(Rgb(215, 63, 9)));
        assert_eq!(chart.warnings.len(), 1);
    }

    #[test]
    fn test_pie_has_no_fillers() {
        let n = normalize_columns(vec![column(0, "Q", &[("a", 1)], 0)]);
        let ctx = PipelineContext::default();
        let chart = assemble_series(&n, &graph(GraphKind::Pie, StatKind::Count), &ctx).unwrap();
        assert!(chart.series.iter().all(|s| s.visible));
    }

    #[test]
    fn test_pie_rejects_multiple_columns() {
        let n = normalize_columns(vec![column(0, "A", &[], 0), column(1, "B", &[], 0)]);
        let ctx = PipelineContext::default();
        assert!(matches!(
            assemble_series(&n, &graph(GraphKind::Pie, StatKind::Count), &ctx),
            Err(ReportError::Schema(_))
        ));
    }

    #[test]
    fn test_graph_rejects_mean() {
        let n = normalize_columns(vec![column(0, "A", &[("one", 1)], 0)]);
        let ctx = PipelineContext::default();
        assert!(matches!(
            assemble_series(&n, &graph(GraphKind::Bar, StatKind::Mean), &ctx),
            Err(ReportError::Schema(_))
        ));
    }

    #[test]
    fn test_custom_palette_is_used() {
        let n = normalize_columns(vec![column(0, "Q", &[("a", 1), ("b", 1)], 0)]);
        let mut ctx = PipelineContext::default();
        ctx.set_palette(ColorPalette::new(vec![Rgb(1, 2, 3)]).unwrap());
        let chart = assemble_series(&n, &graph(GraphKind::Bar, StatKind::Count), &ctx).unwrap();
        assert!(chart.series[0]
            .points
            .iter()
            .all(|p| p.color == Some(Rgb(1, 2, 3))));
    }

    #[test]
    fn test_multi_column_values_follow_series_names() {
        let a = column(0, "Q1", &[("No", 1), ("Yes", 1)], 0);
        let b = column(1, "Q2", &[("Maybe", 5), ("Yes", 7)], 0);
        let n = normalize_columns(vec![a, b]);
        let ctx = PipelineContext::default();
        let chart = assemble_series(&n, &graph(GraphKind::Bar, StatKind::Count), &ctx).unwrap();

        let real: Vec<&Series> = chart.visible_series().collect();
        assert_eq!(real.len(), 2);
        assert_eq!(real[0].name, "No");
        assert_eq!(labels(real[0]), vec!["Q1", "Q2"]);
        assert_eq!(values(real[0]), vec![1.0, 0.0]);
        assert_eq!(real[1].name, "Yes");
        assert_eq!(labels(real[1]), vec!["Q1", "Q2"]);
        assert_eq!(values(real[1]), vec![1.0, 7.0]);
        assert!(chart.series.iter().all(|s| s.points.len() == 2));
    }
}
