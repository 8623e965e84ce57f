use std::collections::BTreeMap;

use eframe::egui::{Align2, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::color::ColorMap;
use crate::data::aggregate::format_currency;
use crate::data::model::AggregationResult;
use crate::view::ScatterPoint;

const PLOT_HEIGHT: f32 = 300.0;

/// Axis formatter that prints `labels[i]` at integer positions only.
fn index_labels(labels: Vec<String>) -> impl Fn(GridMark, &std::ops::RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let i = mark.value.round();
        if (mark.value - i).abs() > 1e-6 || i < 0.0 {
            return String::new();
        }
        labels.get(i as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Sales per category (bar)
// ---------------------------------------------------------------------------

/// Vertical bars, one per group, each labelled with its currency total.
pub fn bar_chart(ui: &mut Ui, id: &str, result: &AggregationResult, colors: &ColorMap) {
    let labels: Vec<String> = (0..result.len()).map(|i| result.label(i)).collect();

    let bars: Vec<Bar> = result
        .rows
        .iter()
        .enumerate()
        .map(|(i, (_, v))| {
            Bar::new(i as f64, *v)
                .name(&labels[i])
                .fill(colors.color_for(&labels[i]))
                .width(0.6)
        })
        .collect();

    let texts: Vec<Text> = result
        .rows
        .iter()
        .enumerate()
        .map(|(i, (_, v))| {
            Text::new(PlotPoint::new(i as f64, *v), format_currency(*v)).anchor(Align2::CENTER_BOTTOM)
        })
        .collect();

    Plot::new(id)
        .height(PLOT_HEIGHT)
        .x_axis_formatter(index_labels(labels.clone()))
        .y_axis_label(result.value_field.as_str())
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
            for t in texts {
                plot_ui.text(t);
            }
        });
}

// ---------------------------------------------------------------------------
// Time series (line)
// ---------------------------------------------------------------------------

/// Chronological line of the monthly totals.
pub fn time_series(ui: &mut Ui, result: &AggregationResult) {
    let labels: Vec<String> = (0..result.len()).map(|i| result.label(i)).collect();
    let points: Vec<[f64; 2]> = result
        .rows
        .iter()
        .enumerate()
        .map(|(i, (_, v))| [i as f64, *v])
        .collect();

    Plot::new("time_series")
        .height(PLOT_HEIGHT)
        .x_axis_formatter(index_labels(labels))
        .x_axis_label("month_year")
        .y_axis_label("Amount")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::from(points.clone())).name("Amount").width(2.0));
            plot_ui.points(Points::new(PlotPoints::from(points)).radius(3.0).name("Amount"));
        });
}

// ---------------------------------------------------------------------------
// Sales vs profit (scatter)
// ---------------------------------------------------------------------------

/// Marker radius grows with the square root of quantity.
pub fn marker_radius(quantity: u32) -> f32 {
    2.0 + (quantity as f32).sqrt() * 1.5
}

/// Sales on x, profit on y, sized by quantity and coloured by category.
pub fn scatter(ui: &mut Ui, points: &[ScatterPoint], colors: &ColorMap) {
    // One series per (category, quantity) so each keeps a single radius.
    let mut series: BTreeMap<(&str, u32), Vec<[f64; 2]>> = BTreeMap::new();
    for p in points {
        series
            .entry((p.category.as_str(), p.quantity))
            .or_default()
            .push([p.sales, p.profit]);
    }

    Plot::new("sales_profit")
        .height(PLOT_HEIGHT + 100.0)
        .legend(Legend::default())
        .x_axis_label("Sales")
        .y_axis_label("Profit")
        .show(ui, |plot_ui| {
            for ((category, quantity), pts) in series {
                plot_ui.points(
                    Points::new(PlotPoints::from(pts))
                        .name(category)
                        .color(colors.color_for(category))
                        .radius(marker_radius(quantity)),
                );
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_labels_only_at_integer_marks() {
        let fmt = index_labels(vec!["Furniture".into(), "Technology".into()]);
        let mark = |value| GridMark { value, step_size: 0.5 };
        assert_eq!(fmt(mark(1.0), &(0.0..=2.0)), "Technology");
        assert_eq!(fmt(mark(0.5), &(0.0..=2.0)), "");
        assert_eq!(fmt(mark(5.0), &(0.0..=2.0)), "");
        assert_eq!(fmt(mark(-1.0), &(0.0..=2.0)), "");
    }

    #[test]
    fn marker_radius_grows_with_quantity() {
        assert!(marker_radius(9) > marker_radius(1));
        assert_eq!(marker_radius(0), 2.0);
    }
}
