use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{
    self, Align2, Color32, CornerRadius, FontId, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2,
};

use crate::color::ColorMap;
use crate::data::aggregate::format_currency;
use crate::data::model::AggregationResult;

const CHART_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Pie / donut
// ---------------------------------------------------------------------------

/// A slice's share of the whole, as `(label, value, fraction)`.
/// Non-positive values cannot be drawn and are left out.
pub fn pie_slices(result: &AggregationResult) -> Vec<(String, f64, f64)> {
    let total: f64 = result.rows.iter().map(|(_, v)| v.max(0.0)).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    result
        .rows
        .iter()
        .enumerate()
        .filter(|(_, (_, v))| *v > 0.0)
        .map(|(i, (_, v))| (result.label(i), *v, *v / total))
        .collect()
}

/// Pie chart with a legend; `hole` is the inner radius as a fraction.
pub fn pie_chart(ui: &mut Ui, result: &AggregationResult, colors: &ColorMap, hole: f32) {
    let slices = pie_slices(result);
    let (rect, response) = ui.allocate_exact_size(
        Vec2::new(ui.available_width(), CHART_HEIGHT),
        Sense::hover(),
    );
    let painter = ui.painter_at(rect);

    if slices.is_empty() {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "No data",
            FontId::proportional(14.0),
            ui.visuals().weak_text_color(),
        );
        return;
    }

    let radius = (rect.height() / 2.0 - 8.0).min(rect.width() / 3.0).max(10.0);
    let center = Pos2::new(rect.left() + radius + 8.0, rect.center().y);
    let on_circle = |angle: f32, r: f32| center + Vec2::angled(angle) * r;

    let hover = response.hover_pos();
    let mut hovered: Option<String> = None;

    let mut angle = -FRAC_PI_2;
    for (label, value, frac) in &slices {
        let sweep = *frac as f32 * TAU;
        let color = colors.color_for(label);
        let steps = ((sweep / 0.05).ceil() as usize).max(1);
        for k in 0..steps {
            let a0 = angle + sweep * k as f32 / steps as f32;
            let a1 = angle + sweep * (k + 1) as f32 / steps as f32;
            painter.add(Shape::convex_polygon(
                vec![center, on_circle(a0, radius), on_circle(a1, radius)],
                color,
                Stroke::NONE,
            ));
        }

        if let Some(pos) = hover {
            let d = pos - center;
            let r = d.length();
            let mut a = d.angle();
            if a < -FRAC_PI_2 {
                a += TAU;
            }
            if r <= radius && r >= radius * hole && a >= angle && a < angle + sweep {
                hovered = Some(format!("{label}: {}", format_currency(*value)));
            }
        }

        if *frac > 0.04 {
            let mid = angle + sweep / 2.0;
            painter.text(
                on_circle(mid, radius * (0.55 + hole / 2.0)),
                Align2::CENTER_CENTER,
                format!("{:.1}%", frac * 100.0),
                FontId::proportional(11.0),
                Color32::WHITE,
            );
        }
        angle += sweep;
    }

    if hole > 0.0 {
        painter.circle_filled(center, radius * hole, ui.visuals().panel_fill);
    }

    // Legend to the right of the pie.
    let mut y = rect.top() + 12.0;
    let x = center.x + radius + 24.0;
    for (label, _, _) in &slices {
        let swatch = Rect::from_min_size(Pos2::new(x, y - 5.0), Vec2::splat(10.0));
        painter.rect_filled(swatch, CornerRadius::same(2), colors.color_for(label));
        painter.text(
            Pos2::new(x + 16.0, y),
            Align2::LEFT_CENTER,
            label,
            FontId::proportional(12.0),
            ui.visuals().text_color(),
        );
        y += 18.0;
    }

    if let Some(text) = hovered {
        response.on_hover_text_at_pointer(text);
    }
}

// ---------------------------------------------------------------------------
// Treemap
// ---------------------------------------------------------------------------

/// A labelled node of the treemap; leaves have no children.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub label: String,
    pub value: f64,
    pub children: Vec<TreeNode>,
}

/// Nest an aggregation keyed by a path (e.g. region / category / sub-category)
/// into a tree. Non-positive sums are dropped.
pub fn build_tree(result: &AggregationResult) -> Vec<TreeNode> {
    fn insert(level: &mut BTreeMap<String, TreeNode>, path: &[String], value: f64) {
        let Some((head, rest)) = path.split_first() else {
            return;
        };
        let node = level.entry(head.clone()).or_insert_with(|| TreeNode {
            label: head.clone(),
            value: 0.0,
            children: Vec::new(),
        });
        node.value += value;
        if !rest.is_empty() {
            let mut children: BTreeMap<String, TreeNode> = node
                .children
                .drain(..)
                .map(|c| (c.label.clone(), c))
                .collect();
            insert(&mut children, rest, value);
            node.children = children.into_values().collect();
        }
    }

    let mut roots = BTreeMap::new();
    for (key, value) in &result.rows {
        if *value > 0.0 {
            insert(&mut roots, key, *value);
        }
    }
    roots.into_values().collect()
}

/// Split `rect` proportionally to `weights` along one axis.
pub fn slice(rect: Rect, weights: &[f64], horizontal: bool) -> Vec<Rect> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(weights.len());
    let mut offset = 0.0f32;
    for w in weights {
        let share = (*w / total) as f32;
        let r = if horizontal {
            let width = rect.width() * share;
            Rect::from_min_size(
                Pos2::new(rect.left() + offset, rect.top()),
                Vec2::new(width, rect.height()),
            )
        } else {
            let height = rect.height() * share;
            Rect::from_min_size(
                Pos2::new(rect.left(), rect.top() + offset),
                Vec2::new(rect.width(), height),
            )
        };
        offset += if horizontal { r.width() } else { r.height() };
        out.push(r);
    }
    out
}

/// Slice-and-dice treemap; leaves coloured by their own label.
pub fn treemap(ui: &mut Ui, result: &AggregationResult, colors: &ColorMap) {
    let roots = build_tree(result);
    let (rect, response) = ui.allocate_exact_size(
        Vec2::new(ui.available_width(), CHART_HEIGHT + 170.0),
        Sense::hover(),
    );
    let painter = ui.painter_at(rect);
    if roots.is_empty() {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "No data",
            FontId::proportional(14.0),
            ui.visuals().weak_text_color(),
        );
        return;
    }

    let hover = response.hover_pos();
    let mut hovered: Option<String> = None;
    let mut path: Vec<&str> = Vec::new();
    draw_nodes(
        &painter,
        ui.visuals().text_color(),
        &roots,
        rect,
        true,
        colors,
        hover,
        &mut path,
        &mut hovered,
    );

    if let Some(text) = hovered {
        response.on_hover_text_at_pointer(text);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_nodes<'a>(
    painter: &egui::Painter,
    text_color: Color32,
    nodes: &'a [TreeNode],
    rect: Rect,
    horizontal: bool,
    colors: &ColorMap,
    hover: Option<Pos2>,
    path: &mut Vec<&'a str>,
    hovered: &mut Option<String>,
) {
    let weights: Vec<f64> = nodes.iter().map(|n| n.value).collect();
    for (node, cell) in nodes.iter().zip(slice(rect, &weights, horizontal)) {
        path.push(&node.label);
        if node.children.is_empty() {
            let inner = cell.shrink(1.0);
            painter.rect_filled(inner, CornerRadius::ZERO, colors.color_for(&node.label));
            if inner.width() > 48.0 && inner.height() > 16.0 {
                painter.text(
                    inner.left_top() + Vec2::new(4.0, 3.0),
                    Align2::LEFT_TOP,
                    &node.label,
                    FontId::proportional(11.0),
                    Color32::BLACK,
                );
            }
            if hover.is_some_and(|p| inner.contains(p)) {
                *hovered = Some(format!("{}\nSales: {}", path.join(" / "), format_currency(node.value)));
            }
        } else {
            // Reserve a header strip for the group label when there is room.
            let header = if cell.height() > 40.0 && cell.width() > 40.0 { 16.0 } else { 0.0 };
            if header > 0.0 {
                painter.text(
                    cell.left_top() + Vec2::new(3.0, 1.0),
                    Align2::LEFT_TOP,
                    &node.label,
                    FontId::proportional(12.0),
                    text_color,
                );
            }
            let body = Rect::from_min_max(cell.min + Vec2::new(0.0, header), cell.max);
            draw_nodes(
                painter,
                text_color,
                &node.children,
                body.shrink(1.0),
                !horizontal,
                colors,
                hover,
                path,
                hovered,
            );
        }
        path.pop();
    }
}
