use std::collections::HashMap;

use egui::{pos2, vec2, Align2, Color32, Pos2, Rect, Sense, Stroke, TextStyle, Ui};

use crate::graph::{GraphModel, Group, Highlight};
use crate::themes::NetworkStyle;

pub struct NetworkGraphResponse {
    pub response: egui::Response,
    pub selection_changed: bool,
}

/// Paints a tiered graph. Pinned nodes keep their positions; the rest are
/// spread along their tier's row. Clicking a category node toggles its
/// two-hop highlight.
#[must_use = "Use `NetworkGraph::show(ui)` to render this widget."]
pub struct NetworkGraph<'a> {
    graph: &'a GraphModel,
    selection: &'a mut Option<String>,
    height: f32,
    show_labels: bool,
    style: Option<NetworkStyle>,
}

impl<'a> NetworkGraph<'a> {
    pub fn new(graph: &'a GraphModel, selection: &'a mut Option<String>) -> Self {
        Self {
            graph,
            selection,
            height: 420.0,
            show_labels: true,
            style: None,
        }
    }

    pub fn height(mut self, height: f32) -> Self {
        self.height = height.max(64.0);
        self
    }

    pub fn show_labels(mut self, show_labels: bool) -> Self {
        self.show_labels = show_labels;
        self
    }

    pub fn style(mut self, style: NetworkStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn show(self, ui: &mut Ui) -> NetworkGraphResponse {
        let NetworkGraph {
            graph,
            selection,
            height,
            show_labels,
            style,
        } = self;
        let nstyle = style.unwrap_or_else(|| NetworkStyle::from(ui.style().as_ref()));
        let width = ui.available_width().max(128.0);
        let (rect, response) = ui.allocate_exact_size(vec2(width, height), Sense::hover());
        let before = selection.clone();
        if !ui.is_rect_visible(rect) || graph.is_empty() {
            return NetworkGraphResponse {
                response,
                selection_changed: false,
            };
        }

        let _paint_span = tracing::info_span!("network_graph_paint", nodes = graph.nodes.len()).entered();
        let positions = fit_to_rect(&layout(graph), rect.shrink(nstyle.node_radius * 2.0));
        let lit = selection
            .as_deref()
            .map(|id| graph.highlight(id))
            .unwrap_or_default();
        let lit_color = selection
            .as_deref()
            .and_then(|id| graph.node(id))
            .and_then(|node| node.color)
            .unwrap_or(nstyle.ink);

        let painter = ui.painter().with_clip_rect(rect);
        for (index, link) in graph.links.iter().enumerate() {
            let (Some(from), Some(to)) = (positions.get(&link.source), positions.get(&link.target))
            else {
                continue;
            };
            let stroke = if lit.links.contains(&index) {
                Stroke::new(1.5, lit_color)
            } else {
                Stroke::new(0.5, nstyle.link)
            };
            painter.line_segment([*from, *to], stroke);
        }

        let font_id = TextStyle::Small.resolve(ui.style());
        let mut clicked = None;
        for node in &graph.nodes {
            let Some(center) = positions.get(&node.id).copied() else {
                continue;
            };
            let fill = node_color(node.group, node.color, &node.id, &lit, lit_color, &nstyle);
            painter.circle_filled(center, nstyle.node_radius, fill);
            painter.circle_stroke(center, nstyle.node_radius, Stroke::new(1.0, Color32::WHITE));
            if show_labels {
                painter.text(
                    center + vec2(0.0, nstyle.node_radius + 2.0),
                    Align2::CENTER_TOP,
                    &node.id,
                    font_id.clone(),
                    fill,
                );
            }

            let hit = Rect::from_center_size(center, vec2(2.0, 2.0) * nstyle.node_radius);
            let sense = if node.group == Group::Category {
                Sense::click()
            } else {
                Sense::hover()
            };
            let node_resp = ui.interact(hit, response.id.with(("network_node", &node.id)), sense);
            if node_resp.clicked() {
                clicked = Some(node.id.clone());
            }
            let _ = node_resp.on_hover_text(node.category.as_deref().unwrap_or(&node.id));
        }

        if let Some(id) = clicked {
            if selection.as_deref() == Some(id.as_str()) {
                *selection = None;
            } else {
                *selection = Some(id);
            }
        }

        NetworkGraphResponse {
            response,
            selection_changed: *selection != before,
        }
    }
}

fn node_color(
    group: Group,
    own: Option<Color32>,
    id: &str,
    lit: &Highlight,
    lit_color: Color32,
    style: &NetworkStyle,
) -> Color32 {
    if lit.nodes.contains(id) {
        lit_color
    } else if lit.is_empty() || group == Group::Category {
        own.unwrap_or(style.muted)
    } else {
        style.muted
    }
}

/// Graph-space positions. Nodes without a pinned position are spread evenly
/// on a row per tier.
fn layout(graph: &GraphModel) -> HashMap<String, Pos2> {
    let mut free: [Vec<&str>; 3] = Default::default();
    let mut positions = HashMap::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        match node.fixed {
            Some(pos) => {
                positions.insert(node.id.clone(), pos);
            }
            None => free[u8::from(node.group) as usize - 1].push(&node.id),
        }
    }
    for (tier, ids) in free.iter().enumerate() {
        let y = 100.0 + 300.0 * tier as f32;
        for (slot, id) in ids.iter().enumerate() {
            positions.insert((*id).to_owned(), pos2(100.0 + 40.0 * slot as f32, y));
        }
    }
    positions
}

/// Maps graph-space positions into `rect`, preserving aspect ratio.
fn fit_to_rect(positions: &HashMap<String, Pos2>, rect: Rect) -> HashMap<String, Pos2> {
    let bounds = positions
        .values()
        .fold(Rect::NOTHING, |bounds, pos| bounds.union(Rect::from_min_size(*pos, egui::Vec2::ZERO)));
    let span = bounds.size().max(vec2(1.0, 1.0));
    let scale = (rect.width() / span.x).min(rect.height() / span.y);
    let offset = rect.center() - bounds.center().to_vec2() * scale;
    positions
        .iter()
        .map(|(id, pos)| (id.clone(), (pos.to_vec2() * scale + offset.to_vec2()).to_pos2()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build, CARGO_DELIVERY};
    use crate::record::Record;
    use serde_json::json;

    #[test]
    fn free_nodes_are_spread_by_tier() {
        let record = Record::from_value(json!({
            "location_id": "Himark",
            "vessel_name": "X",
            "delivery_report_id": "r1",
        }))
        .unwrap();
        let graph = build(&[record], &CARGO_DELIVERY);
        let positions = layout(&graph);
        assert_eq!(positions["Himark"].y, 100.0);
        assert_eq!(positions["X"].y, 400.0);
        assert_eq!(positions["r1"].y, 700.0);
    }

    #[test]
    fn fitting_keeps_points_inside() {
        let mut positions = HashMap::new();
        positions.insert("a".to_owned(), pos2(100.0, 100.0));
        positions.insert("b".to_owned(), pos2(700.0, 700.0));
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(300.0, 150.0));
        for pos in fit_to_rect(&positions, rect).values() {
            assert!(rect.expand(0.01).contains(*pos));
        }
    }
}
