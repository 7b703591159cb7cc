use egui::{pos2, vec2, Align2, Color32, Rect, Response, Sense, Stroke, TextStyle, Ui, Widget};

use crate::locations::clean_location_name;
use crate::pivot::PivotTable;
use crate::themes::{text_color_on, HeatScale, HeatmapStyle};

/// Whole numbers print without a fraction.
pub fn value_label(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}

/// One date of a pivot table drawn as a colored grid: a row per entity, a
/// column per location. Cells missing from the table are drawn as zero.
#[must_use = "You should put this widget in a ui with `ui.add(widget);`"]
pub struct Heatmap<'a> {
    table: &'a PivotTable,
    date: &'a str,
    rows: &'a [String],
    columns: &'a [String],
    scale: HeatScale,
    desired_width: Option<f32>,
    show_values: bool,
    reorderable: bool,
    style: Option<HeatmapStyle>,
}

/// What [`Heatmap::show`] reports back.
pub struct HeatmapResponse {
    pub response: Response,
    /// A row label was dragged from the first position onto the second.
    pub moved: Option<(usize, usize)>,
}

impl<'a> Heatmap<'a> {
    pub fn new(
        table: &'a PivotTable,
        date: &'a str,
        rows: &'a [String],
        columns: &'a [String],
        scale: HeatScale,
    ) -> Self {
        Self {
            table,
            date,
            rows,
            columns,
            scale,
            desired_width: None,
            show_values: true,
            reorderable: false,
            style: None,
        }
    }

    pub fn desired_width(mut self, desired_width: f32) -> Self {
        self.desired_width = Some(desired_width);
        self
    }

    pub fn show_values(mut self, show_values: bool) -> Self {
        self.show_values = show_values;
        self
    }

    /// Lets row labels be dragged onto other rows.
    pub fn reorderable(mut self, reorderable: bool) -> Self {
        self.reorderable = reorderable;
        self
    }

    pub fn style(mut self, style: HeatmapStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn show(self, ui: &mut Ui) -> HeatmapResponse {
        let Heatmap {
            table,
            date,
            rows,
            columns,
            scale,
            desired_width,
            show_values,
            reorderable,
            style,
        } = self;

        let hstyle = style.unwrap_or_else(|| HeatmapStyle::from(ui.style().as_ref()));
        let font_id = TextStyle::Small.resolve(ui.style());
        let desired_width = desired_width.unwrap_or_else(|| ui.available_width().max(128.0));
        let total_h = hstyle.header_height + hstyle.cell_height * rows.len() as f32;

        let (outer_rect, response) =
            ui.allocate_exact_size(vec2(desired_width, total_h), Sense::hover());
        let mut moved = None;
        if !ui.is_rect_visible(outer_rect) {
            return HeatmapResponse { response, moved };
        }

        let painter = ui.painter().with_clip_rect(outer_rect);
        let label_w = hstyle.row_label_width.min(desired_width * 0.4);
        let grid_left = outer_rect.left() + label_w;
        let cell_w = if columns.is_empty() {
            0.0
        } else {
            (outer_rect.right() - grid_left) / columns.len() as f32
        };
        let grid_top = outer_rect.top() + hstyle.header_height;

        for (col, location) in columns.iter().enumerate() {
            let rect = Rect::from_min_size(
                pos2(grid_left + col as f32 * cell_w, outer_rect.top()),
                vec2(cell_w, hstyle.header_height),
            );
            painter.with_clip_rect(rect).text(
                rect.center(),
                Align2::CENTER_CENTER,
                clean_location_name(location),
                font_id.clone(),
                hstyle.ink,
            );
            let _ = ui
                .interact(rect, response.id.with(("heatmap_column", col)), Sense::hover())
                .on_hover_text(location.as_str());
        }

        let drag_id = response.id.with("heatmap_drag_row");
        for (row, entity) in rows.iter().enumerate() {
            let top = grid_top + row as f32 * hstyle.cell_height;
            let label_rect = Rect::from_min_size(
                pos2(outer_rect.left(), top),
                vec2(label_w, hstyle.cell_height),
            );
            let sense = if reorderable {
                Sense::click_and_drag()
            } else {
                Sense::hover()
            };
            let label_resp = ui.interact(label_rect, response.id.with(("heatmap_row", row)), sense);
            let label_color = if label_resp.dragged() {
                hstyle.accent
            } else {
                hstyle.ink
            };
            painter.with_clip_rect(label_rect).text(
                pos2(label_rect.left() + 4.0, label_rect.center().y),
                Align2::LEFT_CENTER,
                entity,
                font_id.clone(),
                label_color,
            );
            if label_resp.drag_started() {
                ui.data_mut(|data| data.insert_temp(drag_id, row));
            }
            if label_resp.drag_stopped() {
                let from = ui.data_mut(|data| data.remove_temp::<usize>(drag_id));
                let target = ui.ctx().pointer_interact_pos().map(|pos| {
                    (((pos.y - grid_top) / hstyle.cell_height).floor().max(0.0) as usize)
                        .min(rows.len().saturating_sub(1))
                });
                if let (Some(from), Some(to)) = (from, target) {
                    if from != to {
                        moved = Some((from, to));
                    }
                }
            }
            let _ = label_resp.on_hover_text(entity.as_str());

            for (col, location) in columns.iter().enumerate() {
                let value = table.get(date, entity, location);
                let cell = Rect::from_min_size(
                    pos2(grid_left + col as f32 * cell_w, top),
                    vec2(cell_w, hstyle.cell_height),
                );
                let fill = scale.color_for(value).unwrap_or(Color32::TRANSPARENT);
                let cell_resp =
                    ui.interact(cell, response.id.with(("heatmap_cell", row, col)), Sense::hover());
                painter.rect_filled(cell.shrink(0.5), 0.0, fill);
                if cell_resp.hovered() {
                    painter.rect_stroke(
                        cell,
                        0.0,
                        Stroke::new(1.5, hstyle.accent),
                        egui::StrokeKind::Inside,
                    );
                }
                if show_values && cell_w >= 24.0 {
                    painter.with_clip_rect(cell).text(
                        cell.center(),
                        Align2::CENTER_CENTER,
                        value_label(value),
                        font_id.clone(),
                        text_color_on(fill),
                    );
                }
                let _ = cell_resp.on_hover_text(format!("Value: {}", value_label(value)));
            }
        }

        let grid_rect = Rect::from_min_max(pos2(grid_left, grid_top), outer_rect.right_bottom());
        painter.rect_stroke(
            grid_rect,
            0.0,
            Stroke::new(1.0, hstyle.outline),
            egui::StrokeKind::Inside,
        );

        HeatmapResponse { response, moved }
    }
}

impl Widget for Heatmap<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        self.show(ui).response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_drop_trailing_zero_fractions() {
        assert_eq!(value_label(3.0), "3");
        assert_eq!(value_label(0.0), "0");
        assert_eq!(value_label(2.5), "2.50");
    }
}
