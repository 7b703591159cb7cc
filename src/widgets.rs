use std::fmt;

use eframe::egui;

use crate::dataflow::BackgroundSlot;

mod heatmap;
mod network;

pub use heatmap::{value_label, Heatmap, HeatmapResponse};
pub use network::{NetworkGraph, NetworkGraphResponse};

/// Picks up finished background work, shows a spinner while a request is
/// outstanding and the last error if it failed. Returns the current value,
/// which stays in place while a newer request is running or after it failed.
pub fn load_status<'a, T, E>(ui: &mut egui::Ui, slot: &'a mut BackgroundSlot<T, E>) -> Option<&'a mut T>
where
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    if slot.poll() {
        ui.ctx().request_repaint();
    }
    if slot.is_loading() {
        ui.add(egui::widgets::Spinner::new());
        ui.ctx()
            .request_repaint_after(std::time::Duration::from_millis(100));
    } else if let Some(err) = slot.error() {
        ui.colored_label(ui.visuals().error_fg_color, err.to_string());
    }
    slot.ready_mut()
}
