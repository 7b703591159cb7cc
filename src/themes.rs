use egui::{Color32, Style};

pub mod heatscale;

pub use heatscale::{color_for, HeatScale, ScaleProfile, OVERFLOW_COLOR, ZERO_COLOR};

/// Semantic style for the `Heatmap` widget.
#[derive(Clone, Debug)]
pub struct HeatmapStyle {
    pub ink: Color32,
    pub outline: Color32,
    pub accent: Color32,
    pub row_label_width: f32,
    pub cell_height: f32,
    pub header_height: f32,
}

/// Semantic style for the `NetworkView` widget.
#[derive(Clone, Debug)]
pub struct NetworkStyle {
    pub ink: Color32,
    pub link: Color32,
    pub muted: Color32,
    pub node_radius: f32,
}

impl From<&Style> for HeatmapStyle {
    fn from(style: &Style) -> Self {
        let visuals = &style.visuals;
        Self {
            ink: visuals.text_color(),
            outline: visuals.widgets.noninteractive.bg_stroke.color,
            accent: visuals.selection.stroke.color,
            row_label_width: 220.0,
            cell_height: 28.0,
            header_height: 36.0,
        }
    }
}

impl From<&Style> for NetworkStyle {
    fn from(style: &Style) -> Self {
        let visuals = &style.visuals;
        let ink = visuals.text_color();
        Self {
            ink,
            link: blend(ink, visuals.panel_fill, 0.6),
            muted: Color32::GRAY,
            node_radius: 10.0,
        }
    }
}

// Simple sRGB linear interpolation for quick palette derivation.
pub fn blend(a: Color32, b: Color32, t: f32) -> Color32 {
    let r = (a.r() as f32 * (1.0 - t) + b.r() as f32 * t).round() as u8;
    let g = (a.g() as f32 * (1.0 - t) + b.g() as f32 * t).round() as u8;
    let bch = (a.b() as f32 * (1.0 - t) + b.b() as f32 * t).round() as u8;
    Color32::from_rgb(r, g, bch)
}

pub fn luma(color: Color32) -> f32 {
    // Cheap, perceptual-ish luma in sRGB space.
    let r = color.r() as f32 / 255.0;
    let g = color.g() as f32 / 255.0;
    let b = color.b() as f32 / 255.0;
    0.299 * r + 0.587 * g + 0.114 * b
}

pub fn text_color_on(background: Color32) -> Color32 {
    if luma(background) > 0.55 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}
