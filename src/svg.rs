//! SVG preview of a computed composite layout.
//!
//! Draws the canvas scaled into a single panel: the frame band, the grid
//! cells in grid mode, and each placement labeled with its image index.
//! Useful for eyeballing layout math without rendering any pixels.
//!
//! # Example
//!
//! ```
//! use zencompose::layout::compute_layout;
//! use zencompose::params::{ArrangementMode, LayoutParameters};
//! use zencompose::svg::render_layout_svg;
//! use zencompose::Size;
//!
//! let params = LayoutParameters::new(ArrangementMode::Grid).padding_slider(10.0);
//! let layout = compute_layout(&[Size::new(400, 300), Size::new(300, 400)], &params).unwrap();
//!
//! let svg = render_layout_svg(&layout);
//! assert!(svg.contains("grid"));
//! ```

use crate::geometry::Rect;
use crate::layout::CompositeLayout;

/// Maximum pixel width of the canvas panel.
const MAX_PANEL_W: f64 = 480.0;
/// Maximum pixel height of the canvas panel.
const MAX_PANEL_H: f64 = 360.0;
/// Horizontal margin.
const MARGIN_X: f64 = 40.0;
/// Top and bottom margin.
const MARGIN_Y: f64 = 24.0;
/// Height of the title and annotation lines above the panel.
const HEADER_H: f64 = 40.0;

/// Render a complete SVG document previewing `layout`.
pub fn render_layout_svg(layout: &CompositeLayout) -> String {
    let (pw, ph, scale) = scale_to_fit(layout.canvas.width, layout.canvas.height);
    let total_w = MAX_PANEL_W + 2.0 * MARGIN_X;
    let total_h = MARGIN_Y + HEADER_H + ph + MARGIN_Y;
    let panel_x = (total_w - pw) / 2.0;
    let panel_y = MARGIN_Y + HEADER_H;
    let center_x = total_w / 2.0;

    let mut svg = String::with_capacity(2048);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        total_w as u32, total_h as u32, total_w, total_h
    ));
    svg.push('\n');

    svg.push_str(r##"<style>
  text { font-family: "Consolas", "DejaVu Sans Mono", "Courier New", monospace; }
  .label { font-size: 13px; font-weight: bold; fill: #333; }
  .annotation { font-size: 11px; fill: #666; }
  .canvas { fill: #e8e8e8; stroke: #999; stroke-width: 1; }
  .border { fill: none; stroke: #c9853a; stroke-opacity: 0.7; }
  .cell { fill: none; stroke: #aaa; stroke-width: 1; stroke-dasharray: 4,2; }
  .placement { fill: #6ba3d6; stroke: #2c6faa; stroke-width: 1.5; }
  .index { font-size: 12px; fill: #fff; }
  @media (prefers-color-scheme: dark) {
    .label { fill: #e0e0e0; }
    .annotation { fill: #aaa; }
    .canvas { fill: #2d2d2d; stroke: #555; }
    .cell { stroke: #666; }
    .placement { fill: #3a72a4; stroke: #5a9fd4; }
  }
</style>
"##);

    let title = format!(
        "{}  {}×{}",
        layout.arrangement, layout.canvas.width, layout.canvas.height
    );
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" class="label" text-anchor="middle">{}</text>"#,
        center_x,
        MARGIN_Y + 14.0,
        escape_xml(&title)
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" class="annotation" text-anchor="middle">{}</text>"#,
        center_x,
        MARGIN_Y + 30.0,
        escape_xml(&annotation(layout))
    ));
    svg.push('\n');

    svg.push_str(&format!(
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" class="canvas"/>"#,
        panel_x, panel_y, pw, ph
    ));
    svg.push('\n');

    let band = layout.border_band();
    if band > 0 {
        let stroke = band as f64 * scale;
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" class="border" stroke-width="{:.1}"/>"#,
            panel_x + stroke / 2.0,
            panel_y + stroke / 2.0,
            (pw - stroke).max(0.0),
            (ph - stroke).max(0.0),
            stroke
        ));
        svg.push('\n');
    }

    if let Some(grid) = layout.grid {
        let cell = grid.cell as f64;
        let pitch = cell + layout.padding_px;
        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let x = layout.border_px + col as f64 * pitch;
                let y = layout.border_px + row as f64 * pitch;
                svg.push_str(&format!(
                    r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" class="cell"/>"#,
                    panel_x + x * scale,
                    panel_y + y * scale,
                    cell * scale,
                    cell * scale
                ));
                svg.push('\n');
            }
        }
    }

    for p in &layout.placements {
        let (x, y, w, h) = scaled(p.rect, scale);
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" class="placement"/>"#,
            panel_x + x,
            panel_y + y,
            w,
            h
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" class="index" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            panel_x + x + w / 2.0,
            panel_y + y + h / 2.0,
            p.index
        ));
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}

fn annotation(layout: &CompositeLayout) -> String {
    let mut parts = vec![format!("{} images", layout.placements.len())];
    if layout.padding_px > 0.0 {
        parts.push(format!("padding {:.1}px", layout.padding_px));
    }
    if layout.has_border() {
        parts.push(format!("border {}px", layout.border_band()));
    }
    if let Some(grid) = layout.grid {
        parts.push(format!("{}×{} cells of {}px", grid.cols, grid.rows, grid.cell));
    }
    parts.join(", ")
}

/// Scale canvas dimensions to fit the panel, preserving aspect ratio.
fn scale_to_fit(width: u32, height: u32) -> (f64, f64, f64) {
    let w = width as f64;
    let h = height as f64;
    if w == 0.0 || h == 0.0 {
        return (1.0, 1.0, 1.0);
    }
    let scale = (MAX_PANEL_W / w).min(MAX_PANEL_H / h);
    (w * scale, h * scale, scale)
}

fn scaled(r: Rect, scale: f64) -> (f64, f64, f64, f64) {
    (
        r.x as f64 * scale,
        r.y as f64 * scale,
        r.width as f64 * scale,
        r.height as f64 * scale,
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
