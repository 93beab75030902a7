//! Off-screen reconstruction of a page as an SVG document.
//!
//! Each object becomes a `<g>` translated to its top-left corner and rotated
//! about its centre, carrying opacity and an optional Gaussian blur. Inside
//! the group, content is laid out in object-local coordinates exactly as the
//! editor draws it: shapes inset by their stroke width, text wrapped to the
//! box with a 1.2 line height, images drawn to fit their box.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use folio_core::{DesignObject, ObjectKind, Page, ShapeKind, ShapeProps, TextAlign, TextProps};

use crate::loader::ResolvedImages;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

/// Average glyph advance as a multiple of the font size, used for wrapping.
pub const GLYPH_ADVANCE: f64 = 0.55;

/// How an image object's picture fills its box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    /// Fill the box, cropping overflow (matches the editor).
    #[default]
    Cover,
    /// Fit inside the box, letterboxing.
    Contain,
    /// Stretch to the box.
    Fill,
}

impl ImageFit {
    fn preserve_aspect_ratio(self) -> &'static str {
        match self {
            Self::Cover => "xMidYMid slice",
            Self::Contain => "xMidYMid meet",
            Self::Fill => "none",
        }
    }
}

/// Scene-building options derived from the export configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneOptions {
    /// Output pixels per canvas pixel.
    pub scale: f64,
    /// Page background as RGBA bytes.
    pub background: [u8; 4],
    /// Fit for image objects.
    pub image_fit: ImageFit,
}

/// Build the SVG for one page.
///
/// The root element is sized to the output raster; its `viewBox` is the
/// page's canvas, so everything inside is in canvas pixels. Sources missing
/// from `images` render blank.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn page_svg(page: &Page, images: &ResolvedImages, options: &SceneOptions) -> String {
    let view_w = page.canvas_size.width;
    let view_h = page.canvas_size.height;
    let out_w = (view_w * options.scale).round().max(1.0) as u32;
    let out_h = (view_h * options.scale).round().max(1.0) as u32;

    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
    );

    let bg = &options.background;
    let bg_alpha = f64::from(bg[3]) / 255.0;
    let _ = write!(
        svg,
        "<rect width=\"{view_w}\" height=\"{view_h}\" fill=\"rgb({},{},{})\" fill-opacity=\"{bg_alpha}\"/>",
        bg[0], bg[1], bg[2],
    );

    for (index, object) in page.objects.iter().enumerate() {
        render_object(&mut svg, index, object, images, options.image_fit);
    }

    svg.push_str("</svg>");
    svg
}

fn render_object(
    svg: &mut String,
    index: usize,
    object: &DesignObject,
    images: &ResolvedImages,
    image_fit: ImageFit,
) {
    let (w, h) = (object.width, object.height);
    let blur = object.blur.filter(|b| *b > 0.0);

    if let Some(std_dev) = blur {
        let _ = write!(
            svg,
            "<defs><filter id=\"blur{index}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\"><feGaussianBlur stdDeviation=\"{std_dev}\"/></filter></defs>",
        );
    }

    let _ = write!(
        svg,
        "<g transform=\"translate({} {}) rotate({} {} {})\" opacity=\"{}\"",
        object.x,
        object.y,
        object.rotation,
        w / 2.0,
        h / 2.0,
        object.opacity,
    );
    if blur.is_some() {
        let _ = write!(svg, " filter=\"url(#blur{index})\"");
    }
    svg.push('>');

    match &object.kind {
        ObjectKind::Text(props) => render_text(svg, index, w, h, props),
        ObjectKind::Shape(props) => render_shape(svg, index, w, h, props, images),
        ObjectKind::Image(props) => {
            if let Some(image) = images.get(&props.src) {
                let _ = write!(
                    svg,
                    "<image href=\"{}\" x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"{}\"/>",
                    image.data_uri,
                    image_fit.preserve_aspect_ratio(),
                );
            }
        }
    }

    svg.push_str("</g>");
}

fn render_text(svg: &mut String, index: usize, w: f64, h: f64, props: &TextProps) {
    let font_size = props.font_size;
    let line_height = font_size * LINE_HEIGHT;
    // Half-leading plus a typical ascent puts the baseline here.
    let first_baseline = (line_height - font_size) / 2.0 + font_size * 0.8;
    let (anchor, x) = match props.text_align {
        TextAlign::Left => ("start", 0.0),
        TextAlign::Center => ("middle", w / 2.0),
        TextAlign::Right => ("end", w),
    };

    // Text overflowing the box is hidden.
    let _ = write!(
        svg,
        "<defs><clipPath id=\"clip{index}\"><rect width=\"{w}\" height=\"{h}\"/></clipPath></defs>",
    );
    let _ = write!(
        svg,
        "<text clip-path=\"url(#clip{index})\" font-family=\"{}, sans-serif\" font-size=\"{font_size}\" font-weight=\"{}\" fill=\"{}\" text-anchor=\"{anchor}\" xml:space=\"preserve\">",
        escape_xml(&props.font_family),
        props.font_weight,
        escape_xml(&props.color),
    );

    let max_chars = max_chars_per_line(w, font_size);
    let mut y = first_baseline;
    for line in wrap_text(&props.text, max_chars) {
        if !line.is_empty() {
            let _ = write!(svg, "<tspan x=\"{x}\" y=\"{y}\">{}</tspan>", escape_xml(&line));
        }
        y += line_height;
        if y - font_size > h {
            break;
        }
    }

    svg.push_str("</text>");
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn max_chars_per_line(width: f64, font_size: f64) -> usize {
    let advance = (font_size * GLYPH_ADVANCE).max(1.0);
    ((width / advance).floor() as usize).max(1)
}

/// Greedy word wrap that keeps explicit newlines and breaks words longer
/// than a line.
#[must_use]
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split(' ') {
            let word_len = word.chars().count();
            let needed = if line_len == 0 { word_len } else { line_len + 1 + word_len };
            if needed <= max_chars {
                if line_len > 0 {
                    line.push(' ');
                }
                line.push_str(word);
                line_len = needed;
                continue;
            }
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            let mut chars: Vec<char> = word.chars().collect();
            while chars.len() > max_chars {
                let rest = chars.split_off(max_chars);
                lines.push(chars.into_iter().collect());
                chars = rest;
            }
            line_len = chars.len();
            line = chars.into_iter().collect();
        }
        lines.push(line);
    }

    lines
}

fn render_shape(
    svg: &mut String,
    index: usize,
    w: f64,
    h: f64,
    props: &ShapeProps,
    images: &ResolvedImages,
) {
    let sw = props.stroke_width;

    let fill = match &props.background {
        Some(background) => match images.get(&background.image) {
            Some(image) => {
                // The tile covers the drawn shape; image offsets and size are
                // relative to the object box.
                let (tx, ty, tw, th) = fill_tile(props.shape, w, h, sw);
                let _ = write!(
                    svg,
                    "<defs><pattern id=\"fill{index}\" patternUnits=\"userSpaceOnUse\" x=\"{tx}\" y=\"{ty}\" width=\"{tw}\" height=\"{th}\"><image href=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid slice\"/></pattern></defs>",
                    image.data_uri,
                    (background.position.x - 50.0) * 2.0 / 100.0 * w,
                    (background.position.y - 50.0) * 2.0 / 100.0 * h,
                    background.scale * w,
                    background.scale * h,
                );
                format!("url(#fill{index})")
            }
            None => "none".to_string(),
        },
        None => escape_xml(&props.fill),
    };
    let stroke = if sw > 0.0 {
        format!("stroke=\"{}\" stroke-width=\"{sw}\"", escape_xml(&props.stroke))
    } else {
        "stroke=\"none\"".to_string()
    };

    match props.shape {
        ShapeKind::Rectangle => {
            let _ = write!(
                svg,
                "<rect x=\"{sw}\" y=\"{sw}\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"{fill}\" {stroke}/>",
                (w - sw * 2.0).max(0.0),
                (h - sw * 2.0).max(0.0),
                props.corner_radius,
            );
        }
        ShapeKind::Circle => {
            let _ = write!(
                svg,
                "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" fill=\"{fill}\" {stroke}/>",
                w / 2.0,
                h / 2.0,
                (w / 2.0 - sw).max(0.0),
                (h / 2.0 - sw).max(0.0),
            );
        }
        ShapeKind::Triangle => {
            let points = format!(
                "{},{sw} {},{} {sw},{}",
                w / 2.0,
                w - sw,
                h - sw,
                h - sw,
            );
            let _ = write!(svg, "<polygon points=\"{points}\" fill=\"{fill}\" {stroke}/>");
        }
        ShapeKind::Star => {
            let points = star_points(w, h, sw)
                .iter()
                .map(|(x, y)| format!("{x},{y}"))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(svg, "<polygon points=\"{points}\" fill=\"{fill}\" {stroke}/>");
        }
    }
}

/// Bounding box `(x, y, width, height)` of a shape as drawn inside its
/// object box.
fn fill_tile(shape: ShapeKind, w: f64, h: f64, sw: f64) -> (f64, f64, f64, f64) {
    match shape {
        ShapeKind::Star => {
            let points = star_points(w, h, sw);
            let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
            let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
            for (x, y) in points {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
            (min_x, min_y, max_x - min_x, max_y - min_y)
        }
        ShapeKind::Rectangle | ShapeKind::Circle | ShapeKind::Triangle => (
            sw,
            sw,
            (w - sw * 2.0).max(0.0),
            (h - sw * 2.0).max(0.0),
        ),
    }
}

/// Ten alternating outer/inner vertices of a five-pointed star, first point
/// straight up.
#[must_use]
pub fn star_points(w: f64, h: f64, stroke_width: f64) -> Vec<(f64, f64)> {
    let (cx, cy) = (w / 2.0, h / 2.0);
    let outer = (w.min(h) / 2.0 - stroke_width).max(0.0);
    let inner = outer * 0.4;
    (0..10)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = f64::from(i) * std::f64::consts::PI / 5.0 - std::f64::consts::FRAC_PI_2;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
