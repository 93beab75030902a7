//! Design objects - the text, shape, and image elements placed on a page.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Bounds, MIN_SIZE};

/// Smallest allowed background-image scale for shape fills.
pub const MIN_BACKGROUND_SCALE: f64 = 0.5;

/// Largest background-image scale offered by the property editor.
pub const MAX_BACKGROUND_SCALE: f64 = 3.0;

/// Unique identifier for a design object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Create a new unique object ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Horizontal text alignment within the object box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

/// Outline of a shape object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Rectangle, optionally with rounded corners.
    Rectangle,
    /// Ellipse inscribed in the box.
    Circle,
    /// Isosceles triangle pointing up.
    Triangle,
    /// Five-pointed star.
    Star,
}

/// Offset of a background image inside its shape, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundPosition {
    /// Horizontal offset, 0..=100 (50 = centered).
    pub x: f64,
    /// Vertical offset, 0..=100 (50 = centered).
    pub y: f64,
}

impl Default for BackgroundPosition {
    fn default() -> Self {
        Self { x: 50.0, y: 50.0 }
    }
}

/// Image used as the fill of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundFill {
    /// Image source URI or data URI.
    pub image: String,
    /// Pan offset inside the shape.
    #[serde(default)]
    pub position: BackgroundPosition,
    /// Zoom factor (1.0 = cover the shape box).
    #[serde(default = "default_background_scale")]
    pub scale: f64,
}

fn default_background_scale() -> f64 {
    1.0
}

impl BackgroundFill {
    /// Centered fill at scale 1.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            position: BackgroundPosition::default(),
            scale: 1.0,
        }
    }
}

/// Properties specific to text objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    /// Text content; newlines start new lines.
    pub text: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// CSS-style font family name.
    pub font_family: String,
    /// Numeric font weight (100-900).
    pub font_weight: u16,
    /// Horizontal alignment.
    #[serde(default)]
    pub text_align: TextAlign,
    /// Text color as hex.
    pub color: String,
}

/// Properties specific to shape objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProps {
    /// Outline kind.
    pub shape: ShapeKind,
    /// Fill color as hex.
    pub fill: String,
    /// Stroke color as hex.
    pub stroke: String,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Corner radius, only used by rectangles.
    #[serde(default)]
    pub corner_radius: f64,
    /// Optional image fill replacing the solid fill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundFill>,
}

/// Properties specific to image objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    /// Image source URI or data URI.
    pub src: String,
    /// Intrinsic width, used by "reset to original size".
    pub natural_width: f64,
    /// Intrinsic height, used by "reset to original size".
    pub natural_height: f64,
}

/// The kind-specific part of a design object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    /// A text box.
    Text(TextProps),
    /// A vector shape.
    Shape(ShapeProps),
    /// A raster image.
    Image(ImageProps),
}

/// A design object: one visual element placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignObject {
    /// Unique identifier.
    pub id: ObjectId,
    /// Left edge in page pixels.
    pub x: f64,
    /// Top edge in page pixels.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
    /// Rotation about the centre, in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Locked objects can be selected but not moved, resized, or rotated.
    #[serde(default)]
    pub locked: bool,
    /// Gaussian blur radius in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    /// Kind-specific properties.
    #[serde(flatten)]
    pub kind: ObjectKind,
}

fn default_opacity() -> f64 {
    1.0
}

impl DesignObject {
    /// Create an object of the given kind with default geometry.
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            id: ObjectId::new(),
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            opacity: 1.0,
            locked: false,
            blur: None,
            kind,
        }
    }

    /// Default text box as created by the text tool.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(ObjectKind::Text(TextProps {
            text: content.into(),
            font_size: 24.0,
            font_family: "Inter".to_string(),
            font_weight: 400,
            text_align: TextAlign::Left,
            color: "#000000".to_string(),
        }))
        .with_bounds(Bounds::new(400.0, 300.0, 200.0, 50.0))
    }

    /// Default shape as created by the shape tool.
    #[must_use]
    pub fn shape(shape: ShapeKind) -> Self {
        let corner_radius = if shape == ShapeKind::Rectangle { 8.0 } else { 0.0 };
        Self::new(ObjectKind::Shape(ShapeProps {
            shape,
            fill: "#3b82f6".to_string(),
            stroke: "#1e40af".to_string(),
            stroke_width: 2.0,
            corner_radius,
            background: None,
        }))
        .with_bounds(Bounds::new(450.0, 300.0, 150.0, 150.0))
    }

    /// Image object sized to its intrinsic dimensions.
    #[must_use]
    pub fn image(src: impl Into<String>, natural_width: f64, natural_height: f64) -> Self {
        Self::new(ObjectKind::Image(ImageProps {
            src: src.into(),
            natural_width,
            natural_height,
        }))
        .with_bounds(Bounds::new(400.0, 250.0, natural_width, natural_height))
    }

    /// Set position and size.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.set_bounds(bounds);
        self
    }

    /// Set the rotation in degrees.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set whether the object is locked.
    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Current position and size.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    /// Replace position and size.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.x = bounds.x;
        self.y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
    }

    /// Kind name as used in the serialized form.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Text(_) => "text",
            ObjectKind::Shape(_) => "shape",
            ObjectKind::Image(_) => "image",
        }
    }

    /// Text properties, if this is a text object.
    #[must_use]
    pub fn as_text(&self) -> Option<&TextProps> {
        match &self.kind {
            ObjectKind::Text(props) => Some(props),
            _ => None,
        }
    }

    /// Every image reference this object needs to paint: the source of an
    /// image object or the background fill of a shape.
    pub fn image_refs(&self) -> impl Iterator<Item = &str> {
        let reference = match &self.kind {
            ObjectKind::Image(props) => Some(props.src.as_str()),
            ObjectKind::Shape(ShapeProps {
                background: Some(fill),
                ..
            }) => Some(fill.image.as_str()),
            _ => None,
        };
        reference.into_iter().filter(|src| !src.is_empty())
    }

    /// Check if a page-space point hits this object (rotation aware).
    #[must_use]
    pub fn contains_point(&self, point: kurbo::Point) -> bool {
        self.bounds().contains_rotated(point, self.rotation)
    }

    /// Copy with a fresh ID, offset by `(dx, dy)`.
    #[must_use]
    pub fn duplicated(&self, dx: f64, dy: f64) -> Self {
        let mut copy = self.clone();
        copy.id = ObjectId::new();
        copy.x += dx;
        copy.y += dy;
        copy
    }

    /// Restore an image object to its intrinsic size. Returns `false` for
    /// other kinds or when the intrinsic size is unknown.
    pub fn reset_to_natural_size(&mut self) -> bool {
        let ObjectKind::Image(props) = &self.kind else {
            return false;
        };
        if props.natural_width <= 0.0 || props.natural_height <= 0.0 {
            return false;
        }
        self.width = props.natural_width;
        self.height = props.natural_height;
        self.sanitize();
        true
    }

    /// Clamp every numeric property back into its valid range.
    ///
    /// Called after each property edit and on document load.
    pub fn sanitize(&mut self) {
        self.width = finite_or(self.width, MIN_SIZE).max(MIN_SIZE);
        self.height = finite_or(self.height, MIN_SIZE).max(MIN_SIZE);
        self.x = finite_or(self.x, 0.0);
        self.y = finite_or(self.y, 0.0);
        self.rotation = finite_or(self.rotation, 0.0);
        self.opacity = finite_or(self.opacity, 1.0).clamp(0.0, 1.0);
        self.blur = self
            .blur
            .map(|b| finite_or(b, 0.0).max(0.0))
            .filter(|b| *b > 0.0);

        match &mut self.kind {
            ObjectKind::Text(props) => {
                props.font_size = finite_or(props.font_size, 24.0).max(1.0);
                props.font_weight = props.font_weight.clamp(100, 900);
            }
            ObjectKind::Shape(props) => {
                props.stroke_width = finite_or(props.stroke_width, 0.0).max(0.0);
                props.corner_radius = finite_or(props.corner_radius, 0.0).max(0.0);
                if let Some(fill) = &mut props.background {
                    fill.position.x = finite_or(fill.position.x, 50.0).clamp(0.0, 100.0);
                    fill.position.y = finite_or(fill.position.y, 50.0).clamp(0.0, 100.0);
                    fill.scale = finite_or(fill.scale, 1.0)
                        .clamp(MIN_BACKGROUND_SCALE, MAX_BACKGROUND_SCALE);
                }
            }
            ObjectKind::Image(props) => {
                props.natural_width = finite_or(props.natural_width, 0.0).max(0.0);
                props.natural_height = finite_or(props.natural_height, 0.0).max(0.0);
            }
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape_matches_external_schema() {
        let object = DesignObject::shape(ShapeKind::Star);
        let json = serde_json::to_value(&object).expect("serialize");
        assert_eq!(json["type"], "shape");
        assert_eq!(json["shape"], "star");
        assert_eq!(json["strokeWidth"], 2.0);
        assert!(json.get("background").is_none());
        assert!(json.get("blur").is_none());
    }

    #[test]
    fn test_deserialize_text_with_defaults() {
        let json = r##"{
            "id": "t1", "type": "text", "x": 1, "y": 2, "width": 50, "height": 30,
            "text": "hi", "fontSize": 12, "fontFamily": "Inter", "fontWeight": 700,
            "color": "#ff0000"
        }"##;
        let object: DesignObject = serde_json::from_str(json).expect("deserialize");
        assert_eq!(object.id.as_str(), "t1");
        assert!((object.opacity - 1.0).abs() < f64::EPSILON);
        assert!(!object.locked);
        let text = object.as_text().expect("text object");
        assert_eq!(text.text_align, TextAlign::Left);
        assert_eq!(text.font_weight, 700);
    }

    #[test]
    fn test_sanitize_clamps_ranges() {
        let mut object = DesignObject::shape(ShapeKind::Rectangle);
        object.width = 3.0;
        object.height = -10.0;
        object.opacity = 4.0;
        object.blur = Some(-2.0);
        if let ObjectKind::Shape(props) = &mut object.kind {
            props.stroke_width = -1.0;
            props.background = Some(BackgroundFill {
                image: "data:x".to_string(),
                position: BackgroundPosition { x: 140.0, y: -5.0 },
                scale: 0.1,
            });
        }

        object.sanitize();

        assert!((object.width - MIN_SIZE).abs() < f64::EPSILON);
        assert!((object.height - MIN_SIZE).abs() < f64::EPSILON);
        assert!((object.opacity - 1.0).abs() < f64::EPSILON);
        assert!(object.blur.is_none());
        let ObjectKind::Shape(props) = &object.kind else {
            panic!("expected shape");
        };
        assert!(props.stroke_width.abs() < f64::EPSILON);
        let fill = props.background.as_ref().expect("fill kept");
        assert!((fill.position.x - 100.0).abs() < f64::EPSILON);
        assert!(fill.position.y.abs() < f64::EPSILON);
        assert!((fill.scale - MIN_BACKGROUND_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_image_refs() {
        let image = DesignObject::image("https://example.com/a.png", 10.0, 10.0);
        assert_eq!(image.image_refs().collect::<Vec<_>>(), ["https://example.com/a.png"]);

        let mut shape = DesignObject::shape(ShapeKind::Circle);
        assert_eq!(shape.image_refs().count(), 0);
        if let ObjectKind::Shape(props) = &mut shape.kind {
            props.background = Some(BackgroundFill::new("file:///tmp/bg.png"));
        }
        assert_eq!(shape.image_refs().collect::<Vec<_>>(), ["file:///tmp/bg.png"]);
    }

    #[test]
    fn test_duplicated_gets_new_id_and_offset() {
        let original = DesignObject::text("copy me");
        let copy = original.duplicated(20.0, 20.0);
        assert_ne!(copy.id, original.id);
        assert!((copy.x - original.x - 20.0).abs() < f64::EPSILON);
        assert!((copy.y - original.y - 20.0).abs() < f64::EPSILON);
        assert_eq!(copy.kind, original.kind);
    }

    #[test]
    fn test_reset_to_natural_size() {
        let mut image = DesignObject::image("data:image/png;base64,AAAA", 640.0, 480.0);
        image.width = 100.0;
        image.height = 30.0;
        assert!(image.reset_to_natural_size());
        assert!((image.width - 640.0).abs() < f64::EPSILON);
        assert!((image.height - 480.0).abs() < f64::EPSILON);

        let mut text = DesignObject::text("no");
        assert!(!text.reset_to_natural_size());
    }
}
