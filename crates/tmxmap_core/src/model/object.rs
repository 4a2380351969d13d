//! Map objects and their shapes.

use bevy_math::Vec2;

use crate::color::Color;
use crate::gid::Gid;
use crate::properties::Properties;

string_enum! {
    HorizontalAlignment {
        Left => "left",
        Center => "center",
        Right => "right",
        Justify => "justify",
    }
}

string_enum! {
    VerticalAlignment {
        Top => "top",
        Center => "center",
        Bottom => "bottom",
    }
}

/// Text object contents and styling.
#[derive(Debug, Clone, PartialEq)]
pub struct TextShape {
    pub text: String,
    pub font_family: String,
    pub pixel_size: u32,
    pub wrap: bool,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub kerning: bool,
    pub halign: HorizontalAlignment,
    pub valign: VerticalAlignment,
}

impl Default for TextShape {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: "sans-serif".to_string(),
            pixel_size: 16,
            wrap: false,
            color: Color::rgb(0, 0, 0),
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            kerning: true,
            halign: HorizontalAlignment::Left,
            valign: VerticalAlignment::Top,
        }
    }
}

/// Geometry of an object. Polygon and polyline points are relative to the
/// object's position.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ObjectShape {
    #[default]
    Rectangle,
    Ellipse,
    Point,
    Polygon { points: Vec<Vec2> },
    Polyline { points: Vec<Vec2> },
    Text(Box<TextShape>),
}

/// An object from an object group or a tile's collision group.
///
/// Equality compares document content only; the loader's internal sequence key is
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct Object {
    pub id: u32,
    pub name: String,
    /// `type`/`class` attribute.
    pub class: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Clockwise rotation in degrees around `(x, y)`.
    pub rotation: f32,
    pub visible: bool,
    /// Set for tile objects.
    pub gid: Option<Gid>,
    /// Unresolved `.tx` template reference.
    pub template: Option<String>,
    pub shape: ObjectShape,
    pub properties: Properties,
    /// Load-unique sequence number used to address the object during resolution.
    pub(crate) key: u32,
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        let Object {
            id,
            name,
            class,
            x,
            y,
            width,
            height,
            rotation,
            visible,
            gid,
            template,
            shape,
            properties,
            key: _,
        } = self;
        *id == other.id
            && *name == other.name
            && *class == other.class
            && *x == other.x
            && *y == other.y
            && *width == other.width
            && *height == other.height
            && *rotation == other.rotation
            && *visible == other.visible
            && *gid == other.gid
            && *template == other.template
            && *shape == other.shape
            && *properties == other.properties
    }
}

impl Object {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn is_tile_object(&self) -> bool {
        self.gid.is_some_and(|gid| !gid.is_empty())
    }

    /// Polygon/polyline points in map coordinates.
    pub fn points(&self) -> Option<Vec<Vec2>> {
        match &self.shape {
            ObjectShape::Polygon { points } | ObjectShape::Polyline { points } => {
                let origin = self.position();
                Some(points.iter().map(|&point| point + origin).collect())
            }
            _ => None,
        }
    }

    /// Corners of the object's bounding rectangle, unrotated.
    pub fn as_points(&self) -> [Vec2; 4] {
        let (x, y, w, h) = (self.x, self.y, self.width, self.height);
        [
            Vec2::new(x, y),
            Vec2::new(x, y + h),
            Vec2::new(x + w, y + h),
            Vec2::new(x + w, y),
        ]
    }

    /// Outline in map coordinates with the object's rotation applied.
    ///
    /// Polygons and polylines use their points, everything else the bounding
    /// rectangle corners.
    pub fn apply_transformations(&self) -> Vec<Vec2> {
        let points = self.points().unwrap_or_else(|| self.as_points().to_vec());
        if self.rotation == 0.0 {
            return points;
        }
        rotate(&points, self.position(), self.rotation)
    }
}

/// Rotate points clockwise (y down) by `degrees` around `origin`.
pub fn rotate(points: &[Vec2], origin: Vec2, degrees: f32) -> Vec<Vec2> {
    let rotation = Vec2::from_angle(degrees.to_radians());
    points
        .iter()
        .map(|&point| origin + rotation.rotate(point - origin))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_as_points() {
        let object = Object {
            x: 10.0,
            y: 20.0,
            width: 4.0,
            height: 2.0,
            ..Default::default()
        };
        assert_eq!(
            object.as_points(),
            [
                Vec2::new(10.0, 20.0),
                Vec2::new(10.0, 22.0),
                Vec2::new(14.0, 22.0),
                Vec2::new(14.0, 20.0),
            ]
        );
    }

    #[test]
    fn test_polygon_points_are_absolute() {
        let object = Object {
            x: 5.0,
            y: 5.0,
            shape: ObjectShape::Polygon {
                points: vec![Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(0.0, 3.0)],
            },
            ..Default::default()
        };
        assert_eq!(
            object.points(),
            Some(vec![Vec2::new(5.0, 5.0), Vec2::new(7.0, 5.0), Vec2::new(5.0, 8.0)])
        );
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let rotated = rotate(&[Vec2::new(1.0, 0.0)], Vec2::ZERO, 90.0);
        assert!(approx(rotated[0], Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn test_apply_transformations_rotates_about_origin() {
        let object = Object {
            x: 0.0,
            y: 0.0,
            width: 2.0,
            height: 1.0,
            rotation: 90.0,
            ..Default::default()
        };
        let outline = object.apply_transformations();
        assert!(approx(outline[0], Vec2::ZERO));
        assert!(approx(outline[1], Vec2::new(-1.0, 0.0)));
        assert!(approx(outline[2], Vec2::new(-1.0, 2.0)));
        assert!(approx(outline[3], Vec2::new(0.0, 2.0)));
    }

    #[test]
    fn test_equality_ignores_load_sequence() {
        let first = Object {
            id: 4,
            name: "door".to_string(),
            key: 1,
            ..Default::default()
        };
        let second = Object {
            key: 9,
            ..first.clone()
        };
        assert_eq!(first, second);
        assert_ne!(first, Object { id: 5, ..second });
    }

    #[test]
    fn test_tile_object_detection() {
        let mut object = Object::default();
        assert!(!object.is_tile_object());
        object.gid = Some(Gid(3));
        assert!(object.is_tile_object());
    }
}
