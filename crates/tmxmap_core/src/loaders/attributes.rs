//! Typed access to an element's attributes.
//!
//! Every constructor pulls the attributes it understands through one of the typed
//! getters, names the ones it deliberately skips, and then calls
//! [`Attributes::finish`], which rejects anything left over.

use std::path::{Path, PathBuf};

use bevy_math::Vec2;
use normalize_path::NormalizePath;

use crate::color::Color;
use crate::error::{TmxError, TmxResult};
use crate::loaders::nodes::ElementKind;
use crate::model::{
    DrawOrder, GridOrientation, HorizontalAlignment, Orientation, RenderOrder, StaggerAxis,
    StaggerIndex, VerticalAlignment,
};
use crate::properties::{PropertyType, parse_bool};

/// Conversion from a raw attribute string.
pub(crate) trait AttributeValue: Sized {
    fn parse_attribute(value: &str) -> Result<Self, String>;
}

macro_rules! impl_attribute_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AttributeValue for $ty {
                fn parse_attribute(value: &str) -> Result<Self, String> {
                    value.trim().parse::<$ty>().map_err(|err| err.to_string())
                }
            }
        )*
    };
}

impl_attribute_from_str!(
    u32,
    i32,
    f32,
    Color,
    Orientation,
    RenderOrder,
    StaggerAxis,
    StaggerIndex,
    DrawOrder,
    GridOrientation,
    HorizontalAlignment,
    VerticalAlignment,
    PropertyType,
);

impl AttributeValue for bool {
    fn parse_attribute(value: &str) -> Result<Self, String> {
        parse_bool(value).ok_or_else(|| "expected true/false, yes/no or 1/0".to_string())
    }
}

impl AttributeValue for String {
    fn parse_attribute(value: &str) -> Result<Self, String> {
        Ok(value.to_string())
    }
}

/// Polygon/polyline point lists: `"x,y x,y ..."`.
pub(crate) struct PointList(pub Vec<Vec2>);

impl AttributeValue for PointList {
    fn parse_attribute(value: &str) -> Result<Self, String> {
        value
            .split_whitespace()
            .map(|pair| {
                let (x, y) = pair
                    .split_once(',')
                    .ok_or_else(|| format!("point '{pair}' is not x,y"))?;
                let x = x.parse::<f32>().map_err(|err| format!("point '{pair}': {err}"))?;
                let y = y.parse::<f32>().map_err(|err| format!("point '{pair}': {err}"))?;
                Ok(Vec2::new(x, y))
            })
            .collect::<Result<Vec<_>, String>>()
            .map(PointList)
    }
}

/// Resolve a document-relative resource path.
pub(crate) fn resolve_path(base_dir: &Path, relative: &str) -> PathBuf {
    base_dir.join(relative).normalize()
}

/// Attributes of one element, consumed as the constructor reads them.
pub(crate) struct Attributes {
    element: ElementKind,
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub(crate) fn new(element: ElementKind, entries: Vec<(String, String)>) -> Self {
        Self { element, entries }
    }

    /// Remove and return the raw value.
    pub(crate) fn take(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.swap_remove(index).1)
    }

    pub(crate) fn optional<T: AttributeValue>(&mut self, name: &'static str) -> TmxResult<Option<T>> {
        let Some(value) = self.take(name) else {
            return Ok(None);
        };
        T::parse_attribute(&value)
            .map(Some)
            .map_err(|reason| TmxError::InvalidAttribute {
                element: self.element.name(),
                attribute: name.to_string(),
                value,
                reason,
            })
    }

    pub(crate) fn required<T: AttributeValue>(&mut self, name: &'static str) -> TmxResult<T> {
        self.optional(name)?.ok_or(TmxError::MissingAttribute {
            element: self.element.name(),
            attribute: name,
        })
    }

    pub(crate) fn or<T: AttributeValue>(&mut self, name: &'static str, default: T) -> TmxResult<T> {
        Ok(self.optional(name)?.unwrap_or(default))
    }

    /// Attributes that are part of the format but not modelled.
    pub(crate) fn ignore(&mut self, names: &[&str]) {
        self.entries.retain(|(key, _)| !names.contains(&key.as_str()));
    }

    /// Fail on the first attribute nobody consumed.
    pub(crate) fn finish(self) -> TmxResult<()> {
        match self.entries.into_iter().next() {
            Some((attribute, _)) => Err(TmxError::UnknownAttribute {
                element: self.element.name(),
                attribute,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        Attributes::new(
            ElementKind::Layer,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_typed_getters() {
        let mut a = attrs(&[("width", "10"), ("visible", "0"), ("opacity", "0.5")]);
        assert_eq!(a.required::<u32>("width").unwrap(), 10);
        assert!(!a.or("visible", true).unwrap());
        assert_eq!(a.or("opacity", 1.0f32).unwrap(), 0.5);
        assert_eq!(a.optional::<Color>("tintcolor").unwrap(), None);
        a.finish().unwrap();
    }

    #[test]
    fn test_missing_required() {
        let mut a = attrs(&[]);
        let err = a.required::<u32>("height").unwrap_err();
        assert!(matches!(
            err,
            TmxError::MissingAttribute {
                element: "layer",
                attribute: "height"
            }
        ));
    }

    #[test]
    fn test_invalid_value() {
        let mut a = attrs(&[("width", "wide")]);
        let err = a.required::<u32>("width").unwrap_err();
        assert!(matches!(err, TmxError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_unknown_attribute_is_rejected() {
        let mut a = attrs(&[("name", "ground"), ("sparkle", "yes"), ("x", "0")]);
        a.ignore(&["x"]);
        let _: String = a.required("name").unwrap();
        let err = a.finish().unwrap_err();
        assert!(matches!(err, TmxError::UnknownAttribute { attribute, .. } if attribute == "sparkle"));
    }

    #[test]
    fn test_point_list() {
        let PointList(points) = PointList::parse_attribute("0,0 16,0 16,-8.5").unwrap();
        assert_eq!(points, vec![Vec2::ZERO, Vec2::new(16.0, 0.0), Vec2::new(16.0, -8.5)]);
        assert!(PointList::parse_attribute("0,0 16").is_err());
    }

    #[test]
    fn test_resolve_path_normalizes() {
        let path = resolve_path(Path::new("maps/level1"), "../tilesets/terrain.tsx");
        assert_eq!(path, PathBuf::from("maps/tilesets/terrain.tsx"));
    }
}
