//! Custom properties attached to maps, tilesets, tiles, layers and objects.
//!
//! Values are kept as the raw strings found in the document together with their
//! declared type; conversion happens on access through [`FromProperty`].

use std::fmt;
use std::str::FromStr;

use bevy_math::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Number, Value};

use crate::color::Color;

/// Declared type of a property, from its `type` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Color,
    File,
    Object,
    Class,
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "string" => PropertyType::String,
            "int" => PropertyType::Int,
            "float" => PropertyType::Float,
            "bool" => PropertyType::Bool,
            "color" => PropertyType::Color,
            "file" => PropertyType::File,
            "object" => PropertyType::Object,
            "class" => PropertyType::Class,
            other => return Err(format!("unknown property type '{other}'")),
        })
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PropertyType::String => "string",
            PropertyType::Int => "int",
            PropertyType::Float => "float",
            PropertyType::Bool => "bool",
            PropertyType::Color => "color",
            PropertyType::File => "file",
            PropertyType::Object => "object",
            PropertyType::Class => "class",
        })
    }
}

/// Parse a boolean from the `true/false/yes/no/1/0` lexicon (case-insensitive).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// A single named property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// Name of the custom enum/class type (`propertytype` attribute).
    pub custom_type: Option<String>,
    /// Raw value; multi-line strings come from the element's text.
    pub value: String,
    /// Members of a `class` property.
    pub members: Properties,
}

impl Property {
    /// A plain string property.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::typed(name, PropertyType::String, value)
    }

    pub fn typed(
        name: impl Into<String>,
        property_type: PropertyType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            property_type,
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Convert the raw value to `T`, `None` if it does not parse as one.
    pub fn get<T: FromProperty>(&self) -> Option<T> {
        T::from_property(self)
    }

    /// Typed JSON rendering: numbers and booleans by declared type, classes as objects.
    pub fn to_json(&self) -> Value {
        let raw = || Value::String(self.value.clone());
        match self.property_type {
            PropertyType::Int => self
                .value
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| raw()),
            PropertyType::Float => self
                .value
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(raw),
            PropertyType::Bool => parse_bool(&self.value).map(Value::Bool).unwrap_or_else(raw),
            PropertyType::Class => self.members.to_json(),
            PropertyType::String | PropertyType::Color | PropertyType::File | PropertyType::Object => {
                raw()
            }
        }
    }
}

/// Ordered set of properties, unique by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    entries: Vec<Property>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries.iter().find(|property| property.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Raw string value of a property.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(Property::as_str)
    }

    /// Typed value of a property.
    ///
    /// ```
    /// use tmxmap_core::properties::{Properties, Property, PropertyType};
    ///
    /// let mut props = Properties::new();
    /// props.insert(Property::typed("speed", PropertyType::Float, "2.5"));
    /// assert_eq!(props.get_as::<f32>("speed"), Some(2.5));
    /// ```
    pub fn get_as<T: FromProperty>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(T::from_property)
    }

    /// Insert or replace by name, returning the replaced property.
    pub fn insert(&mut self, property: Property) -> Option<Property> {
        match self.entries.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => Some(std::mem::replace(existing, property)),
            None => {
                self.entries.push(property);
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let index = self.entries.iter().position(|p| p.name == name)?;
        Some(self.entries.remove(index))
    }

    /// Copy every property of `defaults` whose name is not present yet.
    pub fn merge_missing(&mut self, defaults: &Properties) {
        for property in defaults {
            if !self.contains(&property.name) {
                self.entries.push(property.clone());
            }
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|property| property.name.as_str())
    }

    /// JSON object keyed by property name, in document order.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|property| (property.name.clone(), property.to_json()))
                .collect::<JsonMap<String, Value>>(),
        )
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Properties {
    type Item = Property;
    type IntoIter = std::vec::IntoIter<Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Later properties replace earlier ones of the same name.
impl Extend<Property> for Properties {
    fn extend<I: IntoIterator<Item = Property>>(&mut self, iter: I) {
        for property in iter {
            self.insert(property);
        }
    }
}

impl FromIterator<Property> for Properties {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut properties = Properties::new();
        properties.extend(iter);
        properties
    }
}

/// Types that can be read out of a [`Property`].
///
/// # Example
///
/// ```
/// use tmxmap_core::properties::{FromProperty, Property, PropertyType};
///
/// let prop = Property::typed("solid", PropertyType::Bool, "true");
/// assert_eq!(bool::from_property(&prop), Some(true));
/// ```
pub trait FromProperty: Sized {
    /// Returns `Some(value)` if the conversion succeeds, `None` otherwise.
    fn from_property(property: &Property) -> Option<Self>;
}

impl FromProperty for bool {
    fn from_property(property: &Property) -> Option<Self> {
        parse_bool(&property.value)
    }
}

macro_rules! impl_from_property_parse {
    ($($ty:ty),*) => {
        $(
            impl FromProperty for $ty {
                fn from_property(property: &Property) -> Option<Self> {
                    property.value.trim().parse().ok()
                }
            }
        )*
    };
}

impl_from_property_parse!(i32, i64, u32, u64, f32, f64);

impl FromProperty for String {
    fn from_property(property: &Property) -> Option<Self> {
        Some(property.value.clone())
    }
}

impl FromProperty for Color {
    fn from_property(property: &Property) -> Option<Self> {
        property.value.parse().ok()
    }
}

impl FromProperty for Vec2 {
    fn from_property(property: &Property) -> Option<Self> {
        // "x,y" format
        let (x, y) = property.value.split_once(',')?;
        Some(Vec2::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
    }
}
