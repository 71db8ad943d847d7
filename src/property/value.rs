use std::collections::BTreeMap;
use std::iter;

use glam::{DMat4, DQuat, DVec2, DVec3, DVec4, Vec2, Vec3, Vec4};
use itertools::Itertools;

use super::Kind;
use crate::sid::{Interner, StringId};

/// An ordered map from interned names to values.
pub type Group = BTreeMap<StringId, Value>;

/// A list of values.
pub type Array = Vec<Value>;

/// A tagged property value.
///
/// Accessors return `None` when the value cannot be read as the requested kind.
/// Numeric kinds convert into each other,
/// and vector-like kinds can also be read from arrays with enough numeric elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Array(Array),
    Bool(bool),
    Double(f64),
    Float(f32),
    Group(Group),
    Int(i32),
    Matrix(DMat4),
    Quat(DQuat),
    String(String),
    StringId(StringId),
    UInt(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Vec2d(DVec2),
    Vec3d(DVec3),
    Vec4d(DVec4),
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Array(_) => Kind::Array,
            Self::Bool(_) => Kind::Bool,
            Self::Double(_) => Kind::Double,
            Self::Float(_) => Kind::Float,
            Self::Group(_) => Kind::Group,
            Self::Int(_) => Kind::Int,
            Self::Matrix(_) => Kind::Matrix,
            Self::Quat(_) => Kind::Quat,
            Self::String(_) => Kind::String,
            Self::StringId(_) => Kind::StringId,
            Self::UInt(_) => Kind::UInt,
            Self::Vec2(_) => Kind::Vec2,
            Self::Vec3(_) => Kind::Vec3,
            Self::Vec4(_) => Kind::Vec4,
            Self::Vec2d(_) => Kind::Vec2d,
            Self::Vec3d(_) => Kind::Vec3d,
            Self::Vec4d(_) => Kind::Vec4d,
        }
    }

    /// The default value of a kind.
    ///
    /// Numbers and vectors are zero, quaternions and matrices are the identity.
    pub fn default_of(kind: Kind) -> Self {
        match kind {
            Kind::Array => Self::Array(Array::new()),
            Kind::Bool => Self::Bool(false),
            Kind::Double => Self::Double(0.),
            Kind::Float => Self::Float(0.),
            Kind::Group => Self::Group(Group::new()),
            Kind::Int => Self::Int(0),
            Kind::Matrix => Self::Matrix(DMat4::IDENTITY),
            Kind::Quat => Self::Quat(DQuat::IDENTITY),
            Kind::String => Self::String(String::new()),
            Kind::StringId => Self::StringId(StringId::NONE),
            Kind::UInt => Self::UInt(0),
            Kind::Vec2 => Self::Vec2(Vec2::ZERO),
            Kind::Vec3 => Self::Vec3(Vec3::ZERO),
            Kind::Vec4 => Self::Vec4(Vec4::ZERO),
            Kind::Vec2d => Self::Vec2d(DVec2::ZERO),
            Kind::Vec3d => Self::Vec3d(DVec3::ZERO),
            Kind::Vec4d => Self::Vec4d(DVec4::ZERO),
        }
    }

    pub fn bool_value(&self) -> Option<bool> {
        match *self {
            Self::Bool(value) => Some(value),
            _ => None,
        }
    }

    pub fn int_value(&self) -> Option<i32> {
        match *self {
            Self::Int(value) => Some(value),
            Self::UInt(value) => i32::try_from(value).ok(),
            Self::Float(value) => int_from_double(f64::from(value)),
            Self::Double(value) => int_from_double(value),
            _ => None,
        }
    }

    pub fn uint_value(&self) -> Option<u32> {
        match *self {
            Self::UInt(value) => Some(value),
            Self::Int(value) => u32::try_from(value).ok(),
            Self::Float(value) => uint_from_double(f64::from(value)),
            Self::Double(value) => uint_from_double(value),
            _ => None,
        }
    }

    pub fn float_value(&self) -> Option<f32> {
        match *self {
            Self::Float(value) => Some(value),
            Self::Double(value) => Some(value as f32),
            Self::Int(value) => Some(value as f32),
            Self::UInt(value) => Some(value as f32),
            _ => None,
        }
    }

    pub fn double_value(&self) -> Option<f64> {
        match *self {
            Self::Double(value) => Some(value),
            Self::Float(value) => Some(f64::from(value)),
            Self::Int(value) => Some(f64::from(value)),
            Self::UInt(value) => Some(f64::from(value)),
            _ => None,
        }
    }

    pub fn str_value(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Reads an interned name.
    ///
    /// Strings are hashed without being recorded in any interner.
    pub fn string_id_value(&self) -> Option<StringId> {
        match self {
            Self::StringId(value) => Some(*value),
            Self::String(value) => Some(StringId::of(value)),
            _ => None,
        }
    }

    pub fn vec2_value(&self) -> Option<Vec2> {
        match *self {
            Self::Vec2(value) => Some(value),
            Self::Vec2d(value) => Some(value.as_vec2()),
            Self::Array(_) => {
                self.array_components::<2>(Kind::Vec2).map(|[x, y]| Vec2::new(x as f32, y as f32))
            }
            _ => None,
        }
    }

    pub fn vec3_value(&self) -> Option<Vec3> {
        match *self {
            Self::Vec3(value) => Some(value),
            Self::Vec3d(value) => Some(value.as_vec3()),
            Self::Array(_) => self
                .array_components::<3>(Kind::Vec3)
                .map(|[x, y, z]| Vec3::new(x as f32, y as f32, z as f32)),
            _ => None,
        }
    }

    pub fn vec4_value(&self) -> Option<Vec4> {
        match *self {
            Self::Vec4(value) => Some(value),
            Self::Vec4d(value) => Some(value.as_vec4()),
            Self::Array(_) => self
                .array_components::<4>(Kind::Vec4)
                .map(|[x, y, z, w]| Vec4::new(x as f32, y as f32, z as f32, w as f32)),
            _ => None,
        }
    }

    pub fn vec2d_value(&self) -> Option<DVec2> {
        match *self {
            Self::Vec2d(value) => Some(value),
            Self::Vec2(value) => Some(value.as_dvec2()),
            Self::Array(_) => self.array_components::<2>(Kind::Vec2d).map(DVec2::from_array),
            _ => None,
        }
    }

    pub fn vec3d_value(&self) -> Option<DVec3> {
        match *self {
            Self::Vec3d(value) => Some(value),
            Self::Vec3(value) => Some(value.as_dvec3()),
            Self::Array(_) => self.array_components::<3>(Kind::Vec3d).map(DVec3::from_array),
            _ => None,
        }
    }

    pub fn vec4d_value(&self) -> Option<DVec4> {
        match *self {
            Self::Vec4d(value) => Some(value),
            Self::Vec4(value) => Some(value.as_dvec4()),
            Self::Quat(value) => Some(DVec4::from_array(value.to_array())),
            Self::Array(_) => self.array_components::<4>(Kind::Vec4d).map(DVec4::from_array),
            _ => None,
        }
    }

    /// Reads a quaternion, also accepting `(x, y, z, w)` 4-vectors.
    pub fn quat_value(&self) -> Option<DQuat> {
        match *self {
            Self::Quat(value) => Some(value),
            Self::Vec4d(value) => Some(DQuat::from_vec4(value)),
            Self::Vec4(value) => Some(DQuat::from_vec4(value.as_dvec4())),
            Self::Array(_) => self.array_components::<4>(Kind::Quat).map(DQuat::from_array),
            _ => None,
        }
    }

    /// Reads a matrix, also accepting arrays of 16 numbers in column-major order.
    pub fn matrix_value(&self) -> Option<DMat4> {
        match *self {
            Self::Matrix(value) => Some(value),
            Self::Array(_) => {
                self.array_components::<16>(Kind::Matrix).map(|cols| DMat4::from_cols_array(&cols))
            }
            _ => None,
        }
    }

    pub fn array_value(&self) -> Option<&Array> {
        match self {
            Self::Array(value) => Some(value),
            _ => None,
        }
    }

    pub fn array_value_mut(&mut self) -> Option<&mut Array> {
        match self {
            Self::Array(value) => Some(value),
            _ => None,
        }
    }

    pub fn group_value(&self) -> Option<&Group> {
        match self {
            Self::Group(value) => Some(value),
            _ => None,
        }
    }

    pub fn group_value_mut(&mut self) -> Option<&mut Group> {
        match self {
            Self::Group(value) => Some(value),
            _ => None,
        }
    }

    /// Reads `self` as a value of `kind` using the accessor of `kind`.
    pub fn convert(&self, kind: Kind) -> Option<Self> {
        Some(match kind {
            Kind::Array => Self::Array(self.array_value()?.clone()),
            Kind::Bool => Self::Bool(self.bool_value()?),
            Kind::Double => Self::Double(self.double_value()?),
            Kind::Float => Self::Float(self.float_value()?),
            Kind::Group => Self::Group(self.group_value()?.clone()),
            Kind::Int => Self::Int(self.int_value()?),
            Kind::Matrix => Self::Matrix(self.matrix_value()?),
            Kind::Quat => Self::Quat(self.quat_value()?),
            Kind::String => Self::String(self.str_value()?.to_owned()),
            Kind::StringId => Self::StringId(self.string_id_value()?),
            Kind::UInt => Self::UInt(self.uint_value()?),
            Kind::Vec2 => Self::Vec2(self.vec2_value()?),
            Kind::Vec3 => Self::Vec3(self.vec3_value()?),
            Kind::Vec4 => Self::Vec4(self.vec4_value()?),
            Kind::Vec2d => Self::Vec2d(self.vec2d_value()?),
            Kind::Vec3d => Self::Vec3d(self.vec3d_value()?),
            Kind::Vec4d => Self::Vec4d(self.vec4d_value()?),
        })
    }

    /// Copies `other` into `self`, converting it to the kind of `self`.
    ///
    /// The kind of `self` never changes.
    /// Returns `false` and leaves `self` untouched if `other` cannot be read as that kind.
    pub fn set_from(&mut self, other: &Self) -> bool {
        match other.convert(self.kind()) {
            Some(converted) => {
                *self = converted;
                true
            }
            None => false,
        }
    }

    /// Formats the value as a string.
    ///
    /// Floating point and vector-like kinds are written as space-separated components with 10 decimals.
    /// Interned names are resolved through `interner`.
    pub fn string_value(&self, interner: &Interner) -> String {
        match self {
            Self::Array(_) => "Array".to_string(),
            Self::Group(_) => "Group".to_string(),
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::UInt(value) => value.to_string(),
            Self::String(value) => value.clone(),
            Self::StringId(value) => interner.resolve(*value),
            _ => self.numbers().map(|number| format!("{number:.10}")).join(" "),
        }
    }

    /// Parses a value of `kind` from the format written by [`string_value`](Self::string_value).
    ///
    /// Interned names are recorded in `interner`.
    /// Arrays and groups cannot be parsed.
    pub fn parse(kind: Kind, text: &str, interner: &Interner) -> Option<Self> {
        let trimmed = text.trim();
        Some(match kind {
            Kind::Array | Kind::Group => return None,
            Kind::Bool => Self::Bool(match trimmed {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return None,
            }),
            Kind::Int => Self::Int(trimmed.parse().ok()?),
            Kind::UInt => Self::UInt(trimmed.parse().ok()?),
            Kind::Float => Self::Float(trimmed.parse().ok()?),
            Kind::Double => Self::Double(trimmed.parse().ok()?),
            Kind::String => Self::String(text.to_owned()),
            Kind::StringId => Self::StringId(interner.intern(text)),
            Kind::Vec2
            | Kind::Vec3
            | Kind::Vec4
            | Kind::Vec2d
            | Kind::Vec3d
            | Kind::Vec4d
            | Kind::Quat
            | Kind::Matrix => {
                let numbers: Vec<f64> =
                    trimmed.split_whitespace().map(str::parse).collect::<Result<_, _>>().ok()?;
                Self::from_components(kind, &numbers)?
            }
        })
    }

    /// Builds a vector-like value from exactly as many components as `kind` has.
    pub fn from_components(kind: Kind, numbers: &[f64]) -> Option<Self> {
        if kind.dimension() != Some(numbers.len()) {
            return None;
        }

        let floats = || numbers.iter().map(|&number| number as f32).collect::<Vec<_>>();

        Some(match kind {
            Kind::Vec2 => Self::Vec2(Vec2::from_slice(&floats())),
            Kind::Vec3 => Self::Vec3(Vec3::from_slice(&floats())),
            Kind::Vec4 => Self::Vec4(Vec4::from_slice(&floats())),
            Kind::Vec2d => Self::Vec2d(DVec2::from_slice(numbers)),
            Kind::Vec3d => Self::Vec3d(DVec3::from_slice(numbers)),
            Kind::Vec4d => Self::Vec4d(DVec4::from_slice(numbers)),
            Kind::Quat => Self::Quat(DQuat::from_slice(numbers)),
            Kind::Matrix => Self::Matrix(DMat4::from_cols_slice(numbers)),
            _ => return None,
        })
    }

    /// Iterates over the numeric components of the value.
    ///
    /// Arrays yield their leading numeric elements.
    #[auto_enums::auto_enum(Iterator)]
    pub fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        match self {
            Self::Int(value) => iter::once(f64::from(*value)),
            Self::UInt(value) => iter::once(f64::from(*value)),
            Self::Float(value) => iter::once(f64::from(*value)),
            Self::Double(value) => iter::once(*value),
            Self::Vec2(value) => value.to_array().into_iter().map(f64::from),
            Self::Vec3(value) => value.to_array().into_iter().map(f64::from),
            Self::Vec4(value) => value.to_array().into_iter().map(f64::from),
            Self::Vec2d(value) => value.to_array().into_iter(),
            Self::Vec3d(value) => value.to_array().into_iter(),
            Self::Vec4d(value) => value.to_array().into_iter(),
            Self::Quat(value) => value.to_array().into_iter(),
            Self::Matrix(value) => value.to_cols_array().into_iter(),
            Self::Array(items) => items.iter().map_while(Self::double_value),
            _ => iter::empty(),
        }
    }

    fn array_components<const N: usize>(&self, kind: Kind) -> Option<[f64; N]> {
        let mut out = [0.; N];
        let mut numbers = self.numbers();
        for slot in &mut out {
            match numbers.next() {
                Some(number) => *slot = number,
                None => {
                    log::error!("Cannot read {kind} from an array with fewer than {N} numbers");
                    return None;
                }
            }
        }
        Some(out)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident,)*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self { Self::$variant(value) }
            }
        )*
    }
}

impl_from! {
    Array => Array,
    bool => Bool,
    f64 => Double,
    f32 => Float,
    Group => Group,
    i32 => Int,
    DMat4 => Matrix,
    DQuat => Quat,
    String => String,
    StringId => StringId,
    u32 => UInt,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    DVec2 => Vec2d,
    DVec3 => Vec3d,
    DVec4 => Vec4d,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self { Self::String(value.to_owned()) }
}

/// Truncates toward zero, rejecting NaN and values outside the `i32` range.
fn int_from_double(value: f64) -> Option<i32> {
    let truncated = value.trunc();
    (truncated >= f64::from(i32::MIN) && truncated <= f64::from(i32::MAX))
        .then(|| truncated as i32)
}

fn uint_from_double(value: f64) -> Option<u32> {
    let truncated = value.trunc();
    (truncated >= 0. && truncated <= f64::from(u32::MAX)).then(|| truncated as u32)
}
