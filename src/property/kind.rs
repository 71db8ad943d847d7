/// The fixed tag of a property value.
///
/// The string form of each kind is its upper-case name, e.g. `"VEC3D"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Kind {
    /// A list of values.
    Array,
    /// A boolean.
    Bool,
    /// A 64-bit float.
    Double,
    /// A 32-bit float.
    Float,
    /// An ordered map from interned names to values.
    Group,
    /// A signed 32-bit integer.
    Int,
    /// A 4x4 matrix of doubles.
    Matrix,
    /// A quaternion of doubles.
    Quat,
    /// An owned string.
    String,
    /// An interned name.
    StringId,
    /// An unsigned 32-bit integer.
    UInt,
    /// A 2-vector of floats.
    Vec2,
    /// A 3-vector of floats.
    Vec3,
    /// A 4-vector of floats.
    Vec4,
    /// A 2-vector of doubles.
    Vec2d,
    /// A 3-vector of doubles.
    Vec3d,
    /// A 4-vector of doubles.
    Vec4d,
}

impl Kind {
    /// Whether values of this kind are a single number.
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::Int | Self::UInt | Self::Float | Self::Double)
    }

    /// The number of numeric components of vector-like kinds.
    pub fn dimension(self) -> Option<usize> {
        Some(match self {
            Self::Vec2 | Self::Vec2d => 2,
            Self::Vec3 | Self::Vec3d => 3,
            Self::Vec4 | Self::Vec4d | Self::Quat => 4,
            Self::Matrix => 16,
            _ => return None,
        })
    }
}
