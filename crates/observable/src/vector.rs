//! Fixed-arity component vectors (2, 3 and 4 dimensions).
//!
//! These are value types with named components drawn from `x`, `y`, `z`, `t`.
//! They count as "non-unpackable" leaves for the serialization engine: even
//! though they have named parts, they are always routed through a type
//! adapter and never treated as nested containers.

use std::any::Any;

use crate::value::{Value, VectorValue};

/// A 2-component vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

/// A 3-component vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A 4-component vector; the fourth component is named `t`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Vec4 {
    pub fn new(x: f64, y: f64, z: f64, t: f64) -> Self {
        Self { x, y, z, t }
    }
}

macro_rules! impl_vector {
    ($ty:ty, [$($comp:ident),+]) => {
        impl VectorValue for $ty {
            fn components(&self) -> &'static [&'static str] {
                &[$(stringify!($comp)),+]
            }

            fn component(&self, name: &str) -> Option<f64> {
                match name {
                    $(stringify!($comp) => Some(self.$comp),)+
                    _ => None,
                }
            }

            fn rebuild(&self, read: &dyn Fn(&str) -> Option<f64>) -> Option<Box<dyn Value>> {
                Some(Box::new(Self {
                    $($comp: read(stringify!($comp))?,)+
                }))
            }
        }

        impl Value for $ty {
            fn as_any(&self) -> &dyn Any {
                self
            }

            fn clone_value(&self) -> Box<dyn Value> {
                Box::new(*self)
            }

            fn eq_value(&self, other: &dyn Value) -> bool {
                other.as_any().downcast_ref::<$ty>().is_some_and(|o| o == self)
            }

            fn as_vector(&self) -> Option<&dyn VectorValue> {
                Some(self)
            }
        }
    };
}

impl_vector!(Vec2, [x, y]);
impl_vector!(Vec3, [x, y, z]);
impl_vector!(Vec4, [x, y, z, t]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_by_dimensionality() {
        assert_eq!(Vec2::new(1.0, 2.0).components(), &["x", "y"]);
        assert_eq!(Vec3::new(1.0, 2.0, 3.0).components(), &["x", "y", "z"]);
        assert_eq!(Vec4::new(1.0, 2.0, 3.0, 4.0).components(), &["x", "y", "z", "t"]);
    }

    #[test]
    fn test_rebuild_from_lookup() {
        let witness = Vec3::default();
        let rebuilt = witness
            .rebuild(&|name| match name {
                "x" => Some(1.0),
                "y" => Some(2.0),
                "z" => Some(3.0),
                _ => None,
            })
            .unwrap();
        assert!(rebuilt.eq_value(&Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_rebuild_missing_component_fails() {
        let witness = Vec4::default();
        assert!(witness.rebuild(&|name| (name == "x").then_some(1.0)).is_none());
    }
}
