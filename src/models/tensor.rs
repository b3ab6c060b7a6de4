//! Typed tensors and the input binder
//!
//! The text front end hands out `i32` ids. Exported acoustic models differ
//! in what they declare for each input (int32, int64 or float32), so the
//! binder converts the ids to the declared type before they reach the
//! engine. Conversion uses plain `as` casts: values that do not fit the
//! target type are truncated or rounded silently, there is no range check.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TtsError};

/// Element types a model input may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit IEEE float
    Float32,
}

impl ElementType {
    /// Canonical tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
            ElementType::Float32 => "float32",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int32" | "i32" => Ok(ElementType::Int32),
            "int64" | "i64" => Ok(ElementType::Int64),
            "float32" | "float" | "f32" => Ok(ElementType::Float32),
            _ => Err(s.to_string()),
        }
    }
}

/// Flat tensor storage in one of the supported element types
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    /// int32 elements
    Int32(Vec<i32>),
    /// int64 elements
    Int64(Vec<i64>),
    /// float32 elements
    Float32(Vec<f32>),
}

impl TensorData {
    /// Convert ids to the requested element type
    pub fn from_ids(ids: &[i32], element_type: ElementType) -> Self {
        match element_type {
            ElementType::Int32 => TensorData::Int32(ids.to_vec()),
            ElementType::Int64 => TensorData::Int64(ids.iter().map(|&x| x as i64).collect()),
            ElementType::Float32 => TensorData::Float32(ids.iter().map(|&x| x as f32).collect()),
        }
    }

    /// Element type of the storage
    pub fn element_type(&self) -> ElementType {
        match self {
            TensorData::Int32(_) => ElementType::Int32,
            TensorData::Int64(_) => ElementType::Int64,
            TensorData::Float32(_) => ElementType::Float32,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            TensorData::Int32(v) => v.len(),
            TensorData::Int64(v) => v.len(),
            TensorData::Float32(v) => v.len(),
        }
    }

    /// Whether there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A shaped input tensor
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    /// Dimensions, row-major
    pub shape: Vec<usize>,
    /// Element storage
    pub data: TensorData,
}

impl Tensor {
    /// One-dimensional tensor over `data`
    pub fn vector(data: TensorData) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Element type of the tensor
    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }
}

/// Float tensor read back from a model output
#[derive(Debug, Clone, PartialEq)]
pub struct FloatTensor {
    /// Dimensions, row-major
    pub shape: Vec<usize>,
    /// Element storage
    pub data: Vec<f32>,
}

impl FloatTensor {
    /// Create a float tensor
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether there are no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reuse this output as the input of another model
    pub fn into_input(self) -> Tensor {
        Tensor {
            shape: self.shape,
            data: TensorData::Float32(self.data),
        }
    }
}

/// A pending input binding: slot, element type tag, raw ids
///
/// The tag is kept as given and only checked when the binding is resolved,
/// so a bad tag fails the run rather than the bind call.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBinding {
    /// Input slot index of the model
    pub slot: usize,
    /// Element type tag, e.g. "int64"
    pub tag: String,
    /// Ids from the front end
    pub values: Vec<i32>,
}

impl InputBinding {
    /// Create a binding
    pub fn new(slot: usize, tag: impl Into<String>, values: Vec<i32>) -> Self {
        Self {
            slot,
            tag: tag.into(),
            values,
        }
    }

    /// Resolve the tag and convert the ids into a one-dimensional tensor
    pub fn resolve(&self) -> Result<Tensor> {
        let element_type = self
            .tag
            .parse::<ElementType>()
            .map_err(|tag| TtsError::UnsupportedType { tag, slot: self.slot })?;
        Ok(Tensor::vector(TensorData::from_ids(&self.values, element_type)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_tags() {
        assert_eq!("int32".parse::<ElementType>(), Ok(ElementType::Int32));
        assert_eq!("INT64".parse::<ElementType>(), Ok(ElementType::Int64));
        assert_eq!("float".parse::<ElementType>(), Ok(ElementType::Float32));
        assert_eq!("float32".parse::<ElementType>(), Ok(ElementType::Float32));
        assert_eq!("uint8".parse::<ElementType>(), Err("uint8".to_string()));
    }

    #[test]
    fn test_from_ids_casts() {
        let ids = [1, -2, 300];
        assert_eq!(
            TensorData::from_ids(&ids, ElementType::Int32),
            TensorData::Int32(vec![1, -2, 300])
        );
        assert_eq!(
            TensorData::from_ids(&ids, ElementType::Int64),
            TensorData::Int64(vec![1, -2, 300])
        );
        assert_eq!(
            TensorData::from_ids(&ids, ElementType::Float32),
            TensorData::Float32(vec![1.0, -2.0, 300.0])
        );
    }

    #[test]
    fn test_float_conversion_rounds_large_ids() {
        // 2^24 + 1 has no exact f32 representation
        let data = TensorData::from_ids(&[16_777_217], ElementType::Float32);
        assert_eq!(data, TensorData::Float32(vec![16_777_216.0]));
    }

    #[test]
    fn test_binding_resolves_to_vector() {
        let tensor = InputBinding::new(0, "int64", vec![1, 2, 3]).resolve().unwrap();
        assert_eq!(tensor.shape, vec![3]);
        assert_eq!(tensor.element_type(), ElementType::Int64);
    }

    #[test]
    fn test_binding_rejects_unknown_tag() {
        let err = InputBinding::new(1, "bf16", vec![0]).resolve().unwrap_err();
        match err {
            TtsError::UnsupportedType { tag, slot } => {
                assert_eq!(tag, "bf16");
                assert_eq!(slot, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
