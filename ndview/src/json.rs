//! Persisted form of a tensor: `{"data": <nested lists>, "shape": [...], "dtype": "<tag>"}`.
//!
//! Data is written in index order whatever the layout of the view, so a derived view reads back
//! as a fresh column-major tensor with the same content.

use super::*;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};

impl Tensor {
    /// Persisted form of the tensor.
    ///
    /// JSON has no NaN or infinity, so non-finite float elements are written as `null` and the
    /// result is rejected by [`Tensor::from_json`].
    pub fn to_json(&self) -> Value {
        json!({
            "data": nested_to_json(&self.to_nested(), self.dtype),
            "shape": self.shape.as_slice(),
            "dtype": self.dtype,
        })
    }

    /// Reads the persisted form. A missing `dtype` means `float64`.
    pub fn from_json(value: &Value) -> Result<Tensor> {
        let object = value
            .as_object()
            .ok_or_else(|| TensorError::BadData(format!("expected a JSON object, got {value}")))?;

        let shape = match object.get("shape") {
            Some(shape) => compute_shape(shape)?,
            None => return Err(TensorError::BadData("missing 'shape'".to_string())),
        };

        let dtype = match object.get("dtype") {
            Some(Value::String(tag)) => tag.parse()?,
            Some(other) => return Err(TensorError::BadData(format!("dtype tag must be a string, got {other}"))),
            None => DType::default(),
        };

        let data = object
            .get("data")
            .ok_or_else(|| TensorError::BadData("missing 'data'".to_string()))?;

        // grows with the data present, not the declared shape
        let mut leaves = Vec::new();
        nested_from_json(data)?.collect_leaves(&shape, 0, &mut leaves)?;

        Ok(Tensor::from_logical(leaves, shape, dtype))
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json())?)
    }

    pub fn from_json_str(text: &str) -> Result<Tensor> {
        Tensor::from_json(&serde_json::from_str(text)?)
    }
}

fn nested_to_json(nested: &Nested, dtype: DType) -> Value {
    match nested {
        Nested::Value(value) if dtype.is_float() => json!(value),
        Nested::Value(value) => json!(*value as i64),
        Nested::List(items) => Value::Array(items.iter().map(|item| nested_to_json(item, dtype)).collect()),
    }
}

fn nested_from_json(value: &Value) -> Result<Nested> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .map(Nested::Value)
            .ok_or_else(|| TensorError::BadData(format!("{number} is not representable as a number"))),
        Value::Array(items) => Ok(Nested::List(items.iter().map(nested_from_json).collect::<Result<_>>()?)),
        other => Err(TensorError::BadData(format!("non-numeric data element {other}"))),
    }
}

impl Serialize for Tensor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tensor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Tensor::from_json(&value).map_err(D::Error::custom)
    }
}
