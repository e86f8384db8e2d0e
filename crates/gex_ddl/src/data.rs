//! Literal values, primitive types and references.

use std::fmt;

use half::f16;

/// Primitive data types of the description language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Half,
    Float,
    Double,
    String,
    Ref,
    Type,
    Base64,
}

impl DataType {
    /// Look up a type by any of its long or short names.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let ty = match identifier {
            "bool" | "b" => DataType::Bool,
            "int8" | "i8" => DataType::Int8,
            "int16" | "i16" => DataType::Int16,
            "int32" | "i32" => DataType::Int32,
            "int64" | "i64" => DataType::Int64,
            "unsigned_int8" | "uint8" | "u8" => DataType::UInt8,
            "unsigned_int16" | "uint16" | "u16" => DataType::UInt16,
            "unsigned_int32" | "uint32" | "u32" => DataType::UInt32,
            "unsigned_int64" | "uint64" | "u64" => DataType::UInt64,
            "half" | "float16" | "h" | "f16" => DataType::Half,
            "float" | "float32" | "f" | "f32" => DataType::Float,
            "double" | "float64" | "d" | "f64" => DataType::Double,
            "string" | "s" => DataType::String,
            "ref" | "r" => DataType::Ref,
            "type" | "t" => DataType::Type,
            "base64" | "z" => DataType::Base64,
            _ => return None,
        };
        Some(ty)
    }

    /// Canonical long name.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "unsigned_int8",
            DataType::UInt16 => "unsigned_int16",
            DataType::UInt32 => "unsigned_int32",
            DataType::UInt64 => "unsigned_int64",
            DataType::Half => "half",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::Ref => "ref",
            DataType::Type => "type",
            DataType::Base64 => "base64",
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Half | DataType::Float | DataType::Double)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A chained name path resolving to a structure.
///
/// An empty name list is the `null` reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StructureRef {
    pub names: Vec<String>,
    pub global: bool,
}

impl StructureRef {
    pub fn null() -> Self {
        Self {
            names: Vec::new(),
            global: true,
        }
    }

    pub fn global<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            global: true,
        }
    }

    pub fn local<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            global: false,
        }
    }

    pub fn is_null(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for StructureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("null");
        }
        for (i, name) in self.names.iter().enumerate() {
            let sigil = if i == 0 && self.global { '$' } else { '%' };
            write!(f, "{}{}", sigil, name)?;
        }
        Ok(())
    }
}

/// One literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Half(f16),
    Float(f32),
    Double(f64),
    String(String),
    Ref(StructureRef),
    Type(DataType),
    Base64(Vec<u8>),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Bool(_) => DataType::Bool,
            Value::Int8(_) => DataType::Int8,
            Value::Int16(_) => DataType::Int16,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::UInt8(_) => DataType::UInt8,
            Value::UInt16(_) => DataType::UInt16,
            Value::UInt32(_) => DataType::UInt32,
            Value::UInt64(_) => DataType::UInt64,
            Value::Half(_) => DataType::Half,
            Value::Float(_) => DataType::Float,
            Value::Double(_) => DataType::Double,
            Value::String(_) => DataType::String,
            Value::Ref(_) => DataType::Ref,
            Value::Type(_) => DataType::Type,
            Value::Base64(_) => DataType::Base64,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&StructureRef> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Unsigned integer value, if this is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::UInt8(v) => Some(v as u64),
            Value::UInt16(v) => Some(v as u64),
            Value::UInt32(v) => Some(v as u64),
            Value::UInt64(v) => Some(v),
            Value::Int8(v) => u64::try_from(v).ok(),
            Value::Int16(v) => u64::try_from(v).ok(),
            Value::Int32(v) => u64::try_from(v).ok(),
            Value::Int64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_u64().and_then(|v| u32::try_from(v).ok())
    }

    /// Floating-point value of any float type.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::Half(v) => Some(v.to_f32()),
            Value::Float(v) => Some(v),
            Value::Double(v) => Some(v as f32),
            _ => None,
        }
    }
}

/// The flat array held by a primitive structure.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveArray {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Half(Vec<f16>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    String(Vec<String>),
    Ref(Vec<StructureRef>),
    Type(Vec<DataType>),
    Base64(Vec<Vec<u8>>),
}

macro_rules! dispatch {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            PrimitiveArray::Bool($v) => $body,
            PrimitiveArray::Int8($v) => $body,
            PrimitiveArray::Int16($v) => $body,
            PrimitiveArray::Int32($v) => $body,
            PrimitiveArray::Int64($v) => $body,
            PrimitiveArray::UInt8($v) => $body,
            PrimitiveArray::UInt16($v) => $body,
            PrimitiveArray::UInt32($v) => $body,
            PrimitiveArray::UInt64($v) => $body,
            PrimitiveArray::Half($v) => $body,
            PrimitiveArray::Float($v) => $body,
            PrimitiveArray::Double($v) => $body,
            PrimitiveArray::String($v) => $body,
            PrimitiveArray::Ref($v) => $body,
            PrimitiveArray::Type($v) => $body,
            PrimitiveArray::Base64($v) => $body,
        }
    };
}

impl PrimitiveArray {
    /// Empty array of the given type.
    pub fn new(data_type: DataType) -> Self {
        match data_type {
            DataType::Bool => PrimitiveArray::Bool(Vec::new()),
            DataType::Int8 => PrimitiveArray::Int8(Vec::new()),
            DataType::Int16 => PrimitiveArray::Int16(Vec::new()),
            DataType::Int32 => PrimitiveArray::Int32(Vec::new()),
            DataType::Int64 => PrimitiveArray::Int64(Vec::new()),
            DataType::UInt8 => PrimitiveArray::UInt8(Vec::new()),
            DataType::UInt16 => PrimitiveArray::UInt16(Vec::new()),
            DataType::UInt32 => PrimitiveArray::UInt32(Vec::new()),
            DataType::UInt64 => PrimitiveArray::UInt64(Vec::new()),
            DataType::Half => PrimitiveArray::Half(Vec::new()),
            DataType::Float => PrimitiveArray::Float(Vec::new()),
            DataType::Double => PrimitiveArray::Double(Vec::new()),
            DataType::String => PrimitiveArray::String(Vec::new()),
            DataType::Ref => PrimitiveArray::Ref(Vec::new()),
            DataType::Type => PrimitiveArray::Type(Vec::new()),
            DataType::Base64 => PrimitiveArray::Base64(Vec::new()),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            PrimitiveArray::Bool(_) => DataType::Bool,
            PrimitiveArray::Int8(_) => DataType::Int8,
            PrimitiveArray::Int16(_) => DataType::Int16,
            PrimitiveArray::Int32(_) => DataType::Int32,
            PrimitiveArray::Int64(_) => DataType::Int64,
            PrimitiveArray::UInt8(_) => DataType::UInt8,
            PrimitiveArray::UInt16(_) => DataType::UInt16,
            PrimitiveArray::UInt32(_) => DataType::UInt32,
            PrimitiveArray::UInt64(_) => DataType::UInt64,
            PrimitiveArray::Half(_) => DataType::Half,
            PrimitiveArray::Float(_) => DataType::Float,
            PrimitiveArray::Double(_) => DataType::Double,
            PrimitiveArray::String(_) => DataType::String,
            PrimitiveArray::Ref(_) => DataType::Ref,
            PrimitiveArray::Type(_) => DataType::Type,
            PrimitiveArray::Base64(_) => DataType::Base64,
        }
    }

    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a value. Returns `false` if its type does not match the array.
    pub fn push(&mut self, value: Value) -> bool {
        match (self, value) {
            (PrimitiveArray::Bool(v), Value::Bool(x)) => v.push(x),
            (PrimitiveArray::Int8(v), Value::Int8(x)) => v.push(x),
            (PrimitiveArray::Int16(v), Value::Int16(x)) => v.push(x),
            (PrimitiveArray::Int32(v), Value::Int32(x)) => v.push(x),
            (PrimitiveArray::Int64(v), Value::Int64(x)) => v.push(x),
            (PrimitiveArray::UInt8(v), Value::UInt8(x)) => v.push(x),
            (PrimitiveArray::UInt16(v), Value::UInt16(x)) => v.push(x),
            (PrimitiveArray::UInt32(v), Value::UInt32(x)) => v.push(x),
            (PrimitiveArray::UInt64(v), Value::UInt64(x)) => v.push(x),
            (PrimitiveArray::Half(v), Value::Half(x)) => v.push(x),
            (PrimitiveArray::Float(v), Value::Float(x)) => v.push(x),
            (PrimitiveArray::Double(v), Value::Double(x)) => v.push(x),
            (PrimitiveArray::String(v), Value::String(x)) => v.push(x),
            (PrimitiveArray::Ref(v), Value::Ref(x)) => v.push(x),
            (PrimitiveArray::Type(v), Value::Type(x)) => v.push(x),
            (PrimitiveArray::Base64(v), Value::Base64(x)) => v.push(x),
            _ => return false,
        }
        true
    }

    pub fn as_floats(&self) -> Option<&[f32]> {
        match self {
            PrimitiveArray::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Copy of any half/float/double array widened or narrowed to f32.
    pub fn to_f32_vec(&self) -> Option<Vec<f32>> {
        match self {
            PrimitiveArray::Half(v) => Some(v.iter().map(|h| h.to_f32()).collect()),
            PrimitiveArray::Float(v) => Some(v.clone()),
            PrimitiveArray::Double(v) => Some(v.iter().map(|&d| d as f32).collect()),
            _ => None,
        }
    }

    /// Copy of any unsigned integer array widened to u64.
    pub fn to_u64_vec(&self) -> Option<Vec<u64>> {
        match self {
            PrimitiveArray::UInt8(v) => Some(v.iter().map(|&x| x as u64).collect()),
            PrimitiveArray::UInt16(v) => Some(v.iter().map(|&x| x as u64).collect()),
            PrimitiveArray::UInt32(v) => Some(v.iter().map(|&x| x as u64).collect()),
            PrimitiveArray::UInt64(v) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            PrimitiveArray::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_refs(&self) -> Option<&[StructureRef]> {
        match self {
            PrimitiveArray::Ref(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(DataType::from_identifier("float"), Some(DataType::Float));
        assert_eq!(DataType::from_identifier("f32"), Some(DataType::Float));
        assert_eq!(DataType::from_identifier("unsigned_int16"), Some(DataType::UInt16));
        assert_eq!(DataType::from_identifier("float64"), Some(DataType::Double));
        assert_eq!(DataType::from_identifier("Float"), None);
        assert_eq!(DataType::UInt8.to_string(), "unsigned_int8");
    }

    #[test]
    fn test_reference_display() {
        assert_eq!(StructureRef::global(["geom", "mesh"]).to_string(), "$geom%mesh");
        assert_eq!(StructureRef::local(["xfrm"]).to_string(), "%xfrm");
        assert_eq!(StructureRef::null().to_string(), "null");
    }

    #[test]
    fn test_push_rejects_wrong_type() {
        let mut array = PrimitiveArray::new(DataType::Float);
        assert!(array.push(Value::Float(1.0)));
        assert!(!array.push(Value::Double(1.0)));
        assert_eq!(array.len(), 1);
    }

    #[test]
    fn test_to_f32_vec() {
        let array = PrimitiveArray::Double(vec![0.5, 2.0]);
        assert_eq!(array.to_f32_vec(), Some(vec![0.5, 2.0]));
        assert_eq!(PrimitiveArray::Bool(vec![true]).to_f32_vec(), None);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::UInt32(7).as_u32(), Some(7));
        assert_eq!(Value::Int8(-1).as_u64(), None);
        assert_eq!(Value::UInt64(1 << 40).as_u32(), None);
        assert_eq!(Value::Double(0.25).as_f32(), Some(0.25));
    }
}
