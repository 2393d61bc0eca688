//! Value types carried on value ports
//!
//! The set of element types is closed: every port, property and variable is
//! typed with a `DataType`, and every runtime datum is a `Value`. Generic node
//! types are instantiated by substituting `DataType`s into their port
//! templates (see `resolver`).

use std::fmt;

use crate::error::{EngineError, Result};
use crate::type_name::TypeDescriptor;

/// Unique identifier for a node
pub type NodeId = uuid::Uuid;

/// Unique identifier for a group
pub type GroupId = uuid::Uuid;

/// Unique identifier for a graph variable
pub type VariableId = uuid::Uuid;

/// The element type of a value port
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Accepts any value
    Any,
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    String,
    /// Ordered collection of one element type
    List(Box<DataType>),
    /// Ordered key/value pairs
    Map(Box<DataType>, Box<DataType>),
}

impl DataType {
    /// Base names of the value types and their generic parameter counts
    pub const BUILTIN: &'static [(&'static str, usize)] = &[
        ("Any", 0),
        ("Bool", 0),
        ("Int", 0),
        ("Float", 0),
        ("String", 0),
        ("List", 1),
        ("Map", 2),
    ];

    /// Build a list type
    pub fn list(item: DataType) -> Self {
        Self::List(Box::new(item))
    }

    /// Build a map type
    pub fn map(key: DataType, value: DataType) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Resolve a parsed descriptor into a value type
    pub fn from_descriptor(descriptor: &TypeDescriptor) -> Result<Self> {
        let expected = Self::BUILTIN
            .iter()
            .find(|(name, _)| *name == descriptor.name)
            .map(|(_, arity)| *arity)
            .ok_or_else(|| {
                EngineError::unresolved(descriptor.canonical(), "unknown value type")
            })?;
        if descriptor.args.len() != expected {
            return Err(EngineError::GenericArity {
                name: descriptor.name.clone(),
                expected,
                found: descriptor.args.len(),
            });
        }

        let mut args = descriptor
            .args
            .iter()
            .map(Self::from_descriptor)
            .collect::<Result<Vec<_>>>()?
            .into_iter();

        Ok(match descriptor.name.as_str() {
            "Any" => Self::Any,
            "Bool" => Self::Bool,
            "Int" => Self::Int,
            "Float" => Self::Float,
            "String" => Self::String,
            "List" => Self::list(args.next().unwrap_or(Self::Any)),
            _ => {
                let key = args.next().unwrap_or(Self::Any);
                Self::map(key, args.next().unwrap_or(Self::Any))
            }
        })
    }

    /// Convert back to a descriptor
    pub fn to_descriptor(&self) -> TypeDescriptor {
        match self {
            Self::Any => TypeDescriptor::simple("Any"),
            Self::Bool => TypeDescriptor::simple("Bool"),
            Self::Int => TypeDescriptor::simple("Int"),
            Self::Float => TypeDescriptor::simple("Float"),
            Self::String => TypeDescriptor::simple("String"),
            Self::List(item) => TypeDescriptor::generic("List", vec![item.to_descriptor()]),
            Self::Map(k, v) => {
                TypeDescriptor::generic("Map", vec![k.to_descriptor(), v.to_descriptor()])
            }
        }
    }

    /// Check if a value of this type can flow into a port of `target` type
    pub fn can_convert_to(&self, target: &DataType) -> bool {
        match (self, target) {
            // Any is checked at runtime when the value is coerced
            (Self::Any, _) | (_, Self::Any) => true,
            (Self::Int, Self::Float) => true,
            (Self::List(a), Self::List(b)) => a.can_convert_to(b),
            (Self::Map(ka, va), Self::Map(kb, vb)) => ka.can_convert_to(kb) && va.can_convert_to(vb),
            _ => self == target,
        }
    }

    /// Whether arithmetic nodes accept this type
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// The value a port of this type holds before anything is written
    pub fn default_value(&self) -> Value {
        match self {
            Self::Any => Value::Null,
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::String => Value::String(String::new()),
            Self::List(_) => Value::List(Vec::new()),
            Self::Map(_, _) => Value::Map(Vec::new()),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_descriptor())
    }
}

/// A runtime value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::String(_) => "String",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
        }
    }

    /// Convert to `target` if the conversion loses nothing.
    ///
    /// Int widens to Float; Float narrows to Int only when it is integral and
    /// in range. Collections convert element-wise.
    pub fn coerce_to(&self, target: &DataType) -> Option<Value> {
        match (target, self) {
            (DataType::Any, v) => Some(v.clone()),
            (DataType::Bool, Self::Bool(b)) => Some(Self::Bool(*b)),
            (DataType::Int, Self::Int(i)) => Some(Self::Int(*i)),
            (DataType::Int, Self::Float(f)) => float_to_int(*f).map(Self::Int),
            (DataType::Float, Self::Float(f)) => Some(Self::Float(*f)),
            (DataType::Float, Self::Int(i)) => Some(Self::Float(*i as f64)),
            (DataType::String, Self::String(s)) => Some(Self::String(s.clone())),
            (DataType::List(item), Self::List(items)) => items
                .iter()
                .map(|v| v.coerce_to(item))
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            (DataType::Map(kt, vt), Self::Map(pairs)) => pairs
                .iter()
                .map(|(k, v)| Some((k.coerce_to(kt)?, v.coerce_to(vt)?)))
                .collect::<Option<Vec<_>>>()
                .map(Self::Map),
            _ => None,
        }
    }

    /// Like `coerce_to`, reporting a `TypeMismatch` on failure
    pub fn convert(self, target: &DataType) -> Result<Value> {
        self.coerce_to(target).ok_or_else(|| EngineError::TypeMismatch {
            expected: target.clone(),
            found: self.kind().to_string(),
        })
    }

    /// Persisted JSON form. Maps are written as `{"$map": [[k, v], ...]}` and
    /// non-finite floats as `{"$float": "NaN" | "inf" | "-inf"}` so that both
    /// read back unchanged, also under `Any`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::json!(i),
            Self::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => serde_json::Value::Number(n),
                None => tagged(FLOAT_TAG, non_finite_name(*f).into()),
            },
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Map(pairs) => {
                let pairs: Vec<serde_json::Value> = pairs
                    .iter()
                    .map(|(k, v)| serde_json::Value::Array(vec![k.to_json(), v.to_json()]))
                    .collect();
                tagged(MAP_TAG, serde_json::Value::Array(pairs))
            }
        }
    }

    /// Read a persisted JSON value as `target`. Returns `None` when the stored
    /// shape does not fit.
    pub fn from_json(json: &serde_json::Value, target: &DataType) -> Option<Value> {
        use serde_json::Value as Json;

        match (target, json) {
            (DataType::Any, j) => Some(Self::from_json_untyped(j)),
            (DataType::Bool, Json::Bool(b)) => Some(Self::Bool(*b)),
            (DataType::Int, Json::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(float_to_int))
                .map(Self::Int),
            (DataType::Float, Json::Number(n)) => n.as_f64().map(Self::Float),
            (DataType::Float, Json::Object(_)) => tagged_float(json).map(Self::Float),
            (DataType::String, Json::String(s)) => Some(Self::String(s.clone())),
            (DataType::List(item), Json::Array(items)) => items
                .iter()
                .map(|j| Self::from_json(j, item))
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            (DataType::Map(kt, vt), Json::Array(pairs)) => pairs
                .iter()
                .map(|pair| {
                    let (k, v) = json_pair(pair)?;
                    Some((Self::from_json(k, kt)?, Self::from_json(v, vt)?))
                })
                .collect::<Option<Vec<_>>>()
                .map(Self::Map),
            (DataType::Map(..), Json::Object(entries)) if tagged_pairs(entries).is_some() => {
                Self::from_json(entries.get(MAP_TAG)?, target)
            }
            (DataType::Map(kt, vt), Json::Object(entries)) => entries
                .iter()
                .map(|(k, v)| {
                    let key = Self::String(k.clone()).coerce_to(kt)?;
                    Some((key, Self::from_json(v, vt)?))
                })
                .collect::<Option<Vec<_>>>()
                .map(Self::Map),
            _ => None,
        }
    }

    fn from_json_untyped(json: &serde_json::Value) -> Value {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Json::String(s) => Self::String(s.clone()),
            Json::Array(items) => Self::List(items.iter().map(Self::from_json_untyped).collect()),
            Json::Object(entries) => {
                if let Some(f) = tagged_float(json) {
                    return Self::Float(f);
                }
                if let Some(pairs) = tagged_pairs(entries) {
                    return Self::Map(
                        pairs
                            .into_iter()
                            .map(|(k, v)| (Self::from_json_untyped(k), Self::from_json_untyped(v)))
                            .collect(),
                    );
                }
                Self::Map(
                    entries
                        .iter()
                        .map(|(k, v)| (Self::String(k.clone()), Self::from_json_untyped(v)))
                        .collect(),
                )
            }
        }
    }
}

const MAP_TAG: &str = "$map";
const FLOAT_TAG: &str = "$float";

fn tagged(tag: &str, value: serde_json::Value) -> serde_json::Value {
    let mut entries = serde_json::Map::new();
    entries.insert(tag.to_string(), value);
    serde_json::Value::Object(entries)
}

fn non_finite_name(f: f64) -> &'static str {
    if f.is_nan() {
        "NaN"
    } else if f > 0.0 {
        "inf"
    } else {
        "-inf"
    }
}

/// `{"$float": "NaN" | "inf" | "-inf"}`
fn tagged_float(json: &serde_json::Value) -> Option<f64> {
    let entries = json.as_object().filter(|e| e.len() == 1)?;
    match entries.get(FLOAT_TAG)?.as_str()? {
        "NaN" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Pairs of a `{"$map": [[k, v], ...]}` object
fn tagged_pairs(
    entries: &serde_json::Map<String, serde_json::Value>,
) -> Option<Vec<(&serde_json::Value, &serde_json::Value)>> {
    if entries.len() != 1 {
        return None;
    }
    entries.get(MAP_TAG)?.as_array()?.iter().map(json_pair).collect()
}

fn json_pair(json: &serde_json::Value) -> Option<(&serde_json::Value, &serde_json::Value)> {
    match json.as_array()?.as_slice() {
        [k, v] => Some((k, v)),
        _ => None,
    }
}

fn float_to_int(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

/// Extraction of Rust values from `Value`s read off ports and properties
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value.convert(&DataType::Bool)? {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(DataType::Bool, &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value.convert(&DataType::Int)? {
            Value::Int(i) => Ok(i),
            other => Err(mismatch(DataType::Int, &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value.convert(&DataType::Float)? {
            Value::Float(x) => Ok(x),
            other => Err(mismatch(DataType::Float, &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch(DataType::String, &other)),
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(mismatch(DataType::list(DataType::Any), &other)),
        }
    }
}

fn mismatch(expected: DataType, found: &Value) -> EngineError {
    EngineError::TypeMismatch {
        expected,
        found: found.kind().to_string(),
    }
}
