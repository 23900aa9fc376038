use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A scalar parameter value held in a node's settings.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(untagged)]
pub enum SettingValue {
    Boolean(bool),
    Integer(i64),
    Number(OrderedFloat<f64>),
    Pair(OrderedFloat<f64>, OrderedFloat<f64>),
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Number(OrderedFloat(value))
    }
}

impl From<f32> for SettingValue {
    fn from(value: f32) -> Self {
        SettingValue::Number(OrderedFloat(value as f64))
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        SettingValue::Integer(value as i64)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Boolean(value)
    }
}

impl From<(f64, f64)> for SettingValue {
    fn from((a, b): (f64, f64)) -> Self {
        SettingValue::Pair(OrderedFloat(a), OrderedFloat(b))
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Boolean(b) => write!(f, "{}", b),
            SettingValue::Integer(i) => write!(f, "{}", i),
            SettingValue::Number(n) => write!(f, "{}", n),
            SettingValue::Pair(a, b) => write!(f, "{},{}", a, b),
        }
    }
}

impl FromStr for SettingValue {
    type Err = String;

    /// Parses `true`/`false`, integers, floats and `a,b` pairs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(b) = s.parse::<bool>() {
            return Ok(SettingValue::Boolean(b));
        }
        if let Ok(i) = s.parse::<i64>() {
            return Ok(SettingValue::Integer(i));
        }
        if let Ok(n) = s.parse::<f64>() {
            return Ok(SettingValue::Number(OrderedFloat(n)));
        }
        if let Some((a, b)) = s.split_once(',') {
            if let (Ok(a), Ok(b)) = (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
                return Ok(SettingValue::Pair(OrderedFloat(a), OrderedFloat(b)));
            }
        }
        Err(format!("cannot parse setting value '{}'", s))
    }
}

// Type-safe extraction from SettingValue
pub trait TryGetSetting<T> {
    fn try_get(v: &SettingValue) -> Option<T>;
}

impl TryGetSetting<f64> for f64 {
    fn try_get(v: &SettingValue) -> Option<f64> {
        match v {
            SettingValue::Number(n) => Some(n.into_inner()),
            SettingValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl TryGetSetting<f32> for f32 {
    fn try_get(v: &SettingValue) -> Option<f32> {
        f64::try_get(v).map(|n| n as f32)
    }
}

impl TryGetSetting<i64> for i64 {
    fn try_get(v: &SettingValue) -> Option<i64> {
        match v {
            SettingValue::Integer(i) => Some(*i),
            SettingValue::Number(n) => {
                // Only whole numbers convert
                if n.fract().abs() < f64::EPSILON
                    && *n >= OrderedFloat(i64::MIN as f64)
                    && *n <= OrderedFloat(i64::MAX as f64)
                {
                    Some(n.into_inner() as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl TryGetSetting<bool> for bool {
    fn try_get(v: &SettingValue) -> Option<bool> {
        match v {
            SettingValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl TryGetSetting<(f64, f64)> for (f64, f64) {
    fn try_get(v: &SettingValue) -> Option<(f64, f64)> {
        match v {
            SettingValue::Pair(a, b) => Some((a.into_inner(), b.into_inner())),
            _ => None,
        }
    }
}

impl SettingValue {
    pub fn get_as<T: TryGetSetting<T>>(&self) -> Option<T> {
        T::try_get(self)
    }
}

/// Parameter-name to value mapping of a single node.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, SettingValue>,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<SettingValue>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    /// Stores `value` and returns the previous one.
    pub fn set(&mut self, key: &str, value: SettingValue) -> Option<SettingValue> {
        self.values.insert(key.to_string(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.get_as::<f64>())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.get_as::<i64>())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.get_as::<bool>())
    }
}

impl FromIterator<(String, SettingValue)> for Settings {
    fn from_iter<I: IntoIterator<Item = (String, SettingValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
