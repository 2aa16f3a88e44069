//! Build specification loading.
//!
//! A build spec is a YAML file with a `steps` list. Each step is a mapping
//! with no fixed schema: exactly one of its keys names a registered step
//! type (the discriminator), and the remaining keys are parameters for that
//! step runner, still un-templated at load time. Key order within a record
//! and record order within the list are both significant and preserved.
//!
//! Scalar parameter values of any YAML flavor (string, integer, boolean)
//! are coerced to strings — `size: 256` and `size: "256"` mean the same
//! thing to a runner.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// A complete build specification: an ordered list of step records
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSpec {
    pub steps: Vec<StepSpec>,
}

impl BuildSpec {
    /// Load a build specification from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read spec file {:?}", path.as_ref()))?;

        let spec: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse spec file {:?}", path.as_ref()))?;

        Ok(spec)
    }
}

/// One step record: an insertion-ordered mapping of string keys to string
/// values, pre-templating
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepSpec(IndexMap<String, String>);

impl StepSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a step record from key/value pairs, preserving their order.
    /// Mostly useful in tests and for constructing expanded records.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Fetch a required parameter, failing with a handler error naming the
    /// step and the missing key.
    pub fn require(&self, key: &str) -> crate::error::Result<&str> {
        self.get(key).ok_or_else(|| {
            crate::error::ImgForgeError::handler(format!(
                "step {self} is missing required parameter '{key}'"
            ))
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value:?}")?;
        }
        write!(f, "}}")
    }
}

// A YAML scalar coerced to its string spelling. Mappings and sequences as
// parameter values are rejected.
struct ScalarString(String);

impl<'de> Deserialize<'de> for ScalarString {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = ScalarString;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, number, or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                Ok(ScalarString(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
                Ok(ScalarString(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Self::Value, E> {
                Ok(ScalarString(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                Ok(ScalarString(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(ScalarString(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
                Ok(ScalarString(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

impl<'de> Deserialize<'de> for StepSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StepVisitor;

        impl<'de> Visitor<'de> for StepVisitor {
            type Value = StepSpec;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of step parameters")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = IndexMap::new();
                while let Some((key, value)) = map.next_entry::<String, ScalarString>()? {
                    entries.insert(key, value.0);
                }
                if entries.is_empty() {
                    return Err(de::Error::custom("step record has no keys"));
                }
                Ok(StepSpec(entries))
            }
        }

        deserializer.deserialize_map(StepVisitor)
    }
}
