// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Addon arguments: raw `key=value` parsing and typed parameter schemas.

use crate::shared::error::VelaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Raw arguments as typed on the command line.
pub type AddonArgs = BTreeMap<String, String>;

/// Parse `key=value` pairs. Every entry must contain exactly one `=`; pairs
/// whose key or value is blank after trimming are dropped.
pub fn parse_to_map<S: AsRef<str>>(args: &[S]) -> Result<AddonArgs, VelaError> {
    let mut map = AddonArgs::new();

    for pair in args {
        let pair = pair.as_ref();
        let parts: Vec<&str> = pair.split('=').collect();
        if parts.len() != 2 {
            return Err(VelaError::validation(format!(
                "parameter format should be foo=bar, {} not match",
                pair
            )));
        }

        let key = parts[0].trim();
        let value = parts[1].trim();
        if !key.is_empty() && !value.is_empty() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    Ok(map)
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    #[default]
    String,
    Int,
    Float,
    Bool,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
        }
    }
}

impl ParameterType {
    pub fn parse_value(&self, name: &str, raw: &str) -> Result<ParameterValue, VelaError> {
        let invalid = || {
            VelaError::validation(format!(
                "parameter {} expects a {} value, got '{}'",
                name, self, raw
            ))
        };

        match self {
            Self::String => Ok(ParameterValue::String(raw.to_string())),
            Self::Int => raw.parse().map(ParameterValue::Int).map_err(|_| invalid()),
            Self::Float => raw.parse().map(ParameterValue::Float).map_err(|_| invalid()),
            Self::Bool => raw.parse().map(ParameterValue::Bool).map_err(|_| invalid()),
        }
    }
}

/// One entry of the `parameters` list stored next to an addon template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterSpec {
    pub name: String,

    #[serde(rename = "type", default)]
    pub param_type: ParameterType,

    #[serde(default)]
    pub default: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub usage: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddonParameters {
    specs: Vec<ParameterSpec>,
}

impl AddonParameters {
    pub fn new(specs: Vec<ParameterSpec>) -> Self {
        Self { specs }
    }

    pub fn from_yaml(raw: &str) -> Result<Self, VelaError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let specs: Vec<ParameterSpec> = serde_yaml::from_str(raw)?;
        Ok(Self { specs })
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    pub fn declares(&self, name: &str) -> bool {
        self.specs.iter().any(|s| s.name == name)
    }

    /// Keep only the arguments this schema knows about. Without a schema all
    /// arguments are kept.
    pub fn filter_known(&self, raw: &AddonArgs) -> AddonArgs {
        if self.specs.is_empty() {
            return raw.clone();
        }
        raw.iter()
            .filter(|(k, _)| self.declares(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Convert raw arguments into typed values. Without a schema every value
    /// is passed through as a string.
    pub fn resolve(&self, raw: &AddonArgs) -> Result<BTreeMap<String, ParameterValue>, VelaError> {
        if self.specs.is_empty() {
            return Ok(raw
                .iter()
                .map(|(k, v)| (k.clone(), ParameterValue::String(v.clone())))
                .collect());
        }

        if let Some(unknown) = raw.keys().find(|k| !self.declares(k)) {
            let known: Vec<&str> = self.specs.iter().map(|s| s.name.as_str()).collect();
            return Err(VelaError::validation(format!(
                "unknown parameter '{}', expected one of: {}",
                unknown,
                known.join(", ")
            )));
        }

        let mut resolved = BTreeMap::new();
        for spec in &self.specs {
            match raw.get(&spec.name).or(spec.default.as_ref()) {
                Some(value) => {
                    let typed = spec.param_type.parse_value(&spec.name, value)?;
                    resolved.insert(spec.name.clone(), typed);
                }
                None if spec.required => {
                    return Err(VelaError::validation(format!(
                        "missing required parameter '{}'",
                        spec.name
                    )));
                }
                None => {}
            }
        }

        Ok(resolved)
    }
}
