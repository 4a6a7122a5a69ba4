//! Analysis input model.
//!
//! An [`AnalysisResult`] is produced by the model front end (parser plus
//! tree walk) and consumed verbatim by the engine. Class and handler
//! collections keep their declaration order, because the intra-instance
//! data-dependency scan walks handlers in that order.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Literal send target that addresses the sending instance itself.
pub const SELF_TARGET: &str = "self";

/// Returns true when `handler` is the constructor of `class_name`.
///
/// A constructor is the handler whose name equals the class name,
/// compared case-insensitively.
#[must_use]
pub fn is_constructor(class_name: &str, handler: &str) -> bool {
    handler.eq_ignore_ascii_case(class_name)
}

/// Name-keyed entries kept in declaration order.
///
/// Serializes as a JSON object. Deserializing rejects duplicate keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> OrderedMap<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a new entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] if `name` is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Result<()> {
        let name = name.into();
        if self.contains_key(&name) {
            return Err(Error::invalid_record(format!("duplicate key '{name}'")));
        }
        self.entries.push((name, value));
        Ok(())
    }

    /// Insert or replace an entry, keeping the original position on replace.
    pub fn upsert(&mut self, name: impl Into<String>, value: T) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for OrderedMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize> Serialize for OrderedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<T> {
    marker: PhantomData<fn() -> OrderedMap<T>>,
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<T> {
    type Value = OrderedMap<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map with unique keys")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> std::result::Result<Self::Value, M::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry::<String, T>()? {
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key '{key}'")));
            }
            map.entries.push((key, value));
        }
        Ok(map)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor {
            marker: PhantomData,
        })
    }
}

/// One `target!message` send statement, serialized as `[target, message]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct SendStatement {
    pub target: String,
    pub message: String,
}

impl SendStatement {
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message: message.into(),
        }
    }

    /// True when the target token is the literal `self`.
    #[must_use]
    pub fn targets_self(&self) -> bool {
        self.target == SELF_TARGET
    }
}

impl From<(String, String)> for SendStatement {
    fn from((target, message): (String, String)) -> Self {
        Self { target, message }
    }
}

impl From<SendStatement> for (String, String) {
    fn from(send: SendStatement) -> Self {
        (send.target, send.message)
    }
}

/// Per-handler facts extracted from the model source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSummary {
    /// Declared scheduling priority, if any.
    #[serde(default)]
    pub priority: Option<i32>,
    /// Sends in source order.
    pub sends: Vec<SendStatement>,
    pub reads: BTreeSet<String>,
    pub writes: BTreeSet<String>,
}

impl MethodSummary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_send(mut self, target: impl Into<String>, message: impl Into<String>) -> Self {
        self.sends.push(SendStatement::new(target, message));
        self
    }

    #[must_use]
    pub fn reading(mut self, var: impl Into<String>) -> Self {
        self.reads.insert(var.into());
        self
    }

    #[must_use]
    pub fn writing(mut self, var: impl Into<String>) -> Self {
        self.writes.insert(var.into());
        self
    }

    #[must_use]
    pub fn reads_var(&self, var: &str) -> bool {
        self.reads.contains(var)
    }

    #[must_use]
    pub fn writes_var(&self, var: &str) -> bool {
        self.writes.contains(var)
    }
}

/// One actor class: its state variables and handlers in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorClass {
    pub statevars: BTreeSet<String>,
    pub methods: OrderedMap<MethodSummary>,
}

impl ActorClass {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_statevar(mut self, var: impl Into<String>) -> Self {
        self.statevars.insert(var.into());
        self
    }

    #[must_use]
    pub fn with_method(mut self, name: impl Into<String>, method: MethodSummary) -> Self {
        self.methods.upsert(name, method);
        self
    }

    /// The constructor handler of this class, if declared.
    #[must_use]
    pub fn constructor<'a>(&'a self, class_name: &str) -> Option<(&'a str, &'a MethodSummary)> {
        self.methods
            .iter()
            .find(|(name, _)| is_constructor(class_name, name))
    }

    /// True when the constructor sends at least one message to `self`.
    #[must_use]
    pub fn constructor_sends_to_self(&self, class_name: &str) -> bool {
        self.constructor(class_name)
            .is_some_and(|(_, method)| method.sends.iter().any(SendStatement::targets_self))
    }
}

/// One actor instance declared in the model's main block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDecl {
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
}

impl InstanceDecl {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            priority: None,
            arg: None,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// The complete analysis handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisResult {
    pub actors: OrderedMap<ActorClass>,
    pub main_instances: Vec<InstanceDecl>,
}

impl AnalysisResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_class(mut self, name: impl Into<String>, class: ActorClass) -> Self {
        self.actors.upsert(name, class);
        self
    }

    #[must_use]
    pub fn with_instance(mut self, instance: InstanceDecl) -> Self {
        self.main_instances.push(instance);
        self
    }

    /// Parse and validate an analysis from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JsonParseFailed`] for malformed JSON or a missing or
    /// mistyped field, and [`Error::InvalidRecord`] when [`Self::validate`] fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let analysis: Self =
            serde_json::from_str(json).map_err(|e| Error::json_parse_failed(e.to_string()))?;
        analysis.validate()?;
        Ok(analysis)
    }

    /// Read, parse and validate an analysis file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileReadFailed`] if the file cannot be read, otherwise
    /// the errors of [`Self::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        Self::from_json_str(&json)
    }

    /// Check the contract the engine relies on.
    ///
    /// Referential integrity (unknown classes, unknown send targets) is not
    /// checked here; the engine degrades gracefully on those.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] for an empty class name, an empty
    /// instance name or class, or a duplicate instance name.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = self.actors.keys().find(|name| name.trim().is_empty()) {
            return Err(Error::invalid_record(format!(
                "actor class name must not be empty (got '{name}')"
            )));
        }

        let mut seen = HashSet::new();
        for (position, instance) in self.main_instances.iter().enumerate() {
            if instance.name.trim().is_empty() {
                return Err(Error::invalid_record(format!(
                    "main_instances[{position}]: instance name must not be empty"
                )));
            }
            if instance.class_name.trim().is_empty() {
                return Err(Error::invalid_record(format!(
                    "main_instances[{position}]: instance '{}' has an empty class",
                    instance.name
                )));
            }
            if !seen.insert(instance.name.as_str()) {
                return Err(Error::invalid_record(format!(
                    "main_instances[{position}]: duplicate instance name '{}'",
                    instance.name
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ActorClass> {
        self.actors.get(name)
    }

    #[must_use]
    pub fn instance(&self, name: &str) -> Option<&InstanceDecl> {
        self.main_instances.iter().find(|instance| instance.name == name)
    }
}
