//! Tool registry.
//!
//! An immutable catalogue of operation descriptors, built once at startup
//! and shared by the dispatcher and the transport for discovery.

mod schema;
pub mod tools;

pub use schema::{Field, FieldType, Schema};

use serde_json::Value;
use std::collections::HashMap;

/// Static description of one tool.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub name: String,
    pub description: String,
    pub parameter_schema: Schema,
}

impl OperationDescriptor {
    pub fn new(name: &str, description: &str, parameter_schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameter_schema,
        }
    }

    /// JSON Schema advertised as the tool's `inputSchema`.
    pub fn input_schema(&self) -> Value {
        self.parameter_schema.to_json_schema()
    }
}

/// Name-indexed, order-preserving descriptor table.
#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: Vec<OperationDescriptor>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Registry of every yt-mcp tool, using `default_output_dir` as the
    /// advertised default for `outputPath`.
    pub fn new(default_output_dir: &str) -> Self {
        Self::from_descriptors(tools::descriptors(default_output_dir))
    }

    /// Build from arbitrary descriptors. Later duplicates are ignored.
    pub fn from_descriptors(descriptors: Vec<OperationDescriptor>) -> Self {
        let mut unique = Vec::with_capacity(descriptors.len());
        let mut index = HashMap::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if index.contains_key(&descriptor.name) {
                continue;
            }
            index.insert(descriptor.name.clone(), unique.len());
            unique.push(descriptor);
        }

        Self {
            descriptors: unique,
            index,
        }
    }

    /// All descriptors in declaration order.
    pub fn list(&self) -> &[OperationDescriptor] {
        &self.descriptors
    }

    /// Look up a descriptor by exact, case-sensitive name.
    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }
}
