//! Typed filter-graph intermediate representation.
//!
//! The planner builds a [`FilterGraph`] of named operations over labeled
//! streams instead of concatenating strings; structure is asserted in
//! unit tests, and the textual ffmpeg `-filter_complex` DSL is produced
//! only at the pipeline boundary via [`FilterGraph::render`].

use serde::{Deserialize, Serialize};

/// One filter invocation, e.g. `trim=start=2:end=5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub args: Vec<FilterArg>,
}

/// A filter argument: either `key=value` or a bare positional value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterArg {
    Named(String, String),
    Positional(String),
}

/// A linear chain of filters from labeled inputs to labeled outputs,
/// e.g. `[0:v]trim=...,setpts=...[v0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterChain {
    /// Input stream labels, without brackets (`0:v`, `base`).
    pub inputs: Vec<String>,
    pub filters: Vec<Filter>,
    /// Output stream labels, without brackets.
    pub outputs: Vec<String>,
}

/// A complete branch-free filter graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterGraph {
    pub chains: Vec<FilterChain>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a `key=value` argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.args
            .push(FilterArg::Named(key.into(), value.to_string()));
        self
    }

    /// Append a bare positional argument.
    pub fn value(mut self, value: impl ToString) -> Self {
        self.args.push(FilterArg::Positional(value.to_string()));
        self
    }

    /// Look up a named argument, for structural assertions.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            FilterArg::Named(k, v) if k == key => Some(v.as_str()),
            _ => None,
        })
    }

    fn render(&self) -> String {
        if self.args.is_empty() {
            return self.name.clone();
        }
        let args = self
            .args
            .iter()
            .map(|arg| match arg {
                FilterArg::Named(k, v) => format!("{k}={v}"),
                FilterArg::Positional(v) => v.clone(),
            })
            .collect::<Vec<_>>()
            .join(":");
        format!("{}={}", self.name, args)
    }
}

impl FilterChain {
    pub fn new(inputs: Vec<String>, outputs: Vec<String>) -> Self {
        Self {
            inputs,
            filters: Vec::new(),
            outputs,
        }
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// Find a filter by name, for structural assertions.
    pub fn find(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.name == name)
    }

    fn render(&self) -> String {
        let inputs: String = self.inputs.iter().map(|l| format!("[{l}]")).collect();
        let outputs: String = self.outputs.iter().map(|l| format!("[{l}]")).collect();
        let body = self
            .filters
            .iter()
            .map(Filter::render)
            .collect::<Vec<_>>()
            .join(",");
        format!("{inputs}{body}{outputs}")
    }
}

impl FilterGraph {
    pub fn push(&mut self, chain: FilterChain) {
        self.chains.push(chain);
    }

    /// Chains whose output set contains `label`.
    pub fn producer_of(&self, label: &str) -> Option<&FilterChain> {
        self.chains
            .iter()
            .find(|c| c.outputs.iter().any(|o| o == label))
    }

    /// Serialize to the ffmpeg `-filter_complex` textual DSL.
    pub fn render(&self) -> String {
        self.chains
            .iter()
            .map(FilterChain::render)
            .collect::<Vec<_>>()
            .join(";")
    }
}
