//! Layout and geometry settings.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Number of flush rounds a batch may take before pending notifications are given up.
pub const MAX_CONVERGENCE_ITERATIONS: usize = 5;

/// Number of nudges tried when a moved node overlaps another node.
pub const MAX_COLLISION_ATTEMPTS: usize = 5;

/// What to do when a bounded retry loop runs out of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LimitPolicy {
    /// Accept the current state silently.
    Ignore,
    /// Accept the current state and emit a `tracing` warning.
    #[default]
    Warn,
    /// Return an error.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    /// Horizontal distance between a parent box and its children.
    pub gap_x: f64,
    /// Vertical distance between sibling subtrees.
    pub gap_y: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            gap_x: 10.0,
            gap_y: 10.0,
        }
    }
}

impl LayoutOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeometryOptions {
    /// Applied when a batch flush does not settle within [`MAX_CONVERGENCE_ITERATIONS`].
    pub convergence: LimitPolicy,
    /// Applied when a moved node still overlaps after [`MAX_COLLISION_ATTEMPTS`] nudges.
    pub collision: LimitPolicy,
}

impl GeometryOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
