//! Registry of the tools provided by the workspace
//!
//! Tools backed by pre-trained weights are listed with a trailing `*`.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Task family a tool belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Dunya corpora access
    Dunya,
    /// Melodic pattern analysis
    Melody,
}

impl Task {
    pub const ALL: [Task; 2] = [Task::Dunya, Task::Melody];

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Dunya => "dunya",
            Task::Melody => "melody",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Task::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown task: {}", s)))
    }
}

/// A tool exposed by one of the workspace crates
#[derive(Debug, Clone, Copy)]
pub struct ToolInfo {
    pub name: &'static str,
    pub task: Task,
    pub pretrained: bool,
}

const TOOLS: &[ToolInfo] = &[
    ToolInfo {
        name: "Corpora",
        task: Task::Dunya,
        pretrained: false,
    },
    ToolInfo {
        name: "CaeFeatureExtractor",
        task: Task::Melody,
        pretrained: true,
    },
];

/// List tool names, optionally restricted to one task
pub fn list_tools(task: Option<Task>) -> Vec<String> {
    TOOLS
        .iter()
        .filter(|tool| task.map_or(true, |t| tool.task == t))
        .map(|tool| {
            if tool.pretrained {
                format!("{}*", tool.name)
            } else {
                tool.name.to_string()
            }
        })
        .collect()
}
