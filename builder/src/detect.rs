/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use std::fmt;
use std::path::Path;

/// How a project gets deployed: a one-shot build whose output is served as
/// files, or a long-lived process behind a reverse-proxy route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
    Static,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framework {
    React,
    Vue,
    NextJs,
    StaticHtml,
    Unknown,
}

impl Framework {
    pub fn strategy(&self) -> BuildStrategy {
        match self {
            Framework::NextJs => BuildStrategy::Server,
            Framework::React | Framework::Vue | Framework::StaticHtml | Framework::Unknown => {
                BuildStrategy::Static
            }
        }
    }

    /// Display label persisted onto the project record.
    pub fn label(&self) -> &'static str {
        match self {
            Framework::React => "React",
            Framework::Vue => "Vue",
            Framework::NextJs => "Next.js",
            Framework::StaticHtml => "Static HTML",
            Framework::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

const NEXT_CONFIGS: [&str; 3] = ["next.config.js", "next.config.mjs", "next.config.ts"];
const VUE_CONFIGS: [&str; 2] = ["vue.config.js", "vue.config.ts"];

/// Classify a cloned tree into a build strategy. Unknown trees are treated
/// as raw static content downstream.
pub fn detect_framework(dir: &Path) -> Framework {
    let exists = |name: &str| dir.join(name).is_file();

    if exists("package.json") {
        if NEXT_CONFIGS.iter().any(|f| exists(f)) {
            Framework::NextJs
        } else if VUE_CONFIGS.iter().any(|f| exists(f)) {
            Framework::Vue
        } else {
            Framework::React
        }
    } else if exists("index.html") {
        Framework::StaticHtml
    } else {
        Framework::Unknown
    }
}

pub fn has_manifest(dir: &Path) -> bool {
    dir.join("package.json").is_file()
}
