// ─── Platform Rules ───
// ALLOW/DISALLOW filters selecting which runtime platforms need an artifact.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Osx,
    Linux,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Windows, Platform::Osx, Platform::Linux];

    /// The platform this process runs on.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Osx
        } else {
            Platform::Linux
        }
    }

    /// Map a repository OS name to a platform; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "windows" => Some(Platform::Windows),
            "osx" | "macos" => Some(Platform::Osx),
            "linux" => Some(Platform::Linux),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Osx => "osx",
            Platform::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

/// One rule. `os` is the raw OS name as published by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<String>,
}

impl PlatformRule {
    pub fn allow(os: Option<&str>) -> Self {
        Self {
            action: RuleAction::Allow,
            os: os.map(str::to_string),
        }
    }

    pub fn disallow(os: Option<&str>) -> Self {
        Self {
            action: RuleAction::Disallow,
            os: os.map(str::to_string),
        }
    }

    fn platform(&self) -> Option<Platform> {
        self.os.as_deref().and_then(Platform::from_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformRules(pub Vec<PlatformRule>);

impl PlatformRules {
    pub fn new(rules: Vec<PlatformRule>) -> Self {
        Self(rules)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Platforms this rule set admits.
    ///
    /// - No rules → every platform.
    /// - Otherwise the union of platforms named by ALLOW rules (an ALLOW
    ///   without a recognised platform admits every platform), minus every
    ///   platform named by a DISALLOW rule. Rule order does not matter.
    pub fn allowed_platforms(&self) -> HashSet<Platform> {
        if self.0.is_empty() {
            return Platform::ALL.into_iter().collect();
        }

        let mut allowed: HashSet<Platform> = HashSet::new();
        for rule in self.0.iter().filter(|r| r.action == RuleAction::Allow) {
            match rule.platform() {
                Some(p) => {
                    allowed.insert(p);
                }
                None => allowed.extend(Platform::ALL),
            }
        }

        for rule in self.0.iter().filter(|r| r.action == RuleAction::Disallow) {
            if let Some(p) = rule.platform() {
                allowed.remove(&p);
            }
        }

        allowed
    }

    pub fn admits(&self, platform: Platform) -> bool {
        self.allowed_platforms().contains(&platform)
    }

    pub fn admits_current(&self) -> bool {
        self.admits(Platform::current())
    }
}
