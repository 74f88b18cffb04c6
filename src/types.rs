use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Logical class of front-end asset handled by the pipeline.
///
/// Every class has exactly one entry in the path table and one transform
/// task of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Styles,
    Scripts,
    Images,
    Markup,
}

impl AssetClass {
    pub const ALL: [AssetClass; 4] = [
        AssetClass::Styles,
        AssetClass::Scripts,
        AssetClass::Images,
        AssetClass::Markup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Styles => "styles",
            AssetClass::Scripts => "scripts",
            AssetClass::Images => "images",
            AssetClass::Markup => "markup",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "styles" => Ok(AssetClass::Styles),
            "scripts" => Ok(AssetClass::Scripts),
            "images" => Ok(AssetClass::Images),
            "markup" => Ok(AssetClass::Markup),
            other => Err(format!(
                "invalid asset class: {other} (expected styles, scripts, images or markup)"
            )),
        }
    }
}

/// What connected browser sessions should do after a class is rebuilt.
///
/// - `Inject`: swap the updated stylesheets in place, no page reload.
/// - `Full`: reload the whole page.
/// - `Never`: rebuild silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadPolicy {
    Inject,
    Full,
    #[serde(rename = "none")]
    Never,
}

impl Default for ReloadPolicy {
    fn default() -> Self {
        ReloadPolicy::Full
    }
}

impl fmt::Display for ReloadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReloadPolicy::Inject => "inject",
            ReloadPolicy::Full => "full",
            ReloadPolicy::Never => "none",
        })
    }
}
