//! Output profiles and crop mode.
//!
//! A profile fixes the output geometry: the box the cropped content is fit
//! into, the canvas it is pasted onto, and where on the canvas it goes.
//! Profiles are plain data held in a [`ProfileTable`] keyed by name, so a
//! new layout is a config entry:
//!
//! ```toml
//! [profiles.banner]
//! content = [1600, 600]
//! canvas = [1800, 800]
//! placement = { fixed = { left = 100, top = 50 } }
//! ```
//!
//! Two profiles are always present unless overridden:
//!
//! | Name        | Content   | Canvas    | Placement        |
//! |-------------|-----------|-----------|------------------|
//! | `default`   | 1200x1200 | 1620x1620 | centered (210,210) |
//! | `alternate` | 1620x1300 | 1620x1620 | fixed (0,100)    |

use crate::imaging::calculations::center_offset;
use crate::imaging::params::{Offset, Size};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PROFILE: &str = "default";
pub const ALTERNATE_PROFILE: &str = "alternate";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("unknown profile '{name}' (available: {})", .available.join(", "))]
    Unknown { name: String, available: Vec<String> },
    #[error("profile '{name}' is invalid: {reason}")]
    Invalid { name: String, reason: String },
}

/// Where the content box sits on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// `floor((canvas - content) / 2)` on both axes.
    #[default]
    Center,
    /// A fixed top-left offset, for content whose aspect ratio differs from the canvas.
    Fixed { left: u32, top: u32 },
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Center => f.write_str("centered"),
            Placement::Fixed { left, top } => write!(f, "fixed at ({left}, {top})"),
        }
    }
}

/// Canvas size, content size and placement for one named output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputProfile {
    /// The box the cropped content is fit into.
    pub content: Size,
    /// The final output dimensions.
    pub canvas: Size,
    #[serde(default)]
    pub placement: Placement,
}

impl OutputProfile {
    /// Square content centered on a square canvas.
    pub fn stock_default() -> Self {
        Self {
            content: Size::new(1200, 1200),
            canvas: Size::new(1620, 1620),
            placement: Placement::Center,
        }
    }

    /// Wide content anchored near the top of a square canvas.
    pub fn stock_alternate() -> Self {
        Self {
            content: Size::new(1620, 1300),
            canvas: Size::new(1620, 1620),
            placement: Placement::Fixed { left: 0, top: 100 },
        }
    }

    /// Top-left corner of the content box on the canvas.
    pub fn paste_offset(&self) -> Offset {
        match self.placement {
            Placement::Center => center_offset(self.canvas, self.content),
            Placement::Fixed { left, top } => Offset::new(left, top),
        }
    }

    /// Check that both sizes are non-zero and the content box lies inside the canvas.
    pub fn validate(&self, name: &str) -> Result<(), ProfileError> {
        let invalid = |reason: String| ProfileError::Invalid {
            name: name.to_string(),
            reason,
        };
        if self.content.is_empty() {
            return Err(invalid(format!("content size {} is empty", self.content)));
        }
        if self.canvas.is_empty() {
            return Err(invalid(format!("canvas size {} is empty", self.canvas)));
        }
        let offset = self.paste_offset();
        let right = offset.left as u64 + self.content.width as u64;
        let bottom = offset.top as u64 + self.content.height as u64;
        if right > self.canvas.width as u64 || bottom > self.canvas.height as u64 {
            return Err(invalid(format!(
                "content {} {} does not fit canvas {}",
                self.content, self.placement, self.canvas
            )));
        }
        Ok(())
    }
}

impl fmt::Display for OutputProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offset = self.paste_offset();
        write!(
            f,
            "content {} on canvas {}, {} (offset {},{})",
            self.content, self.canvas, self.placement, offset.left, offset.top
        )
    }
}

/// Named profiles, loaded from the `[profiles]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileTable(BTreeMap<String, OutputProfile>);

impl Default for ProfileTable {
    fn default() -> Self {
        let mut table = BTreeMap::new();
        table.insert(DEFAULT_PROFILE.to_string(), OutputProfile::stock_default());
        table.insert(
            ALTERNATE_PROFILE.to_string(),
            OutputProfile::stock_alternate(),
        );
        Self(table)
    }
}

impl ProfileTable {
    pub fn new(profiles: impl IntoIterator<Item = (String, OutputProfile)>) -> Self {
        Self(profiles.into_iter().collect())
    }

    /// Look up a profile by name.
    pub fn get(&self, name: &str) -> Result<&OutputProfile, ProfileError> {
        self.0.get(name).ok_or_else(|| ProfileError::Unknown {
            name: name.to_string(),
            available: self.names().map(str::to_string).collect(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutputProfile)> {
        self.0.iter().map(|(name, profile)| (name.as_str(), profile))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validate every profile in the table.
    pub fn validate(&self) -> Result<(), ProfileError> {
        self.iter()
            .try_for_each(|(name, profile)| profile.validate(name))
    }
}

/// Whether detection runs (`crop`) or is bypassed for a plain re-encode (`no-crop`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CropMode {
    #[default]
    Crop,
    NoCrop,
}

impl CropMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CropMode::Crop => "crop",
            CropMode::NoCrop => "no-crop",
        }
    }
}

impl fmt::Display for CropMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown crop mode '{0}' (expected 'crop' or 'no-crop')")]
pub struct ParseCropModeError(String);

impl FromStr for CropMode {
    type Err = ParseCropModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crop" => Ok(CropMode::Crop),
            "no-crop" => Ok(CropMode::NoCrop),
            other => Err(ParseCropModeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // OutputProfile
    // =========================================================================

    #[test]
    fn default_profile_is_centered() {
        let profile = OutputProfile::stock_default();
        assert_eq!(profile.paste_offset(), Offset::new(210, 210));
    }

    #[test]
    fn alternate_profile_uses_fixed_offset() {
        let profile = OutputProfile::stock_alternate();
        assert_eq!(profile.paste_offset(), Offset::new(0, 100));
    }

    #[test]
    fn stock_profiles_validate() {
        assert!(ProfileTable::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_content() {
        let profile = OutputProfile {
            content: Size::new(0, 100),
            ..OutputProfile::stock_default()
        };
        assert!(matches!(
            profile.validate("broken"),
            Err(ProfileError::Invalid { name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn validate_rejects_content_outside_canvas() {
        let profile = OutputProfile {
            content: Size::new(1620, 1600),
            canvas: Size::new(1620, 1620),
            placement: Placement::Fixed { left: 0, top: 100 },
        };
        let err = profile.validate("tall").unwrap_err();
        assert!(err.to_string().contains("does not fit canvas 1620x1620"));
    }

    #[test]
    fn validate_rejects_centered_content_larger_than_canvas() {
        let profile = OutputProfile {
            content: Size::new(2000, 1000),
            canvas: Size::new(1620, 1620),
            placement: Placement::Center,
        };
        assert!(profile.validate("wide").is_err());
    }

    #[test]
    fn profile_display() {
        assert_eq!(
            OutputProfile::stock_alternate().to_string(),
            "content 1620x1300 on canvas 1620x1620, fixed at (0, 100) (offset 0,100)"
        );
    }

    // =========================================================================
    // Serde
    // =========================================================================

    #[test]
    fn parse_fixed_placement() {
        let profile: OutputProfile = toml::from_str(
            r#"
content = [800, 600]
canvas = [1000, 1000]
placement = { fixed = { left = 100, top = 50 } }
"#,
        )
        .unwrap();
        assert_eq!(profile.placement, Placement::Fixed { left: 100, top: 50 });
        assert_eq!(profile.paste_offset(), Offset::new(100, 50));
    }

    #[test]
    fn parse_placement_defaults_to_center() {
        let profile: OutputProfile =
            toml::from_str("content = [800, 600]\ncanvas = [1000, 1000]\n").unwrap();
        assert_eq!(profile.placement, Placement::Center);
        assert_eq!(profile.paste_offset(), Offset::new(100, 200));
    }

    #[test]
    fn unknown_profile_key_rejected() {
        let result: Result<OutputProfile, _> =
            toml::from_str("content = [1, 1]\ncanvas = [1, 1]\noffset = [0, 0]\n");
        assert!(result.is_err());
    }

    #[test]
    fn table_parses_stock_profiles() {
        let toml = r#"
[default]
content = [1200, 1200]
canvas = [1620, 1620]
placement = "center"

[alternate]
content = [1620, 1300]
canvas = [1620, 1620]
placement = { fixed = { left = 0, top = 100 } }
"#;
        let table: ProfileTable = toml::from_str(toml).unwrap();
        assert_eq!(table, ProfileTable::default());
    }

    // =========================================================================
    // ProfileTable
    // =========================================================================

    #[test]
    fn table_lookup_by_name() {
        let table = ProfileTable::default();
        assert_eq!(
            table.get("alternate").unwrap(),
            &OutputProfile::stock_alternate()
        );
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["alternate", "default"]);
    }

    #[test]
    fn table_unknown_name_lists_available() {
        let err = ProfileTable::default().get("square").unwrap_err();
        assert_eq!(
            err,
            ProfileError::Unknown {
                name: "square".into(),
                available: vec!["alternate".into(), "default".into()],
            }
        );
        assert_eq!(
            err.to_string(),
            "unknown profile 'square' (available: alternate, default)"
        );
    }

    #[test]
    fn third_profile_is_data_only() {
        let mut entries: Vec<_> = ProfileTable::default()
            .iter()
            .map(|(n, p)| (n.to_string(), *p))
            .collect();
        entries.push((
            "thumb".to_string(),
            OutputProfile {
                content: Size::new(300, 300),
                canvas: Size::new(400, 400),
                placement: Placement::Center,
            },
        ));
        let table = ProfileTable::new(entries);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("thumb").unwrap().paste_offset(), Offset::new(50, 50));
    }

    // =========================================================================
    // CropMode
    // =========================================================================

    #[test]
    fn crop_mode_parses_both_spellings() {
        assert_eq!("crop".parse::<CropMode>(), Ok(CropMode::Crop));
        assert_eq!("no-crop".parse::<CropMode>(), Ok(CropMode::NoCrop));
        assert!("nocrop".parse::<CropMode>().is_err());
    }

    #[test]
    fn crop_mode_display_matches_parse() {
        for mode in [CropMode::Crop, CropMode::NoCrop] {
            assert_eq!(mode.to_string().parse::<CropMode>(), Ok(mode));
        }
    }
}
