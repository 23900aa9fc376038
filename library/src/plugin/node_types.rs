//! Module registry: the fixed, ordered set of node kinds.

use image::RgbaImage;
use std::ops::RangeInclusive;

use crate::error::LibraryError;
use crate::model::project::property::{SettingValue, Settings};
use crate::plugin::effects;

/// Kind of a node in the editor graph.
///
/// Input and Output are singletons; every other kind is an image transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleKind {
    Input,
    Resize,
    Rotate,
    Blur,
    Brightness,
    Contrast,
    Sharpness,
    Opacity,
    Crop,
    Flip,
    Output,
}

impl ModuleKind {
    /// All kinds in registry order.
    pub const ALL: [ModuleKind; 11] = [
        ModuleKind::Input,
        ModuleKind::Resize,
        ModuleKind::Rotate,
        ModuleKind::Blur,
        ModuleKind::Brightness,
        ModuleKind::Contrast,
        ModuleKind::Sharpness,
        ModuleKind::Opacity,
        ModuleKind::Crop,
        ModuleKind::Flip,
        ModuleKind::Output,
    ];

    /// Kinds a user may add to the graph.
    pub fn transforms() -> impl Iterator<Item = ModuleKind> {
        Self::ALL.into_iter().filter(|kind| !kind.is_protected())
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModuleKind::Input => "Input",
            ModuleKind::Resize => "Resize",
            ModuleKind::Rotate => "Rotate",
            ModuleKind::Blur => "Blur",
            ModuleKind::Brightness => "Brightness",
            ModuleKind::Contrast => "Contrast",
            ModuleKind::Sharpness => "Sharpness",
            ModuleKind::Opacity => "Opacity",
            ModuleKind::Crop => "Crop",
            ModuleKind::Flip => "Flip",
            ModuleKind::Output => "Output",
        }
    }

    pub fn tooltip(&self) -> &'static str {
        match self {
            ModuleKind::Input => "Source image",
            ModuleKind::Resize => "Resize the image by percentage",
            ModuleKind::Rotate => "Rotate the image counter-clockwise",
            ModuleKind::Blur => "Apply a gaussian blur",
            ModuleKind::Brightness => "Adjust brightness",
            ModuleKind::Contrast => "Adjust contrast",
            ModuleKind::Sharpness => "Adjust sharpness",
            ModuleKind::Opacity => "Adjust opacity",
            ModuleKind::Crop => "Crop pixels from the image edges",
            ModuleKind::Flip => "Flip the image horizontally or vertically",
            ModuleKind::Output => "Rendered result",
        }
    }

    /// Case-insensitive lookup by kind name.
    pub fn from_name(name: &str) -> Result<ModuleKind, LibraryError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| LibraryError::UnknownModuleKind(name.to_string()))
    }

    /// Input and Output cannot be deleted or duplicated.
    pub fn is_protected(&self) -> bool {
        matches!(self, ModuleKind::Input | ModuleKind::Output)
    }

    pub fn has_input_port(&self) -> bool {
        *self != ModuleKind::Input
    }

    pub fn has_output_port(&self) -> bool {
        *self != ModuleKind::Output
    }

    /// Lower-case prefix used in node aliases (`resize_0`).
    pub fn alias_prefix(&self) -> String {
        self.name().to_ascii_lowercase()
    }

    pub fn default_settings(&self) -> Settings {
        match self {
            ModuleKind::Input | ModuleKind::Output => Settings::new(),
            ModuleKind::Resize => Settings::new()
                .with("width", 100)
                .with("height", 100)
                .with("keep_aspect", true),
            ModuleKind::Rotate => Settings::new().with("angle", 0),
            ModuleKind::Blur => Settings::new().with("radius", 0),
            ModuleKind::Brightness => Settings::new().with("percentage", 100),
            ModuleKind::Contrast => Settings::new().with("percentage", 100),
            ModuleKind::Sharpness => Settings::new().with("percentage", 1),
            ModuleKind::Opacity => Settings::new().with("percentage", 100),
            ModuleKind::Crop => Settings::new()
                .with("left", 0)
                .with("top", 0)
                .with("right", 0)
                .with("bottom", 0),
            ModuleKind::Flip => Settings::new()
                .with("horizontal", false)
                .with("vertical", false),
        }
    }

    /// Inclusive range a numeric parameter is clamped to. `None` for flags.
    pub fn setting_range(&self, key: &str) -> Option<RangeInclusive<f64>> {
        match (self, key) {
            (ModuleKind::Resize, "width" | "height") => Some(1.0..=1000.0),
            (ModuleKind::Rotate, "angle") => Some(-360.0..=360.0),
            (ModuleKind::Blur, "radius") => Some(0.0..=100.0),
            (ModuleKind::Brightness | ModuleKind::Contrast, "percentage") => Some(0.0..=500.0),
            (ModuleKind::Sharpness, "percentage") => Some(1.0..=100.0),
            (ModuleKind::Opacity, "percentage") => Some(0.0..=100.0),
            (ModuleKind::Crop, "left" | "top" | "right" | "bottom") => Some(0.0..=100_000.0),
            _ => None,
        }
    }

    /// Checks `value` against the type of the parameter's default and clamps numbers
    /// into [`setting_range`](Self::setting_range).
    ///
    /// Integer parameters accept whole or fractional numbers and store them rounded.
    pub fn validate_setting(
        &self,
        key: &str,
        value: SettingValue,
    ) -> Result<SettingValue, LibraryError> {
        let defaults = self.default_settings();
        let Some(default) = defaults.get(key) else {
            return Err(LibraryError::UnknownSetting {
                kind: self.name().to_string(),
                key: key.to_string(),
            });
        };
        let clamp = |n: f64| match self.setting_range(key) {
            Some(range) => n.clamp(*range.start(), *range.end()),
            None => n,
        };

        match (default, value) {
            (SettingValue::Boolean(_), SettingValue::Boolean(_)) => Ok(value),
            (SettingValue::Integer(_), SettingValue::Integer(i)) => {
                Ok(SettingValue::Integer(clamp(i as f64) as i64))
            }
            (SettingValue::Integer(_), SettingValue::Number(n)) if n.into_inner().is_finite() => {
                Ok(SettingValue::Integer(clamp(n.into_inner().round()) as i64))
            }
            (SettingValue::Number(_), SettingValue::Integer(i)) => Ok(clamp(i as f64).into()),
            (SettingValue::Number(_), SettingValue::Number(n)) if n.into_inner().is_finite() => {
                Ok(clamp(n.into_inner()).into())
            }
            (SettingValue::Pair(..), SettingValue::Pair(a, b))
                if a.into_inner().is_finite() && b.into_inner().is_finite() =>
            {
                Ok(value)
            }
            _ => Err(LibraryError::InvalidSettingValue {
                kind: self.name().to_string(),
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Maps a persisted setting key onto one of this kind's parameters.
    ///
    /// Accepts plain names (`percentage`) and the older per-widget tags
    /// (`sharpness_percentage_3`).
    pub fn normalize_setting_key(&self, key: &str) -> Option<String> {
        let defaults = self.default_settings();
        if defaults.contains_key(key) {
            return Some(key.to_string());
        }

        let prefix = format!("{}_", self.alias_prefix());
        let stripped = key.strip_prefix(&prefix).unwrap_or(key);
        let stripped = match stripped.rsplit_once('_') {
            Some((head, tail)) if tail.chars().all(|c| c.is_ascii_digit()) => head,
            _ => stripped,
        };
        defaults
            .contains_key(stripped)
            .then(|| stripped.to_string())
    }

    /// Pure transform of this kind. Each call sees only this node's settings.
    pub fn run(&self, image: &RgbaImage, settings: &Settings) -> Result<RgbaImage, LibraryError> {
        match self {
            ModuleKind::Input | ModuleKind::Output => {
                Err(LibraryError::NotATransform(self.name().to_string()))
            }
            ModuleKind::Resize => effects::geometry::resize(image, settings),
            ModuleKind::Rotate => Ok(effects::geometry::rotate(image, settings)),
            ModuleKind::Blur => Ok(effects::blur::blur(image, settings)),
            ModuleKind::Brightness => Ok(effects::enhance::brightness(image, settings)),
            ModuleKind::Contrast => Ok(effects::enhance::contrast(image, settings)),
            ModuleKind::Sharpness => Ok(effects::enhance::sharpness(image, settings)),
            ModuleKind::Opacity => Ok(effects::enhance::opacity(image, settings)),
            ModuleKind::Crop => Ok(effects::geometry::crop(image, settings)),
            ModuleKind::Flip => Ok(effects::geometry::flip(image, settings)),
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_has_singletons_at_ends() {
        assert_eq!(ModuleKind::ALL.first(), Some(&ModuleKind::Input));
        assert_eq!(ModuleKind::ALL.last(), Some(&ModuleKind::Output));
        assert_eq!(ModuleKind::transforms().count(), 9);
    }

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(ModuleKind::from_name("resize").unwrap(), ModuleKind::Resize);
        assert_eq!(ModuleKind::from_name("OUTPUT").unwrap(), ModuleKind::Output);
        assert!(matches!(
            ModuleKind::from_name("Vignette"),
            Err(LibraryError::UnknownModuleKind(_))
        ));
    }

    #[test]
    fn test_normalize_setting_key() {
        let kind = ModuleKind::Sharpness;
        assert_eq!(kind.normalize_setting_key("percentage").as_deref(), Some("percentage"));
        assert_eq!(
            kind.normalize_setting_key("sharpness_percentage_3").as_deref(),
            Some("percentage")
        );
        assert_eq!(kind.normalize_setting_key("radius"), None);
        assert_eq!(
            ModuleKind::Flip.normalize_setting_key("flip_horizontal_12").as_deref(),
            Some("horizontal")
        );
    }

    #[test]
    fn test_every_numeric_default_is_in_range() {
        for kind in ModuleKind::ALL {
            for (key, value) in kind.default_settings().iter() {
                assert_eq!(kind.validate_setting(key, *value).as_ref().ok(), Some(value));
            }
        }
    }

    #[test]
    fn test_validate_setting_rejects_wrong_type() {
        assert!(matches!(
            ModuleKind::Resize.validate_setting("keep_aspect", SettingValue::Integer(7)),
            Err(LibraryError::InvalidSettingValue { .. })
        ));
        assert!(matches!(
            ModuleKind::Flip.validate_setting("vertical", SettingValue::from(1.0)),
            Err(LibraryError::InvalidSettingValue { .. })
        ));
        assert!(matches!(
            ModuleKind::Blur.validate_setting("radius", SettingValue::Boolean(true)),
            Err(LibraryError::InvalidSettingValue { .. })
        ));
        assert!(matches!(
            ModuleKind::Rotate.validate_setting("angle", SettingValue::from(f64::NAN)),
            Err(LibraryError::InvalidSettingValue { .. })
        ));
    }

    #[test]
    fn test_validate_setting_clamps_numbers() {
        let resize = ModuleKind::Resize;
        assert_eq!(
            resize.validate_setting("width", SettingValue::from(1e12)).unwrap(),
            SettingValue::Integer(1000)
        );
        assert_eq!(
            resize.validate_setting("height", SettingValue::Integer(-5)).unwrap(),
            SettingValue::Integer(1)
        );
        assert_eq!(
            ModuleKind::Sharpness
                .validate_setting("percentage", SettingValue::from(42.6))
                .unwrap(),
            SettingValue::Integer(43)
        );
    }

    #[test]
    fn test_singletons_do_not_run() {
        let image = RgbaImage::new(2, 2);
        assert!(matches!(
            ModuleKind::Input.run(&image, &Settings::new()),
            Err(LibraryError::NotATransform(_))
        ));
    }
}
