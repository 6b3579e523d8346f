// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use toml::Value;

use crate::error::{Error, Result};

/// Загрузка настроек проекта. Как и в конфиге сборки, можно передать несколько
/// файлов: они сливаются по порядку и каждый следующий перекрывает значения
/// предыдущего. Пустой список даёт настройки по умолчанию
pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Settings> {
    if paths.is_empty() {
        return Ok(Settings::default());
    }

    let mut merged_value = Value::Table(toml::map::Map::new());

    for path in paths {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref)?;

        let value: Value = toml::from_str(&content)
            .map_err(|source| Error::TomlSyntax { path: path_ref.to_path_buf(), source })?;

        merge_toml_values(&mut merged_value, value);
    }

    let settings: Settings = merged_value.try_into()?;
    Ok(settings)
}

/// Рекурсивное слияние таблиц. Всё что не таблица (в том числе массивы)
/// просто заменяется значением из нового файла
fn merge_toml_values(base: &mut Value, append: Value) {
    match (base, append) {
        (Value::Table(base_map), Value::Table(append_map)) => {
            for (k, v) in append_map {
                let base_entry = base_map.entry(k).or_insert(Value::Table(toml::map::Map::new()));
                merge_toml_values(base_entry, v);
            }
        }
        (base_val, append_val) => *base_val = append_val,
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Settings {
    // Настройки XR плагина
    #[serde(default)]
    pub xr: XrSettings,

    // То что в движке лежит в настройках плеера Android
    #[serde(default)]
    pub player: PlayerSettings,

    // Фичи проекта, каждая превращается в meta-data или разрешение в манифесте
    #[serde(default)]
    pub project: ProjectConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct XrSettings {
    pub loader_enabled: bool,
    pub stereo_rendering_mode: StereoRenderingMode,
    pub system_display_frequency: SystemDisplayFrequency,
    pub system_splash_screen: Option<String>,
}

impl Default for XrSettings {
    fn default() -> Self {
        Self {
            loader_enabled: true,
            stereo_rendering_mode: StereoRenderingMode::default(),
            system_display_frequency: SystemDisplayFrequency::default(),
            system_splash_screen: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct PlayerSettings {
    pub graphics_apis: Vec<GraphicsApi>,
    pub min_sdk: u32,
    pub color_space: ColorSpace,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            graphics_apis: vec![GraphicsApi::OpenGles3],
            min_sdk: 29,
            color_space: ColorSpace::Linear,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProjectConfig {
    pub use_content_protect: bool,
    pub adaptive_hand: bool,
    pub high_frequency_hand: bool,
    pub open_mrc: bool,
    pub late_latching: bool,
    pub late_latching_debug: bool,
    pub body_tracking: bool,
    pub adaptive_resolution: bool,
    pub mr_safeguard: bool,
    pub video_see_through: bool,
    pub spatial_anchor: bool,
    pub shared_anchor: bool,
    pub spatial_mesh: bool,
    pub scene_capture: bool,
    pub super_resolution: bool,
    pub normal_sharpening: bool,
    pub quality_sharpening: bool,
    pub fixed_foveated_sharpening: bool,
    pub self_adaptive_sharpening: bool,
    pub eye_tracking: bool,
    pub enable_etfr: bool,
    pub eyetracking_calibration: bool,
    pub hand_tracking: bool,
    pub hand_tracking_support: HandTrackingSupport,
    pub face_tracking: bool,
    pub lipsync_tracking: bool,
}

impl ProjectConfig {
    /// Любая из фич MR требует доступ к пространственным данным
    pub fn uses_spatial_data(&self) -> bool {
        self.spatial_anchor || self.scene_capture || self.spatial_mesh || self.shared_anchor
    }

    pub fn uses_eye_tracking(&self) -> bool {
        self.eye_tracking || self.enable_etfr
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StereoRenderingMode {
    #[default]
    MultiPass = 0,
    Multiview = 1,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SystemDisplayFrequency {
    #[default]
    Default = 0,
    #[serde(rename = "refresh-rate-72")]
    RefreshRate72 = 1,
    #[serde(rename = "refresh-rate-90")]
    RefreshRate90 = 2,
    #[serde(rename = "refresh-rate-120")]
    RefreshRate120 = 3,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HandTrackingSupport {
    #[default]
    ControllersAndHands,
    HandsOnly,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ColorSpace {
    Gamma,
    #[default]
    Linear,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsApi {
    OpenGles2,
    OpenGles3,
    Vulkan,
    Metal,
    Direct3d11,
}

impl fmt::Display for GraphicsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphicsApi::OpenGles2 => "OpenGLES2",
            GraphicsApi::OpenGles3 => "OpenGLES3",
            GraphicsApi::Vulkan => "Vulkan",
            GraphicsApi::Metal => "Metal",
            GraphicsApi::Direct3d11 => "Direct3D11",
        };

        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_toml(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_empty_gives_defaults() {
        let paths: Vec<std::path::PathBuf> = vec![];
        let settings = load(&paths).unwrap();

        assert!(settings.xr.loader_enabled);
        assert_eq!(settings.player.min_sdk, 29);
        assert_eq!(settings.player.graphics_apis, vec![GraphicsApi::OpenGles3]);
        assert!(!settings.project.hand_tracking);
    }

    #[test]
    fn test_load_reads_kebab_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_toml(dir.path(), "pxr.toml", r#"
            [xr]
            stereo-rendering-mode = "multiview"
            system-display-frequency = "refresh-rate-90"

            [player]
            graphics-apis = ["vulkan", "opengles3"]
            min-sdk = 32

            [project]
            hand-tracking = true
            hand-tracking-support = "hands-only"
            spatial-anchor = true
        "#);

        let settings = load(&[path]).unwrap();

        assert_eq!(settings.xr.stereo_rendering_mode, StereoRenderingMode::Multiview);
        assert_eq!(settings.xr.system_display_frequency as i32, 2);
        assert_eq!(settings.player.graphics_apis[0], GraphicsApi::Vulkan);
        assert_eq!(settings.player.min_sdk, 32);
        assert_eq!(settings.project.hand_tracking_support, HandTrackingSupport::HandsOnly);
        assert!(settings.project.uses_spatial_data());
        assert!(!settings.project.uses_eye_tracking());
    }

    #[test]
    fn test_later_file_overrides_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_toml(dir.path(), "base.toml", r#"
            [project]
            face-tracking = true
            eye-tracking = true
        "#);
        let overlay = write_toml(dir.path(), "release.toml", r#"
            [project]
            eye-tracking = false
        "#);

        let settings = load(&[base, overlay]).unwrap();

        assert!(settings.project.face_tracking);
        assert!(!settings.project.eye_tracking);
    }

    #[test]
    fn test_syntax_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_toml(dir.path(), "broken.toml", "[project\nhand-tracking = true");

        let err = load(&[path]).unwrap_err();
        assert!(matches!(err, Error::TomlSyntax { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_unknown_enum_value_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_toml(dir.path(), "pxr.toml", "[player]\ngraphics-apis = [\"glide\"]\n");

        assert!(matches!(load(&[path]), Err(Error::Config(_))));
    }
}
