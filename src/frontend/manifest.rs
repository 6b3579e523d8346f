// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::attrs;
use crate::error::{Error, Result};
use crate::settings::{ColorSpace, HandTrackingSupport, Settings};
use crate::xml::Document;

use super::fingerprint;

pub const MANIFEST_TAG_PATH: &str = "/manifest";
pub const APPLICATION_TAG_PATH: &str = "/manifest/application";
pub const META_DATA_TAG_PATH: &str = "/manifest/application/meta-data";
pub const USES_PERMISSION_TAG: &str = "uses-permission";

pub const SDK_VERSION: &str = "XR Platform_3.1.2";
pub const SDK_VERSION_CODE: &str = "5120";

pub const HAND_TRACKING_PERMISSION: &str = "com.picovr.permission.HAND_TRACKING";

/// Куда копируется картинка системного сплэша внутри gradle модуля
pub const SPLASH_ASSET_PATH: &str = "src/main/assets/pico_splash.png";

/// Итог работы над манифестом
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestOutcome {
    Updated(PathBuf),
    UpToDate(PathBuf),
    Skipped,
}

/// Поиск AndroidManifest.xml. Можно передать как сам модуль unityLibrary,
/// так и корень экспортированного gradle проекта: тогда манифест ищется
/// в подпапках
pub fn locate_manifest(project_dir: &Path) -> Result<PathBuf> {
    let direct = project_dir.join("src").join("main").join("AndroidManifest.xml");
    if direct.exists() {
        return Ok(direct);
    }

    for entry in WalkDir::new(project_dir).max_depth(5).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();

        if entry.file_name() == "AndroidManifest.xml" && path.ends_with("unityLibrary/src/main/AndroidManifest.xml") {
            return Ok(path.to_path_buf());
        }
    }

    Err(Error::ManifestNotFound(project_dir.to_path_buf()))
}

/// Читает манифест модуля, применяет настройки и записывает обратно, но только
/// если содержимое реально поменялось
pub fn prepare_manifest(project_dir: &Path, settings: &Settings) -> Result<ManifestOutcome> {
    hook!("Post-generate gradle project {:?}", project_dir);

    if !settings.xr.loader_enabled {
        info!(" PICO XR loader is disabled, manifest is left as is");
        return Ok(ManifestOutcome::Skipped);
    }

    let manifest_path = locate_manifest(project_dir)?;
    let module_dir = manifest_path
        .parent()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap_or(project_dir)
        .to_path_buf();

    let original = fs::read_to_string(&manifest_path)?;
    let mut doc = Document::parse(&original)?;

    apply_manifest(&mut doc, settings, &module_dir)?;

    let new_content = doc.to_xml()?;

    if new_content == original {
        cached!("{:?} is up-to-date", manifest_path);
        return Ok(ManifestOutcome::UpToDate(manifest_path));
    }

    fs::write(&manifest_path, &new_content)?;
    info!(" Written {:?} (sha256 {})", manifest_path, fingerprint(&new_content));

    Ok(ManifestOutcome::Updated(manifest_path))
}

fn flag(enabled: bool) -> &'static str {
    if enabled { "1" } else { "0" }
}

fn set_meta_data(doc: &mut Document, name: &str, value: &str) {
    doc.insert_attribute(META_DATA_TAG_PATH, Some(&attrs! { "name" => name }), &attrs! { "value" => value });
}

fn remove_meta_data(doc: &mut Document, name: &str) {
    doc.remove_attribute(META_DATA_TAG_PATH, Some(&attrs! { "name" => name }));
}

fn add_permission(doc: &mut Document, name: &str) {
    doc.create_element(MANIFEST_TAG_PATH, USES_PERMISSION_TAG, &attrs! { "name" => name });
}

/// Копирует картинку сплэша в ассеты модуля. Возвращает значение для
/// meta-data `pvr.app.splash`
fn install_splash_screen(settings: &Settings, module_dir: &Path) -> Result<&'static str> {
    let Some(source) = settings.xr.system_splash_screen.as_deref() else {
        return Ok("0");
    };

    let source = Path::new(source);
    if !source.is_file() {
        warn!("System splash screen {:?} not found, splash is disabled", source);
        return Ok("0");
    }

    let target = module_dir.join(SPLASH_ASSET_PATH);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::copy(source, &target)?;
    Ok("1")
}

/// Все правки манифеста для PICO. Каждая фича проекта превращается в
/// meta-data внутри application, некоторые ещё и в uses-permission
pub fn apply_manifest(doc: &mut Document, settings: &Settings, module_dir: &Path) -> Result<()> {
    task!("Applying PICO XR settings to AndroidManifest.xml");

    let project = &settings.project;

    doc.insert_attribute(APPLICATION_TAG_PATH, None, &attrs! { "requestLegacyExternalStorage" => "true" });

    set_meta_data(doc, "pvr.app.type", "vr");
    set_meta_data(doc, "pvr.sdk.version", SDK_VERSION);
    set_meta_data(doc, "pxr.sdk.version_code", SDK_VERSION_CODE);

    set_meta_data(doc, "enable_cpt", flag(project.use_content_protect));
    set_meta_data(doc, "Enable_AdaptiveHandModel", flag(project.adaptive_hand));
    set_meta_data(doc, "Hand_Tracking_HighFrequency", flag(project.high_frequency_hand));
    set_meta_data(doc, "rendering_mode", &(settings.xr.stereo_rendering_mode as i32).to_string());
    set_meta_data(doc, "display_rate", &(settings.xr.system_display_frequency as i32).to_string());
    set_meta_data(doc, "color_Space", flag(settings.player.color_space == ColorSpace::Linear));
    set_meta_data(doc, "MRCsupport", flag(project.open_mrc));
    set_meta_data(doc, "pvr.LateLatching", flag(project.late_latching));
    set_meta_data(doc, "pvr.LateLatchingDebug", flag(project.late_latching && project.late_latching_debug));
    set_meta_data(doc, "pvr.app.splash", install_splash_screen(settings, module_dir)?);
    set_meta_data(doc, "PICO.swift.feature", flag(project.body_tracking));
    set_meta_data(doc, "adaptive_resolution", flag(project.adaptive_resolution));
    set_meta_data(doc, "enable_mr_safeguard", flag(project.mr_safeguard));
    set_meta_data(doc, "enable_vst", flag(project.video_see_through));
    set_meta_data(doc, "enable_anchor", flag(project.spatial_anchor));
    set_meta_data(doc, "mr_map_mgr_auto_start", flag(project.spatial_anchor));
    set_meta_data(doc, "enable_spatial_anchor", flag(project.spatial_anchor));
    set_meta_data(doc, "enable_cloud_anchor", flag(project.shared_anchor));
    set_meta_data(doc, "enable_mesh_anchor", flag(project.spatial_mesh));
    set_meta_data(doc, "enable_scene_anchor", flag(project.scene_capture));
    set_meta_data(doc, "pvr.SuperResolution", flag(project.super_resolution));
    set_meta_data(doc, "pvr.NormalSharpening", flag(project.normal_sharpening));
    set_meta_data(doc, "pvr.QualitySharpening", flag(project.quality_sharpening));
    set_meta_data(doc, "pvr.FixedFoveatedSharpening", flag(project.fixed_foveated_sharpening));
    set_meta_data(doc, "pvr.SelfAdaptiveSharpening", flag(project.self_adaptive_sharpening));

    add_permission(doc, "android.permission.WRITE_SETTINGS");

    if project.uses_eye_tracking() {
        add_permission(doc, "com.picovr.permission.EYE_TRACKING");
        set_meta_data(doc, "picovr.software.eye_tracking", "1");
        set_meta_data(doc, "eyetracking_calibration", if project.eyetracking_calibration { "true" } else { "false" });
    }

    if project.uses_spatial_data() {
        add_permission(doc, "com.picovr.permission.SPATIAL_DATA");
    }

    if project.hand_tracking {
        set_meta_data(doc, "handtracking", "1");

        match project.hand_tracking_support {
            HandTrackingSupport::HandsOnly => remove_meta_data(doc, "controller"),
            HandTrackingSupport::ControllersAndHands => set_meta_data(doc, "controller", "1"),
        }

        add_permission(doc, HAND_TRACKING_PERMISSION);
    } else {
        remove_meta_data(doc, "handtracking");
        set_meta_data(doc, "controller", "1");

        let removed = doc.remove_name_value_element(
            MANIFEST_TAG_PATH,
            USES_PERMISSION_TAG,
            "android:name",
            HAND_TRACKING_PERMISSION,
        );

        if removed > 0 {
            note!("Hand tracking is disabled, removed {} HAND_TRACKING permission(s)", removed);
        }
    }

    if project.face_tracking {
        add_permission(doc, "com.picovr.permission.FACE_TRACKING");
    }

    if project.lipsync_tracking {
        add_permission(doc, "android.permission.RECORD_AUDIO");
    }

    if project.face_tracking {
        set_meta_data(doc, "picovr.software.face_tracking", "false/true");
    }

    Ok(())
}
