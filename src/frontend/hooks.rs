// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

use crate::boot_config::{BootConfig, BuildSettingsStore, ANDROID_BUILD_TARGET};
use crate::error::{Error, Result};
use crate::settings::{GraphicsApi, PlayerSettings, Settings, StereoRenderingMode};

/// Флаги которые XR плагину нужны от нативного загрузчика на Android.
/// Ставятся перед сборкой и снимаются после неё
pub const ANDROID_BOOT_CONFIG_VARS: &[(&str, &str)] = &[
    ("xr-usable-core-mask-enabled", "1"),
    ("xr-require-backbuffer-textures", "0"),
    ("xr-hide-memoryless-render-texture", "1"),
];

pub const MIN_ANDROID_API_LEVEL: u32 = 29;

/// Проверка настроек плеера перед сборкой. Возвращает настройки с поправками:
/// multiview не работает на GLES2, поэтому в этом случае список графических
/// API заменяется на GLES3
pub fn check_player_settings(settings: &Settings) -> Result<PlayerSettings> {
    let mut player = settings.player.clone();

    let first_gfx = *player.graphics_apis.first().ok_or(Error::NoGraphicsApi)?;

    if !matches!(first_gfx, GraphicsApi::OpenGles3 | GraphicsApi::Vulkan | GraphicsApi::OpenGles2) {
        return Err(Error::UnsupportedGraphicsApi(first_gfx));
    }

    if settings.xr.stereo_rendering_mode == StereoRenderingMode::Multiview && first_gfx == GraphicsApi::OpenGles2 {
        note!("Multiview is not supported on {}, graphics APIs switched to {}", first_gfx, GraphicsApi::OpenGles3);
        player.graphics_apis = vec![GraphicsApi::OpenGles3];
    }

    if player.min_sdk < MIN_ANDROID_API_LEVEL {
        return Err(Error::MinSdkTooLow {
            found: player.min_sdk,
            required: MIN_ANDROID_API_LEVEL,
        });
    }

    Ok(player)
}

/// Хук перед сборкой. Для Android с включённым XR загрузчиком проверяет
/// настройки плеера, потом выставляет флаги boot config и сохраняет хранилище.
/// Для других платформ ничего не делает
pub fn preprocess(settings: &Settings, store: &mut BuildSettingsStore, target: &str) -> Result<PlayerSettings> {
    hook!("Pre-build ({})", target);

    if target != ANDROID_BUILD_TARGET {
        info!(" Not an Android build, nothing to do");
        return Ok(settings.player.clone());
    }

    let player = if settings.xr.loader_enabled {
        check_player_settings(settings)?
    } else {
        info!(" PICO XR loader is disabled, player settings are not checked");
        settings.player.clone()
    };

    let mut boot_config = BootConfig::load(store, target);

    for (key, value) in ANDROID_BOOT_CONFIG_VARS {
        boot_config.set(key, value);
    }

    boot_config.store(store, target);
    store.save()?;

    info!(" Boot config: {}", boot_config);
    Ok(player)
}

/// Хук после сборки: снимает наши флаги boot config, но только те значения
/// которые никто не успел поменять
pub fn postprocess(store: &mut BuildSettingsStore, target: &str) -> Result<()> {
    hook!("Post-build ({})", target);

    if target != ANDROID_BUILD_TARGET {
        info!(" Not an Android build, nothing to do");
        return Ok(());
    }

    let mut boot_config = BootConfig::load(store, target);

    for (key, value) in ANDROID_BOOT_CONFIG_VARS {
        if !boot_config.clear_if_matches(key, value) && boot_config.get(key).is_some() {
            warn!("Boot config key {} was changed after pre-build, keeping it", key);
        }
    }

    boot_config.store(store, target);
    store.save()?;

    Ok(())
}
