// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::boot_config::{BootConfig, BuildSettingsStore, ANDROID_BUILD_TARGET};
use crate::error::Result;
use crate::frontend::{hooks, manifest};
use crate::settings;

/// Хуки сборки PICO XR для экспортированного Android проекта.
/// Вызываются по очереди: preprocess перед сборкой, manifest после генерации
/// gradle проекта, postprocess после сборки
#[derive(Debug, Parser)]
#[command(name = "pxr-build", version, about = "PICO XR build hooks for exported Android projects")]
pub struct BuildSystem {
    #[command(subcommand)]
    pub action: Actions,
}

#[derive(Debug, Subcommand)]
pub enum Actions {
    /// Check player settings and set XR boot config flags
    Preprocess {
        /// Build settings file holding the boot config
        #[arg(long)]
        store: PathBuf,

        #[arg(long, default_value = ANDROID_BUILD_TARGET)]
        target: String,

        /// Project settings (.toml), later files override earlier ones
        settings: Vec<PathBuf>,
    },

    /// Clear the XR boot config flags set by preprocess
    Postprocess {
        #[arg(long)]
        store: PathBuf,

        #[arg(long, default_value = ANDROID_BUILD_TARGET)]
        target: String,
    },

    /// Apply PICO XR entries to AndroidManifest.xml of a gradle project
    Manifest {
        /// unityLibrary module or root of the exported gradle project
        project: PathBuf,

        /// Project settings (.toml), later files override earlier ones
        settings: Vec<PathBuf>,
    },

    /// Inspect or edit the boot config by hand
    Boot {
        #[arg(long)]
        store: PathBuf,

        #[arg(long, default_value = ANDROID_BUILD_TARGET)]
        target: String,

        #[command(subcommand)]
        action: BootAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum BootAction {
    /// Print every boot config entry
    Show,
    /// Set a key
    Set { key: String, value: String },
    /// Remove a key if it still has the given value
    Clear { key: String, value: String },
}

impl BuildSystem {
    pub fn run(self) -> Result<()> {
        match self.action {
            Actions::Preprocess { store, target, settings } => {
                task!("Loading project settings");
                let settings = settings::load(&settings)?;

                let mut store = BuildSettingsStore::open(store)?;
                let player = hooks::preprocess(&settings, &mut store, &target)?;

                if player.graphics_apis != settings.player.graphics_apis {
                    let names: Vec<String> = player.graphics_apis.iter().map(ToString::to_string).collect();
                    note!("Set graphics APIs of the Android player to [{}]", names.join(", "));
                }
            }

            Actions::Postprocess { store, target } => {
                let mut store = BuildSettingsStore::open(store)?;
                hooks::postprocess(&mut store, &target)?;
            }

            Actions::Manifest { project, settings } => {
                task!("Loading project settings");
                let settings = settings::load(&settings)?;

                manifest::prepare_manifest(&project, &settings)?;
            }

            Actions::Boot { store, target, action } => {
                let mut store = BuildSettingsStore::open(store)?;
                let mut boot_config = BootConfig::load(&store, &target);

                match action {
                    BootAction::Show => {
                        for (key, value) in boot_config.iter() {
                            info!("{} = {}", key, value);
                        }

                        return Ok(());
                    }

                    BootAction::Set { key, value } => {
                        if key.contains([':', ';']) || value.contains([':', ';']) {
                            warn!("Boot config has no escaping, entry {}:{} will be dropped on next read", key, value);
                        }

                        boot_config.set(&key, &value);
                    }

                    BootAction::Clear { key, value } => {
                        if !boot_config.clear_if_matches(&key, &value) {
                            info!("{} is not set to {}, nothing to clear", key, value);
                            return Ok(());
                        }
                    }
                }

                boot_config.store(&mut store, &target);
                store.save()?;
            }
        }

        Ok(())
    }
}
