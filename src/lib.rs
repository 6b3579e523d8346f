// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

//! Хуки сборки PICO XR для Android: флаги boot config в настройках сборки
//! и правки AndroidManifest.xml экспортированного gradle проекта

#[macro_use]
mod logger;

pub mod boot_config;
pub mod build_system;
pub mod error;
pub mod frontend;
pub mod settings;
pub mod xml;

pub use error::{Error, Result};
