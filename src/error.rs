// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

use std::path::PathBuf;

use thiserror::Error;

use crate::settings::GraphicsApi;

/// Все ошибки pxr-build. Мягкие ситуации (нет нужного элемента в манифесте,
/// нет ключа в boot config) ошибками не считаются и сюда не попадают, здесь
/// только то что должно прервать сборку
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("XML document has no root element")]
    MissingRoot,

    #[error("XML document has more than one root element (second is <{0}>)")]
    MultipleRoots(String),

    #[error("XML element <{0}> is never closed")]
    UnclosedElement(String),

    #[error("Invalid UTF-8 in generated XML: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Toml syntax error {path:?}: {source}")]
    TomlSyntax {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config structure error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Toml write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("AndroidManifest.xml not found in {0:?}")]
    ManifestNotFound(PathBuf),

    #[error("PICO Plugin on mobile platforms nonsupport the {0}")]
    UnsupportedGraphicsApi(GraphicsApi),

    #[error("No graphics API configured for the Android player")]
    NoGraphicsApi,

    #[error("Android Minimum API must be set to {required} or higher for PICO Plugin (found {found})")]
    MinSdkTooLow { found: u32, required: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
