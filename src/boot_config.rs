// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

use indexmap::IndexMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;

use crate::error::{Error, Result};

/// Ключ под которым boot config лежит в настройках платформы
pub const XR_BOOT_SETTINGS_KEY: &str = "xr-boot-settings";

/// Имя платформы сборки в хранилище настроек
pub const ANDROID_BUILD_TARGET: &str = "Android";

/// Набор флагов для нативного загрузчика движка. В хранилище это одна строка
/// вида `key1:value1;key2:value2`. Экранирования нет, поэтому ключи и значения
/// не должны содержать `:` и `;`. Порядок ключей сохраняется, иначе строка
/// менялась бы от сборки к сборке
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootConfig {
    settings: IndexMap<String, String>,
}

impl BootConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Разбор строки из хранилища. Ошибок не бывает: пары где полей не ровно два
    /// или одна из половин пустая просто пропускаются. Если ключ повторяется,
    /// побеждает последнее значение
    pub fn read(raw: &str) -> Self {
        let mut settings = IndexMap::new();

        for boot_setting in raw.split(';') {
            let parts: Vec<&str> = boot_setting.split(':').collect();

            if let [key, value] = parts.as_slice() {
                if !key.is_empty() && !value.is_empty() {
                    settings.insert(key.to_string(), value.to_string());
                }
            }
        }

        Self { settings }
    }

    /// Загрузка boot config для платформы из хранилища настроек сборки
    pub fn load(store: &BuildSettingsStore, target: &str) -> Self {
        store.get(target, XR_BOOT_SETTINGS_KEY)
            .map(Self::read)
            .unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.settings.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Удаляет ключ только если значение всё ещё то, которое записали мы.
    /// Если кто-то другой успел поменять значение, запись остаётся
    pub fn clear_if_matches(&mut self, key: &str, value: &str) -> bool {
        if self.get(key) == Some(value) {
            self.settings.shift_remove(key);
            return true;
        }

        false
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.settings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn write(&self) -> String {
        self.to_string()
    }

    /// Запись обратно в хранилище (без сохранения файла, это делает вызывающий)
    pub fn store(&self, store: &mut BuildSettingsStore, target: &str) {
        store.set(target, XR_BOOT_SETTINGS_KEY, &self.write());
    }
}

impl fmt::Display for BootConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.settings.iter().enumerate() {
            if index > 0 {
                write!(f, ";")?;
            }

            write!(f, "{}:{}", key, value)?;
        }

        Ok(())
    }
}

/// Хранилище настроек сборки по платформам. Это toml файл где на каждую
/// платформу своя таблица со строковыми ключами:
///
/// ```toml
/// [Android]
/// xr-boot-settings = "xr-usable-core-mask-enabled:1"
/// ```
///
/// Если файла нет, хранилище пустое и файл появится при первом save()
#[derive(Debug)]
pub struct BuildSettingsStore {
    path: PathBuf,
    table: toml::map::Map<String, Value>,
}

impl BuildSettingsStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let table = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)
                .map_err(|source| Error::TomlSyntax { path: path.clone(), source })?
        } else {
            toml::map::Map::new()
        };

        Ok(Self { path, table })
    }

    /// Значения не строкового типа считаются отсутствующими
    pub fn get(&self, target: &str, key: &str) -> Option<&str> {
        self.table.get(target)?
            .as_table()?
            .get(key)?
            .as_str()
    }

    pub fn set(&mut self, target: &str, key: &str, value: &str) {
        let entry = self.table
            .entry(target.to_string())
            .or_insert(Value::Table(toml::map::Map::new()));

        // Если под именем платформы лежало что-то кроме таблицы, заменяем
        if !entry.is_table() {
            *entry = Value::Table(toml::map::Map::new());
        }

        if let Value::Table(platform) = entry {
            platform.insert(key.to_string(), Value::String(value.to_string()));
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(&self.table)?;
        fs::write(&self.path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_read_simple_pairs() {
        let config = BootConfig::read("a:1;b:2");

        assert_eq!(config.len(), 2);
        assert_eq!(config.get("a"), Some("1"));
        assert_eq!(config.get("b"), Some("2"));
    }

    #[test]
    fn test_set_appends_in_order() {
        let mut config = BootConfig::read("a:1;b:2");
        config.set("c", "3");

        assert_eq!(config.write(), "a:1;b:2;c:3");
    }

    #[test]
    fn test_set_existing_key_keeps_position() {
        let mut config = BootConfig::read("a:1;b:2;c:3");
        config.set("a", "9");

        assert_eq!(config.write(), "a:9;b:2;c:3");
    }

    #[test]
    fn test_read_drops_malformed_entries() {
        let config = BootConfig::read(";a:1;:2;b:;c;d:4:5;e:5;");

        assert_eq!(config.write(), "a:1;e:5");
    }

    #[test]
    fn test_read_empty_string() {
        let config = BootConfig::read("");

        assert!(config.is_empty());
        assert_eq!(config.write(), "");
    }

    #[test]
    fn test_duplicate_key_last_value_wins() {
        let config = BootConfig::read("a:1;b:2;a:3");

        assert_eq!(config.write(), "a:3;b:2");
    }

    #[test]
    fn test_round_trip() {
        let mut config = BootConfig::new();
        config.set("xr-usable-core-mask-enabled", "1");
        config.set("xr-require-backbuffer-textures", "0");
        config.set("gfx-enable-gfx-jobs", "true");

        assert_eq!(BootConfig::read(&config.write()), config);
    }

    #[test]
    fn test_clear_if_matches_removes_on_equal_value() {
        let mut config = BootConfig::read("a:1;b:2;c:3");

        assert!(config.clear_if_matches("b", "2"));
        assert_eq!(config.write(), "a:1;c:3");
    }

    #[test]
    fn test_clear_if_matches_keeps_foreign_value() {
        let mut config = BootConfig::read("a:1;b:5");

        assert!(!config.clear_if_matches("b", "2"));
        assert!(!config.clear_if_matches("missing", "2"));
        assert_eq!(config.write(), "a:1;b:5");
    }

    #[test]
    fn test_value_with_separator_is_lost_on_reread() {
        let mut config = BootConfig::new();
        config.set("path", "C:/tmp");

        assert!(BootConfig::read(&config.write()).is_empty());
    }

    #[test]
    fn test_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = BuildSettingsStore::open(dir.path().join("none.toml")).unwrap();

        assert_eq!(store.get(ANDROID_BUILD_TARGET, XR_BOOT_SETTINGS_KEY), None);
        assert!(BootConfig::load(&store, ANDROID_BUILD_TARGET).is_empty());
    }

    #[test]
    fn test_store_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings").join("build.toml");

        let mut store = BuildSettingsStore::open(&path).unwrap();
        let mut config = BootConfig::read("a:1");
        config.set("b", "2");
        config.store(&mut store, ANDROID_BUILD_TARGET);
        store.set("Standalone", "other", "x");
        store.save().unwrap();

        let reopened = BuildSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get(ANDROID_BUILD_TARGET, XR_BOOT_SETTINGS_KEY), Some("a:1;b:2"));
        assert_eq!(reopened.get("Standalone", "other"), Some("x"));
        assert_eq!(BootConfig::load(&reopened, ANDROID_BUILD_TARGET), config);
    }

    #[test]
    fn test_store_rejects_broken_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.toml");
        fs::write(&path, "[Android\n").unwrap();

        assert!(BuildSettingsStore::open(&path).is_err());
    }

    fn pairs() -> impl Strategy<Value = Vec<(String, String)>> {
        proptest::collection::vec(("[^:;]{1,8}", "[^:;]{1,8}"), 0..8)
    }

    proptest! {
        #[test]
        fn test_write_then_read_keeps_entries_and_order(entries in pairs()) {
            let mut config = BootConfig::new();
            let mut expected: IndexMap<String, String> = IndexMap::new();

            for (key, value) in &entries {
                config.set(key, value);
                expected.insert(key.clone(), value.clone());
            }

            let reread = BootConfig::read(&config.write());

            prop_assert_eq!(&reread, &config);
            prop_assert!(reread.iter().eq(expected.iter().map(|(k, v)| (k.as_str(), v.as_str()))));
        }

        #[test]
        fn test_clear_if_matches_removes_only_equal_value(
            entries in proptest::collection::vec(("[^:;]{1,8}", "[^:;]{1,8}"), 1..8),
            pick in any::<prop::sample::Index>(),
            other in "[^:;]{1,8}",
            same in any::<bool>(),
        ) {
            let mut config = BootConfig::new();
            for (key, value) in &entries {
                config.set(key, value);
            }

            let (key, current) = entries[pick.index(entries.len())].clone();
            let current = config.get(&key).map(str::to_string).unwrap_or(current);
            let value = if same { current.clone() } else { other };

            let before = config.clone();
            let removed = config.clear_if_matches(&key, &value);

            prop_assert_eq!(removed, value == current);

            if removed {
                prop_assert_eq!(config.get(&key), None);
                prop_assert_eq!(config.len(), before.len() - 1);
                prop_assert!(config.iter().eq(before.iter().filter(|(k, _)| *k != key)));
            } else {
                prop_assert_eq!(&config, &before);
            }
        }
    }
}
