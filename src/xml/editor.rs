// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

use indexmap::IndexMap;

use crate::xml::dom::{Document, Element, NodePath};
use crate::xml::path::{select_nodes, select_single_node, split_parent};

pub const ANDROID_URI: &str = "http://schemas.android.com/apk/res/android";
pub const ANDROID_PREFIX: &str = "android";

/// Имя атрибута (без префикса) -> значение. Порядок важен, в таком порядке
/// атрибуты появятся у нового элемента
pub type Attrs = IndexMap<String, String>;

/// Короткая запись для словаря атрибутов: `attrs! { "name" => "handtracking" }`
#[macro_export]
macro_rules! attrs {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::xml::Attrs::new();
        $( map.insert($key.to_string(), $value.to_string()); )*
        map
    }};
}

/// Правки манифеста. Все операции идемпотентны, а если нужного элемента
/// нет, они молча ничего не делают: манифест может ещё не содержать секций
/// которые мы правим
impl Document {
    /// Проверка фильтра: у элемента должен быть каждый атрибут из `filter`
    /// в пространстве android с точно таким же непустым значением.
    /// Пустой фильтр подходит любому элементу
    pub fn filter_check(&self, path: &[usize], filter: &Attrs) -> bool {
        filter.iter().all(|(key, value)| {
            match self.attribute_ns(path, key, ANDROID_URI) {
                Some(current) => !current.is_empty() && current == value.as_str(),
                None => false,
            }
        })
    }

    fn update_or_create_attributes(&mut self, path: &[usize], attributes: &Attrs) {
        for (key, value) in attributes {
            self.set_attribute_ns(path, ANDROID_PREFIX, key, ANDROID_URI, value);
        }
    }

    /// Выставляет `attributes` элементу по пути `tag_path`. Без фильтра берётся
    /// первый элемент по пути, с фильтром первый прошедший проверку. Если такого
    /// нет, элемент создаётся под родителем пути с атрибутами фильтра и
    /// `attributes` вместе, так что повторный вызов его уже найдёт
    pub fn insert_attribute(&mut self, tag_path: &str, filter: Option<&Attrs>, attributes: &Attrs) {
        let target = match filter {
            None => select_single_node(self, tag_path),
            Some(filter) => select_nodes(self, tag_path)
                .into_iter()
                .find(|path| self.filter_check(path, filter)),
        };

        if let Some(path) = target {
            self.update_or_create_attributes(&path, attributes);
            return;
        }

        let Some((parent_path, tag_name)) = split_parent(tag_path) else {
            return;
        };

        // Фильтр вызывающего не трогаем, собираем новый набор
        let mut merged = filter.cloned().unwrap_or_default();
        merged.extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));

        self.create_element(parent_path, tag_name, &merged);
    }

    /// Создаёт `<tag_name>` последним ребёнком первого элемента по `parent_path`.
    /// Если у родителя уже есть дочерний элемент подходящий под `attributes`
    /// как под фильтр, новый не создаётся. Возвращает true если элемент добавлен
    pub fn create_element(&mut self, parent_path: &str, tag_name: &str, attributes: &Attrs) -> bool {
        let Some(parent) = select_single_node(self, parent_path) else {
            return false;
        };

        let children: Vec<usize> = match self.element(&parent) {
            Some(element) => element.child_elements().map(|(index, _)| index).collect(),
            None => return false,
        };

        let already_exists = children.into_iter().any(|index| {
            self.filter_check(&child_path(&parent, index), attributes)
        });

        if already_exists {
            return false;
        }

        let Some(index) = self.element_mut(&parent).map(|p| p.append_child(Element::new(tag_name))) else {
            return false;
        };

        self.update_or_create_attributes(&child_path(&parent, index), attributes);
        true
    }

    /// Удаляет первый элемент по `tag_path` прошедший фильтр. Без фильтра
    /// ничего не удаляется
    pub fn remove_attribute(&mut self, tag_path: &str, filter: Option<&Attrs>) -> bool {
        let Some(filter) = filter else {
            return false;
        };

        let target = select_nodes(self, tag_path)
            .into_iter()
            .find(|path| self.filter_check(path, filter));

        match target {
            Some(path) => self.remove_element(&path).is_some(),
            None => false,
        }
    }

    /// Удаляет все элементы `parent_path/tag` у которых атрибут с полным именем
    /// `attr_name` (например `android:name`) равен `attr_value`. В отличие от
    /// remove_attribute пространства имён не разрешаются, и удаляются все
    /// совпадения а не только первое. Возвращает сколько удалено
    pub fn remove_name_value_element(&mut self, parent_path: &str, tag: &str, attr_name: &str, attr_value: &str) -> usize {
        let tag_path = format!("{}/{}", parent_path, tag);

        let matches: Vec<NodePath> = select_nodes(self, &tag_path)
            .into_iter()
            .filter(|path| {
                self.element(path).and_then(|e| e.attribute(attr_name)) == Some(attr_value)
            })
            .collect();

        // С конца, чтобы индексы ещё не обработанных элементов не съезжали
        let mut removed = 0;
        for path in matches.iter().rev() {
            if self.remove_element(path).is_some() {
                removed += 1;
            }
        }

        removed
    }
}

fn child_path(parent: &[usize], index: usize) -> NodePath {
    let mut path = parent.to_vec();
    path.push(index);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;

    const META_DATA: &str = "/manifest/application/meta-data";

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.unity3d.player">
    <application android:label="@string/app_name">
        <meta-data android:name="unityplayer.SkipPermissionsDialog" android:value="true"/>
        <meta-data android:name="controller" android:value="1"/>
    </application>
    <uses-permission android:name="android.permission.INTERNET"/>
</manifest>
"#;

    fn manifest() -> Document {
        Document::parse(MANIFEST).unwrap()
    }

    fn count(doc: &Document, needle: &str) -> usize {
        doc.to_xml().unwrap().matches(needle).count()
    }

    #[test]
    fn test_filter_check() {
        let doc = manifest();
        let controller = vec![1, 3];

        assert!(doc.filter_check(&controller, &attrs! { "name" => "controller" }));
        assert!(doc.filter_check(&controller, &attrs! { "name" => "controller", "value" => "1" }));
        assert!(!doc.filter_check(&controller, &attrs! { "name" => "controller", "value" => "0" }));
        assert!(!doc.filter_check(&controller, &attrs! { "label" => "controller" }));
        assert!(doc.filter_check(&controller, &attrs! {}));
    }

    #[test]
    fn test_filter_check_rejects_empty_value() {
        let doc = Document::parse(
            r#"<m xmlns:android="http://schemas.android.com/apk/res/android"><a android:name=""/></m>"#
        ).unwrap();

        assert!(!doc.filter_check(&[0], &attrs! { "name" => "" }));
    }

    #[test]
    fn test_insert_attribute_creates_missing_meta_data() {
        let mut doc = manifest();
        doc.insert_attribute(META_DATA, Some(&attrs! { "name" => "handtracking" }), &attrs! { "value" => "1" });

        let xml = doc.to_xml().unwrap();
        assert!(xml.contains(
            "<meta-data android:name=\"controller\" android:value=\"1\"/>\n        \
             <meta-data android:name=\"handtracking\" android:value=\"1\"/>\n    </application>"
        ));
    }

    #[test]
    fn test_insert_attribute_updates_existing() {
        let mut doc = manifest();
        doc.insert_attribute(META_DATA, Some(&attrs! { "name" => "controller" }), &attrs! { "value" => "0" });

        assert_eq!(count(&doc, "<meta-data"), 2);
        assert_eq!(doc.attribute_ns(&[1, 3], "value", ANDROID_URI), Some("0"));
    }

    #[test]
    fn test_insert_attribute_is_idempotent() {
        let mut once = manifest();
        once.insert_attribute(META_DATA, Some(&attrs! { "name" => "handtracking" }), &attrs! { "value" => "1" });

        let mut twice = once.clone();
        twice.insert_attribute(META_DATA, Some(&attrs! { "name" => "handtracking" }), &attrs! { "value" => "1" });

        assert_eq!(once.to_xml().unwrap(), twice.to_xml().unwrap());
    }

    #[test]
    fn test_insert_attribute_does_not_touch_caller_filter() {
        let mut doc = manifest();
        let filter = attrs! { "name" => "enable_anchor" };
        doc.insert_attribute(META_DATA, Some(&filter), &attrs! { "value" => "1" });

        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn test_insert_attribute_without_filter() {
        let mut doc = manifest();
        doc.insert_attribute(
            "/manifest/application",
            None,
            &attrs! { "requestLegacyExternalStorage" => "true" },
        );

        assert_eq!(
            doc.element(&[1]).unwrap().attribute("android:requestLegacyExternalStorage"),
            Some("true")
        );
    }

    #[test]
    fn test_insert_attribute_without_parent_is_noop() {
        let mut doc = Document::parse(
            r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"/>"#
        ).unwrap();
        let before = doc.clone();

        doc.insert_attribute(META_DATA, Some(&attrs! { "name" => "x" }), &attrs! { "value" => "1" });
        assert_eq!(doc, before);
    }

    #[test]
    fn test_create_element_twice_gives_one_child() {
        let mut doc = manifest();
        let permission = attrs! { "name" => "com.picovr.permission.HAND_TRACKING" };

        assert!(doc.create_element("/manifest", "uses-permission", &permission));
        assert!(!doc.create_element("/manifest", "uses-permission", &permission));

        assert_eq!(count(&doc, "com.picovr.permission.HAND_TRACKING"), 1);
        assert_eq!(count(&doc, "<uses-permission"), 2);
    }

    #[test]
    fn test_create_element_missing_parent() {
        let mut doc = manifest();

        assert!(!doc.create_element("/manifest/queries", "package", &attrs! { "name" => "x" }));
        assert_eq!(doc, manifest());
    }

    #[test]
    fn test_remove_attribute_removes_first_match() {
        let mut doc = manifest();

        assert!(doc.remove_attribute(META_DATA, Some(&attrs! { "name" => "controller" })));
        assert_eq!(count(&doc, "controller"), 0);
        assert_eq!(count(&doc, "<meta-data"), 1);

        assert!(!doc.remove_attribute(META_DATA, Some(&attrs! { "name" => "controller" })));
        assert!(!doc.remove_attribute(META_DATA, None));
    }

    #[test]
    fn test_remove_name_value_element_removes_duplicates() {
        let mut doc = Document::parse(r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-permission android:name="com.picovr.permission.HAND_TRACKING"/>
    <uses-permission android:name="android.permission.INTERNET"/>
    <uses-permission android:name="com.picovr.permission.HAND_TRACKING"/>
</manifest>"#).unwrap();

        let removed = doc.remove_name_value_element(
            "/manifest", "uses-permission", "android:name", "com.picovr.permission.HAND_TRACKING",
        );

        assert_eq!(removed, 2);
        assert_eq!(
            doc.to_xml().unwrap(),
            r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-permission android:name="android.permission.INTERNET"/>
</manifest>"#
        );
    }

    #[test]
    fn test_remove_name_value_element_uses_plain_name() {
        let mut doc = Document::parse(
            r#"<manifest xmlns:a="http://schemas.android.com/apk/res/android"><uses-permission a:name="X"/></manifest>"#
        ).unwrap();

        // Имя сравнивается как строка, префикс a: не совпадает с android:
        assert_eq!(doc.remove_name_value_element("/manifest", "uses-permission", "android:name", "X"), 0);
        assert_eq!(doc.remove_name_value_element("/manifest", "uses-permission", "a:name", "X"), 1);
    }
}
