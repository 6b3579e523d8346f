// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

use crate::xml::dom::{Document, NodePath};

/// Поиск всех элементов по пути вида `/manifest/application/meta-data`.
/// Это не XPath: только имена тегов через `/`, первый сегмент должен совпасть
/// с корнем. Результат идёт в порядке документа
pub fn select_nodes(doc: &Document, path: &str) -> Vec<NodePath> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let Some((first, rest)) = segments.split_first() else {
        return Vec::new();
    };

    if doc.root.name != *first {
        return Vec::new();
    }

    let mut current: Vec<NodePath> = vec![Vec::new()];

    for segment in rest {
        let mut next = Vec::new();

        for parent_path in &current {
            let Some(parent) = doc.element(parent_path) else {
                continue;
            };

            for (index, child) in parent.child_elements() {
                if child.name == *segment {
                    let mut child_path = parent_path.clone();
                    child_path.push(index);
                    next.push(child_path);
                }
            }
        }

        current = next;
    }

    current
}

pub fn select_single_node(doc: &Document, path: &str) -> Option<NodePath> {
    select_nodes(doc, path).into_iter().next()
}

/// Делит путь на родителя и имя тега по последнему `/`. Если родителя нет
/// (`meta-data`, `/manifest`) или имя пустое, возвращает None
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    let (parent, leaf) = path.rsplit_once('/')?;

    if parent.is_empty() || leaf.is_empty() {
        return None;
    }

    Some((parent, leaf))
}
