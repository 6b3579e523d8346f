// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

pub mod dom;
pub mod editor;
pub mod path;

pub use dom::{Document, Element, Node, NodePath};
pub use editor::{Attrs, ANDROID_PREFIX, ANDROID_URI};
pub use path::{select_nodes, select_single_node, split_parent};
