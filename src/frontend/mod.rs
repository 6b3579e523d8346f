// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

pub mod hooks;
pub mod manifest;

use sha2::{Digest, Sha256};

/// SHA-256 содержимого в hex. Пишется в лог рядом с путём записанного
/// манифеста, по нему видно какую версию файла подхватил gradle
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());

    format!("{:x}", hasher.finalize())
}
