// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

use clap::Parser;

use pxr_build::build_system::BuildSystem;

fn main() {
    let build_system = BuildSystem::parse();

    // Любая ошибка здесь означает что сборку нужно прервать
    if let Err(e) = build_system.run() {
        pxr_build::error!("{}", e);
        std::process::exit(1);
    }
}
