// Copyright (c) 2025 Spawn
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// https://www.eclipse.org/legal/epl-2.0/
// SPDX-License-Identifier: EPL-2.0

/// Вывод текущего этапа работы (preprocess, manifest и так далее).
/// Печатает "TASK: Сообщение", префикс зелёный и жирный
#[macro_export]
macro_rules! task {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        println!("{} {}", "TASK:".green().bold(), format!($($arg)*));
    }};
}

/// Обычная информация без префикса
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        println!("{}", format!($($arg)*));
    }};
}

/// Заметки о том что утилита сама поменяла в настройках сборки. Префикс
/// "NOTE:" синий
#[macro_export]
macro_rules! note {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        println!("{} {}", "NOTE:".blue().bold(), format!($($arg)*));
    }};
}

/// Старт хука сборки (pre-build, post-build, генерация манифеста).
/// Префикс "HOOK:" фиолетовый
#[macro_export]
macro_rules! hook {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        println!("{} {}", "HOOK:".purple().bold(), format!($($arg)*));
    }};
}

/// Результат уже актуален и ничего не записывалось
#[macro_export]
macro_rules! cached {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        println!("{} {}", "CACHED:".green(), format!($($arg)*));
    }};
}

/// Предупреждения в stderr, "WARN:" жёлтым
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        eprintln!("{} {}", "WARN:".yellow().bold(), format!($($arg)*));
    }};
}

/// Ошибки в stderr, "ERROR:" красным. Сборка при этом должна быть прервана
/// вызывающим кодом, сам макрос процесс не завершает
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        eprintln!("{} {}", "ERROR:".red().bold(), format!($($arg)*));
    }};
}
