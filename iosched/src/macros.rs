//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

/// 条件成立时报告内核 bug 并终止
///
/// 对应 Linux 的 `BUG_ON()` (include/asm-generic/bug.h)。
/// 先通过 `log` 输出错误，再 panic；工作区以 `panic = "abort"` 构建。
#[macro_export]
macro_rules! bug_on {
    ($cond:expr) => {
        if $cond {
            ::log::error!("BUG: failure at {}:{}: {}", file!(), line!(), stringify!($cond));
            panic!("BUG: {}", stringify!($cond));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if $cond {
            ::log::error!("BUG: failure at {}:{}: {}", file!(), line!(), format_args!($($arg)+));
            panic!("BUG: {}", format_args!($($arg)+));
        }
    };
}
