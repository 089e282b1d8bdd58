//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 命令行参数解析
//!
//! 对应 Linux 的 cmdline parsing (kernel/params.c)
//!
//! 支持的参数：
//! - `elevator=<name>`: 选择调度器
//! - `nr_requests=<n>`: 请求队列深度
//! - `max_sectors=<n>`: 合并后单个请求的最大扇区数
//! - `nomerges`: 禁用请求合并

use alloc::vec::Vec;

/// 解析命令行参数，获取指定键的值
///
/// # 示例
/// ```
/// use lifo_iosched::cmdline;
///
/// let cmdline = "root=/dev/vda elevator=lifo";
/// assert_eq!(cmdline::get_param(cmdline, "elevator"), Some("lifo"));
/// assert_eq!(cmdline::get_param(cmdline, "init"), None);
/// ```
pub fn get_param<'a>(cmdline: &'a str, key: &str) -> Option<&'a str> {
    cmdline
        .split_whitespace()
        .filter_map(|token| token.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// 检查参数是否存在（布尔标志）
pub fn has_param(cmdline: &str, key: &str) -> bool {
    cmdline.split_whitespace().any(|token| token == key)
}

/// 获取所有 key=value 参数
pub fn get_all_params(cmdline: &str) -> Vec<(&str, &str)> {
    cmdline
        .split_whitespace()
        .filter_map(|token| token.split_once('='))
        .collect()
}

/// 获取 `elevator=` 指定的调度器
pub fn get_elevator(cmdline: &str) -> Option<&str> {
    get_param(cmdline, "elevator").filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_elevator() {
        assert_eq!(get_elevator("root=/dev/vda elevator=noop rw"), Some("noop"));
        assert_eq!(get_elevator("root=/dev/vda elevator="), None);
        assert_eq!(get_elevator("root=/dev/vda"), None);
    }

    #[test]
    fn test_has_param() {
        let cmdline = "debug nomerges elevator=lifo";
        assert!(has_param(cmdline, "nomerges"));
        assert!(has_param(cmdline, "debug"));
        assert!(!has_param(cmdline, "elevator"));
    }

    #[test]
    fn test_get_all_params() {
        let params = get_all_params("elevator=lifo nr_requests=64 quiet");
        assert_eq!(params, [("elevator", "lifo"), ("nr_requests", "64")]);
    }

    #[test]
    fn test_first_value_wins() {
        assert_eq!(get_param("elevator=lifo elevator=noop", "elevator"), Some("lifo"));
    }
}
