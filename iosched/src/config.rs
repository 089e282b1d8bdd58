//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器配置
//!
//! 编译期默认值由 build.rs 根据 Iosched.toml 生成，
//! 运行时可以用命令行参数覆盖（见 `cmdline`）。

use alloc::string::String;

use crate::cmdline;

include!(concat!(env!("OUT_DIR"), "/config.rs"));

/// 请求队列配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// 调度器名称
    pub elevator: String,
    /// 请求标签数
    pub nr_requests: usize,
    /// 合并后单个请求的最大扇区数
    pub max_sectors: u32,
    /// 禁用请求合并
    pub nomerges: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            elevator: String::from(DEFAULT_ELEVATOR),
            nr_requests: NR_REQUESTS,
            max_sectors: MAX_SECTORS,
            nomerges: NOMERGES,
        }
    }
}

impl QueueConfig {
    /// 从命令行参数构造配置，未给出或无法解析的字段保持默认值
    pub fn from_cmdline(cmdline: &str) -> Self {
        let mut config = Self::default();

        if let Some(name) = cmdline::get_elevator(cmdline) {
            config.elevator = String::from(name);
        }
        if let Some(n) = cmdline::get_param(cmdline, "nr_requests").and_then(|v| v.parse().ok()) {
            config.nr_requests = n;
        }
        if let Some(n) = cmdline::get_param(cmdline, "max_sectors").and_then(|v| v.parse().ok()) {
            config.max_sectors = n;
        }
        if cmdline::has_param(cmdline, "nomerges") {
            config.nomerges = true;
        }

        config
    }
}
