//! LIFO I/O 调度器构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析工作区根目录的 Iosched.toml
//! 2. 生成 config.rs 常量到 OUT_DIR

use std::env;
use std::fs;
use std::path::PathBuf;

/// 配置文件缺失或字段缺失时使用的默认值
const DEFAULT_ELEVATOR: &str = "lifo";
const DEFAULT_NR_REQUESTS: i64 = 128;
const DEFAULT_MAX_SECTORS: i64 = 1024;

fn main() {
    println!("cargo:rerun-if-changed=../Iosched.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let config = match fs::read_to_string("../Iosched.toml") {
        Ok(content) => match toml::from_str::<toml::Table>(&content) {
            Ok(table) => table,
            Err(e) => {
                println!("cargo:warning=Iosched.toml parse failed ({}), using defaults", e);
                toml::Table::new()
            }
        },
        Err(_) => {
            println!("cargo:warning=Iosched.toml not found, using defaults");
            toml::Table::new()
        }
    };

    generate_config_code(&config);
}

fn get<'a>(config: &'a toml::Table, section: &str, key: &str) -> Option<&'a toml::Value> {
    config.get(section).and_then(|s| s.get(key))
}

fn generate_config_code(config: &toml::Table) {
    let elevator = get(config, "elevator", "default")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_ELEVATOR);

    // 标签数至少为 1，否则队列无法接受任何请求
    let nr_requests = get(config, "queue", "nr_requests")
        .and_then(|v| v.as_integer())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_NR_REQUESTS);

    let max_sectors = get(config, "queue", "max_sectors")
        .and_then(|v| v.as_integer())
        .filter(|n| *n > 0 && *n <= i64::from(u32::MAX))
        .unwrap_or(DEFAULT_MAX_SECTORS);

    let nomerges = get(config, "queue", "nomerges")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let config_code = format!(
        r#"// 此文件由 build.rs 根据 Iosched.toml 自动生成，请勿手动修改

/// 默认调度器名称
pub const DEFAULT_ELEVATOR: &str = {:?};

/// 每个请求队列的标签数
pub const NR_REQUESTS: usize = {};

/// 单个请求最大扇区数
pub const MAX_SECTORS: u32 = {};

/// 是否禁用请求合并
pub const NOMERGES: bool = {};
"#,
        elevator, nr_requests, max_sectors, nomerges,
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    let config_file = out_dir.join("config.rs");

    // 只有内容变化时才写入，避免每次编译都更新文件时间戳
    let existing_content = fs::read_to_string(&config_file).unwrap_or_default();
    if existing_content != config_code {
        fs::write(&config_file, &config_code).expect("写入配置文件失败");
    }
}
