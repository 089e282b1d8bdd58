//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! LIFO I/O 调度器
//!
//! 块层可插拔调度器（电梯）：决定待处理请求下发到设备的顺序。
//! 请求对象、合并时机、设备下发和完成都由宿主块层负责，
//! 调度器只维护请求的先后顺序。
//!
//! 模块：
//! - `lifo`: LIFO 调度器，最新的请求最先下发
//! - `noop`: FIFO 调度器
//! - `elevator`: 调度器回调接口和注册表
//! - `blkdev`: 宿主请求队列（标签表、合并、派发）
//! - `list`: 基于索引的侵入式双向链表

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod blkdev;
pub mod cmdline;
pub mod config;
pub mod elevator;
pub mod errno;
pub mod error;
pub mod lifo;
pub mod list;
pub mod noop;

pub use blkdev::{ReqFlags, Request, RequestQueue};
pub use config::QueueConfig;
pub use elevator::{ElevatorOps, ElevatorRegistry, ElevatorType, RequestHandle};
pub use error::{ContractViolation, ElvError};
pub use lifo::LifoQueue;
