//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! I/O 调度器（电梯）框架
//!
//! 遵循 Linux 的单队列电梯接口设计 (block/elevator.c, include/linux/elevator.h)
//!
//! 核心概念：
//! - `RequestHandle`: 宿主请求的标签，调度器只用它串链表
//! - `ElevatorOps`: 宿主调用的回调集合（elevator_ops）
//! - `ElevatorType`: 名称 + 构造函数（elevator_type）
//! - `ElevatorRegistry`: 按名称查找调度器，由宿主持有

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::error::ElvError;

/// 宿主请求的不透明标签
///
/// 取值范围是 `0..depth`，`depth` 为创建调度器队列时给出的队列深度。
/// 调度器不读取请求内容，只在链表里记录标签的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestHandle(usize);

impl RequestHandle {
    pub const fn from_tag(tag: usize) -> Self {
        Self(tag)
    }

    pub const fn tag(self) -> usize {
        self.0
    }
}

/// 调度器回调
///
/// 宿主在持有队列锁时调用，同一时刻每个队列最多一个调用在执行。
/// 除 `ElevatorType::init_queue` 外，所有回调都不分配内存、不阻塞。
pub trait ElevatorOps: Send {
    /// `next` 已被合并进 `rq`，从调度队列中移除 `next`
    ///
    /// 对应 `elevator_merge_req_fn`
    fn merged_requests(&mut self, rq: RequestHandle, next: RequestHandle);

    /// 取出下一个要下发到设备的请求
    ///
    /// 对应 `elevator_dispatch_fn`
    fn dispatch(&mut self) -> Option<RequestHandle>;

    /// 新请求进入调度队列
    ///
    /// 对应 `elevator_add_req_fn`
    fn add_request(&mut self, rq: RequestHandle);

    /// 对应 `elevator_queue_empty_fn`
    fn queue_empty(&self) -> bool;

    /// 调度顺序中紧挨在 `rq` 前面的请求
    ///
    /// 对应 `elevator_former_req_fn`
    fn former_request(&self, rq: RequestHandle) -> Option<RequestHandle>;

    /// 调度顺序中紧挨在 `rq` 后面的请求
    ///
    /// 对应 `elevator_latter_req_fn`
    fn latter_request(&self, rq: RequestHandle) -> Option<RequestHandle>;

    /// 销毁调度器数据
    ///
    /// 对应 `elevator_exit_fn`。返回 `ElvError::Bug` 时宿主必须终止。
    fn exit_queue(self: Box<Self>) -> Result<(), ElvError>;
}

/// 调度器构造函数，参数为队列深度
pub type InitQueueFn = fn(usize) -> Result<Box<dyn ElevatorOps>, ElvError>;

/// 一种调度器
pub struct ElevatorType {
    /// 注册名，宿主按它选择调度器
    pub name: &'static str,
    /// 对应 `elevator_init_fn`
    pub init_queue: InitQueueFn,
}

impl fmt::Debug for ElevatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevatorType").field("name", &self.name).finish()
    }
}

/// 调度器注册表
///
/// 对应 Linux 的全局 `elv_list`，这里由宿主持有，不使用全局可变状态。
#[derive(Debug, Default)]
pub struct ElevatorRegistry {
    types: Vec<&'static ElevatorType>,
}

impl ElevatorRegistry {
    pub const fn new() -> Self {
        Self { types: Vec::new() }
    }

    /// 注册了所有内建调度器（noop、lifo）的注册表
    pub fn with_builtin() -> Result<Self, ElvError> {
        let mut registry = Self::new();
        crate::noop::init(&mut registry)?;
        crate::lifo::init(&mut registry)?;
        Ok(registry)
    }

    /// 注册调度器
    ///
    /// 对应 Linux 的 `elv_register`。名称已存在时返回 `Busy`。
    pub fn register(&mut self, e: &'static ElevatorType) -> Result<(), ElvError> {
        if self.find(e.name).is_some() {
            log::warn!("elevator: {} already registered", e.name);
            return Err(ElvError::Busy);
        }

        self.types.push(e);
        log::info!("elevator: io scheduler {} registered", e.name);
        Ok(())
    }

    /// 注销调度器
    ///
    /// 对应 Linux 的 `elv_unregister`
    pub fn unregister(&mut self, name: &str) -> Option<&'static ElevatorType> {
        let pos = self.types.iter().position(|e| e.name == name)?;
        let e = self.types.remove(pos);
        log::info!("elevator: io scheduler {} unregistered", e.name);
        Some(e)
    }

    /// 按名称查找调度器
    pub fn find(&self, name: &str) -> Option<&'static ElevatorType> {
        self.types.iter().copied().find(|e| e.name == name)
    }

    /// 已注册的调度器名称，按注册顺序
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.iter().map(|e| e.name)
    }

    /// 按名称创建调度器队列
    ///
    /// 名称不存在时返回 `InvalidArgument`
    pub fn init_queue(&self, name: &str, depth: usize) -> Result<Box<dyn ElevatorOps>, ElvError> {
        let e = self.find(name).ok_or(ElvError::InvalidArgument)?;
        (e.init_queue)(depth)
    }
}
