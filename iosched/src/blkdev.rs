//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 块设备请求队列（调度器的宿主）
//!
//! 遵循 Linux 单队列块层的设计 (block/blk-core.c, block/blk-merge.c)
//!
//! 核心概念：
//! - `struct request`: 一次 I/O 请求，由请求队列持有
//! - `struct request_queue`: 请求标签表 + 队列锁 + 调度器
//! - 合并：插入请求后，用调度器的 former/latter 查询相邻请求，
//!   扇区连续时把后者并入前者
//!
//! 调度器只看到 `RequestHandle`，请求内容始终由这里持有。

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::mem;

use bitflags::bitflags;
use spin::Mutex;

use crate::config::{QueueConfig, DEFAULT_ELEVATOR};
use crate::elevator::{ElevatorOps, ElevatorRegistry, RequestHandle};
use crate::error::ElvError;

bitflags! {
    /// 请求标志（对应 Linux 的 `REQ_*`）
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ReqFlags: u32 {
        /// 写请求，否则为读
        const WRITE = 1 << 0;
        const SYNC = 1 << 1;
        const META = 1 << 2;
        /// 刷新缓存，不参与合并
        const FLUSH = 1 << 3;
        /// 禁止合并
        const NOMERGE = 1 << 4;
    }
}

/// I/O 请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    /// 起始扇区
    pub sector: u64,
    /// 扇区数
    pub nr_sectors: u32,
    /// 请求标志
    pub flags: ReqFlags,
}

impl Request {
    pub const fn new(sector: u64, nr_sectors: u32, flags: ReqFlags) -> Self {
        Self {
            sector,
            nr_sectors,
            flags,
        }
    }

    pub const fn read(sector: u64, nr_sectors: u32) -> Self {
        Self::new(sector, nr_sectors, ReqFlags::empty())
    }

    pub const fn write(sector: u64, nr_sectors: u32) -> Self {
        Self::new(sector, nr_sectors, ReqFlags::WRITE)
    }

    /// 结束扇区（不含）
    pub fn end_sector(&self) -> u64 {
        self.sector + u64::from(self.nr_sectors)
    }

    pub fn is_write(&self) -> bool {
        self.flags.contains(ReqFlags::WRITE)
    }

    /// 对应 Linux 的 `rq_mergeable`
    pub fn mergeable(&self) -> bool {
        !self.flags.intersects(ReqFlags::FLUSH | ReqFlags::NOMERGE)
    }
}

/// 尝试把 `next` 并入 `req`
///
/// 对应 Linux 的 `attempt_merge`：两者都可合并、方向相同、扇区连续，
/// 且合并后不超过 `max_sectors`。`next` 可以接在 `req` 的前面或后面。
/// 返回合并后的请求。
fn merge_requests(req: &Request, next: &Request, max_sectors: u32) -> Option<Request> {
    if !req.mergeable() || !next.mergeable() {
        return None;
    }
    if req.is_write() != next.is_write() {
        return None;
    }

    let nr_sectors = req.nr_sectors.checked_add(next.nr_sectors)?;
    if nr_sectors > max_sectors {
        return None;
    }

    let sector = if req.end_sector() == next.sector {
        req.sector
    } else if next.end_sector() == req.sector {
        next.sector
    } else {
        return None;
    };

    Some(Request::new(sector, nr_sectors, req.flags | (next.flags & ReqFlags::SYNC)))
}

/// 请求队列内部状态，由队列锁保护
struct QueueInner {
    elevator: Box<dyn ElevatorOps>,
    elevator_name: &'static str,
    /// 按标签索引的请求表
    requests: Vec<Option<Request>>,
    /// 空闲标签栈
    free_tags: Vec<usize>,
}

impl QueueInner {
    fn get_tag(&mut self, req: Request) -> Result<RequestHandle, ElvError> {
        let tag = self.free_tags.pop().ok_or(ElvError::TryAgain)?;
        self.requests[tag] = Some(req);
        Ok(RequestHandle::from_tag(tag))
    }

    fn put_tag(&mut self, rq: RequestHandle) -> Option<Request> {
        let req = self.requests.get_mut(rq.tag())?.take()?;
        self.free_tags.push(rq.tag());
        Some(req)
    }

    fn request(&self, rq: RequestHandle) -> Option<Request> {
        self.requests.get(rq.tag()).copied().flatten()
    }

    /// `req` 吸收 `next`，成功时释放 `next` 的标签
    fn attempt_merge(&mut self, req: RequestHandle, next: RequestHandle, max_sectors: u32) -> bool {
        let (Some(a), Some(b)) = (self.request(req), self.request(next)) else {
            return false;
        };
        let Some(merged) = merge_requests(&a, &b, max_sectors) else {
            return false;
        };

        log::debug!(
            "blkdev: merge tag {} ({}+{}) into tag {} ({}+{})",
            next.tag(),
            b.sector,
            b.nr_sectors,
            req.tag(),
            a.sector,
            a.nr_sectors
        );

        self.requests[req.tag()] = Some(merged);
        self.elevator.merged_requests(req, next);
        self.put_tag(next);
        true
    }

    /// 对应 Linux 的 `attempt_back_merge`
    fn attempt_back_merge(&mut self, rq: RequestHandle, max_sectors: u32) -> RequestHandle {
        if let Some(next) = self.elevator.latter_request(rq) {
            self.attempt_merge(rq, next, max_sectors);
        }
        rq
    }

    /// 对应 Linux 的 `attempt_front_merge`
    fn attempt_front_merge(&mut self, rq: RequestHandle, max_sectors: u32) -> RequestHandle {
        if let Some(prev) = self.elevator.former_request(rq) {
            if self.attempt_merge(prev, rq, max_sectors) {
                return prev;
            }
        }
        rq
    }
}

/// 拆除调度器，契约违反时终止
fn elevator_exit(elevator: Box<dyn ElevatorOps>, name: &str) {
    if let Err(err) = elevator.exit_queue() {
        bug_on!(err.is_fatal(), "blkdev: elevator {} exit: {}", name, err);
        log::warn!("blkdev: elevator {} exit: {}", name, err);
    }
}

/// 块设备请求队列
pub struct RequestQueue {
    inner: Mutex<QueueInner>,
    nr_requests: usize,
    max_sectors: u32,
    nomerges: bool,
}

impl RequestQueue {
    /// 创建请求队列并初始化调度器
    ///
    /// 对应 Linux 的 `blk_init_queue` + `elevator_init`。
    /// 指定的调度器不存在时回退到默认调度器。
    pub fn new(registry: &ElevatorRegistry, config: &QueueConfig) -> Result<Self, ElvError> {
        let nr_requests = config.nr_requests;
        if nr_requests == 0 {
            return Err(ElvError::InvalidArgument);
        }

        let etype = match registry.find(&config.elevator) {
            Some(e) => e,
            None => {
                log::warn!(
                    "blkdev: elevator '{}' not found, using {}",
                    config.elevator,
                    DEFAULT_ELEVATOR
                );
                registry
                    .find(DEFAULT_ELEVATOR)
                    .ok_or(ElvError::InvalidArgument)?
            }
        };

        let mut requests = Vec::new();
        requests
            .try_reserve_exact(nr_requests)
            .map_err(|_| ElvError::OutOfMemory)?;
        requests.resize(nr_requests, None);

        let mut free_tags = Vec::new();
        free_tags
            .try_reserve_exact(nr_requests)
            .map_err(|_| ElvError::OutOfMemory)?;
        free_tags.extend((0..nr_requests).rev());

        let elevator = (etype.init_queue)(nr_requests)?;

        log::info!(
            "blkdev: request queue ready, elevator={} nr_requests={}",
            etype.name,
            nr_requests
        );

        Ok(Self {
            inner: Mutex::new(QueueInner {
                elevator,
                elevator_name: etype.name,
                requests,
                free_tags,
            }),
            nr_requests,
            max_sectors: config.max_sectors,
            nomerges: config.nomerges,
        })
    }

    /// 提交请求
    ///
    /// 分配标签后交给调度器，再尝试与相邻请求合并。
    /// 返回最终承载这次 I/O 的请求标签（合并时可能是已有请求）。
    /// 标签用完时返回 `TryAgain`，扇区范围为空或越过 `u64::MAX` 时返回 `InvalidArgument`。
    pub fn add_request(&self, req: Request) -> Result<RequestHandle, ElvError> {
        if req.nr_sectors == 0 || req.sector.checked_add(u64::from(req.nr_sectors)).is_none() {
            return Err(ElvError::InvalidArgument);
        }

        let mut inner = self.inner.lock();
        let rq = inner.get_tag(req)?;
        inner.elevator.add_request(rq);

        if self.nomerges {
            return Ok(rq);
        }

        let rq = inner.attempt_back_merge(rq, self.max_sectors);
        Ok(inner.attempt_front_merge(rq, self.max_sectors))
    }

    /// 取出下一个要下发到设备的请求并释放其标签
    pub fn dispatch(&self) -> Option<Request> {
        let mut inner = self.inner.lock();
        let rq = inner.elevator.dispatch()?;
        let req = inner.put_tag(rq);
        bug_on!(req.is_none(), "blkdev: elevator dispatched free tag {}", rq.tag());
        req
    }

    /// 查看标签对应的请求
    pub fn request(&self, rq: RequestHandle) -> Option<Request> {
        self.inner.lock().request(rq)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().elevator.queue_empty()
    }

    /// 调度器中的请求数
    pub fn nr_queued(&self) -> usize {
        let inner = self.inner.lock();
        self.nr_requests - inner.free_tags.len()
    }

    pub fn nr_requests(&self) -> usize {
        self.nr_requests
    }

    pub fn elevator_name(&self) -> &'static str {
        self.inner.lock().elevator_name
    }

    /// 切换调度器
    ///
    /// 对应 Linux 的 `elevator_switch`。只允许在队列为空时切换。
    pub fn switch_elevator(&self, registry: &ElevatorRegistry, name: &str) -> Result<(), ElvError> {
        let etype = registry.find(name).ok_or(ElvError::InvalidArgument)?;

        let mut inner = self.inner.lock();
        if !inner.elevator.queue_empty() {
            return Err(ElvError::Busy);
        }

        let elevator = (etype.init_queue)(self.nr_requests)?;
        let old = mem::replace(&mut inner.elevator, elevator);
        let old_name = mem::replace(&mut inner.elevator_name, etype.name);
        elevator_exit(old, old_name);

        log::info!("blkdev: switched elevator {} -> {}", old_name, etype.name);
        Ok(())
    }

    /// 拆除请求队列
    ///
    /// 调度器中还有请求时触发 `bug_on!`。
    pub fn exit(self) {
        let inner = self.inner.into_inner();
        elevator_exit(inner.elevator, inner.elevator_name);
        log::info!("blkdev: request queue released");
    }
}
