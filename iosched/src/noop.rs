//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! noop I/O 调度器
//!
//! 对应 Linux 的 block/noop-iosched.c：请求按到达顺序排队（FIFO），
//! 是 LIFO 调度器的原型，也是请求队列的默认回退调度器。

use alloc::boxed::Box;

use crate::elevator::{ElevatorOps, ElevatorRegistry, ElevatorType, RequestHandle};
use crate::error::{ContractViolation, ElvError};
use crate::list::ListTable;

/// 对应 `struct noop_data`
pub struct NoopQueue {
    queue: ListTable,
}

impl NoopQueue {
    pub fn create(depth: usize) -> Result<Self, ElvError> {
        if depth == 0 {
            return Err(ElvError::InvalidArgument);
        }
        Ok(Self {
            queue: ListTable::try_new(depth)?,
        })
    }

    /// 标签对应的链表槽位
    #[inline]
    fn slot(&self, rq: RequestHandle) -> usize {
        let tag = rq.tag();
        bug_on!(tag >= self.queue.capacity(), "noop: tag {} out of range", tag);
        tag
    }
}

impl ElevatorOps for NoopQueue {
    fn merged_requests(&mut self, _rq: RequestHandle, next: RequestHandle) {
        let slot = self.slot(next);
        self.queue.del_init(slot);
    }

    fn dispatch(&mut self) -> Option<RequestHandle> {
        let tag = self.queue.first()?;
        self.queue.del_init(tag);
        Some(RequestHandle::from_tag(tag))
    }

    fn add_request(&mut self, rq: RequestHandle) {
        let slot = self.slot(rq);
        self.queue.add_tail(slot);
    }

    fn queue_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn former_request(&self, rq: RequestHandle) -> Option<RequestHandle> {
        self.queue.prev_of(self.slot(rq)).map(RequestHandle::from_tag)
    }

    fn latter_request(&self, rq: RequestHandle) -> Option<RequestHandle> {
        self.queue.next_of(self.slot(rq)).map(RequestHandle::from_tag)
    }

    fn exit_queue(self: Box<Self>) -> Result<(), ElvError> {
        if !self.queue.is_empty() {
            let queued = self.queue.iter().count();
            log::error!("noop: exit_queue with {} request(s) still queued", queued);
            return Err(ContractViolation::QueueNotEmpty { queued }.into());
        }
        Ok(())
    }
}

fn noop_init_queue(depth: usize) -> Result<Box<dyn ElevatorOps>, ElvError> {
    Ok(Box::new(NoopQueue::create(depth)?))
}

pub static ELEVATOR_NOOP: ElevatorType = ElevatorType {
    name: "noop",
    init_queue: noop_init_queue,
};

pub fn init(registry: &mut ElevatorRegistry) -> Result<(), ElvError> {
    registry.register(&ELEVATOR_NOOP)
}

pub fn exit(registry: &mut ElevatorRegistry) {
    registry.unregister(ELEVATOR_NOOP.name);
}
