//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! LIFO I/O 调度器
//!
//! 基于 noop 调度器：新请求插到队列头，派发也从队列头取，
//! 所以最后进入（且仍在队列中）的请求最先下发。
//!
//! 不做公平性、截止时间或优先级处理，也不决定是否合并，
//! 只在宿主合并请求后把被吸收的请求摘掉。用作基线/诊断调度器。

use alloc::boxed::Box;

use crate::elevator::{ElevatorOps, ElevatorRegistry, ElevatorType, RequestHandle};
use crate::error::{ContractViolation, ElvError};
use crate::list::ListTable;

/// 每个设备队列的 LIFO 调度数据
///
/// 对应 `struct lifo_data`
pub struct LifoQueue {
    /// 按插入时间倒序排列的请求，表头是最新的请求
    queue: ListTable,
    /// 队列中的请求数
    nr_queued: usize,
}

impl LifoQueue {
    /// 创建空队列，`depth` 为宿主的请求标签数
    ///
    /// 链表槽位在这里一次分配，之后的操作不再分配内存。
    pub fn create(depth: usize) -> Result<Self, ElvError> {
        if depth == 0 {
            return Err(ElvError::InvalidArgument);
        }

        let queue = ListTable::try_new(depth).map_err(|e| {
            log::error!("lifo: failed to allocate queue of depth {}: {}", depth, e);
            e
        })?;

        log::debug!("lifo: queue created, depth={}", depth);
        Ok(Self {
            queue,
            nr_queued: 0,
        })
    }

    /// 标签对应的链表槽位
    #[inline]
    fn slot(&self, rq: RequestHandle) -> usize {
        let tag = rq.tag();
        bug_on!(
            tag >= self.queue.capacity(),
            "lifo: tag {} out of range (depth {})",
            tag,
            self.queue.capacity()
        );
        tag
    }

    /// 把请求放到队列头
    ///
    /// 调用者保证 `rq` 不在队列中。
    pub fn insert(&mut self, rq: RequestHandle) {
        let slot = self.slot(rq);
        debug_assert!(!self.queue.is_linked(slot), "lifo: tag {} inserted twice", slot);

        self.queue.add(slot);
        self.nr_queued += 1;

        #[cfg(feature = "debug_log")]
        log::trace!("lifo: add tag {}, queued={}", slot, self.nr_queued);
    }

    /// 取出最新的请求，队列为空时返回 `None`
    pub fn dispatch_one(&mut self) -> Option<RequestHandle> {
        let slot = self.queue.first()?;
        self.queue.del_init(slot);
        self.nr_queued -= 1;

        #[cfg(feature = "debug_log")]
        log::trace!("lifo: dispatch tag {}, queued={}", slot, self.nr_queued);

        Some(RequestHandle::from_tag(slot))
    }

    /// `absorbed` 已被宿主合并进 `survivor`
    ///
    /// 只摘除 `absorbed`，`survivor` 的位置不变。
    pub fn merge_notify(&mut self, survivor: RequestHandle, absorbed: RequestHandle) {
        let slot = self.slot(absorbed);
        debug_assert!(survivor != absorbed, "lifo: tag {} merged into itself", slot);
        debug_assert!(self.queue.is_linked(slot), "lifo: merged tag {} not queued", slot);

        self.queue.del_init(slot);
        self.nr_queued -= 1;
    }

    /// 队列中没有请求
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// 队列中的请求数
    pub fn len(&self) -> usize {
        self.nr_queued
    }

    /// 创建时给出的队列深度
    pub fn depth(&self) -> usize {
        self.queue.capacity()
    }

    /// 比 `rq` 新且相邻的请求，`rq` 在队列头时返回 `None`
    pub fn neighbor_before(&self, rq: RequestHandle) -> Option<RequestHandle> {
        let slot = self.slot(rq);
        self.queue.prev_of(slot).map(RequestHandle::from_tag)
    }

    /// 比 `rq` 旧且相邻的请求，`rq` 在队列尾时返回 `None`
    pub fn neighbor_after(&self, rq: RequestHandle) -> Option<RequestHandle> {
        let slot = self.slot(rq);
        self.queue.next_of(slot).map(RequestHandle::from_tag)
    }

    /// 按派发顺序（从新到旧）遍历队列中的请求
    pub fn iter(&self) -> impl Iterator<Item = RequestHandle> + '_ {
        self.queue.iter().map(RequestHandle::from_tag)
    }

    /// 检查链表结构和计数是否一致
    pub fn verify(&self) -> Result<(), ElvError> {
        let counted = self.queue.check()?;
        if counted != self.nr_queued {
            return Err(ContractViolation::CountMismatch {
                counted,
                recorded: self.nr_queued,
            }
            .into());
        }
        Ok(())
    }

    /// 销毁队列
    ///
    /// 队列必须为空，否则说明宿主在还有 I/O 未完成时拆除了设备队列，
    /// 返回 `ElvError::Bug`。
    pub fn destroy(self) -> Result<(), ElvError> {
        if !self.queue.is_empty() {
            log::error!(
                "lifo: exit_queue with {} request(s) still queued",
                self.nr_queued
            );
            return Err(ContractViolation::QueueNotEmpty {
                queued: self.nr_queued,
            }
            .into());
        }

        self.verify().map_err(|e| {
            log::error!("lifo: exit_queue found broken queue: {}", e);
            e
        })?;

        log::debug!("lifo: queue destroyed");
        Ok(())
    }
}

impl ElevatorOps for LifoQueue {
    fn merged_requests(&mut self, rq: RequestHandle, next: RequestHandle) {
        self.merge_notify(rq, next);
    }

    fn dispatch(&mut self) -> Option<RequestHandle> {
        self.dispatch_one()
    }

    fn add_request(&mut self, rq: RequestHandle) {
        self.insert(rq);
    }

    fn queue_empty(&self) -> bool {
        self.is_empty()
    }

    fn former_request(&self, rq: RequestHandle) -> Option<RequestHandle> {
        self.neighbor_before(rq)
    }

    fn latter_request(&self, rq: RequestHandle) -> Option<RequestHandle> {
        self.neighbor_after(rq)
    }

    fn exit_queue(self: Box<Self>) -> Result<(), ElvError> {
        (*self).destroy()
    }
}

fn lifo_init_queue(depth: usize) -> Result<Box<dyn ElevatorOps>, ElvError> {
    Ok(Box::new(LifoQueue::create(depth)?))
}

/// LIFO 调度器
pub static ELEVATOR_LIFO: ElevatorType = ElevatorType {
    name: "lifo",
    init_queue: lifo_init_queue,
};

/// 注册 LIFO 调度器
pub fn init(registry: &mut ElevatorRegistry) -> Result<(), ElvError> {
    registry.register(&ELEVATOR_LIFO)
}

/// 注销 LIFO 调度器
pub fn exit(registry: &mut ElevatorRegistry) {
    registry.unregister(ELEVATOR_LIFO.name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn rq(tag: usize) -> RequestHandle {
        RequestHandle::from_tag(tag)
    }

    #[test]
    fn test_lifo_order() {
        let mut q = LifoQueue::create(8).unwrap();
        for tag in [3, 0, 5, 1] {
            q.insert(rq(tag));
        }

        let order: Vec<_> = core::iter::from_fn(|| q.dispatch_one()).collect();
        assert_eq!(order, [rq(1), rq(5), rq(0), rq(3)]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_lifo_interleaved() {
        let mut q = LifoQueue::create(8).unwrap();
        q.insert(rq(0));
        q.insert(rq(1));
        assert_eq!(q.dispatch_one(), Some(rq(1)));

        // 0 在队列中时间更长，但 2 是最新插入的
        q.insert(rq(2));
        assert_eq!(q.dispatch_one(), Some(rq(2)));
        assert_eq!(q.dispatch_one(), Some(rq(0)));
        assert_eq!(q.dispatch_one(), None);
    }

    #[test]
    fn test_merge_removes_absorbed() {
        let mut q = LifoQueue::create(4).unwrap();
        let (a, b) = (rq(0), rq(1));
        q.insert(a);
        q.insert(b);

        q.merge_notify(a, b);
        assert_eq!(q.len(), 1);
        assert_eq!(q.iter().collect::<Vec<_>>(), [a]);
        assert_eq!(q.dispatch_one(), Some(a));
        assert!(q.is_empty());
    }

    #[test]
    fn test_merge_keeps_survivor_position() {
        let mut q = LifoQueue::create(4).unwrap();
        let (a, b, c) = (rq(0), rq(1), rq(2));
        q.insert(a);
        q.insert(b);
        q.insert(c);

        // c 吸收 b 后，c 仍在队头，a 成为 c 的后继
        q.merge_notify(c, b);
        assert_eq!(q.neighbor_after(c), Some(a));
        assert_eq!(q.neighbor_before(a), Some(c));
        assert_eq!(q.verify(), Ok(()));
    }

    #[test]
    fn test_empty_round_trip() {
        let mut q = LifoQueue::create(2).unwrap();
        assert!(q.is_empty());
        q.insert(rq(1));
        assert!(!q.is_empty());
        assert_eq!(q.dispatch_one(), Some(rq(1)));
        assert!(q.is_empty());
    }

    #[test]
    fn test_neighbors() {
        let mut q = LifoQueue::create(4).unwrap();
        let (a, b, c) = (rq(0), rq(1), rq(2));
        q.insert(a);
        q.insert(b);
        q.insert(c);

        assert_eq!(q.neighbor_before(b), Some(c));
        assert_eq!(q.neighbor_after(b), Some(a));
        assert_eq!(q.neighbor_before(c), None);
        assert_eq!(q.neighbor_after(a), None);
    }

    #[test]
    fn test_dispatch_exhausted() {
        let mut q = LifoQueue::create(1).unwrap();
        assert_eq!(q.dispatch_one(), None);
        assert_eq!(q.dispatch_one(), None);
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn test_tag_reuse_after_dispatch() {
        let mut q = LifoQueue::create(2).unwrap();
        q.insert(rq(0));
        q.insert(rq(1));
        assert_eq!(q.dispatch_one(), Some(rq(1)));

        // 宿主回收标签 1 后作为新请求再次插入
        q.insert(rq(1));
        assert_eq!(q.iter().collect::<Vec<_>>(), [rq(1), rq(0)]);
        assert_eq!(q.verify(), Ok(()));
    }

    #[test]
    fn test_destroy_empty() {
        let mut q = LifoQueue::create(4).unwrap();
        q.insert(rq(2));
        q.dispatch_one();
        assert_eq!(q.destroy(), Ok(()));
    }

    #[test]
    fn test_destroy_non_empty() {
        let mut q = LifoQueue::create(4).unwrap();
        q.insert(rq(0));
        q.insert(rq(1));

        let err = q.destroy().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err, ElvError::Bug(ContractViolation::QueueNotEmpty { queued: 2 }));
    }

    #[test]
    fn test_verify_count_mismatch() {
        let mut q = LifoQueue::create(4).unwrap();
        q.insert(rq(0));
        q.insert(rq(1));
        assert_eq!(q.verify(), Ok(()));

        q.nr_queued = 3;
        assert_eq!(
            q.verify(),
            Err(ElvError::Bug(ContractViolation::CountMismatch { counted: 2, recorded: 3 }))
        );
    }

    #[test]
    fn test_destroy_corrupt_list() {
        let mut q = LifoQueue::create(4).unwrap();
        q.insert(rq(1));
        q.dispatch_one();

        // 表头仍指向自己（队列为空），但后向指针被破坏
        let head = q.depth();
        q.queue.node_mut(head).prev = 1;
        assert!(q.is_empty());

        let err = q.destroy().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, ElvError::Bug(ContractViolation::CorruptList { .. })));
    }

    #[test]
    fn test_create_invalid() {
        assert!(matches!(LifoQueue::create(0), Err(ElvError::InvalidArgument)));
        assert!(matches!(LifoQueue::create(usize::MAX / 2), Err(ElvError::OutOfMemory)));
    }

    #[test]
    #[should_panic]
    fn test_tag_out_of_range() {
        let mut q = LifoQueue::create(2).unwrap();
        q.insert(rq(2));
    }

    #[test]
    fn test_elevator_ops() {
        let mut e: Box<dyn ElevatorOps> = lifo_init_queue(4).unwrap();
        e.add_request(rq(0));
        e.add_request(rq(1));
        assert_eq!(e.former_request(rq(0)), Some(rq(1)));
        assert_eq!(e.latter_request(rq(1)), Some(rq(0)));

        e.merged_requests(rq(0), rq(1));
        assert!(!e.queue_empty());
        assert_eq!(e.dispatch(), Some(rq(0)));
        assert!(e.queue_empty());
        assert_eq!(e.exit_queue(), Ok(()));
    }
}
