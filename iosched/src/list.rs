//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 基于索引的双向循环链表
//!
//! 参考 Linux: include/linux/list.h
//!
//! 用途：
//! - 调度器队列: lifo_data::queue, noop_data::queue
//!
//! 设计特点：
//! - 侵入式语义：每个请求标签对应一个固定的 `ListHead` 槽位，
//!   链表只修改槽位里的前后索引，不拥有请求本身
//! - 节点表在创建时一次分配，之后的 add/del 不再分配内存
//! - 最后一个槽位是链表头（哨兵），空链表时头指向自己

use alloc::vec::Vec;

use crate::error::{ContractViolation, ElvError};

/// 链表节点：前后节点在表中的索引
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHead {
    /// 下一个节点
    pub next: usize,
    /// 前一个节点
    pub prev: usize,
}

impl ListHead {
    /// 创建一个指向自己的节点
    ///
    /// 对链表头表示空链表，对普通节点表示不在任何链表中
    pub const fn new(idx: usize) -> Self {
        Self { next: idx, prev: idx }
    }
}

/// 链表节点表
pub struct ListTable {
    nodes: Vec<ListHead>,
}

impl ListTable {
    /// 创建能容纳 `capacity` 个节点的空链表
    ///
    /// 唯一会分配内存的操作。分配失败返回 `OutOfMemory`。
    pub fn try_new(capacity: usize) -> Result<Self, ElvError> {
        let slots = capacity.checked_add(1).ok_or(ElvError::InvalidArgument)?;

        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(slots)
            .map_err(|_| ElvError::OutOfMemory)?;
        nodes.extend((0..slots).map(ListHead::new));

        Ok(Self { nodes })
    }

    /// 链表头的索引
    #[inline]
    fn head(&self) -> usize {
        self.nodes.len() - 1
    }

    /// 可容纳的节点数（不含链表头）
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.len() - 1
    }

    /// 检查链表是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        let head = self.head();
        self.nodes[head].next == head
    }

    /// 节点当前是否在链表中
    #[inline]
    pub fn is_linked(&self, idx: usize) -> bool {
        self.nodes[idx].next != idx
    }

    /// 把 `new` 插入到 `prev` 和 `next` 之间
    ///
    /// 对应 Linux 的 `__list_add`
    #[inline]
    fn insert_between(&mut self, new: usize, prev: usize, next: usize) {
        self.nodes[next].prev = new;
        self.nodes[new] = ListHead { next, prev };
        self.nodes[prev].next = new;
    }

    /// 在链表头之后插入节点（栈语义）
    pub fn add(&mut self, idx: usize) {
        let head = self.head();
        let next = self.nodes[head].next;
        self.insert_between(idx, head, next);
    }

    /// 在链表尾部添加节点（队列语义）
    pub fn add_tail(&mut self, idx: usize) {
        let head = self.head();
        let prev = self.nodes[head].prev;
        self.insert_between(idx, prev, head);
    }

    /// 摘除节点并重新初始化为指向自己
    ///
    /// 对应 Linux 的 `list_del_init`
    pub fn del_init(&mut self, idx: usize) {
        let ListHead { next, prev } = self.nodes[idx];

        self.nodes[next].prev = prev;
        self.nodes[prev].next = next;
        self.nodes[idx] = ListHead::new(idx);
    }

    /// 第一个节点
    pub fn first(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.nodes[self.head()].next)
        }
    }

    /// 最后一个节点
    pub fn last(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.nodes[self.head()].prev)
        }
    }

    /// 前一个节点，`idx` 是第一个节点时返回 `None`
    pub fn prev_of(&self, idx: usize) -> Option<usize> {
        let prev = self.nodes[idx].prev;
        (prev != self.head()).then_some(prev)
    }

    /// 后一个节点，`idx` 是最后一个节点时返回 `None`
    pub fn next_of(&self, idx: usize) -> Option<usize> {
        let next = self.nodes[idx].next;
        (next != self.head()).then_some(next)
    }

    /// 从头到尾遍历
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            table: self,
            pos: self.nodes[self.head()].next,
        }
    }

    /// 直接修改节点，用于构造损坏的链表
    #[cfg(test)]
    pub(crate) fn node_mut(&mut self, idx: usize) -> &mut ListHead {
        &mut self.nodes[idx]
    }

    /// 检查链表结构并返回节点数
    ///
    /// 每个节点的 `next.prev` 都必须指回自己，且遍历步数不能超过容量。
    pub fn check(&self) -> Result<usize, ContractViolation> {
        let head = self.head();
        let mut pos = head;
        let mut count = 0usize;

        loop {
            let next = self.nodes[pos].next;
            if next >= self.nodes.len() || self.nodes[next].prev != pos {
                return Err(ContractViolation::CorruptList { tag: pos });
            }
            if next == head {
                return Ok(count);
            }
            count += 1;
            if count > self.capacity() {
                return Err(ContractViolation::CorruptList { tag: next });
            }
            pos = next;
        }
    }
}

/// ListTable 的迭代器
pub struct Iter<'a> {
    table: &'a ListTable,
    pos: usize,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos == self.table.head() {
            return None;
        }
        let item = self.pos;
        self.pos = self.table.nodes[item].next;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_list_init() {
        let list = ListTable::try_new(4).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.capacity(), 4);
        assert_eq!(list.first(), None);
        assert_eq!(list.last(), None);
        assert!(!list.is_linked(0));
    }

    #[test]
    fn test_list_add() {
        let mut list = ListTable::try_new(4).unwrap();
        list.add(1);
        list.add(2);

        // head -> 2 -> 1 -> head
        assert!(!list.is_empty());
        assert_eq!(list.first(), Some(2));
        assert_eq!(list.last(), Some(1));
        assert_eq!(list.iter().collect::<Vec<_>>(), [2, 1]);
    }

    #[test]
    fn test_list_add_tail() {
        let mut list = ListTable::try_new(4).unwrap();
        list.add_tail(1);
        list.add_tail(2);

        // head -> 1 -> 2 -> head
        assert_eq!(list.first(), Some(1));
        assert_eq!(list.iter().collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn test_list_del() {
        let mut list = ListTable::try_new(4).unwrap();
        list.add(0);
        list.add(3);
        list.add(2);

        list.del_init(3);
        assert!(!list.is_linked(3));
        assert_eq!(list.iter().collect::<Vec<_>>(), [2, 0]);

        list.del_init(2);
        list.del_init(0);
        assert!(list.is_empty());
        assert_eq!(list.check(), Ok(0));
    }

    #[test]
    fn test_list_neighbors() {
        let mut list = ListTable::try_new(4).unwrap();
        list.add(0);
        list.add(1);
        list.add(2);

        assert_eq!(list.prev_of(1), Some(2));
        assert_eq!(list.next_of(1), Some(0));
        assert_eq!(list.prev_of(2), None);
        assert_eq!(list.next_of(0), None);
    }

    #[test]
    fn test_list_check() {
        let mut list = ListTable::try_new(8).unwrap();
        for i in 0..8 {
            list.add(i);
        }
        assert_eq!(list.check(), Ok(8));

        // 破坏后向指针
        list.nodes[5].prev = 5;
        assert!(matches!(list.check(), Err(ContractViolation::CorruptList { .. })));
    }

    #[test]
    fn test_list_capacity_overflow() {
        assert_eq!(ListTable::try_new(usize::MAX).err(), Some(ElvError::InvalidArgument));
        assert_eq!(ListTable::try_new(usize::MAX / 2).err(), Some(ElvError::OutOfMemory));
    }
}
