//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器错误类型
//!
//! 两类错误：
//! - 普通错误：映射到 errno，由调用者（宿主块层）处理
//! - `Bug`：契约被破坏，对应 Linux 的 `BUG_ON`，宿主必须当作不可恢复

use core::fmt;

use crate::errno::Errno;

/// 契约违反
///
/// 出现即说明宿主或调度器自身有 bug，继续运行可能导致请求被
/// 重复派发或重复释放。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolation {
    /// 销毁队列时仍有未完成的请求
    QueueNotEmpty { queued: usize },
    /// 链表前后指针不一致
    CorruptList { tag: usize },
    /// 链表中的节点数和记录的数量不一致
    CountMismatch { counted: usize, recorded: usize },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ContractViolation::QueueNotEmpty { queued } => {
                write!(f, "queue destroyed with {} request(s) outstanding", queued)
            }
            ContractViolation::CorruptList { tag } => {
                write!(f, "list corruption at tag {}", tag)
            }
            ContractViolation::CountMismatch { counted, recorded } => {
                write!(f, "list holds {} request(s) but {} recorded", counted, recorded)
            }
        }
    }
}

/// 调度器和请求队列的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElvError {
    /// 分配调度器数据失败
    OutOfMemory,
    /// 参数非法（队列深度为 0、调度器名不存在等）
    InvalidArgument,
    /// 名称已注册，或队列非空时切换调度器
    Busy,
    /// 请求标签用完
    TryAgain,
    /// 致命错误
    Bug(ContractViolation),
}

impl ElvError {
    /// 对应的 errno
    pub const fn errno(&self) -> Errno {
        match self {
            ElvError::OutOfMemory => Errno::OutOfMemory,
            ElvError::InvalidArgument => Errno::InvalidArgument,
            ElvError::Busy => Errno::DeviceOrResourceBusy,
            ElvError::TryAgain => Errno::TryAgain,
            ElvError::Bug(_) => Errno::IOError,
        }
    }

    /// 是否为不可恢复的错误
    pub const fn is_fatal(&self) -> bool {
        matches!(self, ElvError::Bug(_))
    }
}

impl From<ContractViolation> for ElvError {
    fn from(v: ContractViolation) -> Self {
        ElvError::Bug(v)
    }
}

impl fmt::Display for ElvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElvError::Bug(v) => write!(f, "BUG: {}", v),
            other => {
                let errno = other.errno();
                write!(f, "{} ({})", errno.name(), errno.as_neg_i32())
            }
        }
    }
}
