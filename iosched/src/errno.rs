//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 块层使用的错误代码
//!
//! 和 include/uapi/asm-generic/errno-base.h 保持一致，只保留调度器
//! 和请求队列会返回的几个。

/// 标准错误代码
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// I/O error (EIO, 5)
    IOError = 5,

    /// Try again (EAGAIN, 11)
    TryAgain = 11,

    /// Out of memory (ENOMEM, 12)
    OutOfMemory = 12,

    /// Device or resource busy (EBUSY, 16)
    DeviceOrResourceBusy = 16,

    /// Invalid argument (EINVAL, 22)
    InvalidArgument = 22,
}

impl Errno {
    /// 获取错误代码的正数值（用于比较）
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 获取错误代码的负数值（内核风格返回值）
    #[inline]
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }

    /// 错误名称，用于日志
    pub const fn name(self) -> &'static str {
        match self {
            Errno::IOError => "EIO",
            Errno::TryAgain => "EAGAIN",
            Errno::OutOfMemory => "ENOMEM",
            Errno::DeviceOrResourceBusy => "EBUSY",
            Errno::InvalidArgument => "EINVAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_values() {
        assert_eq!(Errno::OutOfMemory.as_i32(), 12);
        assert_eq!(Errno::DeviceOrResourceBusy.as_i32(), 16);
        assert_eq!(Errno::InvalidArgument.as_i32(), 22);
    }

    #[test]
    fn test_errno_negative() {
        assert_eq!(Errno::OutOfMemory.as_neg_i32(), -12);
        assert_eq!(Errno::TryAgain.as_neg_i32(), -11);
        assert_eq!(Errno::IOError.as_neg_i32(), -5);
    }

    #[test]
    fn test_errno_name() {
        assert_eq!(Errno::DeviceOrResourceBusy.name(), "EBUSY");
        assert_eq!(Errno::InvalidArgument.name(), "EINVAL");
    }
}
