use std::fmt;

use serde::{Deserialize, Serialize};

/// DXF 对象句柄。`0` 按定义永远无效，句柄一经分配便不会变更或复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Handle(u64);

impl Handle {
    pub const NULL: Handle = Handle(0);

    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// 提供原始数值，便于计算桶索引或日志输出。
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// 解析 DXF 文本中的十六进制句柄（组码 5、105、330 等）。
    pub fn from_hex(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        u64::from_str_radix(trimmed, 16).ok().map(Self)
    }
}

impl From<u64> for Handle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}
