use std::fmt;

use crate::errors::TableError;
use crate::handle::Handle;

pub const DEFAULT_BUCKET_BITS: u32 = 12;
pub const MAX_BUCKET_BITS: u32 = 24;

/// 可以登记到 [`ObjectTable`] 的文档对象，只需暴露自身句柄。
pub trait DxfObject {
    fn handle(&self) -> Handle;
}

/// `store` 失败时把对象原样交还调用方。
pub struct StoreError<O> {
    reason: TableError,
    object: O,
}

impl<O> StoreError<O> {
    #[inline]
    pub fn reason(&self) -> TableError {
        self.reason
    }

    pub fn into_inner(self) -> O {
        self.object
    }
}

impl<O> fmt::Debug for StoreError<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreError")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

impl<O> fmt::Display for StoreError<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.reason, f)
    }
}

impl<O> std::error::Error for StoreError<O> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

impl<O> From<StoreError<O>> for TableError {
    fn from(value: StoreError<O>) -> Self {
        value.reason
    }
}

type Bucket<O> = Vec<(Handle, O)>;

/// 所有带句柄 DXF 对象的中心存储，表拥有对象并在自身销毁时一并释放。
///
/// 句柄与对象的关系在文档生命周期内固定，对象也不会被删除，因此不提供删除操作。
/// 桶数量在构造时确定（2 的幂），之后不再扩容；对象所在桶为 `handle & (桶数 - 1)`，
/// 桶内线性查找。
pub struct ObjectTable<O> {
    buckets: Vec<Bucket<O>>,
    mask: u64,
    max_handle: Handle,
    size: usize,
}

impl<O: DxfObject> ObjectTable<O> {
    /// 使用默认的 2^12 = 4096 个桶。
    pub fn new() -> Self {
        Self::build(DEFAULT_BUCKET_BITS)
    }

    pub fn with_bucket_bits(bits: u32) -> Result<Self, TableError> {
        if bits > MAX_BUCKET_BITS {
            return Err(TableError::InvalidBucketBits(bits));
        }
        Ok(Self::build(bits))
    }

    fn build(bits: u32) -> Self {
        let count = 1usize << bits;
        let mut buckets = Vec::with_capacity(count);
        buckets.resize_with(count, Vec::new);
        Self {
            buckets,
            mask: (count - 1) as u64,
            max_handle: Handle::NULL,
            size: 0,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn bucket_index(&self, handle: Handle) -> usize {
        (handle.get() & self.mask) as usize
    }

    /// 指定桶内保存的句柄，越界时为空。
    pub fn bucket_handles(&self, index: usize) -> impl Iterator<Item = Handle> + '_ {
        self.buckets
            .get(index)
            .into_iter()
            .flat_map(|bucket| bucket.iter().map(|(handle, _)| *handle))
    }

    /// 已存储或已分配的最大句柄。
    #[inline]
    pub fn max_handle(&self) -> Handle {
        self.max_handle
    }

    /// 返回对象引用，不转移所有权。
    pub fn get(&self, handle: Handle) -> Option<&O> {
        self.buckets[self.bucket_index(handle)]
            .iter()
            .find(|(stored, _)| *stored == handle)
            .map(|(_, object)| object)
    }

    pub fn get_or<'a>(&'a self, handle: Handle, default: &'a O) -> &'a O {
        self.get(handle).unwrap_or(default)
    }

    /// 句柄 0 按定义无效，始终返回 false。
    #[inline]
    pub fn has(&self, handle: Handle) -> bool {
        handle.is_valid() && self.get(handle).is_some()
    }

    #[inline]
    pub fn contains(&self, object: &O) -> bool {
        self.has(object.handle())
    }

    /// 返回下一个未分配过的句柄。
    ///
    /// 同一个句柄不会被返回两次，但表不会阻止调用方用手动指定的句柄占用它；
    /// 获取与存储是两个独立步骤。最大句柄已是 `u64::MAX` 时返回错误，状态不变。
    pub fn acquire_free_handle(&mut self) -> Result<Handle, TableError> {
        let next = self
            .max_handle
            .get()
            .checked_add(1)
            .ok_or(TableError::HandleSpaceExhausted(self.max_handle))?;
        self.max_handle = Handle::new(next);
        Ok(self.max_handle)
    }

    /// 把对象的所有权转移给表。
    ///
    /// 句柄为 0 或已存在时失败，对象随错误一起交还，表状态保持不变。
    pub fn store(&mut self, object: O) -> Result<(), StoreError<O>> {
        let handle = object.handle();
        if !handle.is_valid() {
            return Err(StoreError {
                reason: TableError::InvalidHandle,
                object,
            });
        }
        if self.has(handle) {
            return Err(StoreError {
                reason: TableError::DuplicateHandle(handle),
                object,
            });
        }
        let index = self.bucket_index(handle);
        self.buckets[index].push((handle, object));
        self.size += 1;
        if handle > self.max_handle {
            self.max_handle = handle;
        }
        Ok(())
    }

    /// 遍历全部对象，顺序由实现决定。
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &O)> + '_ {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|(handle, object)| (*handle, object)))
    }
}

impl<O: DxfObject> Default for ObjectTable<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> fmt::Debug for ObjectTable<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectTable")
            .field("buckets", &self.buckets.len())
            .field("size", &self.size)
            .field("max_handle", &self.max_handle)
            .finish()
    }
}
