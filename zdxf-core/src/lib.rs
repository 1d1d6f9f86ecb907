pub mod group_code;
pub mod handle;
pub mod object_table;
pub mod tag;
pub mod utils;
pub mod vector;

pub mod errors {
    use thiserror::Error;

    use crate::handle::Handle;
    use crate::tag::TagType;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    pub enum TagError {
        #[error("tag value type mismatch: expected {expected:?}, found {found:?}")]
        TypeMismatch { expected: TagType, found: TagType },
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    pub enum TableError {
        #[error("object handle 0 is invalid")]
        InvalidHandle,
        #[error("object with handle {0} already exists")]
        DuplicateHandle(Handle),
        #[error("bucket bits {0} out of range (0..=24)")]
        InvalidBucketBits(u32),
        #[error("handle space exhausted: no handle above {0} is available")]
        HandleSpaceExhausted(Handle),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    pub enum VectorAssemblyError {
        #[error("unexpected vector component code {found} (expected {expected})")]
        UnexpectedComponent { expected: i32, found: i32 },
        #[error("vector component with group code {0} is not a real tag")]
        NotReal(i32),
        #[error("vector {code} is missing the component with group code {missing}")]
        MissingComponent { code: i32, missing: i32 },
        #[error("vector {0} already has all three components")]
        Complete(i32),
    }
}
