use serde::Serialize;
use tracing::debug;
use zdxf_core::errors::TableError;
use zdxf_core::group_code;
use zdxf_core::handle::Handle;
use zdxf_core::object_table::{DEFAULT_BUCKET_BITS, DxfObject, ObjectTable};
use zdxf_core::tag::Tag;

use crate::IoError;

/// 以结构标签（组码 0）开头的一组标签，作为通用的文档对象登记到对象表中。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagObject {
    kind: String,
    handle: Handle,
    tags: Vec<Tag>,
}

impl TagObject {
    pub fn new(kind: impl Into<String>, handle: Handle, tags: Vec<Tag>) -> Self {
        Self {
            kind: kind.into(),
            handle,
            tags,
        }
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// 结构标签之后的全部标签。
    #[inline]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn error_tags(&self) -> usize {
        self.tags.iter().filter(|tag| tag.is_error()).count()
    }

    /// 对象自带的句柄：DIMSTYLE 使用组码 105，其余对象使用组码 5。
    pub fn explicit_handle(kind: &str, tags: &[Tag]) -> Option<Handle> {
        let code = if kind == "DIMSTYLE" { 105 } else { 5 };
        tags.iter()
            .find(|tag| tag.group_code() == code)
            .and_then(|tag| tag.as_string().ok())
            .and_then(Handle::from_hex)
            .filter(|handle| handle.is_valid())
    }
}

impl DxfObject for TagObject {
    fn handle(&self) -> Handle {
        self.handle
    }
}

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// 遇到第一个错误标签即中止加载。
    pub strict: bool,
    pub bucket_bits: u32,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            strict: false,
            bucket_bits: DEFAULT_BUCKET_BITS,
        }
    }
}

/// 加载结果：原始标签序列与按句柄索引的对象表。
#[derive(Debug)]
pub struct LoadedDocument {
    pub tags: Vec<Tag>,
    pub table: ObjectTable<TagObject>,
    pub error_tags: usize,
}

/// 按结构标签切分对象，SECTION/ENDSEC/EOF 及段名不构成对象。
fn split_objects(tags: &[Tag]) -> Vec<(String, Vec<Tag>)> {
    let mut objects: Vec<(String, Vec<Tag>)> = Vec::new();
    let mut current: Option<(String, Vec<Tag>)> = None;
    let mut skip_section_name = false;

    for tag in tags {
        if tag.group_code() == group_code::STRUCTURE {
            if let Some(object) = current.take() {
                objects.push(object);
            }
            let Ok(kind) = tag.as_string() else {
                continue;
            };
            match kind {
                "SECTION" => skip_section_name = true,
                "ENDSEC" | "EOF" => {}
                kind => current = Some((kind.to_string(), Vec::new())),
            }
            continue;
        }
        if skip_section_name {
            skip_section_name = false;
            if tag.group_code() == 2 {
                continue;
            }
        }
        if let Some((_, body)) = current.as_mut() {
            body.push(tag.clone());
        }
    }
    if let Some(object) = current.take() {
        objects.push(object);
    }
    objects
}

/// 把标签序列切分为对象并登记到新的对象表。
///
/// 先登记自带句柄的对象，再为没有句柄的对象分配新句柄，
/// 这样分配出的句柄不会与文件中的句柄冲突。
pub fn load_objects(
    tags: &[Tag],
    options: &LoaderOptions,
) -> Result<ObjectTable<TagObject>, IoError> {
    if options.strict {
        if let Some(index) = tags.iter().position(Tag::is_error) {
            return Err(IoError::InvalidDocument(format!(
                "第 {} 个标签无法解析（严格模式）",
                index + 1
            )));
        }
    }

    let mut table = ObjectTable::with_bucket_bits(options.bucket_bits)?;
    let mut anonymous: Vec<(String, Vec<Tag>)> = Vec::new();

    for (kind, body) in split_objects(tags) {
        match TagObject::explicit_handle(&kind, &body) {
            Some(handle) => table
                .store(TagObject::new(kind, handle, body))
                .map_err(TableError::from)?,
            None => anonymous.push((kind, body)),
        }
    }

    let anonymous_count = anonymous.len();
    for (kind, body) in anonymous {
        let handle = table.acquire_free_handle()?;
        table
            .store(TagObject::new(kind, handle, body))
            .map_err(TableError::from)?;
    }

    debug!(
        objects = table.size(),
        anonymous = anonymous_count,
        max_handle = %table.max_handle(),
        "对象表构建完成"
    );
    Ok(table)
}
