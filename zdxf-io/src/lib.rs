pub mod object;
pub mod reader;
pub mod writer;

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use zdxf_core::errors::TableError;
use zdxf_core::tag::Tag;

pub use object::{LoadedDocument, LoaderOptions, TagObject, load_objects};
pub use reader::{TagReader, read_tags};
pub use writer::{TagWriteError, TagWriter};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: TagWriteError,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
    #[error(transparent)]
    Table(#[from] TableError),
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<LoadedDocument, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, tags: &[Tag], path: &Path) -> Result<(), IoError>;
}

#[derive(Debug, Default)]
pub struct DxfFacade {
    options: LoaderOptions,
}

impl DxfFacade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoaderOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// 解码内存中的 DXF 文本并登记所有对象。
    pub fn decode(&self, source: &str) -> Result<LoadedDocument, IoError> {
        let tags = read_tags(source);
        let table = load_objects(&tags, &self.options)?;
        let error_tags = tags.iter().filter(|tag| tag.is_error()).count();
        Ok(LoadedDocument {
            tags,
            table,
            error_tags,
        })
    }
}

impl DocumentLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<LoadedDocument, IoError> {
        let bytes = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        // 旧版 DXF 常用 cp1252 等编码，非 UTF-8 字节按替换字符处理
        let text = String::from_utf8_lossy(&bytes);
        let document = self.decode(&text)?;
        info!(
            path = %path.display(),
            tags = document.tags.len(),
            objects = document.table.size(),
            error_tags = document.error_tags,
            "DXF 标签加载完成"
        );
        Ok(document)
    }
}

impl DocumentSaver for DxfFacade {
    fn save(&self, tags: &[Tag], path: &Path) -> Result<(), IoError> {
        let wrap = |source: TagWriteError| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        };
        let file = fs::File::create(path).map_err(|err| wrap(err.into()))?;
        let mut writer = TagWriter::new(BufWriter::new(file));
        writer.write_tags(tags).map_err(wrap)?;
        let records = writer.records_written();
        writer
            .into_inner()
            .flush()
            .map_err(|err| wrap(err.into()))?;
        info!(path = %path.display(), records, "DXF 标签写出完成");
        Ok(())
    }
}
