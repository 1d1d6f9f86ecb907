use std::io::Write;

use thiserror::Error;
use zdxf_core::errors::TagError;
use zdxf_core::tag::{Tag, TagType};
use zdxf_core::utils::hexlify;

/// 单条二进制记录最多携带的字节数（254 个十六进制字符）。
pub const BINARY_CHUNK_SIZE: usize = 127;

#[derive(Debug, Error)]
pub enum TagWriteError {
    #[error("错误标签或未定义标签无法写出（组码 {0}）")]
    Unwritable(i32),
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error("写入 DXF 记录失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 把标签重新编码为 DXF 文本记录，`Vec2` 标签不输出 z 分量。
pub struct TagWriter<W: Write> {
    out: W,
    records: usize,
}

impl<W: Write> TagWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, records: 0 }
    }

    /// 已写出的记录（组码 + 值）数量。
    #[inline]
    pub fn records_written(&self) -> usize {
        self.records
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_tags<'t>(
        &mut self,
        tags: impl IntoIterator<Item = &'t Tag>,
    ) -> Result<(), TagWriteError> {
        for tag in tags {
            self.write_tag(tag)?;
        }
        Ok(())
    }

    pub fn write_tag(&mut self, tag: &Tag) -> Result<(), TagWriteError> {
        let code = tag.group_code();
        if tag.is_error() {
            return Err(TagWriteError::Unwritable(code));
        }
        match tag.tag_type() {
            TagType::Undefined => return Err(TagWriteError::Unwritable(code)),
            TagType::String => self.record(code, tag.as_string()?)?,
            TagType::Integer => self.record(code, &tag.as_integer()?.to_string())?,
            TagType::Real => self.record(code, &format_real(tag.as_real()?))?,
            TagType::Vec3 | TagType::Vec2 => {
                let value = tag.as_vector()?;
                self.record(code, &format_real(value.x))?;
                self.record(code + 10, &format_real(value.y))?;
                if !tag.was_loaded_as_2d() {
                    self.record(code + 20, &format_real(value.z))?;
                }
            }
            TagType::BinaryData => {
                let data = tag.as_bytes()?;
                if data.is_empty() {
                    self.record(code, "")?;
                }
                for chunk in data.chunks(BINARY_CHUNK_SIZE) {
                    self.record(code, &hexlify(chunk))?;
                }
            }
        }
        Ok(())
    }

    fn record(&mut self, code: i32, value: &str) -> std::io::Result<()> {
        writeln!(self.out, "{code:>3}")?;
        writeln!(self.out, "{value}")?;
        self.records += 1;
        Ok(())
    }
}

/// 实数使用最短可回读的表示，并保证带有小数点或指数（如 `1.0`、`1e21`）。
pub fn format_real(value: f64) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(tags: &[Tag]) -> Result<String, TagWriteError> {
        let mut writer = TagWriter::new(Vec::new());
        writer.write_tags(tags)?;
        Ok(String::from_utf8(writer.into_inner()).expect("utf-8 output"))
    }

    #[test]
    fn writes_scalar_tags() {
        let out = render(&[
            Tag::string(0, "LINE"),
            Tag::integer(70, 5),
            Tag::real(40, 1.0),
        ])
        .unwrap();
        assert_eq!(out, "  0\nLINE\n 70\n5\n 40\n1.0\n");
    }

    #[test]
    fn vec2_omits_z_record() {
        let out = render(&[Tag::vec2(10, 1.5, 2.5)]).unwrap();
        assert_eq!(out, " 10\n1.5\n 20\n2.5\n");
        let out = render(&[Tag::vec3(10, 1.5, 2.5, 0.0)]).unwrap();
        assert_eq!(out, " 10\n1.5\n 20\n2.5\n 30\n0.0\n");
    }

    #[test]
    fn binary_data_is_chunked() {
        let data: Vec<u8> = (0..200).map(|n| n as u8).collect();
        let mut writer = TagWriter::new(Vec::new());
        writer.write_tag(&Tag::binary(310, data)).unwrap();
        assert_eq!(writer.records_written(), 2);
        let out = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "310");
        assert_eq!(lines[1].len(), BINARY_CHUNK_SIZE * 2);
        assert_eq!(lines[3].len(), (200 - BINARY_CHUNK_SIZE) * 2);

        let out = render(&[Tag::binary(1004, Vec::new())]).unwrap();
        assert_eq!(out, "1004\n\n");
    }

    #[test]
    fn error_tags_cannot_be_written() {
        assert!(matches!(
            render(&[Tag::error()]),
            Err(TagWriteError::Unwritable(-1))
        ));
        assert!(matches!(
            render(&[Tag::undefined(5)]),
            Err(TagWriteError::Unwritable(5))
        ));
        assert!(matches!(
            render(&[Tag::string(-1, "bad")]),
            Err(TagWriteError::Unwritable(-1))
        ));
    }
}
