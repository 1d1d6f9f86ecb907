use std::fmt::Display;

use tracing::warn;
use zdxf_core::group_code::{self, GroupCodeClassifier, ValueCategory};
use zdxf_core::tag::Tag;
use zdxf_core::utils::{
    concatenate_bytes, safe_group_code, safe_str_to_int64, safe_str_to_real, unhexlify,
};
use zdxf_core::vector::VectorTagAssembler;

#[derive(Debug)]
enum Record {
    Pair { code: i32, value: String, line: usize },
    Invalid { line: usize, reason: &'static str },
}

/// 把 DXF 文本逐条解码为 [`Tag`]。
///
/// 无法解析的记录不会中断解码，而是产出错误标签（组码 -1），由调用方决定跳过还是中止。
/// 顶点分量会被合并为 `Vec2`/`Vec3` 标签，连续同组码的二进制记录合并为一个标签。
pub struct TagReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<Record>,
    line_number: usize,
    classifier: &'a GroupCodeClassifier,
    error_count: usize,
    exhausted: bool,
}

impl<'a> TagReader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_classifier(source, GroupCodeClassifier::global())
    }

    pub fn with_classifier(source: &'a str, classifier: &'a GroupCodeClassifier) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
            classifier,
            error_count: 0,
            exhausted: false,
        }
    }

    /// 目前为止产出的错误标签数量。
    #[inline]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    #[inline]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.next()?;
        self.line_number += 1;
        Some(line.trim_end_matches('\r'))
    }

    fn next_record(&mut self) -> Option<Record> {
        if let Some(record) = self.buffer.take() {
            return Some(record);
        }
        if self.exhausted {
            return None;
        }

        let code_line = self.next_line()?;
        let line = self.line_number;
        let Some(value_line) = self.next_line() else {
            self.exhausted = true;
            return Some(Record::Invalid {
                line,
                reason: "文件结束，缺少与组码对应的值行",
            });
        };

        let code = safe_group_code(code_line);
        if code == group_code::ERROR {
            return Some(Record::Invalid {
                line,
                reason: "组码无法解析或超出范围",
            });
        }
        Some(Record::Pair {
            code,
            value: value_line.to_string(),
            line,
        })
    }

    fn put_back(&mut self, record: Record) {
        debug_assert!(self.buffer.is_none(), "TagReader 只支持回退一条记录");
        self.buffer = Some(record);
    }

    fn error_tag(&mut self, line: usize, reason: impl Display) -> Tag {
        self.error_count += 1;
        warn!(line, reason = %reason, "无法解析的 DXF 记录，已生成错误标签");
        Tag::error()
    }

    fn decode(&mut self, code: i32, value: String, line: usize) -> Tag {
        if code == group_code::STRUCTURE {
            return Tag::string(code, value.trim());
        }
        if group_code::is_binary_code(code) {
            return self.decode_binary(code, &value, line);
        }
        match self.classifier.classify(code) {
            ValueCategory::Vertex => self.decode_vector(code, value, line),
            ValueCategory::Decimal => match safe_str_to_real(&value) {
                Some(real) => Tag::real(code, real),
                None => self.error_tag(line, format!("组码 {code} 的实数值 \"{value}\" 无法解析")),
            },
            ValueCategory::Integer => match safe_str_to_int64(&value) {
                Some(integer) => Tag::integer(code, integer),
                None => self.error_tag(line, format!("组码 {code} 的整数值 \"{value}\" 无法解析")),
            },
            ValueCategory::Text => Tag::string(code, value),
        }
    }

    fn decode_vector(&mut self, code: i32, value: String, line: usize) -> Tag {
        let mut assembler = VectorTagAssembler::new(code);
        let mut pending = Some((code, value, line));
        while let Some((component_code, value, component_line)) = pending.take() {
            let Some(component) = safe_str_to_real(&value) else {
                return self.error_tag(
                    component_line,
                    format!(
                        "顶点分量 \"{value}\" 无法解析（组码 {component_code}，向量 {}）",
                        assembler.code()
                    ),
                );
            };
            if let Err(err) = assembler.push(&Tag::real(component_code, component)) {
                return self.error_tag(component_line, err);
            }
            match self.next_record() {
                Some(Record::Pair {
                    code: next,
                    value,
                    line,
                }) if assembler.accepts(next) => pending = Some((next, value, line)),
                Some(other) => self.put_back(other),
                None => {}
            }
        }
        match assembler.finish() {
            Ok(tag) => tag,
            Err(err) => self.error_tag(line, err),
        }
    }

    fn decode_binary(&mut self, code: i32, value: &str, line: usize) -> Tag {
        let Some(first) = unhexlify(value) else {
            return self.error_tag(line, format!("组码 {code} 的二进制数据不是合法的十六进制"));
        };
        let mut chunks = vec![first];
        loop {
            match self.next_record() {
                Some(Record::Pair {
                    code: next,
                    value,
                    line,
                }) if next == code => match unhexlify(&value) {
                    Some(chunk) => chunks.push(chunk),
                    None => {
                        return self.error_tag(
                            line,
                            format!("组码 {code} 的二进制数据不是合法的十六进制"),
                        );
                    }
                },
                Some(other) => {
                    self.put_back(other);
                    break;
                }
                None => break,
            }
        }
        Tag::binary(code, concatenate_bytes(&chunks))
    }
}

impl Iterator for TagReader<'_> {
    type Item = Tag;

    fn next(&mut self) -> Option<Tag> {
        let tag = match self.next_record()? {
            Record::Pair { code, value, line } => self.decode(code, value, line),
            Record::Invalid { line, reason } => self.error_tag(line, reason),
        };
        Some(tag)
    }
}

/// 解码整段 DXF 文本。
pub fn read_tags(source: &str) -> Vec<Tag> {
    TagReader::new(source).collect()
}
