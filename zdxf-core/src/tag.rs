use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::errors::TagError;
use crate::group_code;

/// 构造完成的标签所携带的值类型。
///
/// `Vec2` 表示加载时没有 z 分量的二维点。数值仍按 `DVec3` 存储（z = 0），
/// 该类型只用于在回写时保持原始格式；除 `tag_type()` 与 `was_loaded_as_2d()` 外，
/// `Vec2` 与 `Vec3` 的行为完全一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagType {
    Undefined,
    String,
    Integer,
    Real,
    Vec3,
    Vec2,
    BinaryData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TagValue {
    Undefined,
    String(String),
    Binary(Vec<u8>),
    Integer(i64),
    Real(f64),
    Vector { value: DVec3, loaded_as_2d: bool },
}

/// 一条已解码的 DXF 标签：组码加一个类型确定的值。
///
/// 文本按原样存储（不做编码转换，也不去除首尾空白，部分实体依赖这些空白）；
/// 仅组码 0 的结构标签由解码器负责修剪。二进制标签可以包含多个连续同组码
/// 记录拼接后的数据，长度可能为 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    code: i32,
    value: TagValue,
}

impl Tag {
    pub fn string(code: i32, value: impl Into<String>) -> Self {
        Self {
            code,
            value: TagValue::String(value.into()),
        }
    }

    pub fn binary(code: i32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            code,
            value: TagValue::Binary(data.into()),
        }
    }

    pub fn integer(code: i32, value: i64) -> Self {
        Self {
            code,
            value: TagValue::Integer(value),
        }
    }

    pub fn real(code: i32, value: f64) -> Self {
        Self {
            code,
            value: TagValue::Real(value),
        }
    }

    pub fn vec3(code: i32, x: f64, y: f64, z: f64) -> Self {
        Self {
            code,
            value: TagValue::Vector {
                value: DVec3::new(x, y, z),
                loaded_as_2d: false,
            },
        }
    }

    pub fn vec2(code: i32, x: f64, y: f64) -> Self {
        let mut tag = Self::vec3(code, x, y, 0.0);
        if let TagValue::Vector { loaded_as_2d, .. } = &mut tag.value {
            *loaded_as_2d = true;
        }
        tag
    }

    pub fn undefined(code: i32) -> Self {
        Self {
            code,
            value: TagValue::Undefined,
        }
    }

    /// 表示无法解析的输入记录：组码 -1，类型 `Undefined`。
    pub fn error() -> Self {
        Self::undefined(group_code::ERROR)
    }

    #[inline]
    pub fn group_code(&self) -> i32 {
        self.code
    }

    pub fn tag_type(&self) -> TagType {
        match &self.value {
            TagValue::Undefined => TagType::Undefined,
            TagValue::String(_) => TagType::String,
            TagValue::Binary(_) => TagType::BinaryData,
            TagValue::Integer(_) => TagType::Integer,
            TagValue::Real(_) => TagType::Real,
            TagValue::Vector {
                loaded_as_2d: true, ..
            } => TagType::Vec2,
            TagValue::Vector { .. } => TagType::Vec3,
        }
    }

    /// 任何类型的标签都可以是错误标签，判定只看组码。
    #[inline]
    pub fn is_error(&self) -> bool {
        self.code == group_code::ERROR
    }

    #[inline]
    pub fn is_undefined(&self) -> bool {
        self.tag_type() == TagType::Undefined
    }

    #[inline]
    pub fn has_string_value(&self) -> bool {
        self.tag_type() == TagType::String
    }

    #[inline]
    pub fn has_binary_data(&self) -> bool {
        self.tag_type() == TagType::BinaryData
    }

    #[inline]
    pub fn has_real_value(&self) -> bool {
        self.tag_type() == TagType::Real
    }

    #[inline]
    pub fn has_integer_value(&self) -> bool {
        self.tag_type() == TagType::Integer
    }

    /// `Vec2` 同样返回 true。
    #[inline]
    pub fn has_vec3_value(&self) -> bool {
        matches!(self.tag_type(), TagType::Vec3 | TagType::Vec2)
    }

    #[inline]
    pub fn was_loaded_as_2d(&self) -> bool {
        self.tag_type() == TagType::Vec2
    }

    pub fn as_string(&self) -> Result<&str, TagError> {
        match &self.value {
            TagValue::String(value) => Ok(value.as_str()),
            _ => Err(self.mismatch(TagType::String)),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], TagError> {
        match &self.value {
            TagValue::Binary(data) => Ok(data.as_slice()),
            _ => Err(self.mismatch(TagType::BinaryData)),
        }
    }

    pub fn as_integer(&self) -> Result<i64, TagError> {
        match self.value {
            TagValue::Integer(value) => Ok(value),
            _ => Err(self.mismatch(TagType::Integer)),
        }
    }

    pub fn as_real(&self) -> Result<f64, TagError> {
        match self.value {
            TagValue::Real(value) => Ok(value),
            _ => Err(self.mismatch(TagType::Real)),
        }
    }

    pub fn as_vector(&self) -> Result<DVec3, TagError> {
        match self.value {
            TagValue::Vector { value, .. } => Ok(value),
            _ => Err(self.mismatch(TagType::Vec3)),
        }
    }

    /// 判断是否为指定组码且值为给定字符串的文本标签。
    ///
    /// 用于识别 SECTION/ENDSEC 等结构标签，无需先检查标签类型。
    pub fn equals(&self, code: i32, text: &str) -> bool {
        self.code == code && matches!(&self.value, TagValue::String(value) if value == text)
    }

    fn mismatch(&self, expected: TagType) -> TagError {
        TagError::TypeMismatch {
            expected,
            found: self.tag_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_tag_accessors() {
        let tag = Tag::string(1, "  padded ");
        assert_eq!(tag.group_code(), 1);
        assert_eq!(tag.tag_type(), TagType::String);
        assert!(tag.has_string_value());
        assert!(!tag.is_error());
        assert_eq!(tag.as_string().unwrap(), "  padded ");
        assert_eq!(
            tag.as_real(),
            Err(TagError::TypeMismatch {
                expected: TagType::Real,
                found: TagType::String,
            })
        );
    }

    #[test]
    fn numeric_tags_reject_other_accessors() {
        let int = Tag::integer(70, -3);
        assert!(int.has_integer_value());
        assert_eq!(int.as_integer().unwrap(), -3);
        assert!(int.as_string().is_err());
        assert!(int.as_real().is_err());

        let real = Tag::real(40, 2.5);
        assert!(real.has_real_value());
        assert_eq!(real.as_real().unwrap(), 2.5);
        assert!(real.as_integer().is_err());
        assert!(real.as_vector().is_err());
    }

    #[test]
    fn binary_tag_may_be_empty() {
        let tag = Tag::binary(310, Vec::new());
        assert!(tag.has_binary_data());
        assert!(tag.as_bytes().unwrap().is_empty());
        assert_eq!(Tag::binary(310, vec![0u8, 1]).as_bytes().unwrap(), &[0u8, 1][..]);
    }

    #[test]
    fn vec2_and_vec3_share_value() {
        let v2 = Tag::vec2(10, 1.5, 2.5);
        let v3 = Tag::vec3(10, 1.5, 2.5, 0.0);

        assert_eq!(v2.as_vector().unwrap(), v3.as_vector().unwrap());
        assert!(v2.has_vec3_value());
        assert!(v3.has_vec3_value());
        assert_eq!(v2.tag_type(), TagType::Vec2);
        assert_eq!(v3.tag_type(), TagType::Vec3);
        assert!(v2.was_loaded_as_2d());
        assert!(!v3.was_loaded_as_2d());
        assert_ne!(v2, v3);
    }

    #[test]
    fn error_tag_is_undefined() {
        let tag = Tag::error();
        assert!(tag.is_error());
        assert!(tag.is_undefined());
        assert_eq!(tag.group_code(), -1);
        assert!(tag.as_string().is_err());
        assert!(tag.as_bytes().is_err());

        // 错误判定与类型无关
        assert!(Tag::string(-1, "x").is_error());
        assert!(!Tag::undefined(5).is_error());
    }

    #[test]
    fn equals_checks_code_type_and_text() {
        assert!(Tag::string(0, "LINE").equals(0, "LINE"));
        assert!(!Tag::string(0, "LINE ").equals(0, "LINE"));
        assert!(!Tag::string(8, "LINE").equals(0, "LINE"));
        assert!(!Tag::integer(0, 0).equals(0, "LINE"));
        assert!(!Tag::error().equals(-1, ""));
    }

    #[test]
    fn serializes_with_serde() {
        let tag = Tag::vec2(10, 1.0, 2.0);
        let json = serde_json::to_string(&tag).expect("serialize tag");
        let back: Tag = serde_json::from_str(&json).expect("deserialize tag");
        assert_eq!(back, tag);
        assert!(back.was_loaded_as_2d());
    }
}
