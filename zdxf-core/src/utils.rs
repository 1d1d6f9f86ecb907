//! 解析 DXF 标签值的辅助函数。
//!
//! 这些函数只针对 DXF 记录做了简化，并非通用的数值/十六进制解析工具。

use crate::group_code;

pub fn safe_str_to_real(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn safe_str_to_int64(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// 解析组码行，无法解析或超出合法范围时返回错误组码 -1。
pub fn safe_group_code(raw: &str) -> i32 {
    match safe_str_to_int64(raw) {
        Some(code) if is_valid_group_code(code) => code as i32,
        _ => group_code::ERROR,
    }
}

#[inline]
pub fn is_valid_group_code(code: i64) -> bool {
    (0..=1071).contains(&code)
}

/// DXF 二进制记录使用大写十六进制。
pub fn hexlify(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// 解码十六进制字符串，空字符串得到空字节序列；奇数长度或非法字符返回 `None`。
pub fn unhexlify(raw: &str) -> Option<Vec<u8>> {
    hex::decode(raw.trim()).ok()
}

pub fn concatenate_bytes(chunks: &[Vec<u8>]) -> Vec<u8> {
    chunks.concat()
}
