use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

pub const ERROR: i32 = -1;
pub const STRUCTURE: i32 = 0;
pub const COMMENT: i32 = 999;

/// 解码文本记录时使用的粗粒度值类别。
///
/// 与 [`crate::tag::TagType`] 不同，这里只区分四类：顶点分量、实数、整数与文本。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueCategory {
    Vertex,
    Decimal,
    Integer,
    Text,
}

/// 按组码范围计算值类别，不经过缓存。
///
/// 顶点范围必须先于实数范围判断，二者在边界处重叠。
pub const fn value_category(code: i32) -> ValueCategory {
    if (code >= 10 && code < 19)
        || (code >= 110 && code < 113)
        || (code >= 210 && code < 214)
        || (code >= 1010 && code < 1014)
    {
        return ValueCategory::Vertex;
    }
    if (code >= 19 && code < 60)
        || (code >= 113 && code < 150)
        || (code >= 214 && code < 240)
        || (code >= 460 && code < 470)
        || (code >= 1014 && code < 1060)
    {
        return ValueCategory::Decimal;
    }
    if (code >= 60 && code < 80)
        || (code >= 90 && code < 100)
        || (code >= 160 && code < 180)
        || (code >= 270 && code < 290)
        || (code >= 370 && code < 390)
        || (code >= 400 && code < 410)
        || (code >= 420 && code < 430)
        || (code >= 440 && code < 460)
        || (code >= 1060 && code < 1072)
    {
        return ValueCategory::Integer;
    }
    ValueCategory::Text
}

/// 组码 310-319 与 1004 存放十六进制编码的二进制数据。
#[inline]
pub const fn is_binary_code(code: i32) -> bool {
    (code >= 310 && code <= 319) || code == 1004
}

/// 带缓存的组码分类器。
///
/// 每条记录都会分类一次，而文档中出现的组码种类很少，因此按需写入缓存。
/// 同一组码的并发重复写入结果一致，不会造成问题。
#[derive(Debug, Default)]
pub struct GroupCodeClassifier {
    cache: RwLock<HashMap<i32, ValueCategory>>,
}

static GLOBAL_CLASSIFIER: Lazy<GroupCodeClassifier> = Lazy::new(GroupCodeClassifier::new);

impl GroupCodeClassifier {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// 进程级共享实例，首次访问时创建。
    pub fn global() -> &'static GroupCodeClassifier {
        &GLOBAL_CLASSIFIER
    }

    pub fn classify(&self, code: i32) -> ValueCategory {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(category) = cache.get(&code) {
                return *category;
            }
        }
        let category = value_category(code);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(code, category);
        category
    }

    /// 已缓存的组码数量。
    pub fn cached_codes(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// 通过全局分类器获取组码的值类别。
#[inline]
pub fn group_code_type(code: i32) -> ValueCategory {
    GroupCodeClassifier::global().classify(code)
}
