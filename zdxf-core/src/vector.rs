use crate::errors::VectorAssemblyError;
use crate::tag::Tag;

/// 把连续的实数分量标签合并为一个向量标签。
///
/// 分量组码遵循 x = `code`、y = `code + 10`、z = `code + 20` 的约定，必须按顺序给出。
/// 只有 x/y 时生成 `Vec2`（回写时不输出 z），三者齐全时生成 `Vec3`。
#[derive(Debug, Clone)]
pub struct VectorTagAssembler {
    code: i32,
    components: [f64; 3],
    count: usize,
}

impl VectorTagAssembler {
    pub fn new(code: i32) -> Self {
        Self {
            code,
            components: [0.0; 3],
            count: 0,
        }
    }

    #[inline]
    pub fn code(&self) -> i32 {
        self.code
    }

    /// 下一个期望的分量组码；三个分量都已收集时返回 `None`。
    pub fn expected_code(&self) -> Option<i32> {
        if self.count < 3 {
            Some(self.code + 10 * self.count as i32)
        } else {
            None
        }
    }

    #[inline]
    pub fn accepts(&self, code: i32) -> bool {
        self.expected_code() == Some(code)
    }

    pub fn push(&mut self, tag: &Tag) -> Result<(), VectorAssemblyError> {
        let expected = self
            .expected_code()
            .ok_or(VectorAssemblyError::Complete(self.code))?;
        if tag.group_code() != expected {
            return Err(VectorAssemblyError::UnexpectedComponent {
                expected,
                found: tag.group_code(),
            });
        }
        let value = tag
            .as_real()
            .map_err(|_| VectorAssemblyError::NotReal(tag.group_code()))?;
        self.push_component(value)
    }

    fn push_component(&mut self, value: f64) -> Result<(), VectorAssemblyError> {
        if self.count >= 3 {
            return Err(VectorAssemblyError::Complete(self.code));
        }
        self.components[self.count] = value;
        self.count += 1;
        Ok(())
    }

    pub fn finish(self) -> Result<Tag, VectorAssemblyError> {
        let [x, y, z] = self.components;
        match self.count {
            3 => Ok(Tag::vec3(self.code, x, y, z)),
            2 => Ok(Tag::vec2(self.code, x, y)),
            count => Err(VectorAssemblyError::MissingComponent {
                code: self.code,
                missing: self.code + 10 * count as i32,
            }),
        }
    }

    /// 一次性合并一组分量标签，第一个标签的组码决定向量组码。
    pub fn assemble(tags: &[Tag]) -> Result<Tag, VectorAssemblyError> {
        let Some(first) = tags.first() else {
            return Err(VectorAssemblyError::MissingComponent {
                code: 0,
                missing: 0,
            });
        };
        let mut assembler = Self::new(first.group_code());
        for tag in tags {
            assembler.push(tag)?;
        }
        assembler.finish()
    }
}
