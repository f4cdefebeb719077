use std::fmt;
use std::str::FromStr;

/// 编辑操作种类。M 同时覆盖匹配与错配，与 SAM 的 M 含义一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOp {
    /// 匹配或错配，消耗 read 与参考
    Match,
    /// 插入：只消耗 read
    Insertion,
    /// 缺失：只消耗参考
    Deletion,
}

impl EditOp {
    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            EditOp::Match => 'M',
            EditOp::Insertion => 'I',
            EditOp::Deletion => 'D',
        }
    }

    #[inline]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'M' => Some(EditOp::Match),
            'I' => Some(EditOp::Insertion),
            'D' => Some(EditOp::Deletion),
            _ => None,
        }
    }

    #[inline]
    pub const fn consumes_read(self) -> bool {
        matches!(self, EditOp::Match | EditOp::Insertion)
    }

    #[inline]
    pub const fn consumes_ref(self) -> bool {
        matches!(self, EditOp::Match | EditOp::Deletion)
    }
}

/// 游程编码的编辑操作序列，相邻同类操作总是合并。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EditOps {
    runs: Vec<(EditOp, u32)>,
}

impl EditOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: EditOp, len: u32) {
        if len == 0 {
            return;
        }
        match self.runs.last_mut() {
            Some((last, n)) if *last == op => *n += len,
            _ => self.runs.push((op, len)),
        }
    }

    pub fn runs(&self) -> &[(EditOp, u32)] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn read_len(&self) -> usize {
        self.runs.iter().filter(|(op, _)| op.consumes_read()).map(|&(_, n)| n as usize).sum()
    }

    pub fn ref_len(&self) -> usize {
        self.runs.iter().filter(|(op, _)| op.consumes_ref()).map(|&(_, n)| n as usize).sum()
    }
}

impl FromIterator<EditOp> for EditOps {
    fn from_iter<I: IntoIterator<Item = EditOp>>(iter: I) -> Self {
        let mut ops = EditOps::new();
        for op in iter {
            ops.push(op, 1);
        }
        ops
    }
}

impl fmt::Display for EditOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.runs.is_empty() {
            return f.write_str("*");
        }
        for (op, n) in &self.runs {
            write!(f, "{}{}", n, op.to_char())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCigarError(pub String);

impl fmt::Display for ParseCigarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid CIGAR: {}", self.0)
    }
}

impl std::error::Error for ParseCigarError {}

impl FromStr for EditOps {
    type Err = ParseCigarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ops = EditOps::new();
        if s == "*" {
            return Ok(ops);
        }
        let mut num: Option<u32> = None;
        for ch in s.chars() {
            if let Some(d) = ch.to_digit(10) {
                let cur = num.unwrap_or(0);
                num = Some(
                    cur.checked_mul(10)
                        .and_then(|v| v.checked_add(d))
                        .ok_or_else(|| ParseCigarError(s.to_string()))?,
                );
            } else {
                let op = EditOp::from_char(ch).ok_or_else(|| ParseCigarError(s.to_string()))?;
                let n = num.take().ok_or_else(|| ParseCigarError(s.to_string()))?;
                ops.push(op, n);
            }
        }
        if num.is_some() {
            return Err(ParseCigarError(s.to_string()));
        }
        Ok(ops)
    }
}
