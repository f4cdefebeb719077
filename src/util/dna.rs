use serde::{Deserialize, Serialize};

use crate::error::{ConstructionError, Error, Result};

pub const SIGMA: usize = 6; // {0:$, 1:A, 2:C, 3:G, 4:T, 5:N}

/// 索引字母表。判别值即稠密编码，顺序即字典序（`$` 最小）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Symbol {
    Sentinel = 0,
    A = 1,
    C = 2,
    G = 3,
    T = 4,
    N = 5,
}

impl Symbol {
    pub const ALL: [Symbol; SIGMA] = [Symbol::Sentinel, Symbol::A, Symbol::C, Symbol::G, Symbol::T, Symbol::N];

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_code(code: u8) -> Result<Self> {
        Self::ALL.get(code as usize).copied().ok_or(Error::UnknownSymbol(code))
    }

    /// 严格映射：只接受 ACGTN（大小写均可）。
    #[inline]
    pub fn from_base(b: u8) -> Option<Self> {
        match b.to_ascii_uppercase() {
            b'A' => Some(Symbol::A),
            b'C' => Some(Symbol::C),
            b'G' => Some(Symbol::G),
            b'T' => Some(Symbol::T),
            b'N' => Some(Symbol::N),
            _ => None,
        }
    }

    #[inline]
    pub const fn to_base(self) -> u8 {
        match self {
            Symbol::Sentinel => b'$',
            Symbol::A => b'A',
            Symbol::C => b'C',
            Symbol::G => b'G',
            Symbol::T => b'T',
            Symbol::N => b'N',
        }
    }
}

/// 宽松映射，read 用：U 视作 T，其余未知字符按 N 处理。
#[inline]
pub fn to_symbol(b: u8) -> Symbol {
    match b {
        b'U' | b'u' => Symbol::T,
        _ => Symbol::from_base(b).unwrap_or(Symbol::N),
    }
}

pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| to_symbol(b).to_base()).collect()
}

pub fn encode_read(seq: &[u8]) -> Vec<Symbol> {
    seq.iter().map(|&b| to_symbol(b)).collect()
}

/// 参考序列编码：遇到字母表以外的字符（包括哨兵本身）直接报错，不做替换。
pub fn encode_reference(seq: &[u8]) -> Result<Vec<Symbol>> {
    if seq.is_empty() {
        return Err(ConstructionError::EmptyReference.into());
    }
    // +1 给哨兵留位置
    if seq.len() >= u32::MAX as usize {
        return Err(ConstructionError::TooLong { len: seq.len() }.into());
    }
    seq.iter()
        .enumerate()
        .map(|(position, &base)| {
            Symbol::from_base(base).ok_or(Error::Construction(ConstructionError::InvalidBase { position, base }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_sort_order() {
        for (i, s) in Symbol::ALL.iter().enumerate() {
            assert_eq!(s.code() as usize, i);
            assert_eq!(Symbol::from_code(i as u8).unwrap(), *s);
        }
        assert!(Symbol::Sentinel < Symbol::A && Symbol::T < Symbol::N);
        assert_eq!(Symbol::from_code(6), Err(Error::UnknownSymbol(6)));
    }

    #[test]
    fn normalize_maps_unknown_to_n() {
        assert_eq!(normalize_seq(b"acgu*N"), b"ACGTNN");
    }

    #[test]
    fn encode_reference_rejects_bad_input() {
        assert_eq!(
            encode_reference(b""),
            Err(Error::Construction(ConstructionError::EmptyReference))
        );
        assert_eq!(
            encode_reference(b"ACXT"),
            Err(Error::Construction(ConstructionError::InvalidBase { position: 2, base: b'X' }))
        );
        assert!(matches!(
            encode_reference(b"AC$"),
            Err(Error::Construction(ConstructionError::InvalidBase { position: 2, .. }))
        ));
        assert_eq!(encode_reference(b"gatN").unwrap(), vec![Symbol::G, Symbol::A, Symbol::T, Symbol::N]);
    }

    #[test]
    fn uracil_only_accepted_in_reads() {
        assert_eq!(
            encode_reference(b"ACGU"),
            Err(Error::Construction(ConstructionError::InvalidBase { position: 3, base: b'U' }))
        );
        assert_eq!(Symbol::from_base(b'u'), None);
        assert_eq!(encode_read(b"ACGu"), vec![Symbol::A, Symbol::C, Symbol::G, Symbol::T]);
        assert_eq!(normalize_seq(b"uxA"), b"TNA");
    }
}
