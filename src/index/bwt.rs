use tracing::debug;

use super::sa::{build_sa, SampledSuffixArray};
use crate::error::Result;
use crate::util::dna::{self, Symbol};

/// 根据后缀数组构建 BWT：`bwt[i] = text[(sa[i] - 1) mod n]`。
/// 从哨兵开始的那一行取到的是参考序列最后一个真实字符。
pub fn build_bwt(text: &[Symbol], sa: &[u32]) -> Vec<Symbol> {
    let n = text.len();
    sa.iter()
        .map(|&p| {
            let i = p as usize;
            if i == 0 { text[n - 1] } else { text[i - 1] }
        })
        .collect()
}

/// Transform Builder 的产物：BWT 与采样后缀数组。完整 SA 在此丢弃。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BwtTransform {
    pub bwt: Vec<Symbol>,
    pub sampled_sa: SampledSuffixArray,
}

/// 对 `reference + $` 构建 BWT 和采样 SA。
///
/// 参考序列只接受 ACGTN（大小写均可）；空序列、其他字符都会失败。
pub fn build_transform(reference: &[u8], sample_interval: u32) -> Result<BwtTransform> {
    let mut text = dna::encode_reference(reference)?;
    text.push(Symbol::Sentinel);

    let sa = build_sa(&text);
    let bwt = build_bwt(&text, &sa);
    let sampled_sa = SampledSuffixArray::from_full(&sa, sample_interval)?;
    debug!(
        text_len = text.len(),
        samples = sampled_sa.num_samples(),
        sample_interval,
        "built BWT and sampled suffix array"
    );
    Ok(BwtTransform { bwt, sampled_sa })
}
