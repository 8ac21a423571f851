use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Tokenize a batch, truncate each sequence to `max_len`, and right-pad to the
/// longest sequence with `pad_id`. Returns `(input_ids, attention_mask)`, both `[B, T]`.
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    pad_id: u32,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        ids.truncate(max_len);
        mask.truncate(max_len);
        rows.push((ids, mask));
    }
    let seq_len = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut flat_ids = Vec::with_capacity(rows.len() * seq_len);
    let mut flat_mask = Vec::with_capacity(rows.len() * seq_len);
    for (ids, mask) in &rows {
        let pad = seq_len - ids.len();
        flat_ids.extend_from_slice(ids);
        flat_ids.extend(std::iter::repeat(pad_id).take(pad));
        flat_mask.extend_from_slice(mask);
        flat_mask.extend(std::iter::repeat(0u32).take(pad));
    }
    let input_ids = Tensor::from_vec(flat_ids, (rows.len(), seq_len), device)?;
    let attention_mask = Tensor::from_vec(flat_mask, (rows.len(), seq_len), device)?;
    Ok((input_ids, attention_mask))
}
