use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Sentence vector from token states: mean over unmasked tokens, then unit
/// length. `[B,T,H]` hidden states and a `[B,T]` mask give `[B,H]`.
/// A row whose mask is all zeros pools to the zero vector.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, width) = match hidden.dims() {
        [b, t, h] => (*b, *t, *h),
        other => anyhow::bail!("hidden states must be [B,T,H], got {other:?}"),
    };
    ensure!(attention_mask.dims() == [batch, tokens].as_slice(), "mask shape {:?} does not match [{batch},{tokens}]", attention_mask.dims());

    let weights = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&weights.unsqueeze(2)?)?.sum(1)?;
    let counts = weights.sum_keepdim(1)?.clamp(1.0, f64::MAX)?;
    let pooled = l2_normalize(&summed.broadcast_div(&counts)?)?;
    ensure!(pooled.dims() == [batch, width].as_slice(), "pooled shape {:?}, expected [{batch},{width}]", pooled.dims());
    Ok(pooled)
}

fn l2_normalize(rows: &Tensor) -> Result<Tensor> {
    let eps = if rows.dtype() == DType::F16 { 1e-6 } else { 1e-12 };
    let norms = rows.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, eps)?;
    Ok(rows.broadcast_div(&norms)?)
}
