//! Masked mean pooling over encoder token outputs.

use assist_core::{AppError, AppResult};
use tract_onnx::prelude::tract_ndarray::{Array2, ArrayView2, ArrayView3, Axis};

/// Floor applied to the mask sum so all-padding rows pool to zero.
pub const MASK_EPSILON: f32 = 1e-9;

/// Pool token vectors `[batch, seq, hidden]` into sentence vectors `[batch, hidden]`.
///
/// Each token is weighted by its attention mask value, so padding contributes
/// nothing to either the sum or the token count.
pub fn mean_pooling(
    token_embeddings: ArrayView3<'_, f32>,
    attention_mask: ArrayView2<'_, i64>,
) -> AppResult<Array2<f32>> {
    let (batch, seq_len, hidden) = token_embeddings.dim();

    if attention_mask.dim() != (batch, seq_len) {
        return Err(AppError::Embedding(format!(
            "Attention mask shape {:?} does not match token output [{}, {}]",
            attention_mask.shape(),
            batch,
            seq_len
        )));
    }

    let mut pooled = Array2::<f32>::zeros((batch, hidden));

    for (i, mut row) in pooled.axis_iter_mut(Axis(0)).enumerate() {
        let tokens = token_embeddings.index_axis(Axis(0), i);
        let mask = attention_mask.index_axis(Axis(0), i);
        let mut weight = 0.0f32;

        for (j, &m) in mask.iter().enumerate() {
            if m == 0 {
                continue;
            }
            let m = m as f32;
            row.scaled_add(m, &tokens.index_axis(Axis(0), j));
            weight += m;
        }

        row.mapv_inplace(|v| v / weight.max(MASK_EPSILON));
    }

    Ok(pooled)
}

/// Scale a vector to unit length. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tract_onnx::prelude::tract_ndarray::{arr2, arr3};

    #[test]
    fn test_full_mask_is_plain_mean() {
        let tokens = arr3(&[[[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]]]);
        let mask = arr2(&[[1i64, 1, 1]]);

        let pooled = mean_pooling(tokens.view(), mask.view()).unwrap();
        assert_eq!(pooled.row(0).to_vec(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_padding_positions_are_ignored() {
        let tokens = arr3(&[
            [[1.0f32, 1.0], [3.0, 3.0], [100.0, -100.0]],
            [[2.0, 4.0], [0.0, 0.0], [0.0, 0.0]],
        ]);
        let mask = arr2(&[[1i64, 1, 0], [1, 0, 0]]);

        let pooled = mean_pooling(tokens.view(), mask.view()).unwrap();
        assert_eq!(pooled.row(0).to_vec(), vec![2.0, 2.0]);
        assert_eq!(pooled.row(1).to_vec(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_all_padding_row_is_zero() {
        let tokens = arr3(&[[[7.0f32, -3.0], [1.0, 1.0]]]);
        let mask = arr2(&[[0i64, 0]]);

        let pooled = mean_pooling(tokens.view(), mask.view()).unwrap();
        assert!(pooled.iter().all(|v| *v == 0.0));
        assert!(pooled.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_mask_shape_mismatch() {
        let tokens = arr3(&[[[1.0f32], [2.0]]]);
        let mask = arr2(&[[1i64, 1, 1]]);

        assert!(matches!(
            mean_pooling(tokens.view(), mask.view()),
            Err(AppError::Embedding(_))
        ));
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0f32; 3];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 3]);
    }
}
