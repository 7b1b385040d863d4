//! N-gram windowing and standardization

use ndarray::{s, Array2, ArrayBase, ArrayView2, DataMut, Dimension};

/// Standard deviations below this are treated as zero
pub const STD_EPSILON: f64 = 1e-8;

/// Standardize values in place to zero mean and unit variance
///
/// When the standard deviation is below [`STD_EPSILON`] the values are only
/// mean-centred. Empty arrays are left untouched.
pub fn standardize<S, D>(values: &mut ArrayBase<S, D>)
where
    S: DataMut<Elem = f32>,
    D: Dimension,
{
    let n = values.len();
    if n == 0 {
        return;
    }

    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n as f64;
    let std = variance.sqrt();

    if std < STD_EPSILON {
        values.mapv_inplace(|v| (v as f64 - mean) as f32);
    } else {
        values.mapv_inplace(|v| ((v as f64 - mean) / std) as f32);
    }
}

/// Number of windows of `length` frames in `frames` frames at stride 1
pub fn window_count(frames: usize, length: usize) -> usize {
    if length == 0 || frames < length {
        0
    } else {
        frames - length + 1
    }
}

/// Cut `representation` (frames × bins) into standardized n-gram windows
///
/// Row `i` of the result is frames `i..i + length` flattened row-major and
/// standardized on its own.
pub fn ngram_windows(representation: ArrayView2<'_, f32>, length: usize) -> Array2<f32> {
    let (frames, bins) = representation.dim();
    let count = window_count(frames, length);
    let mut batch = Array2::<f32>::zeros((count, length * bins));

    for (i, mut row) in batch.outer_iter_mut().enumerate() {
        let window = representation.slice(s![i..i + length, ..]);
        for (dst, &src) in row.iter_mut().zip(window.iter()) {
            *dst = src;
        }
        standardize(&mut row);
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    fn ramp(frames: usize, bins: usize) -> Array2<f32> {
        Array2::from_shape_fn((frames, bins), |(t, b)| (t * bins + b) as f32)
    }

    #[test]
    fn test_window_count() {
        assert_eq!(window_count(1000, 32), 969);
        assert_eq!(window_count(32, 32), 1);
        assert_eq!(window_count(31, 32), 0);
        assert_eq!(window_count(0, 32), 0);
    }

    #[test]
    fn test_windows_are_row_major_frame_slices() {
        let tf = ramp(5, 3);
        let batch = ngram_windows(tf.view(), 2);
        assert_eq!(batch.dim(), (4, 6));

        // Every window of a ramp is the same ramp up to an offset
        let first = batch.row(0).to_owned();
        for row in batch.outer_iter() {
            for (a, b) in row.iter().zip(first.iter()) {
                assert!((a - b).abs() < 1e-5);
            }
        }
        // Increasing within the window means frame-major flattening
        assert!(first.windows(2).into_iter().all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_windows_standardized() {
        let tf = Array2::from_shape_fn((40, 6), |(t, b)| ((t * 7 + b * 3) % 11) as f32);
        let batch = ngram_windows(tf.view(), 8);

        for row in batch.outer_iter() {
            let n = row.len() as f32;
            let mean = row.sum() / n;
            let var = row.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
            assert!(mean.abs() < 1e-4);
            assert!((var - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_constant_window_becomes_zeros() {
        let tf = Array2::from_elem((4, 3), 0.7f32);
        let batch = ngram_windows(tf.view(), 4);

        assert_eq!(batch.nrows(), 1);
        assert!(batch.iter().all(|v| v.abs() < 1e-6 && v.is_finite()));
    }

    #[test]
    fn test_too_few_frames_gives_empty_batch() {
        let batch = ngram_windows(ramp(3, 5).view(), 4);
        assert_eq!(batch.dim(), (0, 20));
    }

    #[test]
    fn test_standardize_vector() {
        let mut v: Array1<f32> = array![1.0, 2.0, 3.0, 4.0];
        standardize(&mut v);
        assert!(v.sum().abs() < 1e-6);
        assert!((v[3] - 1.341_640_8).abs() < 1e-5);
    }
}
