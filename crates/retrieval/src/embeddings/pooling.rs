//! Windowing and mean pooling for texts longer than a provider's context.

use docseek_core::{AppError, AppResult};

/// Split `text` into whitespace-word windows of at most `window` words.
///
/// Returns the text unchanged (as a single window) when no window is set or
/// the text already fits.
pub fn split_windows(text: &str, window: Option<usize>) -> Vec<String> {
    let window = match window {
        Some(w) if w > 0 => w,
        _ => return vec![text.to_string()],
    };

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= window {
        return vec![text.to_string()];
    }

    words.chunks(window).map(|chunk| chunk.join(" ")).collect()
}

/// Average a set of equally sized vectors element-wise.
pub fn mean_pool(vectors: &[Vec<f32>], dimensions: usize) -> AppResult<Vec<f32>> {
    if vectors.is_empty() {
        return Err(AppError::EmptyInput);
    }

    let mut pooled = vec![0.0f32; dimensions];
    for vector in vectors {
        if vector.len() != dimensions {
            return Err(AppError::DimensionMismatch {
                expected: dimensions,
                actual: vector.len(),
            });
        }
        for (acc, v) in pooled.iter_mut().zip(vector) {
            *acc += v;
        }
    }

    let count = vectors.len() as f32;
    for v in &mut pooled {
        *v /= count;
    }

    Ok(pooled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_window() {
        let windows = split_windows("one two three", Some(5));
        assert_eq!(windows, vec!["one two three".to_string()]);
    }

    #[test]
    fn test_no_window_keeps_text() {
        let text = "a ".repeat(10_000);
        assert_eq!(split_windows(&text, None).len(), 1);
    }

    #[test]
    fn test_long_text_is_windowed() {
        let windows = split_windows("a b c d e f g", Some(3));
        assert_eq!(windows, vec!["a b c", "d e f", "g"]);
    }

    #[test]
    fn test_mean_pool_averages() {
        let pooled = mean_pool(&[vec![1.0, 0.0], vec![0.0, 1.0]], 2).unwrap();
        assert_eq!(pooled, vec![0.5, 0.5]);
    }

    #[test]
    fn test_mean_pool_rejects_mixed_dimensions() {
        let result = mean_pool(&[vec![1.0, 0.0], vec![1.0]], 2);
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_mean_pool_empty() {
        assert!(matches!(mean_pool(&[], 4), Err(AppError::EmptyInput)));
    }
}
