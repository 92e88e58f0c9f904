//! Cosine similarity over embedding vectors.

/// Cosine similarity between two vectors.
///
/// Vectors of different length, empty vectors and zero vectors all yield `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Mean cosine similarity over all unordered pairs, `0.0` with fewer than two vectors.
pub fn mean_pairwise_similarity(vectors: &[&[f32]]) -> f64 {
    let n = vectors.len();
    if n < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            total += cosine_similarity(vectors[i], vectors[j]);
            pairs += 1;
        }
    }

    total / pairs as f64
}
