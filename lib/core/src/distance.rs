// Distance kernels and similarity-space conventions
// Conventions match the classic HNSW library: squared L2, 1 - dot for inner product,
// 1 - dot over unit vectors for cosine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Similarity space, fixed when an index is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Space {
    #[serde(rename = "l2", alias = "euclidean")]
    Euclidean,
    #[serde(rename = "ip", alias = "inner_product")]
    InnerProduct,
    #[default]
    #[serde(rename = "cosine")]
    Cosine,
}

impl Space {
    /// Whether stored and query vectors are normalized before distance computation
    #[inline]
    #[must_use]
    pub fn normalizes(self) -> bool {
        matches!(self, Space::Cosine)
    }

    /// Distance between two vectors in this space.
    /// For `Cosine` both inputs must already be normalized.
    #[inline]
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Space::Euclidean => squared_l2(a, b),
            Space::InnerProduct | Space::Cosine => 1.0 - dot(a, b),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Space::Euclidean => "l2",
            Space::InnerProduct => "ip",
            Space::Cosine => "cosine",
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Space {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "l2" | "euclidean" => Ok(Space::Euclidean),
            "ip" | "inner_product" | "dot" => Ok(Space::InnerProduct),
            "cosine" => Ok(Space::Cosine),
            other => Err(crate::Error::InvalidConfig(format!("unknown space: {}", other))),
        }
    }
}

/// Dot product with two accumulators for better pipelining
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut dot0 = 0.0f32;
    let mut dot1 = 0.0f32;

    let chunks = a.chunks_exact(8);
    let remainder = chunks.remainder();
    let b_chunks = b.chunks_exact(8);

    for (a_chunk, b_chunk) in chunks.zip(b_chunks) {
        dot0 += a_chunk[0] * b_chunk[0]
            + a_chunk[1] * b_chunk[1]
            + a_chunk[2] * b_chunk[2]
            + a_chunk[3] * b_chunk[3];

        dot1 += a_chunk[4] * b_chunk[4]
            + a_chunk[5] * b_chunk[5]
            + a_chunk[6] * b_chunk[6]
            + a_chunk[7] * b_chunk[7];
    }

    let tail = a.len() - remainder.len();
    for (x, y) in remainder.iter().zip(&b[tail..]) {
        dot0 += x * y;
    }

    dot0 + dot1
}

/// Squared Euclidean distance (no square root, as HNSW ranks on it directly)
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut sum0 = 0.0f32;
    let mut sum1 = 0.0f32;

    let chunks = a.chunks_exact(4);
    let remainder = chunks.remainder();
    let b_chunks = b.chunks_exact(4);

    for (a_chunk, b_chunk) in chunks.zip(b_chunks) {
        let d0 = a_chunk[0] - b_chunk[0];
        let d1 = a_chunk[1] - b_chunk[1];
        let d2 = a_chunk[2] - b_chunk[2];
        let d3 = a_chunk[3] - b_chunk[3];

        sum0 += d0 * d0 + d1 * d1;
        sum1 += d2 * d2 + d3 * d3;
    }

    let tail = a.len() - remainder.len();
    for (x, y) in remainder.iter().zip(&b[tail..]) {
        let diff = x - y;
        sum0 += diff * diff;
    }

    sum0 + sum1
}

#[inline]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_with_remainder() {
        let a: Vec<f32> = (0..11).map(|i| i as f32).collect();
        let b = vec![1.0f32; 11];
        assert!((dot(&a, &b) - 55.0).abs() < 1e-4);
    }

    #[test]
    fn test_squared_l2() {
        assert!((squared_l2(&[0.0, 0.0], &[3.0, 4.0]) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_space_distances() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!((Space::Cosine.distance(&a, &a) - 0.0).abs() < 1e-6);
        assert!((Space::Cosine.distance(&a, &b) - 1.0).abs() < 1e-6);
        assert!((Space::InnerProduct.distance(&[2.0, 0.0], &a) + 1.0).abs() < 1e-6);
        assert!((Space::Euclidean.distance(&a, &b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_space_names() {
        assert_eq!("l2".parse::<Space>().unwrap(), Space::Euclidean);
        assert_eq!("IP".parse::<Space>().unwrap(), Space::InnerProduct);
        assert!("manhattan".parse::<Space>().is_err());

        let s: Space = serde_json::from_str("\"inner_product\"").unwrap();
        assert_eq!(s, Space::InnerProduct);
        assert_eq!(serde_json::to_string(&Space::Cosine).unwrap(), "\"cosine\"");
    }
}
