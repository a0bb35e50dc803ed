use serde::{Deserialize, Serialize};

/// A fixed-length embedding of floating point numbers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Embedding {
    data: Vec<f32>,
}

impl Embedding {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    /// Normalize the embedding to unit length.
    /// Zero vectors are left untouched.
    #[inline]
    pub fn normalize(&mut self) {
        normalize_in_place(&mut self.data);
    }

    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut e = self.clone();
        e.normalize();
        e
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

impl From<&[f32]> for Embedding {
    fn from(data: &[f32]) -> Self {
        Self::from_slice(data)
    }
}

/// Scale a raw slice to unit length (no-op below `f32::EPSILON`)
#[inline]
pub(crate) fn normalize_in_place(data: &mut [f32]) {
    let norm = crate::distance::norm(data);
    if norm > f32::EPSILON {
        let inv_norm = 1.0 / norm;
        for x in data.iter_mut() {
            *x *= inv_norm;
        }
    }
}
