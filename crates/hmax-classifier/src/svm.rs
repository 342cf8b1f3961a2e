// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Linear support-vector machine, one-vs-rest.
//!
//! Each class gets a hyperplane trained by full-batch sub-gradient descent on
//!
//! ```text
//! 1/2 ||w||² + C Σ max(0, 1 - yᵢ (w·xᵢ + b))
//! ```
//!
//! scaled by `1 / (C n)`. Features are standardized with the training mean
//! and standard deviation. Training is deterministic.

use crate::{ClassifierError, ClassifierResult, SampleMatrix};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Fit / predict over string class labels
pub trait Classifier {
    fn fit(&mut self, samples: &SampleMatrix) -> ClassifierResult<()>;

    /// One label per row of `features`
    fn predict(&self, features: ArrayView2<'_, f64>) -> ClassifierResult<Vec<String>>;
}

#[derive(Debug, Clone)]
struct FittedModel {
    classes: Vec<String>,
    mean: Array1<f64>,
    scale: Array1<f64>,
    /// One row per class
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl FittedModel {
    fn standardize(&self, row: ArrayView1<'_, f64>) -> Array1<f64> {
        (&row - &self.mean) / &self.scale
    }
}

#[derive(Debug, Clone)]
pub struct LinearSvm {
    /// Inverse regularization strength
    c: f64,
    epochs: usize,
    learning_rate: f64,
    model: Option<FittedModel>,
}

impl Default for LinearSvm {
    fn default() -> Self {
        Self::new(1.0, 1000, 0.01)
    }
}

impl LinearSvm {
    pub fn new(c: f64, epochs: usize, learning_rate: f64) -> Self {
        Self {
            c,
            epochs,
            learning_rate,
            model: None,
        }
    }

    /// Classes seen during `fit`, sorted
    pub fn classes(&self) -> Option<&[String]> {
        self.model.as_ref().map(|m| m.classes.as_slice())
    }

    /// Per-class decision values of one sample
    pub fn decision_function(&self, row: ArrayView1<'_, f64>) -> ClassifierResult<Array1<f64>> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotFitted)?;
        if row.len() != model.mean.len() {
            return Err(ClassifierError::DimensionMismatch {
                expected: model.mean.len(),
                got: row.len(),
            });
        }
        let x = model.standardize(row);
        Ok(model.weights.dot(&x) + &model.bias)
    }

    fn check_params(&self) -> ClassifierResult<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(ClassifierError::InvalidParameter(format!("C must be positive, got {}", self.c)));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ClassifierError::InvalidParameter(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// Train one class-vs-rest hyperplane on standardized `x`
    fn fit_binary(&self, x: &Array2<f64>, y: &Array1<f64>) -> (Array1<f64>, f64) {
        let n = x.nrows() as f64;
        let mut w = Array1::<f64>::zeros(x.ncols());
        let mut b = 0.0;

        for _ in 0..self.epochs {
            let margins = (x.dot(&w) + b) * y;
            // Samples inside the margin contribute -y to the hinge sub-gradient
            let active = margins.mapv(|m| if m < 1.0 { 1.0 } else { 0.0 }) * y;
            let grad_w = &w / (self.c * n) - x.t().dot(&active) / n;
            let grad_b = -active.sum() / n;

            w = &w - &(grad_w * self.learning_rate);
            b -= self.learning_rate * grad_b;
        }
        (w, b)
    }
}

impl Classifier for LinearSvm {
    fn fit(&mut self, samples: &SampleMatrix) -> ClassifierResult<()> {
        samples.ensure_aligned()?;
        self.check_params()?;
        if samples.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }

        let features = samples.features();
        let mean = features
            .mean_axis(Axis(0))
            .ok_or(ClassifierError::EmptyTrainingSet)?;
        let scale = features
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-12 { s } else { 1.0 });
        let x = (features - &mean) / &scale;

        let classes: Vec<String> = samples
            .labels()
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut weights = Array2::<f64>::zeros((classes.len(), features.ncols()));
        let mut bias = Array1::<f64>::zeros(classes.len());
        if classes.len() > 1 {
            for (k, class) in classes.iter().enumerate() {
                let y: Array1<f64> = samples
                    .labels()
                    .iter()
                    .map(|l| if l == class { 1.0 } else { -1.0 })
                    .collect();
                let (w, b) = self.fit_binary(&x, &y);
                weights.row_mut(k).assign(&w);
                bias[k] = b;
                debug!(target: "hmax-classifier", "Class '{}': bias {:.4}, |w| {:.4}", class, b, w.dot(&w).sqrt());
            }
        }

        info!(
            target: "hmax-classifier",
            "Fitted linear SVM on {} samples, {} features, {} classes",
            samples.len(),
            samples.n_features(),
            classes.len()
        );
        self.model = Some(FittedModel {
            classes,
            mean,
            scale,
            weights,
            bias,
        });
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> ClassifierResult<Vec<String>> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotFitted)?;
        features
            .rows()
            .into_iter()
            .map(|row| {
                let scores = self.decision_function(row)?;
                // Ties go to the first class in sorted order
                let best = scores
                    .iter()
                    .enumerate()
                    .fold(0, |best, (k, s)| if *s > scores[best] { k } else { best });
                Ok(model.classes[best].clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_separates_linearly_separable_classes() {
        let rows = vec![
            vec![10.0, 1.0, 0.0],
            vec![12.0, 0.0, 1.0],
            vec![11.0, 2.0, 1.0],
            vec![1.0, 11.0, 0.0],
            vec![0.0, 12.0, 2.0],
            vec![2.0, 10.0, 1.0],
            vec![1.0, 0.0, 12.0],
            vec![0.0, 2.0, 10.0],
            vec![2.0, 1.0, 11.0],
        ];
        let y = labels(&["a", "a", "a", "b", "b", "b", "c", "c", "c"]);
        let samples = SampleMatrix::new(rows, y.clone()).unwrap();

        let mut svm = LinearSvm::default();
        svm.fit(&samples).unwrap();
        assert_eq!(svm.classes().unwrap(), labels(&["a", "b", "c"]).as_slice());
        assert_eq!(svm.predict(samples.features().view()).unwrap(), y);
    }

    #[test]
    fn test_deterministic() {
        let rows = vec![vec![1.0, 5.0], vec![2.0, 4.0], vec![5.0, 1.0], vec![4.0, 3.0]];
        let samples = SampleMatrix::new(rows, labels(&["x", "x", "y", "y"])).unwrap();
        let mut a = LinearSvm::new(1.0, 200, 0.05);
        let mut b = a.clone();
        a.fit(&samples).unwrap();
        b.fit(&samples).unwrap();
        let row = samples.features().row(0);
        assert_eq!(a.decision_function(row).unwrap(), b.decision_function(row).unwrap());
    }

    #[test]
    fn test_single_class_predicts_it() {
        let samples = SampleMatrix::new(vec![vec![1.0], vec![2.0]], labels(&["only", "only"])).unwrap();
        let mut svm = LinearSvm::default();
        svm.fit(&samples).unwrap();
        assert_eq!(svm.predict(samples.features().view()).unwrap(), labels(&["only", "only"]));
    }

    #[test]
    fn test_errors() {
        let svm = LinearSvm::default();
        let x = Array2::<f64>::zeros((1, 2));
        assert!(matches!(svm.predict(x.view()), Err(ClassifierError::NotFitted)));

        let mut svm = LinearSvm::default();
        let misaligned = SampleMatrix::new(vec![vec![1.0]], labels(&["a", "b"])).unwrap();
        assert!(matches!(svm.fit(&misaligned), Err(ClassifierError::SampleLabelMismatch { .. })));

        let samples = SampleMatrix::new(vec![vec![1.0], vec![2.0]], labels(&["a", "b"])).unwrap();
        svm.fit(&samples).unwrap();
        let wide = Array2::<f64>::zeros((1, 3));
        assert!(matches!(
            svm.predict(wide.view()),
            Err(ClassifierError::DimensionMismatch { expected: 1, got: 3 })
        ));

        let mut bad = LinearSvm::new(0.0, 10, 0.1);
        assert!(matches!(bad.fit(&samples), Err(ClassifierError::InvalidParameter(_))));
    }
}
