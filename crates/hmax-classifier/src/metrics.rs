// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Multi-class evaluation: confusion matrix and per-class report

use crate::{ClassifierError, ClassifierResult};
use ndarray::Array2;
use std::collections::BTreeSet;
use std::fmt;

fn check_lengths(y_true: &[String], y_pred: &[String]) -> ClassifierResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(ClassifierError::SampleLabelMismatch {
            samples: y_pred.len(),
            labels: y_true.len(),
        });
    }
    Ok(())
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// Counts of (true class, predicted class) pairs.
///
/// Classes are the sorted union of true and predicted labels; rows are true
/// classes, columns predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    classes: Vec<String>,
    counts: Array2<usize>,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[String], y_pred: &[String]) -> ClassifierResult<Self> {
        check_lengths(y_true, y_pred)?;
        let classes: Vec<String> = y_true
            .iter()
            .chain(y_pred)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = |label: &String| classes.binary_search(label).unwrap_or_default();

        let mut counts = Array2::<usize>::zeros((classes.len(), classes.len()));
        for (t, p) in y_true.iter().zip(y_pred) {
            counts[[index(t), index(p)]] += 1;
        }
        Ok(Self { classes, counts })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Samples of class `truth` predicted as `predicted`
    pub fn count(&self, truth: usize, predicted: usize) -> usize {
        self.counts[[truth, predicted]]
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    /// Diagonal sum
    pub fn correct(&self) -> usize {
        self.counts.diag().sum()
    }

    fn support(&self, class: usize) -> usize {
        self.counts.row(class).sum()
    }

    fn predicted(&self, class: usize) -> usize {
        self.counts.column(class).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    /// `[[a b]\n [c d]]`, columns right-aligned to the widest count
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.counts.iter().map(|c| c.to_string().len()).max().unwrap_or(1);
        write!(f, "[")?;
        for (i, row) in self.counts.rows().into_iter().enumerate() {
            if i > 0 {
                write!(f, "\n ")?;
            }
            let cells: Vec<String> = row.iter().map(|c| format!("{:>width$}", c, width = width)).collect();
            write!(f, "[{}]", cells.join(" "))?;
        }
        write!(f, "]")
    }
}

/// Scores of one class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassReport {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision, recall, f1 and support, with accuracy and averages
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<ClassReport>,
    pub accuracy: f64,
    pub macro_avg: ClassReport,
    pub weighted_avg: ClassReport,
}

impl ClassificationReport {
    pub fn from_predictions(y_true: &[String], y_pred: &[String]) -> ClassifierResult<Self> {
        Ok(Self::from_confusion(&ConfusionMatrix::from_predictions(y_true, y_pred)?))
    }

    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let classes: Vec<ClassReport> = cm
            .classes()
            .iter()
            .enumerate()
            .map(|(k, label)| {
                let tp = cm.count(k, k);
                let precision = ratio(tp, cm.predicted(k));
                let recall = ratio(tp, cm.support(k));
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassReport {
                    label: label.clone(),
                    precision,
                    recall,
                    f1,
                    support: cm.support(k),
                }
            })
            .collect();

        let total = cm.total();
        let n = classes.len().max(1) as f64;
        let average = |label: &str, weight: &dyn Fn(&ClassReport) -> f64, norm: f64| ClassReport {
            label: label.to_string(),
            precision: classes.iter().map(|c| weight(c) * c.precision).sum::<f64>() / norm,
            recall: classes.iter().map(|c| weight(c) * c.recall).sum::<f64>() / norm,
            f1: classes.iter().map(|c| weight(c) * c.f1).sum::<f64>() / norm,
            support: total,
        };
        let macro_avg = average("macro avg", &|_| 1.0, n);
        let weighted_avg = average("weighted avg", &|c| c.support as f64, total.max(1) as f64);

        Self {
            accuracy: ratio(cm.correct(), total),
            classes,
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once(self.weighted_avg.label.len()))
            .max()
            .unwrap_or(0);
        let row = |f: &mut fmt::Formatter<'_>, c: &ClassReport| {
            writeln!(
                f,
                "{:>w$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label,
                c.precision,
                c.recall,
                c.f1,
                c.support,
                w = width
            )
        };

        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9} {:>9}",
            "",
            "precision",
            "recall",
            "f1-score",
            "support",
            w = width
        )?;
        writeln!(f)?;
        for class in &self.classes {
            row(f, class)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.macro_avg.support,
            w = width
        )?;
        row(f, &self.macro_avg)?;
        row(f, &self.weighted_avg)
    }
}
