//! Loss functions.
//!
//! Scores are raw, un-normalised class scores with one row per example. Labels are one-hot
//! rows; [`class_indices`] turns them into the true class index per row.
//!
//! Softmax always subtracts the row maximum before exponentiating, so large logits cannot
//! overflow `exp`.

use crate::Matrix;

/// Margin used by [`svm_hinge_loss`] in the multiclass SVM formulation.
pub const SVM_DELTA: f64 = 1.0;

/// True class per row of a one-hot label matrix: the first entry `> 0`.
///
/// Panics if a row has no positive entry.
pub fn class_indices(labels: &Matrix) -> Vec<usize> {
    labels
        .iter_rows()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .position(|&v| v > 0.0)
                .unwrap_or_else(|| panic!("label row {r} has no positive entry: {row:?}"))
        })
        .collect()
}

/// Row-wise softmax probabilities, stabilised by the row maximum.
pub fn softmax(scores: &Matrix) -> Matrix {
    let exp = scores.col_sub(&scores.row_max()).element_exp();
    exp.col_div(&exp.row_sum())
}

/// Mean softmax cross-entropy over the rows of `scores` plus `0.5 * lambda * sum(W .* W)`
/// for every matrix in `reg_weights`.
pub fn softmax_cross_entropy_loss(
    scores: &Matrix,
    classes: &[usize],
    reg_weights: &[&Matrix],
    lambda: f64,
) -> f64 {
    assert_eq!(
        classes.len(),
        scores.rows(),
        "shape error: {} class indices for {} score rows",
        classes.len(),
        scores.rows()
    );
    if scores.rows() == 0 {
        return 0.0;
    }

    let probs = softmax(scores);
    let data_loss = probs.row_finder(classes).map(|p| -p.ln()).sum() / scores.rows() as f64;
    let reg_loss: f64 = reg_weights
        .iter()
        .map(|w| 0.5 * lambda * w.element_mul(w).sum())
        .sum();
    data_loss + reg_loss
}

/// Gradient of the mean softmax cross-entropy w.r.t. `scores`:
/// `(softmax(scores) - one_hot) / rows`.
pub fn softmax_gradient(scores: &Matrix, labels: &Matrix) -> Matrix {
    assert_eq!(
        scores.shape(),
        labels.shape(),
        "shape error: scores {:?} labels {:?}",
        scores.shape(),
        labels.shape()
    );

    let mut d_scores = softmax(scores);
    for (r, c) in class_indices(labels).into_iter().enumerate() {
        d_scores.set(r, c, d_scores.at(r, c) - 1.0);
    }
    d_scores.scalar_div(scores.rows().max(1) as f64)
}

/// Multiclass SVM hinge loss for one example:
/// `sum over j != true_class of max(0, scores[j] - scores[true_class] + delta)`.
pub fn svm_hinge_loss(scores: &[f64], true_class: usize, delta: f64) -> f64 {
    let correct = scores[true_class];
    scores
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != true_class)
        .map(|(_, &s)| (s - correct + delta).max(0.0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_rows_sum_to_one_even_for_huge_logits() {
        let scores = Matrix::from_array([[1000.0, 1001.0, 999.0], [-5.0, 0.0, 5.0]]);
        let probs = softmax(&scores);
        for row in probs.iter_rows() {
            assert!(row.iter().all(|p| p.is_finite()));
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        assert_eq!(probs.arg_max(), vec![1, 2]);
    }

    #[test]
    fn class_indices_takes_first_positive_entry() {
        let labels = Matrix::from_array([[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.5, 0.5]]);
        assert_eq!(class_indices(&labels), vec![1, 0, 1]);
    }

    #[test]
    #[should_panic(expected = "no positive entry")]
    fn class_indices_rejects_empty_label_rows() {
        class_indices(&Matrix::from_array([[0.0, 0.0]]));
    }

    #[test]
    fn cross_entropy_of_uniform_scores_is_ln_k() {
        let scores = Matrix::zeros(2, 4);
        let loss = softmax_cross_entropy_loss(&scores, &[0, 3], &[], 0.0);
        assert!((loss - 4.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn cross_entropy_adds_l2_penalty() {
        let scores = Matrix::zeros(1, 2);
        let w = Matrix::from_array([[1.0, 2.0], [3.0, 0.0]]);
        let loss = softmax_cross_entropy_loss(&scores, &[1], &[&w, &w], 0.1);
        // ln 2 + 2 * 0.5 * 0.1 * 14
        assert!((loss - (2.0_f64.ln() + 1.4)).abs() < 1e-12);
    }

    #[test]
    fn cross_entropy_prefers_correct_class() {
        let good = Matrix::from_array([[5.0, 0.0, -1.0]]);
        let bad = Matrix::from_array([[-1.0, 0.0, 5.0]]);
        assert!(
            softmax_cross_entropy_loss(&good, &[0], &[], 0.0)
                < softmax_cross_entropy_loss(&bad, &[0], &[], 0.0)
        );
    }

    #[test]
    fn softmax_gradient_subtracts_one_hot_and_averages() {
        let scores = Matrix::zeros(2, 2);
        let labels = Matrix::from_array([[1.0, 0.0], [0.0, 1.0]]);
        let d = softmax_gradient(&scores, &labels);
        let expected = Matrix::from_array([[-0.25, 0.25], [0.25, -0.25]]);
        assert!(d.approx_eq(&expected, 1e-15));
        // Each row of the gradient sums to zero.
        assert!(d.row_sum().approx_eq(&Matrix::zeros(2, 1), 1e-15));
    }

    #[test]
    fn svm_hinge_loss_sums_violated_margins() {
        let scores = [-2.85, 0.86, 0.28];
        let loss = svm_hinge_loss(&scores, 2, SVM_DELTA);
        assert!((loss - 1.58).abs() < 1e-9);

        assert_eq!(svm_hinge_loss(&[10.0, 0.0, 0.0], 0, SVM_DELTA), 0.0);
    }
}
