/// Precision/recall curve over probability thresholds, ordered by ascending
/// threshold. `precision`/`recall` carry one trailing point (1.0, 0.0) with
/// no matching threshold, so `precision.len() == thresholds.len() + 1`.
#[derive(Debug, Clone)]
pub struct PrecisionRecallCurve {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// Per-class summary at a fixed operating point.
#[derive(Debug, Clone, Copy)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

pub fn precision_recall_curve(labels: &[u8], probs: &[f64]) -> PrecisionRecallCurve {
    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));
    let total_pos = labels.iter().filter(|&&y| y == 1).count() as f64;

    let mut precision = Vec::new();
    let mut recall = Vec::new();
    let mut thresholds = Vec::new();
    let mut tp = 0.0;
    let mut fp = 0.0;
    for (rank, &i) in order.iter().enumerate() {
        if labels[i] == 1 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        // Emit one curve point per distinct score.
        let next = order.get(rank + 1);
        if next.map(|&j| probs[j] < probs[i]).unwrap_or(true) {
            precision.push(if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 });
            recall.push(if total_pos > 0.0 { tp / total_pos } else { 0.0 });
            thresholds.push(probs[i]);
        }
    }

    // Ascending thresholds, then the terminal (1, 0) point.
    precision.reverse();
    recall.reverse();
    thresholds.reverse();
    precision.push(1.0);
    recall.push(0.0);
    PrecisionRecallCurve {
        precision,
        recall,
        thresholds,
    }
}

/// The balanced operating point: the threshold minimizing
/// |precision − recall| over all but the last curve point. `None` when the
/// curve is degenerate (no thresholds at all).
pub fn balanced_threshold(curve: &PrecisionRecallCurve) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for i in 0..curve.thresholds.len() {
        let gap = (curve.precision[i] - curve.recall[i]).abs();
        if best.map(|(g, _)| gap < g).unwrap_or(true) {
            best = Some((gap, curve.thresholds[i]));
        }
    }
    best.map(|(_, threshold)| threshold)
}

pub fn class_metrics(labels: &[u8], preds: &[u8], class: u8) -> ClassMetrics {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    let mut support = 0usize;
    for (&y, &p) in labels.iter().zip(preds) {
        if y == class {
            support += 1;
        }
        match (y == class, p == class) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    ClassMetrics {
        precision,
        recall,
        f1,
        support,
    }
}

/// Human-readable report at a fixed operating point. Diagnostic output only.
pub fn classification_report(labels: &[u8], preds: &[u8]) -> String {
    let neg = class_metrics(labels, preds, 0);
    let pos = class_metrics(labels, preds, 1);
    let correct = labels.iter().zip(preds).filter(|(y, p)| y == p).count();
    let accuracy = ratio(correct, labels.len());

    let mut out = String::new();
    out.push_str("          precision  recall      f1  support\n");
    out.push_str(&report_line("non-MVP", neg));
    out.push_str(&report_line("MVP", pos));
    out.push_str(&format!(
        "accuracy  {accuracy:>9.4}                  {:>7}\n",
        labels.len()
    ));
    out
}

fn report_line(label: &str, m: ClassMetrics) -> String {
    format!(
        "{label:<8}  {:>9.4}  {:>6.4}  {:>6.4}  {:>7}\n",
        m.precision, m.recall, m.f1, m.support
    )
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::{balanced_threshold, class_metrics, classification_report, precision_recall_curve};

    #[test]
    fn curve_shape_matches_threshold_count() {
        let labels = [0, 0, 1, 1];
        let probs = [0.1, 0.4, 0.35, 0.8];
        let curve = precision_recall_curve(&labels, &probs);
        assert_eq!(curve.precision.len(), curve.thresholds.len() + 1);
        assert_eq!(curve.recall.len(), curve.precision.len());
        assert_eq!(*curve.recall.last().unwrap(), 0.0);
        assert_eq!(*curve.precision.last().unwrap(), 1.0);
        // Highest threshold keeps only the 0.8 positive: precision 1, recall 0.5.
        let last_t = curve.thresholds.len() - 1;
        assert!((curve.precision[last_t] - 1.0).abs() < 1e-12);
        assert!((curve.recall[last_t] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn balanced_threshold_minimizes_gap_excluding_last_point() {
        let labels = [0, 0, 1, 1, 1, 0];
        let probs = [0.05, 0.2, 0.3, 0.7, 0.9, 0.85];
        let curve = precision_recall_curve(&labels, &probs);
        let chosen = balanced_threshold(&curve).unwrap();
        let mut best_gap = f64::INFINITY;
        let mut best = f64::NAN;
        for i in 0..curve.thresholds.len() {
            let gap = (curve.precision[i] - curve.recall[i]).abs();
            if gap < best_gap {
                best_gap = gap;
                best = curve.thresholds[i];
            }
        }
        assert_eq!(chosen, best);
    }

    #[test]
    fn degenerate_curve_yields_none() {
        let curve = precision_recall_curve(&[], &[]);
        assert!(balanced_threshold(&curve).is_none());
    }

    #[test]
    fn class_metrics_on_known_confusion() {
        let labels = [1, 1, 0, 0, 1, 0];
        let preds = [1, 0, 0, 1, 1, 0];
        let pos = class_metrics(&labels, &preds, 1);
        assert!((pos.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((pos.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(pos.support, 3);

        let report = classification_report(&labels, &preds);
        assert!(report.contains("MVP"));
        assert!(report.contains("accuracy"));
    }
}
