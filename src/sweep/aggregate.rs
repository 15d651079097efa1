//! Outcome aggregation.
//!
//! Folds the full outcome set into one summary per `(nH, d)` group: the
//! median of every fitted field over the group's successful records, the
//! group's ground truth (identical across members by construction, so taken
//! from the first), and the deviations between the two. Median over a few
//! hundred stochastic fits is the original analysis choice and is robust to
//! the occasional wild fit.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::domain::{FITTED_FIELDS, GroupKey, GroupSummary, Outcome, ResultRecord};

/// Median of the present values, or `None` if no value is present.
///
/// Even-length inputs average the two middle values (as pandas does).
/// Absent values are skipped, not treated as zero.
pub fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut v: Vec<f64> = values.filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = v.len();
    if n % 2 == 1 {
        Some(v[n / 2])
    } else {
        Some((v[n / 2 - 1] + v[n / 2]) / 2.0)
    }
}

/// Summarize all successful outcomes, one group per axis combination, in
/// axis declaration order (`nH` outer, `d` inner).
///
/// Membership is exact equality on the key values. Groups with zero
/// successful records (every iteration timed out or errored) still get a
/// summary; its statistics are simply all absent.
pub fn aggregate(outcomes: &[Outcome], nh_values: &[f64], d_values: &[f64]) -> Vec<GroupSummary> {
    let mut by_key: HashMap<(u64, u64), Vec<&ResultRecord>> = HashMap::new();
    for outcome in outcomes {
        if let Outcome::Success(record) = outcome {
            by_key.entry(record.group_key().bits()).or_default().push(record);
        }
    }

    let keys: Vec<GroupKey> = nh_values
        .iter()
        .flat_map(|&nh| d_values.iter().map(move |&d| GroupKey { nh, d }))
        .collect();

    keys.into_par_iter()
        .map(|key| {
            let members = by_key.get(&key.bits()).map(Vec::as_slice).unwrap_or(&[]);
            summarize_group(key, members)
        })
        .collect()
}

fn summarize_group(key: GroupKey, members: &[&ResultRecord]) -> GroupSummary {
    let mut medians: HashMap<&str, Option<f64>> = HashMap::new();
    for (name, get) in FITTED_FIELDS {
        medians.insert(*name, median(members.iter().filter_map(|r| get(r))));
    }
    let med = |name: &str| medians.get(name).copied().flatten();

    let first = members.first();
    let power_norm_fake = first.map(|r| r.power_norm_fake);
    let disk_norm_fake = first.map(|r| r.disk_norm_fake);

    let disk_norm_fit = med("disk_norm_fit");
    let d_fit = med("d_fit");
    let error_disk_norm = match (disk_norm_fit, disk_norm_fake) {
        (Some(fit), Some(fake)) => Some(fit - fake),
        _ => None,
    };
    let error_d = d_fit.map(|fit| fit - key.d);
    let frac_uncert = error_d.map(|e| e / key.d);

    GroupSummary {
        nh: key.nh,
        d: key.d,
        n_success: members.len(),
        red_chi_squared: med("red_chi_squared"),
        gamma: med("gamma"),
        power_norm_fake,
        power_norm_fit: med("power_norm_fit"),
        temp: med("temp"),
        disk_norm_fake,
        disk_norm_fit,
        error_disk_norm,
        d_fit,
        error_d,
        frac_uncert,
        med_frac_uncert: med("frac_uncert"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Task;

    fn record(nh: f64, d: f64, d_fit: Option<f64>, temp: Option<f64>) -> Outcome {
        let mut r = ResultRecord::unfitted(GroupKey { nh, d }, 1.5, 2000.0);
        r.d_fit = d_fit;
        r.temp = temp;
        r.frac_uncert = d_fit.map(|f| (f - d) / d);
        Outcome::Success(r)
    }

    #[test]
    fn median_of_odd_and_even_counts() {
        assert_eq!(median([1.0, 2.0, 3.0].into_iter()), Some(2.0));
        assert_eq!(median([4.0, 1.0, 3.0, 2.0].into_iter()), Some(2.5));
        assert_eq!(median(std::iter::empty()), None);
    }

    #[test]
    fn group_median_is_computed_per_field() {
        let outcomes = vec![
            record(0.1, 8.0, Some(1.0), Some(0.7)),
            record(0.1, 8.0, Some(2.0), None),
            record(0.1, 8.0, Some(3.0), Some(0.9)),
        ];
        let summaries = aggregate(&outcomes, &[0.1], &[8.0]);
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!(s.n_success, 3);
        assert_eq!(s.d_fit, Some(2.0));
        // The absent temp is skipped, not zeroed.
        assert_eq!(s.temp, Some(0.8));
        assert_eq!(s.disk_norm_fake, Some(2000.0));
        assert_eq!(s.error_d, Some(2.0 - 8.0));
        assert_eq!(s.frac_uncert, Some((2.0 - 8.0) / 8.0));
    }

    #[test]
    fn empty_group_is_all_absent_not_an_error() {
        // Successes exist only for d = 2; the d = 4 group is empty.
        let outcomes = vec![record(0.1, 2.0, Some(2.1), None)];
        let summaries = aggregate(&outcomes, &[0.1], &[2.0, 4.0]);
        assert_eq!(summaries.len(), 2);
        let empty = &summaries[1];
        assert_eq!(empty.n_success, 0);
        assert!(empty.d_fit.is_none());
        assert!(empty.disk_norm_fake.is_none());
        assert!(empty.error_d.is_none());
        assert!(empty.med_frac_uncert.is_none());
    }

    #[test]
    fn timeouts_and_errors_do_not_contribute() {
        let key = GroupKey { nh: 0.1, d: 2.0 };
        let task = Task { key, iteration: 0 };
        let outcomes = vec![
            record(0.1, 2.0, Some(2.5), None),
            Outcome::Timeout(task),
            Outcome::Error(task, "no convergence".to_string()),
        ];
        let summaries = aggregate(&outcomes, &[0.1], &[2.0]);
        assert_eq!(summaries[0].n_success, 1);
        assert_eq!(summaries[0].d_fit, Some(2.5));
    }

    #[test]
    fn summaries_follow_axis_declaration_order() {
        let outcomes: Vec<Outcome> = [(0.1, 1.0), (0.1, 2.0), (1.0, 1.0), (1.0, 2.0)]
            .iter()
            .map(|&(nh, d)| record(nh, d, Some(d), None))
            .collect();
        let summaries = aggregate(&outcomes, &[0.1, 1.0], &[1.0, 2.0]);
        let order: Vec<(f64, f64)> = summaries.iter().map(|s| (s.nh, s.d)).collect();
        assert_eq!(order, vec![(0.1, 1.0), (0.1, 2.0), (1.0, 1.0), (1.0, 2.0)]);
    }
}
