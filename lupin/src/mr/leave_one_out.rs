use super::instruments::Instruments;

/// Estimate with one instrument removed
#[derive(Debug, Clone)]
pub struct LeaveOneOut<T> {
    pub left_out: usize,
    pub snp_id: Box<str>,
    pub result: T,
}

/// Re-run `estimator` once per instrument, each time without it
pub fn mr_leave_one_out<T, F>(instruments: &Instruments, estimator: F) -> Vec<LeaveOneOut<T>>
where
    F: Fn(&Instruments) -> T,
{
    (0..instruments.len())
        .map(|i| LeaveOneOut {
            left_out: i,
            snp_id: instruments.snp_ids[i].clone(),
            result: estimator(&instruments.without(i)),
        })
        .collect()
}
