use approx::assert_abs_diff_eq;

use lupin::mr::*;

#[test]
fn ivw_single_instrument_is_nan() {
    let inst = Instruments::from_slices(&[0.5], &[0.1], &[0.2], &[0.05]).unwrap();
    let res = mr_ivw(&inst);
    assert!(res.pvalue.is_nan());
    assert!(res.q_pvalue.is_nan());
    assert!(res.beta.is_nan());
}

#[test]
fn ivw_two_instruments_by_hand() {
    let inst =
        Instruments::from_slices(&[0.5, 0.3], &[0.1, 0.1], &[0.2, 0.15], &[0.05, 0.04]).unwrap();
    let res = mr_ivw(&inst);

    // w = [400, 625]
    let num = 400.0 * 0.2 * 0.5 + 625.0 * 0.15 * 0.3;
    let den = 400.0 * 0.5 * 0.5 + 625.0 * 0.3 * 0.3;
    assert_abs_diff_eq!(res.beta, num / den, epsilon = 1e-12);
    assert_abs_diff_eq!(res.beta, 0.436, epsilon = 1e-12);
    assert_abs_diff_eq!(res.se, 0.08, epsilon = 1e-12);
}

#[test]
fn egger_on_linear_data() {
    let be = [0.1, 0.2, 0.3, 0.4, 0.5];
    let bo: Vec<f64> = be.iter().map(|x| 2.0 * x).collect();
    let inst = Instruments::from_slices(&be, &[0.05; 5], &bo, &[0.02; 5]).unwrap();
    let res = mr_egger(&inst);
    assert_abs_diff_eq!(res.intercept, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(res.slope, 2.0, epsilon = 1e-9);
    assert!(res.intercept_pvalue > 0.05);
}

#[test]
fn egger_needs_three_instruments() {
    let inst = Instruments::from_slices(&[0.1, 0.2], &[0.05; 2], &[0.2, 0.4], &[0.02; 2]).unwrap();
    let res = mr_egger(&inst);
    assert!(res.slope_pvalue.is_nan() && res.intercept_pvalue.is_nan());
}

#[test]
fn run_mr_collects_everything() {
    let inst = Instruments::from_slices(
        &[0.5, 0.3, 0.4, f64::NAN],
        &[0.1, 0.1, 0.1, 0.1],
        &[0.2, 0.15, 0.22, 0.1],
        &[0.05, 0.04, 0.05, 0.05],
    )
    .unwrap();
    let res = run_mr(&inst);
    assert_eq!(res.num_instruments, 3);
    assert_abs_diff_eq!(res.strength.min_f, 9.0, epsilon = 1e-10);
    assert!(res.ivw.beta > 0.0);
    assert!(res.egger.slope.is_finite());
}

#[test]
fn leave_one_out_covers_every_instrument() {
    let inst = Instruments::from_slices(
        &[0.5, 0.3, 0.4, 0.2],
        &[0.1; 4],
        &[0.2, 0.15, 0.22, 0.1],
        &[0.05, 0.04, 0.05, 0.05],
    )
    .unwrap();
    let loo = mr_leave_one_out(&inst, mr_egger);
    assert_eq!(loo.len(), 4);
    for (i, x) in loo.iter().enumerate() {
        assert_eq!(x.left_out, i);
        assert!(x.result.slope.is_finite());
    }
}
