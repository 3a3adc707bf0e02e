use ndarray::{arr1, Array1};

pub(crate) struct CobylaParams {
    pub rhobeg: f64,
    pub ftol_rel: f64,
    pub maxeval: usize,
}

impl Default for CobylaParams {
    fn default() -> Self {
        CobylaParams {
            rhobeg: 0.5,
            ftol_rel: 1e-6,
            maxeval: crate::GP_MAP_MAX_EVAL,
        }
    }
}

/// Minimize `objfn` within given bounds starting from `param0` with cobyla.
///
/// Returns the best value found and its location. Failures of the optimizer are not fatal:
/// the last state reached is returned with an infinite value when the status is an error.
pub(crate) fn optimize_params<ObjF>(
    objfn: ObjF,
    param0: &Array1<f64>,
    bounds: &[(f64, f64)],
    cobyla: CobylaParams,
) -> (f64, Array1<f64>)
where
    ObjF: Fn(&[f64]) -> f64,
{
    use cobyla::{minimize, Func, StopTols};

    let cons: Vec<&dyn Func<()>> = vec![];
    let param0 = param0.to_vec();

    match minimize(
        |x: &[f64], _u: &mut ()| objfn(x),
        &param0,
        bounds,
        &cons,
        (),
        cobyla.maxeval,
        cobyla::RhoBeg::All(cobyla.rhobeg),
        Some(StopTols {
            ftol_rel: cobyla.ftol_rel,
            ..StopTols::default()
        }),
    ) {
        Ok((_, x_opt, fval)) => {
            let params_opt = arr1(&x_opt);
            let fval = if f64::is_nan(fval) {
                f64::INFINITY
            } else {
                fval
            };
            (fval, params_opt)
        }
        Err((status, x_opt, _)) => {
            log::warn!("Cobyla optimizer in GP stopped with status={status:?}");
            (f64::INFINITY, arr1(&x_opt))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_optimize_params_within_bounds() {
        let f = |x: &[f64]| (x[0] - 1.).powi(2) + (x[1] + 2.).powi(2);
        let (fmin, xmin) = optimize_params(
            f,
            &array![0., 0.],
            &[(-5., 5.), (-1., 5.)],
            CobylaParams::default(),
        );
        // second component is stuck at its lower bound
        assert_abs_diff_eq!(xmin, array![1., -1.], epsilon = 1e-3);
        assert_abs_diff_eq!(fmin, 1., epsilon = 1e-3);
    }
}
