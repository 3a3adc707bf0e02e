use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};

/// Computes differences between each element of x and each element of y
/// resulting in a 2d array of shape (nrows(x) * nrows(y), ncols(x));
/// *Panics* if x and y have not the same column numbers
pub fn pairwise_differences(
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    y: &ArrayBase<impl Data<Elem = f64>, Ix2>,
) -> Array2<f64> {
    assert!(x.ncols() == y.ncols());

    let nx = x.nrows();
    let ny = y.nrows();
    let ncols = x.ncols();
    let mut result = Array2::zeros((nx * ny, ncols));

    for (i, x_row) in x.rows().into_iter().enumerate() {
        for (j, y_row) in y.rows().into_iter().enumerate() {
            let idx = i * ny + j;
            for k in 0..ncols {
                result[[idx, k]] = x_row[k] - y_row[k];
            }
        }
    }

    result
}

/// Population (ddof = 0) standard deviation of each column,
/// zero deviations are replaced by one
pub fn column_std(x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Array1<f64> {
    let mut std = x.std_axis(Axis(0), 0.);
    std.mapv_inplace(|v| if v == 0. { 1. } else { v });
    std
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_pairwise_differences() {
        let x = array![[-0.9486833], [-0.82219219]];
        let y = array![
            [-1.26491106],
            [-0.63245553],
            [0.],
            [0.63245553],
            [1.26491106]
        ];
        assert_abs_diff_eq!(
            &array![
                [0.31622777],
                [-0.31622777],
                [-0.9486833],
                [-1.58113883],
                [-2.21359436],
                [0.44271887],
                [-0.18973666],
                [-0.82219219],
                [-1.45464772],
                [-2.08710326]
            ],
            &pairwise_differences(&x, &y),
            epsilon = 1e-6
        )
    }

    #[test]
    fn test_column_std() {
        let x = array![[1., 2.], [3., 2.]];
        assert_eq!(column_std(&x), array![1., 1.]);
        let x = array![[0.], [1.], [2.]];
        assert_abs_diff_eq!(column_std(&x)[0], (2f64 / 3.).sqrt(), epsilon = 1e-12);
    }
}
