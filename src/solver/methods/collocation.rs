//! Collocation boundary-value solver
//!
//! # Mathematical Background
//!
//! The solution is approximated by a C¹ piecewise cubic S(z) that matches the
//! ODE at every mesh node and at every interval midpoint (4th-order Lobatto
//! IIIA collocation, equivalent to Simpson's rule):
//!
//! ```text
//! y_mid = (y_j + y_j+1)/2 − h/8·(f_j+1 − f_j)
//! r_j   = y_j+1 − y_j − h/6·(f_j + 4·f(z_mid, y_mid) + f_j+1) = 0
//! ```
//!
//! Together with the n boundary residuals this gives n·m equations in the
//! n·m unknowns y_ij, solved with a damped Newton method.
//!
//! # Algorithm
//!
//! 1. Newton iterations on the current mesh
//!    - Jacobians of f by finite differences (one model call per state
//!      variable, all nodes at once)
//!    - Banded LU of the global system
//!    - Backtracking on the affine-invariant cost |J⁻¹·R|²
//! 2. Residual of the cubic S'(z) − f(z, S(z)), relative to 1 + |f|,
//!    integrated per interval with a 3-point Lobatto rule
//! 3. Intervals above tolerance are split (two new nodes when the residual is
//!    a hundred times too large), new values taken from the cubic
//! 4. Repeat until every interval passes or the node budget is spent
//!
//! # Global System Layout
//!
//! Unknowns are stored node by node (index `j·n + i`). Boundary rows pinned
//! at z = 0 come first, then the collocation blocks of every interval, then
//! the rows pinned at z = L. With this ordering the matrix is banded with
//! `kl = s + n − 1` and `ku = 2n − 1 − s`, s being the number of rows pinned
//! at z = 0.
//!
//! # Example
//!
//! ```rust,ignore
//! use fiberamp::solver::{BvpSolver, CollocationSolver, SolverConfiguration};
//!
//! let solver = CollocationSolver::new();
//! let solution = solver.solve(&scenario, &SolverConfiguration::default())?;
//! ```

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::FiberAmpResult;
use crate::physics::RateEquationModel;
use crate::solver::methods::banded::{BandLu, BandMatrix};
use crate::solver::{
    validate_state, BoundaryConditions, BoundarySide, BvpScenario, BvpSolution, BvpSolver,
    SolverConfiguration, SolverStatus,
};

/// Relative finite-difference step, √ε
const FD_STEP: f64 = 1.490_116_119_384_765_6e-8;

/// Sufficient decrease constant of the backtracking line search
const ARMIJO_SIGMA: f64 = 0.2;

const BACKTRACKING_FACTOR: f64 = 0.5;

/// Smallest damping factor tried before accepting the step anyway
const MIN_DAMPING: f64 = 0.0625;

/// Newton stops once every collocation residual is below this fraction of
/// h·tol (relative to 1 + |f_mid|)
const NEWTON_RESIDUAL_FRACTION: f64 = 2.0 / 3.0 * 5e-2;

// =================================================================================================
// Collocation Solver
// =================================================================================================

/// 4th-order collocation solver with adaptive mesh refinement
///
/// # Example
///
/// ```rust
/// use fiberamp::solver::{BvpSolver, CollocationSolver};
///
/// let solver = CollocationSolver::new();
/// assert_eq!(solver.name(), "Lobatto IIIA collocation");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CollocationSolver;

impl CollocationSolver {
    pub fn new() -> Self {
        Self
    }
}

impl BvpSolver for CollocationSolver {
    fn solve(&self, scenario: &BvpScenario, config: &SolverConfiguration) -> FiberAmpResult<BvpSolution> {
        // ====== Step 1: Validation ======

        config.validate()?;
        scenario.validate()?;

        // ====== Step 2: Setup ======

        let model = scenario.model.as_ref();
        let boundary = scenario.boundary.as_ref();
        let n = scenario.dimension();
        let sides = boundary.sides();

        let mut z = scenario.z.clone();
        let mut y = scenario.guess.clone();
        let mut iterations = 0;
        let mut refinements = 0;
        let mut max_residual = f64::INFINITY;

        info!(
            model = scenario.model_name(),
            channels = n,
            nodes = z.len(),
            tolerance = config.tolerance,
            "starting boundary-value solve"
        );

        // ====== Step 3: Newton + mesh refinement ======

        let status = loop {
            let layout = Layout::new(n, z.len(), &sides);
            let parallel = n * z.len() >= config.parallel_threshold;

            let newton = newton(model, boundary, &layout, &z, &mut y, config, parallel);
            iterations += newton.iterations;
            if let Some(failure) = newton.failure {
                break failure;
            }

            let collocation = newton.collocation;
            let rms = rms_residuals(model, &z, &y, &collocation);
            max_residual = rms.iter().copied().fold(0.0, f64::max);
            let boundary_ok = collocation.bc.amax() <= config.boundary_tolerance;

            let added: usize = rms
                .iter()
                .map(|r| new_node_count(*r, config.tolerance))
                .sum();

            debug!(
                nodes = z.len(),
                max_residual,
                added,
                newton_converged = newton.converged,
                "collocation residuals"
            );

            if added == 0 {
                break if boundary_ok {
                    SolverStatus::Converged
                } else {
                    SolverStatus::NewtonDidNotConverge
                };
            }
            if z.len() + added > config.max_nodes {
                warn!(
                    nodes = z.len(),
                    required = z.len() + added,
                    max_nodes = config.max_nodes,
                    "mesh refinement stopped: node budget exhausted"
                );
                break SolverStatus::MaxNodesExceeded;
            }

            let (refined_z, refined_y) = refine_mesh(&z, &y, &collocation.f, &rms, config.tolerance);
            z = refined_z;
            y = refined_y;
            refinements += 1;
        };

        // ====== Step 4: Build Result ======

        let nodes = z.len();
        let mut solution = BvpSolution::new(z, y, status);
        solution.iterations = iterations;
        solution.max_residual = max_residual;
        solution.add_metadata("solver", self.name());
        solution.add_metadata("model", scenario.model_name());
        solution.add_metadata("nodes", &nodes.to_string());
        solution.add_metadata("mesh refinements", &refinements.to_string());
        solution.add_metadata("newton iterations", &iterations.to_string());

        if status.is_success() {
            info!(nodes, iterations, max_residual, "boundary-value solve converged");
        } else {
            warn!(%status, nodes, iterations, max_residual, "boundary-value solve failed");
        }

        Ok(solution)
    }

    fn name(&self) -> &str {
        "Lobatto IIIA collocation"
    }
}

// =================================================================================================
// Collocation residuals
// =================================================================================================

/// Everything evaluated from one iterate
#[derive(Debug, Clone)]
struct Collocation {
    /// f at the nodes, n × m
    f: DMatrix<f64>,
    z_mid: DVector<f64>,
    /// Cubic at the interval midpoints, n × (m − 1)
    y_mid: DMatrix<f64>,
    f_mid: DMatrix<f64>,
    /// Collocation residuals, n × (m − 1)
    residual: DMatrix<f64>,
    /// Boundary residuals, n
    bc: DVector<f64>,
}

fn collocate(
    model: &dyn RateEquationModel,
    boundary: &dyn BoundaryConditions,
    z: &DVector<f64>,
    y: &DMatrix<f64>,
) -> Collocation {
    let (n, m) = y.shape();
    let f = model.derivative(z, y);

    let z_mid = DVector::from_fn(m - 1, |j, _| 0.5 * (z[j] + z[j + 1]));
    let y_mid = DMatrix::from_fn(n, m - 1, |i, j| {
        let h = z[j + 1] - z[j];
        0.5 * (y[(i, j)] + y[(i, j + 1)]) - h / 8.0 * (f[(i, j + 1)] - f[(i, j)])
    });
    let f_mid = model.derivative(&z_mid, &y_mid);

    let residual = DMatrix::from_fn(n, m - 1, |i, j| {
        let h = z[j + 1] - z[j];
        y[(i, j + 1)] - y[(i, j)] - h / 6.0 * (f[(i, j)] + 4.0 * f_mid[(i, j)] + f[(i, j + 1)])
    });

    let bc = boundary.residual(&y.column(0).into_owned(), &y.column(m - 1).into_owned());

    Collocation {
        f,
        z_mid,
        y_mid,
        f_mid,
        residual,
        bc,
    }
}

/// Newton's stopping test on the current mesh
fn residuals_converged(collocation: &Collocation, z: &DVector<f64>, config: &SolverConfiguration) -> bool {
    let collocation_ok = collocation
        .residual
        .column_iter()
        .zip(collocation.f_mid.column_iter())
        .enumerate()
        .all(|(j, (r, f))| {
            let limit = NEWTON_RESIDUAL_FRACTION * (z[j + 1] - z[j]) * config.tolerance;
            r.iter().zip(f.iter()).all(|(r, f)| r.abs() < limit * (1.0 + f.abs()))
        });
    collocation_ok && collocation.bc.amax() <= config.boundary_tolerance
}

// =================================================================================================
// Global System
// =================================================================================================

/// Row and column numbering of the global Newton system
struct Layout {
    n: usize,
    m: usize,
    /// Boundary rows pinned at z = 0, in residual order
    start_rows: Vec<usize>,
    /// Boundary rows pinned at z = L
    end_rows: Vec<usize>,
}

impl Layout {
    fn new(n: usize, m: usize, sides: &[BoundarySide]) -> Self {
        let (start_rows, end_rows): (Vec<usize>, Vec<usize>) =
            (0..n).partition(|i| sides[*i] == BoundarySide::Start);
        Self {
            n,
            m,
            start_rows,
            end_rows,
        }
    }

    fn size(&self) -> usize {
        self.n * self.m
    }

    fn lower_bandwidth(&self) -> usize {
        self.start_rows.len() + self.n - 1
    }

    fn upper_bandwidth(&self) -> usize {
        2 * self.n - 1 - self.start_rows.len()
    }

    fn collocation_row(&self, interval: usize, component: usize) -> usize {
        self.start_rows.len() + interval * self.n + component
    }

    fn end_row(&self, k: usize) -> usize {
        self.start_rows.len() + (self.m - 1) * self.n + k
    }

    fn unknown(&self, node: usize, component: usize) -> usize {
        node * self.n + component
    }

    /// Residuals in global row order
    fn residual_vector(&self, collocation: &Collocation) -> Vec<f64> {
        let mut residual = vec![0.0; self.size()];
        for (k, &i) in self.start_rows.iter().enumerate() {
            residual[k] = collocation.bc[i];
        }
        for j in 0..self.m - 1 {
            for i in 0..self.n {
                residual[self.collocation_row(j, i)] = collocation.residual[(i, j)];
            }
        }
        for (k, &i) in self.end_rows.iter().enumerate() {
            residual[self.end_row(k)] = collocation.bc[i];
        }
        residual
    }

    /// Unknown vector back to an n × m matrix
    fn to_matrix(&self, unknowns: &[f64]) -> DMatrix<f64> {
        DMatrix::from_column_slice(self.n, self.m, unknowns)
    }

    fn jacobian(
        &self,
        z: &DVector<f64>,
        node_jacobians: &[DMatrix<f64>],
        mid_jacobians: &[DMatrix<f64>],
        bc_start: &DMatrix<f64>,
        bc_end: &DMatrix<f64>,
    ) -> BandMatrix {
        let n = self.n;
        let mut matrix = BandMatrix::zeros(self.size(), self.lower_bandwidth(), self.upper_bandwidth());
        let identity = DMatrix::<f64>::identity(n, n);

        for (k, &i) in self.start_rows.iter().enumerate() {
            for c in 0..n {
                matrix.add(k, self.unknown(0, c), bc_start[(i, c)]);
            }
        }

        for j in 0..self.m - 1 {
            let h = z[j + 1] - z[j];
            let j_left = &node_jacobians[j];
            let j_right = &node_jacobians[j + 1];
            let j_mid = &mid_jacobians[j];

            // ∂y_mid/∂y_j and ∂y_mid/∂y_j+1
            let mid_left = &identity * 0.5 + j_left * (h / 8.0);
            let mid_right = &identity * 0.5 - j_right * (h / 8.0);

            let left = -&identity - (j_left + j_mid * mid_left * 4.0) * (h / 6.0);
            let right = &identity - (j_right + j_mid * mid_right * 4.0) * (h / 6.0);

            for r in 0..n {
                let row = self.collocation_row(j, r);
                for c in 0..n {
                    matrix.add(row, self.unknown(j, c), left[(r, c)]);
                    matrix.add(row, self.unknown(j + 1, c), right[(r, c)]);
                }
            }
        }

        for (k, &i) in self.end_rows.iter().enumerate() {
            for c in 0..n {
                matrix.add(self.end_row(k), self.unknown(self.m - 1, c), bc_end[(i, c)]);
            }
        }

        matrix
    }
}

// =================================================================================================
// Finite-difference Jacobians
// =================================================================================================

/// ∂f/∂y at every column of `y`, one n × n matrix per column
///
/// State variable k is perturbed at all columns at once, so the model is
/// called n times whatever the mesh size.
fn model_jacobians(
    model: &dyn RateEquationModel,
    z: &DVector<f64>,
    y: &DMatrix<f64>,
    f0: &DMatrix<f64>,
    parallel: bool,
) -> Vec<DMatrix<f64>> {
    let (n, m) = y.shape();

    let column = |k: usize| -> DMatrix<f64> {
        let mut perturbed = y.clone();
        let mut steps = vec![0.0; m];
        for (j, step) in steps.iter_mut().enumerate() {
            let value = y[(k, j)];
            let trial = value + FD_STEP * value.abs().max(1.0);
            // exactly representable step
            *step = trial - value;
            perturbed[(k, j)] = trial;
        }
        let mut difference = model.derivative(z, &perturbed) - f0;
        for (j, step) in steps.iter().enumerate() {
            difference.column_mut(j).iter_mut().for_each(|d| *d /= step);
        }
        difference
    };

    #[cfg(feature = "parallel")]
    let columns: Vec<DMatrix<f64>> = if parallel {
        (0..n).into_par_iter().map(&column).collect()
    } else {
        (0..n).map(&column).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let columns: Vec<DMatrix<f64>> = {
        let _ = parallel;
        (0..n).map(&column).collect()
    };

    (0..m)
        .map(|j| DMatrix::from_fn(n, n, |i, k| columns[k][(i, j)]))
        .collect()
}

/// ∂g/∂y(0) and ∂g/∂y(L)
fn boundary_jacobians(
    boundary: &dyn BoundaryConditions,
    start: &DVector<f64>,
    end: &DVector<f64>,
    g0: &DVector<f64>,
) -> (DMatrix<f64>, DMatrix<f64>) {
    let n = start.len();
    let mut d_start = DMatrix::zeros(g0.len(), n);
    let mut d_end = DMatrix::zeros(g0.len(), n);

    for k in 0..n {
        let mut shifted = start.clone();
        let step = FD_STEP * start[k].abs().max(1.0);
        shifted[k] += step;
        let step = shifted[k] - start[k];
        d_start.set_column(k, &((boundary.residual(&shifted, end) - g0) / step));

        let mut shifted = end.clone();
        let step = FD_STEP * end[k].abs().max(1.0);
        shifted[k] += step;
        let step = shifted[k] - end[k];
        d_end.set_column(k, &((boundary.residual(start, &shifted) - g0) / step));
    }

    (d_start, d_end)
}

// =================================================================================================
// Newton iterations
// =================================================================================================

struct NewtonOutcome {
    iterations: usize,
    converged: bool,
    failure: Option<SolverStatus>,
    /// Residuals of the final iterate
    collocation: Collocation,
}

/// Damped Newton iterations on a fixed mesh; `y` holds the final iterate
fn newton(
    model: &dyn RateEquationModel,
    boundary: &dyn BoundaryConditions,
    layout: &Layout,
    z: &DVector<f64>,
    y: &mut DMatrix<f64>,
    config: &SolverConfiguration,
    parallel: bool,
) -> NewtonOutcome {
    let mut collocation = collocate(model, boundary, z, y);
    let mut iterations = 0;

    // at least one step per mesh: the residual test is nearly absolute and
    // passes for any guess of low enough power
    while iterations < config.max_newton_iterations {
        if iterations > 0 && residuals_converged(&collocation, z, config) {
            break;
        }
        iterations += 1;

        let lu = match factorize_jacobian(model, boundary, layout, z, y, &collocation, parallel) {
            Some(lu) => lu,
            None => {
                return NewtonOutcome {
                    iterations,
                    converged: false,
                    failure: Some(SolverStatus::SingularJacobian),
                    collocation,
                };
            }
        };

        let step = lu.solve(&layout.residual_vector(&collocation));
        let cost = dot(&step, &step);
        let step = layout.to_matrix(&step);

        let mut damping = 1.0;
        let (trial_y, trial_collocation) = loop {
            let trial_y = &*y - &step * damping;
            let trial_collocation = collocate(model, boundary, z, &trial_y);
            let trial_step = lu.solve(&layout.residual_vector(&trial_collocation));
            let trial_cost = dot(&trial_step, &trial_step);

            if trial_cost < (1.0 - 2.0 * damping * ARMIJO_SIGMA) * cost || damping <= MIN_DAMPING {
                break (trial_y, trial_collocation);
            }
            damping *= BACKTRACKING_FACTOR;
        };

        if let Err(error) = validate_state(&trial_y, "Newton iterate") {
            warn!(%error, iterations, "Newton iterate is not finite");
            return NewtonOutcome {
                iterations,
                converged: false,
                failure: Some(SolverStatus::NonFinite),
                collocation,
            };
        }

        debug!(iterations, cost, damping, nodes = layout.m, "Newton step");
        *y = trial_y;
        collocation = trial_collocation;
    }

    let converged = residuals_converged(&collocation, z, config);
    if !converged {
        debug!(iterations, nodes = layout.m, "Newton iterations stopped before convergence");
    }

    NewtonOutcome {
        iterations,
        converged,
        failure: None,
        collocation,
    }
}

fn factorize_jacobian(
    model: &dyn RateEquationModel,
    boundary: &dyn BoundaryConditions,
    layout: &Layout,
    z: &DVector<f64>,
    y: &DMatrix<f64>,
    collocation: &Collocation,
    parallel: bool,
) -> Option<BandLu> {
    let node_jacobians = model_jacobians(model, z, y, &collocation.f, parallel);
    let mid_jacobians = model_jacobians(
        model,
        &collocation.z_mid,
        &collocation.y_mid,
        &collocation.f_mid,
        parallel,
    );
    let (bc_start, bc_end) = boundary_jacobians(
        boundary,
        &y.column(0).into_owned(),
        &y.column(layout.m - 1).into_owned(),
        &collocation.bc,
    );

    match layout
        .jacobian(z, &node_jacobians, &mid_jacobians, &bc_start, &bc_end)
        .factorize()
    {
        Ok(lu) => Some(lu),
        Err(singular) => {
            warn!(column = singular.column, nodes = layout.m, "singular collocation Jacobian");
            None
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// =================================================================================================
// Cubic interpolant and mesh refinement
// =================================================================================================

/// Value and slope of the Hermite cubic of one interval at t ∈ [0, 1]
fn hermite(y0: f64, y1: f64, f0: f64, f1: f64, h: f64, t: f64) -> (f64, f64) {
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    let d00 = 6.0 * t2 - 6.0 * t;
    let d10 = 3.0 * t2 - 4.0 * t + 1.0;
    let d01 = -6.0 * t2 + 6.0 * t;
    let d11 = 3.0 * t2 - 2.0 * t;

    let value = h00 * y0 + h10 * h * f0 + h01 * y1 + h11 * h * f1;
    let slope = (d00 * y0 + d01 * y1) / h + d10 * f0 + d11 * f1;
    (value, slope)
}

/// Cubic of every interval at the same relative position t
fn sample_intervals(z: &DVector<f64>, y: &DMatrix<f64>, f: &DMatrix<f64>, t: f64) -> (DVector<f64>, DMatrix<f64>, DMatrix<f64>) {
    let (n, m) = y.shape();
    let positions = DVector::from_fn(m - 1, |j, _| z[j] + t * (z[j + 1] - z[j]));
    let mut values = DMatrix::zeros(n, m - 1);
    let mut slopes = DMatrix::zeros(n, m - 1);
    for j in 0..m - 1 {
        let h = z[j + 1] - z[j];
        for i in 0..n {
            let (value, slope) = hermite(y[(i, j)], y[(i, j + 1)], f[(i, j)], f[(i, j + 1)], h, t);
            values[(i, j)] = value;
            slopes[(i, j)] = slope;
        }
    }
    (positions, values, slopes)
}

/// RMS of the relative residual (S' − f)/(1 + |f|) over every interval
///
/// Three-point Lobatto quadrature: the midpoint and ±√(3/7)·h/2 around it.
/// At the midpoint the residual equals 3/2·r_j/h.
fn rms_residuals(
    model: &dyn RateEquationModel,
    z: &DVector<f64>,
    y: &DMatrix<f64>,
    collocation: &Collocation,
) -> Vec<f64> {
    let m = z.len();
    let offset = 0.5 * (3.0f64 / 7.0).sqrt();

    let mut sums = vec![0.0; m - 1];
    for (j, sum) in sums.iter_mut().enumerate() {
        let h = z[j + 1] - z[j];
        let middle: f64 = collocation
            .residual
            .column(j)
            .iter()
            .zip(collocation.f_mid.column(j).iter())
            .map(|(r, f)| (1.5 * r / h / (1.0 + f.abs())).powi(2))
            .sum();
        *sum += 32.0 / 45.0 * middle;
    }

    for t in [0.5 - offset, 0.5 + offset] {
        let (positions, values, slopes) = sample_intervals(z, y, &collocation.f, t);
        let f = model.derivative(&positions, &values);
        for (j, sum) in sums.iter_mut().enumerate() {
            let side: f64 = slopes
                .column(j)
                .iter()
                .zip(f.column(j).iter())
                .map(|(s, f)| ((s - f) / (1.0 + f.abs())).powi(2))
                .sum();
            *sum += 49.0 / 90.0 * side;
        }
    }

    sums.into_iter().map(|s| (0.5 * s).sqrt()).collect()
}

fn new_node_count(residual: f64, tolerance: f64) -> usize {
    if residual.is_nan() || residual >= 100.0 * tolerance {
        2
    } else if residual > tolerance {
        1
    } else {
        0
    }
}

/// Split every interval whose residual exceeds the tolerance
fn refine_mesh(
    z: &DVector<f64>,
    y: &DMatrix<f64>,
    f: &DMatrix<f64>,
    rms: &[f64],
    tolerance: f64,
) -> (DVector<f64>, DMatrix<f64>) {
    let (n, m) = y.shape();
    let mut nodes: Vec<f64> = Vec::with_capacity(2 * m);
    let mut columns: Vec<DVector<f64>> = Vec::with_capacity(2 * m);

    for j in 0..m - 1 {
        nodes.push(z[j]);
        columns.push(y.column(j).into_owned());

        let fractions: &[f64] = match new_node_count(rms[j], tolerance) {
            0 => &[],
            1 => &[0.5],
            _ => &[1.0 / 3.0, 2.0 / 3.0],
        };
        let h = z[j + 1] - z[j];
        for &t in fractions {
            nodes.push(z[j] + t * h);
            columns.push(DVector::from_fn(n, |i, _| {
                hermite(y[(i, j)], y[(i, j + 1)], f[(i, j)], f[(i, j + 1)], h, t).0
            }));
        }
    }
    nodes.push(z[m - 1]);
    columns.push(y.column(m - 1).into_owned());

    debug!(from = m, to = nodes.len(), "refined mesh");
    (DVector::from_vec(nodes), DMatrix::from_columns(&columns))
}

// =================================================================================================
// Tests
// =================================================================================================
