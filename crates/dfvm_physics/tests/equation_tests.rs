// crates/dfvm_physics/tests/equation_tests.rs

//! 方程引擎集成测试
//!
//! # 测试覆盖
//!
//! - 稳态线性剖面与通量统计
//! - Dirichlet 单元逐步精确
//! - 通量面注入量
//! - 组装幂等
//! - 不收敛回滚与警告策略
//! - 计时钩子、JSON 配置、命名数组初值

use std::sync::Arc;
use std::time::Duration;

use dfvm_config::{
    BoundaryConfig, DfvmConfig, LinearSolverConfig, MaterialConfig, NonConvergencePolicy,
    WeighingMethod,
};
use dfvm_foundation::{DfvmError, GroupLabel, TimingLog};
use dfvm_grid::StructuredGrid;
use dfvm_physics::boundary::shift_boundary_faces;
use dfvm_physics::{Equation, EquationState, FlowComponent, PhysicsError};

// ============================================================================
// 测试辅助函数
// ============================================================================

fn make_grid(points_dims: [usize; 3], spacing: [f64; 3]) -> Arc<StructuredGrid> {
    Arc::new(StructuredGrid::new(points_dims, [0.0; 3], spacing).unwrap())
}

/// 非均匀初值
fn varied(n: usize) -> Vec<f64> {
    (0..n).map(|c| ((c * 7) % 11) as f64 * 0.1).collect()
}

/// 7 个单元沿 x 排列，左 0 右 10
fn steady_setup() -> Equation {
    let grid = make_grid([8, 2, 2], [1.0; 3]);
    let config = DfvmConfig::default()
        .with_time(5e6, 1e6)
        .with_material(MaterialConfig::uniform(1.0, 1.0))
        .with_boundary(
            BoundaryConfig::default()
                .with_dirichlet(GroupLabel::Left, 0.0)
                .with_dirichlet(GroupLabel::Right, 10.0),
        );
    Equation::from_config(grid, &config).unwrap()
}

// ============================================================================
// 稳态与通量
// ============================================================================

#[test]
fn test_steady_state_linear_profile() {
    let mut eq = steady_setup();
    eq.run().unwrap();

    for (i, &c) in eq.concentrations().iter().enumerate() {
        let expected = 10.0 * i as f64 / 6.0;
        assert!((c - expected).abs() < 1e-6, "cell {i}: {c} vs {expected}");
    }
    assert_eq!(eq.concentrations()[0], 0.0);
    assert_eq!(eq.concentrations()[6], 10.0);
}

#[test]
fn test_flow_rate_through_interior_faces() {
    let mut eq = steady_setup();
    eq.run().unwrap();

    // 浓度沿 +x 升高，流量沿 -x
    let expected = -10.0 / 6.0;
    for face in 1..7 {
        let rate = eq.faces_flow_rate(&[face], FlowComponent::Total).unwrap();
        assert!((rate - expected).abs() < 1e-5, "face {face}: {rate}");
    }

    let grid = eq.grid().clone();
    let right = grid.faces_group(GroupLabel::Right).unwrap();
    let shifted = shift_boundary_faces(&grid, right, 0).unwrap();
    assert_eq!(shifted, vec![6]);
    let rate = eq.faces_flow_rate(&shifted, FlowComponent::Total).unwrap();
    assert!((rate - expected).abs() < 1e-5);

    // 均匀材料无表面扩散
    let surface = eq.faces_flow_rate(&shifted, FlowComponent::Surface).unwrap();
    assert_eq!(surface, 0.0);

    assert!(matches!(
        eq.faces_flow_rate(&[grid.faces_n()], FlowComponent::Free),
        Err(PhysicsError::Foundation(DfvmError::IndexOutOfBounds { .. }))
    ));
}

#[test]
fn test_flow_rate_scales_with_bulk_diffusivity() {
    let grid = make_grid([8, 2, 2], [1.0; 3]);
    let boundary = BoundaryConfig::default()
        .with_dirichlet(GroupLabel::Left, 0.0)
        .with_dirichlet(GroupLabel::Right, 10.0);
    let rate_with = |d: f64| {
        let config = DfvmConfig::default()
            .with_time(5e6, 1e6)
            .with_material(MaterialConfig::uniform(d, 1.0))
            .with_boundary(boundary.clone());
        let mut eq = Equation::from_config(grid.clone(), &config).unwrap();
        eq.run().unwrap();
        eq.faces_flow_rate(&[3], FlowComponent::Total).unwrap()
    };

    // 稳态剖面与 D 无关，流量与 D 成正比
    let unit = rate_with(1.0);
    let scaled = rate_with(4.0);
    assert!((unit + 10.0 / 6.0).abs() < 1e-5, "{unit}");
    assert!((scaled - 4.0 * unit).abs() < 1e-5, "{scaled} vs {unit}");
}

#[test]
fn test_flow_components_add_up() {
    let grid = make_grid([5, 2, 2], [1.0; 3]);
    let material = MaterialConfig {
        d_coeff: dfvm_config::LinearLaw::constant(1.0),
        d_free_matrix: dfvm_config::LinearLaw::constant(1.0),
        d_surf_matrix: dfvm_config::LinearLaw::constant(0.5),
        poro_matrix: 0.5,
        ..MaterialConfig::default()
    };
    let config = DfvmConfig::default()
        .with_time(1.0, 1.0)
        .with_material(material);
    let mut eq = Equation::from_config(grid, &config).unwrap();
    eq.set_initial_concentrations(&[0.0, 1.0, 2.0, 3.0]).unwrap();
    eq.step().unwrap();

    let faces = [1, 2, 3];
    let total = eq.faces_flow_rate(&faces, FlowComponent::Total).unwrap();
    let free = eq.faces_flow_rate(&faces, FlowComponent::Free).unwrap();
    let surface = eq.faces_flow_rate(&faces, FlowComponent::Surface).unwrap();
    assert!(total < 0.0);
    assert!((total - (free + surface)).abs() < 1e-12);
    assert!((surface - 0.5 * free).abs() < 1e-12);
}

// ============================================================================
// 边界条件
// ============================================================================

#[test]
fn test_dirichlet_exact_each_step() {
    let grid = make_grid([5, 3, 3], [1.0; 3]);
    let config = DfvmConfig::default()
        .with_time(4.0, 1.0)
        .with_material(MaterialConfig::uniform(0.3, 0.5))
        .with_boundary(BoundaryConfig::default().with_dirichlet(GroupLabel::Left, 2.0));
    let mut eq = Equation::from_config(grid.clone(), &config).unwrap();
    eq.set_initial_concentrations(&varied(grid.cells_n())).unwrap();

    let left: Vec<usize> = grid.cells_group(GroupLabel::Left).unwrap().to_vec();
    assert_eq!(left.len(), 4);

    eq.step().unwrap();
    assert!(left.iter().all(|&c| eq.concentrations()[c] == 2.0));

    eq.set_dirichlet_value(GroupLabel::Left, 3.0).unwrap();
    eq.step().unwrap();
    assert!(left.iter().all(|&c| eq.concentrations()[c] == 3.0));
    for snapshot in eq.concs_time() {
        assert!(left.iter().all(|&c| snapshot[c] >= 2.0));
    }

    assert!(matches!(
        eq.set_dirichlet_value(GroupLabel::Right, 1.0),
        Err(PhysicsError::Foundation(DfvmError::UnknownGroup { .. }))
    ));
}

#[test]
fn test_flux_injection_amount() {
    let grid = make_grid([5, 2, 2], [1.0; 3]);
    let config = DfvmConfig::default()
        .with_time(2.0, 0.5)
        .with_material(MaterialConfig::uniform(1.0, 1.0))
        .with_boundary(BoundaryConfig::default().with_flux(GroupLabel::Left, 0.5));
    let mut eq = Equation::from_config(grid, &config).unwrap();
    assert_eq!(eq.total_amount(), 0.0);

    let reports = eq.run().unwrap();
    assert_eq!(reports.len(), 4);
    // 每步注入 q·dt
    assert!((eq.total_amount() - 1.0).abs() < 1e-9);
    // 注入端浓度最高
    let c = eq.concentrations();
    assert!(c[0] > c[1] && c[1] > c[2] && c[2] > c[3]);
}

#[test]
fn test_flux_on_inactive_face_rejected() {
    let mut grid = StructuredGrid::new([5, 2, 2], [0.0; 3], [1.0; 3]).unwrap();
    grid.set_active_cells(&[0, 1]).unwrap();
    let config = DfvmConfig::default()
        .with_boundary(BoundaryConfig::default().with_flux(GroupLabel::Right, 1.0));
    assert!(Equation::from_config(Arc::new(grid), &config).is_err());
}

// ============================================================================
// 组装与状态
// ============================================================================

#[test]
fn test_rebuild_is_idempotent() {
    let grid = make_grid([5, 4, 3], [1.0, 0.5, 2.0]);
    let material = MaterialConfig {
        d_free_matrix: dfvm_config::LinearLaw([0.2, 0.1]),
        d_surf_matrix: dfvm_config::LinearLaw([0.0, 0.05]),
        ..MaterialConfig::default()
    };
    let config = DfvmConfig::default()
        .with_material(material)
        .with_weighing(WeighingMethod::MeanHarmonic)
        .with_boundary(BoundaryConfig::default().with_dirichlet(GroupLabel::Top, 1.0));
    let mut eq = Equation::from_config(grid.clone(), &config).unwrap();
    eq.set_initial_concentrations(&varied(grid.cells_n())).unwrap();

    eq.rebuild_system(0.5).unwrap();
    let matrix = eq.matrix().clone();
    let rhs = eq.rhs().to_vec();
    eq.rebuild_system(0.5).unwrap();
    assert_eq!(eq.matrix(), &matrix);
    assert_eq!(eq.rhs(), rhs.as_slice());
    assert_eq!(eq.state(), EquationState::Constructed);
    assert!(eq.times().is_empty());
}

#[test]
fn test_run_until_finished() {
    let grid = make_grid([4, 4, 4], [1.0; 3]);
    let config = DfvmConfig::default().with_time(1.0, 0.3);
    let mut eq = Equation::from_config(grid, &config).unwrap();
    eq.set_uniform_concentration(1.0).unwrap();

    let reports = eq.run().unwrap();
    assert_eq!(reports.len(), 4);
    assert!((reports[3].dt - 0.1).abs() < 1e-12);
    assert!((eq.time() - 1.0).abs() < 1e-12);
    assert_eq!(eq.times().len(), 4);
    assert_eq!(eq.concs_time().len(), 4);
    assert_eq!(eq.state(), EquationState::Finished);
    assert_eq!(eq.steps_remaining(), 0);
    assert!(matches!(eq.step(), Err(PhysicsError::Finished { steps: 4 })));

    // 均匀场保持不变
    assert!(eq.concentrations().iter().all(|&c| (c - 1.0).abs() < 1e-12));
}

#[test]
fn test_initial_size_mismatch() {
    let grid = make_grid([4, 4, 4], [1.0; 3]);
    let mut eq = Equation::from_config(grid, &DfvmConfig::default()).unwrap();
    let err = eq.set_initial_concentrations(&[1.0; 3]).unwrap_err();
    assert!(matches!(err, PhysicsError::Foundation(DfvmError::SizeMismatch { .. })));
}

#[test]
fn test_initial_from_cells_array() {
    let mut grid = StructuredGrid::new([4, 2, 2], [0.0; 3], [1.0; 3]).unwrap();
    grid.cells_arrays_mut().insert("c0", vec![1.0, 2.0, 3.0]).unwrap();
    let config = DfvmConfig::default().with_time(1.0, 1.0);
    let mut eq = Equation::from_config(Arc::new(grid), &config).unwrap();

    eq.initial_from_cells_array("c0").unwrap();
    assert_eq!(eq.concentrations(), &[1.0, 2.0, 3.0]);
    assert!(matches!(
        eq.initial_from_cells_array("missing"),
        Err(PhysicsError::Foundation(DfvmError::NotFound { .. }))
    ));
}

// ============================================================================
// 不收敛处理
// ============================================================================

fn strict_solver(policy: NonConvergencePolicy) -> LinearSolverConfig {
    LinearSolverConfig {
        rtol: 1e-30,
        atol: 0.0,
        max_iter: 1,
        verbose: false,
        on_non_convergence: policy,
    }
}

#[test]
fn test_non_convergence_rolls_back() {
    let grid = make_grid([6, 6, 6], [1.0; 3]);
    let config = DfvmConfig::default()
        .with_time(2.0, 1.0)
        .with_material(MaterialConfig::uniform(1.0, 1.0))
        .with_solver(strict_solver(NonConvergencePolicy::Fail));
    let mut eq = Equation::from_config(grid.clone(), &config).unwrap();
    let initial = varied(grid.cells_n());
    eq.set_initial_concentrations(&initial).unwrap();
    let previous = eq.previous_concentrations().to_vec();

    match eq.step() {
        Err(PhysicsError::NotConverged {
            step,
            best_iterate,
            ..
        }) => {
            assert_eq!(step, 0);
            assert_eq!(best_iterate.len(), grid.cells_n());
        }
        other => panic!("expected NotConverged, got {other:?}"),
    }

    assert_eq!(eq.state(), EquationState::Constructed);
    assert_eq!((eq.i_curr(), eq.i_prev()), (0, 1));
    assert_eq!(eq.concentrations(), initial.as_slice());
    // 两块缓冲都恢复原样
    assert_eq!(eq.previous_concentrations(), previous.as_slice());
    assert_eq!(eq.time(), 0.0);
    assert!(eq.concs_time().is_empty());
    assert!(!eq.last_solve().unwrap().is_converged());
}

#[test]
fn test_non_convergence_warn_accepts_step() {
    let grid = make_grid([6, 6, 6], [1.0; 3]);
    let config = DfvmConfig::default()
        .with_time(2.0, 1.0)
        .with_material(MaterialConfig::uniform(1.0, 1.0))
        .with_solver(strict_solver(NonConvergencePolicy::Warn));
    let mut eq = Equation::from_config(grid.clone(), &config).unwrap();
    eq.set_initial_concentrations(&varied(grid.cells_n())).unwrap();

    let report = eq.step().unwrap();
    assert!(!report.solver.is_converged());
    assert_eq!(eq.state(), EquationState::Stepped { step: 0 });
    assert_eq!(eq.times(), &[1.0]);
}

// ============================================================================
// 钩子与配置
// ============================================================================

#[test]
fn test_timing_hook_records_phases() {
    let grid = make_grid([4, 4, 4], [1.0; 3]);
    let config = DfvmConfig::default().with_time(0.3, 0.1);
    let timings = TimingLog::new();
    let mut eq = Equation::from_config(grid, &config)
        .unwrap()
        .with_timing_hook(timings.clone());
    eq.run().unwrap();

    for name in ["betas", "alphas", "assemble", "solve"] {
        assert_eq!(timings.entry(name).map(|e| e.count), Some(3), "{name}");
    }

    eq.set_timing_hook(None);
    assert_eq!(timings.snapshot().len(), 4);
}

#[test]
fn test_closure_as_timing_hook() {
    let grid = make_grid([3, 3, 3], [1.0; 3]);
    let config = DfvmConfig::default().with_time(1.0, 1.0);
    let calls = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = calls.clone();
    let mut eq = Equation::from_config(grid, &config)
        .unwrap()
        .with_timing_hook(move |name: &'static str, _elapsed: Duration| sink.lock().push(name));
    eq.step().unwrap();
    assert_eq!(*calls.lock(), vec!["betas", "alphas", "assemble", "solve"]);
}

#[test]
fn test_json_config_end_to_end() {
    let json = r#"{
        "time": { "time_period": 4.0, "time_step": 1.0 },
        "material": {
            "d_coeff": [0.0, 1.0],
            "d_free_frac": [0.0, 1.0],
            "d_free_matrix": [0.0, 1.0],
            "d_surf_matrix": [0.0, 0.0],
            "poro_frac": 1.0,
            "poro_matrix": 1.0
        },
        "weighing": "upWind",
        "solver": { "rtol": 1e-12, "on_non_convergence": "warn" },
        "boundary": { "dirichlet": { "left": 1.0 } }
    }"#;
    let config: DfvmConfig = serde_json::from_str(json).unwrap();
    config.validate().unwrap();
    assert_eq!(config.weighing, WeighingMethod::UpWind);
    assert_eq!(config.solver.on_non_convergence, NonConvergencePolicy::Warn);

    let grid = make_grid([6, 2, 2], [1.0; 3]);
    let mut eq = Equation::from_config(grid, &config).unwrap();
    eq.run().unwrap();
    let c = eq.concentrations();
    assert_eq!(c[0], 1.0);
    assert!(c[1] > 0.0 && c[1] < 1.0);
    assert!(c.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_invalid_config_rejected() {
    let grid = make_grid([3, 3, 3], [1.0; 3]);
    let config = DfvmConfig::default().with_time(1.0, -0.5);
    assert!(matches!(
        Equation::from_config(grid, &config),
        Err(PhysicsError::Config(_))
    ));
}
