// crates/dfvm_grid/tests/topology_tests.rs

//! 结构化网格拓扑集成测试

use dfvm_foundation::{DfvmError, GroupLabel, Zone};
use dfvm_grid::StructuredGrid;

// ============================================================
// 辅助函数
// ============================================================

fn make_grid(points_dims: [usize; 3]) -> StructuredGrid {
    StructuredGrid::new(points_dims, [0.0; 3], [0.1, 0.2, 0.3]).unwrap()
}

// ============================================================
// 邻接往返
// ============================================================

#[test]
fn test_every_cell_listed_by_its_faces() {
    for dims in [[2, 2, 2], [5, 3, 2], [4, 4, 4], [6, 2, 3]] {
        let grid = make_grid(dims);
        for cell in 0..grid.cells_n() {
            let faces = grid.neighbor_faces(cell);
            for (local, &face) in faces.iter().enumerate() {
                let slot = grid.slot_of(face, cell).expect("face must list its cell");
                assert_eq!(
                    grid.normals_cell_at_face(face)[slot],
                    grid.normals_face_at_cell(cell)[local]
                );
            }
            let mut sorted = faces.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), 6, "cell {cell} faces must be distinct");
        }
        grid.validate_topology().unwrap();
    }
}

#[test]
fn test_interior_faces_have_opposite_normals() {
    let grid = make_grid([4, 4, 4]);
    let mut interior = 0;
    for face in 0..grid.faces_n() {
        let cells = grid.neighbor_cells(face);
        let normals = grid.normals_cell_at_face(face);
        match cells.len() {
            1 => assert_eq!(normals, &[-1.0]),
            2 => {
                interior += 1;
                assert_eq!(normals[0] + normals[1], 0.0);
                assert!(cells[0] < cells[1]);
            }
            n => panic!("face {face} has {n} neighbors"),
        }
    }
    // 每个轴 2 个内部层，每层 9 个面
    assert_eq!(interior, 3 * 2 * 9);
}

#[test]
fn test_face_counts_match_dims() {
    let grid = make_grid([5, 3, 2]);
    let total: usize = (0..3)
        .map(|a| grid.faces_dims(a).iter().product::<usize>())
        .sum();
    assert_eq!(total, grid.faces_n());
    for face in 0..grid.faces_n() {
        let axis = grid.face_axis(face);
        assert!(axis < 3);
        // 两个相邻单元在该轴上相差一层
        if let [a, b] = grid.neighbor_cells(face) {
            let ca = grid.cell_coords(*a);
            let cb = grid.cell_coords(*b);
            assert_eq!(cb[axis], ca[axis] + 1);
        }
    }
}

// ============================================================
// 分组
// ============================================================

#[test]
fn test_side_groups() {
    let grid = make_grid([5, 3, 2]);
    let [cx, cy, cz] = grid.cells_dims();

    let left = grid.faces_group(GroupLabel::Left).unwrap();
    assert_eq!(left.len(), cy * cz);
    assert!(left.iter().all(|&f| grid.is_boundary_face(f) && grid.face_axis(f) == 0));

    let right_cells = grid.cells_group(GroupLabel::Right).unwrap();
    assert!(right_cells.iter().all(|&c| grid.cell_coords(c)[0] == cx - 1));

    let top = grid.faces_group(GroupLabel::Top).unwrap();
    assert_eq!(top.len(), cx * cy);

    let total: usize = GroupLabel::SIDES
        .iter()
        .map(|&s| grid.faces_group(s).unwrap().len())
        .sum();
    let boundary = (0..grid.faces_n()).filter(|&f| grid.is_boundary_face(f)).count();
    assert_eq!(total, boundary);
}

#[test]
fn test_active_region_classification() {
    let mut grid = make_grid([4, 2, 2]);
    // 3 个单元排成一行，只激活前两个
    grid.set_active_cells(&[0, 1]).unwrap();

    assert_eq!(grid.cells_group(GroupLabel::Inactive).unwrap(), &[2]);
    let nonbound = grid.faces_group(GroupLabel::ActiveNonbound).unwrap();
    assert_eq!(nonbound, &[1]);

    let bound = grid.faces_group(GroupLabel::ActiveBound).unwrap();
    // x: 面 0 与 面 2（与非活动单元相邻）；y、z 各 4 个
    assert_eq!(bound.len(), 2 + 4 + 4);
    assert!(bound.contains(&2));
    assert!(!bound.contains(&3));
}

#[test]
fn test_unregistered_groups() {
    let mut grid = make_grid([3, 3, 2]);
    assert_eq!(
        grid.cells_group(GroupLabel::Matrix).unwrap_err(),
        DfvmError::unknown_group(GroupLabel::Matrix)
    );
    assert!(grid.faces_group(GroupLabel::Inactive).is_err());

    grid.set_matrix_mask(&[true, false, true, false]).unwrap();
    assert_eq!(grid.cells_group(GroupLabel::Matrix).unwrap(), &[0, 2]);
    assert_eq!(grid.cells_group(GroupLabel::Fracture).unwrap(), &[1, 3]);
    assert_eq!(grid.zone(1), Zone::Fracture);
}

#[test]
fn test_active_cell_out_of_range() {
    let mut grid = make_grid([2, 2, 2]);
    let err = grid.set_active_cells(&[3]).unwrap_err();
    assert!(matches!(err, DfvmError::IndexOutOfBounds { index: 3, .. }));
}

// ============================================================
// 命名数组
// ============================================================

#[test]
fn test_named_arrays() {
    let mut grid = make_grid([3, 2, 2]);
    let cells_n = grid.cells_n();
    grid.cells_arrays_mut()
        .insert("concs_ini", vec![1.0; cells_n])
        .unwrap();
    assert_eq!(grid.cells_arrays().get("concs_ini").unwrap().len(), cells_n);

    let faces_n = grid.faces_n();
    assert!(grid.faces_arrays_mut().insert("flux", vec![0.0; faces_n + 1]).is_err());
    assert_eq!(grid.points_arrays().len(), grid.points_n());

    // 节点坐标 x 按节点序写入
    let points_n = grid.points_n();
    let xs: Vec<f64> = (0..points_n).map(|p| (p % 3) as f64).collect();
    grid.points_arrays_mut().insert("x", xs.clone()).unwrap();
    assert_eq!(grid.points_arrays().get("x").unwrap(), xs.as_slice());
    assert!(matches!(
        grid.points_arrays_mut().insert("y", vec![0.0; cells_n]),
        Err(DfvmError::SizeMismatch { .. })
    ));
}
