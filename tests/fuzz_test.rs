/// Fuzzes the search by checking on many random grids that a path is found
/// exactly when the goal shares a region with the start, and that guided
/// searches return paths as cheap as an unguided one.
use glam::Vec2;
use navgrid::{AstarSearch, CellId, Connectivity, Grid, GridConfig, Heuristic, OpenWorld};
use rand::prelude::*;

const CONNECTIVITIES: [Connectivity; 3] = [
    Connectivity::FourDirectional,
    Connectivity::EightDirectional,
    Connectivity::EightDirectionalNoCornerCut,
];

fn random_grid(n: usize, rng: &mut StdRng, connectivity: Connectivity) -> Grid {
    let config = GridConfig::new(Vec2::ZERO, Vec2::splat(n as f32), 0.5, connectivity);
    let last = n * n - 1;
    let layout: String = (0..n * n)
        .map(|index| {
            let blocked = rng.gen_bool(0.4);
            if blocked && index != 0 && index != last {
                '1'
            } else {
                '0'
            }
        })
        .collect();
    Grid::build(&layout, &config, &OpenWorld).unwrap()
}

fn visualize_grid(grid: &Grid, start: CellId, end: CellId) {
    for y in (0..grid.count_y() as i32).rev() {
        for x in 0..grid.count_x() as i32 {
            let id = grid.cell_id(x, y).unwrap();
            if id == start {
                print!("S");
            } else if id == end {
                print!("G");
            } else if grid.cell(id).is_walkable() {
                print!(".");
            } else {
                print!("#");
            }
        }
        println!();
    }
}

#[test]
fn fuzz() {
    const N: usize = 10;
    const N_GRIDS: usize = 1000;
    let mut rng = StdRng::seed_from_u64(0);
    let solver = AstarSearch::default();
    for connectivity in CONNECTIVITIES {
        for _ in 0..N_GRIDS {
            let grid = random_grid(N, &mut rng, connectivity);
            let start = grid.cell_id(0, 0).unwrap();
            let end = grid.cell_id(N as i32 - 1, N as i32 - 1).unwrap();
            let reachable = grid.reachable(start, end);
            let path = solver.find_path(&grid, start, end).unwrap();
            // Show the grid if the search disagrees with the regions
            if path.is_empty() == reachable {
                println!("{:?}", connectivity);
                visualize_grid(&grid, start, end);
            }
            assert_eq!(!path.is_empty(), reachable);
            if reachable {
                assert_eq!(path.last(), Some(&end));
                let mut previous = start;
                for &step in &path {
                    assert!(grid.cell(previous).neighbours().any(|n| n == step));
                    assert!(grid.cell(step).is_walkable());
                    previous = step;
                }
            }
        }
    }
}

#[test]
fn fuzz_distance() {
    const N: usize = 8;
    const N_GRIDS: usize = 1000;
    let mut rng = StdRng::seed_from_u64(0);
    let dijkstra = AstarSearch::new(Heuristic::Manhattan, 0.0);
    let guided = AstarSearch::new(Heuristic::Manhattan, 1.0);
    let euclidean = AstarSearch::new(Heuristic::Euclidean, 1.0);
    for connectivity in CONNECTIVITIES {
        for _ in 0..N_GRIDS {
            let grid = random_grid(N, &mut rng, connectivity);
            let start = grid.cell_id(0, 0).unwrap();
            let end = grid.cell_id(N as i32 - 1, N as i32 - 1).unwrap();
            if !grid.reachable(start, end) {
                continue;
            }
            let reference = dijkstra.find_path(&grid, start, end).unwrap();
            let reference_cost = dijkstra.path_cost(&grid, start, &reference);
            let path = guided.find_path(&grid, start, end).unwrap();
            let cost = guided.path_cost(&grid, start, &path);
            if cost != reference_cost {
                println!("Astar cost: {cost}; Dijkstra cost: {reference_cost}");
                visualize_grid(&grid, start, end);
            }
            assert_eq!(cost, reference_cost);

            // Truncation can make the euclidean estimate slightly
            // inconsistent, so only its reach and lower bound are checked.
            let path = euclidean.find_path(&grid, start, end).unwrap();
            assert_eq!(path.last(), Some(&end));
            assert!(euclidean.path_cost(&grid, start, &path) >= reference_cost);
        }
    }
}
