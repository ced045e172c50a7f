use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::base::{HashMap, Matrix, Point, Vec2, dirs};
use crate::grid::Grid;

//////////////////////////////////////////////////////////////////////////////

// BFS (breadth-first search), used by mapgen to measure and rebuild mazes.

const UNKNOWN: i32 = -1;

fn bfs_distances(grid: &Grid, source: Point, target: Point) -> Option<Matrix<i32>> {
    let mut distances = Matrix::new(grid.size(), UNKNOWN);
    if !grid.is_open(source) { return None; }
    distances.set(source, 0);

    let mut i = 1;
    let mut prev: Vec<Point> = vec![source];
    let mut next: Vec<Point> = vec![];

    while !prev.is_empty() {
        for &pp in &prev {
            for dir in &dirs::CARDINAL {
                let np = pp + *dir;
                if distances.get(np) != UNKNOWN { continue; }
                if !grid.is_open(np) { continue; }

                distances.set(np, i);
                if np == target { return Some(distances); }
                next.push(np);
            }
        }
        std::mem::swap(&mut next, &mut prev);
        next.clear();
        i += 1;
    }

    if source == target { return Some(distances); }
    None
}

// Number of steps on the shortest start-to-goal walk, or None if the goal
// is unreachable.
pub fn bfs_length(grid: &Grid, source: Point, target: Point) -> Option<i32> {
    let distances = bfs_distances(grid, source, target)?;
    Some(distances.get(target))
}

// The shortest path as a cell sequence, source first. Reconstructed by
// walking the distance field backwards from the target.
pub fn bfs_path(grid: &Grid, source: Point, target: Point) -> Option<Vec<Point>> {
    let distances = bfs_distances(grid, source, target)?;

    let mut result = vec![target];
    let mut current = target;
    let mut i = distances.get(target);
    while i > 0 {
        for dir in &dirs::CARDINAL {
            let np = current + *dir;
            if distances.get(np) != i - 1 { continue; }
            result.push(np);
            current = np;
            break;
        }
        i -= 1;
    }
    result.reverse();
    Some(result)
}

//////////////////////////////////////////////////////////////////////////////

// A* for pathfinding to a known cell. Unit edge cost, 4-connectivity,
// taxicab heuristic. Ties on the f-score break by heap insertion order,
// which makes repeated searches over an unmodified grid deterministic.

struct SearchNode {
    pos: Point,
    parent: i32,
    distance: i32,
}

pub fn astar(grid: &Grid, source: Point, target: Point) -> Option<Vec<Point>> {
    let mut nodes: Vec<SearchNode> = vec![];
    let mut best: HashMap<Point, i32> = HashMap::default();
    let mut heap: BinaryHeap<Reverse<(i32, i32)>> = BinaryHeap::new();

    let score = (target - source).len_taxicab();
    nodes.push(SearchNode { pos: source, parent: -1, distance: 0 });
    best.insert(source, 0);
    heap.push(Reverse((score, 0)));

    while let Some(Reverse((_, index))) = heap.pop() {
        let SearchNode { pos, distance, .. } = nodes[index as usize];
        if best.get(&pos) != Some(&distance) { continue; }

        if pos == target {
            let mut result = vec![];
            let mut current = index;
            while current >= 0 {
                result.push(nodes[current as usize].pos);
                current = nodes[current as usize].parent;
            }
            result.reverse();
            return Some(result);
        }

        for dir in &dirs::CARDINAL {
            let np = pos + *dir;
            if !grid.is_open(np) { continue; }

            let next = distance + 1;
            if let Some(&seen) = best.get(&np) {
                if seen <= next { continue; }
            }

            best.insert(np, next);
            let score = next + (target - np).len_taxicab();
            nodes.push(SearchNode { pos: np, parent: index, distance: next });
            heap.push(Reverse((score, nodes.len() as i32 - 1)));
        }
    }

    None
}

//////////////////////////////////////////////////////////////////////////////

// Pixel-level entry points.
//
// No path is never an error: callers receive an empty sequence and fall
// back to local greedy movement.

pub fn find_path(grid: &Grid, from: Vec2, to: Vec2) -> Vec<Point> {
    let scale = grid.scale as f64;
    let source = Point((from.0 / scale).floor() as i32, (from.1 / scale).floor() as i32);
    let target = Point((to.0 / scale).floor() as i32, (to.1 / scale).floor() as i32);
    if !grid.cells.contains(source) || !grid.cells.contains(target) { return vec![]; }

    astar(grid, source, target).unwrap_or_default()
}

// Start-to-goal display path as pixel centers. When the search comes back
// empty the two endpoint centers stand in, so the recap animation always
// has a segment to draw.
pub fn solution_path(grid: &Grid) -> Vec<Vec2> {
    let (start, goal) = (grid.center_of(grid.start), grid.center_of(grid.goal));
    let cells = find_path(grid, start, goal);
    if cells.len() < 2 { return vec![start, goal]; }
    cells.into_iter().map(|c| grid.center_of(c)).collect()
}

//////////////////////////////////////////////////////////////////////////////
