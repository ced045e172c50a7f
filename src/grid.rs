use crate::base::{Matrix, Point, Rect, Vec2, clamp};

//////////////////////////////////////////////////////////////////////////////

// Terrain

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Terrain { Wall, Floor }

//////////////////////////////////////////////////////////////////////////////

// Grid
//
// Built once per round by mapgen and read-only afterwards. `scale` is the
// pixels-per-cell divisor shared by every pixel <-> cell conversion.

pub struct Grid {
    pub cells: Matrix<Terrain>,
    pub start: Point,
    pub goal: Point,
    pub scale: i32,
}

impl Grid {
    pub fn new(size: Point, scale: i32) -> Self {
        assert!(size.0 >= 3 && size.1 >= 3);
        assert!(size.0 % 2 == 1 && size.1 % 2 == 1);
        assert!(scale > 0);
        Self {
            cells: Matrix::new(size, Terrain::Wall),
            start: Point(1, 1),
            goal: Point(size.0 - 2, size.1 - 2),
            scale,
        }
    }

    pub fn size(&self) -> Point { self.cells.size }

    pub fn is_open(&self, p: Point) -> bool { self.cells.get(p) == Terrain::Floor }

    pub fn open(&mut self, p: Point) { self.cells.set(p, Terrain::Floor); }

    pub fn block(&mut self, p: Point) { self.cells.set(p, Terrain::Wall); }

    // Pixel <-> cell conversions

    // Transient sub-cell overshoots clamp into bounds instead of erroring.
    pub fn cell_at(&self, p: Vec2) -> Point {
        let Point(w, h) = self.size();
        let x = (p.0 / self.scale as f64).floor() as i32;
        let y = (p.1 / self.scale as f64).floor() as i32;
        Point(clamp(x, 0, w - 1), clamp(y, 0, h - 1))
    }

    pub fn center_of(&self, c: Point) -> Vec2 {
        let half = self.scale / 2;
        Vec2((c.0 * self.scale + half) as f64, (c.1 * self.scale + half) as f64)
    }

    pub fn pixel_size(&self) -> Vec2 {
        let Point(w, h) = self.size();
        Vec2((w * self.scale) as f64, (h * self.scale) as f64)
    }

    // Collision queries

    pub fn is_wall(&self, p: Vec2) -> bool {
        let x = (p.0 / self.scale as f64).floor() as i32;
        let y = (p.1 / self.scale as f64).floor() as i32;
        // Out of bounds counts as wall; Matrix defaults to Terrain::Wall.
        self.cells.get(Point(x, y)) == Terrain::Wall
    }

    pub fn is_goal(&self, p: Vec2) -> bool {
        let x = (p.0 / self.scale as f64).floor() as i32;
        let y = (p.1 / self.scale as f64).floor() as i32;
        Point(x, y) == self.goal
    }

    pub fn goal_rect(&self) -> Rect {
        let scale = self.scale as f64;
        let root = Vec2((self.goal.0 * self.scale) as f64, (self.goal.1 * self.scale) as f64);
        Rect { root, size: Vec2(scale, scale) }
    }
}

//////////////////////////////////////////////////////////////////////////////

// Movement primitives, shared by the player avatar and the agents.

pub fn clamp_to_field(p: Vec2, grid: &Grid, size: f64) -> Vec2 {
    let half = 0.5 * size;
    let Vec2(w, h) = grid.pixel_size();
    Vec2(clamp(p.0, half, w - half), clamp(p.1, half, h - half))
}

// Axis-separated step resolution: prefer the combined move, then x-only,
// then y-only. A candidate must clear both the caller's filter and the
// walls; no candidate means no movement this tick.
pub fn resolve_step<F: Fn(Vec2) -> bool>(
        grid: &Grid, pos: Vec2, next: Vec2, admit: F) -> Option<Vec2> {
    let candidates = [next, Vec2(next.0, pos.1), Vec2(pos.0, next.1)];
    for &candidate in &candidates {
        if !admit(candidate) { continue; }
        if grid.is_wall(candidate) { continue; }
        return Some(candidate);
    }
    None
}

//////////////////////////////////////////////////////////////////////////////
