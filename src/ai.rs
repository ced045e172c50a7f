use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand_distr::{Distribution, UnitCircle};
use tracing::debug;

use crate::base::{Point, Vec2, RNG, dirs, sample};
use crate::entity::Agent;
use crate::grid::{Grid, clamp_to_field, resolve_step};
use crate::pathing::find_path;

//////////////////////////////////////////////////////////////////////////////

// Constants, in ticks at the nominal 60 Hz rate unless stated otherwise.

pub const SPAWN_DELAY: i32 = 180;

const TOGGLE_TICKS: i32 = 360;
const HUNT_TICKS: i32 = 360;
const HUNT_REPLAN: i32 = 30;
const ROAM_REPLAN: i32 = 45;

const WAYPOINT_RADIUS: f64 = 15.;
const HISTORY_SIZE: usize = 10;
const BACKTRACK_WINDOW: usize = 5;

const STUCK_LIMIT: i32 = 20;
const RELOCATE_RADII: [f64; 3] = [40., 60., 80.];
const RELOCATE_TRIES: i32 = 20;

const SAFE_ZONE_RADIUS: f64 = 60.;
const SAFE_ZONE_TICKS: i32 = 120;

//////////////////////////////////////////////////////////////////////////////

// AIState

// The mode owns its path state, so switching modes structurally drops any
// stale waypoints instead of relying on scattered clears.
#[derive(Debug)]
pub enum Mode {
    Roaming { path: VecDeque<Vec2>, replan: i32 },
    Hunting { path: VecDeque<Vec2>, replan: i32, left: i32 },
}

impl Mode {
    fn roaming() -> Self { Mode::Roaming { path: VecDeque::new(), replan: 0 } }

    fn hunting() -> Self { Mode::Hunting { path: VecDeque::new(), replan: 0, left: HUNT_TICKS } }
}

#[derive(Debug)]
pub struct AIState {
    pub mode: Mode,
    pub spawn: i32,
    pub toggle: i32,
    pub stuck: i32,
    pub safe_zone: i32,
    pub history: VecDeque<Point>,
    pub last_cell: Point,
}

impl AIState {
    pub fn new(spawn_delay: i32) -> Self {
        Self {
            mode: Mode::roaming(),
            spawn: -spawn_delay,
            toggle: 0,
            stuck: 0,
            safe_zone: 0,
            history: VecDeque::with_capacity(HISTORY_SIZE),
            last_cell: Point(-1, -1),
        }
    }

    pub fn hunting(&self) -> bool { matches!(self.mode, Mode::Hunting { .. }) }

    pub fn spawned(&self) -> bool { self.spawn >= SPAWN_DELAY }
}

//////////////////////////////////////////////////////////////////////////////

// Per-tick update

pub fn tick(agent: &mut Agent, grid: &Grid, target: Vec2, rng: &mut RNG) {
    // Staggered entry: do nothing at all until the spawn gate opens.
    if !agent.ai.spawned() {
        agent.ai.spawn += 1;
        return;
    }

    advance_mode(&mut agent.ai);
    steer(agent, grid, target, rng);

    let cell = grid.cell_at(agent.pos);
    note_cell(&mut agent.ai, cell);

    advance(agent, grid, rng);
    enforce_safe_zone(agent, grid);

    agent.pos = clamp_to_field(agent.pos, grid, agent.size);
}

// A full roaming stretch is guaranteed between hunts: the toggle only runs
// while roaming, and restarts from zero when a hunt ends.
fn advance_mode(ai: &mut AIState) {
    if ai.hunting() {
        let done = match &mut ai.mode {
            Mode::Hunting { left, .. } => { *left -= 1; *left <= 0 }
            Mode::Roaming { .. } => false,
        };
        if done {
            ai.toggle = 0;
            ai.mode = Mode::roaming();
        }
    } else {
        ai.toggle += 1;
        if ai.toggle >= TOGGLE_TICKS {
            ai.toggle = 0;
            ai.mode = Mode::hunting();
        }
    }
}

fn steer(agent: &mut Agent, grid: &Grid, target: Vec2, rng: &mut RNG) {
    let (pos, speed) = (agent.pos, agent.speed());
    let goal = grid.center_of(grid.goal);

    let steered = match &mut agent.ai.mode {
        Mode::Hunting { path, replan, .. } => {
            *replan += 1;
            if *replan >= HUNT_REPLAN || path.is_empty() {
                *replan = 0;
                *path = plan(grid, pos, target);
            }
            follow(path, pos)
        }
        Mode::Roaming { path, replan } => {
            *replan += 1;
            if *replan >= ROAM_REPLAN || path.is_empty() {
                *replan = 0;
                *path = plan(grid, pos, goal);
            }
            follow(path, pos)
        }
    };

    agent.dir = match steered {
        Some(dir) => dir,
        None if agent.ai.hunting() => hunt_fallback(pos, speed, grid, target, rng),
        None => roam_fallback(pos, speed, grid, goal, rng),
    };
}

// Cell path to pixel waypoints, skipping the cell we already stand in.
fn plan(grid: &Grid, from: Vec2, to: Vec2) -> VecDeque<Vec2> {
    let cells = find_path(grid, from, to);
    if cells.len() < 2 { return VecDeque::new(); }
    cells[1..].iter().map(|&c| grid.center_of(c)).collect()
}

fn follow(path: &mut VecDeque<Vec2>, pos: Vec2) -> Option<Vec2> {
    let head = *path.front()?;
    let mut to = head - pos;
    if to.len() < WAYPOINT_RADIUS {
        path.pop_front();
        if let Some(&next) = path.front() { to = next - pos; }
    }
    Some(to.normalized())
}

// No guidance from the search: probe farther ahead in the hunt so the
// agent commits to a direction, and scatter randomly as the last resort.
fn hunt_fallback(pos: Vec2, speed: f64, grid: &Grid, target: Vec2, rng: &mut RNG) -> Vec2 {
    probe_directions(pos, 2. * speed, grid, target).unwrap_or_else(|| {
        let options = [-1., 0., 1.];
        Vec2(*sample(&options, rng), *sample(&options, rng))
    })
}

fn roam_fallback(pos: Vec2, speed: f64, grid: &Grid, goal: Vec2, rng: &mut RNG) -> Vec2 {
    let direct = (goal - pos).normalized();
    if !grid.is_wall(pos + direct.scaled(speed)) { return direct; }

    probe_directions(pos, speed, grid, goal).unwrap_or_else(|| {
        let options = [-0.5, 0., 0.5];
        Vec2(*sample(&options, rng), *sample(&options, rng))
    })
}

// Evaluate the eight compass directions at the given step distance and
// take whichever collision-free probe lands closest to the target.
fn probe_directions(pos: Vec2, step: f64, grid: &Grid, target: Vec2) -> Option<Vec2> {
    let mut best = None;
    let mut best_distance = f64::INFINITY;
    for &d in &dirs::ALL {
        let dir = Vec2(d.0 as f64, d.1 as f64);
        let probe = pos + dir.scaled(step);
        if grid.is_wall(probe) { continue; }

        let distance = (probe - target).len();
        if distance < best_distance {
            best_distance = distance;
            best = Some(dir);
        }
    }
    best
}

fn note_cell(ai: &mut AIState, cell: Point) {
    if cell == ai.last_cell { return; }
    ai.history.push_back(cell);
    if ai.history.len() > HISTORY_SIZE { ai.history.pop_front(); }
    ai.last_cell = cell;
}

fn advance(agent: &mut Agent, grid: &Grid, rng: &mut RNG) {
    let next = clamp_to_field(
        agent.pos + agent.dir.scaled(agent.speed()), grid, agent.size);

    let hunting = agent.ai.hunting();
    let recent: Vec<Point> =
        agent.ai.history.iter().rev().take(BACKTRACK_WINDOW).copied().collect();
    let admit = |p: Vec2| hunting || !recent.contains(&grid.cell_at(p));

    // Recently-visited cells are a last resort, never a hard block.
    let step = resolve_step(grid, agent.pos, next, admit)
        .or_else(|| resolve_step(grid, agent.pos, next, |_| true));

    let Some(step) = step else {
        agent.ai.stuck += 1;
        if agent.ai.stuck > STUCK_LIMIT { escape(agent, grid, rng); }
        return;
    };
    agent.pos = step;
    agent.ai.stuck = 0;
}

//////////////////////////////////////////////////////////////////////////////

// Stuck recovery

// Three escalating direction sets, each shuffled; the first collision-free
// probe wins. Falling through all of them triggers the emergency relocate.
fn escape(agent: &mut Agent, grid: &Grid, rng: &mut RNG) {
    agent.ai.stuck = 0;
    agent.ai.history.clear();

    let speed = agent.speed();
    let doubles = [Point(2, 0), Point(-2, 0), Point(0, 2), Point(0, -2)];
    let sets = [dirs::CARDINAL, dirs::DIAGONAL, doubles];

    for set in sets {
        let mut set = set;
        set.shuffle(rng);
        for d in set {
            let step = Vec2(d.0 as f64, d.1 as f64).scaled(speed);
            let probe = clamp_to_field(agent.pos + step, grid, agent.size);
            if grid.is_wall(probe) { continue; }

            agent.pos = probe;
            agent.dir = Vec2(d.0.signum() as f64, d.1.signum() as f64);
            return;
        }
    }

    relocate(agent, grid, rng);
}

fn relocate(agent: &mut Agent, grid: &Grid, rng: &mut RNG) {
    for &radius in &RELOCATE_RADII {
        for _ in 0..RELOCATE_TRIES {
            let [dx, dy]: [f64; 2] = UnitCircle.sample(rng);
            let probe = clamp_to_field(
                agent.pos + Vec2(dx, dy).scaled(radius), grid, agent.size);
            if grid.is_wall(probe) { continue; }

            debug!(radius, "relocating wedged agent");
            agent.pos = probe;
            return;
        }
    }

    debug!("no free spot near wedged agent; returning it to start");
    agent.pos = grid.center_of(grid.start);
}

//////////////////////////////////////////////////////////////////////////////

// Safe zone

// Agents camping the goal could deny the target its win. After dwelling
// too long inside the zone, push the agent out and drop any hunt.
fn enforce_safe_zone(agent: &mut Agent, grid: &Grid) {
    let goal = grid.center_of(grid.goal);
    if (agent.pos - goal).len() >= SAFE_ZONE_RADIUS {
        agent.ai.safe_zone = 0;
        return;
    }

    agent.ai.safe_zone += 1;
    if agent.ai.safe_zone <= SAFE_ZONE_TICKS { return; }

    let away = |x: f64, g: f64| if x < g { -1. } else { 1. };
    agent.dir = Vec2(away(agent.pos.0, goal.0), away(agent.pos.1, goal.1));
    agent.ai.safe_zone = 0;
    agent.ai.toggle = 0;
    agent.ai.mode = Mode::roaming();
}
