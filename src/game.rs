use std::collections::VecDeque;

use lazy_static::lazy_static;
use rand::SeedableRng;
use tracing::debug;

use crate::ai;
use crate::base::{HashMap, Rect, Vec2, RNG, clamp};
use crate::entity::{AID, AgentArgs, AgentMap};
use crate::grid::{Grid, clamp_to_field, resolve_step};
use crate::mapgen::{MazegenConfig, mazegen};
use crate::pathing::solution_path;

//////////////////////////////////////////////////////////////////////////////

// Constants

pub const TICK_RATE: i32 = 60;
pub const PLAYER_SPEED: f64 = 3.;

const PLAYER_SIZE_FACTOR: f64 = 0.8;
const AGENT_SIZE_FACTOR: f64 = 0.7;
const ROAM_SPEED_FACTOR: f64 = 0.15;
const TRAIL_LIMIT: usize = 50;
const SPAWN_STAGGER: i32 = ai::SPAWN_DELAY;

//////////////////////////////////////////////////////////////////////////////

// Difficulty presets

pub struct Preset {
    pub name: &'static str,
    pub agents: usize,
    pub hunt_factor: f64,
    pub scale: i32,
}

lazy_static! {
    static ref PRESETS: HashMap<i32, Preset> = {
        let items = [
            (1, "Easy",   1, 1.15, 20),
            (2, "Medium", 2, 1.20, 15),
            (3, "Hard",   3, 1.25, 10),
        ];
        let mut result = HashMap::default();
        for (level, name, agents, hunt_factor, scale) in items {
            result.insert(level, Preset { name, agents, hunt_factor, scale });
        }
        result
    };
}

impl Preset {
    pub fn get(level: i32) -> &'static Preset {
        PRESETS.get(&clamp(level, 1, 3)).unwrap()
    }
}

//////////////////////////////////////////////////////////////////////////////

// Config

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub width: i32,
    pub height: i32,
    pub difficulty: i32,
    pub base_speed: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self { width: 800, height: 720, difficulty: 1, base_speed: PLAYER_SPEED }
    }
}

//////////////////////////////////////////////////////////////////////////////

// Player avatar. The outer loop resolves keys to a movement delta; the
// avatar resolves that delta against the maze and keeps the telemetry the
// HUD shows (distance) and the fading breadcrumb trail.

pub struct Player {
    pub pos: Vec2,
    pub size: f64,
    pub trail: VecDeque<Vec2>,
    pub distance: f64,
}

impl Player {
    pub fn new(grid: &Grid) -> Self {
        Self {
            pos: grid.center_of(grid.start),
            size: grid.scale as f64 * PLAYER_SIZE_FACTOR,
            trail: VecDeque::with_capacity(TRAIL_LIMIT),
            distance: 0.,
        }
    }

    pub fn rect(&self) -> Rect { Rect::centered(self.pos, self.size) }

    pub fn step(&mut self, grid: &Grid, delta: Vec2) {
        let next = clamp_to_field(self.pos + delta, grid, self.size);
        let Some(next) = resolve_step(grid, self.pos, next, |_| true) else { return; };
        if next == self.pos { return; }

        self.trail.push_back(self.pos);
        if self.trail.len() > TRAIL_LIMIT { self.trail.pop_front(); }
        self.distance += (next - self.pos).len();
        self.pos = next;
    }
}

//////////////////////////////////////////////////////////////////////////////

// RoundState

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome { GoalReached, Captured(AID) }

// One round of play, owned by the outer loop. Resetting a round means
// building a fresh RoundState and dropping this one; the grid is never
// mutated once the round is underway.
pub struct RoundState {
    pub config: Config,
    pub grid: Grid,
    pub player: Player,
    pub agents: AgentMap,
    pub solution: Vec<Vec2>,
    pub ticks: i32,
    rng: RNG,
}

impl RoundState {
    pub fn new(config: Config, seed: Option<u64>) -> Self {
        let rng = seed.map(RNG::seed_from_u64);
        let mut rng = rng.unwrap_or_else(RNG::from_entropy);

        let preset = Preset::get(config.difficulty);
        let gen = MazegenConfig {
            width: config.width,
            height: config.height,
            scale: preset.scale,
            ..Default::default()
        };
        let grid = mazegen(&gen, &mut rng);
        let solution = solution_path(&grid);
        let player = Player::new(&grid);

        let mut agents = AgentMap::default();
        for i in 0..preset.agents {
            let args = AgentArgs {
                pos: grid.center_of(grid.start),
                size: preset.scale as f64 * AGENT_SIZE_FACTOR,
                roam_speed: config.base_speed * ROAM_SPEED_FACTOR,
                hunt_speed: config.base_speed * preset.hunt_factor,
                spawn_delay: i as i32 * SPAWN_STAGGER,
            };
            agents.add(&args, &mut rng);
        }
        debug!(difficulty = config.difficulty, agents = preset.agents, "round built");

        Self { config, grid, player, agents, solution, ticks: 0, rng }
    }

    // One fixed 60 Hz tick: resolve the player's move, then every live
    // agent, then the goal and capture checks. Everything runs to
    // completion synchronously.
    pub fn update(&mut self, delta: Vec2) -> Option<Outcome> {
        self.ticks += 1;
        let Self { grid, player, agents, rng, .. } = self;

        player.step(grid, delta);
        if grid.goal_rect().intersects(&player.rect()) {
            return Some(Outcome::GoalReached);
        }

        let target = player.pos;
        for (_, agent) in agents.iter_mut() {
            agent.tick(grid, target, rng);
        }

        let rect = player.rect();
        for (aid, agent) in agents.iter() {
            if agent.spawned() && agent.collides_with(&rect) {
                return Some(Outcome::Captured(aid));
            }
        }
        None
    }

    // Externally-driven tag: remove the topmost spawned agent under the
    // point, if any.
    pub fn capture_at(&mut self, point: Vec2) -> Option<AID> {
        let hit = self.agents.iter()
            .find(|(_, a)| a.spawned() && a.rect().contains(point))
            .map(|(aid, _)| aid)?;
        self.agents.remove(hit);
        Some(hit)
    }

    pub fn elapsed_seconds(&self) -> f64 { self.ticks as f64 / TICK_RATE as f64 }

    pub fn live_agents(&self) -> usize {
        self.agents.iter().filter(|(_, a)| a.spawned()).count()
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Mode, SPAWN_DELAY};
    use crate::base::Point;
    use crate::grid::Terrain;

    const NUM_SEEDS: u64 = 8;
    const NUM_STEPS: i32 = 600;

    fn small_config() -> Config {
        Config { width: 420, height: 420, difficulty: 1, base_speed: PLAYER_SPEED }
    }

    #[test]
    fn test_preset_table() {
        for level in 1..=3 {
            let preset = Preset::get(level);
            assert_eq!(preset.agents, level as usize);
        }
        assert_eq!(Preset::get(1).scale, 20);
        assert_eq!(Preset::get(2).scale, 15);
        assert_eq!(Preset::get(3).scale, 10);
        assert_eq!(Preset::get(0).name, "Easy");
        assert_eq!(Preset::get(9).name, "Hard");
    }

    #[test]
    fn test_round_layout_and_solution() {
        let state = RoundState::new(small_config(), Some(17));
        assert_eq!(state.grid.size(), Point(21, 21));
        assert_eq!(state.grid.start, Point(1, 1));
        assert_eq!(state.grid.goal, Point(19, 19));

        let path = &state.solution;
        assert!(path.len() >= 2);
        assert_eq!(path[0], Vec2(30., 30.));
        assert_eq!(*path.last().unwrap(), Vec2(390., 390.));
        for pair in path.windows(2) {
            // Consecutive waypoints are centers of 4-adjacent cells.
            assert_eq!((pair[1] - pair[0]).len(), 20.);
        }
    }

    #[test]
    fn test_spawn_gate() {
        let mut state = RoundState::new(small_config(), Some(17));
        let start = state.grid.center_of(state.grid.start);
        let target = state.grid.center_of(state.grid.goal);

        let aid = state.agents.iter().next().unwrap().0;
        for _ in 0..SPAWN_DELAY - 1 {
            tick_one(&mut state, aid, target);
        }
        assert!(!state.agents[aid].spawned());
        assert_eq!(state.agents[aid].pos, start);

        tick_one(&mut state, aid, target);
        assert!(state.agents[aid].spawned());
        assert_eq!(state.agents[aid].pos, start);

        tick_one(&mut state, aid, target);
        assert!(state.agents[aid].pos != start);
        assert!(!state.agents[aid].hunting());
        let roam = state.config.base_speed * 0.15;
        assert!((state.agents[aid].speed() - roam).abs() < 1e-9);
    }

    fn tick_one(state: &mut RoundState, aid: AID, target: Vec2) {
        let RoundState { grid, agents, rng, .. } = state;
        agents[aid].tick(grid, target, rng);
    }

    #[test]
    fn test_safe_zone_forces_retreat() {
        // A lone open cell at the goal keeps the agent inside the zone.
        let mut grid = Grid::new(Point(21, 21), 20);
        let goal = grid.goal;
        grid.open(goal);
        let center = grid.center_of(goal);

        let mut rng = RNG::seed_from_u64(17);
        let mut agents = AgentMap::default();
        let aid = agents.add(&AgentArgs {
            pos: center + Vec2(5., 5.),
            size: 14.,
            roam_speed: 0.45,
            hunt_speed: 3.45,
            spawn_delay: 0,
        }, &mut rng);

        let agent = &mut agents[aid];
        agent.ai.spawn = SPAWN_DELAY;
        agent.ai.mode = Mode::Hunting { path: VecDeque::new(), replan: 0, left: 360 };

        let target = grid.center_of(grid.start);
        for _ in 0..121 {
            agent.tick(&grid, target, &mut rng);
        }

        assert!(!agent.hunting());
        match &agent.ai.mode {
            Mode::Roaming { path, .. } => assert!(path.is_empty()),
            Mode::Hunting { .. } => unreachable!(),
        }
        let away = |x: f64, g: f64| if x < g { -1. } else { 1. };
        let expected = Vec2(away(agent.pos.0, center.0), away(agent.pos.1, center.1));
        assert_eq!(agent.dir, expected);
    }

    #[test]
    fn test_agents_stay_in_bounds() {
        for seed in 0..NUM_SEEDS {
            let config = Config { difficulty: 3, ..small_config() };
            let mut state = RoundState::new(config, Some(seed));
            let Vec2(w, h) = state.grid.pixel_size();

            for _ in 0..NUM_STEPS {
                state.update(Vec2::default());
                for (_, agent) in state.agents.iter() {
                    let half = agent.size / 2.;
                    assert!(agent.pos.0 >= half && agent.pos.0 <= w - half);
                    assert!(agent.pos.1 >= half && agent.pos.1 <= h - half);
                }
            }
            assert_eq!(state.ticks, NUM_STEPS);
        }
    }

    #[test]
    fn test_goal_outcome() {
        let mut state = RoundState::new(small_config(), Some(17));
        state.player.pos = state.grid.center_of(state.grid.goal);
        assert_eq!(state.update(Vec2::default()), Some(Outcome::GoalReached));
    }

    #[test]
    fn test_capture_outcome_and_capture_at() {
        let mut state = RoundState::new(small_config(), Some(17));
        let start = state.grid.center_of(state.grid.start);

        // Agents are gated at round start, so nothing collides or tags.
        assert_eq!(state.update(Vec2::default()), None);
        assert_eq!(state.capture_at(start), None);
        assert_eq!(state.live_agents(), 0);

        for (_, agent) in state.agents.iter_mut() {
            agent.ai.spawn = SPAWN_DELAY;
        }
        assert_eq!(state.live_agents(), 1);

        // The lone agent still overlaps the player at the start cell.
        let outcome = state.update(Vec2::default());
        let Some(Outcome::Captured(aid)) = outcome else { panic!("{:?}", outcome) };

        let tagged = state.capture_at(state.agents[aid].pos);
        assert_eq!(tagged, Some(aid));
        assert!(state.agents.is_empty());
        assert_eq!(state.capture_at(start), None);
    }

    #[test]
    fn test_player_trail_and_distance() {
        let mut grid = Grid::new(Point(5, 5), 10);
        for x in 1..4 { grid.open(Point(x, 1)); }
        for y in 1..4 { grid.open(Point(1, y)); }

        let mut player = Player::new(&grid);
        assert_eq!(player.pos, Vec2(15., 15.));

        for _ in 0..5 {
            player.step(&grid, Vec2(3., 0.));
        }
        assert_eq!(player.pos, Vec2(30., 15.));
        assert!((player.distance - 15.).abs() < 1e-9);
        assert_eq!(player.trail.len(), 5);

        // A fully blocked step leaves everything untouched.
        let before = player.pos;
        player.step(&grid, Vec2(0., -20.));
        assert_eq!(player.pos, before);
        assert_eq!(player.trail.len(), 5);
    }

    #[test]
    fn test_round_soak() {
        for seed in 0..NUM_SEEDS {
            for difficulty in 1..=3 {
                let config = Config { difficulty, ..Config::default() };
                let mut state = RoundState::new(config, Some(seed));
                assert_eq!(state.agents.len(), difficulty as usize);

                let east = Vec2(state.config.base_speed, 0.);
                let south = Vec2(0., state.config.base_speed);
                for i in 0..256 {
                    let delta = if i % 2 == 0 { east } else { south };
                    state.update(delta);
                }
                assert!(state.elapsed_seconds() > 4.);
                assert_eq!(
                    state.grid.cells.get(state.grid.cell_at(state.player.pos)),
                    Terrain::Floor);
            }
        }
    }
}
