use std::iter::FusedIterator;
use std::num::NonZeroU64;
use std::ops::{Index, IndexMut};

use slotmap::{DefaultKey, Key, KeyData};
use slotmap::hop::HopSlotMap;

use crate::static_assert_size;
use crate::ai::{self, AIState};
use crate::base::{Rect, Vec2, RNG, sample};
use crate::grid::Grid;

//////////////////////////////////////////////////////////////////////////////

// Agent

pub struct AgentArgs {
    pub pos: Vec2,
    pub size: f64,
    pub roam_speed: f64,
    pub hunt_speed: f64,
    pub spawn_delay: i32,
}

pub struct Agent {
    pub aid: AID,
    pub pos: Vec2,
    pub dir: Vec2,
    pub size: f64,
    pub roam_speed: f64,
    pub hunt_speed: f64,
    pub(crate) ai: Box<AIState>,
}

impl Agent {
    fn new(aid: AID, args: &AgentArgs, rng: &mut RNG) -> Self {
        let signs = [-1., 1.];
        Self {
            aid,
            pos: args.pos,
            dir: Vec2(*sample(&signs, rng), *sample(&signs, rng)),
            size: args.size,
            roam_speed: args.roam_speed,
            hunt_speed: args.hunt_speed,
            ai: Box::new(AIState::new(args.spawn_delay)),
        }
    }

    // Advance one tick of simulation against the round's read-only grid
    // and the target's current position.
    pub fn tick(&mut self, grid: &Grid, target: Vec2, rng: &mut RNG) {
        ai::tick(self, grid, target, rng);
    }

    pub fn hunting(&self) -> bool { self.ai.hunting() }

    pub fn spawned(&self) -> bool { self.ai.spawned() }

    pub fn speed(&self) -> f64 {
        if self.hunting() { self.hunt_speed } else { self.roam_speed }
    }

    pub fn rect(&self) -> Rect { Rect::centered(self.pos, self.size) }

    pub fn collides_with(&self, other: &Rect) -> bool {
        self.rect().intersects(other)
    }
}

//////////////////////////////////////////////////////////////////////////////

// AID

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct AID(NonZeroU64);
static_assert_size!(Option<AID>, 8);

impl Default for AID {
    fn default() -> Self {
        to_aid(DefaultKey::null())
    }
}

fn to_key(aid: AID) -> DefaultKey {
    KeyData::from_ffi(aid.0.get()).into()
}

fn to_aid(key: DefaultKey) -> AID {
    AID(NonZeroU64::new(key.data().as_ffi()).unwrap())
}

//////////////////////////////////////////////////////////////////////////////

// AgentMap

type BaseMap = HopSlotMap<DefaultKey, Agent>;

#[derive(Default)]
pub struct AgentMap(BaseMap);

impl AgentMap {
    pub fn add(&mut self, args: &AgentArgs, rng: &mut RNG) -> AID {
        to_aid(self.0.insert_with_key(|x| Agent::new(to_aid(x), args, rng)))
    }

    pub fn clear(&mut self) { self.0.clear(); }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, aid: AID) -> Option<&Agent> { self.0.get(to_key(aid)) }

    pub fn get_mut(&mut self, aid: AID) -> Option<&mut Agent> { self.0.get_mut(to_key(aid)) }

    pub fn has(&self, aid: AID) -> bool { self.0.contains_key(to_key(aid)) }

    // Dropping an agent needs no teardown beyond removing it here.
    pub fn remove(&mut self, aid: AID) -> Option<Agent> { self.0.remove(to_key(aid)) }

    pub fn iter(&self) -> Iter<'_> { Iter(self.0.iter()) }

    pub fn iter_mut(&mut self) -> IterMut<'_> { IterMut(self.0.iter_mut()) }
}

impl Index<AID> for AgentMap {
    type Output = Agent;
    fn index(&self, aid: AID) -> &Self::Output {
        self.get(aid).unwrap()
    }
}

impl IndexMut<AID> for AgentMap {
    fn index_mut(&mut self, aid: AID) -> &mut Self::Output {
        self.get_mut(aid).unwrap()
    }
}

impl<'a> IntoIterator for &'a AgentMap {
    type Item = (AID, &'a Agent);
    type IntoIter = Iter<'a>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl<'a> IntoIterator for &'a mut AgentMap {
    type Item = (AID, &'a mut Agent);
    type IntoIter = IterMut<'a>;
    fn into_iter(self) -> Self::IntoIter { self.iter_mut() }
}

//////////////////////////////////////////////////////////////////////////////

// AgentMap iterators

pub struct Iter<'a>(slotmap::hop::Iter<'a, DefaultKey, Agent>);

pub struct IterMut<'a>(slotmap::hop::IterMut<'a, DefaultKey, Agent>);

impl<'a> FusedIterator for Iter<'a> {}

impl<'a> FusedIterator for IterMut<'a> {}

impl<'a> Iterator for Iter<'a> {
    type Item = (AID, &'a Agent);
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (to_aid(k), v))
    }
}

impl<'a> Iterator for IterMut<'a> {
    type Item = (AID, &'a mut Agent);
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (to_aid(k), v))
    }
}
