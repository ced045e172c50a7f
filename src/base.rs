use rand::Rng;

//////////////////////////////////////////////////////////////////////////////

// Basics

#[macro_export]
macro_rules! static_assert_size {
    ($x:ty, $y:expr) => {
        const _: fn() = || { let _ = std::mem::transmute::<$x, [u8; $y]>; };
    }
}

pub type RNG = rand::rngs::StdRng;
pub type HashSet<K> = fxhash::FxHashSet<K>;
pub type HashMap<K, V> = fxhash::FxHashMap<K, V>;

pub fn clamp<T: PartialOrd>(x: T, min: T, max: T) -> T {
    if x < min { min } else if x > max { max } else { x }
}

pub fn sample<'a, T>(xs: &'a [T], rng: &mut RNG) -> &'a T {
    assert!(!xs.is_empty());
    &xs[rng.gen_range(0..xs.len())]
}

//////////////////////////////////////////////////////////////////////////////

// Point: integer cell coordinates, (column, row)

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Point(pub i32, pub i32);
static_assert_size!(Point, 8);

impl Point {
    pub fn len_taxicab(&self) -> i32 {
        self.0.abs() + self.1.abs()
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, other: Point) -> Point {
        Point(self.0 + other.0, self.1 + other.1)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, other: Point) -> Point {
        Point(self.0 - other.0, self.1 - other.1)
    }
}

pub mod dirs {
    use crate::base::Point;

    pub const N:  Point = Point( 0, -1);
    pub const S:  Point = Point( 0,  1);
    pub const E:  Point = Point( 1,  0);
    pub const W:  Point = Point(-1,  0);
    pub const NE: Point = Point( 1, -1);
    pub const NW: Point = Point(-1, -1);
    pub const SE: Point = Point( 1,  1);
    pub const SW: Point = Point(-1,  1);

    pub const ALL: [Point; 8] = [N, S, E, W, NE, NW, SE, SW];
    pub const CARDINAL: [Point; 4] = [N, S, E, W];
    pub const DIAGONAL: [Point; 4] = [NE, NW, SE, SW];
}

//////////////////////////////////////////////////////////////////////////////

// Vec2: continuous pixel coordinates

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2(pub f64, pub f64);
static_assert_size!(Vec2, 16);

impl Vec2 {
    pub fn len(&self) -> f64 {
        (self.0 * self.0 + self.1 * self.1).sqrt()
    }

    pub fn scaled(&self, factor: f64) -> Vec2 {
        Vec2(self.0 * factor, self.1 * factor)
    }

    pub fn normalized(&self) -> Vec2 {
        let len = self.len();
        if len == 0. { return *self; }
        self.scaled(len.recip())
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2(self.0 + other.0, self.1 + other.1)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2(self.0 - other.0, self.1 - other.1)
    }
}

//////////////////////////////////////////////////////////////////////////////

// Rect: axis-aligned pixel rectangle, root at the top-left corner

#[derive(Clone, Copy, Debug, Default)]
pub struct Rect { pub root: Vec2, pub size: Vec2 }

impl Rect {
    pub fn centered(center: Vec2, side: f64) -> Self {
        let half = 0.5 * side;
        Self { root: center - Vec2(half, half), size: Vec2(side, side) }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        let Vec2(px, py) = p;
        px >= self.root.0 && px < self.root.0 + self.size.0 &&
        py >= self.root.1 && py < self.root.1 + self.size.1
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.root.0 < other.root.0 + other.size.0 &&
        other.root.0 < self.root.0 + self.size.0 &&
        self.root.1 < other.root.1 + other.size.1 &&
        other.root.1 < self.root.1 + self.size.1
    }
}

//////////////////////////////////////////////////////////////////////////////

// Matrix

#[derive(Clone, Default)]
pub struct Matrix<T> {
    pub data: Vec<T>,
    pub size: Point,
    pub default: T,
}

impl<T: Clone> Matrix<T> {
    pub fn new(size: Point, value: T) -> Self {
        assert!(0 <= size.0);
        assert!(0 <= size.1);
        let data = vec![value.clone(); (size.0 * size.1) as usize];
        Self { data, size, default: value }
    }

    pub fn get(&self, point: Point) -> T {
        let Some(x) = self.index(point) else { return self.default.clone(); };
        self.data[x].clone()
    }

    pub fn set(&mut self, point: Point, value: T) {
        let Some(x) = self.index(point) else { return; };
        self.data[x] = value;
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    #[inline(always)]
    pub fn contains(&self, point: Point) -> bool {
        let Point(px, py) = point;
        let Point(sx, sy) = self.size;
        0 <= px && px < sx && 0 <= py && py < sy
    }

    #[inline(always)]
    pub fn index(&self, point: Point) -> Option<usize> {
        if !self.contains(point) { return None; }
        Some((point.0 + point.1 * self.size.0) as usize)
    }
}
