//! Collision detection and response
//!
//! Narrow phase for circles and axis-aligned rectangles, an optional
//! uniform-grid broad phase, and an engine that tracks per-pair cooldowns
//! plus a short rolling history of events.
//!
//! Nothing here panics or errors: degenerate shapes simply never collide.

use std::collections::{BTreeSet, HashMap, VecDeque};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Collision primitive, recomputed from its owner every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { center: Vec2, radius: f32 },
    /// Axis-aligned rectangle, `pos` is the top-left corner
    Rect { pos: Vec2, size: Vec2 },
}

impl Shape {
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Shape::Circle { center, radius }
    }

    pub fn rect(pos: Vec2, size: Vec2) -> Self {
        Shape::Rect { pos, size }
    }

    /// Zero/negative extents or non-finite coordinates
    pub fn is_degenerate(&self) -> bool {
        match *self {
            Shape::Circle { center, radius } => !(center.is_finite() && radius > 0.0),
            Shape::Rect { pos, size } => !(pos.is_finite() && size.x > 0.0 && size.y > 0.0),
        }
    }

    pub fn center(&self) -> Vec2 {
        match *self {
            Shape::Circle { center, .. } => center,
            Shape::Rect { pos, size } => pos + size * 0.5,
        }
    }

    /// Radius for circles, half the larger side for rectangles
    pub fn characteristic_radius(&self) -> f32 {
        match *self {
            Shape::Circle { radius, .. } => radius,
            Shape::Rect { size, .. } => size.x.max(size.y) * 0.5,
        }
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> (Vec2, Vec2) {
        match *self {
            Shape::Circle { center, radius } => {
                (center - Vec2::splat(radius), center + Vec2::splat(radius))
            }
            Shape::Rect { pos, size } => (pos, pos + size),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Shape::Circle { center, .. } => *center += delta,
            Shape::Rect { pos, .. } => *pos += delta,
        }
    }
}

/// Result of a contact query
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (if hit)
    pub point: Vec2,
    /// Separation normal pointing from the first shape toward the second
    pub normal: Vec2,
    /// Penetration depth
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

#[inline]
pub fn circle_circle(c1: Vec2, r1: f32, c2: Vec2, r2: f32) -> bool {
    if !(r1 > 0.0 && r2 > 0.0) {
        return false;
    }
    c1.distance(c2) < r1 + r2
}

#[inline]
pub fn rect_rect(p1: Vec2, s1: Vec2, p2: Vec2, s2: Vec2) -> bool {
    if !(s1.x > 0.0 && s1.y > 0.0 && s2.x > 0.0 && s2.y > 0.0) {
        return false;
    }
    p1.x < p2.x + s2.x && p1.x + s1.x > p2.x && p1.y < p2.y + s2.y && p1.y + s1.y > p2.y
}

#[inline]
pub fn circle_rect(center: Vec2, radius: f32, pos: Vec2, size: Vec2) -> bool {
    if !(radius > 0.0 && size.x > 0.0 && size.y > 0.0) {
        return false;
    }
    let closest = center.clamp(pos, pos + size);
    center.distance_squared(closest) < radius * radius
}

pub fn shapes_intersect(a: &Shape, b: &Shape) -> bool {
    if a.is_degenerate() || b.is_degenerate() {
        return false;
    }
    match (*a, *b) {
        (Shape::Circle { center: c1, radius: r1 }, Shape::Circle { center: c2, radius: r2 }) => {
            circle_circle(c1, r1, c2, r2)
        }
        (Shape::Rect { pos: p1, size: s1 }, Shape::Rect { pos: p2, size: s2 }) => {
            rect_rect(p1, s1, p2, s2)
        }
        (Shape::Circle { center, radius }, Shape::Rect { pos, size })
        | (Shape::Rect { pos, size }, Shape::Circle { center, radius }) => {
            circle_rect(center, radius, pos, size)
        }
    }
}

/// Full contact information between two shapes
pub fn contact(a: &Shape, b: &Shape) -> CollisionResult {
    if !shapes_intersect(a, b) {
        return CollisionResult::miss();
    }
    match (*a, *b) {
        (Shape::Circle { center: c1, radius: r1 }, Shape::Circle { center: c2, radius: r2 }) => {
            let delta = c2 - c1;
            let dist = delta.length();
            let normal = delta.try_normalize().unwrap_or(Vec2::Y);
            let penetration = r1 + r2 - dist;
            CollisionResult {
                hit: true,
                // Middle of the overlapping lens
                point: c1 + normal * (r1 - penetration * 0.5),
                normal,
                penetration,
            }
        }
        (Shape::Circle { center, radius }, Shape::Rect { pos, size }) => {
            circle_rect_contact(center, radius, pos, size)
        }
        (Shape::Rect { pos, size }, Shape::Circle { center, radius }) => {
            let mut result = circle_rect_contact(center, radius, pos, size);
            result.normal = -result.normal;
            result
        }
        (Shape::Rect { pos: p1, size: s1 }, Shape::Rect { pos: p2, size: s2 }) => {
            let min = p1.max(p2);
            let max = (p1 + s1).min(p2 + s2);
            let overlap = max - min;
            let diff = (p2 + s2 * 0.5) - (p1 + s1 * 0.5);
            let (normal, penetration) = if overlap.x < overlap.y {
                (Vec2::new(if diff.x < 0.0 { -1.0 } else { 1.0 }, 0.0), overlap.x)
            } else {
                (Vec2::new(0.0, if diff.y < 0.0 { -1.0 } else { 1.0 }), overlap.y)
            };
            CollisionResult {
                hit: true,
                point: (min + max) * 0.5,
                normal,
                penetration,
            }
        }
    }
}

/// Contact for a circle (first) against a rectangle (second)
fn circle_rect_contact(center: Vec2, radius: f32, pos: Vec2, size: Vec2) -> CollisionResult {
    let closest = center.clamp(pos, pos + size);
    let delta = closest - center;
    let dist = delta.length();

    if dist > 0.0 {
        CollisionResult {
            hit: true,
            point: closest,
            normal: delta / dist,
            penetration: radius - dist,
        }
    } else {
        // Center is inside the rectangle: push out along the axis of least depth
        let rect_center = pos + size * 0.5;
        let to_left = center.x - pos.x;
        let to_right = pos.x + size.x - center.x;
        let to_top = center.y - pos.y;
        let to_bottom = pos.y + size.y - center.y;
        let min_x = to_left.min(to_right);
        let min_y = to_top.min(to_bottom);
        let normal = if min_x < min_y {
            Vec2::new(if center.x < rect_center.x { 1.0 } else { -1.0 }, 0.0)
        } else {
            Vec2::new(0.0, if center.y < rect_center.y { 1.0 } else { -1.0 })
        };
        CollisionResult {
            hit: true,
            point: center,
            normal,
            penetration: radius + min_x.min(min_y),
        }
    }
}

/// Push `a` away from `b` by half of `a`'s characteristic radius
///
/// Positional correction only; velocities are the caller's business.
/// Coincident centres leave `a` where it is.
pub fn resolve_collision(a: &mut Shape, b: &Shape) -> Vec2 {
    let Some(unit) = (b.center() - a.center()).try_normalize() else {
        return Vec2::ZERO;
    };
    let push = -unit * (a.characteristic_radius() * 0.5);
    a.translate(push);
    push
}

/// Uniform grid keyed by integer cell coordinates
///
/// Objects are inserted into every cell their bounds overlap.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    inv_cell_size: f32,
    cells: HashMap<(i32, i32), Vec<u32>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            inv_cell_size: 1.0 / cell_size.max(1.0),
            cells: HashMap::new(),
        }
    }

    /// Clear all cells, keeping allocations
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
    }

    pub fn cell_coords(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x * self.inv_cell_size).floor() as i32,
            (p.y * self.inv_cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, id: u32, shape: &Shape) {
        if shape.is_degenerate() {
            return;
        }
        let (min, max) = shape.bounds();
        let (x0, y0) = self.cell_coords(min);
        let (x1, y1) = self.cell_coords(max);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                self.cells.entry((cx, cy)).or_default().push(id);
            }
        }
    }

    /// Ids sharing a cell with the given shape's bounds
    pub fn query(&self, shape: &Shape) -> BTreeSet<u32> {
        let mut found = BTreeSet::new();
        let (min, max) = shape.bounds();
        let (x0, y0) = self.cell_coords(min);
        let (x1, y1) = self.cell_coords(max);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    found.extend(bucket.iter().copied());
                }
            }
        }
        found
    }

    /// Every id pair sharing at least one cell, as (low, high)
    pub fn candidate_pairs(&self) -> BTreeSet<(u32, u32)> {
        let mut pairs = BTreeSet::new();
        for bucket in self.cells.values() {
            for (i, &a) in bucket.iter().enumerate() {
                for &b in &bucket[i + 1..] {
                    if a != b {
                        pairs.insert(sorted_pair(a, b));
                    }
                }
            }
        }
        pairs
    }
}

#[inline]
fn sorted_pair(a: u32, b: u32) -> (u32, u32) {
    if a <= b { (a, b) } else { (b, a) }
}

/// What a collider belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColliderKind {
    Obstacle,
    PowerUp,
}

#[derive(Debug, Clone, Copy)]
pub struct Collider {
    pub id: u32,
    pub kind: ColliderKind,
    pub shape: Shape,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub a: u32,
    pub b: u32,
    pub point: Vec2,
    /// Points from `a` toward `b`
    pub normal: Vec2,
    pub penetration: f32,
    pub time_ms: f64,
    pub handled: bool,
}

impl CollisionEvent {
    pub fn involves(&self, a: u32, b: u32) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }
}

#[derive(Debug, Clone)]
pub struct CollisionConfig {
    pub use_broad_phase: bool,
    pub grid_size: f32,
    /// Minimum time between two events for the same pair
    pub cooldown_ms: f64,
    /// How long events stay in the history
    pub history_ms: f64,
    pub max_history: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            use_broad_phase: true,
            grid_size: 64.0,
            cooldown_ms: 100.0,
            history_ms: 5000.0,
            max_history: 256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollisionEngine {
    pub config: CollisionConfig,
    colliders: Vec<Collider>,
    grid: SpatialGrid,
    /// Last event time per sorted id pair
    cooldowns: HashMap<(u32, u32), f64>,
    history: VecDeque<CollisionEvent>,
}

impl Default for CollisionEngine {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

impl CollisionEngine {
    pub fn new(config: CollisionConfig) -> Self {
        let grid = SpatialGrid::new(config.grid_size);
        Self {
            config,
            colliders: Vec::new(),
            grid,
            cooldowns: HashMap::new(),
            history: VecDeque::new(),
        }
    }

    /// Drop all registered colliders (cooldowns and history survive)
    pub fn clear_colliders(&mut self) {
        self.colliders.clear();
    }

    /// Forget everything, including cooldowns and history
    pub fn reset(&mut self) {
        self.colliders.clear();
        self.cooldowns.clear();
        self.history.clear();
        self.grid.clear();
    }

    /// Register a collider; an existing id is replaced
    pub fn register(&mut self, collider: Collider) {
        if let Some(existing) = self.colliders.iter_mut().find(|c| c.id == collider.id) {
            *existing = collider;
        } else {
            self.colliders.push(collider);
        }
    }

    pub fn unregister(&mut self, id: u32) {
        self.colliders.retain(|c| c.id != id);
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn set_broad_phase(&mut self, enabled: bool) {
        self.config.use_broad_phase = enabled;
    }

    /// Candidate pairs, de-duplicated, lowest id first
    fn candidate_pairs(&mut self) -> BTreeSet<(u32, u32)> {
        if self.config.use_broad_phase {
            self.grid.clear();
            for c in &self.colliders {
                self.grid.insert(c.id, &c.shape);
            }
            self.grid.candidate_pairs()
        } else {
            let mut pairs = BTreeSet::new();
            for (i, a) in self.colliders.iter().enumerate() {
                for b in &self.colliders[i + 1..] {
                    if a.id != b.id {
                        pairs.insert(sorted_pair(a.id, b.id));
                    }
                }
            }
            pairs
        }
    }

    /// General pass over all registered colliders
    ///
    /// Pairs inside their cooldown are skipped. Returned events are also
    /// appended to the history.
    pub fn check_collisions(&mut self, now_ms: f64) -> Vec<CollisionEvent> {
        self.prune(now_ms);

        let index: HashMap<u32, usize> = self
            .colliders
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, i))
            .collect();

        let mut events = Vec::new();
        for (ida, idb) in self.candidate_pairs() {
            let (Some(&ia), Some(&ib)) = (index.get(&ida), index.get(&idb)) else {
                continue;
            };
            let result = contact(&self.colliders[ia].shape, &self.colliders[ib].shape);
            if !result.hit {
                continue;
            }
            if self.is_on_cooldown(ida, idb, now_ms) {
                continue;
            }
            self.cooldowns.insert((ida, idb), now_ms);

            let event = CollisionEvent {
                a: ida,
                b: idb,
                point: result.point,
                normal: result.normal,
                penetration: result.penetration,
                time_ms: now_ms,
                handled: false,
            };
            self.history.push_back(event.clone());
            while self.history.len() > self.config.max_history {
                self.history.pop_front();
            }
            events.push(event);
        }
        events
    }

    /// Direct scan of every collider against the bird. No cooldown, no grid.
    pub fn check_bird_collisions(&self, bird: &Shape) -> Vec<Collider> {
        self.colliders
            .iter()
            .filter(|c| shapes_intersect(bird, &c.shape))
            .copied()
            .collect()
    }

    pub fn is_on_cooldown(&self, a: u32, b: u32, now_ms: f64) -> bool {
        self.cooldowns
            .get(&sorted_pair(a, b))
            .is_some_and(|&t| now_ms - t < self.config.cooldown_ms)
    }

    pub fn collided_recently(&self, a: u32, b: u32, within_ms: f64, now_ms: f64) -> bool {
        self.history
            .iter()
            .rev()
            .take_while(|e| now_ms - e.time_ms <= within_ms)
            .any(|e| e.involves(a, b))
    }

    pub fn mark_handled(&mut self, a: u32, b: u32) {
        for event in self.history.iter_mut().rev() {
            if event.involves(a, b) && !event.handled {
                event.handled = true;
                break;
            }
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.history.iter()
    }

    /// Drop expired history entries and cooldowns
    pub fn prune(&mut self, now_ms: f64) {
        let horizon = self.config.history_ms;
        while self
            .history
            .front()
            .is_some_and(|e| now_ms - e.time_ms > horizon)
        {
            self.history.pop_front();
        }
        let cooldown = self.config.cooldown_ms;
        self.cooldowns.retain(|_, t| now_ms - *t < cooldown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn obstacle(id: u32, shape: Shape) -> Collider {
        Collider {
            id,
            kind: ColliderKind::Obstacle,
            shape,
        }
    }

    #[test]
    fn test_circle_circle() {
        assert!(circle_circle(Vec2::ZERO, 5.0, Vec2::new(9.0, 0.0), 5.0));
        // Touching is not overlapping
        assert!(!circle_circle(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0));
        assert!(!circle_circle(Vec2::ZERO, 0.0, Vec2::ZERO, 5.0));
    }

    #[test]
    fn test_rect_rect() {
        let s = Vec2::splat(10.0);
        assert!(rect_rect(Vec2::ZERO, s, Vec2::new(5.0, 5.0), s));
        assert!(!rect_rect(Vec2::ZERO, s, Vec2::new(10.0, 0.0), s));
        assert!(!rect_rect(Vec2::ZERO, s, Vec2::new(0.0, 20.0), s));
        assert!(!rect_rect(Vec2::ZERO, Vec2::new(0.0, 10.0), Vec2::ZERO, s));
    }

    #[test]
    fn test_circle_rect() {
        let pos = Vec2::new(100.0, 0.0);
        let size = Vec2::new(50.0, 200.0);
        assert!(circle_rect(Vec2::new(95.0, 50.0), 8.0, pos, size));
        assert!(!circle_rect(Vec2::new(80.0, 50.0), 8.0, pos, size));
        // Corner: closest point is (100, 200), distance ~7.07
        assert!(circle_rect(Vec2::new(95.0, 205.0), 8.0, pos, size));
        assert!(!circle_rect(Vec2::new(92.0, 208.0), 8.0, pos, size));
    }

    #[test]
    fn test_degenerate_shapes_never_collide() {
        let a = Shape::circle(Vec2::ZERO, 0.0);
        let b = Shape::rect(Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert!(!shapes_intersect(&a, &b));
        let c = Shape::circle(Vec2::new(f32::NAN, 0.0), 5.0);
        assert!(!shapes_intersect(&c, &b));
        assert!(!contact(&a, &b).hit);
    }

    #[test]
    fn test_contact_normal_points_a_to_b() {
        let bird = Shape::circle(Vec2::new(90.0, 50.0), 12.0);
        let pipe = Shape::rect(Vec2::new(100.0, 0.0), Vec2::new(60.0, 100.0));
        let r = contact(&bird, &pipe);
        assert!(r.hit);
        assert_eq!(r.normal, Vec2::X);
        assert!((r.penetration - 2.0).abs() < 1e-5);

        let r = contact(&pipe, &bird);
        assert_eq!(r.normal, -Vec2::X);
    }

    #[test]
    fn test_contact_circle_inside_rect() {
        let circle = Shape::circle(Vec2::new(102.0, 50.0), 5.0);
        let rect = Shape::rect(Vec2::new(100.0, 0.0), Vec2::new(60.0, 100.0));
        let r = contact(&circle, &rect);
        assert!(r.hit);
        // Nearest edge is the left one, so the rect lies to the +x side
        assert_eq!(r.normal, Vec2::X);
        assert!((r.penetration - 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_resolve_collision_pushes_away() {
        let mut a = Shape::circle(Vec2::new(0.0, 0.0), 10.0);
        let b = Shape::circle(Vec2::new(5.0, 0.0), 10.0);
        let push = resolve_collision(&mut a, &b);
        assert_eq!(push, Vec2::new(-5.0, 0.0));
        assert_eq!(a.center(), Vec2::new(-5.0, 0.0));

        // Coincident centres: no direction, no movement
        let mut c = Shape::circle(Vec2::ZERO, 10.0);
        let d = Shape::circle(Vec2::ZERO, 10.0);
        assert_eq!(resolve_collision(&mut c, &d), Vec2::ZERO);
        assert_eq!(c.center(), Vec2::ZERO);
    }

    #[test]
    fn test_grid_spans_cells() {
        let mut grid = SpatialGrid::new(64.0);
        grid.insert(1, &Shape::rect(Vec2::new(10.0, 10.0), Vec2::new(200.0, 10.0)));
        grid.insert(2, &Shape::circle(Vec2::new(180.0, 15.0), 4.0));
        grid.insert(3, &Shape::circle(Vec2::new(500.0, 500.0), 4.0));

        let pairs = grid.candidate_pairs();
        assert!(pairs.contains(&(1, 2)));
        assert!(!pairs.contains(&(1, 3)));

        let found = grid.query(&Shape::circle(Vec2::new(20.0, 20.0), 2.0));
        assert!(found.contains(&1));
        assert!(!found.contains(&2));
    }

    #[test]
    fn test_pairs_reported_once() {
        for broad in [true, false] {
            let mut engine = CollisionEngine::default();
            engine.set_broad_phase(broad);
            // Both span several grid cells together
            engine.register(obstacle(7, Shape::rect(Vec2::ZERO, Vec2::new(300.0, 300.0))));
            engine.register(obstacle(3, Shape::rect(Vec2::new(10.0, 10.0), Vec2::new(200.0, 200.0))));
            let events = engine.check_collisions(0.0);
            assert_eq!(events.len(), 1, "broad phase = {}", broad);
            assert_eq!((events[0].a, events[0].b), (3, 7));
        }
    }

    #[test]
    fn test_broad_phase_matches_brute_force() {
        let shapes = [
            Shape::circle(Vec2::new(10.0, 10.0), 8.0),
            Shape::circle(Vec2::new(20.0, 12.0), 8.0),
            Shape::rect(Vec2::new(15.0, 0.0), Vec2::new(100.0, 20.0)),
            Shape::rect(Vec2::new(300.0, 300.0), Vec2::new(20.0, 20.0)),
            Shape::circle(Vec2::new(310.0, 290.0), 15.0),
            Shape::circle(Vec2::new(600.0, 10.0), 3.0),
        ];
        let mut with_grid = CollisionEngine::default();
        let mut brute = CollisionEngine::new(CollisionConfig {
            use_broad_phase: false,
            ..Default::default()
        });
        for (i, s) in shapes.iter().enumerate() {
            with_grid.register(obstacle(i as u32, *s));
            brute.register(obstacle(i as u32, *s));
        }
        let a: Vec<_> = with_grid.check_collisions(0.0).iter().map(|e| (e.a, e.b)).collect();
        let b: Vec<_> = brute.check_collisions(0.0).iter().map(|e| (e.a, e.b)).collect();
        assert_eq!(a, b);
        assert_eq!(a, vec![(0, 1), (0, 2), (1, 2), (3, 4)]);
    }

    #[test]
    fn test_cooldown_suppresses_repeats() {
        let mut engine = CollisionEngine::default();
        engine.register(obstacle(1, Shape::circle(Vec2::ZERO, 10.0)));
        engine.register(obstacle(2, Shape::circle(Vec2::new(5.0, 0.0), 10.0)));

        assert_eq!(engine.check_collisions(0.0).len(), 1);
        assert!(engine.is_on_cooldown(2, 1, 50.0));
        assert!(engine.check_collisions(50.0).is_empty());
        assert_eq!(engine.check_collisions(100.0).len(), 1);
    }

    #[test]
    fn test_history_window() {
        let mut engine = CollisionEngine::default();
        engine.register(obstacle(1, Shape::circle(Vec2::ZERO, 10.0)));
        engine.register(obstacle(2, Shape::circle(Vec2::new(5.0, 0.0), 10.0)));
        engine.check_collisions(1000.0);

        assert!(engine.collided_recently(2, 1, 500.0, 1200.0));
        assert!(!engine.collided_recently(1, 3, 500.0, 1200.0));
        assert!(!engine.collided_recently(1, 2, 100.0, 1200.0));

        engine.mark_handled(1, 2);
        assert!(engine.history().all(|e| e.handled));

        engine.unregister(2);
        engine.check_collisions(7000.0);
        assert_eq!(engine.history().count(), 0);
    }

    #[test]
    fn test_bird_scan_ignores_cooldown() {
        let mut engine = CollisionEngine::default();
        engine.register(obstacle(1, Shape::rect(Vec2::ZERO, Vec2::new(50.0, 50.0))));
        engine.register(obstacle(2, Shape::rect(Vec2::new(20.0, 20.0), Vec2::new(50.0, 50.0))));
        engine.check_collisions(0.0);

        let bird = Shape::circle(Vec2::new(30.0, 30.0), 5.0);
        for _ in 0..3 {
            let hits = engine.check_bird_collisions(&bird);
            assert_eq!(hits.len(), 2);
        }
    }

    fn shape_strategy() -> impl Strategy<Value = Shape> {
        prop_oneof![
            (-100.0f32..100.0, -100.0f32..100.0, 0.0f32..50.0)
                .prop_map(|(x, y, r)| Shape::circle(Vec2::new(x, y), r)),
            (-100.0f32..100.0, -100.0f32..100.0, 0.0f32..80.0, 0.0f32..80.0)
                .prop_map(|(x, y, w, h)| Shape::rect(Vec2::new(x, y), Vec2::new(w, h))),
        ]
    }

    proptest! {
        #[test]
        fn prop_circle_circle_symmetric(
            x1 in -100.0f32..100.0, y1 in -100.0f32..100.0, r1 in 0.0f32..50.0,
            x2 in -100.0f32..100.0, y2 in -100.0f32..100.0, r2 in 0.0f32..50.0,
        ) {
            let a = Vec2::new(x1, y1);
            let b = Vec2::new(x2, y2);
            prop_assert_eq!(circle_circle(a, r1, b, r2), circle_circle(b, r2, a, r1));
        }

        #[test]
        fn prop_intersection_symmetric(a in shape_strategy(), b in shape_strategy()) {
            prop_assert_eq!(shapes_intersect(&a, &b), shapes_intersect(&b, &a));
            prop_assert_eq!(contact(&a, &b).hit, contact(&b, &a).hit);
        }
    }
}
