use crate::modules::world::{Position, World, WorldBounds};

/// Default number of cells visited per tick.
pub const DEFAULT_BLOCKS_PER_TICK: usize = 300;

/// A container found during a scan. The inventory is looked up again on every use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerInfo {
    pub location: Position,
}

/// Inclusive axis-aligned box. Empty when `max.y < min.y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub min: Position,
    pub max: Position,
}

impl BoundingBox {
    pub fn around(anchor: Position, radius: i32, y_radius: i32, bounds: WorldBounds) -> Self {
        let radius = radius.max(0);
        let y_radius = y_radius.max(0);
        Self {
            min: Position::new(
                anchor.x.saturating_sub(radius),
                anchor.y.saturating_sub(y_radius).max(bounds.min_height),
                anchor.z.saturating_sub(radius),
            ),
            max: Position::new(
                anchor.x.saturating_add(radius),
                anchor
                    .y
                    .saturating_add(y_radius)
                    .min(bounds.max_height.saturating_sub(1)),
                anchor.z.saturating_add(radius),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn volume(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let span = |min: i32, max: i32| (i64::from(max) - i64::from(min)) as u64 + 1;
        span(self.min.x, self.max.x)
            .saturating_mul(span(self.min.y, self.max.y))
            .saturating_mul(span(self.min.z, self.max.z))
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.min.x
            && position.x <= self.max.x
            && position.y >= self.min.y
            && position.y <= self.max.y
            && position.z >= self.min.z
            && position.z <= self.max.z
    }
}

/// Position inside a box; z runs fastest, then y, then x.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanCursor {
    pub current: Position,
    pub bounds: BoundingBox,
    exhausted: bool,
}

impl ScanCursor {
    pub fn new(bounds: BoundingBox) -> Self {
        Self {
            current: bounds.min,
            bounds,
            exhausted: bounds.is_empty(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Never steps past the box, so edges at `i32::MAX` are safe.
    pub fn advance(&mut self) {
        if self.exhausted {
            return;
        }
        if self.current.z < self.bounds.max.z {
            self.current.z += 1;
            return;
        }
        self.current.z = self.bounds.min.z;
        if self.current.y < self.bounds.max.y {
            self.current.y += 1;
            return;
        }
        self.current.y = self.bounds.min.y;
        if self.current.x < self.bounds.max.x {
            self.current.x += 1;
        } else {
            self.exhausted = true;
        }
    }
}

/// Incremental container search over a box, driven in fixed-size batches.
#[derive(Clone, Debug)]
pub struct RegionScanner {
    cursor: ScanCursor,
    visited: u64,
}

impl RegionScanner {
    pub fn new(anchor: Position, radius: i32, y_radius: i32, bounds: WorldBounds) -> Self {
        Self::from_box(BoundingBox::around(anchor, radius, y_radius, bounds))
    }

    pub fn from_box(bounds: BoundingBox) -> Self {
        Self {
            cursor: ScanCursor::new(bounds),
            visited: 0,
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        self.cursor.bounds
    }

    pub fn cursor(&self) -> ScanCursor {
        self.cursor
    }

    pub fn volume(&self) -> u64 {
        self.cursor.bounds.volume()
    }

    pub fn visited(&self) -> u64 {
        self.visited
    }

    pub fn has_more(&self) -> bool {
        !self.cursor.is_exhausted()
    }

    /// Ticks needed to finish a full scan at `per_tick` cells per tick.
    pub fn estimated_ticks(&self, per_tick: usize) -> u64 {
        let per_tick = per_tick.max(1) as u64;
        self.volume().div_ceil(per_tick)
    }

    /// Visits the cell under the cursor, then moves on.
    pub fn step(&mut self, world: &World) -> Option<ContainerInfo> {
        if !self.has_more() {
            return None;
        }
        let location = self.cursor.current;
        self.cursor.advance();
        self.visited += 1;

        if !world.block_at(location).is_container() {
            return None;
        }
        // A container block without storage is not a candidate.
        world.container(location)?;
        Some(ContainerInfo { location })
    }
}
