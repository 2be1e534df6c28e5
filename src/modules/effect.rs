use std::f64::consts::PI;

use crate::modules::item::ItemStack;
use crate::modules::settings::VisualSettings;
use crate::modules::world::Position;

pub type Point = (f64, f64, f64);

/// A placed stack travelling from the anchor to its container. Presentation only.
#[derive(Clone, Debug, PartialEq)]
pub struct Flight {
    pub item: ItemStack,
    start: Point,
    target: Point,
    destination: Position,
    duration: u32,
    arc_height: f64,
    elapsed: u32,
}

impl Flight {
    pub fn new(item: ItemStack, from: Position, to: Position, visuals: &VisualSettings) -> Self {
        Self {
            item,
            start: from.center(),
            target: to.center(),
            destination: to,
            duration: visuals.flight_duration_ticks.max(1),
            arc_height: visuals.arc_height,
            elapsed: 0,
        }
    }

    pub fn destination(&self) -> Position {
        self.destination
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn is_landed(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn position(&self) -> Point {
        self.position_at(self.elapsed)
    }

    /// Eased along the straight line, lifted by a sine arc.
    pub fn position_at(&self, tick: u32) -> Point {
        let t = f64::from(tick.min(self.duration)) / f64::from(self.duration);
        let eased = ease_out(t);
        let (sx, sy, sz) = self.start;
        let (tx, ty, tz) = self.target;
        (
            sx + (tx - sx) * eased,
            sy + (ty - sy) * eased + self.arc_height * (eased * PI).sin(),
            sz + (tz - sz) * eased,
        )
    }

    /// One tick forward. Returns `true` on the tick the flight lands.
    pub fn advance(&mut self) -> bool {
        if self.is_landed() {
            return false;
        }
        self.elapsed += 1;
        self.is_landed()
    }
}

pub fn ease_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::item::Material;

    fn flight(duration: u32) -> Flight {
        let visuals = VisualSettings {
            enabled: true,
            flight_duration_ticks: duration,
            arc_height: 0.3,
        };
        Flight::new(
            ItemStack::new(Material::Coal, 4),
            Position::origin(),
            Position::new(4, 0, 0),
            &visuals,
        )
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn starts_and_ends_at_cell_centres() {
        let f = flight(30);
        let (x, y, z) = f.position_at(0);
        assert!(close(x, 0.5) && close(y, 0.5) && close(z, 0.5));
        let (x, y, z) = f.position_at(30);
        assert!(close(x, 4.5) && close(y, 0.5) && close(z, 0.5));
    }

    #[test]
    fn decelerates_towards_the_target() {
        let f = flight(10);
        let first = f.position_at(1).0 - f.position_at(0).0;
        let last = f.position_at(10).0 - f.position_at(9).0;
        assert!(first > last);
        // Halfway in time is three quarters of the way in space.
        assert!(close(f.position_at(5).0, 0.5 + 4.0 * 0.75));
    }

    #[test]
    fn arc_lifts_mid_flight() {
        let f = flight(10);
        assert!(f.position_at(4).1 > 0.5);
    }

    #[test]
    fn lands_after_duration() {
        let mut f = flight(3);
        assert!(!f.advance());
        assert!(!f.advance());
        assert!(f.advance());
        assert!(f.is_landed());
        assert!(!f.advance());
        assert_eq!(f.elapsed(), 3);
    }
}
