/// An obstacle at a fixed (direction, distance).
///
/// The sign of `id` encodes the kind of wall:
/// - negative: a structural wall, created by the `wall` instruction, that
///   bounces any sound
/// - positive: the personal wall of the sound with the same id, which only
///   bounces that sound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wall {
    pub id: i64,
    pub direction: u8,
    pub distance: u32,
    pub has_been_bounced_on: bool,
}

impl Wall {
    pub fn new(id: i64, direction: u8, distance: u32) -> Self {
        Self {
            id,
            direction,
            distance,
            has_been_bounced_on: false,
        }
    }

    /// Returns true for walls created by the `wall` instruction.
    pub fn is_structural(&self) -> bool {
        self.id < 0
    }

    /// Returns true if this wall reflects the sound with the given id.
    pub fn bounces(&self, sound_id: u64) -> bool {
        self.is_structural() || self.id == sound_id as i64
    }
}

/// A particle travelling along one of the four directions (`0..4`).
///
/// Distances count cells away from the origin; distance 0 is the origin
/// itself, where a sound is absorbed into the sound sum.
/// Sounds start one cell from the origin moving outward (`velocity == 1`).
/// After a bounce the velocity becomes -1 and the sound heads back to the
/// origin, where it is absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sound {
    pub id: u64,
    pub direction: u8,
    pub intensity: u8,
    pub distance: u32,
    pub velocity: i32,
    pub just_created: bool,
}

impl Sound {
    /// Create a sound together with its personal wall at `wall_distance`.
    pub fn emit(id: u64, direction: u8, intensity: u8, wall_distance: u32) -> (Sound, Wall) {
        let sound = Sound {
            id,
            direction,
            intensity,
            distance: 1,
            velocity: 1,
            just_created: true,
        };
        let wall = Wall::new(id as i64, direction, wall_distance);
        (sound, wall)
    }

    /// Advance one tick.
    ///
    /// A freshly emitted sound only loses its `just_created` flag. Otherwise
    /// an outward-moving sound first checks for a wall at its current cell
    /// that bounces it; the first such wall in `walls` order is marked as
    /// bounced and the sound turns around. Then the sound moves by its
    /// velocity.
    pub fn advance(&mut self, walls: &mut [Wall]) {
        if self.just_created {
            self.just_created = false;
            return;
        }

        if self.velocity > 0 {
            let hit = walls.iter_mut().find(|w| {
                w.direction == self.direction && w.distance == self.distance && w.bounces(self.id)
            });
            if let Some(wall) = hit {
                wall.has_been_bounced_on = true;
                self.velocity = -1;
            }
        }

        self.distance = self.distance.saturating_add_signed(self.velocity);
    }

    /// True once the sound is back at the origin.
    pub fn is_absorbed(&self) -> bool {
        self.distance == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_starts_one_cell_out() {
        let (sound, wall) = Sound::emit(3, 2, 40, 7);
        assert_eq!(sound.distance, 1);
        assert_eq!(sound.velocity, 1);
        assert!(sound.just_created);
        assert_eq!(wall.id, 3);
        assert_eq!(wall.direction, 2);
        assert_eq!(wall.distance, 7);
        assert!(!wall.is_structural());
    }

    #[test]
    fn test_first_advance_is_noop() {
        let (mut sound, wall) = Sound::emit(1, 0, 5, 1);
        let mut walls = vec![wall];
        sound.advance(&mut walls);
        assert_eq!(sound.distance, 1);
        assert!(!sound.just_created);
        assert!(!walls[0].has_been_bounced_on);
    }

    #[test]
    fn test_bounce_on_own_wall() {
        let (mut sound, wall) = Sound::emit(1, 0, 5, 1);
        let mut walls = vec![wall];
        sound.advance(&mut walls);
        sound.advance(&mut walls);
        assert!(walls[0].has_been_bounced_on);
        assert_eq!(sound.velocity, -1);
        assert!(sound.is_absorbed());
    }

    #[test]
    fn test_passes_through_foreign_personal_wall() {
        // Sound 2 meets the personal wall of sound 1 at distance 1 and keeps going.
        let (mut sound, own) = Sound::emit(2, 0, 5, 3);
        let mut walls = vec![Wall::new(1, 0, 1), own];
        sound.advance(&mut walls);
        sound.advance(&mut walls);
        assert_eq!(sound.distance, 2);
        assert_eq!(sound.velocity, 1);
        assert!(!walls[0].has_been_bounced_on);
    }

    #[test]
    fn test_structural_wall_bounces_any_sound() {
        let wall = Wall::new(-1, 1, 2);
        assert!(wall.bounces(1));
        assert!(wall.bounces(99));
        let personal = Wall::new(4, 1, 2);
        assert!(personal.bounces(4));
        assert!(!personal.bounces(5));
    }

    #[test]
    fn test_other_direction_ignored() {
        let (mut sound, own) = Sound::emit(1, 0, 5, 2);
        let mut walls = vec![Wall::new(-1, 1, 1), own];
        sound.advance(&mut walls);
        sound.advance(&mut walls);
        assert_eq!(sound.distance, 2);
        assert!(!walls[0].has_been_bounced_on);
    }

    #[test]
    fn test_returning_sound_ignores_walls() {
        let mut sound = Sound {
            id: 1,
            direction: 0,
            intensity: 9,
            distance: 2,
            velocity: -1,
            just_created: false,
        };
        let mut walls = vec![Wall::new(-1, 0, 2)];
        sound.advance(&mut walls);
        assert_eq!(sound.distance, 1);
        assert!(!walls[0].has_been_bounced_on);
    }
}
