use tracing::trace;

use crate::entity::{Sound, Wall};

/// The simulation engine: every live sound and wall plus the sound sum.
///
/// Sounds and walls are kept in creation order; that order decides which
/// wall a sound hits when several share a cell.
#[derive(Debug, Clone)]
pub struct System {
    pub sounds: Vec<Sound>,
    pub walls: Vec<Wall>,
    /// Sum of the intensities absorbed during the last tick, mod 256.
    pub sound_sum: u8,
    next_sound_id: u64,
    next_wall_id: i64,
}

impl Default for System {
    fn default() -> Self {
        Self {
            sounds: Vec::new(),
            walls: Vec::new(),
            sound_sum: 0,
            next_sound_id: 1,
            next_wall_id: -1,
        }
    }
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a sound in `direction` with its personal wall at `distance`.
    ///
    /// Only intensities in `1..256` produce a sound; anything else is
    /// silently dropped. Returns the new sound's id.
    pub fn send(&mut self, direction: u8, intensity: u32, distance: u32) -> Option<u64> {
        if !(1..256).contains(&intensity) {
            return None;
        }
        let id = self.next_sound_id;
        self.next_sound_id += 1;
        let (sound, wall) = Sound::emit(id, direction, intensity as u8, distance);
        self.sounds.push(sound);
        self.walls.push(wall);
        Some(id)
    }

    /// Place a structural wall. Returns its (negative) id.
    pub fn spawn_wall(&mut self, direction: u8, distance: u32) -> i64 {
        let id = self.next_wall_id;
        self.next_wall_id -= 1;
        self.walls.push(Wall::new(id, direction, distance));
        id
    }

    /// Advance every sound by one step.
    ///
    /// Sounds that reach the origin are absorbed: their intensities make up
    /// the new sound sum and they disappear together with their personal
    /// walls. Every wall bounced on during the tick is removed as well.
    pub fn tick(&mut self) {
        let mut sum: u32 = 0;
        let mut absorbed: Vec<u64> = Vec::new();

        for sound in &mut self.sounds {
            sound.advance(&mut self.walls);
            if sound.is_absorbed() {
                sum += u32::from(sound.intensity);
                absorbed.push(sound.id);
            }
        }

        self.sounds.retain(|s| !s.is_absorbed());
        self.walls.retain(|w| {
            let orphaned = !w.is_structural() && absorbed.contains(&(w.id as u64));
            !(orphaned || w.has_been_bounced_on)
        });

        self.sound_sum = (sum % 256) as u8;
        trace!(
            sounds = self.sounds.len(),
            walls = self.walls.len(),
            absorbed = absorbed.len(),
            sound_sum = self.sound_sum,
            "tick"
        );
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Event {
        Send { direction: u8, intensity: u32, distance: u32 },
        Wall { direction: u8, distance: u32 },
        Tick,
    }

    fn event() -> impl Strategy<Value = Event> {
        prop_oneof![
            (0u8..4, 0u32..300, 1u32..8).prop_map(|(direction, intensity, distance)| Event::Send {
                direction,
                intensity,
                distance,
            }),
            (0u8..4, 1u32..8).prop_map(|(direction, distance)| Event::Wall { direction, distance }),
            Just(Event::Tick),
            Just(Event::Tick),
        ]
    }

    proptest! {
        #[test]
        fn outward_sounds_keep_their_wall(events in prop::collection::vec(event(), 0..64)) {
            let mut system = System::new();
            for event in events {
                match event {
                    Event::Send { direction, intensity, distance } => {
                        system.send(direction, intensity, distance);
                    }
                    Event::Wall { direction, distance } => {
                        system.spawn_wall(direction, distance);
                    }
                    Event::Tick => system.tick(),
                }
                for sound in &system.sounds {
                    let own = system.walls.iter().filter(|w| w.id == sound.id as i64).count();
                    prop_assert!(own <= 1);
                    if sound.velocity > 0 {
                        prop_assert_eq!(own, 1);
                    }
                    prop_assert!(sound.distance > 0);
                }
                prop_assert!(system.walls.iter().all(|w| !w.has_been_bounced_on));
            }
        }

        #[test]
        fn ids_never_reused(sends in prop::collection::vec(1u32..256, 1..32)) {
            let mut system = System::new();
            let mut last = 0;
            for intensity in sends {
                let id = system.send(0, intensity, 2).unwrap();
                prop_assert!(id > last);
                last = id;
                system.tick();
            }
        }
    }
}
