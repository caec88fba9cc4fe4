//! Baked event frames of a single obstacle.

use openbound_core::{
    is_marker_unit, Aabb, ExplosionRecord, GraphicCue, ObstacleDefinition, SoundCue, Vec2,
    TELEPORT_DESTINATION_UNIT, TELEPORT_ORIGIN_UNIT,
};

use crate::ObstacleError;

const TELEPORT_CUE: &str = "hallucination";

/// Scripted effect fired by an obstacle frame.
#[derive(Clone, Debug, PartialEq)]
pub enum TriggerEvent {
    /// Kills the unit if its footprint overlaps `area`.
    Kill {
        /// Lethal rectangle.
        area: Aabb,
    },
    /// Moves the unit to `destination` if its footprint overlaps `origin`.
    Teleport {
        /// Trigger rectangle.
        origin: Aabb,
        /// Landing point.
        destination: Vec2,
    },
    /// Switches the obstacle to one of its wall configurations.
    WallDelta {
        /// Index into the obstacle's wall configurations.
        configuration: u32,
    },
    /// Visual effect for the renderer.
    Graphic(GraphicCue),
    /// Sound effect for the audio layer.
    Sound(SoundCue),
}

/// Cyclic sequence of event frames.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    frames: Vec<Vec<TriggerEvent>>,
}

impl Timeline {
    /// Bakes the explosion records of `definition` into frames.
    ///
    /// # Errors
    ///
    /// Returns [`ObstacleError::UnknownLocation`] when a record places a unit
    /// on a location the obstacle does not declare.
    pub fn bake(definition: &ObstacleDefinition) -> Result<Self, ObstacleError> {
        let mut baker = Baker {
            definition,
            frames: vec![Vec::new()],
        };
        for record in &definition.explosions {
            baker.add_record(record)?;
        }

        let mut frames = baker.frames;
        if frames.len() > 1 {
            if let Some(last) = frames.pop() {
                frames[0].extend(last);
            }
        }
        Ok(Self { frames })
    }

    /// All frames in playback order.
    #[must_use]
    pub fn frames(&self) -> &[Vec<TriggerEvent>] {
        &self.frames
    }

    /// Number of frames in one cycle.
    #[must_use]
    pub fn cycle_length(&self) -> usize {
        self.frames.len()
    }

    /// Events of the frame at `index`, wrapping around the cycle.
    #[must_use]
    pub fn frame(&self, index: usize) -> &[TriggerEvent] {
        &self.frames[index % self.frames.len()]
    }
}

struct Baker<'a> {
    definition: &'a ObstacleDefinition,
    frames: Vec<Vec<TriggerEvent>>,
}

impl Baker<'_> {
    fn area(&self, name: &str) -> Result<Aabb, ObstacleError> {
        self.definition
            .location(name)
            .map(|location| location.area)
            .ok_or_else(|| ObstacleError::UnknownLocation {
                obstacle: self.definition.id,
                name: name.to_owned(),
            })
    }

    fn add_record(&mut self, record: &ExplosionRecord) -> Result<(), ObstacleError> {
        for placement in &record.placements {
            let _ = self.area(&placement.location)?;
        }

        self.add_wall_delta(record)?;
        self.add_teleport(record)?;

        let mut events = Vec::new();
        let mut sounds: Vec<&str> = Vec::new();
        for placement in record
            .placements
            .iter()
            .filter(|placement| !is_marker_unit(&placement.unit))
        {
            let area = self.area(&placement.location)?;
            events.push(TriggerEvent::Kill { area });
            events.push(TriggerEvent::Graphic(GraphicCue {
                name: placement.unit.clone(),
                position: area.center(),
            }));
            if !sounds.contains(&placement.unit.as_str()) {
                sounds.push(&placement.unit);
            }
        }
        self.append(events, &sounds, record.delay);
        Ok(())
    }

    /// Every record resets the obstacle's walls to the configuration it places.
    fn add_wall_delta(&mut self, record: &ExplosionRecord) -> Result<(), ObstacleError> {
        let flags = self.definition.wall_flags_for(record);
        let configuration = self
            .definition
            .configuration_index(record)
            .ok_or(ObstacleError::MissingConfiguration {
                obstacle: self.definition.id,
            })?;
        let mut events: Vec<TriggerEvent> = self
            .definition
            .locations
            .iter()
            .zip(flags.flags())
            .filter(|(_, walled)| **walled)
            .map(|(location, _)| TriggerEvent::Kill {
                area: location.area,
            })
            .collect();
        events.push(TriggerEvent::WallDelta {
            configuration: u32::try_from(configuration).unwrap_or(u32::MAX),
        });
        self.append(events, &[], 0);
        Ok(())
    }

    fn add_teleport(&mut self, record: &ExplosionRecord) -> Result<(), ObstacleError> {
        let first_named = |unit: &str| {
            record
                .placements
                .iter()
                .find(|placement| placement.unit == unit)
                .map(|placement| placement.location.as_str())
        };
        let (Some(origin), Some(destination)) = (
            first_named(TELEPORT_ORIGIN_UNIT),
            first_named(TELEPORT_DESTINATION_UNIT),
        ) else {
            return Ok(());
        };
        let origin = self.area(origin)?;
        let destination = self.area(destination)?.center();
        let events = vec![
            TriggerEvent::Graphic(GraphicCue {
                name: TELEPORT_CUE.to_owned(),
                position: origin.center(),
            }),
            TriggerEvent::Graphic(GraphicCue {
                name: TELEPORT_CUE.to_owned(),
                position: destination,
            }),
            TriggerEvent::Teleport {
                origin,
                destination,
            },
        ];
        self.append(events, &[TELEPORT_CUE], 0);
        Ok(())
    }

    fn append(&mut self, mut events: Vec<TriggerEvent>, sounds: &[&str], delay: u32) {
        events.extend(sounds.iter().map(|name| {
            TriggerEvent::Sound(SoundCue {
                name: (*name).to_owned(),
            })
        }));
        if let Some(current) = self.frames.last_mut() {
            current.extend(events);
        }
        for _ in 0..delay {
            self.frames.push(Vec::new());
        }
    }
}

#[cfg(test)]
mod tests {
    use openbound_core::{NamedLocation, ObstacleId, Placement};

    use super::*;

    fn location(name: &str, column: f32) -> NamedLocation {
        NamedLocation {
            name: name.to_owned(),
            area: Aabb::from_corners(
                Vec2::new(column * 16.0, 32.0),
                Vec2::new(column * 16.0 + 16.0, 48.0),
            ),
        }
    }

    fn record(placements: &[(&str, &str)], delay: u32) -> ExplosionRecord {
        ExplosionRecord {
            placements: placements
                .iter()
                .map(|(location, unit)| Placement {
                    location: (*location).to_owned(),
                    unit: (*unit).to_owned(),
                })
                .collect(),
            delay,
        }
    }

    fn obstacle(explosions: Vec<ExplosionRecord>) -> ObstacleDefinition {
        ObstacleDefinition {
            id: ObstacleId::new(0),
            start_box: Aabb::from_corners(Vec2::ZERO, Vec2::splat(16.0)),
            end_box: Aabb::from_corners(Vec2::splat(200.0), Vec2::splat(216.0)),
            revive: Vec2::new(8.0, 8.0),
            actions: Vec::new(),
            locations: vec![location("1", 2.0), location("2", 3.0), location("3", 4.0)],
            explosions,
        }
    }

    fn kill(definition: &ObstacleDefinition, name: &str) -> TriggerEvent {
        TriggerEvent::Kill {
            area: definition.location(name).map(|l| l.area).expect("declared"),
        }
    }

    #[test]
    fn explosions_are_followed_by_their_delay() {
        let definition = obstacle(vec![
            record(&[("1", "scourge"), ("2", "scourge")], 2),
            record(&[("3", "zergling")], 3),
        ]);
        let timeline = Timeline::bake(&definition).expect("bakes");
        // Two delays of 2 and 3 frames, with the trailing frame folded into the first.
        assert_eq!(timeline.cycle_length(), 5);

        let first = timeline.frame(0);
        assert_eq!(first[0], TriggerEvent::WallDelta { configuration: 0 });
        assert_eq!(first[1], kill(&definition, "1"));
        assert_eq!(
            first[2],
            TriggerEvent::Graphic(GraphicCue {
                name: "scourge".to_owned(),
                position: Vec2::new(40.0, 40.0),
            })
        );
        assert_eq!(
            first[5],
            TriggerEvent::Sound(SoundCue {
                name: "scourge".to_owned(),
            })
        );
        assert_eq!(first.len(), 6);
        assert!(timeline.frame(1).is_empty());

        let third = timeline.frame(2);
        assert_eq!(third[0], TriggerEvent::WallDelta { configuration: 0 });
        assert_eq!(third[1], kill(&definition, "3"));
        assert_eq!(third.len(), 4);
        assert_eq!(timeline.frame(7), timeline.frame(2));
    }

    #[test]
    fn wall_units_become_kills_and_a_wall_delta() {
        let definition = obstacle(vec![
            record(&[("1", "crystal"), ("3", "psi_emitter")], 1),
            record(&[("2", "crystal")], 1),
        ]);
        let timeline = Timeline::bake(&definition).expect("bakes");
        assert_eq!(timeline.cycle_length(), 2);
        let configurations = definition.wall_configurations();
        assert_eq!(configurations.len(), 3);

        let first = timeline.frame(0);
        assert_eq!(
            first,
            &[
                kill(&definition, "1"),
                kill(&definition, "3"),
                TriggerEvent::WallDelta { configuration: 2 },
            ]
        );
        let second = timeline.frame(1);
        assert_eq!(
            second,
            &[
                kill(&definition, "2"),
                TriggerEvent::WallDelta { configuration: 1 },
            ]
        );
    }

    #[test]
    fn teleport_pairs_flash_both_ends() {
        let definition = obstacle(vec![record(
            &[("1", "tele_origin"), ("3", "tele_destination")],
            0,
        )]);
        let timeline = Timeline::bake(&definition).expect("bakes");
        assert_eq!(timeline.cycle_length(), 1);
        let frame = timeline.frame(0);
        assert!(frame.contains(&TriggerEvent::Teleport {
            origin: definition.location("1").map(|l| l.area).expect("declared"),
            destination: Vec2::new(72.0, 40.0),
        }));
        assert_eq!(
            frame.last(),
            Some(&TriggerEvent::Sound(SoundCue {
                name: "hallucination".to_owned(),
            }))
        );
        assert!(!frame
            .iter()
            .any(|event| matches!(event, TriggerEvent::Kill { .. })));
    }

    #[test]
    fn unknown_locations_fail_to_bake() {
        let definition = obstacle(vec![record(&[("9", "scourge")], 1)]);
        assert_eq!(
            Timeline::bake(&definition),
            Err(ObstacleError::UnknownLocation {
                obstacle: ObstacleId::new(0),
                name: "9".to_owned(),
            })
        );
    }
}
