use super::config::DriftConfig;
use super::input::SteerInput;

/// Live state of one drift, created on entry and dropped on exit.
#[derive(Clone, Debug)]
struct DriftEpisode {
    /// Counts down while the entry gesture has lapsed; refreshed whenever
    /// the gesture re-arms. Drift ends when it hits zero.
    release_timer: f32,
}

/// Drift entry/exit policy plus the friction and turn modifiers applied
/// while a drift is live.
#[derive(Clone, Debug)]
pub struct DriftModel {
    config: DriftConfig,
    episode: Option<DriftEpisode>,
}

impl DriftModel {
    pub fn new(config: DriftConfig) -> Self {
        Self {
            config,
            episode: None,
        }
    }

    /// The gesture that arms a drift: one wheel held while the other is
    /// being driven.
    pub fn opposing_hold(steer: &SteerInput) -> bool {
        match *steer {
            SteerInput::Wheels {
                left,
                right,
                left_held,
                right_held,
            } => (left_held && right != 0.0) || (right_held && left != 0.0),
            SteerInput::Stick { .. } => false,
        }
    }

    /// Whether this tick should be spent drifting. Entry needs both speed
    /// and the gesture; an in-flight drift survives a gesture lapse until
    /// the release grace runs out, but dies the moment speed collapses.
    pub fn wants_drift(&self, speed: f32, steer: &SteerInput) -> bool {
        let armed = Self::opposing_hold(steer);
        match &self.episode {
            None => speed > self.config.speed_threshold && armed,
            Some(episode) => {
                if speed < self.config.speed_threshold * self.config.exit_speed_fraction {
                    return false;
                }
                armed || episode.release_timer > 0.0
            }
        }
    }

    /// Ticks the release countdown. Call once per tick while an episode is
    /// live; harmless otherwise.
    pub fn advance(&mut self, dt: f32, armed: bool) {
        if let Some(episode) = &mut self.episode {
            if armed {
                episode.release_timer = self.config.release_grace;
            } else {
                episode.release_timer = (episode.release_timer - dt).max(0.0);
            }
        }
    }

    pub fn begin_episode(&mut self) {
        self.episode = Some(DriftEpisode {
            release_timer: self.config.release_grace,
        });
    }

    pub fn end_episode(&mut self) {
        self.episode = None;
    }

    pub fn is_drifting(&self) -> bool {
        self.episode.is_some()
    }

    /// Factor on the velocity blend sharpness; below 1 while drifting.
    pub fn sharpness_factor(&self) -> f32 {
        if self.episode.is_some() {
            self.config.friction_factor
        } else {
            1.0
        }
    }

    /// Gain on the turn rate; above 1 while drifting.
    pub fn turn_multiplier(&self) -> f32 {
        if self.episode.is_some() {
            self.config.turn_multiplier
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed_steer() -> SteerInput {
        SteerInput::Wheels {
            left: 0.0,
            right: 1.0,
            left_held: true,
            right_held: false,
        }
    }

    fn idle_steer() -> SteerInput {
        SteerInput::NEUTRAL_WHEELS
    }

    fn model() -> DriftModel {
        DriftModel::new(DriftConfig::default())
    }

    #[test]
    fn entry_needs_speed_and_gesture() {
        let model = model();
        let threshold = DriftConfig::default().speed_threshold;

        assert!(!model.wants_drift(0.0, &armed_steer()));
        assert!(!model.wants_drift(threshold + 1.0, &idle_steer()));
        assert!(model.wants_drift(threshold + 1.0, &armed_steer()));
    }

    #[test]
    fn stick_input_never_arms() {
        let model = model();
        let steer = SteerInput::Stick {
            forward: 1.0,
            right: 1.0,
        };
        assert!(!model.wants_drift(100.0, &steer));
    }

    #[test]
    fn gesture_lapse_within_grace_keeps_drifting() {
        let mut model = model();
        let speed = DriftConfig::default().speed_threshold + 2.0;

        model.begin_episode();
        model.advance(0.1, false);
        assert!(model.wants_drift(speed, &idle_steer()));
    }

    #[test]
    fn gesture_lapse_beyond_grace_exits() {
        let mut model = model();
        let config = DriftConfig::default();
        let speed = config.speed_threshold + 2.0;

        model.begin_episode();
        let mut elapsed = 0.0;
        while elapsed < config.release_grace + 0.05 {
            model.advance(0.05, false);
            elapsed += 0.05;
        }
        assert!(!model.wants_drift(speed, &idle_steer()));
    }

    #[test]
    fn rearming_refreshes_the_grace() {
        let mut model = model();
        let config = DriftConfig::default();
        let speed = config.speed_threshold + 2.0;

        model.begin_episode();
        model.advance(config.release_grace - 0.01, false);
        model.advance(0.05, true);
        model.advance(config.release_grace - 0.01, false);
        assert!(model.wants_drift(speed, &idle_steer()));
    }

    #[test]
    fn speed_collapse_exits_immediately() {
        let mut model = model();
        let config = DriftConfig::default();

        model.begin_episode();
        let slow = config.speed_threshold * config.exit_speed_fraction - 0.1;
        assert!(!model.wants_drift(slow, &armed_steer()));
    }

    #[test]
    fn modifiers_apply_only_while_drifting() {
        let mut model = model();
        assert_eq!(model.sharpness_factor(), 1.0);
        assert_eq!(model.turn_multiplier(), 1.0);

        model.begin_episode();
        let config = DriftConfig::default();
        assert_eq!(model.sharpness_factor(), config.friction_factor);
        assert_eq!(model.turn_multiplier(), config.turn_multiplier);

        model.end_episode();
        assert_eq!(model.sharpness_factor(), 1.0);
    }
}
