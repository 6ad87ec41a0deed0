//! Onboarding state machine
//!
//! Two linear step sequences. Each step waits for a condition on live
//! player state (or a countdown) and then moves forward; steps never
//! regress. The machine only gates hints, plus two teaching aids: half
//! speed while practising the branch hop and a free rocket charge.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::levels::TutorialKind;

/// Horizontal speed that counts as "moving" on the first step (2 px/frame)
const WELCOME_SPEED: f32 = 120.0;
/// Swing speed to leave the momentum step (18 px/frame)
const MOMENTUM_SPEED: f32 = 1080.0;
/// Release speed to leave the swing step (8 px/frame)
const RELEASE_SPEED: f32 = 480.0;
/// Advanced momentum threshold (22 px/frame)
const L2_MOMENTUM_SPEED: f32 = 1320.0;
const BRANCH_INFO_TIME: f32 = 4.0;
const L2_INTRO_TIME: f32 = 3.0;
/// Meters to cover before the ability step
const L2_DODGE_DISTANCE: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TutorialStep {
    Welcome,
    Grapple,
    Momentum,
    Swing,
    Jump,
    BranchInfo,
    L2Intro,
    L2Momentum,
    L2Branch,
    L2Dodge,
    L2Ability,
    Completed,
}

impl TutorialStep {
    pub fn message(&self) -> &'static str {
        match self {
            TutorialStep::Welcome => "Use A and D to swing your body.",
            TutorialStep::Grapple => "Click and hold on a tree to grapple.",
            TutorialStep::Momentum => "Pump the swing: D going right, A going left.",
            TutorialStep::Swing => "Let go at the top of the arc to fly.",
            TutorialStep::Jump => "Press W or Space to jump in mid-air.",
            TutorialStep::BranchInfo => "Branches break if you stand on them too long.",
            TutorialStep::L2Intro => "Dangers ahead. Swing fast to survive.",
            TutorialStep::L2Momentum => "Pump to top speed.",
            TutorialStep::L2Branch => "Land on a branch, then jump off before it breaks.",
            TutorialStep::L2Dodge => "Birds hurt. Swing high or low to dodge them.",
            TutorialStep::L2Ability => "Free rocket charge. Press E to blast off.",
            TutorialStep::Completed => "",
        }
    }
}

/// Live state the machine watches
#[derive(Debug, Clone, Copy, Default)]
pub struct Observation {
    pub pos: Vec2,
    pub vel: Vec2,
    pub is_swinging: bool,
    /// A movement key is held
    pub pumping: bool,
    /// A jump fired this step
    pub jumped: bool,
    pub standing_on_branch: bool,
    /// Meters travelled
    pub distance: u32,
    pub rocket_used: bool,
    /// Next anchor ahead of the player, for the grapple hint
    pub next_anchor: Option<Vec2>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tutorial {
    pub active: bool,
    pub step: TutorialStep,
    pub show_box: bool,
    pub message: String,
    pub target_pos: Option<Vec2>,
    /// Countdown for timed steps (seconds)
    pub timer: Option<f32>,
}

impl Tutorial {
    pub fn new(kind: TutorialKind) -> Self {
        let (active, step, timer) = match kind {
            TutorialKind::None => (false, TutorialStep::Completed, None),
            TutorialKind::Basic => (true, TutorialStep::Welcome, None),
            TutorialKind::Advanced => (true, TutorialStep::L2Intro, Some(L2_INTRO_TIME)),
        };
        Self {
            active,
            step,
            show_box: active,
            message: step.message().to_string(),
            target_pos: None,
            timer,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.step == TutorialStep::Completed
    }

    /// Simulation speed factor requested by the current step
    pub fn time_scale(&self, standing_on_branch: bool) -> f32 {
        if self.step == TutorialStep::L2Branch && standing_on_branch {
            0.5
        } else {
            1.0
        }
    }

    /// Whether the rocket cooldown is waived
    pub fn grants_rocket(&self) -> bool {
        self.step == TutorialStep::L2Ability
    }

    /// Poll once per step. Returns the new step if it advanced.
    pub fn update(&mut self, obs: &Observation, dt: f32) -> Option<TutorialStep> {
        if !self.active || self.is_completed() {
            return None;
        }
        let speed = obs.vel.length();
        let above = obs.pos - Vec2::new(0.0, 50.0);
        self.target_pos = Some(above);

        let next = match self.step {
            TutorialStep::Welcome => {
                (obs.pumping && obs.vel.x.abs() > WELCOME_SPEED).then_some(TutorialStep::Grapple)
            }
            TutorialStep::Grapple => {
                self.target_pos = obs.next_anchor.or(self.target_pos);
                obs.is_swinging.then_some(TutorialStep::Momentum)
            }
            TutorialStep::Momentum => {
                (obs.is_swinging && speed > MOMENTUM_SPEED).then_some(TutorialStep::Swing)
            }
            TutorialStep::Swing => {
                (!obs.is_swinging && obs.vel.x > RELEASE_SPEED).then_some(TutorialStep::Jump)
            }
            TutorialStep::Jump => obs.jumped.then_some(TutorialStep::BranchInfo),
            TutorialStep::BranchInfo | TutorialStep::L2Intro => {
                let timer = self.timer.get_or_insert(0.0);
                *timer -= dt;
                (*timer <= 0.0).then_some(match self.step {
                    TutorialStep::BranchInfo => TutorialStep::Completed,
                    _ => TutorialStep::L2Momentum,
                })
            }
            TutorialStep::L2Momentum => {
                (speed > L2_MOMENTUM_SPEED).then_some(TutorialStep::L2Branch)
            }
            TutorialStep::L2Branch => {
                if obs.standing_on_branch {
                    self.message = "It's breaking! Jump!".to_string();
                }
                (obs.standing_on_branch && obs.jumped).then_some(TutorialStep::L2Dodge)
            }
            TutorialStep::L2Dodge => {
                (obs.distance > L2_DODGE_DISTANCE).then_some(TutorialStep::L2Ability)
            }
            TutorialStep::L2Ability => obs.rocket_used.then_some(TutorialStep::Completed),
            TutorialStep::Completed => None,
        };

        let next = next.filter(|&step| step > self.step)?;
        self.enter(next);
        Some(next)
    }

    fn enter(&mut self, step: TutorialStep) {
        log::debug!("Tutorial: {:?} -> {:?}", self.step, step);
        self.step = step;
        self.message = step.message().to_string();
        self.timer = match step {
            TutorialStep::BranchInfo => Some(BRANCH_INFO_TIME),
            TutorialStep::L2Intro => Some(L2_INTRO_TIME),
            _ => None,
        };
        if step == TutorialStep::Completed {
            self.show_box = false;
            self.target_pos = None;
            log::info!("Tutorial completed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs() -> Observation {
        Observation::default()
    }

    #[test]
    fn test_no_tutorial_is_inert() {
        let mut tutorial = Tutorial::new(TutorialKind::None);
        assert!(!tutorial.active);
        assert!(tutorial.is_completed());
        assert_eq!(tutorial.update(&obs(), 1.0), None);
    }

    #[test]
    fn test_basic_sequence() {
        let mut t = Tutorial::new(TutorialKind::Basic);
        assert_eq!(t.step, TutorialStep::Welcome);

        // Drifting without input does not count
        let drifting = Observation {
            vel: Vec2::new(300.0, 0.0),
            ..obs()
        };
        assert_eq!(t.update(&drifting, 0.1), None);

        let moving = Observation {
            pumping: true,
            ..drifting
        };
        assert_eq!(t.update(&moving, 0.1), Some(TutorialStep::Grapple));

        let swinging = Observation {
            is_swinging: true,
            next_anchor: Some(Vec2::new(900.0, 100.0)),
            ..obs()
        };
        assert_eq!(t.update(&swinging, 0.1), Some(TutorialStep::Momentum));

        let fast = Observation {
            is_swinging: true,
            vel: Vec2::new(1100.0, 0.0),
            ..obs()
        };
        assert_eq!(t.update(&fast, 0.1), Some(TutorialStep::Swing));

        let released = Observation {
            vel: Vec2::new(600.0, -100.0),
            ..obs()
        };
        assert_eq!(t.update(&released, 0.1), Some(TutorialStep::Jump));

        let jumped = Observation {
            jumped: true,
            ..obs()
        };
        assert_eq!(t.update(&jumped, 0.1), Some(TutorialStep::BranchInfo));
        assert_eq!(t.timer, Some(BRANCH_INFO_TIME));

        assert_eq!(t.update(&obs(), 3.9), None);
        assert_eq!(t.update(&obs(), 0.2), Some(TutorialStep::Completed));
        assert!(!t.show_box);
        assert_eq!(t.update(&jumped, 0.1), None);
    }

    #[test]
    fn test_advanced_sequence() {
        let mut t = Tutorial::new(TutorialKind::Advanced);
        assert_eq!(t.step, TutorialStep::L2Intro);
        assert_eq!(t.update(&obs(), 2.0), None);
        assert_eq!(t.update(&obs(), 1.1), Some(TutorialStep::L2Momentum));

        let fast = Observation {
            vel: Vec2::new(1400.0, 0.0),
            ..obs()
        };
        assert_eq!(t.update(&fast, 0.1), Some(TutorialStep::L2Branch));

        let standing = Observation {
            standing_on_branch: true,
            ..obs()
        };
        assert_eq!(t.time_scale(true), 0.5);
        assert_eq!(t.update(&standing, 0.1), None);
        let hop = Observation {
            jumped: true,
            ..standing
        };
        assert_eq!(t.update(&hop, 0.1), Some(TutorialStep::L2Dodge));
        assert_eq!(t.time_scale(true), 1.0);

        let far = Observation {
            distance: 41,
            ..obs()
        };
        assert_eq!(t.update(&far, 0.1), Some(TutorialStep::L2Ability));
        assert!(t.grants_rocket());

        let rocket = Observation {
            rocket_used: true,
            ..obs()
        };
        assert_eq!(t.update(&rocket, 0.1), Some(TutorialStep::Completed));
        assert!(t.is_completed());
    }

    #[test]
    fn test_steps_only_move_forward() {
        let mut t = Tutorial::new(TutorialKind::Basic);
        let everything = Observation {
            pumping: true,
            is_swinging: true,
            vel: Vec2::new(2000.0, 0.0),
            jumped: true,
            ..obs()
        };
        let mut last = t.step;
        for _ in 0..50 {
            t.update(&everything, 0.5);
            assert!(t.step >= last);
            last = t.step;
        }
    }
}
