//! Troll effect scheduler
//!
//! One-shot delayed effects armed at level load. Each effect activates after
//! its delay and (except decoy exits) reverts after its duration. Timers are
//! advanced by the host clock and fire on tick boundaries only.
//!
//! Every task carries the load generation it was armed for. Arming a new
//! level or cancelling drops the whole queue and bumps the generation, so a
//! timer from an unloaded level can never touch a later world.

use std::collections::BTreeSet;

use rand::Rng;

use super::collision::Rect;
use super::level::PerturbationTag;
use super::state::{GameEvent, World};
use crate::settings::TrollTuning;

#[derive(Debug, Clone, Copy, PartialEq)]
enum TrollAction {
    Activate(PerturbationTag),
    /// Undo an activation; `platform` is the index hidden by `Invisible`
    Revert {
        tag: PerturbationTag,
        platform: Option<usize>,
    },
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    due_ms: f64,
    /// Insertion order, breaks ties between tasks due at the same time
    seq: u64,
    generation: u64,
    action: TrollAction,
}

/// Cancellable timer queue for troll effects
#[derive(Debug, Clone)]
pub struct TrollScheduler {
    tuning: TrollTuning,
    now_ms: f64,
    generation: u64,
    next_seq: u64,
    tasks: Vec<ScheduledTask>,
}

impl TrollScheduler {
    pub fn new(tuning: TrollTuning) -> Self {
        Self {
            tuning,
            now_ms: 0.0,
            generation: 0,
            next_seq: 0,
            tasks: Vec::new(),
        }
    }

    pub fn tuning(&self) -> &TrollTuning {
        &self.tuning
    }

    /// Current load generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Scheduler clock (ms since creation)
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Number of timers still queued
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Drop every queued timer and start a new generation
    pub fn cancel_all(&mut self) {
        if !self.tasks.is_empty() {
            log::debug!(
                "Cancelling {} troll timers (generation {})",
                self.tasks.len(),
                self.generation
            );
        }
        self.tasks.clear();
        self.generation += 1;
    }

    /// Cancel the previous load's timers and arm `tags` for a new one.
    /// Returns the generation token the new world must carry.
    pub fn arm(&mut self, tags: &BTreeSet<PerturbationTag>) -> u64 {
        self.cancel_all();
        for &tag in tags {
            let delay = self.delay_ms(tag);
            self.schedule(delay, TrollAction::Activate(tag));
        }
        if !tags.is_empty() {
            log::debug!("Armed {:?} for generation {}", tags, self.generation);
        }
        self.generation
    }

    fn schedule(&mut self, due_in_ms: f64, action: TrollAction) {
        self.schedule_at(self.now_ms + due_in_ms, action);
    }

    fn schedule_at(&mut self, due_ms: f64, action: TrollAction) {
        self.tasks.push(ScheduledTask {
            due_ms,
            seq: self.next_seq,
            generation: self.generation,
            action,
        });
        self.next_seq += 1;
    }

    fn delay_ms(&self, tag: PerturbationTag) -> f64 {
        match tag {
            PerturbationTag::Reverse => self.tuning.reverse_delay_ms,
            PerturbationTag::Speed => self.tuning.speed_delay_ms,
            PerturbationTag::Invisible => self.tuning.invisible_delay_ms,
            PerturbationTag::FakeExit => self.tuning.fake_exit_delay_ms,
        }
    }

    fn duration_ms(&self, tag: PerturbationTag) -> Option<f64> {
        match tag {
            PerturbationTag::Reverse => Some(self.tuning.reverse_duration_ms),
            PerturbationTag::Speed => Some(self.tuning.speed_duration_ms),
            PerturbationTag::Invisible => Some(self.tuning.invisible_duration_ms),
            PerturbationTag::FakeExit => None,
        }
    }

    /// Advance the clock by `dt_ms` and fire everything that came due, in
    /// due order. A revert scheduled by an activation in this same call
    /// still fires if it falls inside the window.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        dt_ms: f64,
        world: &mut World,
        rng: &mut R,
    ) -> Vec<GameEvent> {
        self.now_ms += dt_ms.max(0.0);
        let mut events = Vec::new();

        while let Some(index) = self.next_due() {
            let task = self.tasks.swap_remove(index);
            if task.generation != world.generation {
                log::warn!(
                    "Dropping stale troll timer (generation {} vs world {})",
                    task.generation,
                    world.generation
                );
                continue;
            }
            self.fire(task, world, rng, &mut events);
        }

        events
    }

    fn next_due(&self) -> Option<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= self.now_ms)
            .min_by(|(_, a), (_, b)| {
                a.due_ms
                    .partial_cmp(&b.due_ms)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|(i, _)| i)
    }

    fn fire<R: Rng + ?Sized>(
        &mut self,
        task: ScheduledTask,
        world: &mut World,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        match task.action {
            TrollAction::Activate(tag) => {
                let Some(platform) = self.activate(tag, world, rng) else {
                    return;
                };
                log::info!("Troll activated: {}", tag.as_str());
                events.push(GameEvent::TrollActivated {
                    tag,
                    message: toast_message(tag),
                    toast_ms: self.tuning.toast_ms,
                });
                if let Some(duration) = self.duration_ms(tag) {
                    // Measured from when the effect was due, not when it was polled
                    self.schedule_at(task.due_ms + duration, TrollAction::Revert { tag, platform });
                }
            }
            TrollAction::Revert { tag, platform } => {
                match tag {
                    PerturbationTag::Reverse => world.perturbation.controls_reversed = false,
                    PerturbationTag::Speed => world.perturbation.speed_multiplier = 1.0,
                    PerturbationTag::Invisible => {
                        if let Some(index) = platform {
                            world.invisible_platforms.remove(&index);
                        }
                    }
                    PerturbationTag::FakeExit => {}
                }
                log::debug!("Troll reverted: {}", tag.as_str());
                events.push(GameEvent::TrollReverted { tag });
            }
        }
    }

    /// Apply an effect. Returns `None` when it could not apply (no platforms
    /// to hide), otherwise the hidden platform index if any.
    fn activate<R: Rng + ?Sized>(
        &self,
        tag: PerturbationTag,
        world: &mut World,
        rng: &mut R,
    ) -> Option<Option<usize>> {
        match tag {
            PerturbationTag::Reverse => {
                world.perturbation.controls_reversed = true;
                Some(None)
            }
            PerturbationTag::Speed => {
                world.perturbation.speed_multiplier = self.tuning.speed_multiplier;
                Some(None)
            }
            PerturbationTag::Invisible => {
                if world.platforms.is_empty() {
                    return None;
                }
                let index = rng.random_range(0..world.platforms.len());
                world.invisible_platforms.insert(index);
                Some(Some(index))
            }
            PerturbationTag::FakeExit => {
                world.decoy_exits.push(decoy_near(&world.exit, world, rng));
                Some(None)
            }
        }
    }
}

/// Decoy one to three tiles beside the real exit, kept on screen
fn decoy_near<R: Rng + ?Sized>(exit: &Rect, world: &World, rng: &mut R) -> Rect {
    let tile = world.tile_size;
    let side = if rng.random::<bool>() { 1.0 } else { -1.0 };
    let dx = side * tile * rng.random_range(1.0..3.0);
    let dy = tile * rng.random_range(-1.0..1.0);
    Rect::new(
        (exit.x + dx).clamp(0.0, (world.viewport.width - exit.w).max(0.0)),
        (exit.y + dy).clamp(0.0, (world.viewport.height - exit.h).max(0.0)),
        exit.w,
        exit.h,
    )
}

fn toast_message(tag: PerturbationTag) -> &'static str {
    match tag {
        PerturbationTag::Reverse => "🔄 Controls Reversed!",
        PerturbationTag::Speed => "⚡ Speed Boost!",
        PerturbationTag::Invisible => "👻 Invisible Platform",
        PerturbationTag::FakeExit => "🚪 Which exit is real?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Difficulty;
    use crate::sim::level::generate_level;
    use crate::sim::loader::load_level;
    use crate::sim::state::Viewport;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup(tags: &[PerturbationTag]) -> (World, TrollScheduler, Pcg32) {
        let mut spec = generate_level(3, Difficulty::Medium);
        spec.tags = tags.iter().copied().collect();
        let mut scheduler = TrollScheduler::new(TrollTuning::default());
        let mut rng = Pcg32::seed_from_u64(42);
        let world = load_level(
            &spec,
            3,
            Viewport::new(1280.0, 720.0),
            &mut scheduler,
            &mut rng,
        )
        .unwrap();
        (world, scheduler, rng)
    }

    #[test]
    fn test_reverse_activates_and_reverts() {
        let (mut world, mut scheduler, mut rng) = setup(&[PerturbationTag::Reverse]);

        scheduler.advance(2999.0, &mut world, &mut rng);
        assert!(!world.perturbation.controls_reversed);

        let events = scheduler.advance(1.0, &mut world, &mut rng);
        assert!(world.perturbation.controls_reversed);
        assert!(matches!(
            events[0],
            GameEvent::TrollActivated {
                tag: PerturbationTag::Reverse,
                ..
            }
        ));

        scheduler.advance(4999.0, &mut world, &mut rng);
        assert!(world.perturbation.controls_reversed);
        let events = scheduler.advance(1.0, &mut world, &mut rng);
        assert!(!world.perturbation.controls_reversed);
        assert_eq!(
            events,
            vec![GameEvent::TrollReverted {
                tag: PerturbationTag::Reverse
            }]
        );
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_speed_reverts_within_one_large_step() {
        let (mut world, mut scheduler, mut rng) = setup(&[PerturbationTag::Speed]);
        scheduler.advance(2000.0, &mut world, &mut rng);
        assert_eq!(world.perturbation.speed_multiplier, 1.8);

        // Host stalls: activation and revert both inside one window
        let (mut world, mut scheduler, mut rng) = setup(&[PerturbationTag::Speed]);
        let events = scheduler.advance(10_000.0, &mut world, &mut rng);
        assert_eq!(events.len(), 2);
        assert!(world.perturbation.is_neutral());
    }

    #[test]
    fn test_invisible_hides_one_platform_then_restores() {
        let (mut world, mut scheduler, mut rng) = setup(&[PerturbationTag::Invisible]);
        scheduler.advance(3500.0, &mut world, &mut rng);

        assert_eq!(world.invisible_platforms.len(), 1);
        let index = *world.invisible_platforms.iter().next().unwrap();
        assert!(world.is_platform_hidden(index));
        let hidden = (0..world.platforms.len())
            .filter(|&i| world.is_platform_hidden(i))
            .count();
        assert_eq!(hidden, 1);

        scheduler.advance(5500.0, &mut world, &mut rng);
        assert!(world.invisible_platforms.is_empty());
        assert!(!world.is_platform_hidden(index));
    }

    #[test]
    fn test_fake_exit_spawns_persistent_decoy() {
        let (mut world, mut scheduler, mut rng) = setup(&[PerturbationTag::FakeExit]);
        scheduler.advance(500.0, &mut world, &mut rng);
        assert_eq!(world.decoy_exits.len(), 1);

        let decoy = world.decoy_exits[0];
        assert_ne!(decoy, world.exit);
        assert!((decoy.x - world.exit.x).abs() <= 3.0 * world.tile_size);
        assert!((decoy.y - world.exit.y).abs() <= world.tile_size);

        scheduler.advance(60_000.0, &mut world, &mut rng);
        assert_eq!(world.decoy_exits.len(), 1);
    }

    #[test]
    fn test_rearm_cancels_previous_timers() {
        let (mut world, mut scheduler, mut rng) =
            setup(&[PerturbationTag::Reverse, PerturbationTag::Speed]);
        scheduler.advance(1000.0, &mut world, &mut rng);

        // Reload before anything fired
        let (mut fresh, _, _) = setup(&[]);
        fresh.generation = scheduler.arm(&BTreeSet::new());
        assert_eq!(scheduler.pending(), 0);

        let events = scheduler.advance(20_000.0, &mut fresh, &mut rng);
        assert!(events.is_empty());
        assert!(fresh.perturbation.is_neutral());
    }

    #[test]
    fn test_mismatched_generation_is_dropped() {
        let (_, mut scheduler, mut rng) = setup(&[PerturbationTag::Reverse]);
        // World from some other load that never re-armed this scheduler
        let (mut other, _, _) = setup(&[]);
        other.generation = scheduler.generation() + 7;

        let events = scheduler.advance(5000.0, &mut other, &mut rng);
        assert!(events.is_empty());
        assert!(!other.perturbation.controls_reversed);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_cancel_all_bumps_generation() {
        let (_, mut scheduler, _) = setup(&[PerturbationTag::Speed]);
        let before = scheduler.generation();
        scheduler.cancel_all();
        assert_eq!(scheduler.generation(), before + 1);
        assert_eq!(scheduler.pending(), 0);
    }
}
