use aerobot_proto::{Command, Direction};

/// Per-direction travel counters bounding drift without position feedback.
///
/// A move in direction D counts up D (capped at `max_moves`) and relaxes the
/// opposite direction by one (floored at 0). `max_moves == 0` disables the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionalBudget {
    counts: [u32; 6],
    max_moves: u32,
}

impl DirectionalBudget {
    pub fn new(max_moves: u32) -> Self {
        Self { counts: [0; 6], max_moves }
    }

    pub fn max_moves(&self) -> u32 {
        self.max_moves
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_moves == 0
    }

    pub fn count(&self, direction: Direction) -> u32 {
        self.counts[direction.index()]
    }

    /// Records `command` against the budget and returns whether it may be dispatched.
    ///
    /// The opposite counter is relaxed even when the command itself is refused.
    pub fn try_move(&mut self, command: Command) -> bool {
        if self.is_unlimited() {
            return true;
        }
        let Some(dir) = command.direction() else { return true; };

        let own = dir.index();
        let opposite = dir.opposite().index();
        let before = self.counts[own];

        self.counts[own] = before.saturating_add(1).min(self.max_moves);
        self.counts[opposite] = self.counts[opposite].saturating_sub(1);

        before < self.max_moves
    }
}

/// Pure form of [`DirectionalBudget::try_move`].
pub fn admit(command: Command, budget: DirectionalBudget) -> (bool, DirectionalBudget) {
    let mut next = budget;
    let allowed = next.try_move(command);
    (allowed, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_direction_is_capped_at_max_moves() {
        let mut b = DirectionalBudget::new(4);
        let admitted: Vec<bool> = (0..5).map(|_| b.try_move(Command::Left)).collect();

        assert_eq!(admitted, vec![true, true, true, true, false]);
        assert_eq!(b.count(Direction::Left), 4);
        assert_eq!(b.count(Direction::Right), 0);
    }

    #[test]
    fn reversing_relaxes_the_opposite_counter() {
        let mut b = DirectionalBudget::new(4);
        assert!(b.try_move(Command::Left));
        assert!(b.try_move(Command::Left));
        assert!(b.try_move(Command::Right));

        assert_eq!(b.count(Direction::Left), 1);
        assert_eq!(b.count(Direction::Right), 1);
    }

    #[test]
    fn opposite_move_after_exhaustion_is_admitted_and_reopens_budget() {
        let mut b = DirectionalBudget::new(2);
        assert!(b.try_move(Command::Up));
        assert!(b.try_move(Command::Up));
        assert!(!b.try_move(Command::Up));

        assert!(b.try_move(Command::Down));
        assert_eq!(b.count(Direction::Up), 1);
        assert_eq!(b.count(Direction::Down), 1);

        // one slot freed upwards
        assert!(b.try_move(Command::Up));
        assert!(!b.try_move(Command::Up));
    }

    #[test]
    fn opposite_counter_is_already_zero_when_a_move_is_refused() {
        let mut b = DirectionalBudget::new(2);
        let pattern = [
            Command::Forward, Command::Backward, Command::Forward, Command::Forward,
            Command::Forward, Command::Backward, Command::Backward, Command::Backward,
        ];
        for cmd in pattern {
            let dir = cmd.direction().unwrap();
            let before = b;
            if !b.try_move(cmd) {
                assert_eq!(before.count(dir.opposite()), 0);
                assert_eq!(b, before);
            }
        }
    }

    #[test]
    fn zero_max_moves_disables_limiting() {
        let mut b = DirectionalBudget::new(0);
        for _ in 0..10 {
            assert!(b.try_move(Command::Up));
        }
        assert_eq!(b.count(Direction::Up), 0);
    }

    #[test]
    fn non_directional_commands_leave_budget_untouched() {
        let b = DirectionalBudget::new(1);
        for cmd in [
            Command::TakeOff,
            Command::RotateLeft,
            Command::RotateRight,
            Command::FrontFlip,
            Command::Bounce,
            Command::Land,
        ] {
            let (allowed, next) = admit(cmd, b);
            assert!(allowed, "{cmd} must always be admitted");
            assert_eq!(next, b);
        }
    }

    #[test]
    fn counters_stay_within_bounds() {
        let mut b = DirectionalBudget::new(3);
        let pattern = [
            Command::Left, Command::Left, Command::Left, Command::Left, Command::Right,
            Command::Right, Command::Right, Command::Right, Command::Right, Command::Left,
        ];
        for cmd in pattern.iter().cycle().take(50) {
            b.try_move(*cmd);
            for d in Direction::ALL {
                assert!(b.count(d) <= 3);
            }
        }
    }
}
