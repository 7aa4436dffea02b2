// Lever and rotation puzzle gating the two doors.
//
// Room one holds seven levers; the right on/off pattern opens door 1.
// Room two holds a chair and three "Z" props that turn in steps; the right
// orientation of all four opens door 2. Doors stay open once opened.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lever {
    L1,
    L2,
    L3,
    L4,
    L5,
    L6,
    L7,
}

impl Lever {
    pub const ALL: [Lever; 7] = [
        Lever::L1,
        Lever::L2,
        Lever::L3,
        Lever::L4,
        Lever::L5,
        Lever::L6,
        Lever::L7,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prop {
    Chair,
    Z1,
    Z2,
    Z3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToggleSet {
    levers: [bool; 7],
}

impl ToggleSet {
    pub fn from_array(levers: [bool; 7]) -> Self {
        Self { levers }
    }

    pub fn is_active(&self, lever: Lever) -> bool {
        self.levers[lever.index()]
    }

    pub fn flip(&mut self, lever: Lever) {
        let slot = &mut self.levers[lever.index()];
        *slot = !*slot;
    }

    pub fn as_array(&self) -> [bool; 7] {
        self.levers
    }
}

/// Step counters of the rotating props. Only the residues matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationSet {
    pub chair: i32,
    pub z1: i32,
    pub z2: i32,
    pub z3: i32,
}

impl Default for RotationSet {
    fn default() -> Self {
        Self { chair: 0, z1: 3, z2: 5, z3: 4 }
    }
}

impl RotationSet {
    pub fn get(&self, prop: Prop) -> i32 {
        match prop {
            Prop::Chair => self.chair,
            Prop::Z1 => self.z1,
            Prop::Z2 => self.z2,
            Prop::Z3 => self.z3,
        }
    }

    pub fn increment(&mut self, prop: Prop) {
        let counter = match prop {
            Prop::Chair => &mut self.chair,
            Prop::Z1 => &mut self.z1,
            Prop::Z2 => &mut self.z2,
            Prop::Z3 => &mut self.z3,
        };
        *counter = counter.wrapping_add(1);
    }
}

/// Boolean that can be set but never cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latch(bool);

impl Latch {
    pub fn is_set(self) -> bool {
        self.0
    }

    /// Folds `raw` into the latch. Returns true only on the false -> true edge.
    pub fn latch(&mut self, raw: bool) -> bool {
        let newly = raw && !self.0;
        self.0 |= raw;
        newly
    }
}

/// Lever pattern off, on, off, on, on, off, off.
pub fn door1_predicate(levers: &ToggleSet) -> bool {
    levers.as_array() == [false, true, false, true, true, false, false]
}

pub fn door2_predicate(rot: &RotationSet) -> bool {
    rot.chair.rem_euclid(4) == 1
        && rot.z1.rem_euclid(10) == 5
        && rot.z2.rem_euclid(10) == 0
        && rot.z3.rem_euclid(10) == 5
}

/// Which doors a single commit opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoorEvents {
    pub door1_opened: bool,
    pub door2_opened: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PuzzleState {
    levers: ToggleSet,
    rotations: RotationSet,
    door1: Latch,
    door2: Latch,
}

impl PuzzleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levers(&self) -> &ToggleSet {
        &self.levers
    }

    pub fn rotations(&self) -> &RotationSet {
        &self.rotations
    }

    pub fn door1_open(&self) -> bool {
        self.door1.is_set()
    }

    pub fn door2_open(&self) -> bool {
        self.door2.is_set()
    }

    /// Flips a lever. Levers freeze once door 1 is open.
    pub fn toggle_pressed(&mut self, lever: Lever) -> bool {
        if self.door1_open() {
            return false;
        }
        self.levers.flip(lever);
        tracing::debug!(?lever, active = self.levers.is_active(lever), "lever toggled");
        true
    }

    /// Turns a prop one step. Only accepted between the two doors opening.
    pub fn rotation_pressed(&mut self, prop: Prop) -> bool {
        if !self.door1_open() || self.door2_open() {
            return false;
        }
        self.rotations.increment(prop);
        tracing::debug!(?prop, steps = self.rotations.get(prop), "prop rotated");
        true
    }

    /// Routes a number key to whichever puzzle is live.
    pub fn press_digit(&mut self, digit: u8) -> bool {
        if !self.door1_open() {
            match lever_for_digit(digit) {
                Some(lever) => self.toggle_pressed(lever),
                None => false,
            }
        } else if !self.door2_open() {
            match prop_for_digit(digit) {
                Some(prop) => self.rotation_pressed(prop),
                None => false,
            }
        } else {
            false
        }
    }

    /// Re-evaluates both door predicates and latches them.
    pub fn commit(&mut self) -> DoorEvents {
        let events = DoorEvents {
            door1_opened: self.door1.latch(door1_predicate(&self.levers)),
            door2_opened: self.door2.latch(door2_predicate(&self.rotations)),
        };
        if events.door1_opened {
            tracing::info!("door 1 unlocked");
        }
        if events.door2_opened {
            tracing::info!("door 2 unlocked");
        }
        events
    }
}

/// Keys 1-7 as laid out on the wall map, which is not lever order.
fn lever_for_digit(digit: u8) -> Option<Lever> {
    match digit {
        1 => Some(Lever::L1),
        2 => Some(Lever::L5),
        3 => Some(Lever::L7),
        4 => Some(Lever::L6),
        5 => Some(Lever::L4),
        6 => Some(Lever::L3),
        7 => Some(Lever::L2),
        _ => None,
    }
}

fn prop_for_digit(digit: u8) -> Option<Prop> {
    match digit {
        2 => Some(Prop::Chair),
        3 => Some(Prop::Z1),
        4 => Some(Prop::Z2),
        5 => Some(Prop::Z3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLUTION: [bool; 7] = [false, true, false, true, true, false, false];

    fn solved_levers() -> PuzzleState {
        let mut puzzle = PuzzleState::new();
        for lever in [Lever::L2, Lever::L4, Lever::L5] {
            assert!(puzzle.toggle_pressed(lever));
        }
        puzzle
    }

    #[test]
    fn test_door1_predicate_exact_pattern() {
        assert!(door1_predicate(&ToggleSet::from_array(SOLUTION)));
        assert!(!door1_predicate(&ToggleSet::default()));
    }

    #[test]
    fn test_door1_predicate_any_single_flip_fails() {
        for i in 0..7 {
            let mut levers = SOLUTION;
            levers[i] = !levers[i];
            assert!(!door1_predicate(&ToggleSet::from_array(levers)), "flip of lever {}", i + 1);
        }
    }

    #[test]
    fn test_door2_predicate_residues() {
        let rot = |chair, z1, z2, z3| RotationSet { chair, z1, z2, z3 };
        assert!(door2_predicate(&rot(1, 5, 10, 5)));
        assert!(door2_predicate(&rot(5, 5, 0, 5)));
        assert!(door2_predicate(&rot(1, 15, 20, 25)));
        assert!(!door2_predicate(&rot(1, 5, 0, 6)));
        assert!(!door2_predicate(&rot(2, 5, 0, 5)));
        assert!(!door2_predicate(&RotationSet::default()));
    }

    #[test]
    fn test_latch_is_sticky() {
        let mut latch = Latch::default();
        assert!(!latch.latch(false));
        assert!(latch.latch(true));
        assert!(!latch.latch(true));
        assert!(!latch.latch(false));
        assert!(latch.is_set());
    }

    #[test]
    fn test_commit_opens_door1_once() {
        let mut puzzle = solved_levers();
        assert!(!puzzle.door1_open());
        let events = puzzle.commit();
        assert!(events.door1_opened);
        assert!(!events.door2_opened);
        assert!(puzzle.door1_open());
        assert!(!puzzle.commit().door1_opened);
    }

    #[test]
    fn test_levers_frozen_after_door1() {
        let mut puzzle = solved_levers();
        puzzle.commit();
        assert!(!puzzle.toggle_pressed(Lever::L1));
        assert_eq!(puzzle.levers().as_array(), SOLUTION);
        // still open even though nothing changed
        puzzle.commit();
        assert!(puzzle.door1_open());
    }

    #[test]
    fn test_extra_lever_breaks_pattern() {
        let mut puzzle = solved_levers();
        puzzle.toggle_pressed(Lever::L7);
        puzzle.commit();
        assert!(!puzzle.door1_open());
    }

    #[test]
    fn test_rotation_rejected_before_door1() {
        let mut puzzle = PuzzleState::new();
        assert!(!puzzle.rotation_pressed(Prop::Chair));
        assert_eq!(*puzzle.rotations(), RotationSet::default());
    }

    #[test]
    fn test_rotation_rejected_after_door2() {
        let mut puzzle = solved_levers();
        puzzle.commit();
        // chair 0 -> 1, z1 3 -> 5, z2 5 -> 10, z3 4 -> 5
        let presses = [(Prop::Chair, 1), (Prop::Z1, 2), (Prop::Z2, 5), (Prop::Z3, 1)];
        for (prop, n) in presses {
            for _ in 0..n {
                assert!(puzzle.rotation_pressed(prop));
            }
        }
        assert!(puzzle.commit().door2_opened);
        assert!(!puzzle.rotation_pressed(Prop::Z1));
        assert_eq!(puzzle.rotations().z1, 5);
    }

    #[test]
    fn test_press_digit_routes_to_levers_then_props() {
        let mut puzzle = PuzzleState::new();
        // 7 -> lever2, 5 -> lever4, 2 -> lever5
        for d in [7, 5, 2] {
            assert!(puzzle.press_digit(d));
        }
        assert!(!puzzle.press_digit(8));
        assert_eq!(puzzle.levers().as_array(), SOLUTION);
        puzzle.commit();

        assert!(!puzzle.press_digit(1));
        assert!(puzzle.press_digit(2));
        assert_eq!(puzzle.rotations().chair, 1);
        assert!(puzzle.press_digit(5));
        assert_eq!(puzzle.rotations().z3, 5);
        assert!(!puzzle.press_digit(6));
    }

    #[test]
    fn test_press_digit_ignored_when_both_open() {
        let mut puzzle = solved_levers();
        puzzle.commit();
        for d in [2, 3, 3, 4, 4, 4, 4, 4, 5] {
            puzzle.press_digit(d);
        }
        assert!(puzzle.commit().door2_opened);
        for d in 0..10 {
            assert!(!puzzle.press_digit(d));
        }
    }
}
