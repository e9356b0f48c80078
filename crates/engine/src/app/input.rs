/// Commands the driver can issue from the keyboard. Every action is
/// edge-triggered: holding a key fires it once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Quit,
    SpawnActor,
    RandomLine,
    RandomWalk,
    Fill,
    Save,
    Reload,
    NextBoard,
}

const ACTION_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl ActionStates {
    /// Records a key transition; a press only counts when the key was up.
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        let index = action.index();
        if is_down && !self.down[index] {
            self.pressed[index] = true;
        }
        self.down[index] = is_down;
    }

    pub(crate) fn mark_pressed(&mut self, action: InputAction) {
        self.pressed[action.index()] = true;
    }

    pub(crate) fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    pub(crate) fn clear_pressed(&mut self) {
        self.pressed = [false; ACTION_COUNT];
    }
}

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::Quit,
        InputAction::SpawnActor,
        InputAction::RandomLine,
        InputAction::RandomWalk,
        InputAction::Fill,
        InputAction::Save,
        InputAction::Reload,
        InputAction::NextBoard,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::Quit => 0,
            InputAction::SpawnActor => 1,
            InputAction::RandomLine => 2,
            InputAction::RandomWalk => 3,
            InputAction::Fill => 4,
            InputAction::Save => 5,
            InputAction::Reload => 6,
            InputAction::NextBoard => 7,
        }
    }
}
