//! Per-instruction reconstruction of the fetch → dispatch → decode → issue
//! pipeline from control-signal events.
mod command;
mod manager;
mod postprocess;

pub use command::Command;
pub use manager::CommandManager;
pub use postprocess::PostProcessor;

/// Lifecycle stage of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum Stage {
    /// waiting for its fetch event
    Fetching,
    Dispatching,
    Decoding,
    /// decoded, waiting for a free execution unit
    Issuing,
    /// issued to an execution unit
    Complete,
    /// flushed before it could issue
    Canceled,
}

impl Default for Stage {
    fn default() -> Self {
        Self::Fetching
    }
}

impl Stage {
    /// Whether the instruction has left the pipeline front end.
    pub fn is_retired(&self) -> bool {
        matches!(self, Stage::Complete | Stage::Canceled)
    }
}

/// What an instruction did during one tick. These are shown verbatim in the
/// timeline.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum StageCode {
    /// fetch
    F,
    /// instruction dispatched to decode
    ID,
    /// waiting
    W,
    /// decoded
    D,
    /// issue conflict, or idle between recorded ticks
    C,
    /// issued to the ALU
    AL,
    /// issued to the branch unit
    B,
    /// load/store unit, three ticks
    M1,
    M2,
    M3,
    /// canceled by a flush
    X,
    /// fetched, then canceled in the same tick
    FX,
    /// decoded, then canceled
    DX,
}

impl StageCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageCode::F => "F",
            StageCode::ID => "ID",
            StageCode::W => "W",
            StageCode::D => "D",
            StageCode::C => "C",
            StageCode::AL => "AL",
            StageCode::B => "B",
            StageCode::M1 => "M1",
            StageCode::M2 => "M2",
            StageCode::M3 => "M3",
            StageCode::X => "X",
            StageCode::FX => "FX",
            StageCode::DX => "DX",
        }
    }

    /// The code recorded when a flush hits a tick that already holds `self`.
    pub fn flushed(self) -> Self {
        match self {
            StageCode::F => StageCode::FX,
            StageCode::D => StageCode::DX,
            _ => StageCode::X,
        }
    }

    /// Codes that end a wait: an issue to some unit, or an issue conflict.
    pub fn ends_wait(&self) -> bool {
        matches!(
            self,
            StageCode::AL
                | StageCode::M1
                | StageCode::M2
                | StageCode::M3
                | StageCode::C
                | StageCode::B
        )
    }
}

impl std::fmt::Display for StageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution units an instruction can be issued to.
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum ExecUnit {
    Alu,
    /// load/store unit, busy for three ticks
    Lsu,
    /// branch unit
    Bu,
}

impl ExecUnit {
    /// Request flags are checked in this order, the first asserted one wins.
    pub const PRIORITY: [ExecUnit; 3] = [ExecUnit::Alu, ExecUnit::Lsu, ExecUnit::Bu];

    /// Pick the unit for a set of request flags given in [`ExecUnit::PRIORITY`] order.
    pub fn select(requests: [bool; 3]) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .zip(requests)
            .find_map(|(unit, requested)| requested.then_some(unit))
    }
}
