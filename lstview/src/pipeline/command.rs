use std::collections::BTreeMap;

use super::{ExecUnit, Stage, StageCode};

/// One instruction's journey through the pipeline.
///
/// `address` and `id` identify the instruction while it is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub address: Option<u64>,
    /// pipeline slot
    pub id: u64,
    /// instruction word, known once dispatched
    pub instruction: Option<u64>,
    pub stage: Stage,
    /// tick -> stage code
    pub history: BTreeMap<u64, StageCode>,
}

impl Command {
    pub fn new(address: Option<u64>, id: u64) -> Self {
        Self {
            address,
            id,
            instruction: None,
            stage: Stage::default(),
            history: BTreeMap::new(),
        }
    }

    pub fn code_at(&self, tick: u64) -> Option<StageCode> {
        self.history.get(&tick).copied()
    }

    /// Whether this command is the instruction at `address` in slot `id`.
    pub fn is(&self, address: Option<u64>, id: u64) -> bool {
        self.address == address && self.id == id
    }

    /// Mark every tick between the last recorded one and `tick` as waiting.
    fn fill_wait_gap(&mut self, tick: u64) {
        let Some(&last) = self.history.keys().next_back() else {
            return;
        };
        for t in last + 1..tick {
            self.history.insert(t, StageCode::W);
        }
    }

    /// Returns whether the command is in `stage`, warning otherwise.
    fn expect_stage(&self, stage: Stage, event: &str) -> bool {
        if self.stage != stage {
            tracing::warn!("wrong time {event} for command {self} in stage {:?}", self.stage);
            return false;
        }
        true
    }

    pub fn fetch(&mut self, tick: u64) {
        if self.expect_stage(Stage::Fetching, "fetch") {
            self.stage = Stage::Dispatching;
            self.history.insert(tick, StageCode::F);
            tracing::debug!("new fetch: {self}");
        }
    }

    pub fn dispatch(&mut self, tick: u64, instruction: Option<u64>) {
        if self.expect_stage(Stage::Dispatching, "dispatch") {
            self.stage = Stage::Decoding;
            self.history.insert(tick, StageCode::ID);
            self.instruction = instruction;
            tracing::debug!("dispatching complete: {self}");
        }
    }

    /// `wait` means the decoder holds the instruction for another tick.
    pub fn decode(&mut self, tick: u64, wait: bool) {
        if self.expect_stage(Stage::Decoding, "decode") {
            self.fill_wait_gap(tick);
            if wait {
                self.history.insert(tick, StageCode::W);
            } else {
                self.stage = Stage::Issuing;
                self.history.insert(tick, StageCode::D);
            }
            tracing::debug!("decoding: {self}, wait = {wait}");
        }
    }

    pub fn issue_conflict(&mut self, tick: u64) {
        if self.expect_stage(Stage::Issuing, "issue conflict") {
            self.history.insert(tick, StageCode::C);
            tracing::debug!("conflict detected for {self}");
        }
    }

    pub fn issue(&mut self, tick: u64, unit: ExecUnit) {
        if !self.expect_stage(Stage::Issuing, "issue") {
            return;
        }
        self.stage = Stage::Complete;
        match unit {
            ExecUnit::Alu => {
                self.history.insert(tick, StageCode::AL);
            }
            ExecUnit::Bu => {
                self.history.insert(tick, StageCode::B);
            }
            ExecUnit::Lsu => {
                self.history.insert(tick, StageCode::M1);
                self.history.insert(tick + 1, StageCode::M2);
                self.history.insert(tick + 2, StageCode::M3);
            }
        }
        tracing::debug!("{unit:?} issue: {self}");
    }

    /// Cancel the command because of a pipeline flush.
    pub fn cancel(&mut self, tick: u64) {
        self.fill_wait_gap(tick);
        let code = match self.history.get(&tick) {
            Some(code @ (StageCode::F | StageCode::D)) => code.flushed(),
            _ => StageCode::X,
        };
        self.history.insert(tick, code);
        self.stage = Stage::Canceled;
        tracing::debug!("command canceled: {self}");
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.address {
            Some(address) => write!(f, "<pc={address:#x}, id={}>", self.id),
            None => write!(f, "<pc=None, id={}>", self.id),
        }
    }
}
