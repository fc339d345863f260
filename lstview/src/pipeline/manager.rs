use super::{Command, ExecUnit, PostProcessor};

/// Tracks the instructions in flight and collects the retired ones.
///
/// Events are delivered for the current tick (see [`CommandManager::set_tick`])
/// and address a command by its `(address, id)` pair. An event for a pair that
/// is not in flight is logged and dropped.
#[derive(Debug, Default)]
pub struct CommandManager {
    active: Vec<Command>,
    /// in retirement order
    completed: Vec<Command>,
    tick: u64,
}

impl CommandManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn active(&self) -> &[Command] {
        &self.active
    }

    pub fn completed(&self) -> &[Command] {
        &self.completed
    }

    /// Apply `f` to the command at `(address, id)` and retire it if it reached
    /// a terminal stage.
    fn update(
        &mut self,
        event: &str,
        address: Option<u64>,
        id: u64,
        f: impl FnOnce(&mut Command, u64),
    ) {
        let Some(pos) = self.active.iter().position(|cmd| cmd.is(address, id)) else {
            let target = Command::new(address, id);
            let active: Vec<String> = self.active.iter().map(ToString::to_string).collect();
            tracing::warn!(
                "tick {}: {event} for command {target}, but not found it! active commands: [{}]",
                self.tick,
                active.join(", ")
            );
            return;
        };

        f(&mut self.active[pos], self.tick);
        if self.active[pos].stage.is_retired() {
            let cmd = self.active.remove(pos);
            self.completed.push(cmd);
        }
    }

    pub fn new_fetch(&mut self, address: Option<u64>, id: u64) {
        let mut cmd = Command::new(address, id);
        cmd.fetch(self.tick);
        self.active.push(cmd);
    }

    pub fn dispatch_complete(&mut self, address: Option<u64>, id: u64, instruction: Option<u64>) {
        self.update("dispatch", address, id, |cmd, tick| {
            cmd.dispatch(tick, instruction)
        });
    }

    pub fn decode(&mut self, address: Option<u64>, id: u64, wait: bool) {
        self.update("decode", address, id, |cmd, tick| cmd.decode(tick, wait));
    }

    pub fn issue_conflict(&mut self, address: Option<u64>, id: u64) {
        self.update("issue conflict", address, id, |cmd, tick| {
            cmd.issue_conflict(tick)
        });
    }

    pub fn issue(&mut self, unit: ExecUnit, address: Option<u64>, id: u64) {
        self.update("issue", address, id, |cmd, tick| cmd.issue(tick, unit));
    }

    /// Cancel every command in flight at the current tick.
    pub fn flush(&mut self) {
        for cmd in self.active.iter_mut() {
            cmd.cancel(self.tick);
        }
        tracing::debug!("tick {}: flush, {} commands canceled", self.tick, self.active.len());
        self.completed.append(&mut self.active);
    }

    /// Rewrite the histories of all retired commands into their display form.
    pub fn postprocess(&self) -> Vec<Command> {
        PostProcessor::new().run(&self.completed)
    }
}
