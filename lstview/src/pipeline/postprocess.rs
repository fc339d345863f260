use std::collections::BTreeMap;

use super::{Command, StageCode};

/// Rewrites raw histories of retired commands into the form shown in the
/// timeline.
///
/// One instance handles one run: the wait/cancel pairing counter carries over
/// from one command to the next, so commands must be fed in retirement order.
#[derive(Debug, Default)]
pub struct PostProcessor {
    /// 0: no pair seen, 1: a wait before a cancel was turned into `D`,
    /// 2: the matching cancel was turned into `DX`. Reset by `FX`.
    wx_sequence_count: u8,
}

impl PostProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&mut self, commands: &[Command]) -> Vec<Command> {
        commands.iter().map(|cmd| self.process(cmd)).collect()
    }

    pub fn process(&mut self, command: &Command) -> Command {
        let (Some(&first), Some(&last)) = (
            command.history.keys().next(),
            command.history.keys().next_back(),
        ) else {
            return command.clone();
        };

        // dense from the first to the last recorded tick
        let mut codes: Vec<StageCode> = (first..=last)
            .map(|tick| command.code_at(tick).unwrap_or(StageCode::C))
            .collect();

        if codes.contains(&StageCode::FX) {
            self.wx_sequence_count = 0;
        }

        let mut history = BTreeMap::new();
        for i in 0..codes.len() {
            let current = codes[i];
            let mut code = current;

            if let Some(&next) = codes.get(i + 1) {
                if current == StageCode::W && next.ends_wait() {
                    code = StageCode::D;
                }
                if next == StageCode::X {
                    if current == StageCode::W && self.wx_sequence_count == 0 {
                        code = StageCode::D;
                        self.wx_sequence_count = 1;
                    } else if self.wx_sequence_count == 1 {
                        // seen by the next iteration as its current code
                        codes[i + 1] = StageCode::DX;
                        self.wx_sequence_count = 2;
                    }
                }
            }

            history.insert(first + i as u64, code);
        }

        Command {
            history,
            ..command.clone()
        }
    }
}
