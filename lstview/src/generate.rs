//! The per-tick loop: decode the control signals of every tick and turn them
//! into pipeline events.
use anyhow::Context;

use crate::{
    config::{SignalNames, TraceConfig},
    error::FormatError,
    parse::{parse, RawValue, SignalTable},
    pipeline::{Command, CommandManager, ExecUnit},
    sample::{sample_ticks, Tick},
};

/// Fields of the decode stage record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodeRecord {
    pub id: Option<u64>,
    pub pc: Option<u64>,
    pub valid: bool,
    pub addr_valid: bool,
}

impl DecodeRecord {
    fn from_raw(raw: Option<&RawValue>) -> Self {
        let field = |i| raw.and_then(|r| r.get(i)).and_then(|v| v.to_int(16));
        Self {
            id: field(0),
            pc: field(1),
            valid: field(3) == Some(1),
            addr_valid: field(4) == Some(1),
        }
    }
}

/// Fields of the issue stage record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub pc: Option<u64>,
    pub id: Option<u64>,
    pub stage_valid: bool,
}

impl IssueRecord {
    fn from_raw(raw: Option<&RawValue>) -> Self {
        let field = |i| raw.and_then(|r| r.get(i)).and_then(|v| v.to_int(16));
        Self {
            pc: field(0),
            id: field(9),
            stage_valid: field(10) == Some(1),
        }
    }
}

/// Decoded control signals of one tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickSignals {
    pub pc: Option<u64>,
    pub pc_id: Option<u64>,
    pub pc_id_assigned: bool,
    pub pc_table: Vec<Option<u64>>,
    pub fetch_complete: bool,
    pub fetch_instruction: Option<u64>,
    pub decode: DecodeRecord,
    pub decode_advance: bool,
    pub issue: IssueRecord,
    /// ALU, LSU, BU
    pub unit_requests: [bool; 3],
    pub rs1_conflict: bool,
    pub rs2_conflict: bool,
    pub flush: bool,
}

impl TickSignals {
    pub fn decode(
        table: &SignalTable,
        names: &SignalNames,
        sample: usize,
    ) -> Result<Self, FormatError> {
        let raw = |name: &str| -> Result<Option<&RawValue>, FormatError> {
            Ok(table.require(name)?.get(sample))
        };
        let int = |name: &str| -> Result<Option<u64>, FormatError> {
            Ok(raw(name)?.and_then(|v| v.to_int(16)))
        };
        let flag = |name: &str| -> Result<bool, FormatError> { Ok(int(name)? == Some(1)) };

        let pc_table: Vec<Option<u64>> = raw(&names.pc_table)?
            .and_then(RawValue::as_list)
            .map(|items| items.iter().map(|v| v.to_int(16)).collect())
            .unwrap_or_default();
        let [alu, lsu, bu] = &names.unit_requests;

        Ok(Self {
            pc: int(&names.fetch_pc)?,
            pc_id: int(&names.pc_id)?,
            pc_id_assigned: flag(&names.pc_id_assigned)?,
            pc_table,
            fetch_complete: flag(&names.fetch_complete)?,
            fetch_instruction: int(&names.fetch_instruction)?,
            decode: DecodeRecord::from_raw(raw(&names.decode)?),
            decode_advance: raw(&names.decode_advance)?.and_then(RawValue::as_str) == Some("St1"),
            issue: IssueRecord::from_raw(raw(&names.issue)?),
            unit_requests: [flag(alu)?, flag(lsu)?, flag(bu)?],
            rs1_conflict: flag(&names.rs1_conflict)?,
            rs2_conflict: flag(&names.rs2_conflict)?,
            flush: flag(&names.flush)?,
        })
    }

    fn pc_of_slot(&self, slot: u64) -> Option<u64> {
        usize::try_from(slot)
            .ok()
            .and_then(|slot| self.pc_table.get(slot).copied().flatten())
    }
}

/// Deliver the events of one tick, in pipeline order. Flush goes last so it
/// also cancels commands that advanced earlier in the same tick.
pub fn drive(manager: &mut CommandManager, sig: &TickSignals, slots: u64) {
    let tick = manager.tick();
    let slots = slots.max(1);

    if sig.pc_id_assigned {
        match sig.pc_id {
            Some(id) => manager.new_fetch(sig.pc, id),
            None => tracing::warn!("tick {tick}: fetch with unknown slot id"),
        }
    }

    if sig.fetch_complete {
        match sig.pc_id {
            Some(pc_id) => {
                // the fetched instruction sits in the slot before the next free one
                let slot = (pc_id % slots + slots - 1) % slots;
                manager.dispatch_complete(sig.pc_of_slot(slot), slot, sig.fetch_instruction);
            }
            None => tracing::warn!("tick {tick}: dispatch with unknown slot id"),
        }
    }

    let decode = &sig.decode;
    if decode.valid && decode.addr_valid {
        if let Some(id) = decode.id {
            if sig.pc_of_slot(id) == decode.pc {
                manager.decode(decode.pc, id, !sig.decode_advance);
            }
        }
    }

    if sig.issue.stage_valid {
        match (sig.issue.id, ExecUnit::select(sig.unit_requests)) {
            (None, _) => tracing::warn!("tick {tick}: issue with unknown slot id"),
            (Some(id), Some(unit)) => manager.issue(unit, sig.issue.pc, id),
            (Some(id), None) => {
                if !(sig.rs1_conflict || sig.rs2_conflict) {
                    tracing::warn!("tick {tick}: issue stalled without an operand conflict");
                }
                manager.issue_conflict(sig.issue.pc, id);
            }
        }
    }

    if sig.flush {
        manager.flush();
    }
}

#[derive(Debug, Default, Clone)]
pub struct GenerateOption {
    config: TraceConfig,
}

impl GenerateOption {
    pub fn set_config(mut self, config: TraceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }
}

/// Reconstructed timelines of all retired instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    /// number of ticks in the listing, columns run from 1 to this
    pub tick_count: u64,
    /// in retirement order
    pub commands: Vec<Command>,
}

impl Timeline {
    pub fn ticks(&self) -> std::ops::RangeInclusive<u64> {
        1..=self.tick_count
    }
}

/// Reconstruct the pipeline timeline from the text of a listing.
pub fn generate(src: &str, option: &GenerateOption) -> anyhow::Result<Timeline> {
    let config = option.config();
    let table = parse(src).context("fail to parse listing")?;
    let ticks = sample_ticks(&table, &config.signals.cycle_counter)?;
    tracing::info!("{} samples, {} ticks", table.samples(), ticks.len());

    let mut manager = CommandManager::new();
    for &Tick { tick, sample } in &ticks {
        manager.set_tick(tick);
        let signals = TickSignals::decode(&table, &config.signals, sample)
            .with_context(|| format!("while decoding tick {tick}"))?;
        tracing::trace!("tick {tick}: {signals:?}");

        drive(&mut manager, &signals, config.slots);

        tracing::debug!("tick {tick}: {} active commands", manager.active().len());
        for cmd in manager.active() {
            tracing::trace!("  - {cmd}: {:?}", cmd.history);
        }
    }

    Ok(Timeline {
        tick_count: ticks.len() as u64,
        commands: manager.postprocess(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Stage;

    fn signals() -> TickSignals {
        TickSignals {
            pc_table: vec![Some(0x100), Some(0x104), None],
            ..Default::default()
        }
    }

    #[test]
    fn test_record_fields() {
        let decode = RawValue::from(vec!["3'h1", "32'h00000104", "0", "1'b1", "1'b1"]);
        assert_eq!(
            DecodeRecord::from_raw(Some(&decode)),
            DecodeRecord {
                id: Some(1),
                pc: Some(0x104),
                valid: true,
                addr_valid: true
            }
        );
        assert_eq!(DecodeRecord::from_raw(None), DecodeRecord::default());

        let mut fields = vec!["32'h00000100"];
        fields.extend(["0"; 8]);
        fields.extend(["3'h2", "1"]);
        let issue = RawValue::from(fields);
        assert_eq!(
            IssueRecord::from_raw(Some(&issue)),
            IssueRecord {
                pc: Some(0x100),
                id: Some(2),
                stage_valid: true
            }
        );
    }

    #[test]
    fn test_dispatch_slot_wraps() {
        let mut mgr = CommandManager::new();
        mgr.set_tick(1);
        let mut sig = TickSignals {
            pc: Some(0x100),
            pc_id: Some(7),
            pc_id_assigned: true,
            ..signals()
        };
        sig.pc_table = vec![None; 8];
        sig.pc_table[7] = Some(0x100);
        drive(&mut mgr, &sig, 8);

        mgr.set_tick(2);
        let sig = TickSignals {
            pc_id: Some(0),
            fetch_complete: true,
            fetch_instruction: Some(0x13),
            pc_table: sig.pc_table.clone(),
            ..Default::default()
        };
        drive(&mut mgr, &sig, 8);
        assert_eq!(mgr.active()[0].stage, Stage::Decoding);
        assert_eq!(mgr.active()[0].instruction, Some(0x13));
    }

    #[test]
    fn test_decode_requires_matching_pc() {
        let mut mgr = CommandManager::new();
        mgr.set_tick(1);
        mgr.new_fetch(Some(0x104), 1);
        mgr.dispatch_complete(Some(0x104), 1, None);

        let mut sig = TickSignals {
            decode: DecodeRecord {
                id: Some(1),
                pc: Some(0x100),
                valid: true,
                addr_valid: true,
            },
            decode_advance: true,
            ..signals()
        };
        mgr.set_tick(2);
        drive(&mut mgr, &sig, 8);
        assert_eq!(mgr.active()[0].stage, Stage::Decoding);

        sig.decode.pc = Some(0x104);
        drive(&mut mgr, &sig, 8);
        assert_eq!(mgr.active()[0].stage, Stage::Issuing);
    }

    #[test]
    fn test_issue_and_flush_order() {
        let mut mgr = CommandManager::new();
        mgr.set_tick(1);
        mgr.new_fetch(Some(0x100), 0);
        mgr.dispatch_complete(Some(0x100), 0, None);
        mgr.decode(Some(0x100), 0, false);

        // conflict without a unit request
        mgr.set_tick(2);
        let mut sig = TickSignals {
            issue: IssueRecord {
                pc: Some(0x100),
                id: Some(0),
                stage_valid: true,
            },
            rs1_conflict: true,
            ..signals()
        };
        drive(&mut mgr, &sig, 8);
        assert_eq!(mgr.active().len(), 1);

        // issue to LSU and BU at once picks the LSU, the flush in the same
        // tick only sees the newly fetched command
        mgr.set_tick(3);
        sig.unit_requests = [false, true, true];
        sig.pc = Some(0x104);
        sig.pc_id = Some(1);
        sig.pc_id_assigned = true;
        sig.flush = true;
        drive(&mut mgr, &sig, 8);

        let done: Vec<_> = mgr
            .completed()
            .iter()
            .map(|c| (c.address, c.stage, c.code_at(3)))
            .collect();
        use crate::pipeline::StageCode;
        assert_eq!(
            done,
            vec![
                (Some(0x100), Stage::Complete, Some(StageCode::M1)),
                (Some(0x104), Stage::Canceled, Some(StageCode::FX)),
            ]
        );
    }
}
