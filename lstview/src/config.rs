//! Names of the testbench signals read from a listing.
//!
//! The defaults match the reference testbench. Any subset can be overridden
//! from a JSON file, e.g.
//!
//! ```json
//! { "signals": { "flush": "/tb/uut/cpu/gc/flush" }, "slots": 4 }
//! ```
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalNames {
    /// sized hex cycle counter, one value per tick
    pub cycle_counter: String,
    pub fetch_pc: String,
    /// slot assigned to the instruction being fetched
    pub pc_id: String,
    pub pc_id_assigned: String,
    /// per-slot program counters
    pub pc_table: String,
    pub fetch_complete: String,
    pub fetch_instruction: String,
    /// `{id pc _ valid addr_valid ...}`
    pub decode: String,
    pub decode_advance: String,
    /// `{pc ... id(9) stage_valid(10) ...}`
    pub issue: String,
    /// new-request flags of the ALU, LSU and BU, in this order
    pub unit_requests: [String; 3],
    pub rs1_conflict: String,
    pub rs2_conflict: String,
    pub flush: String,
}

impl Default for SignalNames {
    fn default() -> Self {
        const CPU: &str = "/tb/uut/cpu";
        let cpu = |path: &str| format!("{CPU}/{path}");
        Self {
            cycle_counter: "/tb/cyc_cnt".into(),
            fetch_pc: cpu("fetch_block/pc"),
            pc_id: cpu("id_block/pc_id"),
            pc_id_assigned: cpu("fetch_block/pc_id_assigned"),
            pc_table: cpu("id_block/pc_table"),
            fetch_complete: cpu("fetch_block/fetch_complete"),
            fetch_instruction: cpu("fetch_block/fetch_instruction"),
            decode: cpu("id_block/decode"),
            decode_advance: cpu("id_block/decode_advance"),
            issue: cpu("decode_and_issue_block/issue"),
            unit_requests: [0, 1, 2]
                .map(|i| cpu(&format!("decode_and_issue_block/unit_issue[{i}]/new_request"))),
            rs1_conflict: cpu("decode_and_issue_block/rs1_conflict"),
            rs2_conflict: cpu("decode_and_issue_block/rs2_conflict"),
            flush: cpu("gc_unit_block/gc_fetch_flush"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub signals: SignalNames,
    /// number of pipeline slots, ids wrap around modulo this
    pub slots: u64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            signals: SignalNames::default(),
            slots: 8,
        }
    }
}

impl TraceConfig {
    pub fn from_json(src: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(src).context("invalid trace config")?;
        anyhow::ensure!(config.slots > 0, "trace config: `slots` must be positive");
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("could not read file `{}`", path.display()))?;
        Self::from_json(&src).with_context(|| format!("while loading `{}`", path.display()))
    }
}
