// Replay small hand-written listings through the whole conversion

use std::{collections::HashMap, io::Write};

use interpolator::{format, Formattable};
use lstview::{config::TraceConfig, export, generate, FormatError, GenerateOption};

const PC_TABLE: &str = "{32'h00000100 32'h00000104 32'h00000108 32'hxxxxxxxx \
                        32'hxxxxxxxx 32'hxxxxxxxx 32'hxxxxxxxx 32'hxxxxxxxx}";

const DECODE: &str = "3'h{id} {pc} 0 1'b{valid} 1'b{valid}";
const ISSUE: &str = "{pc} 0 0 0 0 0 0 0 0 3'h{id} 1'b{valid}";

/// Fill a record template and wrap it in braces.
fn record(template: &str, id: u64, pc: u64, valid: bool) -> anyhow::Result<String> {
    let (id, pc, valid) = (format!("{id:x}"), word(Some(pc)), valid as u8);
    let args = &[
        ("id", Formattable::display(&id)),
        ("pc", Formattable::display(&pc)),
        ("valid", Formattable::display(&valid)),
    ]
    .into_iter()
    .collect::<HashMap<_, _>>();
    Ok(format!("{{{}}}", format(template, args)?))
}

/// One line of the listing. Only the fields a test cares about need to be set.
#[derive(Debug, Clone, Default)]
struct Sample {
    cyc: Option<u64>,
    pc: u64,
    pc_id: u64,
    assigned: bool,
    fetch_complete: bool,
    inst: Option<u64>,
    /// (id, pc, advance)
    decode: Option<(u64, u64, bool)>,
    /// (pc, id)
    issue: Option<(u64, u64)>,
    request: Option<usize>,
    conflict: bool,
    flush: bool,
}

fn bit(b: bool) -> String {
    format!("1'b{}", b as u8)
}

fn word(v: Option<u64>) -> String {
    match v {
        Some(v) => format!("32'h{v:08x}"),
        None => "32'hxxxxxxxx".into(),
    }
}

fn names(flush: &str) -> Vec<String> {
    let cpu = |s: &str| format!("/tb/uut/cpu/{s}");
    vec![
        "ns".into(),
        "/tb/cyc_cnt".into(),
        cpu("fetch_block/pc"),
        cpu("id_block/pc_id"),
        cpu("fetch_block/pc_id_assigned"),
        cpu("id_block/pc_table"),
        cpu("fetch_block/fetch_complete"),
        cpu("fetch_block/fetch_instruction"),
        cpu("id_block/decode"),
        cpu("id_block/decode_advance"),
        cpu("decode_and_issue_block/issue"),
        cpu("decode_and_issue_block/unit_issue[0]/new_request"),
        cpu("decode_and_issue_block/unit_issue[1]/new_request"),
        cpu("decode_and_issue_block/unit_issue[2]/new_request"),
        cpu("decode_and_issue_block/rs1_conflict"),
        cpu("decode_and_issue_block/rs2_conflict"),
        flush.into(),
    ]
}

impl Sample {
    fn cells(&self, time: usize) -> anyhow::Result<Vec<String>> {
        let decode = match self.decode {
            Some((id, pc, _)) => record(DECODE, id, pc, true)?,
            None => record(DECODE, 0, 0, false)?,
        };
        let advance = match self.decode {
            Some((_, _, true)) => "St1",
            _ => "St0",
        };
        let issue = match self.issue {
            Some((pc, id)) => record(ISSUE, id, pc, true)?,
            None => record(ISSUE, 0, 0, false)?,
        };
        let mut cells = vec![
            (time * 10).to_string(),
            word(self.cyc),
            word(Some(self.pc)),
            format!("3'h{:x}", self.pc_id),
            bit(self.assigned),
            PC_TABLE.into(),
            bit(self.fetch_complete),
            word(self.inst),
            decode,
            advance.into(),
            issue,
        ];
        cells.extend((0..3).map(|unit| bit(self.request == Some(unit))));
        cells.extend([bit(self.conflict), bit(false), bit(self.flush)]);
        Ok(cells)
    }
}

/// Lay out header and samples right-aligned on shared end columns.
fn listing(names: &[String], samples: &[Sample]) -> anyhow::Result<String> {
    let rows = samples
        .iter()
        .enumerate()
        .map(|(time, s)| s.cells(time))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let widths: Vec<usize> = (0..names.len())
        .map(|c| {
            rows.iter()
                .map(|row| row[c].len())
                .chain([names[c].len()])
                .max()
                .unwrap_or_default()
        })
        .collect();
    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("  {cell:>w$}"))
            .collect()
    };

    let mut out = line(names);
    out.push('\n');
    for row in &rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    Ok(out)
}

fn scenario() -> Vec<Sample> {
    let at = |cyc| Sample {
        cyc: Some(cyc),
        pc_id: 2,
        ..Default::default()
    };
    vec![
        Sample::default(),
        Sample {
            pc: 0x100,
            pc_id: 0,
            assigned: true,
            ..at(1)
        },
        Sample {
            pc: 0x104,
            pc_id: 1,
            assigned: true,
            fetch_complete: true,
            inst: Some(0x00a00093),
            ..at(2)
        },
        Sample {
            fetch_complete: true,
            inst: Some(0x00002103),
            decode: Some((0, 0x100, true)),
            ..at(3)
        },
        // delta-cycle glitch, the later sample of tick 4 is used
        Sample {
            decode: Some((1, 0x104, false)),
            ..at(4)
        },
        Sample {
            decode: Some((1, 0x104, false)),
            issue: Some((0x100, 0)),
            request: Some(0),
            ..at(4)
        },
        Sample {
            decode: Some((1, 0x104, true)),
            ..at(5)
        },
        Sample {
            issue: Some((0x104, 1)),
            conflict: true,
            ..at(6)
        },
        Sample {
            pc: 0x108,
            assigned: true,
            issue: Some((0x104, 1)),
            request: Some(1),
            ..at(7)
        },
        Sample {
            pc_id: 3,
            flush: true,
            ..at(8)
        },
        Sample { pc_id: 3, ..at(9) },
    ]
}

const EXPECTED_CSV: &str = "\
address,instruction,id,1,2,3,4,5,6,7,8,9
100,00a00093,0,F,ID,D,AL,,,,,
104,00002103,1,,F,ID,W,D,C,M1,M2,M3
108,unknown,2,,,,,,,F,X,
";

#[test]
fn test_full_conversion() -> anyhow::Result<()> {
    let src = listing(&names("/tb/uut/cpu/gc_unit_block/gc_fetch_flush"), &scenario())?;
    let timeline = generate(&src, &GenerateOption::default())?;
    assert_eq!(timeline.tick_count, 9);
    assert_eq!(timeline.commands.len(), 3);

    let mut out = Vec::new();
    export::write_csv(&timeline, &mut out)?;
    assert_eq!(String::from_utf8(out)?, EXPECTED_CSV);
    Ok(())
}

#[test]
fn test_config_from_file() -> anyhow::Result<()> {
    let src = listing(&names("/tb/flush"), &scenario())?;

    // the default names miss the renamed flush signal
    let err = generate(&src, &GenerateOption::default()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<FormatError>(),
        Some(&FormatError::MissingSignal(
            "/tb/uut/cpu/gc_unit_block/gc_fetch_flush".into()
        ))
    );

    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, r#"{{ "signals": {{ "flush": "/tb/flush" }} }}"#)?;
    let config = TraceConfig::load(file.path())?;
    let timeline = generate(&src, &GenerateOption::default().set_config(config))?;

    let csv_file = tempfile::NamedTempFile::new()?;
    export::write_csv(&timeline, csv_file.reopen()?)?;
    assert_eq!(std::fs::read_to_string(csv_file.path())?, EXPECTED_CSV);
    Ok(())
}

#[test]
fn test_no_data_line() {
    let err = generate("  ns  /tb/cyc_cnt\n  10  32'h00000001\n", &GenerateOption::default())
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<FormatError>(),
        Some(&FormatError::NoDataLine)
    );
}
