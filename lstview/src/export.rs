//! Output of reconstructed timelines: CSV or an Excel workbook for
//! spreadsheets, and a colored table for the terminal.
use std::io;

use ansi_term::{Colour, Style};
use anyhow::Context;
use rust_xlsxwriter::Workbook;

use crate::{
    generate::Timeline,
    pipeline::{Command, StageCode},
};

fn address_hex(cmd: &Command) -> String {
    match cmd.address {
        Some(address) => format!("{address:x}"),
        None => "unknown".into(),
    }
}

fn instruction_hex(cmd: &Command) -> String {
    match cmd.instruction {
        Some(inst) => format!("{inst:08x}"),
        None => "unknown".into(),
    }
}

fn header(timeline: &Timeline) -> Vec<String> {
    let mut header = vec!["address".to_string(), "instruction".into(), "id".into()];
    header.extend(timeline.ticks().map(|tick| tick.to_string()));
    header
}

/// Stage code of every tick, empty when the command was not in flight.
fn tick_cells(timeline: &Timeline, cmd: &Command) -> Vec<&'static str> {
    timeline
        .ticks()
        .map(|tick| cmd.code_at(tick).map(|code| code.as_str()).unwrap_or_default())
        .collect()
}

/// Write one row per command: address, instruction word, slot id and the
/// stage code of every tick.
pub fn write_csv<W: io::Write>(timeline: &Timeline, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header(timeline))
        .context("fail to write csv header")?;

    for cmd in &timeline.commands {
        let mut row = vec![address_hex(cmd), instruction_hex(cmd), cmd.id.to_string()];
        row.extend(tick_cells(timeline, cmd).into_iter().map(String::from));
        wtr.write_record(&row)
            .with_context(|| format!("fail to write csv row of {cmd}"))?;
    }
    wtr.flush()?;
    Ok(())
}

const XLSX_LABEL_WIDTH: f64 = 10.0;
const XLSX_TICK_WIDTH: f64 = 2.5;

fn xlsx_column(col: usize) -> anyhow::Result<u16> {
    u16::try_from(col).with_context(|| format!("column {col} does not fit in a worksheet"))
}

/// Same rows as [`write_csv`], as a single-sheet Excel workbook. The slot id
/// is a number cell, everything else text; ticks with no code stay blank.
pub fn write_xlsx<W: io::Write>(timeline: &Timeline, mut writer: W) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, title) in header(timeline).iter().enumerate() {
        sheet.write_string(0, xlsx_column(col)?, title)?;
    }

    for (row, cmd) in (1u32..).zip(&timeline.commands) {
        sheet.write_string(row, 0, address_hex(cmd))?;
        sheet.write_string(row, 1, instruction_hex(cmd))?;
        sheet.write_number(row, 2, cmd.id as f64)?;
        for (col, code) in tick_cells(timeline, cmd).into_iter().enumerate() {
            if !code.is_empty() {
                sheet.write_string(row, xlsx_column(col + 3)?, code)?;
            }
        }
    }

    sheet.set_column_width(0, XLSX_LABEL_WIDTH)?;
    sheet.set_column_width(1, XLSX_LABEL_WIDTH)?;
    for col in 2..timeline.tick_count as usize + 3 {
        sheet.set_column_width(xlsx_column(col)?, XLSX_TICK_WIDTH)?;
    }

    let buf = workbook.save_to_buffer().context("fail to build xlsx workbook")?;
    writer.write_all(&buf).context("fail to write xlsx workbook")?;
    Ok(())
}

fn style_of(code: StageCode) -> Style {
    match code {
        StageCode::F => Colour::Cyan.normal(),
        StageCode::ID => Colour::Blue.normal(),
        StageCode::W => Colour::Yellow.dimmed(),
        StageCode::D => Colour::Green.normal(),
        StageCode::C => Colour::Purple.normal(),
        StageCode::AL | StageCode::B | StageCode::M1 | StageCode::M2 | StageCode::M3 => {
            Colour::Green.bold()
        }
        StageCode::X | StageCode::FX | StageCode::DX => Colour::Red.bold(),
    }
}

/// Render the timeline as a fixed-width table.
pub fn render(timeline: &Timeline, colored: bool) -> String {
    let width = timeline.tick_count.to_string().len().max(2) + 1;
    let mut out = String::new();

    out.push_str(&format!("{:>8} {:>8} {:>3} |", "address", "inst", "id"));
    for tick in timeline.ticks() {
        out.push_str(&format!("{tick:<width$}"));
    }
    out.push('\n');

    for cmd in &timeline.commands {
        out.push_str(&format!(
            "{:>8} {:>8} {:>3} |",
            address_hex(cmd),
            instruction_hex(cmd),
            cmd.id
        ));
        for tick in timeline.ticks() {
            let cell = match cmd.code_at(tick) {
                Some(code) if colored => style_of(code)
                    .paint(format!("{:<width$}", code.as_str()))
                    .to_string(),
                Some(code) => format!("{:<width$}", code.as_str()),
                None => " ".repeat(width),
            };
            out.push_str(&cell);
        }
        out.push('\n');
    }
    out
}
