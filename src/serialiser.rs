use crate::replay::{Entry, Logged, Report};

use std::io::{BufWriter, Write};
use std::time::Duration;

use anyhow::{Context, Result};

pub fn serialise<W: Write>(report: &Report, output: W) -> Result<()> {
    let mut writer = BufWriter::new(output);
    write_report(&mut writer, report).context("Failed to write to output.")?;
    writer.flush().context("Failed to write to output.")?;
    Ok(())
}

fn write_report<W: Write>(buf: &mut W, report: &Report) -> Result<()> {
    for entry in &report.entries {
        write_entry(buf, entry)?;
    }
    if let Some(ids) = &report.track {
        write!(buf, "track")?;
        for id in ids {
            write!(buf, " {}", id)?;
        }
        writeln!(buf)?;
    }
    Ok(())
}

fn write_entry<W: Write>(buf: &mut W, entry: &Entry) -> Result<()> {
    write_secs(buf, entry.at)?;
    match &entry.event {
        Logged::Caption { id, text } if text.is_empty() => writeln!(buf, " caption {}", id)?,
        Logged::Caption { id, text } => writeln!(buf, " caption {} {}", id, text)?,
        Logged::NoCaption => writeln!(buf, " none")?,
        Logged::Finished => writeln!(buf, " finished")?,
    }
    Ok(())
}

/// Plain seconds with millisecond precision.
fn write_secs<W: Write>(buf: &mut W, time: Duration) -> Result<()> {
    write!(buf, "{}.{:03}", time.as_secs(), time.subsec_millis())?;
    Ok(())
}
