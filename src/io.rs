use crate::model::{Duty, Member, NurseId, ShiftCode, ShiftRequest, ShiftSet, WorkIntensity};
use crate::scheduler::SchedError;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import du roster depuis CSV: header `id,name[,eligibility][,intensity]`
///
/// `eligibility` vaut `ALL` par défaut (ou une liste comme `DE`, `N`, `M`),
/// `intensity` vaut `medium` par défaut.
pub fn import_roster_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Member>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out: Vec<Member> = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let id = parse_id(rec.get(0).context("missing id")?)?;
        let name = rec.get(1).context("missing name")?.trim();
        if name.is_empty() {
            bail!("invalid roster row (empty name) for id {id}");
        }
        if out.iter().any(|m| m.id.get() == id) {
            bail!("duplicate nurse id {id}");
        }
        let mut member = Member::new(id, name);
        if let Some(raw) = rec.get(2).map(str::trim).filter(|s| !s.is_empty()) {
            member.eligibility = raw
                .parse::<ShiftSet>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid eligibility for nurse {id}"))?;
        }
        if let Some(raw) = rec.get(3) {
            member.intensity = raw
                .parse::<WorkIntensity>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid intensity for nurse {id}"))?;
        }
        out.push(member);
    }
    Ok(out)
}

/// Import des souhaits: header `nurse_id,day,shift[,reinforced][,memo]`
pub fn import_requests_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<ShiftRequest>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let nurse = NurseId::new(parse_id(rec.get(0).context("missing nurse_id")?)?);
        let day: usize = rec
            .get(1)
            .context("missing day")?
            .trim()
            .parse()
            .context("day must be a positive integer")?;
        if day == 0 {
            bail!("day is 1-based (nurse {nurse})");
        }
        let shift = parse_code(rec.get(2).context("missing shift")?)?;
        let mut req = ShiftRequest::new(nurse, day, shift);
        if let Some(flag) = rec.get(3).map(str::trim).filter(|s| !s.is_empty()) {
            req.reinforced = parse_bool(flag)
                .with_context(|| format!("invalid reinforced value for nurse {nurse}"))?;
        }
        req.memo = rec
            .get(4)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        out.push(req);
    }
    Ok(out)
}

fn parse_id(raw: &str) -> anyhow::Result<u64> {
    raw.trim()
        .parse()
        .with_context(|| format!("invalid nurse id: {raw}"))
}

fn parse_code(raw: &str) -> anyhow::Result<ShiftCode> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(ShiftCode::from_char(c).ok_or(SchedError::InvalidShiftCode(c))?),
        _ => bail!("invalid shift code: {raw}"),
    }
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

/// Export JSON d'une révision (jolie mise en forme)
pub fn export_duty_json<P: AsRef<Path>>(path: P, duty: &Duty) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(duty)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV d'une révision: header `nurse_id,name,shifts`
pub fn export_duty_csv<P: AsRef<Path>>(path: P, duty: &Duty, members: &[Member]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["nurse_id", "name", "shifts"])?;
    let mut buf = itoa::Buffer::new();
    for row in &duty.rows {
        let name = members
            .iter()
            .find(|m| m.id == row.nurse)
            .map(|m| m.name.as_str())
            .unwrap_or("");
        w.write_record([buf.format(row.nurse.get()), name, row.shifts.as_str()])?;
    }
    w.flush()?;
    Ok(())
}
