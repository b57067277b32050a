//! Conversion of design results to the serializable report contracts, and CSV
//! export of those reports.

use crate::dna_sequence::reverse_complement;
use crate::engine::DesignResult;
use crate::oligo::{Oligo, OligoList, OligoType, OutputKind};
use crate::primer_pair::PrimerPair;
use crate::settings::Settings;
use crate::template::Template;
use anyhow::Context;
use primerforge_protocol::{
    DESIGN_REPORT_SCHEMA, DesignReport, DiagnosticsRecord, ListReport, OligoRecord, PairRecord,
};
use std::fs::File;
use std::io::Write;
use std::path::Path;

struct Coordinates<'a> {
    template: &'a Template,
    offset: i64,
    with_quality: bool,
    with_position_penalty: bool,
}

impl<'a> Coordinates<'a> {
    fn new(settings: &Settings, template: &'a Template) -> Self {
        Self {
            template,
            offset: template.incl_start + settings.first_base_index,
            with_quality: template.has_quality(),
            with_position_penalty: !template.targets.is_empty(),
        }
    }

    fn sequence(&self, h: &Oligo) -> String {
        let s = &self.template.trimmed[h.first()..=h.last()];
        let s = match h.kind {
            OligoType::Right => reverse_complement(s),
            _ => s.to_vec(),
        };
        String::from_utf8_lossy(&s).to_string()
    }

    fn record(&self, h: &Oligo) -> OligoRecord {
        let primer = h.kind.is_primer();
        OligoRecord {
            sequence: self.sequence(h),
            position: h.start as i64 + self.offset,
            length: h.length,
            tm: h.tm,
            gc_percent: h.gc_content,
            self_any: h.self_any,
            self_end: h.self_end,
            hairpin: h.hairpin,
            end_stability: primer.then_some(h.end_stability),
            repeat_max: h.repeat_sim.as_ref().map(|r| r.max_score()),
            repeat_name: h.repeat_sim.as_ref().and_then(|r| r.name.clone()),
            template_mispriming: h.max_template_mispriming(),
            position_penalty: (primer && self.with_position_penalty)
                .then_some(h.position_penalty),
            min_seq_quality: self.with_quality.then_some(h.seq_quality),
            penalty: h.quality,
            problems: (!h.problems.is_ok()).then(|| h.problems.describe()),
            must_use: h.must_use,
        }
    }

    fn list(&self, list: &OligoList) -> ListReport {
        ListReport {
            kind: list.kind.label().to_string(),
            explain: list.explain(),
            oligos: list.oligos.iter().map(|h| self.record(h)).collect(),
        }
    }

    fn pair(&self, rank: usize, p: &PrimerPair, res: &DesignResult) -> PairRecord {
        PairRecord {
            rank,
            penalty: p.quality,
            left: self.record(&res.left.oligos[p.left]),
            right: self.record(&res.right.oligos[p.right]),
            internal: p.internal.map(|i| self.record(&res.internal.oligos[i])),
            product_size: p.product_size,
            product_tm: p.product_tm,
            product_tm_oligo_tm_diff: p.product_tm_oligo_tm_diff,
            t_opt_a: p.t_opt_a,
            compl_any: p.compl_any,
            compl_end: p.compl_end,
            repeat_sim: p.repeat_name.as_ref().map(|_| p.repeat_sim),
            repeat_name: p.repeat_name.clone(),
            template_mispriming: p.template_mispriming,
        }
    }
}

/// Report in caller coordinates: positions are shifted by the included-region
/// start and the first base index, right primers by their 5' end.
pub fn to_protocol(res: &DesignResult, settings: &Settings, template: &Template) -> DesignReport {
    let c = Coordinates::new(settings, template);
    let pairs_output = res.output_kind == OutputKind::Pairs;
    let list_for = |picked: bool, list: &OligoList| (picked && !pairs_output).then(|| c.list(list));
    DesignReport {
        schema: DESIGN_REPORT_SCHEMA.to_string(),
        sequence_id: res.sequence_id.clone(),
        output_kind: match res.output_kind {
            OutputKind::Pairs => "pairs".to_string(),
            OutputKind::Lists => "lists".to_string(),
        },
        pairs: res
            .pairs
            .iter()
            .enumerate()
            .map(|(rank, p)| c.pair(rank, p, res))
            .collect(),
        pair_explain: pairs_output.then(|| res.pair_stats.to_string()),
        left: list_for(settings.pick_left_primer, &res.left),
        right: list_for(settings.pick_right_primer, &res.right),
        internal: list_for(settings.pick_internal_oligo, &res.internal),
        upstream_stop_codon: res.upstream_stop_codon.map(|p| p as i64 + c.offset),
        downstream_stop_codon: res.downstream_stop_codon.map(|p| p as i64 + c.offset),
        diagnostics: diagnostics_record(res),
    }
}

/// Report for a result whose input was rejected before a template existed.
pub fn rejected_report(res: &DesignResult) -> DesignReport {
    DesignReport {
        sequence_id: res.sequence_id.clone(),
        diagnostics: diagnostics_record(res),
        ..DesignReport::default()
    }
}

fn diagnostics_record(res: &DesignResult) -> DiagnosticsRecord {
    DiagnosticsRecord {
        global_errors: res.diagnostics.global_errors.clone(),
        sequence_errors: res.diagnostics.sequence_errors.clone(),
        warnings: res.diagnostics.warnings.clone(),
    }
}

fn opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.3}")).unwrap_or_default()
}

pub fn write_pairs_csv<W: Write>(report: &DesignReport, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "rank",
        "penalty",
        "left_sequence",
        "left_position",
        "left_length",
        "left_tm",
        "right_sequence",
        "right_position",
        "right_length",
        "right_tm",
        "internal_sequence",
        "product_size",
        "product_tm",
        "compl_any",
        "compl_end",
    ])?;
    for p in &report.pairs {
        wtr.write_record([
            p.rank.to_string(),
            format!("{:.4}", p.penalty),
            p.left.sequence.clone(),
            p.left.position.to_string(),
            p.left.length.to_string(),
            format!("{:.3}", p.left.tm),
            p.right.sequence.clone(),
            p.right.position.to_string(),
            p.right.length.to_string(),
            format!("{:.3}", p.right.tm),
            p.internal
                .as_ref()
                .map(|h| h.sequence.clone())
                .unwrap_or_default(),
            p.product_size.to_string(),
            format!("{:.3}", p.product_tm),
            format!("{:.2}", p.compl_any),
            format!("{:.2}", p.compl_end),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_list_csv<W: Write>(list: &ListReport, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "sequence",
        "position",
        "length",
        "tm",
        "gc_percent",
        "self_any",
        "self_end",
        "hairpin",
        "repeat_max",
        "penalty",
        "problems",
    ])?;
    for h in &list.oligos {
        wtr.write_record([
            h.sequence.clone(),
            h.position.to_string(),
            h.length.to_string(),
            format!("{:.3}", h.tm),
            format!("{:.1}", h.gc_percent),
            opt(h.self_any),
            opt(h.self_end),
            opt(h.hairpin),
            opt(h.repeat_max),
            format!("{:.4}", h.penalty),
            h.problems.clone().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes pairs, or every reported list one after another if there are none.
pub fn save_csv(report: &DesignReport, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Could not create CSV file '{}'", path.display()))?;
    if report.output_kind == "pairs" {
        return write_pairs_csv(report, file);
    }
    let mut file = file;
    for list in [&report.left, &report.right, &report.internal]
        .into_iter()
        .flatten()
    {
        writeln!(file, "# {}", list.kind)?;
        write_list_csv(list, &mut file)?;
    }
    Ok(())
}
