use log::{LevelFilter, Log, Metadata, Record};
use primerforge::aligner::{AlignerArgs, AlignmentMode, align};
use primerforge::dna_sequence::dna_to_upper;
use primerforge::engine::{Designer, PrimerEngine};
use primerforge::repeat_library::{Libraries, RepeatLibrary};
use primerforge::report::{rejected_report, save_csv, to_protocol};
use primerforge::thermodynamics::{Conditions, SaltCorrection, TmMethod, seq_tm};
use primerforge::{SequenceArgs, Settings, about};
use serde::Serialize;
use std::path::Path;
use std::{env, fs};

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

#[derive(Serialize)]
struct TmSummary {
    sequence: String,
    tm: f64,
    method: TmMethod,
    salt_correction: SaltCorrection,
}

#[derive(Serialize)]
struct AlignSummary {
    mode: AlignmentMode,
    score: i64,
    align_end_1: Option<usize>,
    align_end_2: Option<usize>,
}

fn usage() {
    eprintln!(
        "Usage:\n  \
  primerforge_cli --version\n  \
  primerforge_cli [--verbose] capabilities\n  \
  primerforge_cli [--verbose] defaults [--modern]\n  \
  primerforge_cli [--verbose] design SETTINGS_JSON SEQUENCE_JSON [--library FASTA] [--mishyb-library FASTA] [--csv PATH]\n  \
  primerforge_cli [--verbose] tm SEQ [--salt mM] [--dna nM] [--santalucia]\n  \
  primerforge_cli [--verbose] align SEQ_A SEQ_B [--mode local|global|end|local-end]\n\n  \
  SEQUENCE_JSON may hold one sequence object or an array of them.\n  \
  Tip: pass @file.json instead of inline JSON"
    );
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        match env::var("PRIMERFORGE_LOG").ok().as_deref() {
            Some("debug") => LevelFilter::Debug,
            Some("info") => LevelFilter::Info,
            Some("warn") => LevelFilter::Warn,
            Some(_) => LevelFilter::Info,
            None => LevelFilter::Error,
        }
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn load_json_arg(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix('@') {
        fs::read_to_string(path).map_err(|e| format!("Could not read JSON file '{path}': {e}"))
    } else {
        Ok(value.to_string())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

/// Value following `name`, if present.
fn option_value<'a>(args: &'a [String], name: &str) -> Result<Option<&'a str>, String> {
    match args.iter().position(|a| a == name) {
        None => Ok(None),
        Some(i) => args
            .get(i + 1)
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| format!("Missing value for {name}")),
    }
}

fn parse_f64_option(args: &[String], name: &str) -> Result<Option<f64>, String> {
    option_value(args, name)?
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| format!("Invalid number '{v}' for {name}"))
        })
        .transpose()
}

fn load_library(args: &[String], name: &str) -> Result<RepeatLibrary, String> {
    match option_value(args, name)? {
        Some(path) => RepeatLibrary::load_fasta(Path::new(path)).map_err(|e| e.to_string()),
        None => Ok(RepeatLibrary::default()),
    }
}

fn parse_sequences(json: &str) -> Result<Vec<SequenceArgs>, String> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| format!("Invalid sequence JSON: {e}"))?;
    if value.is_array() {
        serde_json::from_value(value).map_err(|e| format!("Invalid sequence JSON: {e}"))
    } else {
        serde_json::from_value(value)
            .map(|one| vec![one])
            .map_err(|e| format!("Invalid sequence JSON: {e}"))
    }
}

fn design(args: &[String]) -> Result<(), String> {
    if args.len() < 2 {
        usage();
        return Err("design requires: SETTINGS_JSON SEQUENCE_JSON".to_string());
    }
    let settings = Settings::from_json_str(&load_json_arg(&args[0])?)
        .map_err(|e| format!("Invalid settings JSON: {e}"))?;
    let batch = parse_sequences(&load_json_arg(&args[1])?)?;
    let libraries = Libraries {
        mispriming: load_library(args, "--library")?,
        mishyb: load_library(args, "--mishyb-library")?,
    };
    let csv_path = option_value(args, "--csv")?;
    if csv_path.is_some() && batch.len() != 1 {
        return Err("--csv needs exactly one sequence".to_string());
    }

    let engine = PrimerEngine::new(settings, libraries);
    let mut reports = vec![];
    for result in engine.design_batch(&batch) {
        let res = result.map_err(|e| e.to_string())?;
        let report = match &res.template {
            Some(template) => to_protocol(&res, engine.settings(), template),
            None => rejected_report(&res),
        };
        reports.push(report);
    }
    if let (Some(path), Some(report)) = (csv_path, reports.first()) {
        save_csv(report, Path::new(path)).map_err(|e| format!("{e:#}"))?;
    }
    if reports.len() == 1 {
        print_json(&reports[0])
    } else {
        print_json(&reports)
    }
}

fn tm(args: &[String]) -> Result<(), String> {
    let Some(seq) = args.first() else {
        usage();
        return Err("tm requires: SEQ".to_string());
    };
    let (upper, bad) = dna_to_upper(seq.as_bytes(), false);
    if let Some(b) = bad {
        return Err(format!("Unrecognized base '{}' in '{seq}'", b as char));
    }
    let mut cond = Conditions::default();
    if let Some(salt) = parse_f64_option(args, "--salt")? {
        cond.salt_conc = salt;
    }
    if let Some(dna) = parse_f64_option(args, "--dna")? {
        cond.dna_conc = dna;
    }
    let santalucia = args.iter().any(|a| a == "--santalucia");
    let (method, salt_correction) = if santalucia {
        (TmMethod::SantaLucia, SaltCorrection::SantaLucia)
    } else {
        (TmMethod::Breslauer, SaltCorrection::Schildkraut)
    };
    let nn_max_len = Settings::default().nn_max_len;
    let tm = seq_tm(&upper, &cond, nn_max_len, method, salt_correction)
        .map_err(|e| e.to_string())?;
    print_json(&TmSummary {
        sequence: String::from_utf8_lossy(&upper).to_string(),
        tm,
        method,
        salt_correction,
    })
}

fn alignment(args: &[String]) -> Result<(), String> {
    if args.len() < 2 {
        usage();
        return Err("align requires: SEQ_A SEQ_B".to_string());
    }
    let mode = match option_value(args, "--mode")?.unwrap_or("local") {
        "local" => AlignmentMode::Local,
        "global" => AlignmentMode::Global,
        "end" => AlignmentMode::GlobalEnd,
        "local-end" => AlignmentMode::LocalEnd,
        other => {
            return Err(format!(
                "Unknown alignment mode '{other}', expected local, global, end or local-end"
            ));
        }
    };
    let aligner = AlignerArgs::nucleotide_default().with_mode(mode);
    let (a, _) = dna_to_upper(args[0].as_bytes(), true);
    let (b, _) = dna_to_upper(args[1].as_bytes(), true);
    let res = align(&a, &b, &aligner).map_err(|e| e.to_string())?;
    if let Some(message) = res.message {
        return Err(message);
    }
    print_json(&AlignSummary {
        mode,
        score: res.score,
        align_end_1: res.align_end_1,
        align_end_2: res.align_end_2,
    })
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    args.retain(|a| a != "--verbose" && a != "-v");
    init_logging(verbose);
    if args.len() <= 1 {
        usage();
        return Err("Missing command".to_string());
    }

    let command = args[1].as_str();
    let rest = &args[2..];
    log::debug!("Running '{command}'");
    match command {
        "capabilities" => print_json(&PrimerEngine::capabilities()),
        "defaults" => {
            if rest.iter().any(|a| a == "--modern") {
                print_json(&Settings::modern())
            } else {
                print_json(&Settings::default())
            }
        }
        "design" => design(rest),
        "tm" => tm(rest),
        "align" => alignment(rest),
        _ => {
            usage();
            Err(format!("Unknown command '{command}'"))
        }
    }
}
