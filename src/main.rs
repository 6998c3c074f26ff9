use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
    time::Instant,
};

use clap::{Parser, ValueEnum};
use hmmtag::{BaselineTagger, Dataset, HmmConfig, HmmModel, HmmTagger, Result, Tagger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Hmm,
    Baseline,
}

/// Train a part-of-speech tagger on `token/tag` sentences and report its
/// accuracy on held-out data
#[derive(Debug, Parser)]
#[command(version)]
struct Argv {
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// tagger to use
    #[arg(short = 't', long = "tagger", value_enum, default_value_t = Kind::Hmm)]
    kind: Kind,
    /// training corpus, one sentence per line
    #[arg(long, value_name = "FILE", required_unless_present = "params")]
    train: Option<PathBuf>,
    /// held-out corpus to evaluate on
    #[arg(long, value_name = "FILE")]
    test: Option<PathBuf>,
    /// read HMM parameters from a model file instead of training
    #[arg(long, value_name = "FILE", conflicts_with = "train")]
    params: Option<PathBuf>,
    /// add-k constant for initial and transition probabilities
    #[arg(long)]
    k_transition: Option<f64>,
    /// add-k constant for emission probabilities
    #[arg(long)]
    k_emission: Option<f64>,
    /// guess emissions of unseen tokens from their shape
    #[arg(short, long)]
    extension: bool,
    /// set a training parameter (NAME=VALUE)
    #[arg(short, value_name = "NAME=VALUE")]
    parameters: Vec<String>,
    /// write the trained HMM to a file
    #[arg(short, long, value_name = "FILE")]
    save: Option<PathBuf>,
    /// write mispredicted sentences as JSON
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_missing_value = "predicted_tags.json",
        num_args = 0..=1
    )]
    mismatches: Option<PathBuf>,
}

impl Argv {
    fn config(&self) -> Result<HmmConfig> {
        let mut config = HmmConfig::default();
        for s in &self.parameters {
            config.set_pair(s)?;
        }
        if let Some(k) = self.k_transition {
            config.set("k_transition", &k.to_string())?;
        }
        if let Some(k) = self.k_emission {
            config.set("k_emission", &k.to_string())?;
        }
        config.extension |= self.extension;
        Ok(config)
    }
}

fn build(argv: &Argv) -> Result<Box<dyn Tagger>> {
    let config = argv.config()?;
    log::info!("config: {:?}", config);
    match argv.kind {
        Kind::Baseline => {
            let mut tagger = BaselineTagger::new();
            if let Some(fpath) = &argv.train {
                tagger.train(&Dataset::from_path(fpath)?);
            }
            Ok(Box::new(tagger))
        }
        Kind::Hmm => {
            let tagger = match (&argv.params, &argv.train) {
                (Some(fpath), _) => HmmTagger::with_model(config, HmmModel::from_path(fpath)?),
                (None, Some(fpath)) => {
                    let mut tagger = HmmTagger::new(config);
                    tagger.train(&Dataset::from_path(fpath)?);
                    tagger
                }
                (None, None) => HmmTagger::new(config),
            };
            if let Some(fpath) = &argv.save {
                tagger.model()?.dump(fpath)?;
            }
            Ok(Box::new(tagger))
        }
    }
}

fn run(argv: &Argv) -> Result<()> {
    let tagger = build(argv)?;
    let Some(fpath) = &argv.test else {
        return Ok(());
    };
    let ds = Dataset::from_path(fpath)?;
    let begin = Instant::now();
    let evaluation = tagger.evaluate(&ds)?;
    let sec = begin.elapsed().as_secs_f64();
    println!("{}", evaluation);
    println!("Tag level accuracy: {:.2}%", evaluation.accuracy() * 100.0);
    println!(
        "Elapsed time: {:.6} [sec] ({:.1} [sentence/sec])",
        sec,
        ds.len() as f64 / sec.max(f64::EPSILON)
    );
    if let Some(fpath) = &argv.mismatches {
        let mut w = BufWriter::new(File::create(fpath)?);
        serde_json::to_writer(&mut w, evaluation.mismatches())?;
        w.flush()?;
        log::info!(
            "wrote {} mismatched sentences to {}",
            evaluation.mismatches().len(),
            fpath.display()
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let argv = Argv::parse();
    let level = match argv.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    log::debug!("argv: {:?}", argv);
    match run(&argv) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
