//! # wikimine
//!
//! Mines MediaWiki XML dumps for keyword co-occurrences and known phrases.
//!
//! ## Getting started
//!
//! ```sh
//! wikimine 0.1.0
//! wiki dump mining tool.
//!
//! USAGE:
//!     wikimine <SUBCOMMAND>
//!
//! SUBCOMMANDS:
//!     apply     Find known phrases and their context
//!     gather    Count candidate phrases
//!     help      Prints this message or the help of the given subcommand(s)
//!     mine      Extract keyword vectors and verb/link intersections
//! ```
//!
//! Runs can be interrupted with Ctrl-C: pending batches are written and the
//! checkpoint in the destination folder is used to resume on the next run.
use structopt::StructOpt;

#[macro_use]
extern crate log;

use wikimine::error::Error;
use wikimine::pipelines::{Knowledge, Mining, Pipeline, RunSummary, Shutdown, Stretches};

mod cli;

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::Wikimine::from_args();
    debug!("cli args\n{:#?}", opt);

    let shutdown = Shutdown::new();
    shutdown.install()?;

    let summary = match opt {
        cli::Wikimine::Mine(m) => {
            let p = Mining::new(m.src, m.verbs, m.links, m.dst, m.run.into(), shutdown);
            p.run()?
        }
        cli::Wikimine::Apply(a) => {
            let matcher = a.matcher();
            let p = Stretches::new(a.src, a.phrases, a.dst, matcher, a.run.into(), shutdown);
            p.run()?
        }
        cli::Wikimine::Gather(g) => {
            let knowledge = g.knowledge();
            let p = Knowledge::new(
                g.src,
                g.dst,
                (g.min_words, g.max_words),
                knowledge,
                g.run.into(),
                shutdown,
            );
            p.run()?
        }
    };

    report(&summary)
}

fn report(summary: &RunSummary) -> Result<(), Error> {
    if summary.interrupted {
        warn!(
            "interrupted, resume with --resume {}",
            summary.resume_offset
        );
    }
    if summary.worker_failures > 0 {
        return Err(Error::Custom(format!(
            "{} worker(s) failed, output is durable up to record {}",
            summary.worker_failures, summary.resume_offset
        )));
    }
    Ok(())
}
