//! Command-line arguments.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

pub const USAGE: &str = "usage: giftrim <video | --pattern SECONDS> [--target-kb N] [--settings PATH]";

/// What to ingest.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    File(PathBuf),
    /// Synthetic color-bar clip of the given length.
    Pattern(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub input: Input,
    pub target_kb: Option<u64>,
    pub settings: Option<PathBuf>,
}

impl Args {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut input = None;
        let mut target_kb = None;
        let mut settings = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--target-kb" => {
                    let value = args.next().context("--target-kb needs a value")?;
                    target_kb = Some(
                        value
                            .parse()
                            .with_context(|| format!("invalid --target-kb: {value}"))?,
                    );
                }
                "--settings" => {
                    settings = Some(PathBuf::from(
                        args.next().context("--settings needs a path")?,
                    ));
                }
                "--pattern" => {
                    let value = args.next().context("--pattern needs a duration")?;
                    let seconds: f64 = value
                        .parse()
                        .with_context(|| format!("invalid --pattern: {value}"))?;
                    input = Some(Input::Pattern(seconds));
                }
                flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
                path => {
                    if input.is_some() {
                        bail!("more than one input given\n{USAGE}");
                    }
                    input = Some(Input::File(PathBuf::from(path)));
                }
            }
        }

        let Some(input) = input else {
            bail!("{USAGE}");
        };
        Ok(Self {
            input,
            target_kb,
            settings,
        })
    }
}
