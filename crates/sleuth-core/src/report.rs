//! Progress reporting.
//!
//! The engine narrates each layer through the [`Reporter`] trait. Every
//! method has an empty default body, so a sink only implements the events
//! it cares about.
//!
//! # Example
//!
//! ```
//! use sleuth_core::{Reporter, Solution};
//!
//! #[derive(Default)]
//! struct Winners(Vec<String>);
//!
//! impl Reporter for Winners {
//!     fn solved(&mut self, solution: &Solution) {
//!         self.0.push(solution.algorithm.clone());
//!     }
//! }
//! ```

use crate::identify::Identification;
use crate::solution::Solution;
use crate::stats::LayerStats;
use num_bigint::BigUint;
use std::fmt;
use std::io::{self, Write};

/// Processing stages within one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// RSA attacks
    Rsa,
    /// Keyless decoders
    Local,
    /// XOR and Vigenère
    Poly,
    /// Hash lookup and reference links
    Online,
}

impl Stage {
    /// Section title
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Rsa => "RSA Solver",
            Stage::Local => "Local Solver",
            Stage::Poly => "Poly Solver",
            Stage::Online => "Online Fallback",
        }
    }

    /// Line printed when the stage gives up
    pub fn failure_message(&self) -> &'static str {
        match self {
            Stage::Rsa => "Failed to solve RSA (Small E or FactorDB failed).",
            Stage::Local => "Failed to decode locally.",
            Stage::Poly => "No Poly-Alphabetic, XOR, or weak RSA matches found.",
            Stage::Online => "Active Lookup: Failed or Not Supported.",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Receives analysis events
pub trait Reporter {
    /// A new layer was classified
    fn layer(&mut self, depth: usize, identification: &Identification, stats: &LayerStats) {
        let _ = (depth, identification, stats);
    }

    /// RSA parameters were found
    fn rsa_params(&mut self, modulus_bits: u64, exponent: &BigUint) {
        let _ = (modulus_bits, exponent);
    }

    /// A stage is starting
    fn stage(&mut self, stage: Stage) {
        let _ = stage;
    }

    /// The current stage produced a result
    fn solved(&mut self, solution: &Solution) {
        let _ = solution;
    }

    /// The current stage produced nothing
    fn stage_failed(&mut self, stage: Stage) {
        let _ = stage;
    }

    /// A factor oracle was asked about the RSA modulus
    fn factor_lookup(&mut self, oracle: &str, factored: bool) {
        let _ = (oracle, factored);
    }

    /// An online hash lookup answered
    fn hash_found(&mut self, plaintext: &str) {
        let _ = plaintext;
    }

    /// Reference links for manual follow-up
    fn links(&mut self, links: &[String]) {
        let _ = links;
    }

    /// Analysis stopped at the depth limit
    fn depth_limit(&mut self) {}
}

/// Reporter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Human-readable transcript written to any [`io::Write`].
///
/// Write errors do not interrupt the analysis; the first one is kept and
/// returned by [`TextReporter::finish`].
#[derive(Debug)]
pub struct TextReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> TextReporter<W> {
    /// Creates a reporter writing to `out`
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Flush and hand back the writer, or the first write error
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.out.write_fmt(args).and_then(|_| self.out.write_all(b"\n")) {
            self.error = Some(e);
        }
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn layer(&mut self, depth: usize, identification: &Identification, stats: &LayerStats) {
        if depth > 0 {
            self.line(format_args!(""));
        }
        self.line(format_args!("[+] Analysis (Layer {}):", depth));
        self.line(format_args!("    Type: {}", identification));
        self.line(format_args!(
            "    Entropy: {:.2} ({})",
            stats.entropy,
            stats.bucket()
        ));
        self.line(format_args!(
            "    IoC: {:.2} (English ~1.73, Random ~1.0)",
            stats.ioc
        ));
    }

    fn rsa_params(&mut self, modulus_bits: u64, exponent: &BigUint) {
        self.line(format_args!("[+] RSA Detected:"));
        self.line(format_args!("    N: {} bits", modulus_bits));
        self.line(format_args!("    e: {}", exponent));
    }

    fn stage(&mut self, stage: Stage) {
        self.line(format_args!("[+] {}:", stage));
    }

    fn solved(&mut self, solution: &Solution) {
        self.line(format_args!("    Success! Algorithm: {}", solution.algorithm));
        self.line(format_args!("    Decoded: {}", solution.decoded_text()));
    }

    fn stage_failed(&mut self, stage: Stage) {
        self.line(format_args!("    {}", stage.failure_message()));
    }

    fn factor_lookup(&mut self, oracle: &str, factored: bool) {
        if factored {
            self.line(format_args!("    [+] Attack: {} Lookup (Success)", oracle));
        } else {
            self.line(format_args!("    [!] {}: N not factored.", oracle));
        }
    }

    fn hash_found(&mut self, plaintext: &str) {
        self.line(format_args!("    Active Lookup: Success!"));
        self.line(format_args!("    Results: {}", plaintext));
    }

    fn links(&mut self, links: &[String]) {
        for link in links {
            self.line(format_args!("  - {}", link));
        }
    }

    fn depth_limit(&mut self) {
        self.line(format_args!("[!] Max recursion depth reached. Stopping."));
    }
}
