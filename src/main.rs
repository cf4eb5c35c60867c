//! # photo-triage CLI
//!
//! Command-line interface for the photo triage engine.
//!
//! ## Usage
//! ```bash
//! photo-triage scan ~/Photos --threshold 5
//! photo-triage scan ~/Photos --verbose --output json
//! ```

mod cli;

use photo_triage::Result;

fn main() -> Result<()> {
    cli::run()
}
