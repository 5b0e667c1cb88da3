//! `xregistry-oci verify` command — check a layout's digest chain.

use std::path::PathBuf;

use clap::Args;

use xregistry_oci_packager::verify_layout;

#[derive(Args)]
pub struct VerifyArgs {
    /// Image layout directory to verify
    pub layout: PathBuf,
}

pub fn execute(args: VerifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let report = verify_layout(&args.layout)?;
    println!(
        "Layout verified: {} blobs checked in {}",
        report.blobs_checked,
        args.layout.display()
    );
    Ok(())
}
