use sqlcraft_codegen::{Manifest, write};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=manifest.toml");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let manifest = Manifest::load("manifest.toml")?;
    let files = manifest.generate(&out_dir)?;
    write::write_files(&files, false)?;
    Ok(())
}
