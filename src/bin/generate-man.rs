// Render man pages for `hamster` and each of its subcommands.
//
// Usage: generate-man [OUT_DIR]   (defaults to ./man)

use clap::CommandFactory;
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

use hamster_cli::cli::Cli;

fn main() -> std::io::Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&out_dir)?;

    let cmd = Cli::command();

    let mut buffer = Vec::new();
    Man::new(cmd.clone()).render(&mut buffer)?;
    let path = out_dir.join("hamster.1");
    fs::write(&path, buffer)?;
    println!("Wrote {}", path.display());

    for sub in cmd.get_subcommands() {
        let name = format!("hamster-{}", sub.get_name());

        let mut buffer = Vec::new();
        Man::new(sub.clone()).title(name.clone()).render(&mut buffer)?;
        let path = out_dir.join(format!("{}.1", name));
        fs::write(&path, buffer)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
