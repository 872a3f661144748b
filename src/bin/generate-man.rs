// Render the casetrack man page: `generate-man [OUT_DIR]` (default: ./man)

use casetrack::cli::Cli;
use clap::CommandFactory;
use std::path::PathBuf;

fn main() -> std::io::Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    std::fs::create_dir_all(&out_dir)?;

    let command = Cli::command();
    let path = out_dir.join("casetrack.1");
    let mut buffer: Vec<u8> = Vec::new();
    clap_mangen::Man::new(command.clone()).render(&mut buffer)?;
    std::fs::write(&path, buffer)?;
    println!("wrote {}", path.display());

    // One page per subcommand, e.g. casetrack-board.1
    for sub in command.get_subcommands() {
        let name = format!("casetrack-{}", sub.get_name());
        let page = sub.clone().name(name.clone());
        let mut buffer: Vec<u8> = Vec::new();
        clap_mangen::Man::new(page).render(&mut buffer)?;
        let path = out_dir.join(format!("{}.1", name));
        std::fs::write(&path, buffer)?;
        println!("wrote {}", path.display());
    }

    Ok(())
}
