mod opt;
use opt::Opt;

use std::io::stdout;

use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::{generate, shells::*, Generator};
use strum::EnumString;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, EnumString, ValueEnum)]
enum Shell {
    Bash,
    Elvish,
    Fish,
    PowerShell,
    Zsh,
}

#[derive(Debug, Parser)]
struct ShellSelect {
    /// Shell for which to generate completions
    #[arg(value_enum)]
    shell: Shell,
}

fn gen_completion<S: Generator>(shell: S) {
    generate(shell, &mut Opt::command(), "phasegen", &mut stdout())
}

fn main() {
    let shell = ShellSelect::parse().shell;
    match shell {
        Shell::Bash => gen_completion(Bash),
        Shell::Elvish => gen_completion(Elvish),
        Shell::Fish => gen_completion(Fish),
        Shell::PowerShell => gen_completion(PowerShell),
        Shell::Zsh => gen_completion(Zsh),
    }
}
