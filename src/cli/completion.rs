//! Shell completion generation for promsh
//!
//! Scripts come straight from clap_complete. Bash gets an extra wrapper that
//! completes `--format` values.

use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io::Write;

use crate::cli::CliArgs;
use crate::error::{ConfigError, Result};

const BIN_NAME: &str = "promsh";

/// Write the completion script for `shell_name` to `out`
pub fn generate_completion<W: Write>(shell_name: &str, out: &mut W) -> Result<()> {
    let shell = parse_shell(shell_name)?;
    let mut cmd = CliArgs::command();

    if shell != Shell::Bash {
        generate(shell, &mut cmd, BIN_NAME, out);
        return Ok(());
    }

    let mut buffer = Vec::new();
    generate(Shell::Bash, &mut cmd, BIN_NAME, &mut buffer);
    let basic_completion = String::from_utf8_lossy(&buffer);

    write!(
        out,
        r#"{}

# Output format names for --format
_promsh_enhanced() {{
    local cur prev words cword
    _init_completion || return

    if [[ "$prev" == "--format" ]]; then
        COMPREPLY=($(compgen -W "table json json-pretty compact" -- "$cur"))
        return 0
    fi

    _promsh "$@"
}}

complete -F _promsh_enhanced promsh
"#,
        basic_completion
    )?;
    Ok(())
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "powershell" | "pwsh" => Ok(Shell::PowerShell),
        "elvish" => Ok(Shell::Elvish),
        _ => Err(ConfigError::Generic(format!(
            "Unsupported shell: {}. Supported shells: bash, zsh, fish, powershell, elvish",
            shell_name
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell() {
        assert_eq!(parse_shell("bash").unwrap(), Shell::Bash);
        assert_eq!(parse_shell("ZSH").unwrap(), Shell::Zsh);
        assert_eq!(parse_shell("pwsh").unwrap(), Shell::PowerShell);
        assert!(parse_shell("tcsh").is_err());
    }

    #[test]
    fn test_bash_completion_has_format_values() {
        let mut out = Vec::new();
        generate_completion("bash", &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("_promsh_enhanced"));
        assert!(script.contains("json-pretty"));
    }

    #[test]
    fn test_fish_completion_mentions_subcommands() {
        let mut out = Vec::new();
        generate_completion("fish", &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("classify"));
        assert!(script.contains("complete"));
    }
}
