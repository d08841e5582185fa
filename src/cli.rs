use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::language::Language;

#[derive(Parser, Debug)]
#[command(name = "model-compare")]
#[command(version)]
#[command(about = "Compare generated code from several models side by side, with live previews")]
pub struct Args {
    /// Model output files, one per comparison slot ("-" reads stdin)
    pub inputs: Vec<String>,

    /// Content language of the outputs (html, css, javascript, or any other identifier)
    #[arg(long, short, default_value = "html")]
    pub language: String,

    /// Comma-separated slot labels, in input order
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Build preview documents for every slot
    #[arg(long, short)]
    pub preview: bool,

    /// Directory to write slot-N.html preview documents into
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print slot snapshots as JSON instead of the terminal report
    #[arg(long)]
    pub json: bool,

    /// Serve the comparison page on localhost instead of printing
    #[arg(long)]
    pub web: bool,

    /// Port for the web UI server (overrides the config file)
    #[arg(long)]
    pub port: Option<u16>,

    /// Path to a TOML config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_enum)]
    pub completions: Option<Shell>,
}

impl Args {
    pub fn content_language(&self) -> Language {
        Language::from_identifier(&self.language)
    }

    /// Label for slot `index`, falling back to the default name.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels
            .get(index)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Write completions for `shell` to `out`.
pub fn print_completions(shell: Shell, out: &mut dyn std::io::Write) {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_minimal() {
        let args = Args::parse_from(["mc"]);
        assert!(args.inputs.is_empty());
        assert_eq!(args.language, "html");
        assert_eq!(args.content_language(), Language::Markup);
        assert!(!args.preview);
        assert!(!args.json);
        assert!(!args.web);
        assert!(args.port.is_none());
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_parse_full() {
        let args = Args::parse_from([
            "mc",
            "a.txt",
            "b.txt",
            "--language",
            "css",
            "--labels",
            "gpt,claude",
            "--preview",
            "--out-dir",
            "out",
            "--json",
            "--web",
            "--port",
            "9000",
            "--config",
            "mc.toml",
        ]);
        assert_eq!(args.inputs, vec!["a.txt", "b.txt"]);
        assert_eq!(args.content_language(), Language::Stylesheet);
        assert_eq!(args.labels, vec!["gpt", "claude"]);
        assert!(args.preview);
        assert_eq!(args.out_dir, Some(PathBuf::from("out")));
        assert!(args.json);
        assert!(args.web);
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.config, Some(PathBuf::from("mc.toml")));
    }

    #[test]
    fn test_args_short_flags() {
        let args = Args::parse_from(["mc", "-l", "js", "-p", "-"]);
        assert_eq!(args.content_language(), Language::Script);
        assert!(args.preview);
        assert_eq!(args.inputs, vec!["-"]);
    }

    #[test]
    fn test_label_fallback() {
        let args = Args::parse_from(["mc", "--labels", "one, ,three"]);
        assert_eq!(args.label(0), Some("one"));
        assert_eq!(args.label(1), None);
        assert_eq!(args.label(2), Some("three"));
        assert_eq!(args.label(5), None);
    }

    #[test]
    fn test_completions_flag() {
        let args = Args::parse_from(["mc", "--completions", "bash"]);
        assert_eq!(args.completions, Some(Shell::Bash));
        let mut buf = Vec::new();
        print_completions(Shell::Bash, &mut buf);
        assert!(String::from_utf8_lossy(&buf).contains("model-compare"));
    }

    #[test]
    fn test_command_is_valid() {
        Args::command().debug_assert();
    }
}
