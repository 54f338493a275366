//! Interactive questions on the terminal

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Directory name suggested when nothing is saved
pub const DEFAULT_DIRECTORY: &str = "gmail-emails";

/// Ask a question on stdin/stdout
pub fn ask(question: &str, default: Option<&str>) -> Result<String> {
    let stdin = io::stdin();
    ask_with(&mut stdin.lock(), &mut io::stdout(), question, default)
}

/// Ask a yes/no question on stdin/stdout
pub fn confirm(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    confirm_with(&mut stdin.lock(), &mut io::stdout(), question)
}

/// Ask until a non-empty answer is given; an empty line takes `default`
pub fn ask_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: Option<&str>,
) -> Result<String> {
    loop {
        match default {
            Some(default) => write!(output, "{}: |{}| ", question, default),
            None => write!(output, "{}: ", question),
        }
        .and_then(|_| output.flush())
        .context("Failed to write prompt")?;

        let answer = read_answer(input)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        if let Some(default) = default {
            return Ok(default.to_string());
        }
    }
}

pub fn confirm_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<bool> {
    loop {
        write!(output, "{} ", question)
            .and_then(|_| output.flush())
            .context("Failed to write prompt")?;

        match read_answer(input)?.to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "Please enter \"yes\" or \"no\".")
                .context("Failed to write prompt")?,
        }
    }
}

fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("Failed to read answer")?;
    if read == 0 {
        bail!("No answer given (end of input)");
    }
    Ok(line.trim().to_string())
}

/// `cwd` itself if it is already called `gmail-emails`, otherwise
/// `cwd/gmail-emails`
pub fn default_directory(cwd: &Path) -> PathBuf {
    if cwd.file_name().is_some_and(|name| name == DEFAULT_DIRECTORY) {
        cwd.to_path_buf()
    } else {
        cwd.join(DEFAULT_DIRECTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask_str(input: &str, default: Option<&str>) -> (Result<String>, String) {
        let mut output = Vec::new();
        let answer = ask_with(&mut Cursor::new(input), &mut output, "Gmail user", default);
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_ask_takes_answer() {
        let (answer, output) = ask_str("  someone \n", Some("saved"));
        assert_eq!(answer.unwrap(), "someone");
        assert_eq!(output, "Gmail user: |saved| ");
    }

    #[test]
    fn test_ask_empty_takes_default() {
        let (answer, _) = ask_str("\n", Some("saved"));
        assert_eq!(answer.unwrap(), "saved");
    }

    #[test]
    fn test_ask_repeats_without_default() {
        let (answer, output) = ask_str("\n\nsomeone\n", None);
        assert_eq!(answer.unwrap(), "someone");
        assert_eq!(output.matches("Gmail user: ").count(), 3);
    }

    #[test]
    fn test_ask_end_of_input() {
        let (answer, _) = ask_str("", None);
        assert!(answer.is_err());
    }

    #[test]
    fn test_confirm() {
        let mut output = Vec::new();
        let mut input = Cursor::new("maybe\nYes\n");
        assert!(confirm_with(&mut input, &mut output, "Overwrite?").unwrap());
        assert!(String::from_utf8(output).unwrap().contains("Please enter"));

        let mut input = Cursor::new("n\n");
        assert!(!confirm_with(&mut input, &mut Vec::new(), "Overwrite?").unwrap());
    }

    #[test]
    fn test_default_directory() {
        assert_eq!(
            default_directory(Path::new("/home/someone")),
            PathBuf::from("/home/someone/gmail-emails")
        );
        assert_eq!(
            default_directory(Path::new("/home/someone/gmail-emails")),
            PathBuf::from("/home/someone/gmail-emails")
        );
    }
}
