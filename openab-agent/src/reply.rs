// ABOUTME: Reply text extracted from a finished agent process.
// ABOUTME: Distinguishes "said something" from "ran fine but printed nothing".

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    NoOutput,
}

impl Reply {
    pub fn from_text(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            Reply::NoOutput
        } else {
            Reply::Text(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_only_is_no_output() {
        assert_eq!(Reply::from_text(" \n\t "), Reply::NoOutput);
        assert_eq!(Reply::from_text("\n hi \n"), Reply::Text("hi".into()));
    }
}
