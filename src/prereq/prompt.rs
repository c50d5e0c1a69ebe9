//! Interactive confirmation

use inquire::{Confirm, InquireError};

use crate::error::Result;

/// Asks the user a yes/no question
pub trait Prompt {
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;
}

/// Terminal prompt backed by `inquire`
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let answer = Confirm::new(message)
            .with_default(default)
            .with_help_message("Press Enter to accept, or 'n' to decline")
            .prompt();
        interpret(message, answer)
    }
}

/// Map a prompt result to an answer; a question nobody can see is declined
fn interpret(message: &str, answer: std::result::Result<bool, InquireError>) -> Result<bool> {
    match answer {
        Ok(answer) => Ok(answer),
        Err(InquireError::NotTTY) => {
            tracing::warn!(
                question = message,
                "no terminal to confirm on, declining (pass --auto-install to install unattended)"
            );
            Ok(false)
        }
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Prompt that always answers the same way
#[cfg(test)]
pub struct FixedAnswer(pub bool);

#[cfg(test)]
impl Prompt for FixedAnswer {
    fn confirm(&self, _message: &str, _default: bool) -> Result<bool> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_terminal_declines() {
        assert!(!interpret("Install git?", Err(InquireError::NotTTY)).unwrap());
    }

    #[test]
    fn test_cancel_declines() {
        assert!(!interpret("Install git?", Err(InquireError::OperationCanceled)).unwrap());
    }

    #[test]
    fn test_answer_passed_through() {
        assert!(interpret("Install git?", Ok(true)).unwrap());
    }
}
