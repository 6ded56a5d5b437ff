//! Terminal password prompt for protected PDFs

use colored::Colorize;
use dialoguer::Password;
use docshift_backend::{PasswordPrompt, PasswordReason};
use indicatif::ProgressBar;

/// Hidden-input prompt; an empty answer cancels
#[derive(Debug, Clone)]
pub struct TerminalPrompt {
    /// Spinner to pause while the prompt is on screen
    spinner: Option<ProgressBar>,
}

impl TerminalPrompt {
    pub const fn new(spinner: Option<ProgressBar>) -> Self {
        Self { spinner }
    }

    fn ask(reason: PasswordReason) -> Option<String> {
        if reason == PasswordReason::Incorrect {
            eprintln!("{} Incorrect password, try again", "Warning:".yellow().bold());
        }
        let answer = Password::new()
            .with_prompt(prompt_text(reason))
            .allow_empty_password(true)
            .interact();
        match answer {
            Ok(password) if !password.is_empty() => Some(password),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Password prompt failed: {e}");
                None
            }
        }
    }
}

fn prompt_text(reason: PasswordReason) -> &'static str {
    match reason {
        PasswordReason::Required => "PDF password (empty to cancel)",
        PasswordReason::Incorrect => "PDF password, incorrect before (empty to cancel)",
    }
}

impl PasswordPrompt for TerminalPrompt {
    fn request_password(&self, reason: PasswordReason) -> Option<String> {
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| Self::ask(reason)),
            None => Self::ask(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_text_mentions_cancel() {
        for reason in [PasswordReason::Required, PasswordReason::Incorrect] {
            assert!(prompt_text(reason).contains("empty to cancel"));
        }
        assert_ne!(
            prompt_text(PasswordReason::Required),
            prompt_text(PasswordReason::Incorrect)
        );
    }
}
