//! Synchronous confirmation gate for destructive row actions.

use std::io::{self, Write};

pub trait Confirm {
    /// Ask the operator; true means go ahead.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Prompts on the terminal, or answers for the operator when told to.
pub struct PromptConfirm {
    assume_yes: bool,
    interactive: bool,
}

impl PromptConfirm {
    pub fn new(assume_yes: bool, interactive: bool) -> Self {
        Self {
            assume_yes,
            interactive,
        }
    }
}

impl Confirm for PromptConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        // One-shot mode without --yes: nobody to ask
        if !self.interactive {
            eprintln!("Declined: {} (use --yes to confirm in command mode)", prompt);
            return false;
        }

        print!("{} [y/N]: ", prompt);
        io::stdout().flush().ok();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_ok() {
            is_yes(&input)
        } else {
            false
        }
    }
}

fn is_yes(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}
